//! Repositories for database operations

pub mod session;
pub mod user;

pub use session::SessionRepository;
pub use user::UserRepository;
