//! Repositories for database operations

pub mod blog;

pub use blog::BlogRepository;
