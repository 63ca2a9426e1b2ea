//! API models for request and response payloads

pub mod blog;

pub use blog::{Author, BlogPost, CreatedResponse, NewBlogPost};
