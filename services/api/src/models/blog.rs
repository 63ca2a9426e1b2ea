//! Blog post models

use serde::{Deserialize, Serialize};

/// Byline of a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub role: String,
    pub avatar: String,
}

/// A published post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Decimal millisecond timestamp of creation; seeded posts use small integers
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    /// Human-readable publication date, e.g. "March 15, 2024"
    pub date: String,
    #[serde(rename = "readTime")]
    pub read_time: String,
    pub category: String,
    pub image: String,
}

/// Request for post creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlogPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: Author,
    #[serde(rename = "readTime")]
    pub read_time: String,
    pub category: String,
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: String,
}
