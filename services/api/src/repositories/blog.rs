//! Blog repository for database operations

use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::info;

use crate::models::{Author, BlogPost, NewBlogPost};

/// Posts inserted into an empty table
const SEED_POSTS: &str = include_str!("../../seed/posts.json");

/// Blog repository for database operations
#[derive(Clone)]
pub struct BlogRepository {
    pool: SqlitePool,
}

impl BlogRepository {
    /// Create a new blog repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the blogs table if it does not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blogs (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                content TEXT NOT NULL,
                author_name TEXT NOT NULL,
                author_role TEXT NOT NULL,
                author_avatar TEXT NOT NULL,
                date TEXT NOT NULL,
                readTime TEXT NOT NULL,
                category TEXT NOT NULL,
                image TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert the bundled posts when the table is empty
    ///
    /// All posts go in within one transaction. Returns how many were inserted.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM blogs")
            .fetch_one(&mut *tx)
            .await?
            .get("count");
        if count > 0 {
            return Ok(0);
        }

        let posts: Vec<BlogPost> = serde_json::from_str(SEED_POSTS)?;
        for post in &posts {
            insert_post(&mut *tx, post).await?;
        }
        tx.commit().await?;

        info!("Seeded {} blog posts", posts.len());
        Ok(posts.len())
    }

    /// All posts, newest first
    pub async fn list(&self) -> Result<Vec<BlogPost>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM blogs
            ORDER BY CAST(id AS INTEGER) DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Find a post by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<BlogPost>> {
        let row = sqlx::query("SELECT * FROM blogs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Publish a post dated today, returning its id
    pub async fn create(&self, new_post: NewBlogPost) -> Result<String> {
        let now = Utc::now();
        let post = BlogPost {
            id: now.timestamp_millis().to_string(),
            title: new_post.title,
            excerpt: new_post.excerpt,
            content: new_post.content,
            author: new_post.author,
            date: now.format("%B %-d, %Y").to_string(),
            read_time: new_post.read_time,
            category: new_post.category,
            image: new_post.image,
        };

        insert_post(&self.pool, &post).await?;
        info!("Created blog post {}", post.id);
        Ok(post.id)
    }
}

async fn insert_post<'e, E>(executor: E, post: &BlogPost) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO blogs (id, title, excerpt, content, author_name, author_role,
                           author_avatar, date, readTime, category, image)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&post.id)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.author.name)
    .bind(&post.author.role)
    .bind(&post.author.avatar)
    .bind(&post.date)
    .bind(&post.read_time)
    .bind(&post.category)
    .bind(&post.image)
    .execute(executor)
    .await?;
    Ok(())
}

fn post_from_row(row: &SqliteRow) -> BlogPost {
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        author: Author {
            name: row.get("author_name"),
            role: row.get("author_role"),
            avatar: row.get("author_avatar"),
        },
        date: row.get("date"),
        read_time: row.get("readTime"),
        category: row.get("category"),
        image: row.get("image"),
    }
}
