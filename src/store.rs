//! Storage seam between the HTTP handlers and the document database.
//!
//! Handlers only see [`MediaStore`]; the MongoDB [`Connection`](crate::db::Connection)
//! implements it for real traffic and tests swap in [`memory::MemoryStore`].

use async_trait::async_trait;

use crate::models::{MediaKind, MediaRecord, ScoreRecord};
use crate::Result;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Insert one media document, returning the generated id as hex.
    async fn insert_media(&self, kind: MediaKind, record: MediaRecord) -> Result<String>;

    async fn list_media(&self, kind: MediaKind) -> Result<Vec<MediaRecord>>;

    /// First record with exactly this filename.
    async fn find_media(&self, kind: MediaKind, filename: &str) -> Result<Option<MediaRecord>>;

    async fn insert_score(&self, record: ScoreRecord) -> Result<String>;

    async fn list_scores(&self) -> Result<Vec<ScoreRecord>>;
}
