use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// AnimeRecord is one cached entry fetched from the upstream catalogue
/// Maps to `anime` table
///
/// Records are insert-only: once a row exists for an id it is never updated
/// or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AnimeRecord {
    #[serde(rename = "anime_id")]
    pub id: i32,
    pub title: Option<String>,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
}

impl AnimeRecord {
    pub fn new(
        id: i32,
        title: Option<String>,
        title_english: Option<String>,
        title_japanese: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            title_english,
            title_japanese,
        }
    }
}
