use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Difficulty;

/// A strategy idea produced by the AI advisor and kept for later review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    /// 1-10, as judged by the model.
    pub feasibility_score: u8,
    pub difficulty: Difficulty,
    pub context: Option<String>,
    pub created_at: NaiveDateTime,
}
