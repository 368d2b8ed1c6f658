use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published rules/FAQ content shown to residents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqArticle {
    pub id: Uuid,
    pub category: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFaqInput {
    pub category: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFaqInput {
    pub category: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}
