use lexicards_core::{time::format_time_until, Card, CardStatus, DeckStats, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
pub struct CardOut {
    pub id: Uuid,
    pub english: String,
    pub vietnamese: String,
    pub example: Option<String>,
    pub phonetic: Option<String>,
    pub status: CardStatus,
    pub interval: f64,
    pub next_review: Timestamp,
    pub due_in: String,
}

impl CardOut {
    pub fn from_card(c: Card, now: Timestamp) -> Self {
        Self {
            due_in: format_time_until(c.next_review, now),
            id: c.id,
            english: c.english,
            vietnamese: c.vietnamese,
            example: c.example,
            phonetic: c.phonetic,
            status: c.status,
            interval: c.interval,
            next_review: c.next_review,
        }
    }
}

#[derive(Serialize)]
pub struct StatsOut {
    #[serde(flatten)]
    pub stats: DeckStats,
    pub session_reviewed: u32,
    pub session_correct: u32,
}

#[derive(Deserialize)]
pub struct CardIn {
    pub english: String,
    pub vietnamese: String,
    pub example: Option<String>,
    pub phonetic: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewIn {
    pub card_id: Uuid,
    pub grade: String,
}
