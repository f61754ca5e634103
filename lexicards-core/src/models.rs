use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type CardId = Uuid;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    New,
    Learning,
    Learned,
}

impl CardStatus {
    pub const ALL: [CardStatus; 3] = [CardStatus::New, CardStatus::Learning, CardStatus::Learned];

    /// Lower values are presented first.
    pub fn priority(&self) -> u8 {
        match self {
            CardStatus::Learning => 0,
            CardStatus::New => 1,
            CardStatus::Learned => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Learned => "learned",
        }
    }

    pub fn parse(s: &str) -> Option<CardStatus> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(CardStatus::New),
            "learning" => Some(CardStatus::Learning),
            "learned" => Some(CardStatus::Learned),
            _ => None,
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Incorrect,
    Correct,
}

impl Grade {
    pub fn parse(s: &str) -> Option<Grade> {
        match s.trim().to_lowercase().as_str() {
            "0" | "n" | "no" | "incorrect" | "wrong" => Some(Grade::Incorrect),
            "1" | "y" | "yes" | "correct" | "right" => Some(Grade::Correct),
            _ => None,
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Grade::Correct)
    }
}

/// Payload for creating a card. The scheduler never looks at these fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCard {
    pub english: String,
    pub vietnamese: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
}

impl NewCard {
    pub fn new(english: impl Into<String>, vietnamese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            vietnamese: vietnamese.into(),
            example: None,
            phonetic: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub english: String,
    pub vietnamese: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub created_at: Timestamp,

    pub status: CardStatus,
    /// Days; fractional values are allowed.
    pub interval: f64,
    pub step_index: usize,
    pub next_review: Timestamp,
    pub lapses: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<Timestamp>,
}

impl Card {
    /// A fresh card is due immediately.
    pub fn new(new: NewCard, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            english: new.english,
            vietnamese: new.vietnamese,
            example: new.example,
            phonetic: new.phonetic,
            created_at: now,
            status: CardStatus::New,
            interval: 0.0,
            step_index: 0,
            next_review: now,
            lapses: 0,
            reps: 0,
            last_review: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.status == CardStatus::New
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }
}
