use crate::{Card, CardId, CoreError, NewCard, Timestamp};
use async_trait::async_trait;

pub mod memory;

/// Storage collaborator. Implementations serialize their own writes; the
/// scheduler only hands them finished card values.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn add_card(&self, new: NewCard, now: Timestamp) -> Result<Card, CoreError>;
    async fn get_card(&self, id: CardId) -> Result<Card, CoreError>;
    async fn list_cards(&self) -> Result<Vec<Card>, CoreError>;

    /// Fails with `NotFound` if the card does not exist.
    async fn update_card(&self, card: &Card) -> Result<Card, CoreError>;
    /// Inserts or replaces by id.
    async fn upsert_card(&self, card: &Card) -> Result<(), CoreError>;
    /// Replaces the whole collection.
    async fn replace_all(&self, cards: Vec<Card>) -> Result<(), CoreError>;
    async fn delete_card(&self, id: CardId) -> Result<(), CoreError>;
}
