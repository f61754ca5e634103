use crate::{Card, CardId, CoreError, NewCard, Timestamp};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryRepo {
    cards: RwLock<HashMap<CardId, Card>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: RwLock::new(cards.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

#[async_trait]
impl crate::repo::Repository for MemoryRepo {
    async fn add_card(&self, new: NewCard, now: Timestamp) -> Result<Card, CoreError> {
        let card = Card::new(new, now);
        self.cards.write().insert(card.id, card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        self.cards
            .read()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let mut v: Vec<Card> = self.cards.read().values().cloned().collect();
        v.sort_by_key(|c| (c.created_at, c.id));
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        let mut m = self.cards.write();
        let Some(slot) = m.get_mut(&card.id) else {
            return Err(CoreError::NotFound("card"));
        };
        *slot = card.clone();
        Ok(card.clone())
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), CoreError> {
        self.cards.write().insert(card.id, card.clone());
        Ok(())
    }

    async fn replace_all(&self, cards: Vec<Card>) -> Result<(), CoreError> {
        *self.cards.write() = cards.into_iter().map(|c| (c.id, c)).collect();
        Ok(())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        self.cards
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(CoreError::NotFound("card"))
    }
}
