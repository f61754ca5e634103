use crate::{Card, CardStatus};

pub fn filter_by_text(cards: &[Card], query: &str) -> Vec<Card> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    let hit = |s: &Option<String>| {
        s.as_ref()
            .map(|s| s.to_lowercase().contains(&q))
            .unwrap_or(false)
    };
    cards
        .iter()
        .filter(|c| {
            c.english.to_lowercase().contains(&q)
                || c.vietnamese.to_lowercase().contains(&q)
                || hit(&c.example)
                || hit(&c.phonetic)
        })
        .cloned()
        .collect()
}

/// An empty status list keeps every card.
pub fn filter_by_status(cards: &[Card], statuses: &[CardStatus]) -> Vec<Card> {
    if statuses.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| statuses.contains(&c.status))
        .cloned()
        .collect()
}
