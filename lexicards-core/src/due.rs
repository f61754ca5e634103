use crate::{Card, CardId, CardStatus, Timestamp};
use std::collections::HashSet;

/// Ids graded during the current sitting. Owned by the caller and cleared only
/// when a new session starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionExclusions {
    ids: HashSet<CardId>,
}

impl SessionExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: CardId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &CardId) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &CardId) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardId> {
        self.ids.iter()
    }
}

impl FromIterator<CardId> for SessionExclusions {
    fn from_iter<I: IntoIterator<Item = CardId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

pub fn is_due(card: &Card, excluded: &SessionExclusions, now: Timestamp) -> bool {
    !excluded.contains(&card.id) && card.is_due(now)
}

/// Due cards ordered learning-first, then new, then learned; most overdue first
/// within a status. An empty result means there is nothing to review.
pub fn compute_due(cards: &[Card], excluded: &SessionExclusions, now: Timestamp) -> Vec<Card> {
    let mut due: Vec<Card> = cards
        .iter()
        .filter(|c| is_due(c, excluded, now))
        .cloned()
        .collect();
    // sort_by_key is stable, so equal keys keep collection order.
    due.sort_by_key(|c| (c.status.priority(), c.next_review));
    due
}

pub fn next_due(cards: &[Card], excluded: &SessionExclusions, now: Timestamp) -> Option<Card> {
    cards
        .iter()
        .filter(|c| is_due(c, excluded, now))
        .min_by_key(|c| (c.status.priority(), c.next_review))
        .cloned()
}

/// Listing order for browsing the whole collection: optional status filter,
/// due cards first, then status priority, then `next_review`.
pub fn browse_order(
    cards: &[Card],
    statuses: &[CardStatus],
    excluded: &SessionExclusions,
    now: Timestamp,
) -> Vec<Card> {
    let mut v: Vec<Card> = crate::filters::filter_by_status(cards, statuses);
    v.sort_by_key(|c| (!is_due(c, excluded, now), c.status.priority(), c.next_review));
    v
}
