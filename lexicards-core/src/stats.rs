use crate::{is_due, Card, CardStatus, SessionExclusions, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub new: u32,
    pub learning: u32,
    pub learned: u32,
    /// Respects session exclusions; the other counts do not.
    pub due: u32,
    pub total: u32,
}

impl DeckStats {
    pub fn record(&mut self, card: &Card, due: bool) {
        self.total += 1;
        match card.status {
            CardStatus::New => self.new += 1,
            CardStatus::Learning => self.learning += 1,
            CardStatus::Learned => self.learned += 1,
        }
        if due {
            self.due += 1;
        }
    }

    pub fn count(&self, status: CardStatus) -> u32 {
        match status {
            CardStatus::New => self.new,
            CardStatus::Learning => self.learning,
            CardStatus::Learned => self.learned,
        }
    }
}

pub fn compute_stats(cards: &[Card], excluded: &SessionExclusions, now: Timestamp) -> DeckStats {
    let mut stats = DeckStats::default();
    for c in cards {
        stats.record(c, is_due(c, excluded, now));
    }
    stats
}
