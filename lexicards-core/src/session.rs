use crate::{
    compute_due, compute_stats, next_due, Card, CardId, CoreError, DeckStats, Grade, Repository,
    Scheduler, SessionExclusions, Timestamp,
};
use tokio::sync::Mutex;
use tracing::info;

/// One review sitting. Just-graded cards stay hidden until `restart`.
#[derive(Clone, Debug)]
pub struct ReviewSession {
    exclusions: SessionExclusions,
    started_at: Timestamp,
    reviewed: u32,
    correct: u32,
}

impl ReviewSession {
    pub fn start(now: Timestamp) -> Self {
        Self {
            exclusions: SessionExclusions::new(),
            started_at: now,
            reviewed: 0,
            correct: 0,
        }
    }

    pub fn restart(&mut self, now: Timestamp) {
        info!(
            reviewed = self.reviewed,
            excluded = self.exclusions.len(),
            "starting new review session"
        );
        *self = Self::start(now);
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn reviewed(&self) -> u32 {
        self.reviewed
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn accuracy(&self) -> f32 {
        if self.reviewed == 0 {
            0.0
        } else {
            self.correct as f32 / self.reviewed as f32
        }
    }

    pub fn exclusions(&self) -> &SessionExclusions {
        &self.exclusions
    }

    pub fn due(&self, cards: &[Card], now: Timestamp) -> Vec<Card> {
        compute_due(cards, &self.exclusions, now)
    }

    pub fn next(&self, cards: &[Card], now: Timestamp) -> Option<Card> {
        next_due(cards, &self.exclusions, now)
    }

    pub fn stats(&self, cards: &[Card], now: Timestamp) -> DeckStats {
        compute_stats(cards, &self.exclusions, now)
    }

    /// Call after the graded card has been persisted.
    pub fn record(&mut self, id: CardId, grade: Grade) {
        self.exclusions.insert(id);
        self.reviewed += 1;
        if grade.is_correct() {
            self.correct += 1;
        }
    }

    /// Hides a card for the rest of the sitting without grading it.
    pub fn skip(&mut self, id: CardId) {
        self.exclusions.insert(id);
    }

    /// Drops a deleted card from the exclusions.
    pub fn forget(&mut self, id: &CardId) {
        self.exclusions.remove(id);
    }
}

/// Loads, schedules and persists one card. Does not touch any session state
/// and does not guard against a concurrent grade of the same card; shared
/// callers go through [`GradeGate`].
pub async fn grade_and_persist<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    id: CardId,
    grade: Grade,
    now: Timestamp,
) -> Result<Card, CoreError> {
    let card = repo.get_card(id).await?;
    let updated = scheduler.schedule(&card, grade, now)?;
    repo.update_card(&updated).await
}

/// Grades a card and excludes it from the rest of the session. On storage
/// failure the card stays eligible.
pub async fn review_card<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    session: &mut ReviewSession,
    id: CardId,
    grade: Grade,
    now: Timestamp,
) -> Result<Card, CoreError> {
    let updated = grade_and_persist(repo, scheduler, id, grade, now).await?;
    session.record(id, grade);
    Ok(updated)
}

/// Serializes the load, schedule, persist sequence for callers that share a
/// repository, so two grades of one card cannot both start from the same state.
#[derive(Debug, Default)]
pub struct GradeGate {
    lock: Mutex<()>,
}

impl GradeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn grade_and_persist<R: Repository + ?Sized>(
        &self,
        repo: &R,
        scheduler: &Scheduler,
        id: CardId,
        grade: Grade,
        now: Timestamp,
    ) -> Result<Card, CoreError> {
        let _held = self.lock.lock().await;
        grade_and_persist(repo, scheduler, id, grade, now).await
    }
}
