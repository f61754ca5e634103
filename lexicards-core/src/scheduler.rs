use crate::time::{days_to_ms, minutes_to_ms};
use crate::{Card, CardStatus, CoreError, Grade, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Learning steps, in minutes.
pub const LEARNING_STEPS_MIN: [f64; 2] = [1.0, 10.0];
pub const GRADUATING_INTERVAL: f64 = 1.0;
pub const CORRECT_MULTIPLIER: f64 = 2.5;
pub const INCORRECT_MULTIPLIER: f64 = 0.25;
pub const MINIMUM_INTERVAL: f64 = 1.0;
pub const MAXIMUM_INTERVAL: f64 = 365.0;

/// Tunable scheduling policy. Interval values are in days.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub learning_steps_min: Vec<f64>,
    pub graduating_interval_days: f64,
    pub correct_multiplier: f64,
    pub incorrect_multiplier: f64,
    pub minimum_interval_days: f64,
    pub maximum_interval_days: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            learning_steps_min: LEARNING_STEPS_MIN.to_vec(),
            graduating_interval_days: GRADUATING_INTERVAL,
            correct_multiplier: CORRECT_MULTIPLIER,
            incorrect_multiplier: INCORRECT_MULTIPLIER,
            minimum_interval_days: MINIMUM_INTERVAL,
            maximum_interval_days: MAXIMUM_INTERVAL,
        }
    }
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.learning_steps_min.is_empty() {
            return Err(CoreError::Invalid("learning steps must not be empty"));
        }
        if !self.learning_steps_min.iter().all(|s| positive(*s)) {
            return Err(CoreError::Invalid("learning steps must be positive"));
        }
        if !positive(self.graduating_interval_days)
            || !positive(self.correct_multiplier)
            || !positive(self.incorrect_multiplier)
            || !positive(self.minimum_interval_days)
            || !positive(self.maximum_interval_days)
        {
            return Err(CoreError::Invalid("intervals and multipliers must be positive"));
        }
        if self.minimum_interval_days > self.maximum_interval_days {
            return Err(CoreError::Invalid("minimum interval exceeds maximum interval"));
        }
        Ok(())
    }
}

fn offset(now: Timestamp, delta_ms: i64) -> Result<Timestamp, CoreError> {
    now.checked_add(delta_ms).ok_or_else(|| {
        CoreError::InvalidArgument(format!("next review overflows the timestamp range from {now}"))
    })
}

/// Pure state machine mapping `(card, grade, now)` to the card's next state.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn step_ms(&self, index: usize) -> i64 {
        minutes_to_ms(self.config.learning_steps_min[index])
    }

    fn check(&self, card: &Card, now: Timestamp) -> Result<(), CoreError> {
        if now < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "now must be a non-negative epoch timestamp, got {now}"
            )));
        }
        if !card.interval.is_finite() || card.interval < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "card {} has invalid interval {}",
                card.id, card.interval
            )));
        }
        if card.step_index >= self.config.learning_steps_min.len() {
            return Err(CoreError::InvalidState(format!(
                "card {} has step index {} outside the learning steps",
                card.id, card.step_index
            )));
        }
        Ok(())
    }

    /// Returns the updated card; the input is left untouched.
    pub fn schedule(&self, card: &Card, grade: Grade, now: Timestamp) -> Result<Card, CoreError> {
        self.check(card, now)?;

        let mut working = card.clone();
        working.last_review = Some(now);

        let next = match card.status {
            CardStatus::New | CardStatus::Learning => self.schedule_learning(working, grade, now)?,
            CardStatus::Learned => self.schedule_learned(working, grade, now)?,
        };

        debug!(
            card = %card.id,
            from = %card.status,
            to = %next.status,
            ?grade,
            interval = next.interval,
            next_review = next.next_review,
            "scheduled card"
        );
        Ok(next)
    }

    fn schedule_learning(&self, mut card: Card, grade: Grade, now: Timestamp) -> Result<Card, CoreError> {
        if grade == Grade::Incorrect {
            card.status = CardStatus::Learning;
            card.step_index = 0;
            card.next_review = offset(now, self.step_ms(0))?;
            return Ok(card);
        }

        let next_step = card.step_index + 1;
        if next_step < self.config.learning_steps_min.len() {
            card.status = CardStatus::Learning;
            card.step_index = next_step;
            card.next_review = offset(now, self.step_ms(next_step))?;
        } else {
            let graduating = self.config.graduating_interval_days;
            card.status = CardStatus::Learned;
            card.interval = graduating;
            card.step_index = 0;
            card.next_review = offset(now, days_to_ms(graduating))?;
            card.reps += 1;
        }
        Ok(card)
    }

    fn schedule_learned(&self, mut card: Card, grade: Grade, now: Timestamp) -> Result<Card, CoreError> {
        let min = self.config.minimum_interval_days;
        let max = self.config.maximum_interval_days;

        if grade == Grade::Incorrect {
            let candidate = (card.interval * self.config.incorrect_multiplier).clamp(min, max);
            card.lapses += 1;
            if candidate <= min {
                card.status = CardStatus::Learning;
                card.step_index = 0;
                card.interval = 0.0;
                card.next_review = offset(now, self.step_ms(0))?;
            } else {
                card.interval = candidate;
                card.next_review = offset(now, days_to_ms(candidate))?;
            }
            return Ok(card);
        }

        // Only the upper bound applies; a sub-day interval grows from where it is.
        let grown = (card.interval * self.config.correct_multiplier).min(max);
        card.interval = grown;
        card.next_review = offset(now, days_to_ms(grown))?;
        card.reps += 1;
        Ok(card)
    }

    /// When the card would next be due for each grade.
    pub fn preview(&self, card: &Card, now: Timestamp) -> Result<[(Grade, Timestamp); 2], CoreError> {
        let incorrect = self.schedule(card, Grade::Incorrect, now)?.next_review;
        let correct = self.schedule(card, Grade::Correct, now)?.next_review;
        Ok([(Grade::Incorrect, incorrect), (Grade::Correct, correct)])
    }
}

/// Schedules with the default policy.
pub fn schedule(card: &Card, grade: Grade, now: Timestamp) -> Result<Card, CoreError> {
    Scheduler::default().schedule(card, grade, now)
}
