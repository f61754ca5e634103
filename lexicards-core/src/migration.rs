//! Load-time upgrade of older on-disk card shapes.
//!
//! Earlier versions stored an ease factor and used `review`/`relearning`
//! (and before that `to-learn`/`known`) statuses. Records are rewritten as raw
//! JSON before typed decoding so the scheduler only ever sees current cards.

use crate::{Card, CardStatus, CoreError};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

const LEGACY_STATUSES: [&str; 4] = ["review", "relearning", "to-learn", "known"];

const CARRIED_FIELDS: [&str; 8] = [
    "id",
    "english",
    "vietnamese",
    "example",
    "phonetic",
    "createdAt",
    "nextReview",
    "lastReview",
];

pub fn needs_migration(record: &Value) -> bool {
    let Some(obj) = record.as_object() else {
        return false;
    };
    obj.contains_key("easeFactor")
        || obj
            .get("status")
            .and_then(Value::as_str)
            .map(|s| LEGACY_STATUSES.contains(&s))
            .unwrap_or(false)
}

fn legacy_status(old: Option<&str>) -> CardStatus {
    match old {
        Some("learning") => CardStatus::Learning,
        Some("review" | "relearning" | "known" | "learned") => CardStatus::Learned,
        _ => CardStatus::New,
    }
}

// Missing, null and zero all count as unset.
fn set_number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n != 0.0)
}

pub fn migrate_record(record: Value) -> Value {
    let Value::Object(old) = record else {
        return record;
    };
    let status = legacy_status(old.get("status").and_then(Value::as_str));

    let mut out = Map::new();
    for key in CARRIED_FIELDS {
        if let Some(v) = old.get(key).filter(|v| !v.is_null()) {
            out.insert(key.to_string(), v.clone());
        }
    }

    let reps = set_number(&old, "reps")
        .or_else(|| set_number(&old, "reviewCount"))
        .unwrap_or(0.0) as u64;
    // Only learned cards carry a day interval; learning cards run on steps.
    let (interval, reps) = match status {
        CardStatus::New => (0.0, 0),
        CardStatus::Learning => (0.0, reps),
        CardStatus::Learned => (set_number(&old, "interval").unwrap_or(1.0), reps),
    };
    let step_index = match status {
        CardStatus::Learning => set_number(&old, "stepIndex").unwrap_or(0.0) as u64,
        _ => 0,
    };

    out.insert("status".into(), json!(status.as_str()));
    out.insert("interval".into(), json!(interval));
    out.insert("stepIndex".into(), json!(step_index));
    out.insert(
        "lapses".into(),
        json!(set_number(&old, "lapses").unwrap_or(0.0) as u64),
    );
    out.insert("reps".into(), json!(reps));

    debug!(id = ?out.get("id"), status = %status, "migrated legacy card");
    Value::Object(out)
}

/// Returns the upgraded records and how many were rewritten.
pub fn migrate_records(records: Vec<Value>) -> (Vec<Value>, usize) {
    let mut migrated = 0usize;
    let out = records
        .into_iter()
        .map(|r| {
            if needs_migration(&r) {
                migrated += 1;
                migrate_record(r)
            } else {
                r
            }
        })
        .collect();
    if migrated > 0 {
        info!(migrated, "upgraded legacy card records");
    }
    (out, migrated)
}

/// Typed decoding; unknown statuses and malformed records are rejected.
pub fn decode_cards(records: Vec<Value>) -> Result<Vec<Card>, CoreError> {
    let mut cards = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        if let Some(s) = record.get("status").and_then(Value::as_str) {
            if CardStatus::parse(s).is_none() {
                return Err(CoreError::InvalidState(format!(
                    "record {i} has unknown status {s:?}"
                )));
            }
        }
        let card: Card = serde_json::from_value(record)
            .map_err(|e| CoreError::InvalidState(format!("record {i}: {e}")))?;
        cards.push(card);
    }
    Ok(cards)
}

/// Migrates then decodes. The count tells the storage layer whether to rewrite.
pub fn load_cards(records: Vec<Value>) -> Result<(Vec<Card>, usize), CoreError> {
    let (records, migrated) = migrate_records(records);
    Ok((decode_cards(records)?, migrated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(status: &str) -> Value {
        json!({
            "id": "5f0c6c8e-8f0a-4b7e-9a53-0e6f1f4d2a11",
            "english": "apple",
            "vietnamese": "quả táo",
            "createdAt": 1_000,
            "status": status,
            "nextReview": 2_000,
            "interval": 6,
            "reviewCount": 3,
            "easeFactor": 2.5
        })
    }

    #[test]
    fn review_becomes_learned() {
        let out = migrate_record(legacy("review"));
        assert_eq!(out["status"], "learned");
        assert_eq!(out["interval"], 6.0);
        assert_eq!(out["reps"], 3);
        assert_eq!(out["lapses"], 0);
        assert!(out.get("easeFactor").is_none());
        assert!(out.get("reviewCount").is_none());
    }

    #[test]
    fn to_learn_becomes_new_with_zero_interval() {
        let out = migrate_record(legacy("to-learn"));
        assert_eq!(out["status"], "new");
        assert_eq!(out["interval"], 0.0);
        assert_eq!(out["reps"], 0);
    }

    #[test]
    fn learning_drops_the_legacy_interval() {
        let mut rec = legacy("learning");
        rec["stepIndex"] = json!(1);
        let out = migrate_record(rec);
        assert_eq!(out["status"], "learning");
        assert_eq!(out["interval"], 0.0);
        assert_eq!(out["stepIndex"], 1);
        assert_eq!(out["reps"], 3);
    }

    #[test]
    fn learned_without_interval_defaults_to_one_day() {
        let mut rec = legacy("known");
        rec["interval"] = json!(0);
        let out = migrate_record(rec);
        assert_eq!(out["status"], "learned");
        assert_eq!(out["interval"], 1.0);
    }

    #[test]
    fn current_records_pass_through() {
        let current = json!({
            "id": "5f0c6c8e-8f0a-4b7e-9a53-0e6f1f4d2a11",
            "english": "apple",
            "vietnamese": "quả táo",
            "createdAt": 1_000,
            "status": "learning",
            "interval": 0.0,
            "stepIndex": 1,
            "nextReview": 2_000,
            "lapses": 0,
            "reps": 0
        });
        let (out, n) = migrate_records(vec![current.clone()]);
        assert_eq!(n, 0);
        assert_eq!(out[0], current);
        let cards = decode_cards(out).unwrap();
        assert_eq!(cards[0].status, CardStatus::Learning);
        assert_eq!(cards[0].step_index, 1);
    }

    #[test]
    fn migrated_record_decodes() {
        let (cards, n) = load_cards(vec![legacy("relearning")]).unwrap();
        assert_eq!(n, 1);
        assert_eq!(cards[0].status, CardStatus::Learned);
        assert_eq!(cards[0].next_review, 2_000);
        assert_eq!(cards[0].last_review, None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut rec = migrate_record(legacy("review"));
        rec["status"] = json!("mastered");
        let err = decode_cards(vec![rec]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }
}
