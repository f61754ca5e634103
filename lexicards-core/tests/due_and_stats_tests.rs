use lexicards_core::{
    browse_order, compute_due, compute_stats, filter_by_status, filter_by_text, next_due,
    schedule, Card, CardStatus, Grade, NewCard, SessionExclusions,
};

const NOW: i64 = 1_700_000_000_000;
const MIN: i64 = 60_000;

fn card(word: &str, status: CardStatus, next_review: i64) -> Card {
    let mut c = Card::new(NewCard::new(word, format!("{word}-vi")), NOW - 10 * MIN);
    c.status = status;
    c.next_review = next_review;
    if status == CardStatus::Learned {
        c.interval = 1.0;
    }
    c
}

fn words(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|c| c.english.as_str()).collect()
}

#[test]
fn empty_collection_has_nothing_due() {
    let due = compute_due(&[], &SessionExclusions::new(), NOW);
    assert!(due.is_empty());
    assert!(next_due(&[], &SessionExclusions::new(), NOW).is_none());
}

#[test]
fn status_priority_beats_timestamp() {
    let a = card("a", CardStatus::Learning, NOW - MIN);
    let b = card("b", CardStatus::New, NOW - 2 * MIN);
    let c = card("c", CardStatus::Learned, NOW - 5 * MIN);
    let due = compute_due(&[c, b, a], &SessionExclusions::new(), NOW);
    assert_eq!(words(&due), vec!["a", "b", "c"]);
}

#[test]
fn most_overdue_first_within_status() {
    let x = card("x", CardStatus::Learned, NOW - MIN);
    let y = card("y", CardStatus::Learned, NOW - 9 * MIN);
    let z = card("z", CardStatus::Learned, NOW);
    let due = compute_due(&[x, y, z], &SessionExclusions::new(), NOW);
    assert_eq!(words(&due), vec!["y", "x", "z"]);
}

#[test]
fn future_cards_are_not_due() {
    let soon = card("soon", CardStatus::Learning, NOW + 1);
    let now = card("now", CardStatus::Learning, NOW);
    let due = compute_due(&[soon, now], &SessionExclusions::new(), NOW);
    assert_eq!(words(&due), vec!["now"]);
}

#[test]
fn ties_keep_collection_order() {
    let p = card("p", CardStatus::New, NOW);
    let q = card("q", CardStatus::New, NOW);
    let r = card("r", CardStatus::New, NOW);
    let due = compute_due(&[q.clone(), p.clone(), r.clone()], &SessionExclusions::new(), NOW);
    assert_eq!(words(&due), vec!["q", "p", "r"]);
    let head = next_due(&[q, p, r], &SessionExclusions::new(), NOW).unwrap();
    assert_eq!(head.english, "q");
}

#[test]
fn ordering_invariant_holds_for_mixed_set() {
    let cards: Vec<Card> = (0..30)
        .map(|i| {
            let status = CardStatus::ALL[i % 3];
            card(&format!("w{i}"), status, NOW - ((i * 7919) % 50) as i64 * MIN)
        })
        .collect();
    let due = compute_due(&cards, &SessionExclusions::new(), NOW);
    assert_eq!(due.len(), cards.len());
    for pair in due.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.status.priority() <= b.status.priority());
        if a.status == b.status {
            assert!(a.next_review <= b.next_review);
        }
    }
}

#[test]
fn graded_card_is_excluded_even_when_still_due() {
    let fresh = card("fresh", CardStatus::New, NOW - MIN);
    let other = card("other", CardStatus::New, NOW - MIN);
    let cards = vec![fresh.clone(), other.clone()];

    let mut excluded = SessionExclusions::new();
    let graded = schedule(&fresh, Grade::Incorrect, NOW).unwrap();
    excluded.insert(graded.id);

    let updated: Vec<Card> = cards
        .into_iter()
        .map(|c| if c.id == graded.id { graded.clone() } else { c })
        .collect();

    // One minute later the learning step has elapsed but the sitting continues.
    let later = NOW + 2 * MIN;
    let due = compute_due(&updated, &excluded, later);
    assert!(due.iter().all(|c| c.id != graded.id));
    assert_eq!(words(&due), vec!["other"]);

    excluded.clear();
    let due = compute_due(&updated, &excluded, later);
    assert_eq!(words(&due), vec!["fresh", "other"]);
}

#[test]
fn stats_count_statuses_and_respect_exclusions_for_due() {
    let cards = vec![
        card("n1", CardStatus::New, NOW),
        card("n2", CardStatus::New, NOW),
        card("l1", CardStatus::Learning, NOW + MIN),
        card("d1", CardStatus::Learned, NOW - MIN),
    ];
    let mut excluded = SessionExclusions::new();
    excluded.insert(cards[0].id);

    let s = compute_stats(&cards, &excluded, NOW);
    assert_eq!(s.new, 2);
    assert_eq!(s.learning, 1);
    assert_eq!(s.learned, 1);
    assert_eq!(s.total, 4);
    assert_eq!(s.due, 2);
    assert_eq!(s.count(CardStatus::New), 2);

    assert_eq!(compute_stats(&cards, &excluded, NOW), s);
}

#[test]
fn browse_puts_due_first() {
    let cards = vec![
        card("later", CardStatus::Learning, NOW + MIN),
        card("old", CardStatus::Learned, NOW - MIN),
        card("fresh", CardStatus::New, NOW),
    ];
    let all = browse_order(&cards, &[], &SessionExclusions::new(), NOW);
    assert_eq!(words(&all), vec!["fresh", "old", "later"]);

    let learned_only = browse_order(&cards, &[CardStatus::Learned], &SessionExclusions::new(), NOW);
    assert_eq!(words(&learned_only), vec!["old"]);
}

#[test]
fn text_and_status_filters() {
    let mut hello = card("hello", CardStatus::New, NOW);
    hello.example = Some("Hello, world".into());
    let mut goodbye = card("goodbye", CardStatus::Learned, NOW);
    goodbye.phonetic = Some("/ɡʊdˈbaɪ/".into());
    let v = vec![hello, goodbye];

    assert_eq!(words(&filter_by_text(&v, "WORLD")), vec!["hello"]);
    assert_eq!(words(&filter_by_text(&v, "bye-vi")), vec!["goodbye"]);
    assert_eq!(filter_by_text(&v, "  ").len(), 2);
    assert_eq!(words(&filter_by_status(&v, &[CardStatus::Learned])), vec!["goodbye"]);
    assert_eq!(filter_by_status(&v, &[]).len(), 2);
}

#[test]
fn card_json_shape_is_flat_camel_case() {
    let c = card("apple", CardStatus::Learning, NOW);
    let v = serde_json::to_value(&c).unwrap();
    assert_eq!(v["status"], "learning");
    assert_eq!(v["nextReview"], NOW);
    assert_eq!(v["stepIndex"], 0);
    assert!(v.get("lastReview").is_none());
    assert!(v.get("example").is_none());
}
