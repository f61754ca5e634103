use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::config;

use anyhow::{anyhow, Result};
use lexicards_core::{
    browse_order, compute_stats, filter_by_text, migration, review_card,
    time::{format_interval, format_time_until, now_ms, to_datetime},
    Card, CardStatus, Grade, NewCard, Repository, ReviewSession, Scheduler, SessionExclusions,
};
use lexicards_json::JsonStore;
use lexicards_sqlite::SqliteRepo;
use serde_json::Value;
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    let scheduler = config::load_scheduler(args.scheduler_config.as_deref())?;
    let repo = open_repo(&args.store, args.data_dir.as_deref(), args.db_path.clone()).await?;
    match args.cmd {
        Command::Add(a) => add_cmd(repo, a).await,
        Command::List(l) => list_cmd(repo, l).await,
        Command::Edit(e) => edit_cmd(repo, e).await,
        Command::Rm { card_id } => {
            repo.delete_card(parse_uuid(&card_id)?).await?;
            println!("ok");
            Ok(())
        }
        Command::Review(cmd) => review_cmd(repo, scheduler, cmd).await,
        Command::Stats => stats_cmd(repo).await,
        Command::Export(cmd) => export_cmd(repo, cmd).await,
        Command::Import(cmd) => import_cmd(repo, cmd).await,
        Command::Api(api) => {
            let addr: std::net::SocketAddr = api.addr.parse()?;
            api_server::run(repo, scheduler, addr).await
        }
    }
}

pub async fn open_repo(
    store: &StoreKind,
    data_dir: Option<&Path>,
    db_path: Option<PathBuf>,
) -> Result<Arc<dyn Repository>> {
    let root = config::data_dir(data_dir);
    match store {
        StoreKind::Json => {
            let s = JsonStore::open_in(&root).await?;
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = db_path.unwrap_or_else(|| root.join("lexicards.sqlite3"));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let s = SqliteRepo::open_file(&p).await?;
            Ok(Arc::new(s))
        }
    }
}

async fn add_cmd(repo: Arc<dyn Repository>, a: CardAdd) -> Result<()> {
    let new = NewCard {
        english: a.english,
        vietnamese: a.vietnamese,
        example: a.example.filter(|s| !s.trim().is_empty()),
        phonetic: a.phonetic.filter(|s| !s.trim().is_empty()),
    };
    let c = repo.add_card(new, now_ms()).await?;
    info!(id = %c.id, english = %c.english, "added card");
    println!("{}", c.id);
    Ok(())
}

async fn list_cmd(repo: Arc<dyn Repository>, l: CardList) -> Result<()> {
    let now = now_ms();
    let mut cards = repo.list_cards().await?;
    if let Some(q) = &l.query {
        cards = filter_by_text(&cards, q);
    }
    for c in browse_order(&cards, &l.statuses, &SessionExclusions::new(), now) {
        println!(
            "{}\t{}\t{}\t{}\tinterval={}\tdue {}",
            c.id,
            c.english,
            c.vietnamese,
            c.status,
            format_interval(c.interval),
            format_time_until(c.next_review, now)
        );
    }
    Ok(())
}

async fn edit_cmd(repo: Arc<dyn Repository>, e: CardEdit) -> Result<()> {
    let id = parse_uuid(&e.card_id)?;
    let mut card = repo.get_card(id).await?;

    if let Some(en) = e.english { card.english = en; }
    if let Some(vi) = e.vietnamese { card.vietnamese = vi; }
    if e.clear_example { card.example = None; }
    if let Some(ex) = e.example { card.example = Some(ex); }
    if e.clear_phonetic { card.phonetic = None; }
    if let Some(ph) = e.phonetic { card.phonetic = Some(ph); }

    let _ = repo.update_card(&card).await?;
    println!("ok");
    Ok(())
}

async fn review_cmd(repo: Arc<dyn Repository>, scheduler: Scheduler, cmd: ReviewCmd) -> Result<()> {
    let mut session = ReviewSession::start(now_ms());
    let mut shown = 0usize;

    while shown < cmd.max {
        let now = now_ms();
        let cards = repo.list_cards().await?;
        let Some(card) = session.next(&cards, now) else {
            if shown == 0 {
                println!("no cards due");
            }
            break;
        };
        shown += 1;

        println!("\n[{}/{}] {} ({})", shown, cmd.max, card.id, card.status);
        println!("Q: {}", card.english);
        if let Some(p) = &card.phonetic { println!("   {}", p); }
        prompt_enter("[enter=show]")?;
        println!("A: {}", card.vietnamese);
        if let Some(ex) = &card.example { println!("e.g. {}", ex); }

        let [(_, wrong_at), (_, right_at)] = scheduler.preview(&card, now)?;
        println!(
            "[y=correct ({}), n=incorrect ({}), s=skip, q=quit]",
            format_time_until(right_at, now),
            format_time_until(wrong_at, now)
        );
        let grade = loop {
            let line = read_line("grade> ")?;
            match line.trim().to_lowercase().as_str() {
                "s" | "skip" => break None,
                "q" | "quit" => {
                    summary(&session);
                    return Ok(());
                }
                other => match Grade::parse(other) {
                    Some(g) => break Some(g),
                    None => println!("enter y/n, s, or q"),
                },
            }
        };

        match grade {
            Some(grade) => {
                let updated = review_card(&*repo, &scheduler, &mut session, card.id, grade, now).await?;
                println!("→ next review {}", format_time_until(updated.next_review, now));
            }
            None => {
                debug!(id = %card.id, "skipped card");
                session.skip(card.id);
            }
        }
    }

    summary(&session);
    Ok(())
}

fn summary(session: &ReviewSession) {
    if session.reviewed() > 0 {
        println!(
            "\nreviewed {} ({:.0}% correct)",
            session.reviewed(),
            session.accuracy() * 100.0
        );
    }
}

async fn stats_cmd(repo: Arc<dyn Repository>) -> Result<()> {
    let cards = repo.list_cards().await?;
    let s = compute_stats(&cards, &SessionExclusions::new(), now_ms());
    for status in CardStatus::ALL {
        println!("{:<9}{}", status.as_str(), s.count(status));
    }
    println!("{:<9}{}", "due", s.due);
    println!("{:<9}{}", "total", s.total);
    Ok(())
}

async fn export_cmd(repo: Arc<dyn Repository>, cmd: ExportCmd) -> Result<()> {
    let cards = repo.list_cards().await?;
    match cmd {
        ExportCmd::Json { path } => {
            let bundle = ExportBundle { version: 2, cards };
            let s = serde_json::to_string_pretty(&bundle)?;
            std::fs::write(&path, s)?;
            println!("wrote {}", path.display());
        }
        ExportCmd::Csv { path } => {
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["english", "vietnamese", "example", "phonetic", "status", "next_review"])?;
            for c in cards {
                let next = to_datetime(c.next_review)
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default();
                wtr.write_record([
                    c.english,
                    c.vietnamese,
                    c.example.unwrap_or_default(),
                    c.phonetic.unwrap_or_default(),
                    c.status.to_string(),
                    next,
                ])?;
            }
            wtr.flush()?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

async fn import_cmd(repo: Arc<dyn Repository>, cmd: ImportCmd) -> Result<()> {
    match cmd {
        ImportCmd::Json { path } => {
            let data = std::fs::read_to_string(&path)?;
            let (cards, migrated) = decode_bundle(serde_json::from_str(&data)?)?;
            let n = cards.len();
            for c in &cards {
                repo.upsert_card(c).await?;
            }
            info!(imported = n, migrated, "imported json bundle");
            println!("imported {n} ({migrated} migrated)");
        }
        ImportCmd::Csv { path } => {
            let mut rdr = csv::Reader::from_path(&path)?;
            let now = now_ms();
            let mut n = 0usize;
            for rec in rdr.records() {
                let rec = rec?;
                let english = rec.get(0).unwrap_or("").trim().to_string();
                let vietnamese = rec.get(1).unwrap_or("").trim().to_string();
                if english.is_empty() || vietnamese.is_empty() {
                    continue;
                }
                let optional = |i: usize| rec.get(i).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
                let new = NewCard { english, vietnamese, example: optional(2), phonetic: optional(3) };
                repo.add_card(new, now).await?;
                n += 1;
            }
            println!("imported {n}");
        }
    }
    Ok(())
}

// ===== Helpers =====
fn parse_uuid(s: &str) -> Result<Uuid> { Uuid::parse_str(s).map_err(|_| anyhow!("invalid uuid")) }

fn prompt_enter(label: &str) -> Result<()> { print!("{label}"); stdout().flush().ok(); let mut s = String::new(); stdin().read_line(&mut s)?; Ok(()) }
fn read_line(prompt: &str) -> Result<String> { print!("{prompt}"); stdout().flush().ok(); let mut s = String::new(); stdin().read_line(&mut s)?; Ok(s) }

#[derive(serde::Serialize)]
struct ExportBundle { version: u32, cards: Vec<Card> }

/// Accepts an export bundle or a bare array, in current or legacy card shape.
fn decode_bundle(v: Value) -> Result<(Vec<Card>, usize)> {
    let records = match v {
        Value::Array(records) => records,
        Value::Object(mut obj) => match obj.remove("cards") {
            Some(Value::Array(records)) => records,
            _ => return Err(anyhow!("bundle has no cards array")),
        },
        _ => return Err(anyhow!("expected a card bundle or array")),
    };
    Ok(migration::load_cards(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bundle_and_bare_array() {
        let card = Card::new(NewCard::new("rain", "mưa"), 1_000);
        let bundle = serde_json::to_value(ExportBundle { version: 2, cards: vec![card.clone()] }).unwrap();
        let (cards, migrated) = decode_bundle(bundle).unwrap();
        assert_eq!(cards, vec![card.clone()]);
        assert_eq!(migrated, 0);

        let bare = json!([serde_json::to_value(&card).unwrap()]);
        assert_eq!(decode_bundle(bare).unwrap().0.len(), 1);
    }

    #[test]
    fn rejects_non_bundle() {
        assert!(decode_bundle(json!({ "decks": [] })).is_err());
        assert!(decode_bundle(json!("cards")).is_err());
    }
}
