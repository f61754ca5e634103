use chrono::{DateTime, Utc};
use lexicards_core::{migration, repo::Repository, Card, CardId, CoreError, NewCard, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{sync::Mutex, task};
use tracing::{debug, error, info};

pub mod paths;

const FILE_VERSION: u32 = 2;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: Vec<Card>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    #[serde(default)]
    version: u32,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    cards: Vec<Value>,
}

// A bare array is what the browser build kept in local storage.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Bare(Vec<Value>),
    Image(RawImage),
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cards: HashMap<CardId, Card>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            cards: HashMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        let mut cards: Vec<Card> = self.cards.values().cloned().collect();
        cards.sort_by_key(|c| (c.created_at, c.id));
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            cards,
        }
    }

    fn from_cards(created_at: DateTime<Utc>, cards: Vec<Card>) -> Self {
        Self {
            created_at,
            updated_at: Utc::now(),
            cards: cards.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // Held across a whole read-modify-write so concurrent writers cannot drop each other's changes.
    writer: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_in(dir: &Path) -> Result<Self, CoreError> {
        let (file, backups) = paths::store_file_in(dir);
        Self::open_with(file, backups, DEFAULT_MAX_BACKUPS).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let (state, needs_save) = load_or_init(&path).await?;
        let store = Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
            writer: Mutex::new(()),
        };
        if needs_save {
            let image = store.state.read().to_image();
            store.write_image(image).await?;
        }
        info!(path = %store.path.display(), cards = store.state.read().cards.len(), "opened json store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the state and publishes the copy only
    /// once it is on disk; a failed write leaves the store as it was.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut State) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let _writer = self.writer.lock().await;
        let mut next = self.state.read().clone();
        let out = change(&mut next)?;
        next.updated_at = Utc::now();
        self.write_image(next.to_image()).await?;
        *self.state.write() = next;
        Ok(out)
    }

    async fn write_image(&self, image: FileImage) -> Result<(), CoreError> {
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &image))
            .await
            .map_err(|e| {
                error!("json store writer task failed: {e}");
                CoreError::Storage("io")
            })?
            .map_err(|e| {
                error!("json store write failed: {e}");
                CoreError::Storage("io")
            })?;
        debug!(path = %self.path.display(), "saved json store");
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

/// Returns the loaded state and whether it must be written back.
async fn load_or_init(path: &Path) -> Result<(State, bool), CoreError> {
    if !path.exists() {
        return Ok((State::new_empty(), true));
    }

    let p = path.to_path_buf();
    let on_disk: OnDisk = task::spawn_blocking(move || {
        let mut f = fs::File::open(&p)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        let v = serde_json::from_str::<OnDisk>(&buf)?;
        Ok::<OnDisk, std::io::Error>(v)
    })
    .await
    .map_err(|_| CoreError::Storage("io"))
    .and_then(|r| {
        r.map_err(|e| {
            error!("failed to read json store: {e}");
            CoreError::Storage("io")
        })
    })?;

    let (created_at, records, stale) = match on_disk {
        OnDisk::Bare(records) => (Utc::now(), records, true),
        OnDisk::Image(img) => (
            img.created_at.unwrap_or_else(Utc::now),
            img.cards,
            img.version != FILE_VERSION,
        ),
    };
    let (cards, migrated) = migration::load_cards(records)?;
    Ok((State::from_cards(created_at, cards), stale || migrated > 0))
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_path = backups_dir.join(format!("lexicards-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

use async_trait::async_trait;

#[async_trait]
impl Repository for JsonStore {
    async fn add_card(&self, new: NewCard, now: Timestamp) -> Result<Card, CoreError> {
        let card = Card::new(new, now);
        self.commit(|s| {
            s.cards.insert(card.id, card.clone());
            Ok(())
        })
        .await?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Card> = s.cards.values().cloned().collect();
        v.sort_by_key(|c| (c.created_at, c.id));
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        self.commit(|s| match s.cards.get_mut(&card.id) {
            Some(slot) => {
                *slot = card.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound("card")),
        })
        .await?;
        Ok(card.clone())
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), CoreError> {
        self.commit(|s| {
            s.cards.insert(card.id, card.clone());
            Ok(())
        })
        .await
    }

    async fn replace_all(&self, cards: Vec<Card>) -> Result<(), CoreError> {
        self.commit(move |s| {
            s.cards = cards.into_iter().map(|c| (c.id, c)).collect();
            Ok(())
        })
        .await
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        self.commit(|s| {
            s.cards
                .remove(&id)
                .map(|_| ())
                .ok_or(CoreError::NotFound("card"))
        })
        .await
    }
}
