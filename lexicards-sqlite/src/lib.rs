use lexicards_core::{repo::Repository, Card, CardId, CardStatus, CoreError, NewCard, Timestamp};
use sqlx::{sqlite::SqlitePoolOptions, Row, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

const CARD_COLUMNS: &str = "id,english,vietnamese,example,phonetic,created_at,status,\
                            interval_days,step_index,next_review,lapses,reps,last_review";

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|e| {
                error!("sqlite connect failed: {e}");
                CoreError::Storage("sqlite connect")
            })?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        info!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(repo)
    }

    pub async fn open_memory() -> Result<Self, CoreError> {
        // Every connection to :memory: is a separate database, so keep one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS cards (
          id             TEXT PRIMARY KEY,
          english        TEXT NOT NULL,
          vietnamese     TEXT NOT NULL,
          example        TEXT,
          phonetic       TEXT,
          created_at     INTEGER NOT NULL,
          status         TEXT NOT NULL,
          interval_days  REAL    NOT NULL DEFAULT 0,
          step_index     INTEGER NOT NULL DEFAULT 0,
          next_review    INTEGER NOT NULL,
          lapses         INTEGER NOT NULL DEFAULT 0,
          reps           INTEGER NOT NULL DEFAULT 0,
          last_review    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards (next_review);
        "#;

        // Execute statements one by one for compatibility.
        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }
}

const UPSERT: &str = r#"
    INSERT INTO cards (
      id, english, vietnamese, example, phonetic, created_at, status,
      interval_days, step_index, next_review, lapses, reps, last_review
    )
    VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?)
    ON CONFLICT(id) DO UPDATE SET
      english=excluded.english, vietnamese=excluded.vietnamese,
      example=excluded.example, phonetic=excluded.phonetic,
      created_at=excluded.created_at, status=excluded.status,
      interval_days=excluded.interval_days, step_index=excluded.step_index,
      next_review=excluded.next_review, lapses=excluded.lapses,
      reps=excluded.reps, last_review=excluded.last_review
"#;

fn bind_card<'q>(
    q: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    card: &'q Card,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    q.bind(card.id.to_string())
        .bind(&card.english)
        .bind(&card.vietnamese)
        .bind(card.example.as_deref())
        .bind(card.phonetic.as_deref())
        .bind(card.created_at)
        .bind(card.status.as_str())
        .bind(card.interval)
        .bind(card.step_index as i64)
        .bind(card.next_review)
        .bind(card.lapses as i64)
        .bind(card.reps as i64)
        .bind(card.last_review)
}

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    async fn add_card(&self, new: NewCard, now: Timestamp) -> Result<Card, CoreError> {
        let card = Card::new(new, now);
        bind_card(sqlx::query(UPSERT), &card)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("insert card"))?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let row = sqlx::query(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id=?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read card"))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(row)
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list cards"))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(row_into_card(row)?);
        }
        Ok(v)
    }

    async fn update_card(&self, card: &Card) -> Result<Card, CoreError> {
        let res = sqlx::query(
            r#"
            UPDATE cards SET
              english=?, vietnamese=?, example=?, phonetic=?, created_at=?, status=?,
              interval_days=?, step_index=?, next_review=?, lapses=?, reps=?, last_review=?
            WHERE id=?
            "#,
        )
        .bind(&card.english)
        .bind(&card.vietnamese)
        .bind(card.example.as_deref())
        .bind(card.phonetic.as_deref())
        .bind(card.created_at)
        .bind(card.status.as_str())
        .bind(card.interval)
        .bind(card.step_index as i64)
        .bind(card.next_review)
        .bind(card.lapses as i64)
        .bind(card.reps as i64)
        .bind(card.last_review)
        .bind(card.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("update card"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("card"));
        }
        Ok(card.clone())
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), CoreError> {
        bind_card(sqlx::query(UPSERT), card)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("upsert card"))?;
        Ok(())
    }

    async fn replace_all(&self, cards: Vec<Card>) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;
        sqlx::query("DELETE FROM cards")
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("clear cards"))?;
        for card in &cards {
            bind_card(sqlx::query(UPSERT), card)
                .execute(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("insert card"))?;
        }
        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        let res = sqlx::query("DELETE FROM cards WHERE id=?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("del card"))?;
        if res.rows_affected() == 0 {
            return Err(CoreError::NotFound("card"));
        }
        Ok(())
    }
}

// ===== Helpers =====
fn uuid_from_str(s: String) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(&s).map_err(|_| CoreError::Invalid("uuid"))
}

fn status_from_str(id: &str, s: &str) -> Result<CardStatus, CoreError> {
    CardStatus::parse(s)
        .ok_or_else(|| CoreError::InvalidState(format!("card {id} has unknown status {s:?}")))
}

// Counters are stored as INTEGER; negative or oversized values mean a corrupt row.
fn counter<T: TryFrom<i64>>(row: &sqlx::sqlite::SqliteRow, id: &str, column: &str) -> Result<T, CoreError> {
    let raw: i64 = row
        .try_get(column)
        .map_err(|_| CoreError::InvalidState(format!("card {id} has unreadable {column}")))?;
    T::try_from(raw)
        .map_err(|_| CoreError::InvalidState(format!("card {id} has out-of-range {column} {raw}")))
}

fn row_into_card(row: sqlx::sqlite::SqliteRow) -> Result<Card, CoreError> {
    let id: String = row.get("id");
    let status = status_from_str(&id, &row.get::<String, _>("status"))?;
    let step_index = counter::<usize>(&row, &id, "step_index")?;
    let lapses = counter::<u32>(&row, &id, "lapses")?;
    let reps = counter::<u32>(&row, &id, "reps")?;

    Ok(Card {
        id: uuid_from_str(id)?,
        english: row.get::<String, _>("english"),
        vietnamese: row.get::<String, _>("vietnamese"),
        example: row.get::<Option<String>, _>("example"),
        phonetic: row.get::<Option<String>, _>("phonetic"),
        created_at: row.get::<i64, _>("created_at"),
        status,
        interval: row.get::<f64, _>("interval_days"),
        step_index,
        next_review: row.get::<i64, _>("next_review"),
        lapses,
        reps,
        last_review: row.get::<Option<i64>, _>("last_review"),
    })
}
