use axum::{extract::{Query, State}, http::StatusCode, Json};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use lexicards_core::{
    browse_order, filter_by_text, time::now_ms, CoreError, GradeGate, Grade, NewCard, Repository,
    ReviewSession, Scheduler,
};

use crate::api::dto::{CardIn, CardOut, ReviewIn, StatsOut};
use crate::cli::opts::parse_status;

pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub scheduler: Scheduler,
    pub grades: GradeGate,
    // Never held across an await.
    pub session: Mutex<ReviewSession>,
}

#[derive(Deserialize)]
pub struct CardsQuery {
    status: Option<String>,
    query: Option<String>,
}

#[derive(Deserialize)]
pub struct DueQuery {
    max: Option<usize>,
}

fn to_status(e: CoreError) -> StatusCode {
    let code = match &e {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Invalid(_) | CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CoreError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(status = %code, "request failed: {e}");
    code
}

pub async fn list_cards(State(st): State<Arc<AppState>>, Query(q): Query<CardsQuery>)
    -> Result<Json<Vec<CardOut>>, StatusCode>
{
    let now = now_ms();
    // Comma-separated, e.g. ?status=learning,new
    let statuses = match q.status.as_deref() {
        Some(s) => s
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(|p| parse_status(p.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StatusCode::BAD_REQUEST)?,
        None => Vec::new(),
    };
    let mut cards = st.repo.list_cards().await.map_err(to_status)?;
    if let Some(text) = q.query.as_deref() {
        cards = filter_by_text(&cards, text);
    }
    let ordered = {
        let session = st.session.lock();
        browse_order(&cards, &statuses, session.exclusions(), now)
    };
    Ok(Json(ordered.into_iter().map(|c| CardOut::from_card(c, now)).collect()))
}

pub async fn add_card(State(st): State<Arc<AppState>>, Json(body): Json<CardIn>)
    -> Result<(StatusCode, Json<CardOut>), StatusCode>
{
    if body.english.trim().is_empty() || body.vietnamese.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let now = now_ms();
    let new = NewCard {
        english: body.english,
        vietnamese: body.vietnamese,
        example: body.example.filter(|s| !s.trim().is_empty()),
        phonetic: body.phonetic.filter(|s| !s.trim().is_empty()),
    };
    let card = st.repo.add_card(new, now).await.map_err(to_status)?;
    Ok((StatusCode::CREATED, Json(CardOut::from_card(card, now))))
}

pub async fn due_cards(State(st): State<Arc<AppState>>, Query(q): Query<DueQuery>)
    -> Result<Json<Vec<CardOut>>, StatusCode>
{
    let now = now_ms();
    let cards = st.repo.list_cards().await.map_err(to_status)?;
    let mut due = st.session.lock().due(&cards, now);
    if let Some(m) = q.max { due.truncate(m); }
    Ok(Json(due.into_iter().map(|c| CardOut::from_card(c, now)).collect()))
}

pub async fn stats(State(st): State<Arc<AppState>>) -> Result<Json<StatsOut>, StatusCode> {
    let now = now_ms();
    let cards = st.repo.list_cards().await.map_err(to_status)?;
    let session = st.session.lock();
    Ok(Json(StatsOut {
        stats: session.stats(&cards, now),
        session_reviewed: session.reviewed(),
        session_correct: session.correct(),
    }))
}

pub async fn post_review(State(st): State<Arc<AppState>>, Json(body): Json<ReviewIn>)
    -> Result<Json<CardOut>, StatusCode>
{
    let grade = Grade::parse(&body.grade).ok_or(StatusCode::BAD_REQUEST)?;
    let now = now_ms();
    // The session is only touched once the card is saved.
    let updated = st
        .grades
        .grade_and_persist(&*st.repo, &st.scheduler, body.card_id, grade, now)
        .await
        .map_err(to_status)?;
    st.session.lock().record(updated.id, grade);
    Ok(Json(CardOut::from_card(updated, now)))
}

pub async fn reset_session(State(st): State<Arc<AppState>>) -> StatusCode {
    st.session.lock().restart(now_ms());
    info!("review session reset");
    StatusCode::NO_CONTENT
}
