use axum::{routing::{get, post}, Router};
use parking_lot::Mutex;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{add_card, due_cards, list_cards, post_review, reset_session, stats, AppState};
use lexicards_core::{time::now_ms, GradeGate, Repository, ReviewSession, Scheduler};

pub fn router(repo: Arc<dyn Repository>, scheduler: Scheduler) -> Router {
    let state = Arc::new(AppState {
        repo,
        scheduler,
        grades: GradeGate::new(),
        session: Mutex::new(ReviewSession::start(now_ms())),
    });

    Router::new()
        .route("/cards", get(list_cards).post(add_card))
        .route("/due", get(due_cards))
        .route("/stats", get(stats))
        .route("/review", post(post_review))
        .route("/session/reset", post(reset_session))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(repo: Arc<dyn Repository>, scheduler: Scheduler, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(repo, scheduler);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
