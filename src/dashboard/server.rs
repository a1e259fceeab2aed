use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use super::pages::{self, ReviewsQuery};
use super::sentiment::SentimentAnalyzer;
use super::{summarize, Snapshot, Summary};
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub data_dir: Arc<PathBuf>,
    pub review_year: i32,
    pub analyzer: Arc<SentimentAnalyzer>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            data_dir: Arc::new(settings.data_dir.clone()),
            review_year: settings.review_year,
            analyzer: Arc::new(SentimentAnalyzer::new()),
        }
    }

    /// Re-read the files; nothing is cached between requests.
    fn snapshot(&self) -> Snapshot {
        Snapshot::load(&self.data_dir)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/products", get(products))
        .route("/testimonials", get(testimonials))
        .route("/reviews", get(reviews))
        .route("/api/summary", get(summary))
        .with_state(state)
}

pub async fn serve(settings: &Settings) -> Result<()> {
    let state = AppState::new(settings);
    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;
    let addr = listener.local_addr()?;
    info!(data_dir = %settings.data_dir.display(), "serving dashboard");
    println!("Dashboard listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// File reads, CSV parsing and scoring run on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "page build failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn overview(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    blocking(move || Html(pages::overview(&state.snapshot(), &state.data_dir))).await
}

async fn products(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    blocking(move || Html(pages::products(&state.snapshot()))).await
}

async fn testimonials(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    blocking(move || Html(pages::testimonials(&state.snapshot()))).await
}

async fn reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Html<String>, StatusCode> {
    blocking(move || {
        Html(pages::reviews(
            &state.snapshot(),
            &state.analyzer,
            &query,
            state.review_year,
        ))
    })
    .await
}

async fn summary(State(state): State<AppState>) -> Result<Json<Summary>, StatusCode> {
    blocking(move || Json(summarize(&state.snapshot(), &state.analyzer))).await
}
