use crate::models::{InsertResponse, PlayerScore, ScoreRecord, ScoreSummary};
use crate::{AppState, Result};
use axum::{extract::State, Json};
use std::sync::Arc;

pub async fn add_score(
    State(state): State<Arc<AppState>>,
    Json(score): Json<PlayerScore>,
) -> Result<Json<InsertResponse>> {
    tracing::info!("Recording score {} for '{}'", score.score, score.player);

    let id = state.store.insert_score(ScoreRecord::from(score)).await?;

    Ok(Json(InsertResponse {
        message: "Score recorded".to_string(),
        id,
    }))
}

pub async fn list_scores(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ScoreSummary>>> {
    let scores = state.store.list_scores().await?;
    Ok(Json(scores.into_iter().map(ScoreSummary::from).collect()))
}
