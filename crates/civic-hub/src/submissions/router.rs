use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Deserialize;

use super::domain::{NewSubmission, Submission, SubmissionId, SubmissionPatch};
use super::filter::SubmissionFilter;
use super::matching::{MatchSuggestion, MatchedPair};
use super::repository::SubmissionRepository;
use super::service::SubmissionService;
use super::stats::DashboardStats;
use crate::error::AppError;

/// Router builder exposing the submission, statistics, and matching endpoints.
pub fn submission_router<R>(service: Arc<SubmissionService<R>>) -> Router
where
    R: SubmissionRepository + 'static,
{
    Router::new()
        .route(
            "/api/submissions",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/submissions/:id",
            get(get_handler::<R>).patch(update_handler::<R>),
        )
        .route(
            "/api/submissions/:id/match/:offer_id",
            post(match_handler::<R>),
        )
        .route("/api/stats", get(stats_handler::<R>))
        .route("/api/match-suggestions", get(suggestions_handler::<R>))
        .with_state(service)
}

/// Raw query string; empty values impose no constraint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    category: Option<String>,
    neighborhood: Option<String>,
    status: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<SubmissionFilter, String> {
        Ok(SubmissionFilter {
            category: parse_param("category", self.category)?,
            neighborhood: parse_param("neighborhood", self.neighborhood)?,
            status: parse_param("status", self.status)?,
        })
    }
}

fn parse_param<T: DeserializeOwned>(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let deserializer: StrDeserializer<'_, ValueError> = value.into_deserializer();
    T::deserialize(deserializer)
        .map(Some)
        .map_err(|err| format!("invalid {name} filter: {err}"))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Submission>>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let filter = query.into_filter().map_err(AppError::BadRequest)?;

    let rows = service
        .list(filter)
        .map_err(AppError::during("Failed to fetch submissions"))?;
    Ok(Json(rows))
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Submission>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let found = service
        .get(&SubmissionId(id))
        .map_err(AppError::during("Failed to fetch submission"))?;
    Ok(Json(found))
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
    payload: Result<Json<NewSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Submission>), AppError>
where
    R: SubmissionRepository + 'static,
{
    let input = json_body(payload)?;
    let created = service
        .create(input)
        .map_err(AppError::during("Failed to create submission"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<SubmissionPatch>, JsonRejection>,
) -> Result<Json<Submission>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let patch = json_body(payload)?;
    let updated = service
        .update(&SubmissionId(id), patch)
        .map_err(AppError::during("Failed to update submission"))?;
    Ok(Json(updated))
}

pub(crate) async fn match_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
    Path((need_id, offer_id)): Path<(String, String)>,
) -> Result<Json<MatchedPair>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let pair = service
        .confirm_match(&SubmissionId(need_id), &SubmissionId(offer_id))
        .map_err(AppError::during("Failed to match submissions"))?;
    Ok(Json(pair))
}

pub(crate) async fn stats_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
) -> Result<Json<DashboardStats>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let stats = service
        .stats()
        .map_err(AppError::during("Failed to fetch stats"))?;
    Ok(Json(stats))
}

pub(crate) async fn suggestions_handler<R>(
    State(service): State<Arc<SubmissionService<R>>>,
) -> Result<Json<Vec<MatchSuggestion>>, AppError>
where
    R: SubmissionRepository + 'static,
{
    let suggestions = service
        .match_suggestions()
        .map_err(AppError::during("Failed to fetch match suggestions"))?;
    Ok(Json(suggestions))
}
