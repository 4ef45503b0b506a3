//! Banner handlers

use crate::extractors::Caller;
use crate::handlers::ApiError;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use banner_core::{Banner, BannerPayload, ANY_ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct GetBannerQuery {
    tag_id: Option<String>,
    feature_id: Option<String>,
    use_last_revision: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBannersQuery {
    feature_id: Option<String>,
    tag_id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    banner_id: i64,
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<GetBannerQuery>, QueryRejection>,
) -> Result<Json<Banner>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let tag_id = required_id("tag_id", query.tag_id.as_deref())?;
    let feature_id = required_id("feature_id", query.feature_id.as_deref())?;
    let use_last_revision = query
        .use_last_revision
        .as_deref()
        .and_then(parse_bool)
        .unwrap_or(false);

    let banner = state
        .banners
        .get_banner(
            &state.deadline(),
            tag_id,
            feature_id,
            use_last_revision,
            caller.is_admin,
        )
        .await?;
    Ok(Json(banner))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    query: Result<Query<ListBannersQuery>, QueryRejection>,
) -> Result<Json<Vec<Banner>>, ApiError> {
    caller.require_admin()?;
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let feature_id = optional_number("feature_id", query.feature_id.as_deref())?;
    let tag_id = optional_number("tag_id", query.tag_id.as_deref())?;
    let limit = optional_number("limit", query.limit.as_deref())?;
    let offset = optional_number("offset", query.offset.as_deref())?;

    let banners = state
        .banners
        .list_banners(&state.deadline(), feature_id, tag_id, limit, offset)
        .await?;
    Ok(Json(banners))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<BannerPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    caller.require_admin()?;
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let banner_id = state
        .banners
        .create_banner(&state.deadline(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { banner_id })))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BannerPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require_admin()?;
    let Path(banner_id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    state
        .banners
        .update_banner(&state.deadline(), banner_id, payload)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require_admin()?;
    let Path(banner_id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    state
        .banners
        .delete_banner(&state.deadline(), banner_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A mandatory, strictly positive identifier.
fn required_id(name: &str, raw: Option<&str>) -> Result<i64, ApiError> {
    match raw.map(str::parse::<i64>) {
        Some(Ok(id)) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest(format!("invalid {}", name))),
    }
}

/// Missing or non-positive values mean "no constraint" and become [`ANY_ID`].
fn optional_number(name: &str, raw: Option<&str>) -> Result<i64, ApiError> {
    match raw {
        None | Some("") => Ok(ANY_ID),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            Ok(_) => Ok(ANY_ID),
            Err(_) => Err(ApiError::BadRequest(format!("invalid {}", name))),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
