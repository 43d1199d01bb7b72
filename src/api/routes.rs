//! Route handlers for the admin API

use crate::api::ApiError;
use crate::storage::{lock, SharedStorage, Storage, StoredLink};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct Timestamp {
    pub time: i64,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct NewLink {
    pub link: String,
    pub modified: String,
}

#[derive(Debug, Deserialize)]
pub struct ModifiedUpdate {
    pub modified: String,
}

pub async fn get_timestamp(State(storage): State<SharedStorage>) -> Result<Json<Timestamp>, ApiError> {
    let time = lock(&storage)?.cycle_timestamp()?;
    Ok(Json(Timestamp { time }))
}

pub async fn put_timestamp(
    State(storage): State<SharedStorage>,
    Json(body): Json<Timestamp>,
) -> Result<Json<Timestamp>, ApiError> {
    lock(&storage)?.set_cycle_timestamp(body.time)?;
    tracing::info!("Cycle timestamp set to {} via API", body.time);
    Ok(Json(body))
}

pub async fn list_urls(
    State(storage): State<SharedStorage>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<StoredLink>>, ApiError> {
    let links = lock(&storage)?.list_links(page.skip, page.limit)?;
    Ok(Json(links))
}

pub async fn get_url(
    State(storage): State<SharedStorage>,
    Path(id): Path<i64>,
) -> Result<Json<StoredLink>, ApiError> {
    lock(&storage)?
        .get_link(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Link ID {} not found", id)))
}

pub async fn create_url(
    State(storage): State<SharedStorage>,
    Json(body): Json<NewLink>,
) -> Result<Json<StoredLink>, ApiError> {
    let created = lock(&storage)?.create_link(&body.link, &body.modified)?;
    Ok(Json(created))
}

pub async fn update_url(
    State(storage): State<SharedStorage>,
    Path(id): Path<i64>,
    Json(body): Json<ModifiedUpdate>,
) -> Result<Json<StoredLink>, ApiError> {
    let updated = lock(&storage)?.update_modified(id, &body.modified)?;
    Ok(Json(updated))
}

pub async fn delete_url(
    State(storage): State<SharedStorage>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let deleted = lock(&storage)?.delete_link(id)?;
    Ok(Json(json!({ "deleted": deleted.id, "link": deleted.link })))
}
