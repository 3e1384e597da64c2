//! Handlers for workspaces and the lookup tables.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/workspaces` | |
//! | `POST` | `/workspaces` | Body: `{"name":"Field Team"}` |
//! | `GET`  | `/workspaces/{id}/tags` | |
//! | `POST` | `/workspaces/{id}/tags` | Body: `{"tag":"volunteer"}`; idempotent |
//! | `GET`  | `/races` | |
//! | `GET`  | `/genders` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  contact::{Gender, Race, Tag, Workspace},
  store::CrmStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, store_err};

// ─── Workspaces ──────────────────────────────────────────────────────────────

/// `GET /workspaces`
pub async fn list<S: CrmStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Workspace>>, ApiError> {
  Ok(Json(store.list_workspaces().await.map_err(store_err)?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /workspaces`
pub async fn create<S: CrmStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let workspace = store.add_workspace(body.name).await.map_err(store_err)?;
  tracing::info!(workspace_id = %workspace.id, "workspace created");
  Ok((StatusCode::CREATED, Json(workspace)))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// `GET /workspaces/{id}/tags`
pub async fn list_tags<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(workspace_id): Path<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
  Ok(Json(store.list_tags(workspace_id).await.map_err(store_err)?))
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
  pub tag: String,
}

/// `POST /workspaces/{id}/tags`
pub async fn add_tag<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(workspace_id): Path<Uuid>,
  Json(body): Json<TagBody>,
) -> Result<Json<Tag>, ApiError> {
  Ok(Json(store.add_tag(workspace_id, body.tag).await.map_err(store_err)?))
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// `GET /races`
pub async fn races<S: CrmStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Race>>, ApiError> {
  Ok(Json(store.list_races().await.map_err(store_err)?))
}

/// `GET /genders`
pub async fn genders<S: CrmStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Gender>>, ApiError> {
  Ok(Json(store.list_genders().await.map_err(store_err)?))
}
