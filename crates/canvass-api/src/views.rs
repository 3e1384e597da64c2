//! Handlers for saved contact views.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/workspaces/{id}/views` | |
//! | `POST`   | `/views` | Body: [`NewContactView`] |
//! | `PUT`    | `/views/{id}` | Full write of a [`ContactView`] |
//! | `PATCH`  | `/views/{id}/visibility` | Body: `{"field":"emails","visible":false}` |
//! | `DELETE` | `/views/{id}` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  field::ContactField,
  store::CrmStore,
  view::{ContactView, NewContactView},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, store_err};

/// `GET /workspaces/{id}/views`
pub async fn list<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(workspace_id): Path<Uuid>,
) -> Result<Json<Vec<ContactView>>, ApiError> {
  Ok(Json(store.list_views(workspace_id).await.map_err(store_err)?))
}

/// `POST /views`
pub async fn create<S: CrmStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewContactView>,
) -> Result<impl IntoResponse, ApiError> {
  let view = store.insert_view(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /views/{id}`
pub async fn update<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(view): Json<ContactView>,
) -> Result<Json<ContactView>, ApiError> {
  if view.id != id {
    return Err(ApiError::BadRequest(format!(
      "body id {} does not match path id {id}",
      view.id
    )));
  }
  Ok(Json(store.update_view(view).await.map_err(store_err)?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisibilityBody {
  pub field:   ContactField,
  pub visible: bool,
}

/// `PATCH /views/{id}/visibility`
pub async fn set_visibility<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<VisibilityBody>,
) -> Result<Json<ContactView>, ApiError> {
  let view = store
    .set_view_visibility(id, body.field, body.visible)
    .await
    .map_err(store_err)?;
  Ok(Json(view))
}

/// `DELETE /views/{id}`
pub async fn delete<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_view(id).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}
