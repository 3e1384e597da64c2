//! Handlers for contacts and their child collections.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/workspaces/{id}/contacts` | `?q=` free text, `?view=` view id |
//! | `POST`   | `/contacts` | Body: [`NewContact`] |
//! | `GET`    | `/contacts/{id}` | 404 if not found |
//! | `PATCH`  | `/contacts/{id}` | Body: [`ContactPatch`] |
//! | `DELETE` | `/contacts/{id}` | Removes child rows too |
//! | `POST`   | `/contacts/{id}/emails` | Body: `[NewEmail]` |
//! | `POST`   | `/contacts/{id}/phone_numbers` | Body: `[NewPhoneNumber]` |
//! | `POST`   | `/contacts/{id}/addresses` | Body: `[NewAddress]` |
//! | `POST`   | `/contacts/{id}/social_media_accounts` | Body: `[NewSocialMediaAccount]` |
//! | `POST`   | `/contacts/{id}/tags` | Body: `{"tag_ids":[...]}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  contact::{
    Address, Contact, ContactPatch, Email, NewAddress, NewContact, NewEmail,
    NewPhoneNumber, NewSocialMediaAccount, PhoneNumber, SocialMediaAccount,
    TagAssignment,
  },
  store::CrmStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, store_err};

// ─── List / project ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Free-text search over names and VAN id.
  pub q:    Option<String>,
  /// Apply this view's filters and sort keys.
  pub view: Option<Uuid>,
}

/// `GET /workspaces/{id}/contacts[?q=...][&view=...]`
///
/// Without parameters every contact is returned in store order. With either
/// parameter the rows are projected the same way a client table shows them.
pub async fn list<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(workspace_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contact>>, ApiError> {
  let contacts = store.list_contacts(workspace_id).await.map_err(store_err)?;

  let view = match params.view {
    Some(view_id) => Some(
      store
        .list_views(workspace_id)
        .await
        .map_err(store_err)?
        .into_iter()
        .find(|v| v.id == view_id)
        .ok_or_else(|| ApiError::NotFound(format!("view {view_id} not found")))?,
    ),
    None => None,
  };
  let query = params.q.unwrap_or_default();
  if query.is_empty() && view.is_none() {
    return Ok(Json(contacts));
  }

  let rows = canvass_core::project(&contacts, &query, view.as_ref())
    .into_iter()
    .cloned()
    .collect();
  Ok(Json(rows))
}

// ─── Single contact ──────────────────────────────────────────────────────────

/// `POST /contacts`
pub async fn create<S: CrmStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewContact>,
) -> Result<impl IntoResponse, ApiError> {
  let contact = store.insert_contact(body).await.map_err(store_err)?;
  tracing::info!(contact_id = %contact.id, "contact created");
  Ok((StatusCode::CREATED, Json(contact)))
}

/// `GET /contacts/{id}`
pub async fn get_one<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
  let contact = store
    .get_contact(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}

/// `PATCH /contacts/{id}`
pub async fn update<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
  Ok(Json(store.update_contact(id, patch).await.map_err(store_err)?))
}

/// `DELETE /contacts/{id}`
pub async fn delete<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_contact(id).await.map_err(store_err)?;
  tracing::info!(contact_id = %id, "contact deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Child collections ───────────────────────────────────────────────────────

/// `POST /contacts/{id}/emails`
pub async fn add_emails<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(rows): Json<Vec<NewEmail>>,
) -> Result<impl IntoResponse, ApiError> {
  let rows: Vec<Email> = store.insert_emails(id, rows).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(rows)))
}

/// `POST /contacts/{id}/phone_numbers`
pub async fn add_phone_numbers<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(rows): Json<Vec<NewPhoneNumber>>,
) -> Result<impl IntoResponse, ApiError> {
  let rows: Vec<PhoneNumber> =
    store.insert_phone_numbers(id, rows).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(rows)))
}

/// `POST /contacts/{id}/addresses`
pub async fn add_addresses<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(rows): Json<Vec<NewAddress>>,
) -> Result<impl IntoResponse, ApiError> {
  let rows: Vec<Address> = store.insert_addresses(id, rows).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(rows)))
}

/// `POST /contacts/{id}/social_media_accounts`
pub async fn add_social_media_accounts<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(rows): Json<Vec<NewSocialMediaAccount>>,
) -> Result<impl IntoResponse, ApiError> {
  let rows: Vec<SocialMediaAccount> = store
    .insert_social_media_accounts(id, rows)
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(rows)))
}

#[derive(Debug, Deserialize)]
pub struct AssignTagsBody {
  pub tag_ids: Vec<Uuid>,
}

/// `POST /contacts/{id}/tags`
pub async fn assign_tags<S: CrmStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignTagsBody>,
) -> Result<impl IntoResponse, ApiError> {
  let rows: Vec<TagAssignment> =
    store.assign_tags(id, body.tag_ids).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(rows)))
}
