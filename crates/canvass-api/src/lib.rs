//! JSON REST API for canvass.
//!
//! Exposes an axum [`Router`] backed by any [`canvass_core::store::CrmStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", canvass_api::api_router(store.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod views;
pub mod workspaces;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use canvass_core::store::CrmStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CrmStore + 'static,
{
  Router::new()
    // Workspaces & lookups
    .route(
      "/workspaces",
      get(workspaces::list::<S>).post(workspaces::create::<S>),
    )
    .route(
      "/workspaces/{id}/tags",
      get(workspaces::list_tags::<S>).post(workspaces::add_tag::<S>),
    )
    .route("/races", get(workspaces::races::<S>))
    .route("/genders", get(workspaces::genders::<S>))
    // Contacts
    .route("/workspaces/{id}/contacts", get(contacts::list::<S>))
    .route("/contacts", post(contacts::create::<S>))
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .patch(contacts::update::<S>)
        .delete(contacts::delete::<S>),
    )
    .route("/contacts/{id}/emails", post(contacts::add_emails::<S>))
    .route(
      "/contacts/{id}/phone_numbers",
      post(contacts::add_phone_numbers::<S>),
    )
    .route("/contacts/{id}/addresses", post(contacts::add_addresses::<S>))
    .route(
      "/contacts/{id}/social_media_accounts",
      post(contacts::add_social_media_accounts::<S>),
    )
    .route("/contacts/{id}/tags", post(contacts::assign_tags::<S>))
    // Views
    .route("/workspaces/{id}/views", get(views::list::<S>))
    .route("/views", post(views::create::<S>))
    .route(
      "/views/{id}",
      axum::routing::put(views::update::<S>).delete(views::delete::<S>),
    )
    .route("/views/{id}/visibility", patch(views::set_visibility::<S>))
    .with_state(store)
}
