//! HTTP server for canvass.
//!
//! Mounts the JSON API from `canvass-api` under `/api`, guarded by HTTP
//! Basic auth, over an in-process SQLite store. `/health` stays open so
//! load balancers can probe without credentials.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{Router, middleware, routing::get};
use canvass_core::store::CrmStore;
use canvass_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CANVASS_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState<S> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level axum [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CrmStore + 'static,
{
  let api = canvass_api::api_router(state.store).route_layer(
    middleware::from_fn_with_state(state.auth, auth::require_auth),
  );

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Bootstrap helpers ────────────────────────────────────────────────────────

/// Open (creating if needed) the SQLite store named by `config`.
pub async fn open_store(config: &ServerConfig) -> Result<SqliteStore, Error> {
  let path = expand_tilde(&config.store_path);
  tracing::info!(path = %path.display(), "opening store");
  Ok(SqliteStore::open(&path).await?)
}

/// Produce the argon2 PHC string for `password`.
pub fn hash_password(
  password: &str,
) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────
