//! `canvass`: command-line client for a canvass server.
//!
//! # Usage
//!
//! ```text
//! canvass --url http://localhost:8080 --user organizer --password secret workspaces list
//! canvass --config ~/.config/canvass/config.toml contacts list --query smith
//! ```
//!
//! The selected workspace and each workspace's selected view are remembered
//! between runs in a small JSON file next to the config.

mod client;
mod commands;
mod table;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use canvass_session::{LocalPrefs, Session, StoreHandle, TracingNotifier};
use clap::Parser;
use client::{ApiConfig, RemoteStore};
use commands::Command;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "canvass", about = "Command-line client for the canvass contact CRM")]
struct Args {
  /// Path to a TOML config file (url, username, password, user_id).
  #[arg(short, long, value_name = "FILE", env = "CANVASS_CONFIG")]
  config: Option<PathBuf>,

  /// Base URL of the canvass server (default: http://localhost:8080).
  #[arg(long, env = "CANVASS_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "CANVASS_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "CANVASS_PASSWORD")]
  password: Option<String>,

  /// Where selections are remembered between runs.
  #[arg(long, env = "CANVASS_PREFS", value_name = "FILE")]
  prefs: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
  /// Recorded as `created_by` / `updated_by` on writes.
  #[serde(default)]
  user_id:  Option<Uuid>,
  #[serde(default)]
  prefs:    Option<PathBuf>,
}

fn default_prefs_path() -> PathBuf {
  match std::env::var("HOME") {
    Ok(home) => PathBuf::from(home).join(".config/canvass/selection.json"),
    Err(_) => PathBuf::from(".canvass-selection.json"),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    username: args
      .user
      .or_else(|| (!file_cfg.username.is_empty()).then(|| file_cfg.username.clone()))
      .unwrap_or_default(),
    password: args
      .password
      .or_else(|| (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone()))
      .unwrap_or_default(),
  };
  let prefs_path = args
    .prefs
    .or(file_cfg.prefs)
    .unwrap_or_else(default_prefs_path);

  let store = RemoteStore::new(api_config).context("failed to build HTTP client")?;
  let prefs = LocalPrefs::open(&prefs_path)
    .with_context(|| format!("reading selections from {}", prefs_path.display()))?;

  let session = Session::new(
    StoreHandle::ready(store),
    file_cfg.user_id.unwrap_or_else(Uuid::nil),
    Arc::new(TracingNotifier),
    Arc::new(prefs),
  );

  let mut out = std::io::stdout().lock();
  commands::run(&session, args.command, &mut out).await
}
