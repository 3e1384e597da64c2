//! Local persistence of the user's selections.
//!
//! Two values survive restarts: the selected workspace, and for each
//! workspace the last explicitly selected view. They are read when a
//! session starts and written on every explicit selection change.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
  sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PrefsError {
  #[error("failed to access {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed selection file {path}: {source}")]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub workspace: Option<Uuid>,
  #[serde(default)]
  pub views:     BTreeMap<Uuid, Uuid>,
}

pub trait SelectionStore: Send + Sync {
  fn selected_workspace(&self) -> Option<Uuid>;

  fn set_selected_workspace(&self, id: Option<Uuid>) -> Result<(), PrefsError>;

  fn selected_view(&self, workspace_id: Uuid) -> Option<Uuid>;

  fn set_selected_view(
    &self,
    workspace_id: Uuid,
    view_id: Option<Uuid>,
  ) -> Result<(), PrefsError>;
}

fn lock(m: &Mutex<Selection>) -> MutexGuard<'_, Selection> {
  m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── In-memory ───────────────────────────────────────────────────────────────

/// Selections that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPrefs(Mutex<Selection>);

impl SelectionStore for MemoryPrefs {
  fn selected_workspace(&self) -> Option<Uuid> { lock(&self.0).workspace }

  fn set_selected_workspace(&self, id: Option<Uuid>) -> Result<(), PrefsError> {
    lock(&self.0).workspace = id;
    Ok(())
  }

  fn selected_view(&self, workspace_id: Uuid) -> Option<Uuid> {
    lock(&self.0).views.get(&workspace_id).copied()
  }

  fn set_selected_view(
    &self,
    workspace_id: Uuid,
    view_id: Option<Uuid>,
  ) -> Result<(), PrefsError> {
    let mut sel = lock(&self.0);
    match view_id {
      Some(id) => sel.views.insert(workspace_id, id),
      None => sel.views.remove(&workspace_id),
    };
    Ok(())
  }
}

// ─── JSON file ───────────────────────────────────────────────────────────────

/// Selections stored in a small JSON file, rewritten on every change.
///
/// Writes are synchronous and happen under the selection lock, which keeps
/// them ordered. The document is a few hundred bytes, so callers on the async
/// runtime invoke the setters directly rather than through `spawn_blocking`.
#[derive(Debug)]
pub struct LocalPrefs {
  path:  PathBuf,
  state: Mutex<Selection>,
}

impl LocalPrefs {
  /// Load `path`, starting empty if the file does not exist yet.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
    let path = path.as_ref().to_path_buf();
    let state = match std::fs::read(&path) {
      Ok(bytes) => serde_json::from_slice(&bytes)
        .map_err(|source| PrefsError::Json { path: path.clone(), source })?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Selection::default(),
      Err(source) => return Err(PrefsError::Io { path, source }),
    };
    Ok(Self { path, state: Mutex::new(state) })
  }

  pub fn path(&self) -> &Path { &self.path }

  fn save(&self, sel: &Selection) -> Result<(), PrefsError> {
    let json = serde_json::to_vec_pretty(sel)
      .map_err(|source| PrefsError::Json { path: self.path.clone(), source })?;
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)
        .map_err(|source| PrefsError::Io { path: dir.to_path_buf(), source })?;
    }
    // Written beside the target and renamed over it, so a reader never sees
    // a half-written file.
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
      .map_err(|source| PrefsError::Io { path: tmp.clone(), source })?;
    std::fs::rename(&tmp, &self.path)
      .map_err(|source| PrefsError::Io { path: self.path.clone(), source })
  }
}

impl SelectionStore for LocalPrefs {
  fn selected_workspace(&self) -> Option<Uuid> { lock(&self.state).workspace }

  fn set_selected_workspace(&self, id: Option<Uuid>) -> Result<(), PrefsError> {
    let mut sel = lock(&self.state);
    sel.workspace = id;
    self.save(&sel)
  }

  fn selected_view(&self, workspace_id: Uuid) -> Option<Uuid> {
    lock(&self.state).views.get(&workspace_id).copied()
  }

  fn set_selected_view(
    &self,
    workspace_id: Uuid,
    view_id: Option<Uuid>,
  ) -> Result<(), PrefsError> {
    let mut sel = lock(&self.state);
    match view_id {
      Some(id) => sel.views.insert(workspace_id, id),
      None => sel.views.remove(&workspace_id),
    };
    self.save(&sel)
  }
}
