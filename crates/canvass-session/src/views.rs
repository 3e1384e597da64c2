//! [`ViewModel`]: the saved views of one workspace, the current selection,
//! and every write that changes them.
//!
//! Writes are single-flight: while one is outstanding, further writes return
//! [`WriteOutcome::Dropped`]. Visibility toggles are optimistic and carry a
//! pending marker until the store confirms them. Filter and sort edits are
//! applied locally and written through the [`Debouncer`].

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use canvass_core::{
  Error, Result,
  field::ContactField,
  store::CrmStore,
  view::{ContactFilter, ContactSorting, ContactView, NewContactView},
};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
  Session,
  handle::StoreHandle,
  notify::{Notice, Notifier},
  pending::{Debouncer, Fire, PendingWrite},
  prefs::SelectionStore,
};

/// Delay before a confirmed visibility toggle is reconciled with the store.
pub const RECONCILE_DELAY: Duration = Duration::from_millis(100);

/// Result of a write that may have been skipped by the single-flight guard.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T = ()> {
  Applied(T),
  /// Another write was in flight; nothing was sent.
  Dropped,
}

impl<T> WriteOutcome<T> {
  pub fn is_dropped(&self) -> bool { matches!(self, Self::Dropped) }

  pub fn applied(self) -> Option<T> {
    match self {
      Self::Applied(v) => Some(v),
      Self::Dropped => None,
    }
  }
}

// ─── Single-flight guard ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct WriteGuard(AtomicBool);

/// Releases the guard on drop.
struct WriteToken<'a>(&'a AtomicBool);

impl WriteGuard {
  fn try_acquire(&self) -> Option<WriteToken<'_>> {
    self
      .0
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .ok()
      .map(|_| WriteToken(&self.0))
  }

  fn is_held(&self) -> bool { self.0.load(Ordering::Acquire) }
}

impl Drop for WriteToken<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ViewState {
  views:          Vec<ContactView>,
  selected:       Option<Uuid>,
  /// Optimistic visibility flags awaiting confirmation, keyed by view and
  /// field. The value is the flag before the toggle.
  pending_fields: HashMap<(Uuid, ContactField), bool>,
}

impl ViewState {
  fn view(&self, id: Uuid) -> Option<&ContactView> {
    self.views.iter().find(|v| v.id == id)
  }

  fn view_mut(&mut self, id: Uuid) -> Option<&mut ContactView> {
    self.views.iter_mut().find(|v| v.id == id)
  }

  fn contains(&self, id: Uuid) -> bool { self.view(id).is_some() }

  /// Keep unconfirmed local edits on top of a copy that came from the store.
  fn merge_remote(&self, dirty: Option<Uuid>, mut remote: ContactView) -> ContactView {
    let Some(local) = self.view(remote.id) else {
      return remote;
    };
    for &(view_id, field) in self.pending_fields.keys() {
      if view_id == remote.id {
        remote.visibility.set(field, local.is_visible(field));
      }
    }
    if dirty == Some(remote.id) {
      remote.filters = local.filters.clone();
      remote.sorting = local.sorting.clone();
    }
    remote
  }

  fn replace(&mut self, dirty: Option<Uuid>, remote: ContactView) {
    let merged = self.merge_remote(dirty, remote);
    match self.view_mut(merged.id) {
      Some(slot) => *slot = merged,
      None => self.views.push(merged),
    }
  }
}

struct Inner<S> {
  store:        StoreHandle<S>,
  workspace_id: Uuid,
  user_id:      Uuid,
  state:        Mutex<ViewState>,
  debouncer:    Mutex<Debouncer>,
  guard:        WriteGuard,
  alive:        AtomicBool,
  notifier:     Arc<dyn Notifier>,
  prefs:        Arc<dyn SelectionStore>,
}

impl<S: CrmStore + 'static> Inner<S> {
  fn state(&self) -> MutexGuard<'_, ViewState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn debouncer(&self) -> MutexGuard<'_, Debouncer> {
    self.debouncer.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_alive(&self) -> bool { self.alive.load(Ordering::Acquire) }

  fn report(&self, what: &str, err: Error) -> Error {
    self.notifier.notify(Notice::error(format!("{what}: {err}")));
    err
  }

  fn store(&self) -> Result<&S> { self.store.get() }

  /// Load the workspace's views and fold them into local state.
  async fn refresh(&self) -> Result<()> {
    let fetched = self
      .store()?
      .list_views(self.workspace_id)
      .await
      .map_err(Into::into)?;
    if !self.is_alive() {
      return Ok(());
    }

    let dirty = self.debouncer().dirty_view();
    let mut st = self.state();
    let merged: Vec<ContactView> = fetched
      .into_iter()
      .map(|remote| st.merge_remote(dirty, remote))
      .collect();
    st.views = merged;

    let still_there = st.selected.is_some_and(|id| st.contains(id));
    if !still_there {
      let persisted = self
        .prefs
        .selected_view(self.workspace_id)
        .filter(|id| st.contains(*id));
      st.selected = persisted.or_else(|| st.views.first().map(|v| v.id));
    }
    tracing::debug!(
      workspace_id = %self.workspace_id,
      views = st.views.len(),
      "views refreshed"
    );
    Ok(())
  }

  /// A debounce timer for `generation` expired.
  async fn fire(&self, generation: u64) {
    if !self.is_alive() {
      return;
    }
    let busy = self.guard.is_held();
    let decision = self.debouncer().fire(generation, busy);
    let view_id = match decision {
      Fire::Start(view_id) => view_id,
      Fire::Stale => return,
      Fire::Busy => {
        tracing::debug!(generation, "debounced write dropped, another write in flight");
        return;
      }
    };

    let Some(_token) = self.guard.try_acquire() else {
      self.debouncer().finish(generation, Err("write in flight".into()));
      return;
    };
    let Some(view) = self.state().view(view_id).cloned() else {
      self.debouncer().finish(generation, Err("view no longer exists".into()));
      return;
    };

    let result = match self.store() {
      Ok(store) => store.update_view(view).await.map_err(Into::into),
      Err(e) => Err(e),
    };
    match result {
      Ok(saved) => {
        self.debouncer().finish(generation, Ok(()));
        if self.is_alive() {
          let dirty = self.debouncer().dirty_view();
          self.state().replace(dirty, saved);
        }
      }
      Err(e) => {
        self.debouncer().finish(generation, Err(e.to_string()));
        if self.is_alive() {
          self.report("could not save view", e);
        }
      }
    }
  }
}

// ─── ViewModel ───────────────────────────────────────────────────────────────

/// Views of a single workspace. Cheap to clone; clones share state.
pub struct ViewModel<S> {
  inner: Arc<Inner<S>>,
}

impl<S> Clone for ViewModel<S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S: CrmStore + 'static> ViewModel<S> {
  pub fn new(session: &Session<S>, workspace_id: Uuid) -> Self {
    Self::with_debouncer(session, workspace_id, Debouncer::default())
  }

  pub fn with_debouncer(
    session: &Session<S>,
    workspace_id: Uuid,
    debouncer: Debouncer,
  ) -> Self {
    Self {
      inner: Arc::new(Inner {
        store: session.store.clone(),
        workspace_id,
        user_id: session.user_id,
        state: Mutex::new(ViewState::default()),
        debouncer: Mutex::new(debouncer),
        guard: WriteGuard::default(),
        alive: AtomicBool::new(true),
        notifier: Arc::clone(&session.notifier),
        prefs: Arc::clone(&session.prefs),
      }),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn workspace_id(&self) -> Uuid { self.inner.workspace_id }

  pub fn views(&self) -> Vec<ContactView> { self.inner.state().views.clone() }

  pub fn selected_view_id(&self) -> Option<Uuid> { self.inner.state().selected }

  pub fn selected_view(&self) -> Option<ContactView> {
    let st = self.inner.state();
    st.selected.and_then(|id| st.view(id).cloned())
  }

  /// Whether `field` on the selected view has an unconfirmed toggle.
  pub fn is_pending(&self, field: ContactField) -> bool {
    let st = self.inner.state();
    st.selected
      .is_some_and(|id| st.pending_fields.contains_key(&(id, field)))
  }

  pub fn pending_write(&self) -> PendingWrite {
    self.inner.debouncer().state().clone()
  }

  pub fn write_in_flight(&self) -> bool { self.inner.guard.is_held() }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// Stop background tasks from touching state. Requests already sent are
  /// not cancelled.
  pub fn shutdown(&self) { self.inner.alive.store(false, Ordering::Release); }

  pub fn is_alive(&self) -> bool { self.inner.is_alive() }

  // ── Fetch & select ────────────────────────────────────────────────────────

  /// Load the workspace's views. When nothing is selected, the persisted
  /// selection is restored if it still exists, else the first view is
  /// selected.
  pub async fn fetch_views(&self) -> Result<Vec<ContactView>> {
    match self.inner.refresh().await {
      Ok(()) => Ok(self.views()),
      Err(e) => Err(self.inner.report("could not load views", e)),
    }
  }

  /// Select `id` and remember it for this workspace.
  pub fn select_view(&self, id: Uuid) -> Result<()> {
    {
      let mut st = self.inner.state();
      if !st.contains(id) {
        return Err(Error::ViewNotFound(id));
      }
      st.selected = Some(id);
    }
    self.persist_selection(Some(id));
    Ok(())
  }

  fn persist_selection(&self, id: Option<Uuid>) {
    if let Err(e) = self.inner.prefs.set_selected_view(self.inner.workspace_id, id) {
      tracing::warn!(error = %e, "could not persist view selection");
    }
  }

  fn require_selected(&self) -> Result<Uuid> {
    self
      .selected_view_id()
      .ok_or(Error::NoViewSelected)
      .map_err(|e| self.inner.report("no view selected", e))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create a view with every field visible and no filters or sort keys.
  /// The new view is selected only if the workspace had none before.
  pub async fn create_view(&self, name: &str) -> Result<WriteOutcome<ContactView>> {
    let inner = &self.inner;
    let name = name.trim();
    if name.is_empty() {
      let err = Error::Validation("view name is required".into());
      return Err(inner.report("could not create view", err));
    }
    let Some(_token) = inner.guard.try_acquire() else {
      return Ok(WriteOutcome::Dropped);
    };

    let had_none = inner.state().views.is_empty();
    let input = NewContactView {
      workspace_id: inner.workspace_id,
      name:         name.to_owned(),
      created_by:   inner.user_id,
    };
    let created = match inner.store() {
      Ok(store) => store.insert_view(input).await.map_err(Into::into),
      Err(e) => Err(e),
    }
    .map_err(|e| inner.report("could not create view", e))?;
    tracing::info!(view_id = %created.id, name = %created.name, "view created");

    if !inner.is_alive() {
      return Ok(WriteOutcome::Applied(created));
    }
    {
      let dirty = inner.debouncer().dirty_view();
      let mut st = inner.state();
      st.replace(dirty, created.clone());
      if had_none {
        st.selected = Some(created.id);
      }
    }
    if had_none {
      self.persist_selection(Some(created.id));
    }
    if let Err(e) = inner.refresh().await {
      inner.report("could not reload views", e);
    }
    Ok(WriteOutcome::Applied(created))
  }

  /// Rename the selected view. The local copy changes first and is restored
  /// if the write fails.
  pub async fn edit_view(&self, name: &str) -> Result<WriteOutcome<ContactView>> {
    let inner = &self.inner;
    let name = name.trim();
    if name.is_empty() {
      let err = Error::Validation("view name is required".into());
      return Err(inner.report("could not rename view", err));
    }
    let Some(_token) = inner.guard.try_acquire() else {
      return Ok(WriteOutcome::Dropped);
    };
    let id = self.require_selected()?;

    let (previous, renamed) = {
      let mut st = inner.state();
      let view = st.view_mut(id).ok_or(Error::ViewNotFound(id))?;
      let previous = std::mem::replace(&mut view.name, name.to_owned());
      (previous, view.clone())
    };

    let result = match inner.store() {
      Ok(store) => store.update_view(renamed).await.map_err(Into::into),
      Err(e) => Err(e),
    };
    let saved = match result {
      Ok(saved) => saved,
      Err(e) => {
        if inner.is_alive() {
          if let Some(view) = inner.state().view_mut(id) {
            view.name = previous;
          }
        }
        return Err(inner.report("could not rename view", e));
      }
    };

    if inner.is_alive() {
      let dirty = inner.debouncer().dirty_view();
      inner.state().replace(dirty, saved.clone());
      if let Err(e) = inner.refresh().await {
        inner.report("could not reload views", e);
      }
    }
    Ok(WriteOutcome::Applied(saved))
  }

  /// Delete the selected view. Selection falls over to the first other view
  /// still held locally, or to none.
  pub async fn delete_view(&self) -> Result<WriteOutcome> {
    let inner = &self.inner;
    let Some(_token) = inner.guard.try_acquire() else {
      return Ok(WriteOutcome::Dropped);
    };
    let id = self.require_selected()?;

    let result = match inner.store() {
      Ok(store) => store.delete_view(id).await.map_err(Into::into),
      Err(e) => Err(e),
    };
    result.map_err(|e| inner.report("could not delete view", e))?;
    tracing::info!(view_id = %id, "view deleted");

    if !inner.is_alive() {
      return Ok(WriteOutcome::Applied(()));
    }
    let fallback = {
      let mut st = inner.state();
      let fallback = st.views.iter().find(|v| v.id != id).map(|v| v.id);
      st.views.retain(|v| v.id != id);
      st.pending_fields.retain(|(view_id, _), _| *view_id != id);
      st.selected = fallback;
      fallback
    };
    self.persist_selection(fallback);
    Ok(WriteOutcome::Applied(()))
  }

  /// Toggle one visibility flag on the selected view.
  ///
  /// The flag changes locally at once and is marked pending. On success the
  /// marker is cleared and a refetch is scheduled [`RECONCILE_DELAY`] later;
  /// on failure the flag is rolled back.
  pub async fn update_view_field(
    &self,
    field: ContactField,
    visible: bool,
  ) -> Result<WriteOutcome> {
    let inner = &self.inner;
    let Some(_token) = inner.guard.try_acquire() else {
      return Ok(WriteOutcome::Dropped);
    };
    let id = self.require_selected()?;

    let previous = {
      let mut st = inner.state();
      let view = st.view_mut(id).ok_or(Error::ViewNotFound(id))?;
      let previous = view.is_visible(field);
      view.visibility.set(field, visible);
      st.pending_fields.insert((id, field), previous);
      previous
    };

    let result = match inner.store() {
      Ok(store) => store
        .set_view_visibility(id, field, visible)
        .await
        .map_err(Into::into),
      Err(e) => Err(e),
    };

    match result {
      Ok(_) => {
        if inner.is_alive() {
          inner.state().pending_fields.remove(&(id, field));
          let bg = Arc::clone(inner);
          tokio::spawn(async move {
            tokio::time::sleep(RECONCILE_DELAY).await;
            if !bg.is_alive() {
              return;
            }
            if let Err(e) = bg.refresh().await {
              bg.report("could not reload views", e);
            }
          });
        }
        Ok(WriteOutcome::Applied(()))
      }
      Err(e) => {
        if inner.is_alive() {
          let mut st = inner.state();
          st.pending_fields.remove(&(id, field));
          if let Some(view) = st.view_mut(id) {
            view.visibility.set(field, previous);
          }
        }
        Err(inner.report("could not update field visibility", e))
      }
    }
  }

  /// Write the whole view (name, visibility, filters, sorting) at once.
  pub async fn update_view_in_database(
    &self,
    view: ContactView,
  ) -> Result<WriteOutcome<ContactView>> {
    let inner = &self.inner;
    let Some(_token) = inner.guard.try_acquire() else {
      return Ok(WriteOutcome::Dropped);
    };
    let result = match inner.store() {
      Ok(store) => store.update_view(view).await.map_err(Into::into),
      Err(e) => Err(e),
    };
    let saved = result.map_err(|e| inner.report("could not save view", e))?;

    if inner.is_alive() {
      let dirty = inner.debouncer().dirty_view();
      inner.state().replace(dirty, saved.clone());
    }
    Ok(WriteOutcome::Applied(saved))
  }

  // ── Filter & sort editing ─────────────────────────────────────────────────

  pub fn add_filter(&self, filter: ContactFilter) -> Result<()> {
    self.edit_selected(|view| {
      view.filters.push(filter);
      Ok(())
    })
  }

  pub fn update_filter(&self, index: usize, filter: ContactFilter) -> Result<()> {
    self.edit_selected(|view| replace_at(&mut view.filters, index, filter, "filter"))
  }

  pub fn remove_filter(&self, index: usize) -> Result<()> {
    self.edit_selected(|view| remove_at(&mut view.filters, index, "filter"))
  }

  pub fn add_sort(&self, sorting: ContactSorting) -> Result<()> {
    self.edit_selected(|view| {
      view.sorting.push(sorting);
      Ok(())
    })
  }

  pub fn update_sort(&self, index: usize, sorting: ContactSorting) -> Result<()> {
    self.edit_selected(|view| replace_at(&mut view.sorting, index, sorting, "sort key"))
  }

  pub fn remove_sort(&self, index: usize) -> Result<()> {
    self.edit_selected(|view| remove_at(&mut view.sorting, index, "sort key"))
  }

  /// Apply `edit` to the selected view, then schedule a debounced write.
  fn edit_selected(
    &self,
    edit: impl FnOnce(&mut ContactView) -> Result<()>,
  ) -> Result<()> {
    let view_id = {
      let mut st = self.inner.state();
      let id = st.selected.ok_or(Error::NoViewSelected)?;
      let view = st.view_mut(id).ok_or(Error::ViewNotFound(id))?;
      edit(view)?;
      id
    };

    let ticket = self.inner.debouncer().schedule(view_id, Instant::now());
    let inner = Arc::clone(&self.inner);
    tokio::spawn(async move {
      tokio::time::sleep_until(ticket.deadline).await;
      inner.fire(ticket.generation).await;
    });
    Ok(())
  }
}

fn replace_at<T>(items: &mut [T], index: usize, value: T, what: &str) -> Result<()> {
  let slot = items
    .get_mut(index)
    .ok_or_else(|| Error::Validation(format!("no {what} at position {index}")))?;
  *slot = value;
  Ok(())
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &str) -> Result<()> {
  if index >= items.len() {
    return Err(Error::Validation(format!("no {what} at position {index}")));
  }
  items.remove(index);
  Ok(())
}
