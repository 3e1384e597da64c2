//! [`StoreHandle`]: a lazily initialised, shareable slot for the backing
//! store.
//!
//! The bootstrap constructs one handle and passes clones to every consumer.
//! Until a store is installed (or while the installed store reports it is
//! not ready) every accessor fails with [`Error::NotInitialized`].

use std::{future::Future, sync::Arc};

use canvass_core::{Error, Result, store::CrmStore};
use tokio::sync::OnceCell;

pub struct StoreHandle<S> {
  cell: Arc<OnceCell<S>>,
}

impl<S> Clone for StoreHandle<S> {
  fn clone(&self) -> Self { Self { cell: Arc::clone(&self.cell) } }
}

impl<S> Default for StoreHandle<S> {
  fn default() -> Self { Self::empty() }
}

impl<S> StoreHandle<S> {
  /// A handle with nothing installed yet.
  pub fn empty() -> Self { Self { cell: Arc::new(OnceCell::new()) } }

  /// A handle that is ready from the start.
  pub fn ready(store: S) -> Self {
    Self { cell: Arc::new(OnceCell::new_with(Some(store))) }
  }
}

impl<S: CrmStore> StoreHandle<S> {
  /// Install the store. Returns the store back if one was already present.
  pub fn install(&self, store: S) -> std::result::Result<(), S> {
    self.cell.set(store).map_err(|e| match e {
      tokio::sync::SetError::AlreadyInitializedError(s)
      | tokio::sync::SetError::InitializingError(s) => s,
    })
  }

  /// Construct the store on first use. Concurrent callers wait for the same
  /// initialisation.
  pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<&S>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S>>,
  {
    self.cell.get_or_try_init(init).await
  }

  pub fn is_installed(&self) -> bool { self.cell.initialized() }

  /// The installed store, if it is ready to serve requests.
  pub fn get(&self) -> Result<&S> {
    self
      .cell
      .get()
      .filter(|store| store.is_ready())
      .ok_or(Error::NotInitialized)
  }
}
