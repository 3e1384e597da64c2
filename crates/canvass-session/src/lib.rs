//! Client-side session core for canvass.
//!
//! A [`Session`] carries what every component needs: the store handle, the
//! signed-in user, where notices go, and where selections persist. From it
//! the three stateful components are built:
//!
//! - [`ViewModel`]: saved views, selection, and debounced write-through
//! - [`ContactsCache`]: fetched contacts and their projection
//! - [`FormSession`]: a multi-entity contact draft

use std::sync::Arc;

use uuid::Uuid;

pub mod contacts;
pub mod form;
pub mod handle;
pub mod notify;
pub mod pending;
pub mod prefs;
pub mod views;

#[cfg(test)]
mod test_support;

pub use contacts::ContactsCache;
pub use form::{ContactDraft, FormSession};
pub use handle::StoreHandle;
pub use notify::{Notice, Notifier, TracingNotifier};
pub use pending::PendingWrite;
pub use prefs::{LocalPrefs, MemoryPrefs, SelectionStore};
pub use views::{ViewModel, WriteOutcome};

use canvass_core::store::CrmStore;

/// Shared context for one signed-in user.
pub struct Session<S> {
  pub store:    StoreHandle<S>,
  /// Stamped into `created_by` / `updated_by`.
  pub user_id:  Uuid,
  pub notifier: Arc<dyn Notifier>,
  pub prefs:    Arc<dyn SelectionStore>,
}

impl<S> Clone for Session<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      user_id:  self.user_id,
      notifier: Arc::clone(&self.notifier),
      prefs:    Arc::clone(&self.prefs),
    }
  }
}

impl<S: CrmStore + 'static> Session<S> {
  pub fn new(
    store: StoreHandle<S>,
    user_id: Uuid,
    notifier: Arc<dyn Notifier>,
    prefs: Arc<dyn SelectionStore>,
  ) -> Self {
    Self { store, user_id, notifier, prefs }
  }

  pub fn views(&self, workspace_id: Uuid) -> ViewModel<S> {
    ViewModel::new(self, workspace_id)
  }

  pub fn contacts(&self, workspace_id: Uuid) -> ContactsCache<S> {
    ContactsCache::new(self, workspace_id)
  }

  pub fn form(&self, workspace_id: Uuid) -> FormSession<S> {
    FormSession::new(self, workspace_id)
  }
}
