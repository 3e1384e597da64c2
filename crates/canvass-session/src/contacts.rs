//! [`ContactsCache`]: every contact of a workspace plus the rows the current
//! query and view project out of them.

use std::{collections::HashMap, sync::Arc, time::Duration};

use canvass_core::{
  Error, Result,
  contact::{Contact, ContactPatch, NewContact},
  store::CrmStore,
  view::ContactView,
};
use uuid::Uuid;

use crate::{
  Session,
  handle::StoreHandle,
  notify::{Notice, Notifier},
};

/// Extra attempts made when the store is not initialised yet.
pub const NOT_READY_RETRIES: u32 = 3;
pub const NOT_READY_BACKOFF: Duration = Duration::from_millis(500);

pub struct ContactsCache<S> {
  store:        StoreHandle<S>,
  workspace_id: Uuid,
  user_id:      Uuid,
  notifier:     Arc<dyn Notifier>,
  contacts:     Vec<Contact>,
  query:        String,
  view:         Option<ContactView>,
  /// Indices into `contacts`, in display order.
  rows:         Vec<usize>,
  /// Set when the store never became ready; cleared by the next good fetch.
  fatal:        Option<Error>,
}

impl<S: CrmStore> ContactsCache<S> {
  pub fn new(session: &Session<S>, workspace_id: Uuid) -> Self {
    Self {
      store: session.store.clone(),
      workspace_id,
      user_id: session.user_id,
      notifier: Arc::clone(&session.notifier),
      contacts: Vec::new(),
      query: String::new(),
      view: None,
      rows: Vec::new(),
      fatal: None,
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Everything fetched, in store order.
  pub fn all(&self) -> &[Contact] { &self.contacts }

  /// The projected rows.
  pub fn rows(&self) -> impl Iterator<Item = &Contact> + '_ {
    self.rows.iter().map(|&i| &self.contacts[i])
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn query(&self) -> &str { &self.query }

  pub fn view(&self) -> Option<&ContactView> { self.view.as_ref() }

  pub fn fatal_error(&self) -> Option<&Error> { self.fatal.as_ref() }

  // ── Projection inputs ─────────────────────────────────────────────────────

  pub fn set_query(&mut self, query: impl Into<String>) {
    self.query = query.into();
    self.recompute();
  }

  /// Replace the active view, e.g. after its filters, sorting or visibility
  /// changed.
  pub fn set_view(&mut self, view: Option<ContactView>) {
    self.view = view;
    self.recompute();
  }

  fn recompute(&mut self) {
    let index: HashMap<Uuid, usize> = self
      .contacts
      .iter()
      .enumerate()
      .map(|(i, c)| (c.id, i))
      .collect();
    self.rows = canvass_core::project(&self.contacts, &self.query, self.view.as_ref())
      .into_iter()
      .filter_map(|c| index.get(&c.id).copied())
      .collect();
  }

  // ── Fetch ─────────────────────────────────────────────────────────────────

  /// Reload the workspace's contacts.
  ///
  /// A store that is not initialised is retried [`NOT_READY_RETRIES`] times,
  /// [`NOT_READY_BACKOFF`] apart, before the error is recorded as fatal.
  /// Any other failure is reported and leaves the cached contacts in place.
  pub async fn fetch_contacts(&mut self) -> Result<()> {
    let mut attempt = 0;
    let fetched = loop {
      let result = match self.store.get() {
        Ok(store) => store
          .list_contacts(self.workspace_id)
          .await
          .map_err(Into::into),
        Err(e) => Err(e),
      };
      match result {
        Ok(contacts) => break contacts,
        Err(e) if e.is_not_initialized() && attempt < NOT_READY_RETRIES => {
          attempt += 1;
          tracing::debug!(attempt, "store not ready, retrying contact fetch");
          tokio::time::sleep(NOT_READY_BACKOFF).await;
        }
        Err(e) if e.is_not_initialized() => {
          self.fatal = Some(Error::NotInitialized);
          return Err(e);
        }
        Err(e) => {
          self.notifier.notify(Notice::error(format!("could not load contacts: {e}")));
          return Err(e);
        }
      }
    };

    tracing::debug!(
      workspace_id = %self.workspace_id,
      contacts = fetched.len(),
      "contacts fetched"
    );
    self.contacts = fetched;
    self.fatal = None;
    self.recompute();
    Ok(())
  }

  /// Refetch after a write, reporting rather than returning a failure.
  async fn refetch(&mut self) {
    // fetch_contacts already reported anything worth reporting.
    let _ = self.fetch_contacts().await;
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Insert a contact into this workspace, stamped with the session user.
  pub async fn create_contact(&mut self, mut input: NewContact) -> Result<Contact> {
    input.workspace_id = self.workspace_id;
    input.created_by = self.user_id;
    if let Err(e) = input.validate() {
      return Err(self.report("could not create contact", e));
    }

    let store = self.store.get().map_err(|e| self.report("could not create contact", e))?;
    let created = store
      .insert_contact(input)
      .await
      .map_err(|e| self.report("could not create contact", e.into()))?;
    self.refetch().await;
    Ok(created)
  }

  pub async fn update_contact(
    &mut self,
    id: Uuid,
    mut patch: ContactPatch,
  ) -> Result<Contact> {
    patch.updated_by = self.user_id;
    if let Err(e) = patch.validate() {
      return Err(self.report("could not update contact", e));
    }

    let store = self.store.get().map_err(|e| self.report("could not update contact", e))?;
    let updated = store
      .update_contact(id, patch)
      .await
      .map_err(|e| self.report("could not update contact", e.into()))?;
    self.refetch().await;
    Ok(updated)
  }

  pub async fn delete_contact(&mut self, id: Uuid) -> Result<()> {
    let store = self.store.get().map_err(|e| self.report("could not delete contact", e))?;
    store
      .delete_contact(id)
      .await
      .map_err(|e| self.report("could not delete contact", e.into()))?;
    tracing::info!(contact_id = %id, "contact deleted");
    self.refetch().await;
    Ok(())
  }

  fn report(&self, what: &str, err: Error) -> Error {
    self.notifier.notify(Notice::error(format!("{what}: {err}")));
    err
  }
}
