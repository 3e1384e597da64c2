//! An in-memory [`CrmStore`] with failure injection, call counting, and an
//! optional per-call delay.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use canvass_core::{
  contact::{
    Address, Contact, ContactPatch, Email, Gender, NewAddress, NewContact,
    NewEmail, NewPhoneNumber, NewSocialMediaAccount, PhoneNumber, Race,
    SocialMediaAccount, Tag, TagAssignment, Workspace,
  },
  field::ContactField,
  store::CrmStore,
  view::{ContactView, FieldVisibility, NewContactView},
};
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
  ListContacts,
  InsertContact,
  UpdateContact,
  DeleteContact,
  InsertEmails,
  InsertPhoneNumbers,
  InsertAddresses,
  InsertSocialMediaAccounts,
  AssignTags,
  ListViews,
  InsertView,
  UpdateView,
  SetViewVisibility,
  DeleteView,
  Other,
}

#[derive(Debug, thiserror::Error)]
#[error("fake store: {0:?} failed")]
pub struct FakeError(Op);

impl From<FakeError> for canvass_core::Error {
  fn from(err: FakeError) -> Self { Self::network(err) }
}

#[derive(Debug, Default)]
struct Data {
  contacts: Vec<Contact>,
  views:    Vec<ContactView>,
  tags:     Vec<Tag>,
}

#[derive(Debug, Default)]
struct Shared {
  data:            Mutex<Data>,
  failing:         Mutex<HashSet<Op>>,
  calls:           Mutex<HashMap<Op, usize>>,
  delay:           Mutex<Duration>,
  not_ready_polls: AtomicUsize,
}

/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct FakeStore(Arc<Shared>);

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeStore {
  /// A fresh workspace id. The fake does not track workspaces.
  pub fn workspace(&self) -> Uuid { Uuid::new_v4() }

  pub fn fail(&self, op: Op) { lock(&self.0.failing).insert(op); }

  pub fn succeed(&self, op: Op) { lock(&self.0.failing).remove(&op); }

  pub fn calls(&self, op: Op) -> usize {
    lock(&self.0.calls).get(&op).copied().unwrap_or(0)
  }

  pub fn set_delay(&self, delay: Duration) { *lock(&self.0.delay) = delay; }

  /// `is_ready` answers `false` for the next `n` polls.
  pub fn set_not_ready_polls(&self, n: usize) {
    self.0.not_ready_polls.store(n, Ordering::SeqCst);
  }

  pub fn seed_view(&self, workspace_id: Uuid, name: &str) -> Uuid {
    let now = Utc::now();
    let view = ContactView {
      id: Uuid::new_v4(),
      workspace_id,
      name: name.into(),
      visibility: FieldVisibility::default(),
      filters: Vec::new(),
      sorting: Vec::new(),
      created_by: Uuid::nil(),
      created_at: now,
      updated_at: now,
    };
    let id = view.id;
    lock(&self.0.data).views.push(view);
    id
  }

  pub fn seed_contact(&self, workspace_id: Uuid, first: &str, last: &str) -> Contact {
    let contact = contact_from(NewContact {
      workspace_id,
      first_name: first.into(),
      last_name: last.into(),
      ..Default::default()
    });
    lock(&self.0.data).contacts.push(contact.clone());
    contact
  }

  pub fn view(&self, id: Uuid) -> Option<ContactView> {
    lock(&self.0.data).views.iter().find(|v| v.id == id).cloned()
  }

  pub fn contact(&self, id: Uuid) -> Option<Contact> {
    lock(&self.0.data).contacts.iter().find(|c| c.id == id).cloned()
  }

  pub fn contact_count(&self) -> usize { lock(&self.0.data).contacts.len() }

  async fn enter(&self, op: Op) -> Result<(), FakeError> {
    *lock(&self.0.calls).entry(op).or_default() += 1;
    let delay = *lock(&self.0.delay);
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    if lock(&self.0.failing).contains(&op) {
      return Err(FakeError(op));
    }
    Ok(())
  }

  fn with_contact<T>(
    &self,
    op: Op,
    id: Uuid,
    f: impl FnOnce(&mut Contact) -> T,
  ) -> Result<T, FakeError> {
    let mut data = lock(&self.0.data);
    let contact = data
      .contacts
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or(FakeError(op))?;
    Ok(f(contact))
  }
}

fn contact_from(input: NewContact) -> Contact {
  let now = Utc::now();
  Contact {
    id: Uuid::new_v4(),
    workspace_id: input.workspace_id,
    first_name: input.first_name,
    middle_name: input.middle_name,
    last_name: input.last_name,
    race_id: input.race_id,
    race: None,
    gender_id: input.gender_id,
    gender: None,
    pronouns: input.pronouns,
    vanid: input.vanid,
    status: input.status,
    created_by: input.created_by,
    updated_by: input.created_by,
    created_at: now,
    updated_at: now,
    emails: Vec::new(),
    phone_numbers: Vec::new(),
    addresses: Vec::new(),
    social_media_accounts: Vec::new(),
    tags: Vec::new(),
  }
}

impl CrmStore for FakeStore {
  type Error = FakeError;

  fn is_ready(&self) -> bool {
    self
      .0
      .not_ready_polls
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_err()
  }

  async fn add_workspace(&self, name: String) -> Result<Workspace, FakeError> {
    self.enter(Op::Other).await?;
    Ok(Workspace { id: Uuid::new_v4(), name, created_at: Utc::now() })
  }

  async fn list_workspaces(&self) -> Result<Vec<Workspace>, FakeError> {
    self.enter(Op::Other).await?;
    Ok(Vec::new())
  }

  async fn list_races(&self) -> Result<Vec<Race>, FakeError> {
    self.enter(Op::Other).await?;
    Ok(Vec::new())
  }

  async fn list_genders(&self) -> Result<Vec<Gender>, FakeError> {
    self.enter(Op::Other).await?;
    Ok(Vec::new())
  }

  async fn list_tags(&self, workspace_id: Uuid) -> Result<Vec<Tag>, FakeError> {
    self.enter(Op::Other).await?;
    let data = lock(&self.0.data);
    Ok(data.tags.iter().filter(|t| t.workspace_id == workspace_id).cloned().collect())
  }

  async fn add_tag(&self, workspace_id: Uuid, tag: String) -> Result<Tag, FakeError> {
    self.enter(Op::Other).await?;
    let tag = Tag { id: Uuid::new_v4(), workspace_id, tag };
    lock(&self.0.data).tags.push(tag.clone());
    Ok(tag)
  }

  async fn list_contacts(&self, workspace_id: Uuid) -> Result<Vec<Contact>, FakeError> {
    self.enter(Op::ListContacts).await?;
    let data = lock(&self.0.data);
    Ok(
      data
        .contacts
        .iter()
        .filter(|c| c.workspace_id == workspace_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>, FakeError> {
    self.enter(Op::Other).await?;
    Ok(self.contact(id))
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact, FakeError> {
    self.enter(Op::InsertContact).await?;
    let contact = contact_from(input);
    lock(&self.0.data).contacts.push(contact.clone());
    Ok(contact)
  }

  async fn update_contact(
    &self,
    id: Uuid,
    patch: ContactPatch,
  ) -> Result<Contact, FakeError> {
    self.enter(Op::UpdateContact).await?;
    self.with_contact(Op::UpdateContact, id, |c| {
      if let Some(v) = patch.first_name {
        c.first_name = v;
      }
      if let Some(v) = patch.last_name {
        c.last_name = v;
      }
      if let Some(v) = patch.status {
        c.status = v;
      }
      c.updated_by = patch.updated_by;
      c.updated_at = Utc::now();
      c.clone()
    })
  }

  async fn delete_contact(&self, id: Uuid) -> Result<(), FakeError> {
    self.enter(Op::DeleteContact).await?;
    let mut data = lock(&self.0.data);
    let before = data.contacts.len();
    data.contacts.retain(|c| c.id != id);
    if data.contacts.len() == before {
      return Err(FakeError(Op::DeleteContact));
    }
    Ok(())
  }

  async fn insert_emails(
    &self,
    contact_id: Uuid,
    emails: Vec<NewEmail>,
  ) -> Result<Vec<Email>, FakeError> {
    self.enter(Op::InsertEmails).await?;
    let rows: Vec<Email> = emails
      .into_iter()
      .map(|e| Email {
        id: Uuid::new_v4(),
        contact_id,
        email: e.email,
        status: e.status,
      })
      .collect();
    self.with_contact(Op::InsertEmails, contact_id, |c| {
      c.emails.extend(rows.iter().cloned())
    })?;
    Ok(rows)
  }

  async fn insert_phone_numbers(
    &self,
    contact_id: Uuid,
    phones: Vec<NewPhoneNumber>,
  ) -> Result<Vec<PhoneNumber>, FakeError> {
    self.enter(Op::InsertPhoneNumbers).await?;
    let rows: Vec<PhoneNumber> = phones
      .into_iter()
      .map(|p| PhoneNumber {
        id: Uuid::new_v4(),
        contact_id,
        number: p.number,
        kind: p.kind,
        status: p.status,
      })
      .collect();
    self.with_contact(Op::InsertPhoneNumbers, contact_id, |c| {
      c.phone_numbers.extend(rows.iter().cloned())
    })?;
    Ok(rows)
  }

  async fn insert_addresses(
    &self,
    contact_id: Uuid,
    addresses: Vec<NewAddress>,
  ) -> Result<Vec<Address>, FakeError> {
    self.enter(Op::InsertAddresses).await?;
    let rows: Vec<Address> = addresses
      .into_iter()
      .map(|a| Address {
        id: Uuid::new_v4(),
        contact_id,
        street: a.street,
        city: a.city,
        state: a.state,
        zip: a.zip,
        status: a.status,
      })
      .collect();
    self.with_contact(Op::InsertAddresses, contact_id, |c| {
      c.addresses.extend(rows.iter().cloned())
    })?;
    Ok(rows)
  }

  async fn insert_social_media_accounts(
    &self,
    contact_id: Uuid,
    accounts: Vec<NewSocialMediaAccount>,
  ) -> Result<Vec<SocialMediaAccount>, FakeError> {
    self.enter(Op::InsertSocialMediaAccounts).await?;
    let rows: Vec<SocialMediaAccount> = accounts
      .into_iter()
      .map(|s| SocialMediaAccount {
        id: Uuid::new_v4(),
        contact_id,
        service: s.service,
        username: s.username,
        status: s.status,
      })
      .collect();
    self.with_contact(Op::InsertSocialMediaAccounts, contact_id, |c| {
      c.social_media_accounts.extend(rows.iter().cloned())
    })?;
    Ok(rows)
  }

  async fn assign_tags(
    &self,
    contact_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> Result<Vec<TagAssignment>, FakeError> {
    self.enter(Op::AssignTags).await?;
    let rows: Vec<TagAssignment> = tag_ids
      .into_iter()
      .map(|tag_id| TagAssignment { contact_id, tag_id, tag: None })
      .collect();
    self.with_contact(Op::AssignTags, contact_id, |c| {
      c.tags.extend(rows.iter().cloned())
    })?;
    Ok(rows)
  }

  async fn list_views(&self, workspace_id: Uuid) -> Result<Vec<ContactView>, FakeError> {
    self.enter(Op::ListViews).await?;
    let data = lock(&self.0.data);
    Ok(
      data
        .views
        .iter()
        .filter(|v| v.workspace_id == workspace_id)
        .cloned()
        .collect(),
    )
  }

  async fn insert_view(&self, input: NewContactView) -> Result<ContactView, FakeError> {
    self.enter(Op::InsertView).await?;
    let id = self.seed_view(input.workspace_id, &input.name);
    self.view(id).ok_or(FakeError(Op::InsertView))
  }

  async fn update_view(&self, view: ContactView) -> Result<ContactView, FakeError> {
    self.enter(Op::UpdateView).await?;
    let mut data = lock(&self.0.data);
    let slot = data
      .views
      .iter_mut()
      .find(|v| v.id == view.id)
      .ok_or(FakeError(Op::UpdateView))?;
    *slot = ContactView { updated_at: Utc::now(), ..view };
    Ok(slot.clone())
  }

  async fn set_view_visibility(
    &self,
    view_id: Uuid,
    field: ContactField,
    visible: bool,
  ) -> Result<ContactView, FakeError> {
    self.enter(Op::SetViewVisibility).await?;
    let mut data = lock(&self.0.data);
    let slot = data
      .views
      .iter_mut()
      .find(|v| v.id == view_id)
      .ok_or(FakeError(Op::SetViewVisibility))?;
    slot.visibility.set(field, visible);
    Ok(slot.clone())
  }

  async fn delete_view(&self, view_id: Uuid) -> Result<(), FakeError> {
    self.enter(Op::DeleteView).await?;
    let mut data = lock(&self.0.data);
    let before = data.views.len();
    data.views.retain(|v| v.id != view_id);
    if data.views.len() == before {
      return Err(FakeError(Op::DeleteView));
    }
    Ok(())
  }
}
