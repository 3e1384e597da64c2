//! [`FormSession`]: a draft contact together with its unsaved child rows,
//! submitted as one parent insert followed by concurrent child inserts.
//!
//! Child inserts are best-effort. When some fail, the parent and the
//! successful siblings stay written; the session keeps the created contact
//! and the failed collections, and the next [`FormSession::submit`] re-sends
//! only those.

use std::{collections::BTreeSet, sync::Arc};

use canvass_core::{
  ChildFailure, Error, Result,
  contact::{
    ChildCollection, Contact, ContactStatus, NewAddress, NewContact, NewEmail,
    NewPhoneNumber, NewSocialMediaAccount,
  },
  store::CrmStore,
};
use uuid::Uuid;

use crate::{
  Session,
  handle::StoreHandle,
  notify::{Notice, Notifier},
};

/// Scalar fields of the contact being drafted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDraft {
  pub first_name:  String,
  pub middle_name: String,
  pub last_name:   String,
  pub race_id:     Option<Uuid>,
  pub gender_id:   Option<Uuid>,
  pub pronouns:    String,
  pub vanid:       String,
  pub status:      ContactStatus,
}

fn optional(s: &str) -> Option<String> {
  let s = s.trim();
  (!s.is_empty()).then(|| s.to_owned())
}

pub struct FormSession<S> {
  store:        StoreHandle<S>,
  workspace_id: Uuid,
  user_id:      Uuid,
  notifier:     Arc<dyn Notifier>,

  pub draft:   ContactDraft,
  emails:      Vec<NewEmail>,
  phones:      Vec<NewPhoneNumber>,
  addresses:   Vec<NewAddress>,
  socials:     Vec<NewSocialMediaAccount>,
  tags:        BTreeSet<Uuid>,
  open:        bool,

  /// Parent created by an earlier, partially failed submit.
  created: Option<Contact>,
  /// Collections that still need to be written for `created`.
  failed:  BTreeSet<ChildCollection>,
}

impl<S: CrmStore> FormSession<S> {
  pub fn new(session: &Session<S>, workspace_id: Uuid) -> Self {
    Self {
      store: session.store.clone(),
      workspace_id,
      user_id: session.user_id,
      notifier: Arc::clone(&session.notifier),
      draft: ContactDraft::default(),
      emails: Vec::new(),
      phones: Vec::new(),
      addresses: Vec::new(),
      socials: Vec::new(),
      tags: BTreeSet::new(),
      open: false,
      created: None,
      failed: BTreeSet::new(),
    }
  }

  // ── Open / close ──────────────────────────────────────────────────────────

  pub fn open(&mut self) { self.open = true; }

  /// Close without clearing the draft.
  pub fn close(&mut self) { self.open = false; }

  pub fn is_open(&self) -> bool { self.open }

  /// Clear every field and forget any partially submitted contact.
  pub fn reset(&mut self) {
    self.draft = ContactDraft::default();
    self.emails.clear();
    self.phones.clear();
    self.addresses.clear();
    self.socials.clear();
    self.tags.clear();
    self.created = None;
    self.failed.clear();
  }

  /// The contact created by a partially failed submit, if any.
  pub fn created(&self) -> Option<&Contact> { self.created.as_ref() }

  /// Collections a retry would re-send.
  pub fn failed_collections(&self) -> impl Iterator<Item = ChildCollection> + '_ {
    self.failed.iter().copied()
  }

  // ── Child rows ────────────────────────────────────────────────────────────

  pub fn emails(&self) -> &[NewEmail] { &self.emails }

  pub fn add_email(&mut self, email: NewEmail) { self.emails.push(email); }

  pub fn update_email(&mut self, index: usize, email: NewEmail) -> Result<()> {
    replace_at(&mut self.emails, index, email, "email")
  }

  pub fn remove_email(&mut self, index: usize) -> Result<NewEmail> {
    remove_at(&mut self.emails, index, "email")
  }

  pub fn phone_numbers(&self) -> &[NewPhoneNumber] { &self.phones }

  pub fn add_phone_number(&mut self, phone: NewPhoneNumber) { self.phones.push(phone); }

  pub fn update_phone_number(&mut self, index: usize, phone: NewPhoneNumber) -> Result<()> {
    replace_at(&mut self.phones, index, phone, "phone number")
  }

  pub fn remove_phone_number(&mut self, index: usize) -> Result<NewPhoneNumber> {
    remove_at(&mut self.phones, index, "phone number")
  }

  pub fn addresses(&self) -> &[NewAddress] { &self.addresses }

  pub fn add_address(&mut self, address: NewAddress) { self.addresses.push(address); }

  pub fn update_address(&mut self, index: usize, address: NewAddress) -> Result<()> {
    replace_at(&mut self.addresses, index, address, "address")
  }

  pub fn remove_address(&mut self, index: usize) -> Result<NewAddress> {
    remove_at(&mut self.addresses, index, "address")
  }

  pub fn social_media_accounts(&self) -> &[NewSocialMediaAccount] { &self.socials }

  pub fn add_social_media_account(&mut self, account: NewSocialMediaAccount) {
    self.socials.push(account);
  }

  pub fn update_social_media_account(
    &mut self,
    index: usize,
    account: NewSocialMediaAccount,
  ) -> Result<()> {
    replace_at(&mut self.socials, index, account, "social media account")
  }

  pub fn remove_social_media_account(
    &mut self,
    index: usize,
  ) -> Result<NewSocialMediaAccount> {
    remove_at(&mut self.socials, index, "social media account")
  }

  pub fn selected_tags(&self) -> impl Iterator<Item = Uuid> + '_ {
    self.tags.iter().copied()
  }

  /// Select or deselect a tag; returns whether it is now selected.
  pub fn toggle_tag(&mut self, tag_id: Uuid) -> bool {
    if self.tags.remove(&tag_id) {
      false
    } else {
      self.tags.insert(tag_id);
      true
    }
  }

  // ── Submit ────────────────────────────────────────────────────────────────

  fn new_contact(&self) -> NewContact {
    let d = &self.draft;
    NewContact {
      workspace_id: self.workspace_id,
      first_name:   d.first_name.trim().to_owned(),
      middle_name:  optional(&d.middle_name),
      last_name:    d.last_name.trim().to_owned(),
      race_id:      d.race_id,
      gender_id:    d.gender_id,
      pronouns:     optional(&d.pronouns),
      vanid:        optional(&d.vanid),
      status:       d.status,
      created_by:   self.user_id,
    }
  }

  /// Write the draft.
  ///
  /// Names are validated before anything is sent. The parent is inserted
  /// first, then every non-empty child collection concurrently. If any child
  /// insert fails the result is [`Error::PartialFailure`] and the form stays
  /// open; a full success resets and closes it.
  pub async fn submit(&mut self) -> Result<Contact> {
    if self.created.is_none() {
      if let Err(e) = self.new_contact().validate() {
        return Err(self.report(e));
      }
    }
    let store = match self.store.get() {
      Ok(store) => store,
      Err(e) => return Err(self.report(e)),
    };

    let contact = match self.created.clone() {
      Some(contact) => contact,
      None => {
        let contact = store
          .insert_contact(self.new_contact())
          .await
          .map_err(|e| self.report(e.into()))?;
        tracing::info!(contact_id = %contact.id, "contact created");
        contact
      }
    };

    let retrying = !self.failed.is_empty();
    let wanted = |collection: ChildCollection, has_rows: bool| {
      has_rows && (!retrying || self.failed.contains(&collection))
    };
    let id = contact.id;

    let send_emails = wanted(ChildCollection::Emails, !self.emails.is_empty());
    let send_phones = wanted(ChildCollection::PhoneNumbers, !self.phones.is_empty());
    let send_addresses = wanted(ChildCollection::Addresses, !self.addresses.is_empty());
    let send_socials =
      wanted(ChildCollection::SocialMediaAccounts, !self.socials.is_empty());
    let send_tags = wanted(ChildCollection::Tags, !self.tags.is_empty());

    let (emails, phones, addresses, socials, tags) = tokio::join!(
      async {
        if !send_emails {
          return Ok(());
        }
        store.insert_emails(id, self.emails.clone()).await.map(drop)
      },
      async {
        if !send_phones {
          return Ok(());
        }
        store.insert_phone_numbers(id, self.phones.clone()).await.map(drop)
      },
      async {
        if !send_addresses {
          return Ok(());
        }
        store.insert_addresses(id, self.addresses.clone()).await.map(drop)
      },
      async {
        if !send_socials {
          return Ok(());
        }
        store
          .insert_social_media_accounts(id, self.socials.clone())
          .await
          .map(drop)
      },
      async {
        if !send_tags {
          return Ok(());
        }
        store
          .assign_tags(id, self.tags.iter().copied().collect())
          .await
          .map(drop)
      },
    );

    let failures: Vec<ChildFailure> = [
      (ChildCollection::Emails, emails),
      (ChildCollection::PhoneNumbers, phones),
      (ChildCollection::Addresses, addresses),
      (ChildCollection::SocialMediaAccounts, socials),
      (ChildCollection::Tags, tags),
    ]
    .into_iter()
    .filter_map(|(collection, result)| {
      result.err().map(|e| ChildFailure {
        collection,
        message: Into::<Error>::into(e).to_string(),
      })
    })
    .collect();

    if failures.is_empty() {
      self.reset();
      self.close();
      return Ok(contact);
    }

    tracing::warn!(
      contact_id = %id,
      failed = failures.len(),
      "contact saved with failed child inserts"
    );
    self.failed = failures.iter().map(|f| f.collection).collect();
    self.created = Some(contact);
    Err(self.report(Error::PartialFailure { contact_id: id, failures }))
  }

  fn report(&self, err: Error) -> Error {
    self.notifier.notify(Notice::error(format!("could not save contact: {err}")));
    err
  }
}

fn replace_at<T>(items: &mut [T], index: usize, value: T, what: &str) -> Result<()> {
  let slot = items
    .get_mut(index)
    .ok_or_else(|| Error::Validation(format!("no {what} at position {index}")))?;
  *slot = value;
  Ok(())
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &str) -> Result<T> {
  if index >= items.len() {
    return Err(Error::Validation(format!("no {what} at position {index}")));
  }
  Ok(items.remove(index))
}

#[cfg(test)]
mod tests {
  use tokio::sync::mpsc;

  use super::*;
  use crate::{
    prefs::MemoryPrefs,
    test_support::{FakeStore, Op},
  };

  fn form(store: &FakeStore) -> (FormSession<FakeStore>, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(
      StoreHandle::ready(store.clone()),
      Uuid::new_v4(),
      Arc::new(tx),
      Arc::new(MemoryPrefs::default()),
    );
    (FormSession::new(&session, store.workspace()), rx)
  }

  fn email(addr: &str) -> NewEmail {
    NewEmail { email: addr.into(), ..Default::default() }
  }

  fn fill(form: &mut FormSession<FakeStore>) {
    form.open();
    form.draft.first_name = "Ada".into();
    form.draft.last_name = "Lovelace".into();
    form.add_email(email("ada@example.com"));
    form.add_phone_number(NewPhoneNumber { number: "555-0100".into(), ..Default::default() });
    form.toggle_tag(Uuid::new_v4());
  }

  #[tokio::test]
  async fn missing_last_name_is_rejected_before_any_call() {
    let store = FakeStore::default();
    let (mut form, mut rx) = form(&store);
    form.draft.first_name = "Ada".into();

    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.calls(Op::InsertContact), 0);
    assert!(rx.try_recv().is_ok());
  }

  #[tokio::test]
  async fn full_success_writes_children_and_resets() {
    let store = FakeStore::default();
    let (mut form, _rx) = form(&store);
    fill(&mut form);

    let contact = form.submit().await.unwrap();
    let stored = store.contact(contact.id).unwrap();
    assert_eq!(stored.emails.len(), 1);
    assert_eq!(stored.phone_numbers.len(), 1);
    assert_eq!(stored.tags.len(), 1);
    assert_eq!(store.calls(Op::InsertAddresses), 0);

    assert!(!form.is_open());
    assert_eq!(form.draft, ContactDraft::default());
    assert!(form.emails().is_empty());
    assert_eq!(form.selected_tags().count(), 0);
  }

  #[tokio::test]
  async fn blank_optional_fields_are_sent_as_absent() {
    let store = FakeStore::default();
    let (mut form, _rx) = form(&store);
    form.draft.first_name = " Ada ".into();
    form.draft.last_name = "Lovelace".into();
    form.draft.pronouns = "  ".into();

    let contact = form.submit().await.unwrap();
    assert_eq!(contact.first_name, "Ada");
    assert_eq!(contact.pronouns, None);
  }

  #[tokio::test]
  async fn partial_failure_keeps_parent_and_retries_only_failures() {
    let store = FakeStore::default();
    let (mut form, _rx) = form(&store);
    fill(&mut form);
    store.fail(Op::InsertPhoneNumbers);

    let err = form.submit().await.unwrap_err();
    let Error::PartialFailure { contact_id, failures } = err else {
      panic!("expected a partial failure");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].collection, ChildCollection::PhoneNumbers);
    assert_eq!(store.contact_count(), 1);
    assert!(form.is_open());
    assert_eq!(form.created().map(|c| c.id), Some(contact_id));
    assert_eq!(
      form.failed_collections().collect::<Vec<_>>(),
      [ChildCollection::PhoneNumbers]
    );

    store.succeed(Op::InsertPhoneNumbers);
    let contact = form.submit().await.unwrap();
    assert_eq!(contact.id, contact_id);
    assert_eq!(store.contact_count(), 1);
    assert_eq!(store.calls(Op::InsertContact), 1);
    assert_eq!(store.calls(Op::InsertEmails), 1);
    assert_eq!(store.calls(Op::InsertPhoneNumbers), 2);

    let stored = store.contact(contact_id).unwrap();
    assert_eq!(stored.emails.len(), 1);
    assert_eq!(stored.phone_numbers.len(), 1);
    assert!(!form.is_open());
  }

  #[tokio::test(start_paused = true)]
  async fn child_inserts_run_concurrently() {
    let store = FakeStore::default();
    let (mut form, _rx) = form(&store);
    fill(&mut form);
    form.add_address(NewAddress {
      street: "1 Main St".into(),
      city: "Springfield".into(),
      ..Default::default()
    });
    store.set_delay(std::time::Duration::from_millis(100));

    let started = tokio::time::Instant::now();
    form.submit().await.unwrap();
    // One parent round-trip plus one for all children together.
    assert_eq!(started.elapsed(), std::time::Duration::from_millis(200));
  }

  #[test]
  fn index_addressed_edits() {
    let store = FakeStore::default();
    let (mut form, _rx) = form(&store);
    form.add_email(email("a@example.com"));
    form.add_email(email("b@example.com"));

    form.update_email(1, email("c@example.com")).unwrap();
    let removed = form.remove_email(0).unwrap();
    assert_eq!(removed.email, "a@example.com");
    assert_eq!(form.emails()[0].email, "c@example.com");
    assert!(matches!(form.remove_email(5), Err(Error::Validation(_))));

    let tag = Uuid::new_v4();
    assert!(form.toggle_tag(tag));
    assert!(!form.toggle_tag(tag));
  }
}
