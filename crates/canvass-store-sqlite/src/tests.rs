//! Integration tests for `SqliteStore` against an in-memory database.

use canvass_core::{
  contact::{
    AddressStatus, ContactPatch, ContactStatus, EmailStatus, NewAddress,
    NewContact, NewEmail, NewPhoneNumber, NewSocialMediaAccount, PhoneKind,
    PhoneStatus,
  },
  field::ContactField,
  store::CrmStore,
  view::{
    ContactFilter, ContactSorting, FilterOperator, NewContactView,
    SortDirection,
  },
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn workspace(s: &SqliteStore) -> Uuid {
  s.add_workspace("Field Team".into()).await.unwrap().id
}

fn new_contact(workspace_id: Uuid, first: &str, last: &str) -> NewContact {
  NewContact {
    workspace_id,
    first_name: first.into(),
    last_name: last.into(),
    created_by: Uuid::nil(),
    ..Default::default()
  }
}

// ─── Workspaces & lookups ────────────────────────────────────────────────────

#[tokio::test]
async fn workspaces_list_in_creation_order() {
  let s = store().await;
  s.add_workspace("North".into()).await.unwrap();
  s.add_workspace("South".into()).await.unwrap();

  let names: Vec<_> = s
    .list_workspaces()
    .await
    .unwrap()
    .into_iter()
    .map(|w| w.name)
    .collect();
  assert_eq!(names, ["North", "South"]);
}

#[tokio::test]
async fn blank_workspace_name_is_rejected() {
  let s = store().await;
  let err = s.add_workspace("   ".into()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn lookups_are_seeded() {
  let s = store().await;
  assert_eq!(s.list_races().await.unwrap().len(), 8);
  let genders = s.list_genders().await.unwrap();
  assert_eq!(genders.first().map(|g| g.gender.as_str()), Some("Woman"));
}

#[tokio::test]
async fn add_tag_is_idempotent_per_workspace() {
  let s = store().await;
  let ws = workspace(&s).await;

  let a = s.add_tag(ws, "volunteer".into()).await.unwrap();
  let b = s.add_tag(ws, " volunteer ".into()).await.unwrap();
  assert_eq!(a.id, b.id);

  s.add_tag(ws, "donor".into()).await.unwrap();
  let tags: Vec<_> =
    s.list_tags(ws).await.unwrap().into_iter().map(|t| t.tag).collect();
  assert_eq!(tags, ["donor", "volunteer"]);
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_contact() {
  let s = store().await;
  let ws = workspace(&s).await;
  let race = s.list_races().await.unwrap().remove(0);

  let mut input = new_contact(ws, "Ada", "Lovelace");
  input.race_id = Some(race.id);
  input.middle_name = Some("".into());

  let contact = s.insert_contact(input).await.unwrap();
  assert_eq!(contact.first_name, "Ada");
  assert_eq!(contact.middle_name, None);
  assert_eq!(contact.race.as_ref().map(|r| r.id), Some(race.id));
  assert_eq!(contact.status, ContactStatus::Active);
  assert_eq!(contact.created_by, contact.updated_by);

  let fetched = s.get_contact(contact.id).await.unwrap().unwrap();
  assert_eq!(fetched, contact);
}

#[tokio::test]
async fn get_contact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_contact(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn insert_contact_requires_names() {
  let s = store().await;
  let ws = workspace(&s).await;
  let err = s.insert_contact(new_contact(ws, "Ada", "")).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn list_contacts_is_scoped_to_workspace() {
  let s = store().await;
  let ws = workspace(&s).await;
  let other = s.add_workspace("Elsewhere".into()).await.unwrap().id;

  s.insert_contact(new_contact(ws, "Ada", "Lovelace")).await.unwrap();
  s.insert_contact(new_contact(ws, "Alan", "Turing")).await.unwrap();
  s.insert_contact(new_contact(other, "Grace", "Hopper")).await.unwrap();

  let names: Vec<_> = s
    .list_contacts(ws)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.first_name)
    .collect();
  assert_eq!(names, ["Ada", "Alan"]);
}

#[tokio::test]
async fn children_are_joined_in_insertion_order() {
  let s = store().await;
  let ws = workspace(&s).await;
  let c = s.insert_contact(new_contact(ws, "Ada", "Lovelace")).await.unwrap();

  s.insert_emails(c.id, vec![
    NewEmail { email: "ada@example.com".into(), status: EmailStatus::Active },
    NewEmail { email: "old@example.com".into(), status: EmailStatus::Bounced },
  ])
  .await
  .unwrap();
  s.insert_phone_numbers(c.id, vec![NewPhoneNumber {
    number: "555-0100".into(),
    kind:   PhoneKind::Home,
    status: PhoneStatus::WrongNumber,
  }])
  .await
  .unwrap();
  s.insert_addresses(c.id, vec![NewAddress {
    street: "1 Main St".into(),
    city:   "Springfield".into(),
    state:  Some("IL".into()),
    zip:    Some(" ".into()),
    status: AddressStatus::Moved,
  }])
  .await
  .unwrap();
  s.insert_social_media_accounts(c.id, vec![NewSocialMediaAccount {
    service:  "Mastodon".into(),
    username: "@ada".into(),
    ..Default::default()
  }])
  .await
  .unwrap();
  let tag = s.add_tag(ws, "volunteer".into()).await.unwrap();
  s.assign_tags(c.id, vec![tag.id]).await.unwrap();

  let joined = s.get_contact(c.id).await.unwrap().unwrap();
  let emails: Vec<_> = joined.emails.iter().map(|e| e.email.as_str()).collect();
  assert_eq!(emails, ["ada@example.com", "old@example.com"]);
  assert_eq!(joined.emails[1].status, EmailStatus::Bounced);
  assert_eq!(joined.phone_numbers[0].status, PhoneStatus::WrongNumber);
  assert_eq!(joined.addresses[0].zip, None);
  assert_eq!(joined.social_media_accounts[0].username, "@ada");
  assert_eq!(
    joined.tags[0].tag.as_ref().map(|t| t.tag.as_str()),
    Some("volunteer")
  );
}

#[tokio::test]
async fn assigning_a_tag_twice_keeps_one_row() {
  let s = store().await;
  let ws = workspace(&s).await;
  let c = s.insert_contact(new_contact(ws, "Ada", "Lovelace")).await.unwrap();
  let tag = s.add_tag(ws, "donor".into()).await.unwrap();

  s.assign_tags(c.id, vec![tag.id]).await.unwrap();
  let again = s.assign_tags(c.id, vec![tag.id]).await.unwrap();
  assert_eq!(again.len(), 1);

  let joined = s.get_contact(c.id).await.unwrap().unwrap();
  assert_eq!(joined.tags.len(), 1);
}

#[tokio::test]
async fn child_insert_for_missing_contact_fails() {
  let s = store().await;
  let result = s
    .insert_emails(Uuid::new_v4(), vec![NewEmail {
      email: "ghost@example.com".into(),
      ..Default::default()
    }])
    .await;
  assert!(matches!(result, Err(Error::Database(_))));
}

#[tokio::test]
async fn update_contact_applies_patch() {
  let s = store().await;
  let ws = workspace(&s).await;
  let mut input = new_contact(ws, "Ada", "Lovelace");
  input.pronouns = Some("she/her".into());
  let c = s.insert_contact(input).await.unwrap();

  let editor = Uuid::new_v4();
  let updated = s
    .update_contact(c.id, ContactPatch {
      last_name: Some("King".into()),
      pronouns: Some(String::new()),
      status: Some(ContactStatus::Moved),
      updated_by: editor,
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(updated.first_name, "Ada");
  assert_eq!(updated.last_name, "King");
  assert_eq!(updated.pronouns, None);
  assert_eq!(updated.status, ContactStatus::Moved);
  assert_eq!(updated.updated_by, editor);
  assert!(updated.updated_at >= c.updated_at);
}

#[tokio::test]
async fn update_missing_contact_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .update_contact(id, ContactPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ContactNotFound(missing) if missing == id));
}

#[tokio::test]
async fn delete_contact_cascades_to_children() {
  let s = store().await;
  let ws = workspace(&s).await;
  let c = s.insert_contact(new_contact(ws, "Ada", "Lovelace")).await.unwrap();
  s.insert_emails(c.id, vec![NewEmail {
    email: "ada@example.com".into(),
    ..Default::default()
  }])
  .await
  .unwrap();

  s.delete_contact(c.id).await.unwrap();
  assert!(s.get_contact(c.id).await.unwrap().is_none());

  // A fresh contact must not inherit orphaned rows.
  let c2 = s.insert_contact(new_contact(ws, "Alan", "Turing")).await.unwrap();
  assert!(c2.emails.is_empty());

  let err = s.delete_contact(c.id).await.unwrap_err();
  assert!(matches!(err, Error::ContactNotFound(_)));
}

// ─── Views ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_view_shows_every_field() {
  let s = store().await;
  let ws = workspace(&s).await;
  let view = s
    .insert_view(NewContactView {
      workspace_id: ws,
      name:         "Everyone".into(),
      created_by:   Uuid::nil(),
    })
    .await
    .unwrap();

  assert!(ContactField::all().all(|f| view.is_visible(f)));
  assert!(view.filters.is_empty());
  assert!(view.sorting.is_empty());

  let listed = s.list_views(ws).await.unwrap();
  assert_eq!(listed, vec![view]);
}

#[tokio::test]
async fn update_view_round_trips_configuration() {
  let s = store().await;
  let ws = workspace(&s).await;
  let mut view = s
    .insert_view(NewContactView {
      workspace_id: ws,
      name:         "Donors".into(),
      created_by:   Uuid::nil(),
    })
    .await
    .unwrap();

  view.name = "Big donors".into();
  view.filters.push(ContactFilter::new(
    "first_name",
    FilterOperator::StartsWith,
    "a",
  ));
  view.filters.push(ContactFilter::new(
    "vanid",
    FilterOperator::Unknown("between".into()),
    "1",
  ));
  view.sorting.push(ContactSorting::new("last_name", SortDirection::Desc));
  view.visibility.set(ContactField::Vanid, false);

  let saved = s.update_view(view.clone()).await.unwrap();
  assert_eq!(saved.name, "Big donors");
  assert_eq!(saved.filters, view.filters);
  assert_eq!(saved.sorting, view.sorting);
  assert!(!saved.is_visible(ContactField::Vanid));
}

#[tokio::test]
async fn visibility_toggles_touch_only_their_field() {
  let s = store().await;
  let ws = workspace(&s).await;
  let view = s
    .insert_view(NewContactView {
      workspace_id: ws,
      name:         "Everyone".into(),
      created_by:   Uuid::nil(),
    })
    .await
    .unwrap();

  let (a, b) = tokio::join!(
    s.set_view_visibility(view.id, ContactField::Emails, false),
    s.set_view_visibility(view.id, ContactField::Tags, false),
  );
  a.unwrap();
  b.unwrap();

  let stored = s.list_views(ws).await.unwrap().remove(0);
  assert!(!stored.is_visible(ContactField::Emails));
  assert!(!stored.is_visible(ContactField::Tags));
  assert!(stored.is_visible(ContactField::FirstName));

  let back = s
    .set_view_visibility(view.id, ContactField::Emails, true)
    .await
    .unwrap();
  assert!(back.is_visible(ContactField::Emails));
}

#[tokio::test]
async fn missing_views_are_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();
  assert!(matches!(
    s.set_view_visibility(id, ContactField::Vanid, false).await,
    Err(Error::ViewNotFound(_))
  ));
  assert!(matches!(s.delete_view(id).await, Err(Error::ViewNotFound(_))));
}

#[tokio::test]
async fn delete_view_removes_it() {
  let s = store().await;
  let ws = workspace(&s).await;
  let view = s
    .insert_view(NewContactView {
      workspace_id: ws,
      name:         "Temp".into(),
      created_by:   Uuid::nil(),
    })
    .await
    .unwrap();
  s.delete_view(view.id).await.unwrap();
  assert!(s.list_views(ws).await.unwrap().is_empty());
}
