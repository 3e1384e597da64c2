//! The `CrmStore` trait: the backing-store contract.
//!
//! The trait is implemented by storage backends (`canvass-store-sqlite`) and
//! by remote clients (`canvass-cli`). The session layer, the REST API, and
//! the binaries depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  contact::{
    Address, Contact, ContactPatch, Email, Gender, NewAddress, NewContact,
    NewEmail, NewPhoneNumber, NewSocialMediaAccount, PhoneNumber, Race,
    SocialMediaAccount, Tag, TagAssignment, Workspace,
  },
  field::ContactField,
  view::{ContactView, NewContactView},
};

/// Abstraction over a table-oriented backing store.
///
/// Reads return contacts in their joined form (race, gender, and every child
/// collection attached). Deleting a contact removes its child rows.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CrmStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  /// Whether the store can serve requests yet. Callers that see `false` may
  /// back off and retry.
  fn is_ready(&self) -> bool { true }

  // ── Workspaces ────────────────────────────────────────────────────────

  fn add_workspace(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Workspace, Self::Error>> + Send + '_;

  fn list_workspaces(
    &self,
  ) -> impl Future<Output = Result<Vec<Workspace>, Self::Error>> + Send + '_;

  // ── Lookups ───────────────────────────────────────────────────────────

  fn list_races(
    &self,
  ) -> impl Future<Output = Result<Vec<Race>, Self::Error>> + Send + '_;

  fn list_genders(
    &self,
  ) -> impl Future<Output = Result<Vec<Gender>, Self::Error>> + Send + '_;

  fn list_tags(
    &self,
    workspace_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  fn add_tag(
    &self,
    workspace_id: Uuid,
    tag: String,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// All contacts of a workspace, joined, in insertion order.
  fn list_contacts(
    &self,
    workspace_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// One contact with its relations. Returns `None` if not found.
  fn get_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Insert the parent row only. Child collections are written separately.
  fn insert_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Apply a field-by-field update and return the joined result.
  fn update_contact(
    &self,
    id: Uuid,
    patch: ContactPatch,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Delete a contact and, by cascade, its child rows.
  fn delete_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Child collections ─────────────────────────────────────────────────

  fn insert_emails(
    &self,
    contact_id: Uuid,
    emails: Vec<NewEmail>,
  ) -> impl Future<Output = Result<Vec<Email>, Self::Error>> + Send + '_;

  fn insert_phone_numbers(
    &self,
    contact_id: Uuid,
    phones: Vec<NewPhoneNumber>,
  ) -> impl Future<Output = Result<Vec<PhoneNumber>, Self::Error>> + Send + '_;

  fn insert_addresses(
    &self,
    contact_id: Uuid,
    addresses: Vec<NewAddress>,
  ) -> impl Future<Output = Result<Vec<Address>, Self::Error>> + Send + '_;

  fn insert_social_media_accounts(
    &self,
    contact_id: Uuid,
    accounts: Vec<NewSocialMediaAccount>,
  ) -> impl Future<Output = Result<Vec<SocialMediaAccount>, Self::Error>>
  + Send
  + '_;

  fn assign_tags(
    &self,
    contact_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<TagAssignment>, Self::Error>> + Send + '_;

  // ── Views ─────────────────────────────────────────────────────────────

  fn list_views(
    &self,
    workspace_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ContactView>, Self::Error>> + Send + '_;

  /// Insert a view with every field visible and no filters or sort keys.
  fn insert_view(
    &self,
    input: NewContactView,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  /// Full write-through of name, visibility, filters and sorting.
  fn update_view(
    &self,
    view: ContactView,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  /// Toggle a single visibility flag.
  fn set_view_visibility(
    &self,
    view_id: Uuid,
    field: ContactField,
    visible: bool,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  fn delete_view(
    &self,
    view_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
