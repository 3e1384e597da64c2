//! Contact records and their one-to-many child collections.
//!
//! A [`Contact`] is always handled in its joined form: the race and gender
//! lookups and every child collection travel with the parent row. Each child
//! carries its own status, independent of the parent's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Tenancy ─────────────────────────────────────────────────────────────────

/// A tenant boundary. Every contact, tag and view belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
  pub id:   Uuid,
  pub race: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gender {
  pub id:     Uuid,
  pub gender: String,
}

/// A workspace-scoped label that can be assigned to many contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id:           Uuid,
  pub workspace_id: Uuid,
  pub tag:          String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssignment {
  pub contact_id: Uuid,
  pub tag_id:     Uuid,
  /// Joined tag row; absent when fetched without the relation.
  pub tag:        Option<Tag>,
}

// ─── Statuses ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContactStatus {
  #[default]
  Active,
  Inactive,
  Deceased,
  Moved,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmailStatus {
  #[default]
  Active,
  Inactive,
  Bounced,
  Unsubscribed,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
pub enum PhoneStatus {
  #[default]
  #[serde(rename = "active")]
  #[strum(serialize = "active")]
  Active,
  #[serde(rename = "inactive")]
  #[strum(serialize = "inactive")]
  Inactive,
  #[serde(rename = "wrong number")]
  #[strum(serialize = "wrong number")]
  WrongNumber,
  #[serde(rename = "disconnected")]
  #[strum(serialize = "disconnected")]
  Disconnected,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhoneKind {
  #[default]
  Mobile,
  Home,
  Work,
  Other,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AddressStatus {
  #[default]
  Active,
  Inactive,
  Moved,
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SocialMediaStatus {
  #[default]
  Active,
  Inactive,
}

// ─── Child records ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
  pub id:         Uuid,
  pub contact_id: Uuid,
  pub email:      String,
  pub status:     EmailStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
  pub id:         Uuid,
  pub contact_id: Uuid,
  pub number:     String,
  pub kind:       PhoneKind,
  pub status:     PhoneStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub id:         Uuid,
  pub contact_id: Uuid,
  pub street:     String,
  pub city:       String,
  /// State or region abbreviation.
  pub state:      Option<String>,
  pub zip:        Option<String>,
  pub status:     AddressStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaAccount {
  pub id:         Uuid,
  pub contact_id: Uuid,
  /// Free-text service name, e.g. "Instagram", "Mastodon".
  pub service:    String,
  pub username:   String,
  pub status:     SocialMediaStatus,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A person record in its fully-joined form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub id:                    Uuid,
  pub workspace_id:          Uuid,
  pub first_name:            String,
  pub middle_name:           Option<String>,
  pub last_name:             String,
  pub race_id:               Option<Uuid>,
  pub race:                  Option<Race>,
  pub gender_id:             Option<Uuid>,
  pub gender:                Option<Gender>,
  pub pronouns:              Option<String>,
  /// Identifier of this person in an external voter/volunteer system.
  pub vanid:                 Option<String>,
  pub status:                ContactStatus,
  pub created_by:            Uuid,
  pub updated_by:            Uuid,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
  #[serde(default)]
  pub emails:                Vec<Email>,
  #[serde(default)]
  pub phone_numbers:         Vec<PhoneNumber>,
  #[serde(default)]
  pub addresses:             Vec<Address>,
  #[serde(default)]
  pub social_media_accounts: Vec<SocialMediaAccount>,
  #[serde(default)]
  pub tags:                  Vec<TagAssignment>,
}

impl Contact {
  /// `"First Middle Last"`, skipping an absent middle name.
  pub fn display_name(&self) -> String {
    match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
      Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
      None => format!("{} {}", self.first_name, self.last_name),
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`CrmStore::insert_contact`](crate::store::CrmStore::insert_contact).
/// Ids and timestamps are assigned by the store; `updated_by` starts equal to
/// `created_by`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewContact {
  pub workspace_id: Uuid,
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub race_id:      Option<Uuid>,
  pub gender_id:    Option<Uuid>,
  pub pronouns:     Option<String>,
  pub vanid:        Option<String>,
  #[serde(default)]
  pub status:       ContactStatus,
  pub created_by:   Uuid,
}

impl NewContact {
  /// First and last name must be non-empty after trimming.
  pub fn validate(&self) -> Result<()> {
    if self.first_name.trim().is_empty() {
      return Err(Error::Validation("first name is required".into()));
    }
    if self.last_name.trim().is_empty() {
      return Err(Error::Validation("last name is required".into()));
    }
    Ok(())
  }
}

/// A field-by-field update. `None` leaves a column untouched; for the
/// nullable text columns an empty string clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPatch {
  pub first_name:  Option<String>,
  pub middle_name: Option<String>,
  pub last_name:   Option<String>,
  pub race_id:     Option<Uuid>,
  pub gender_id:   Option<Uuid>,
  pub pronouns:    Option<String>,
  pub vanid:       Option<String>,
  pub status:      Option<ContactStatus>,
  pub updated_by:  Uuid,
}

impl ContactPatch {
  /// Rejects patches that would blank a required name.
  pub fn validate(&self) -> Result<()> {
    if self.first_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::Validation("first name cannot be empty".into()));
    }
    if self.last_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::Validation("last name cannot be empty".into()));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmail {
  pub email:  String,
  #[serde(default)]
  pub status: EmailStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhoneNumber {
  pub number: String,
  #[serde(default)]
  pub kind:   PhoneKind,
  #[serde(default)]
  pub status: PhoneStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
  pub street: String,
  pub city:   String,
  pub state:  Option<String>,
  pub zip:    Option<String>,
  #[serde(default)]
  pub status: AddressStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSocialMediaAccount {
  pub service:  String,
  pub username: String,
  #[serde(default)]
  pub status:   SocialMediaStatus,
}

/// The child collections written after a parent contact insert.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ChildCollection {
  Emails,
  PhoneNumbers,
  Addresses,
  SocialMediaAccounts,
  Tags,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phone_status_uses_spaced_wire_form() {
    let json = serde_json::to_string(&PhoneStatus::WrongNumber).unwrap();
    assert_eq!(json, "\"wrong number\"");
    assert_eq!(
      "wrong number".parse::<PhoneStatus>().unwrap(),
      PhoneStatus::WrongNumber
    );
    assert_eq!(PhoneStatus::WrongNumber.as_ref(), "wrong number");
  }

  #[test]
  fn unknown_contact_status_is_rejected() {
    assert!("archived".parse::<ContactStatus>().is_err());
    assert!(serde_json::from_str::<ContactStatus>("\"archived\"").is_err());
  }

  #[test]
  fn new_contact_requires_both_names() {
    let mut input = NewContact {
      first_name: "Ada".into(),
      last_name: "  ".into(),
      ..Default::default()
    };
    assert!(matches!(input.validate(), Err(Error::Validation(_))));
    input.last_name = "Lovelace".into();
    assert!(input.validate().is_ok());
  }

  #[test]
  fn patch_cannot_blank_a_name() {
    let patch = ContactPatch {
      first_name: Some(String::new()),
      ..Default::default()
    };
    assert!(patch.validate().is_err());
    assert!(ContactPatch::default().validate().is_ok());
  }
}
