//! Logical contact fields and the accessor that resolves them.
//!
//! Filters and sort keys name fields by string. [`ContactField`] is the closed
//! set of names the engine understands; [`field_value`] turns a name into the
//! comparable text for one contact, reaching through joined relations and
//! flattening child collections.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::contact::Contact;

/// Every field a view can show, filter on, or sort by.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactField {
  FirstName,
  MiddleName,
  LastName,
  Race,
  Gender,
  Pronouns,
  Vanid,
  Status,
  Emails,
  PhoneNumbers,
  Addresses,
  SocialMediaAccounts,
  Tags,
  CreatedAt,
  UpdatedAt,
}

impl ContactField {
  /// All fields in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  /// Column heading for tabular output.
  pub fn label(self) -> &'static str {
    match self {
      Self::FirstName => "First Name",
      Self::MiddleName => "Middle Name",
      Self::LastName => "Last Name",
      Self::Race => "Race",
      Self::Gender => "Gender",
      Self::Pronouns => "Pronouns",
      Self::Vanid => "VAN ID",
      Self::Status => "Status",
      Self::Emails => "Emails",
      Self::PhoneNumbers => "Phone Numbers",
      Self::Addresses => "Addresses",
      Self::SocialMediaAccounts => "Social Media",
      Self::Tags => "Tags",
      Self::CreatedAt => "Created",
      Self::UpdatedAt => "Updated",
    }
  }

  /// Resolve this field on `contact`.
  pub fn value_of(self, contact: &Contact) -> String {
    match self {
      Self::FirstName => contact.first_name.clone(),
      Self::MiddleName => opt(&contact.middle_name),
      Self::LastName => contact.last_name.clone(),
      Self::Race => contact
        .race
        .as_ref()
        .map(|r| r.race.clone())
        .unwrap_or_default(),
      Self::Gender => contact
        .gender
        .as_ref()
        .map(|g| g.gender.clone())
        .unwrap_or_default(),
      Self::Pronouns => opt(&contact.pronouns),
      Self::Vanid => opt(&contact.vanid),
      Self::Status => contact.status.to_string(),
      Self::Emails => join(contact.emails.iter().map(|e| e.email.clone()), ","),
      Self::PhoneNumbers => {
        join(contact.phone_numbers.iter().map(|p| p.number.clone()), ",")
      }
      Self::Addresses => join(
        contact
          .addresses
          .iter()
          .map(|a| format!("{}, {}", a.street, a.city)),
        ";",
      ),
      Self::SocialMediaAccounts => join(
        contact
          .social_media_accounts
          .iter()
          .map(|s| format!("{}: {}", s.service, s.username)),
        ";",
      ),
      Self::Tags => join(
        contact
          .tags
          .iter()
          .filter_map(|t| t.tag.as_ref().map(|tag| tag.tag.clone())),
        ",",
      ),
      Self::CreatedAt => contact.created_at.to_rfc3339(),
      Self::UpdatedAt => contact.updated_at.to_rfc3339(),
    }
  }
}

/// Resolve a field by name. Unknown names resolve to the empty string.
pub fn field_value(contact: &Contact, name: &str) -> String {
  ContactField::from_str(name)
    .map(|field| field.value_of(contact))
    .unwrap_or_default()
}

fn opt(value: &Option<String>) -> String { value.clone().unwrap_or_default() }

fn join(parts: impl Iterator<Item = String>, sep: &str) -> String {
  parts.collect::<Vec<_>>().join(sep)
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::contact::{
    Address, AddressStatus, ContactStatus, Email, EmailStatus, Race,
    SocialMediaAccount, SocialMediaStatus, Tag, TagAssignment,
  };

  fn contact() -> Contact {
    let id = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    Contact {
      id,
      workspace_id: Uuid::nil(),
      first_name: "Jane".into(),
      middle_name: None,
      last_name: "Doe".into(),
      race_id: None,
      race: None,
      gender_id: None,
      gender: None,
      pronouns: Some("she/her".into()),
      vanid: None,
      status: ContactStatus::Active,
      created_by: Uuid::nil(),
      updated_by: Uuid::nil(),
      created_at: at,
      updated_at: at,
      emails: vec![],
      phone_numbers: vec![],
      addresses: vec![],
      social_media_accounts: vec![],
      tags: vec![],
    }
  }

  #[test]
  fn scalar_fields_resolve_or_empty() {
    let c = contact();
    assert_eq!(field_value(&c, "first_name"), "Jane");
    assert_eq!(field_value(&c, "pronouns"), "she/her");
    assert_eq!(field_value(&c, "middle_name"), "");
    assert_eq!(field_value(&c, "vanid"), "");
    assert_eq!(field_value(&c, "status"), "active");
  }

  #[test]
  fn relation_fields_use_joined_name() {
    let mut c = contact();
    assert_eq!(field_value(&c, "race"), "");
    c.race = Some(Race { id: Uuid::new_v4(), race: "Asian".into() });
    assert_eq!(field_value(&c, "race"), "Asian");
  }

  #[test]
  fn collections_are_joined_in_order_without_dedupe() {
    let mut c = contact();
    for addr in ["b@x.org", "a@x.org", "b@x.org"] {
      c.emails.push(Email {
        id:         Uuid::new_v4(),
        contact_id: c.id,
        email:      addr.into(),
        status:     EmailStatus::Active,
      });
    }
    assert_eq!(field_value(&c, "emails"), "b@x.org,a@x.org,b@x.org");

    c.addresses.push(Address {
      id:         Uuid::new_v4(),
      contact_id: c.id,
      street:     "1 Main St".into(),
      city:       "Springfield".into(),
      state:      None,
      zip:        None,
      status:     AddressStatus::Active,
    });
    c.addresses.push(Address {
      id:         Uuid::new_v4(),
      contact_id: c.id,
      street:     "9 Elm Rd".into(),
      city:       "Shelbyville".into(),
      state:      Some("IL".into()),
      zip:        None,
      status:     AddressStatus::Moved,
    });
    assert_eq!(
      field_value(&c, "addresses"),
      "1 Main St, Springfield;9 Elm Rd, Shelbyville"
    );

    c.social_media_accounts.push(SocialMediaAccount {
      id:         Uuid::new_v4(),
      contact_id: c.id,
      service:    "Mastodon".into(),
      username:   "@jane".into(),
      status:     SocialMediaStatus::Active,
    });
    assert_eq!(field_value(&c, "social_media_accounts"), "Mastodon: @jane");
  }

  #[test]
  fn tags_skip_unjoined_assignments() {
    let mut c = contact();
    let tag = Tag { id: Uuid::new_v4(), workspace_id: Uuid::nil(), tag: "volunteer".into() };
    c.tags.push(TagAssignment { contact_id: c.id, tag_id: tag.id, tag: Some(tag) });
    c.tags.push(TagAssignment { contact_id: c.id, tag_id: Uuid::new_v4(), tag: None });
    assert_eq!(field_value(&c, "tags"), "volunteer");
  }

  #[test]
  fn unknown_field_is_empty() {
    let c = contact();
    assert_eq!(field_value(&c, "favourite_colour"), "");
    assert_eq!(field_value(&c, ""), "");
  }

  #[test]
  fn every_field_round_trips_through_its_name() {
    for field in ContactField::all() {
      assert_eq!(field.as_ref().parse::<ContactField>().unwrap(), field);
    }
  }
}
