//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, status enums as their wire spelling, and view
//! configuration as compact JSON.

use std::{collections::HashMap, str::FromStr};

use canvass_core::{
  contact::{
    Address, Contact, Email, Gender, PhoneNumber, Race, SocialMediaAccount,
    Tag, TagAssignment, Workspace,
  },
  view::{ContactFilter, ContactSorting, ContactView, FieldVisibility},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

/// Parse a status or kind column through its `FromStr` impl.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

/// Empty strings are stored as NULL.
pub fn nullable(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.trim().is_empty())
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub struct RawWorkspace {
  pub id:         String,
  pub name:       String,
  pub created_at: String,
}

impl RawWorkspace {
  pub fn into_workspace(self) -> Result<Workspace> {
    Ok(Workspace {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `contacts` row joined with its race and gender names.
pub struct RawContact {
  pub id:           String,
  pub workspace_id: String,
  pub first_name:   String,
  pub middle_name:  Option<String>,
  pub last_name:    String,
  pub race_id:      Option<String>,
  pub race:         Option<String>,
  pub gender_id:    Option<String>,
  pub gender:       Option<String>,
  pub pronouns:     Option<String>,
  pub vanid:        Option<String>,
  pub status:       String,
  pub created_by:   String,
  pub updated_by:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

pub struct RawEmail {
  pub id:         String,
  pub contact_id: String,
  pub email:      String,
  pub status:     String,
}

pub struct RawPhone {
  pub id:         String,
  pub contact_id: String,
  pub number:     String,
  pub kind:       String,
  pub status:     String,
}

pub struct RawAddress {
  pub id:         String,
  pub contact_id: String,
  pub street:     String,
  pub city:       String,
  pub state:      Option<String>,
  pub zip:        Option<String>,
  pub status:     String,
}

pub struct RawSocial {
  pub id:         String,
  pub contact_id: String,
  pub service:    String,
  pub username:   String,
  pub status:     String,
}

/// A `tag_assignments` row joined with its tag.
pub struct RawTagAssignment {
  pub contact_id:   String,
  pub tag_id:       String,
  pub workspace_id: String,
  pub tag:          String,
}

pub struct RawTag {
  pub id:           String,
  pub workspace_id: String,
  pub tag:          String,
}

impl RawTag {
  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      id:           decode_uuid(&self.id)?,
      workspace_id: decode_uuid(&self.workspace_id)?,
      tag:          self.tag,
    })
  }
}

impl RawEmail {
  pub fn into_email(self) -> Result<Email> {
    Ok(Email {
      id:         decode_uuid(&self.id)?,
      contact_id: decode_uuid(&self.contact_id)?,
      email:      self.email,
      status:     decode_enum("email status", &self.status)?,
    })
  }
}

impl RawPhone {
  pub fn into_phone(self) -> Result<PhoneNumber> {
    Ok(PhoneNumber {
      id:         decode_uuid(&self.id)?,
      contact_id: decode_uuid(&self.contact_id)?,
      number:     self.number,
      kind:       decode_enum("phone kind", &self.kind)?,
      status:     decode_enum("phone status", &self.status)?,
    })
  }
}

impl RawAddress {
  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      id:         decode_uuid(&self.id)?,
      contact_id: decode_uuid(&self.contact_id)?,
      street:     self.street,
      city:       self.city,
      state:      self.state,
      zip:        self.zip,
      status:     decode_enum("address status", &self.status)?,
    })
  }
}

impl RawSocial {
  pub fn into_social(self) -> Result<SocialMediaAccount> {
    Ok(SocialMediaAccount {
      id:         decode_uuid(&self.id)?,
      contact_id: decode_uuid(&self.contact_id)?,
      service:    self.service,
      username:   self.username,
      status:     decode_enum("social media status", &self.status)?,
    })
  }
}

impl RawTagAssignment {
  pub fn into_assignment(self) -> Result<TagAssignment> {
    let tag_id = decode_uuid(&self.tag_id)?;
    Ok(TagAssignment {
      contact_id: decode_uuid(&self.contact_id)?,
      tag_id,
      tag: Some(Tag {
        id:           tag_id,
        workspace_id: decode_uuid(&self.workspace_id)?,
        tag:          self.tag,
      }),
    })
  }
}

/// Everything needed to assemble joined [`Contact`]s, read in one database
/// round-trip.
#[derive(Default)]
pub struct RawContactSet {
  pub contacts:  Vec<RawContact>,
  pub emails:    Vec<RawEmail>,
  pub phones:    Vec<RawPhone>,
  pub addresses: Vec<RawAddress>,
  pub socials:   Vec<RawSocial>,
  pub tags:      Vec<RawTagAssignment>,
}

impl RawContactSet {
  /// Decode every row and attach children to their parents, keeping row
  /// order within each collection.
  pub fn into_contacts(self) -> Result<Vec<Contact>> {
    let mut emails: HashMap<Uuid, Vec<Email>> = HashMap::new();
    for raw in self.emails {
      let e = raw.into_email()?;
      emails.entry(e.contact_id).or_default().push(e);
    }
    let mut phones: HashMap<Uuid, Vec<PhoneNumber>> = HashMap::new();
    for raw in self.phones {
      let p = raw.into_phone()?;
      phones.entry(p.contact_id).or_default().push(p);
    }
    let mut addresses: HashMap<Uuid, Vec<Address>> = HashMap::new();
    for raw in self.addresses {
      let a = raw.into_address()?;
      addresses.entry(a.contact_id).or_default().push(a);
    }
    let mut socials: HashMap<Uuid, Vec<SocialMediaAccount>> = HashMap::new();
    for raw in self.socials {
      let s = raw.into_social()?;
      socials.entry(s.contact_id).or_default().push(s);
    }
    let mut tags: HashMap<Uuid, Vec<TagAssignment>> = HashMap::new();
    for raw in self.tags {
      let t = raw.into_assignment()?;
      tags.entry(t.contact_id).or_default().push(t);
    }

    self
      .contacts
      .into_iter()
      .map(|raw| {
        let id = decode_uuid(&raw.id)?;
        let race_id = decode_opt_uuid(raw.race_id)?;
        let gender_id = decode_opt_uuid(raw.gender_id)?;
        Ok(Contact {
          id,
          workspace_id: decode_uuid(&raw.workspace_id)?,
          first_name: raw.first_name,
          middle_name: raw.middle_name,
          last_name: raw.last_name,
          race_id,
          race: race_id
            .zip(raw.race)
            .map(|(id, race)| Race { id, race }),
          gender_id,
          gender: gender_id
            .zip(raw.gender)
            .map(|(id, gender)| Gender { id, gender }),
          pronouns: raw.pronouns,
          vanid: raw.vanid,
          status: decode_enum("contact status", &raw.status)?,
          created_by: decode_uuid(&raw.created_by)?,
          updated_by: decode_uuid(&raw.updated_by)?,
          created_at: decode_dt(&raw.created_at)?,
          updated_at: decode_dt(&raw.updated_at)?,
          emails: emails.remove(&id).unwrap_or_default(),
          phone_numbers: phones.remove(&id).unwrap_or_default(),
          addresses: addresses.remove(&id).unwrap_or_default(),
          social_media_accounts: socials.remove(&id).unwrap_or_default(),
          tags: tags.remove(&id).unwrap_or_default(),
        })
      })
      .collect()
  }
}

/// Raw strings read directly from a `contact_views` row.
pub struct RawView {
  pub id:           String,
  pub workspace_id: String,
  pub name:         String,
  pub visibility:   String,
  pub filters:      String,
  pub sorting:      String,
  pub created_by:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawView {
  pub fn into_view(self) -> Result<ContactView> {
    let visibility: FieldVisibility = serde_json::from_str(&self.visibility)?;
    let filters: Vec<ContactFilter> = serde_json::from_str(&self.filters)?;
    let sorting: Vec<ContactSorting> = serde_json::from_str(&self.sorting)?;
    Ok(ContactView {
      id: decode_uuid(&self.id)?,
      workspace_id: decode_uuid(&self.workspace_id)?,
      name: self.name,
      visibility,
      filters,
      sorting,
      created_by: decode_uuid(&self.created_by)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use canvass_core::contact::PhoneStatus;

  use super::*;

  #[test]
  fn decode_enum_reports_the_column() {
    let ok: PhoneStatus = decode_enum("phone status", "wrong number").unwrap();
    assert_eq!(ok, PhoneStatus::WrongNumber);
    let err = decode_enum::<PhoneStatus>("phone status", "busy").unwrap_err();
    assert!(err.to_string().contains("phone status"), "{err}");
  }

  #[test]
  fn blank_optional_text_becomes_null() {
    assert_eq!(nullable(Some("  ".into())), None);
    assert_eq!(nullable(Some("x".into())), Some("x".into()));
    assert_eq!(nullable(None), None);
  }
}
