//! Builders shared by the unit tests in this crate.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::{
  contact::{Contact, ContactStatus, Email, EmailStatus},
  view::{ContactFilter, ContactSorting, ContactView, FieldVisibility},
};

pub fn contact(first: &str, last: &str) -> Contact {
  let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  Contact {
    id:                    Uuid::new_v4(),
    workspace_id:          Uuid::nil(),
    first_name:            first.into(),
    middle_name:           None,
    last_name:             last.into(),
    race_id:               None,
    race:                  None,
    gender_id:             None,
    gender:                None,
    pronouns:              None,
    vanid:                 None,
    status:                ContactStatus::Active,
    created_by:            Uuid::nil(),
    updated_by:            Uuid::nil(),
    created_at:            at,
    updated_at:            at,
    emails:                vec![],
    phone_numbers:         vec![],
    addresses:             vec![],
    social_media_accounts: vec![],
    tags:                  vec![],
  }
}

pub fn email(contact_id: Uuid, address: &str) -> Email {
  Email {
    id: Uuid::new_v4(),
    contact_id,
    email: address.into(),
    status: EmailStatus::Active,
  }
}

pub fn view_with(
  filters: Vec<ContactFilter>,
  sorting: Vec<ContactSorting>,
) -> ContactView {
  let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  ContactView {
    id: Uuid::new_v4(),
    workspace_id: Uuid::nil(),
    name: "test".into(),
    visibility: FieldVisibility::default(),
    filters,
    sorting,
    created_by: Uuid::nil(),
    created_at: at,
    updated_at: at,
  }
}
