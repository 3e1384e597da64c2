//! Saved views: named projection, filter and sort configurations for the
//! contacts table.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use uuid::Uuid;

use crate::field::ContactField;

// ─── Visibility ──────────────────────────────────────────────────────────────

/// One visibility flag per [`ContactField`]. Fields missing from the map are
/// treated as visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldVisibility(BTreeMap<ContactField, bool>);

impl Default for FieldVisibility {
  fn default() -> Self {
    Self(ContactField::all().map(|f| (f, true)).collect())
  }
}

impl FieldVisibility {
  pub fn is_visible(&self, field: ContactField) -> bool {
    self.0.get(&field).copied().unwrap_or(true)
  }

  pub fn set(&mut self, field: ContactField, visible: bool) {
    self.0.insert(field, visible);
  }

  /// Visible fields in declaration order.
  pub fn visible(&self) -> Vec<ContactField> {
    ContactField::all().filter(|f| self.is_visible(*f)).collect()
  }
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// A filter comparison. Operators this build does not recognise are kept
/// verbatim in [`FilterOperator::Unknown`] and always match.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case")]
pub enum FilterOperator {
  Equals,
  Contains,
  StartsWith,
  EndsWith,
  GreaterThan,
  LessThan,
  #[strum(default)]
  Unknown(String),
}

impl FilterOperator {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Equals => "equals",
      Self::Contains => "contains",
      Self::StartsWith => "starts_with",
      Self::EndsWith => "ends_with",
      Self::GreaterThan => "greater_than",
      Self::LessThan => "less_than",
      Self::Unknown(op) => op,
    }
  }
}

impl From<String> for FilterOperator {
  fn from(s: String) -> Self {
    match Self::from_str(&s) {
      Ok(op) => op,
      Err(_) => Self::Unknown(s),
    }
  }
}

impl From<FilterOperator> for String {
  fn from(op: FilterOperator) -> Self { op.as_str().to_owned() }
}

impl fmt::Display for FilterOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One predicate of a view's filter list. A filter with an empty field, no
/// operator, or an empty value is incomplete and never excludes anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFilter {
  #[serde(default)]
  pub field:    String,
  #[serde(default)]
  pub operator: Option<FilterOperator>,
  #[serde(default)]
  pub value:    String,
}

impl ContactFilter {
  pub fn new(
    field: impl Into<String>,
    operator: FilterOperator,
    value: impl Into<String>,
  ) -> Self {
    Self {
      field:    field.into(),
      operator: Some(operator),
      value:    value.into(),
    }
  }

  pub fn is_complete(&self) -> bool {
    !self.field.is_empty() && self.operator.is_some() && !self.value.is_empty()
  }
}

// ─── Sorting ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

/// One sort key. An empty field name makes the key a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSorting {
  #[serde(default)]
  pub field:     String,
  #[serde(default)]
  pub direction: SortDirection,
}

impl ContactSorting {
  pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
    Self { field: field.into(), direction }
  }
}

// ─── ContactView ─────────────────────────────────────────────────────────────

/// A named, per-workspace configuration of visible fields, filters (an
/// implicit conjunction) and sort keys (first difference wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactView {
  pub id:           Uuid,
  pub workspace_id: Uuid,
  pub name:         String,
  #[serde(default)]
  pub visibility:   FieldVisibility,
  #[serde(default)]
  pub filters:      Vec<ContactFilter>,
  #[serde(default)]
  pub sorting:      Vec<ContactSorting>,
  pub created_by:   Uuid,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl ContactView {
  pub fn is_visible(&self, field: ContactField) -> bool {
    self.visibility.is_visible(field)
  }

  /// Fields offered when adding a filter or sort key.
  pub fn selectable_fields(&self) -> Vec<ContactField> {
    self.visibility.visible()
  }
}

/// Input to [`CrmStore::insert_view`](crate::store::CrmStore::insert_view).
/// New views start with every field visible and no filters or sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactView {
  pub workspace_id: Uuid,
  pub name:         String,
  pub created_by:   Uuid,
}
