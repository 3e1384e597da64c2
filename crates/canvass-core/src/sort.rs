//! Multi-key ordering for filtered contact lists.
//!
//! Keys are tried in order and the first key whose values differ decides.
//! Contacts that tie on every key keep their relative input order because
//! the underlying sort is stable.

use std::cmp::Ordering;

use deunicode::deunicode;

use crate::{
  contact::Contact,
  field::field_value,
  view::{ContactSorting, SortDirection},
};

/// Sort `contacts` in place by `sorting`. An empty key list is a no-op.
pub fn sort_contacts(contacts: &mut [&Contact], sorting: &[ContactSorting]) {
  if sorting.iter().all(|k| k.field.is_empty()) {
    return;
  }
  contacts.sort_by(|a, b| compare_contacts(a, b, sorting));
}

pub fn compare_contacts(
  a: &Contact,
  b: &Contact,
  sorting: &[ContactSorting],
) -> Ordering {
  for key in sorting.iter().filter(|k| !k.field.is_empty()) {
    let av = field_value(a, &key.field);
    let bv = field_value(b, &key.field);
    if av == bv {
      continue;
    }
    let ord = locale_compare(&av, &bv);
    return match key.direction {
      SortDirection::Asc => ord,
      SortDirection::Desc => ord.reverse(),
    };
  }
  Ordering::Equal
}

/// Human-oriented string order: accents and case are ignored at first, then
/// accented forms follow plain ones, then lowercase precedes uppercase.
/// Distinct strings never compare equal.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
  let primary = |s: &str| deunicode(s).to_lowercase();
  primary(a)
    .cmp(&primary(b))
    .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    .then_with(|| b.cmp(a))
}
