//! Filter evaluation over an in-memory contact list.
//!
//! Two stages run in order: a free-text search over the name and external-id
//! fields, then the active view's filters as a logical AND. The output is a
//! subsequence of the input; nothing here reorders.

use crate::{
  contact::Contact,
  field::field_value,
  view::{ContactFilter, ContactView, FilterOperator},
};

/// Apply the free-text `query` and the filters of `view` to `contacts`.
pub fn filter_contacts<'a>(
  contacts: &'a [Contact],
  query: &str,
  view: Option<&ContactView>,
) -> Vec<&'a Contact> {
  let query = query.to_lowercase();
  let filters = view.map(|v| v.filters.as_slice()).unwrap_or_default();

  contacts
    .iter()
    .filter(|c| query.is_empty() || matches_query(c, &query))
    .filter(|c| filters.iter().all(|f| filter_matches(f, c)))
    .collect()
}

/// `query` must already be lower-cased.
pub fn matches_query(contact: &Contact, query: &str) -> bool {
  let hit = |s: &str| s.to_lowercase().contains(query);
  hit(&contact.first_name)
    || hit(&contact.last_name)
    || contact.middle_name.as_deref().is_some_and(hit)
    || contact.vanid.as_deref().is_some_and(hit)
}

/// Evaluate one filter. Incomplete filters and unknown operators match.
pub fn filter_matches(filter: &ContactFilter, contact: &Contact) -> bool {
  let Some(op) = filter.operator.as_ref().filter(|_| filter.is_complete())
  else {
    return true;
  };

  let actual = field_value(contact, &filter.field);
  match op {
    FilterOperator::Equals => actual.to_lowercase() == filter.value.to_lowercase(),
    FilterOperator::Contains => actual
      .to_lowercase()
      .contains(&filter.value.to_lowercase()),
    FilterOperator::StartsWith => actual
      .to_lowercase()
      .starts_with(&filter.value.to_lowercase()),
    FilterOperator::EndsWith => actual
      .to_lowercase()
      .ends_with(&filter.value.to_lowercase()),
    FilterOperator::GreaterThan => {
      coerce_number(&actual) > coerce_number(&filter.value)
    }
    FilterOperator::LessThan => {
      coerce_number(&actual) < coerce_number(&filter.value)
    }
    FilterOperator::Unknown(_) => true,
  }
}

/// Loose numeric coercion matching the browser's `Number(string)`:
/// surrounding whitespace is ignored, the empty string is zero, decimal and
/// exponent forms, `Infinity`, and `0x`/`0o`/`0b` integer literals parse,
/// and anything else is NaN. Every comparison against NaN is false.
pub fn coerce_number(raw: &str) -> f64 {
  let s = raw.trim();
  if s.is_empty() {
    return 0.0;
  }

  match s {
    "Infinity" | "+Infinity" => return f64::INFINITY,
    "-Infinity" => return f64::NEG_INFINITY,
    _ => {}
  }

  for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
  {
    if let Some(digits) = s.strip_prefix(prefix) {
      if digits.starts_with(['+', '-']) {
        return f64::NAN;
      }
      return u128::from_str_radix(digits, radix)
        .map(|n| n as f64)
        .unwrap_or(f64::NAN);
    }
  }

  // `f64::from_str` also accepts "inf" and "nan" spellings that `Number`
  // rejects.
  if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
    return f64::NAN;
  }
  s.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{contact, view_with};

  fn names<'a>(list: &[&'a Contact]) -> Vec<&'a str> {
    list.iter().map(|c| c.first_name.as_str()).collect()
  }

  #[test]
  fn no_query_and_no_filters_is_identity() {
    let contacts = vec![contact("Ann", "Bell"), contact("Cy", "Dunn")];
    let view = view_with(vec![], vec![]);
    let out = filter_contacts(&contacts, "", Some(&view));
    assert_eq!(names(&out), ["Ann", "Cy"]);
    assert_eq!(filter_contacts(&contacts, "", None).len(), 2);
  }

  #[test]
  fn free_text_is_case_insensitive() {
    let contacts = vec![contact("Jane", "Doe"), contact("Bob", "Roe")];
    let out = filter_contacts(&contacts, "jane", None);
    assert_eq!(names(&out), ["Jane"]);
    let out = filter_contacts(&contacts, "ROE", None);
    assert_eq!(names(&out), ["Bob"]);
  }

  #[test]
  fn free_text_checks_middle_name_and_vanid() {
    let mut a = contact("Ann", "Bell");
    a.middle_name = Some("Quinn".into());
    let mut b = contact("Cy", "Dunn");
    b.vanid = Some("VAN-0042".into());
    let contacts = vec![a, b];
    assert_eq!(names(&filter_contacts(&contacts, "quin", None)), ["Ann"]);
    assert_eq!(names(&filter_contacts(&contacts, "van-00", None)), ["Cy"]);
  }

  #[test]
  fn free_text_runs_without_a_view() {
    let contacts = vec![contact("Jane", "Doe"), contact("Bob", "Roe")];
    let view = view_with(
      vec![ContactFilter::new("last_name", FilterOperator::Equals, "doe")],
      vec![],
    );
    assert!(filter_contacts(&contacts, "bob", Some(&view)).is_empty());
  }

  #[test]
  fn starts_with_preserves_order() {
    let contacts = vec![
      contact("John", "A"),
      contact("Jane", "B"),
      contact("Joanna", "C"),
    ];
    let view = view_with(
      vec![ContactFilter::new("first_name", FilterOperator::StartsWith, "Jo")],
      vec![],
    );
    let out = filter_contacts(&contacts, "", Some(&view));
    assert_eq!(names(&out), ["John", "Joanna"]);
  }

  #[test]
  fn contains_reaches_joined_emails() {
    let mut hit = contact("Xavier", "Y");
    hit.emails.push(crate::test_support::email(hit.id, "x@gmail.com"));
    let miss = contact("Zed", "Q");
    let contacts = vec![hit, miss];
    let view = view_with(
      vec![ContactFilter::new("emails", FilterOperator::Contains, "@gmail")],
      vec![],
    );
    assert_eq!(names(&filter_contacts(&contacts, "", Some(&view))), ["Xavier"]);
  }

  #[test]
  fn equals_and_suffix_ignore_case() {
    let c = contact("Maria", "Lopez");
    assert!(filter_matches(
      &ContactFilter::new("last_name", FilterOperator::Equals, "LOPEZ"),
      &c
    ));
    assert!(!filter_matches(
      &ContactFilter::new("last_name", FilterOperator::Equals, "Lope"),
      &c
    ));
    assert!(filter_matches(
      &ContactFilter::new("first_name", FilterOperator::EndsWith, "RIA"),
      &c
    ));
  }

  #[test]
  fn impossible_filter_yields_nothing() {
    let contacts = vec![contact("Ann", "Bell"), contact("Cy", "Dunn")];
    let view = view_with(
      vec![ContactFilter::new("last_name", FilterOperator::Equals, "Nobody")],
      vec![],
    );
    assert!(filter_contacts(&contacts, "", Some(&view)).is_empty());
  }

  #[test]
  fn adding_filters_never_widens_the_result() {
    let contacts = vec![
      contact("Ann", "Bell"),
      contact("Anna", "Bellamy"),
      contact("Bo", "Bell"),
      contact("Cy", "Dunn"),
    ];
    let steps = [
      ContactFilter::new("last_name", FilterOperator::StartsWith, "bell"),
      ContactFilter::new("first_name", FilterOperator::Contains, "an"),
      ContactFilter::new("first_name", FilterOperator::EndsWith, "a"),
    ];
    let mut filters = Vec::new();
    let mut previous = contacts.len();
    for step in steps {
      filters.push(step);
      let view = view_with(filters.clone(), vec![]);
      let n = filter_contacts(&contacts, "", Some(&view)).len();
      assert!(n <= previous, "{n} > {previous}");
      previous = n;
    }
    assert_eq!(previous, 1);
  }

  #[test]
  fn incomplete_and_unknown_filters_are_permissive() {
    let c = contact("Ann", "Bell");
    let no_value = ContactFilter::new("first_name", FilterOperator::Equals, "");
    let no_field = ContactFilter::new("", FilterOperator::Equals, "zzz");
    let no_op = ContactFilter {
      field:    "first_name".into(),
      operator: None,
      value:    "zzz".into(),
    };
    let unknown = ContactFilter::new(
      "first_name",
      FilterOperator::Unknown("sounds_like".into()),
      "zzz",
    );
    for f in [no_value, no_field, no_op, unknown] {
      assert!(filter_matches(&f, &c), "{f:?}");
    }
  }

  #[test]
  fn numeric_comparisons_coerce_both_sides() {
    let mut c = contact("Ann", "Bell");
    c.vanid = Some(" 120 ".into());
    assert!(filter_matches(
      &ContactFilter::new("vanid", FilterOperator::GreaterThan, "99"),
      &c
    ));
    assert!(!filter_matches(
      &ContactFilter::new("vanid", FilterOperator::LessThan, "99"),
      &c
    ));
    // "Bell" coerces to NaN: neither side of the comparison holds.
    assert!(!filter_matches(
      &ContactFilter::new("last_name", FilterOperator::GreaterThan, "1"),
      &c
    ));
    assert!(!filter_matches(
      &ContactFilter::new("last_name", FilterOperator::LessThan, "1"),
      &c
    ));
  }

  #[test]
  fn coercion_follows_number_semantics() {
    assert_eq!(coerce_number(""), 0.0);
    assert_eq!(coerce_number("   "), 0.0);
    assert_eq!(coerce_number("42"), 42.0);
    assert_eq!(coerce_number("-1.5e2"), -150.0);
    assert_eq!(coerce_number(".5"), 0.5);
    assert_eq!(coerce_number("0x1F"), 31.0);
    assert_eq!(coerce_number("0b101"), 5.0);
    assert_eq!(coerce_number("Infinity"), f64::INFINITY);
    assert!(coerce_number("inf").is_nan());
    assert!(coerce_number("NaN").is_nan());
    assert!(coerce_number("12abc").is_nan());
    assert!(coerce_number("0x").is_nan());
    assert!(coerce_number("1_000").is_nan());
  }
}
