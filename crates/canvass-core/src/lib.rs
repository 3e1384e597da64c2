//! Core types and the view engine for canvass.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the contact and view model, the [`store::CrmStore`] contract, and
//! the pure filter/sort engine that turns a contact list plus a view into the
//! rows a table shows.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod contact;
pub mod error;
pub mod field;
pub mod filter;
pub mod sort;
pub mod store;
pub mod view;

#[cfg(test)]
mod test_support;

pub use error::{ChildFailure, Error, Result};

use contact::Contact;
use view::ContactView;

/// Filter `contacts` by the free-text `query` and the view's filters, then
/// order the survivors by the view's sort keys.
pub fn project<'a>(
  contacts: &'a [Contact],
  query: &str,
  view: Option<&ContactView>,
) -> Vec<&'a Contact> {
  let mut rows = filter::filter_contacts(contacts, query, view);
  if let Some(view) = view {
    sort::sort_contacts(&mut rows, &view.sorting);
  }
  rows
}
