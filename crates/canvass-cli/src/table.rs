//! Plain-text table output.

use std::io::{self, Write};

use canvass_core::{contact::Contact, field::ContactField};

/// Print `contacts` with an id column followed by one column per field.
pub fn contacts<'a>(
  out: &mut impl Write,
  fields: &[ContactField],
  contacts: impl Iterator<Item = &'a Contact>,
) -> io::Result<()> {
  let headers: Vec<&str> = std::iter::once("ID")
    .chain(fields.iter().map(|f| f.label()))
    .collect();
  let rows = contacts
    .map(|c| {
      std::iter::once(c.id.to_string())
        .chain(fields.iter().map(|f| f.value_of(c)))
        .collect()
    })
    .collect();
  render(out, &headers, rows)
}

/// Left-aligned columns separated by two spaces. Trailing padding is trimmed.
pub fn render(
  out: &mut impl Write,
  headers: &[&str],
  rows: Vec<Vec<String>>,
) -> io::Result<()> {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in &rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  writeln!(out, "{}", line(headers.iter().copied(), &widths))?;
  for row in &rows {
    writeln!(out, "{}", line(row.iter().map(String::as_str), &widths))?;
  }
  Ok(())
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
  let mut s = String::new();
  for (cell, width) in cells.zip(widths) {
    s.push_str(cell);
    s.extend(std::iter::repeat_n(' ', width - cell.chars().count() + 2));
  }
  s.trim_end().to_owned()
}
