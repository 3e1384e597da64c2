//! [`SqliteStore`]: the SQLite implementation of [`CrmStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use canvass_core::{
  contact::{
    Address, Contact, ContactPatch, Email, Gender, NewAddress, NewContact,
    NewEmail, NewPhoneNumber, NewSocialMediaAccount, PhoneNumber, Race,
    SocialMediaAccount, Tag, TagAssignment, Workspace,
  },
  field::ContactField,
  store::CrmStore,
  view::{ContactView, FieldVisibility, NewContactView},
};

use crate::{
  encode::{
    RawAddress, RawContact, RawContactSet, RawEmail, RawPhone, RawSocial,
    RawTag, RawTagAssignment, RawView, RawWorkspace, decode_uuid, encode_dt,
    encode_uuid, nullable,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Queries ─────────────────────────────────────────────────────────────────

const CONTACT_SELECT: &str = "
  SELECT c.id, c.workspace_id, c.first_name, c.middle_name, c.last_name,
         c.race_id, r.race, c.gender_id, g.gender, c.pronouns, c.vanid,
         c.status, c.created_by, c.updated_by, c.created_at, c.updated_at
  FROM contacts c
  LEFT JOIN races   r ON r.id = c.race_id
  LEFT JOIN genders g ON g.id = c.gender_id";

const VIEW_SELECT: &str = "
  SELECT id, workspace_id, name, visibility, filters, sorting,
         created_by, created_at, updated_at
  FROM contact_views";

/// Which contacts a joined read covers. The variant picks the `WHERE`
/// clause; the bound parameter is always `?1`.
#[derive(Clone, Copy)]
enum Scope {
  Workspace,
  Contact,
}

impl Scope {
  fn clause(self) -> &'static str {
    match self {
      Scope::Workspace => "c.workspace_id = ?1",
      Scope::Contact => "c.id = ?1",
    }
  }
}

/// Read contacts and all their child rows in one pass over the connection.
fn load_contact_set(
  conn: &rusqlite::Connection,
  scope: Scope,
  key: &str,
) -> rusqlite::Result<RawContactSet> {
  let clause = scope.clause();

  let mut stmt =
    conn.prepare(&format!("{CONTACT_SELECT} WHERE {clause} ORDER BY c.rowid"))?;
  let contacts = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawContact {
        id:           row.get(0)?,
        workspace_id: row.get(1)?,
        first_name:   row.get(2)?,
        middle_name:  row.get(3)?,
        last_name:    row.get(4)?,
        race_id:      row.get(5)?,
        race:         row.get(6)?,
        gender_id:    row.get(7)?,
        gender:       row.get(8)?,
        pronouns:     row.get(9)?,
        vanid:        row.get(10)?,
        status:       row.get(11)?,
        created_by:   row.get(12)?,
        updated_by:   row.get(13)?,
        created_at:   row.get(14)?,
        updated_at:   row.get(15)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT e.id, e.contact_id, e.email, e.status
     FROM emails e JOIN contacts c ON c.id = e.contact_id
     WHERE {clause} ORDER BY e.rowid"
  ))?;
  let emails = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawEmail {
        id:         row.get(0)?,
        contact_id: row.get(1)?,
        email:      row.get(2)?,
        status:     row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT p.id, p.contact_id, p.number, p.kind, p.status
     FROM phone_numbers p JOIN contacts c ON c.id = p.contact_id
     WHERE {clause} ORDER BY p.rowid"
  ))?;
  let phones = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawPhone {
        id:         row.get(0)?,
        contact_id: row.get(1)?,
        number:     row.get(2)?,
        kind:       row.get(3)?,
        status:     row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT a.id, a.contact_id, a.street, a.city, a.state, a.zip, a.status
     FROM addresses a JOIN contacts c ON c.id = a.contact_id
     WHERE {clause} ORDER BY a.rowid"
  ))?;
  let addresses = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawAddress {
        id:         row.get(0)?,
        contact_id: row.get(1)?,
        street:     row.get(2)?,
        city:       row.get(3)?,
        state:      row.get(4)?,
        zip:        row.get(5)?,
        status:     row.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT s.id, s.contact_id, s.service, s.username, s.status
     FROM social_media_accounts s JOIN contacts c ON c.id = s.contact_id
     WHERE {clause} ORDER BY s.rowid"
  ))?;
  let socials = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawSocial {
        id:         row.get(0)?,
        contact_id: row.get(1)?,
        service:    row.get(2)?,
        username:   row.get(3)?,
        status:     row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(&format!(
    "SELECT ta.contact_id, ta.tag_id, t.workspace_id, t.tag
     FROM tag_assignments ta
     JOIN tags t     ON t.id = ta.tag_id
     JOIN contacts c ON c.id = ta.contact_id
     WHERE {clause} ORDER BY ta.rowid"
  ))?;
  let tags = stmt
    .query_map(rusqlite::params![key], |row| {
      Ok(RawTagAssignment {
        contact_id:   row.get(0)?,
        tag_id:       row.get(1)?,
        workspace_id: row.get(2)?,
        tag:          row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(RawContactSet { contacts, emails, phones, addresses, socials, tags })
}

fn view_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawView> {
  Ok(RawView {
    id:           row.get(0)?,
    workspace_id: row.get(1)?,
    name:         row.get(2)?,
    visibility:   row.get(3)?,
    filters:      row.get(4)?,
    sorting:      row.get(5)?,
    created_by:   row.get(6)?,
    created_at:   row.get(7)?,
    updated_at:   row.get(8)?,
  })
}

fn text(s: String) -> Value { Value::Text(s) }

fn nullable_text(s: String) -> Value {
  nullable(Some(s)).map_or(Value::Null, Value::Text)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canvass backing store in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_contacts(&self, scope: Scope, key: Uuid) -> Result<Vec<Contact>> {
    let key = encode_uuid(key);
    let raw = self
      .conn
      .call(move |conn| Ok(load_contact_set(conn, scope, &key)?))
      .await?;
    raw.into_contacts()
  }

  async fn get_view(&self, id: Uuid) -> Result<Option<ContactView>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawView> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("{VIEW_SELECT} WHERE id = ?1"),
            rusqlite::params![id_str],
            view_from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawView::into_view).transpose()
  }
}

// ─── CrmStore impl ───────────────────────────────────────────────────────────

impl CrmStore for SqliteStore {
  type Error = Error;

  // ── Workspaces ────────────────────────────────────────────────────────────

  async fn add_workspace(&self, name: String) -> Result<Workspace> {
    if name.trim().is_empty() {
      return Err(Error::Validation("workspace name is required".into()));
    }
    let workspace = Workspace {
      id:         Uuid::new_v4(),
      name:       name.trim().to_owned(),
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(workspace.id);
    let name_str = workspace.name.clone();
    let at_str   = encode_dt(workspace.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO workspaces (id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(workspace)
  }

  async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
    let raws: Vec<RawWorkspace> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT id, name, created_at FROM workspaces ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawWorkspace {
              id:         row.get(0)?,
              name:       row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWorkspace::into_workspace).collect()
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  async fn list_races(&self) -> Result<Vec<Race>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, race FROM races ORDER BY race")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, race)| Ok(Race { id: decode_uuid(&id)?, race }))
      .collect()
  }

  async fn list_genders(&self) -> Result<Vec<Gender>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT id, gender FROM genders ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, gender)| Ok(Gender { id: decode_uuid(&id)?, gender }))
      .collect()
  }

  async fn list_tags(&self, workspace_id: Uuid) -> Result<Vec<Tag>> {
    let ws_str = encode_uuid(workspace_id);
    let raws: Vec<RawTag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, workspace_id, tag FROM tags WHERE workspace_id = ?1 ORDER BY tag",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![ws_str], |row| {
            Ok(RawTag {
              id:           row.get(0)?,
              workspace_id: row.get(1)?,
              tag:          row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTag::into_tag).collect()
  }

  /// Idempotent: adding an existing tag name returns the existing row.
  async fn add_tag(&self, workspace_id: Uuid, tag: String) -> Result<Tag> {
    let tag = tag.trim().to_owned();
    if tag.is_empty() {
      return Err(Error::Validation("tag name is required".into()));
    }
    let id_str = encode_uuid(Uuid::new_v4());
    let ws_str = encode_uuid(workspace_id);

    let raw: RawTag = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tags (id, workspace_id, tag) VALUES (?1, ?2, ?3)
           ON CONFLICT (workspace_id, tag) DO NOTHING",
          rusqlite::params![id_str, ws_str, tag],
        )?;
        Ok(conn.query_row(
          "SELECT id, workspace_id, tag FROM tags WHERE workspace_id = ?1 AND tag = ?2",
          rusqlite::params![ws_str, tag],
          |row| {
            Ok(RawTag {
              id:           row.get(0)?,
              workspace_id: row.get(1)?,
              tag:          row.get(2)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_tag()
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn list_contacts(&self, workspace_id: Uuid) -> Result<Vec<Contact>> {
    self.load_contacts(Scope::Workspace, workspace_id).await
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    Ok(self.load_contacts(Scope::Contact, id).await?.into_iter().next())
  }

  async fn insert_contact(&self, input: NewContact) -> Result<Contact> {
    input.validate()?;

    let id  = Uuid::new_v4();
    let now = encode_dt(Utc::now());
    let by  = encode_uuid(input.created_by);

    let params: Vec<Value> = vec![
      text(encode_uuid(id)),
      text(encode_uuid(input.workspace_id)),
      text(input.first_name.trim().to_owned()),
      input.middle_name.map_or(Value::Null, nullable_text),
      text(input.last_name.trim().to_owned()),
      input.race_id.map_or(Value::Null, |r| text(encode_uuid(r))),
      input.gender_id.map_or(Value::Null, |g| text(encode_uuid(g))),
      input.pronouns.map_or(Value::Null, nullable_text),
      input.vanid.map_or(Value::Null, nullable_text),
      text(input.status.to_string()),
      text(by.clone()),
      text(by),
      text(now.clone()),
      text(now),
    ];

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             id, workspace_id, first_name, middle_name, last_name,
             race_id, gender_id, pronouns, vanid, status,
             created_by, updated_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params_from_iter(params),
        )?;
        Ok(())
      })
      .await?;

    self.get_contact(id).await?.ok_or(Error::ContactNotFound(id))
  }

  async fn update_contact(&self, id: Uuid, patch: ContactPatch) -> Result<Contact> {
    patch.validate()?;

    let mut sets: Vec<(&'static str, Value)> = Vec::new();
    if let Some(v) = patch.first_name {
      sets.push(("first_name", text(v.trim().to_owned())));
    }
    if let Some(v) = patch.middle_name {
      sets.push(("middle_name", nullable_text(v)));
    }
    if let Some(v) = patch.last_name {
      sets.push(("last_name", text(v.trim().to_owned())));
    }
    if let Some(v) = patch.race_id {
      sets.push(("race_id", text(encode_uuid(v))));
    }
    if let Some(v) = patch.gender_id {
      sets.push(("gender_id", text(encode_uuid(v))));
    }
    if let Some(v) = patch.pronouns {
      sets.push(("pronouns", nullable_text(v)));
    }
    if let Some(v) = patch.vanid {
      sets.push(("vanid", nullable_text(v)));
    }
    if let Some(v) = patch.status {
      sets.push(("status", text(v.to_string())));
    }
    sets.push(("updated_by", text(encode_uuid(patch.updated_by))));
    sets.push(("updated_at", text(encode_dt(Utc::now()))));

    let assignments = sets
      .iter()
      .enumerate()
      .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE contacts SET {assignments} WHERE id = ?{}",
      sets.len() + 1
    );
    let mut params: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
    params.push(text(encode_uuid(id)));

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await?;

    if changed == 0 {
      return Err(Error::ContactNotFound(id));
    }
    self.get_contact(id).await?.ok_or(Error::ContactNotFound(id))
  }

  async fn delete_contact(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM contacts WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ContactNotFound(id));
    }
    tracing::debug!(contact_id = %id, "deleted contact");
    Ok(())
  }

  // ── Child collections ─────────────────────────────────────────────────────

  async fn insert_emails(
    &self,
    contact_id: Uuid,
    emails: Vec<NewEmail>,
  ) -> Result<Vec<Email>> {
    let rows: Vec<Email> = emails
      .into_iter()
      .map(|e| Email {
        id: Uuid::new_v4(),
        contact_id,
        email: e.email.trim().to_owned(),
        status: e.status,
      })
      .collect();

    let params: Vec<[String; 4]> = rows
      .iter()
      .map(|e| {
        [
          encode_uuid(e.id),
          encode_uuid(e.contact_id),
          e.email.clone(),
          e.status.to_string(),
        ]
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO emails (id, contact_id, email, status) VALUES (?1, ?2, ?3, ?4)",
          )?;
          for p in &params {
            stmt.execute(rusqlite::params_from_iter(p))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(rows)
  }

  async fn insert_phone_numbers(
    &self,
    contact_id: Uuid,
    phones: Vec<NewPhoneNumber>,
  ) -> Result<Vec<PhoneNumber>> {
    let rows: Vec<PhoneNumber> = phones
      .into_iter()
      .map(|p| PhoneNumber {
        id: Uuid::new_v4(),
        contact_id,
        number: p.number.trim().to_owned(),
        kind: p.kind,
        status: p.status,
      })
      .collect();

    let params: Vec<[String; 5]> = rows
      .iter()
      .map(|p| {
        [
          encode_uuid(p.id),
          encode_uuid(p.contact_id),
          p.number.clone(),
          p.kind.to_string(),
          p.status.to_string(),
        ]
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO phone_numbers (id, contact_id, number, kind, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for p in &params {
            stmt.execute(rusqlite::params_from_iter(p))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(rows)
  }

  async fn insert_addresses(
    &self,
    contact_id: Uuid,
    addresses: Vec<NewAddress>,
  ) -> Result<Vec<Address>> {
    let rows: Vec<Address> = addresses
      .into_iter()
      .map(|a| Address {
        id: Uuid::new_v4(),
        contact_id,
        street: a.street.trim().to_owned(),
        city: a.city.trim().to_owned(),
        state: nullable(a.state),
        zip: nullable(a.zip),
        status: a.status,
      })
      .collect();

    let params: Vec<Vec<Value>> = rows
      .iter()
      .map(|a| {
        vec![
          text(encode_uuid(a.id)),
          text(encode_uuid(a.contact_id)),
          text(a.street.clone()),
          text(a.city.clone()),
          a.state.clone().map_or(Value::Null, Value::Text),
          a.zip.clone().map_or(Value::Null, Value::Text),
          text(a.status.to_string()),
        ]
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO addresses (id, contact_id, street, city, state, zip, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for p in params {
            stmt.execute(rusqlite::params_from_iter(p))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(rows)
  }

  async fn insert_social_media_accounts(
    &self,
    contact_id: Uuid,
    accounts: Vec<NewSocialMediaAccount>,
  ) -> Result<Vec<SocialMediaAccount>> {
    let rows: Vec<SocialMediaAccount> = accounts
      .into_iter()
      .map(|s| SocialMediaAccount {
        id: Uuid::new_v4(),
        contact_id,
        service: s.service.trim().to_owned(),
        username: s.username.trim().to_owned(),
        status: s.status,
      })
      .collect();

    let params: Vec<[String; 5]> = rows
      .iter()
      .map(|s| {
        [
          encode_uuid(s.id),
          encode_uuid(s.contact_id),
          s.service.clone(),
          s.username.clone(),
          s.status.to_string(),
        ]
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO social_media_accounts (id, contact_id, service, username, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for p in &params {
            stmt.execute(rusqlite::params_from_iter(p))?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(rows)
  }

  /// Assigning an already-assigned tag is a no-op.
  async fn assign_tags(
    &self,
    contact_id: Uuid,
    tag_ids: Vec<Uuid>,
  ) -> Result<Vec<TagAssignment>> {
    let contact_str = encode_uuid(contact_id);
    let tag_strs: Vec<String> = tag_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawTagAssignment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(tag_strs.len());
        {
          let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO tag_assignments (contact_id, tag_id) VALUES (?1, ?2)",
          )?;
          let mut select = tx.prepare(
            "SELECT ?1, t.id, t.workspace_id, t.tag FROM tags t WHERE t.id = ?2",
          )?;
          for tag_id in &tag_strs {
            insert.execute(rusqlite::params![contact_str, tag_id])?;
            out.push(select.query_row(rusqlite::params![contact_str, tag_id], |row| {
              Ok(RawTagAssignment {
                contact_id:   row.get(0)?,
                tag_id:       row.get(1)?,
                workspace_id: row.get(2)?,
                tag:          row.get(3)?,
              })
            })?);
          }
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;

    raws.into_iter().map(RawTagAssignment::into_assignment).collect()
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  async fn list_views(&self, workspace_id: Uuid) -> Result<Vec<ContactView>> {
    let ws_str = encode_uuid(workspace_id);
    let raws: Vec<RawView> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare(&format!("{VIEW_SELECT} WHERE workspace_id = ?1 ORDER BY rowid"))?;
        let rows = stmt
          .query_map(rusqlite::params![ws_str], view_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawView::into_view).collect()
  }

  async fn insert_view(&self, input: NewContactView) -> Result<ContactView> {
    let name = input.name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::Validation("view name is required".into()));
    }

    let now = Utc::now();
    let view = ContactView {
      id: Uuid::new_v4(),
      workspace_id: input.workspace_id,
      name,
      visibility: FieldVisibility::default(),
      filters: Vec::new(),
      sorting: Vec::new(),
      created_by: input.created_by,
      created_at: now,
      updated_at: now,
    };

    let params = [
      encode_uuid(view.id),
      encode_uuid(view.workspace_id),
      view.name.clone(),
      serde_json::to_string(&view.visibility)?,
      serde_json::to_string(&view.filters)?,
      serde_json::to_string(&view.sorting)?,
      encode_uuid(view.created_by),
      encode_dt(view.created_at),
      encode_dt(view.updated_at),
    ];

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contact_views (
             id, workspace_id, name, visibility, filters, sorting,
             created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params_from_iter(params),
        )?;
        Ok(())
      })
      .await?;

    Ok(view)
  }

  async fn update_view(&self, view: ContactView) -> Result<ContactView> {
    if view.name.trim().is_empty() {
      return Err(Error::Validation("view name is required".into()));
    }
    let id = view.id;
    let params = [
      view.name.trim().to_owned(),
      serde_json::to_string(&view.visibility)?,
      serde_json::to_string(&view.filters)?,
      serde_json::to_string(&view.sorting)?,
      encode_dt(Utc::now()),
      encode_uuid(id),
    ];

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contact_views
           SET name = ?1, visibility = ?2, filters = ?3, sorting = ?4, updated_at = ?5
           WHERE id = ?6",
          rusqlite::params_from_iter(params),
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ViewNotFound(id));
    }
    self.get_view(id).await?.ok_or(Error::ViewNotFound(id))
  }

  async fn set_view_visibility(
    &self,
    view_id: Uuid,
    field: ContactField,
    visible: bool,
  ) -> Result<ContactView> {
    let path = format!("$.{field}");
    let flag = if visible { "true" } else { "false" };
    let params = [path, flag.to_owned(), encode_dt(Utc::now()), encode_uuid(view_id)];

    // A single statement keeps concurrent toggles from clobbering each other.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contact_views
           SET visibility = json_set(visibility, ?1, json(?2)), updated_at = ?3
           WHERE id = ?4",
          rusqlite::params_from_iter(params),
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ViewNotFound(view_id));
    }
    self.get_view(view_id).await?.ok_or(Error::ViewNotFound(view_id))
  }

  async fn delete_view(&self, view_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(view_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM contact_views WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ViewNotFound(view_id));
    }
    Ok(())
  }
}
