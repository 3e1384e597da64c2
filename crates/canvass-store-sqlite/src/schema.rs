//! SQL schema for the canvass SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE` seed rows.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS workspaces (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS races (
    id    TEXT PRIMARY KEY,
    race  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS genders (
    id      TEXT PRIMARY KEY,
    gender  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS contacts (
    id            TEXT PRIMARY KEY,
    workspace_id  TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    first_name    TEXT NOT NULL CHECK (first_name <> ''),
    middle_name   TEXT,
    last_name     TEXT NOT NULL CHECK (last_name <> ''),
    race_id       TEXT REFERENCES races(id),
    gender_id     TEXT REFERENCES genders(id),
    pronouns      TEXT,
    vanid         TEXT,
    status        TEXT NOT NULL DEFAULT 'active'
                  CHECK (status IN ('active', 'inactive', 'deceased', 'moved')),
    created_by    TEXT NOT NULL,   -- user id from the auth provider
    updated_by    TEXT NOT NULL,
    created_at    TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS emails (
    id          TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    email       TEXT NOT NULL,
    status      TEXT NOT NULL
                CHECK (status IN ('active', 'inactive', 'bounced', 'unsubscribed'))
);

CREATE TABLE IF NOT EXISTS phone_numbers (
    id          TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    number      TEXT NOT NULL,
    kind        TEXT NOT NULL DEFAULT 'mobile',
    status      TEXT NOT NULL
                CHECK (status IN ('active', 'inactive', 'wrong number', 'disconnected'))
);

CREATE TABLE IF NOT EXISTS addresses (
    id          TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    street      TEXT NOT NULL,
    city        TEXT NOT NULL,
    state       TEXT,
    zip         TEXT,
    status      TEXT NOT NULL CHECK (status IN ('active', 'inactive', 'moved'))
);

CREATE TABLE IF NOT EXISTS social_media_accounts (
    id          TEXT PRIMARY KEY,
    contact_id  TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    service     TEXT NOT NULL,
    username    TEXT NOT NULL,
    status      TEXT NOT NULL CHECK (status IN ('active', 'inactive'))
);

CREATE TABLE IF NOT EXISTS tags (
    id            TEXT PRIMARY KEY,
    workspace_id  TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    tag           TEXT NOT NULL,
    UNIQUE (workspace_id, tag)
);

CREATE TABLE IF NOT EXISTS tag_assignments (
    contact_id  TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
    tag_id      TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (contact_id, tag_id)
);

-- Structured view configuration lives in JSON columns.
CREATE TABLE IF NOT EXISTS contact_views (
    id            TEXT PRIMARY KEY,
    workspace_id  TEXT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name          TEXT NOT NULL,
    visibility    TEXT NOT NULL,                -- {\"first_name\": true, ...}
    filters       TEXT NOT NULL DEFAULT '[]',
    sorting       TEXT NOT NULL DEFAULT '[]',
    created_by    TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_workspace_idx ON contacts(workspace_id);
CREATE INDEX IF NOT EXISTS emails_contact_idx     ON emails(contact_id);
CREATE INDEX IF NOT EXISTS phones_contact_idx     ON phone_numbers(contact_id);
CREATE INDEX IF NOT EXISTS addresses_contact_idx  ON addresses(contact_id);
CREATE INDEX IF NOT EXISTS socials_contact_idx    ON social_media_accounts(contact_id);
CREATE INDEX IF NOT EXISTS views_workspace_idx    ON contact_views(workspace_id);

INSERT OR IGNORE INTO races (id, race) VALUES
    ('6a1c0b4e-0001-4000-8000-000000000001', 'American Indian or Alaska Native'),
    ('6a1c0b4e-0001-4000-8000-000000000002', 'Asian'),
    ('6a1c0b4e-0001-4000-8000-000000000003', 'Black or African American'),
    ('6a1c0b4e-0001-4000-8000-000000000004', 'Hispanic or Latino'),
    ('6a1c0b4e-0001-4000-8000-000000000005', 'Middle Eastern or North African'),
    ('6a1c0b4e-0001-4000-8000-000000000006', 'Native Hawaiian or Pacific Islander'),
    ('6a1c0b4e-0001-4000-8000-000000000007', 'White'),
    ('6a1c0b4e-0001-4000-8000-000000000008', 'Multiracial');

INSERT OR IGNORE INTO genders (id, gender) VALUES
    ('6a1c0b4e-0002-4000-8000-000000000001', 'Woman'),
    ('6a1c0b4e-0002-4000-8000-000000000002', 'Man'),
    ('6a1c0b4e-0002-4000-8000-000000000003', 'Non-binary'),
    ('6a1c0b4e-0002-4000-8000-000000000004', 'Prefer to self-describe');

PRAGMA user_version = 1;
";
