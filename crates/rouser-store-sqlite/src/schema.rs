//! SQL schema for the SQLite directory.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` and `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS configurations (
    configuration_id INTEGER PRIMARY KEY AUTOINCREMENT
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT    NOT NULL UNIQUE,
    first_name       TEXT    NOT NULL,
    last_name        TEXT    NOT NULL,
    email_address    TEXT    NOT NULL,
    factive          INTEGER NOT NULL,
    fsystem          INTEGER NOT NULL,
    configuration_id INTEGER REFERENCES configurations(configuration_id),
    created_at       TEXT    NOT NULL   -- RFC 3339 UTC
);

-- One login credential per subject, keyed by subject name.
CREATE TABLE IF NOT EXISTS principals (
    name          TEXT PRIMARY KEY REFERENCES subjects(name),
    password_hash TEXT NOT NULL        -- argon2 PHC string
);

CREATE TABLE IF NOT EXISTS roles (
    role_id     INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS subject_roles (
    subject_id INTEGER NOT NULL REFERENCES subjects(subject_id),
    role_id    INTEGER NOT NULL REFERENCES roles(role_id),
    PRIMARY KEY (subject_id, role_id)
);

CREATE TABLE IF NOT EXISTS properties (
    configuration_id INTEGER NOT NULL REFERENCES configurations(configuration_id),
    name             TEXT    NOT NULL,
    string_value     TEXT    NOT NULL,
    override_default INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (configuration_id, name)
);

CREATE INDEX IF NOT EXISTS subjects_first_name_idx ON subjects(first_name);

INSERT OR IGNORE INTO roles (role_id, name, description) VALUES
    (1, 'Super User Role',
        'System superuser role that provides full access to everything.'),
    (2, 'All Resources Role',
        'Provides full management permissions for all resources.');

PRAGMA user_version = 1;
";
