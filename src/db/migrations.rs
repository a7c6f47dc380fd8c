use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "-- Migration 1: Initial schema

CREATE TABLE owners (
    id TEXT PRIMARY KEY,
    phone_number TEXT NOT NULL UNIQUE,
    access_code TEXT,
    access_code_expires_at TEXT,
    last_login TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE employees (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    department TEXT NOT NULL,
    phone_number TEXT,
    role TEXT NOT NULL DEFAULT 'Employee',
    is_active INTEGER NOT NULL DEFAULT 1,
    access_code TEXT,
    access_code_expires_at TEXT,
    last_login TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX idx_employees_email ON employees(email);

CREATE TABLE employee_credentials (
    employee_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);

CREATE INDEX idx_credentials_username ON employee_credentials(username);

CREATE TABLE tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    assigned_to TEXT NOT NULL,
    created_by TEXT NOT NULL,
    priority TEXT NOT NULL DEFAULT 'medium',
    status TEXT NOT NULL DEFAULT 'pending',
    due_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (assigned_to) REFERENCES employees(id)
);

CREATE INDEX idx_tasks_assigned ON tasks(assigned_to);
CREATE INDEX idx_tasks_creator ON tasks(created_by);

CREATE TABLE messages (
    id TEXT PRIMARY KEY,
    pair_key TEXT NOT NULL,
    from_user TEXT NOT NULL,
    to_user TEXT NOT NULL,
    body TEXT NOT NULL,
    msg_type TEXT NOT NULL DEFAULT 'text',
    timestamp INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_messages_pair ON messages(pair_key);
CREATE INDEX idx_messages_from ON messages(from_user);
CREATE INDEX idx_messages_to ON messages(to_user);
",
    )])
}
