//! Data-access helpers over the SQLite connection.
//!
//! All functions are synchronous and expect to run inside
//! `tokio::task::spawn_blocking` with the connection lock held by the caller.
//! This is the single surface the REST handlers and the WS event router use;
//! neither writes SQL of its own.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::models::{
    CredentialsRow, EmployeeRow, MessageRow, MessageType, OwnerRow, TaskRow,
};
use crate::ws::rooms::chat_room_id;

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

// --- Owners ---

pub fn create_owner(conn: &Connection, phone_number: &str) -> rusqlite::Result<OwnerRow> {
    let id = Uuid::now_v7().to_string();
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO owners (id, phone_number, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![id, phone_number, now],
    )?;
    Ok(OwnerRow {
        id,
        phone_number: phone_number.to_string(),
        access_code: None,
        access_code_expires_at: None,
        last_login: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

fn map_owner(row: &rusqlite::Row<'_>) -> rusqlite::Result<OwnerRow> {
    Ok(OwnerRow {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        access_code: row.get(2)?,
        access_code_expires_at: row.get(3)?,
        last_login: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const OWNER_COLS: &str =
    "id, phone_number, access_code, access_code_expires_at, last_login, created_at, updated_at";

pub fn find_owner_by_phone(
    conn: &Connection,
    phone_number: &str,
) -> rusqlite::Result<Option<OwnerRow>> {
    conn.query_row(
        &format!("SELECT {OWNER_COLS} FROM owners WHERE phone_number = ?1"),
        rusqlite::params![phone_number],
        map_owner,
    )
    .optional()
}

pub fn find_owner_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<OwnerRow>> {
    conn.query_row(
        &format!("SELECT {OWNER_COLS} FROM owners WHERE id = ?1"),
        rusqlite::params![id],
        map_owner,
    )
    .optional()
}

/// Store a fresh access code for an owner, or clear it when `code` is None.
pub fn set_owner_access_code(
    conn: &Connection,
    owner_id: &str,
    code: Option<&str>,
    expires_at: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE owners SET access_code = ?2, access_code_expires_at = ?3, updated_at = ?4
         WHERE id = ?1",
        rusqlite::params![owner_id, code, expires_at, now_rfc3339()],
    )?;
    Ok(())
}

pub fn touch_owner_login(conn: &Connection, owner_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE owners SET last_login = ?2, updated_at = ?2 WHERE id = ?1",
        rusqlite::params![owner_id, now_rfc3339()],
    )?;
    Ok(())
}

// --- Employees ---

pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub created_by: String,
}

pub fn create_employee(conn: &Connection, new: &NewEmployee) -> rusqlite::Result<EmployeeRow> {
    let id = Uuid::now_v7().to_string();
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO employees (id, name, email, department, phone_number, role, is_active, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?8)",
        rusqlite::params![
            id,
            new.name,
            new.email,
            new.department,
            new.phone_number,
            new.role,
            new.created_by,
            now
        ],
    )?;
    Ok(EmployeeRow {
        id,
        name: new.name.clone(),
        email: new.email.clone(),
        department: new.department.clone(),
        phone_number: new.phone_number.clone(),
        role: new.role.clone(),
        is_active: true,
        access_code: None,
        access_code_expires_at: None,
        last_login: None,
        created_by: Some(new.created_by.clone()),
        created_at: now.clone(),
        updated_at: now,
    })
}

fn map_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmployeeRow> {
    Ok(EmployeeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        department: row.get(3)?,
        phone_number: row.get(4)?,
        role: row.get(5)?,
        is_active: row.get::<_, i64>(6)? != 0,
        access_code: row.get(7)?,
        access_code_expires_at: row.get(8)?,
        last_login: row.get(9)?,
        created_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

const EMPLOYEE_COLS: &str = "id, name, email, department, phone_number, role, is_active, \
     access_code, access_code_expires_at, last_login, created_by, created_at, updated_at";

pub fn find_employee_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<EmployeeRow>> {
    conn.query_row(
        &format!("SELECT {EMPLOYEE_COLS} FROM employees WHERE id = ?1"),
        rusqlite::params![id],
        map_employee,
    )
    .optional()
}

pub fn find_employee_by_email(
    conn: &Connection,
    email: &str,
) -> rusqlite::Result<Option<EmployeeRow>> {
    conn.query_row(
        &format!("SELECT {EMPLOYEE_COLS} FROM employees WHERE email = ?1"),
        rusqlite::params![email],
        map_employee,
    )
    .optional()
}

pub fn list_active_employees(conn: &Connection) -> rusqlite::Result<Vec<EmployeeRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EMPLOYEE_COLS} FROM employees WHERE is_active = 1 ORDER BY created_at"
    ))?;
    let rows = stmt.query_map([], map_employee)?;
    rows.collect()
}

/// Partial update: None fields keep their current value.
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<String>,
}

pub fn update_employee(
    conn: &Connection,
    id: &str,
    update: &EmployeeUpdate,
) -> rusqlite::Result<Option<EmployeeRow>> {
    conn.execute(
        "UPDATE employees SET
            name = COALESCE(?2, name),
            email = COALESCE(?3, email),
            department = COALESCE(?4, department),
            phone_number = COALESCE(?5, phone_number),
            role = COALESCE(?6, role),
            updated_at = ?7
         WHERE id = ?1",
        rusqlite::params![
            id,
            update.name,
            update.email,
            update.department,
            update.phone_number,
            update.role,
            now_rfc3339()
        ],
    )?;
    find_employee_by_id(conn, id)
}

pub fn set_employee_access_code(
    conn: &Connection,
    employee_id: &str,
    code: Option<&str>,
    expires_at: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE employees SET access_code = ?2, access_code_expires_at = ?3, updated_at = ?4
         WHERE id = ?1",
        rusqlite::params![employee_id, code, expires_at, now_rfc3339()],
    )?;
    Ok(())
}

pub fn touch_employee_login(conn: &Connection, employee_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE employees SET last_login = ?2, updated_at = ?2 WHERE id = ?1",
        rusqlite::params![employee_id, now_rfc3339()],
    )?;
    Ok(())
}

/// Delete is deactivation: the row survives so message history and task
/// references keep resolving.
pub fn deactivate_employee(conn: &Connection, employee_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE employees SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        rusqlite::params![employee_id, now_rfc3339()],
    )?;
    Ok(())
}

// --- Credentials ---

pub fn create_credentials(
    conn: &Connection,
    employee_id: &str,
    username: &str,
    password_hash: &str,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO employee_credentials (employee_id, username, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![employee_id, username, password_hash, now_rfc3339()],
    )?;
    Ok(())
}

fn map_credentials(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialsRow> {
    Ok(CredentialsRow {
        employee_id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn find_credentials_by_username(
    conn: &Connection,
    username: &str,
) -> rusqlite::Result<Option<CredentialsRow>> {
    conn.query_row(
        "SELECT employee_id, username, password_hash, created_at
         FROM employee_credentials WHERE username = ?1",
        rusqlite::params![username],
        map_credentials,
    )
    .optional()
}

pub fn find_credentials_by_employee(
    conn: &Connection,
    employee_id: &str,
) -> rusqlite::Result<Option<CredentialsRow>> {
    conn.query_row(
        "SELECT employee_id, username, password_hash, created_at
         FROM employee_credentials WHERE employee_id = ?1",
        rusqlite::params![employee_id],
        map_credentials,
    )
    .optional()
}

// --- Tasks ---

pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
}

pub fn create_task(conn: &Connection, new: &NewTask) -> rusqlite::Result<TaskRow> {
    let id = Uuid::now_v7().to_string();
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO tasks (id, title, description, assigned_to, created_by, priority, status, due_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        rusqlite::params![
            id,
            new.title,
            new.description,
            new.assigned_to,
            new.created_by,
            new.priority,
            new.status,
            new.due_date,
            now
        ],
    )?;
    Ok(TaskRow {
        id,
        title: new.title.clone(),
        description: new.description.clone(),
        assigned_to: new.assigned_to.clone(),
        created_by: new.created_by.clone(),
        priority: new.priority.clone(),
        status: new.status.clone(),
        due_date: new.due_date.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

fn map_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        assigned_to: row.get(3)?,
        created_by: row.get(4)?,
        priority: row.get(5)?,
        status: row.get(6)?,
        due_date: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const TASK_COLS: &str =
    "id, title, description, assigned_to, created_by, priority, status, due_date, created_at, updated_at";

pub fn find_task_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<TaskRow>> {
    conn.query_row(
        &format!("SELECT {TASK_COLS} FROM tasks WHERE id = ?1"),
        rusqlite::params![id],
        map_task,
    )
    .optional()
}

pub fn list_all_tasks(conn: &Connection) -> rusqlite::Result<Vec<TaskRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLS} FROM tasks ORDER BY created_at"))?;
    let rows = stmt.query_map([], map_task)?;
    rows.collect()
}

pub fn list_tasks_for_employee(
    conn: &Connection,
    employee_id: &str,
) -> rusqlite::Result<Vec<TaskRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLS} FROM tasks WHERE assigned_to = ?1 ORDER BY created_at"
    ))?;
    let rows = stmt.query_map(rusqlite::params![employee_id], map_task)?;
    rows.collect()
}

/// Partial update: None fields keep their current value.
#[derive(Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

pub fn update_task(
    conn: &Connection,
    id: &str,
    update: &TaskUpdate,
) -> rusqlite::Result<Option<TaskRow>> {
    conn.execute(
        "UPDATE tasks SET
            title = COALESCE(?2, title),
            description = COALESCE(?3, description),
            assigned_to = COALESCE(?4, assigned_to),
            priority = COALESCE(?5, priority),
            status = COALESCE(?6, status),
            due_date = COALESCE(?7, due_date),
            updated_at = ?8
         WHERE id = ?1",
        rusqlite::params![
            id,
            update.title,
            update.description,
            update.assigned_to,
            update.priority,
            update.status,
            update.due_date,
            now_rfc3339()
        ],
    )?;
    find_task_by_id(conn, id)
}

pub fn delete_task(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
    Ok(())
}

// --- Messages ---

/// Persist a chat message. The pair_key is the canonical chat channel id of
/// the two participants, so history retrieval is one indexed equality query.
pub fn create_message(
    conn: &Connection,
    from: &str,
    to: &str,
    body: &str,
    msg_type: MessageType,
) -> rusqlite::Result<MessageRow> {
    let id = Uuid::now_v7().to_string();
    let now = Utc::now();
    let timestamp = now.timestamp_millis();
    let created_at = now.to_rfc3339();
    let pair_key = chat_room_id(from, to);
    conn.execute(
        "INSERT INTO messages (id, pair_key, from_user, to_user, body, msg_type, timestamp, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            id,
            pair_key,
            from,
            to,
            body,
            msg_type.as_str(),
            timestamp,
            created_at
        ],
    )?;
    Ok(MessageRow {
        id,
        pair_key,
        from: from.to_string(),
        to: to.to_string(),
        participants: [from.to_string(), to.to_string()],
        message: body.to_string(),
        msg_type,
        timestamp,
        created_at,
    })
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    let from: String = row.get(2)?;
    let to: String = row.get(3)?;
    Ok(MessageRow {
        id: row.get(0)?,
        pair_key: row.get(1)?,
        participants: [from.clone(), to.clone()],
        from,
        to,
        message: row.get(4)?,
        msg_type: MessageType::parse(&row.get::<_, String>(5)?),
        timestamp: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const MESSAGE_COLS: &str =
    "id, pair_key, from_user, to_user, body, msg_type, timestamp, created_at";

pub fn find_message_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<MessageRow>> {
    conn.query_row(
        &format!("SELECT {MESSAGE_COLS} FROM messages WHERE id = ?1"),
        rusqlite::params![id],
        map_message,
    )
    .optional()
}

/// Last `limit` messages between two users, oldest first.
pub fn messages_between(
    conn: &Connection,
    user_a: &str,
    user_b: &str,
    limit: u32,
) -> rusqlite::Result<Vec<MessageRow>> {
    let pair_key = chat_room_id(user_a, user_b);
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM messages WHERE pair_key = ?1
         ORDER BY timestamp DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(rusqlite::params![pair_key, limit], map_message)?;
    let mut messages: Vec<MessageRow> = rows.collect::<Result<_, _>>()?;
    messages.reverse();
    Ok(messages)
}

/// All messages the user participates in, newest first.
pub fn messages_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM messages WHERE from_user = ?1 OR to_user = ?1
         ORDER BY timestamp DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id], map_message)?;
    rows.collect()
}

/// Case-insensitive substring search over the user's own conversations,
/// newest first.
pub fn search_messages(
    conn: &Connection,
    user_id: &str,
    query: &str,
) -> rusqlite::Result<Vec<MessageRow>> {
    let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM messages
         WHERE (from_user = ?1 OR to_user = ?1) AND body LIKE ?2 ESCAPE '\\'
         ORDER BY timestamp DESC"
    ))?;
    let rows = stmt.query_map(rusqlite::params![user_id, pattern], map_message)?;
    rows.collect()
}

/// Task counts by workflow status, optionally restricted to one assignee.
pub struct TaskCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
}

pub fn task_counts(conn: &Connection, assigned_to: Option<&str>) -> rusqlite::Result<TaskCounts> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'in-progress'), 0),
                COALESCE(SUM(status = 'completed'), 0)
         FROM tasks WHERE ?1 IS NULL OR assigned_to = ?1",
        rusqlite::params![assigned_to],
        |row| {
            Ok(TaskCounts {
                total: row.get(0)?,
                pending: row.get(1)?,
                in_progress: row.get(2)?,
                completed: row.get(3)?,
            })
        },
    )
}

pub fn count_active_employees(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM employees WHERE is_active = 1",
        [],
        |row| row.get(0),
    )
}

pub fn delete_message(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM messages WHERE id = ?1", rusqlite::params![id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::migrations().to_latest(&mut conn).unwrap();
        conn
    }

    #[test]
    fn owner_access_code_set_and_clear() {
        let conn = test_conn();
        let owner = create_owner(&conn, "+15550001111").unwrap();

        set_owner_access_code(&conn, &owner.id, Some("123456"), Some("2099-01-01T00:00:00Z"))
            .unwrap();
        let found = find_owner_by_phone(&conn, "+15550001111").unwrap().unwrap();
        assert_eq!(found.access_code.as_deref(), Some("123456"));

        set_owner_access_code(&conn, &owner.id, None, None).unwrap();
        let found = find_owner_by_id(&conn, &owner.id).unwrap().unwrap();
        assert_eq!(found.access_code, None);
    }

    #[test]
    fn deactivated_employee_leaves_active_list() {
        let conn = test_conn();
        let emp = create_employee(
            &conn,
            &NewEmployee {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                department: "Kitchen".into(),
                phone_number: None,
                role: "Chef".into(),
                created_by: "owner-1".into(),
            },
        )
        .unwrap();

        assert_eq!(list_active_employees(&conn).unwrap().len(), 1);
        deactivate_employee(&conn, &emp.id).unwrap();
        assert!(list_active_employees(&conn).unwrap().is_empty());
        // Row still resolvable by id
        let found = find_employee_by_id(&conn, &emp.id).unwrap().unwrap();
        assert!(!found.is_active);
    }

    #[test]
    fn conversation_query_is_symmetric() {
        let conn = test_conn();
        create_message(&conn, "alice", "bob", "hi", MessageType::Text).unwrap();
        create_message(&conn, "bob", "alice", "hello", MessageType::Text).unwrap();
        create_message(&conn, "alice", "carol", "other", MessageType::Text).unwrap();

        let ab = messages_between(&conn, "alice", "bob", 50).unwrap();
        let ba = messages_between(&conn, "bob", "alice", 50).unwrap();
        assert_eq!(ab.len(), 2);
        assert_eq!(ab.len(), ba.len());
        assert_eq!(ab[0].message, "hi"); // oldest first
        assert_eq!(ab[0].participants, ["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn task_partial_update_keeps_unset_fields() {
        let conn = test_conn();
        let task = create_task(
            &conn,
            &NewTask {
                title: "Clean station".into(),
                description: "Before close".into(),
                assigned_to: "emp-1".into(),
                created_by: "owner-1".into(),
                priority: "medium".into(),
                status: "pending".into(),
                due_date: None,
            },
        )
        .unwrap();

        let updated = update_task(
            &conn,
            &task.id,
            &TaskUpdate {
                status: Some("in-progress".into()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(updated.status, "in-progress");
        assert_eq!(updated.title, "Clean station");
        assert_eq!(updated.priority, "medium");
    }
}
