//! Task CRUD. Owners have the full surface; employees read their own tasks
//! here and mutate status through their own endpoint. Every mutation feeds
//! the event router so assignee and creator see the change live.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::{Claims, OwnerClaims, Role};
use crate::db::{
    self,
    models::{TaskPriority, TaskStatus},
    store,
};
use crate::state::AppState;
use crate::ws::router::{self, DomainEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<String>,
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    OwnerClaims(claims): OwnerClaims,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let title = req.title.trim().to_string();
    if title.is_empty() || req.assigned_to.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let new = store::NewTask {
        title,
        description: req.description,
        assigned_to: req.assigned_to.trim().to_string(),
        created_by: claims.sub.clone(),
        priority: req.priority.unwrap_or(TaskPriority::Medium).as_str().to_string(),
        status: TaskStatus::Pending.as_str().to_string(),
        due_date: req.due_date,
    };

    let task = db::with_conn(&state.db, move |conn| {
        // The assignee must be a live employee record.
        store::find_employee_by_id(conn, &new.assigned_to)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .filter(|e| e.is_active)
            .ok_or(StatusCode::BAD_REQUEST)?;
        store::create_task(conn, &new).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    router::route(&state.connections, DomainEvent::TaskCreated(task.clone()));

    tracing::info!(task_id = %task.id, assigned_to = %task.assigned_to, "Task created");

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": task }))))
}

/// GET /api/tasks
/// Owners see everything; employees see their own assignments.
pub async fn list_tasks(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, StatusCode> {
    let tasks = db::with_conn(&state.db, move |conn| {
        match claims.role {
            Role::Owner => store::list_all_tasks(conn),
            Role::Employee => store::list_tasks_for_employee(conn, &claims.sub),
        }
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": tasks })))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let task = db::with_conn(&state.db, move |conn| {
        let task = store::find_task_by_id(conn, &id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;
        // Employees may only read tasks they participate in.
        if claims.role == Role::Employee
            && task.assigned_to != claims.sub
            && task.created_by != claims.sub
        {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(task)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": task })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<String>,
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Value>, StatusCode> {
    let status_only = req.status.is_some()
        && req.title.is_none()
        && req.description.is_none()
        && req.assigned_to.is_none()
        && req.priority.is_none()
        && req.due_date.is_none();

    let update = store::TaskUpdate {
        title: req.title,
        description: req.description,
        assigned_to: req.assigned_to,
        priority: req.priority.map(|p| p.as_str().to_string()),
        status: req.status.map(|s| s.as_str().to_string()),
        due_date: req.due_date,
    };

    let task = db::with_conn(&state.db, move |conn| {
        if let Some(assignee) = &update.assigned_to {
            store::find_employee_by_id(conn, assignee)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
                .filter(|e| e.is_active)
                .ok_or(StatusCode::BAD_REQUEST)?;
        }
        store::update_task(conn, &id, &update)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    let event = if status_only {
        DomainEvent::TaskStatusUpdated(task.clone())
    } else {
        DomainEvent::TaskUpdated(task.clone())
    };
    router::route(&state.connections, event);

    Ok(Json(json!({ "success": true, "data": task })))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    OwnerClaims(claims): OwnerClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let task = db::with_conn(&state.db, move |conn| {
        let task = store::find_task_by_id(conn, &id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;
        store::delete_task(conn, &id).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(task)
    })
    .await?;

    router::route(
        &state.connections,
        DomainEvent::TaskDeleted {
            task_id: task.id.clone(),
            assigned_to: task.assigned_to,
            created_by: task.created_by,
        },
    );

    tracing::info!(task_id = %task.id, deleted_by = %claims.sub, "Task deleted");

    Ok(Json(json!({ "success": true, "message": "Task deleted" })))
}

/// GET /api/tasks/employee/{employeeId}
pub async fn tasks_for_employee(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
    Path(employee_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let tasks = db::with_conn(&state.db, move |conn| {
        store::list_tasks_for_employee(conn, &employee_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": tasks })))
}
