//! Employee self-service: profile, own tasks, dashboard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::EmployeeClaims;
use crate::db::{self, models::TaskStatus, store};
use crate::state::AppState;
use crate::ws::router::{self, DomainEvent};

/// GET /api/employee/profile
pub async fn get_profile(
    State(state): State<AppState>,
    EmployeeClaims(claims): EmployeeClaims,
) -> Result<Json<Value>, StatusCode> {
    let id = claims.sub;
    let employee = db::with_conn(&state.db, move |conn| {
        store::find_employee_by_id(conn, &id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": employee })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

/// PUT /api/employee/profile
/// Employees may change their own name and phone number, nothing else.
pub async fn update_profile(
    State(state): State<AppState>,
    EmployeeClaims(claims): EmployeeClaims,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, StatusCode> {
    let update = store::EmployeeUpdate {
        name: req.name,
        email: None,
        department: None,
        phone_number: req.phone_number,
        role: None,
    };

    let id = claims.sub;
    let employee = db::with_conn(&state.db, move |conn| {
        store::update_employee(conn, &id, &update)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": employee })))
}

/// GET /api/employee/tasks
pub async fn my_tasks(
    State(state): State<AppState>,
    EmployeeClaims(claims): EmployeeClaims,
) -> Result<Json<Value>, StatusCode> {
    let id = claims.sub;
    let tasks = db::with_conn(&state.db, move |conn| {
        store::list_tasks_for_employee(conn, &id).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": tasks })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// PUT /api/employee/tasks/{id}/status
/// The one task mutation an employee may make, and only on their own task.
pub async fn update_task_status(
    State(state): State<AppState>,
    EmployeeClaims(claims): EmployeeClaims,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, StatusCode> {
    let employee_id = claims.sub;
    let status = req.status.as_str().to_string();

    let task = db::with_conn(&state.db, move |conn| {
        let task = store::find_task_by_id(conn, &task_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;
        if task.assigned_to != employee_id {
            return Err(StatusCode::FORBIDDEN);
        }

        store::update_task(
            conn,
            &task_id,
            &store::TaskUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    router::route(
        &state.connections,
        DomainEvent::TaskStatusUpdated(task.clone()),
    );

    Ok(Json(json!({ "success": true, "data": task })))
}

/// GET /api/employee/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    EmployeeClaims(claims): EmployeeClaims,
) -> Result<Json<Value>, StatusCode> {
    let id = claims.sub;
    let counts = db::with_conn(&state.db, move |conn| {
        store::task_counts(conn, Some(&id)).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "tasks": {
                "total": counts.total,
                "pending": counts.pending,
                "inProgress": counts.in_progress,
                "completed": counts.completed,
            },
        },
    })))
}
