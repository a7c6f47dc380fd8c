//! Owner-only employee management. Every mutation is handed to the event
//! router after commit, so connected owner dashboards update live.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{jwt, middleware::OwnerClaims};
use crate::db::{self, models::EmployeeRow, store};
use crate::notify::email;
use crate::state::AppState;
use crate::ws::router::{self, DomainEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// POST /api/owner/employees
pub async fn create_employee(
    State(state): State<AppState>,
    OwnerClaims(claims): OwnerClaims,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let name = req.name.trim().to_string();
    let addr = req.email.trim().to_lowercase();
    let department = req.department.trim().to_string();
    if name.is_empty() || department.is_empty() || !email::is_valid_email(&addr) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let new = store::NewEmployee {
        name: name.clone(),
        email: addr.clone(),
        department,
        phone_number: req.phone_number,
        role: req.role.unwrap_or_else(|| "Employee".to_string()),
        created_by: claims.sub.clone(),
    };

    let employee = db::with_conn(&state.db, move |conn| {
        if store::find_employee_by_email(conn, &new.email)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some()
        {
            return Err(StatusCode::CONFLICT);
        }
        store::create_employee(conn, &new).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    let setup_token = jwt::issue_setup_token(&state.jwt_secret, &employee.id, &employee.email)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    email::send_welcome(
        &employee.email,
        &employee.name,
        &format!("{}/setup-account?token={setup_token}", state.frontend_url),
    );

    router::route(
        &state.connections,
        DomainEvent::EmployeeAdded(employee.clone()),
    );

    tracing::info!(employee_id = %employee.id, created_by = %claims.sub, "Employee created");

    let mut body = json!({ "success": true, "data": employee });
    if state.dev_mode {
        body["setupToken"] = json!(setup_token);
    }
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/owner/employees
pub async fn list_employees(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
) -> Result<Json<Value>, StatusCode> {
    let employees = db::with_conn(&state.db, |conn| {
        store::list_active_employees(conn).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": employees })))
}

/// GET /api/owner/employees/{id}
pub async fn get_employee(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let employee = find_employee(&state, id).await?;
    Ok(Json(json!({ "success": true, "data": employee })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<String>,
}

/// PUT /api/owner/employees/{id}
pub async fn update_employee(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<Json<Value>, StatusCode> {
    if let Some(addr) = &req.email {
        if !email::is_valid_email(addr.trim()) {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    let update = store::EmployeeUpdate {
        name: req.name,
        email: req.email.map(|e| e.trim().to_lowercase()),
        department: req.department,
        phone_number: req.phone_number,
        role: req.role,
    };

    let employee = db::with_conn(&state.db, move |conn| {
        store::update_employee(conn, &id, &update)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await?;

    router::route(
        &state.connections,
        DomainEvent::EmployeeUpdated(employee.clone()),
    );

    Ok(Json(json!({ "success": true, "data": employee })))
}

/// DELETE /api/owner/employees/{id}
/// Deactivates rather than deletes, so history keeps resolving.
pub async fn delete_employee(
    State(state): State<AppState>,
    OwnerClaims(claims): OwnerClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let employee_id = id.clone();
    db::with_conn(&state.db, move |conn| {
        store::find_employee_by_id(conn, &id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;
        store::deactivate_employee(conn, &id).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    router::route(
        &state.connections,
        DomainEvent::EmployeeDeleted {
            employee_id: employee_id.clone(),
        },
    );

    tracing::info!(employee_id = %employee_id, deleted_by = %claims.sub, "Employee deactivated");

    Ok(Json(json!({ "success": true, "message": "Employee deactivated" })))
}

/// GET /api/owner/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    OwnerClaims(_): OwnerClaims,
) -> Result<Json<Value>, StatusCode> {
    let (employee_count, tasks) = db::with_conn(&state.db, |conn| {
        let employees =
            store::count_active_employees(conn).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let tasks =
            store::task_counts(conn, None).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok((employees, tasks))
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "employees": employee_count,
            "onlineUsers": state.connections.online_count(),
            "tasks": {
                "total": tasks.total,
                "pending": tasks.pending,
                "inProgress": tasks.in_progress,
                "completed": tasks.completed,
            },
        },
    })))
}

async fn find_employee(state: &AppState, id: String) -> Result<EmployeeRow, StatusCode> {
    db::with_conn(&state.db, move |conn| {
        store::find_employee_by_id(conn, &id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)
    })
    .await
}
