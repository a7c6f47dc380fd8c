//! Employee login flows: email access code, one-time account setup, and
//! username/password login.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{access_code, jwt, middleware::Role, password};
use crate::db::{self, store};
use crate::notify::email;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginEmailRequest {
    pub email: String,
}

/// POST /api/employee/login-email
/// Sends a fresh access code to a known, active employee address.
pub async fn login_email(
    State(state): State<AppState>,
    Json(req): Json<LoginEmailRequest>,
) -> Result<Json<Value>, StatusCode> {
    let addr = req.email.trim().to_lowercase();
    if !email::is_valid_email(&addr) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let code = access_code::generate_access_code();
    let expires_at = access_code::expiry_timestamp();

    let stored_code = code.clone();
    let lookup_addr = addr.clone();
    db::with_conn(&state.db, move |conn| {
        let employee = store::find_employee_by_email(conn, &lookup_addr)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .filter(|e| e.is_active)
            .ok_or(StatusCode::NOT_FOUND)?;
        store::set_employee_access_code(conn, &employee.id, Some(&stored_code), Some(&expires_at))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    email::send_access_code(&addr, &code);

    let mut body = json!({ "success": true, "message": "Access code sent" });
    if state.dev_mode {
        body["accessCode"] = json!(code);
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessCodeRequest {
    pub email: String,
    pub access_code: String,
}

/// POST /api/employee/validate-access-code
/// Consumes the code. An employee with credentials gets an access token;
/// one without gets a setup token and `needsSetup: true`.
pub async fn validate_access_code(
    State(state): State<AppState>,
    Json(req): Json<ValidateAccessCodeRequest>,
) -> Result<Json<Value>, StatusCode> {
    let addr = req.email.trim().to_lowercase();
    let submitted = req.access_code.trim().to_string();
    if addr.is_empty() || submitted.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let (employee, has_credentials) = db::with_conn(&state.db, move |conn| {
        let employee = store::find_employee_by_email(conn, &addr)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .filter(|e| e.is_active)
            .ok_or(StatusCode::NOT_FOUND)?;

        let matches = employee.access_code.as_deref() == Some(submitted.as_str());
        if !matches || access_code::is_expired(employee.access_code_expires_at.as_deref()) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        store::set_employee_access_code(conn, &employee.id, None, None)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        let has_credentials = store::find_credentials_by_employee(conn, &employee.id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some();
        Ok((employee, has_credentials))
    })
    .await?;

    if has_credentials {
        let token = jwt::issue_access_token(&state.jwt_secret, &employee.id, Role::Employee)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        db_touch_login(&state, employee.id.clone()).await?;

        Ok(Json(json!({
            "success": true,
            "data": {
                "needsSetup": false,
                "token": token,
                "user": employee_payload(&employee),
            },
        })))
    } else {
        let setup_token = jwt::issue_setup_token(&state.jwt_secret, &employee.id, &employee.email)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok(Json(json!({
            "success": true,
            "data": {
                "needsSetup": true,
                "setupToken": setup_token,
            },
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupAccountRequest {
    pub setup_token: String,
    pub username: String,
    pub password: String,
}

/// POST /api/employee/setup-account
/// One-shot: once credentials exist, the setup token is useless.
pub async fn setup_account(
    State(state): State<AppState>,
    Json(req): Json<SetupAccountRequest>,
) -> Result<Json<Value>, StatusCode> {
    let claims = jwt::validate_setup_token(&state.jwt_secret, &req.setup_token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let username = req.username.trim().to_string();
    let username_errors = password::validate_username(&username);
    let password_errors = password::validate_password(&req.password);
    if !username_errors.is_empty() || !password_errors.is_empty() {
        let errors: Vec<String> = username_errors.into_iter().chain(password_errors).collect();
        tracing::debug!(employee_id = %claims.sub, "Account setup rejected by validation");
        return Ok(Json(json!({ "success": false, "errors": errors })));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let employee_id = claims.sub.clone();
    let stored_username = username.clone();
    let employee = db::with_conn(&state.db, move |conn| {
        let employee = store::find_employee_by_id(conn, &employee_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .filter(|e| e.is_active)
            .ok_or(StatusCode::NOT_FOUND)?;

        if store::find_credentials_by_employee(conn, &employee.id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some()
        {
            return Err(StatusCode::CONFLICT);
        }
        if store::find_credentials_by_username(conn, &stored_username)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some()
        {
            return Err(StatusCode::CONFLICT);
        }

        store::create_credentials(conn, &employee.id, &stored_username, &hash)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        store::touch_employee_login(conn, &employee.id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(employee)
    })
    .await?;

    let token = jwt::issue_access_token(&state.jwt_secret, &employee.id, Role::Employee)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(employee_id = %employee.id, username = %username, "Employee account set up");

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": employee_payload(&employee),
        },
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/employee/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, StatusCode> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let password_input = req.password;
    let employee = db::with_conn(&state.db, move |conn| {
        let creds = store::find_credentials_by_username(conn, &username)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // bcrypt on the blocking pool alongside the lookup
        if !crate::auth::password::verify_password(&password_input, &creds.password_hash) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let employee = store::find_employee_by_id(conn, &creds.employee_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;
        if !employee.is_active {
            return Err(StatusCode::FORBIDDEN);
        }

        store::touch_employee_login(conn, &employee.id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(employee)
    })
    .await?;

    let token = jwt::issue_access_token(&state.jwt_secret, &employee.id, Role::Employee)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(employee_id = %employee.id, "Employee logged in");

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": employee_payload(&employee),
        },
    })))
}

fn employee_payload(employee: &crate::db::models::EmployeeRow) -> Value {
    json!({
        "id": employee.id,
        "name": employee.name,
        "email": employee.email,
        "department": employee.department,
        "role": "employee",
    })
}

async fn db_touch_login(state: &AppState, employee_id: String) -> Result<(), StatusCode> {
    db::with_conn(&state.db, move |conn| {
        store::touch_employee_login(conn, &employee_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
}
