//! Owner login: SMS access code request and validation.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{access_code, jwt, middleware::Role};
use crate::db::{self, store};
use crate::notify::sms;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessCodeRequest {
    pub phone_number: String,
}

/// POST /api/owner/create-access-code
/// First login creates the owner record; repeat requests replace any
/// previous unexpired code.
pub async fn create_access_code(
    State(state): State<AppState>,
    Json(req): Json<CreateAccessCodeRequest>,
) -> Result<Json<Value>, StatusCode> {
    let phone = req.phone_number.trim().to_string();
    if !sms::is_valid_phone_number(&phone) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let code = access_code::generate_access_code();
    let expires_at = access_code::expiry_timestamp();

    let stored_code = code.clone();
    let stored_phone = phone.clone();
    db::with_conn(&state.db, move |conn| {
        let owner = match store::find_owner_by_phone(conn, &stored_phone)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        {
            Some(owner) => owner,
            None => store::create_owner(conn, &stored_phone)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
        };
        store::set_owner_access_code(conn, &owner.id, Some(&stored_code), Some(&expires_at))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(())
    })
    .await?;

    sms::send_access_code(&phone, &code);

    let mut body = json!({
        "success": true,
        "message": "Access code sent",
    });
    if state.dev_mode {
        body["accessCode"] = json!(code);
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccessCodeRequest {
    pub phone_number: String,
    pub access_code: String,
}

/// POST /api/owner/validate-access-code
/// A matching, unexpired code is consumed and exchanged for a bearer token.
pub async fn validate_access_code(
    State(state): State<AppState>,
    Json(req): Json<ValidateAccessCodeRequest>,
) -> Result<Json<Value>, StatusCode> {
    let phone = req.phone_number.trim().to_string();
    let submitted = req.access_code.trim().to_string();
    if phone.is_empty() || submitted.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let owner = db::with_conn(&state.db, move |conn| {
        let owner = store::find_owner_by_phone(conn, &phone)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;

        let matches = owner.access_code.as_deref() == Some(submitted.as_str());
        if !matches || access_code::is_expired(owner.access_code_expires_at.as_deref()) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        // One-time use
        store::set_owner_access_code(conn, &owner.id, None, None)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        store::touch_owner_login(conn, &owner.id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(owner)
    })
    .await?;

    let token = jwt::issue_access_token(&state.jwt_secret, &owner.id, Role::Owner)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(owner_id = %owner.id, "Owner logged in");

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": {
                "id": owner.id,
                "phoneNumber": owner.phone_number,
                "role": "owner",
            },
        },
    })))
}
