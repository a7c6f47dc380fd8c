//! One-time 6-digit access codes for owner (SMS) and employee (email) login.
//!
//! Codes live in the owner/employee row alongside an RFC 3339 expiry and are
//! cleared on successful validation (single use).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Access codes expire 10 minutes after issue.
const ACCESS_CODE_TTL_MINUTES: i64 = 10;

/// Generate a random 6-digit access code.
pub fn generate_access_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..=999_999);
    code.to_string()
}

/// Expiry timestamp for a code issued now, RFC 3339.
pub fn expiry_timestamp() -> String {
    (Utc::now() + Duration::minutes(ACCESS_CODE_TTL_MINUTES)).to_rfc3339()
}

/// Whether a stored expiry has passed. Unparseable or missing expiry counts
/// as expired, so a corrupt row can never be used to log in.
pub fn is_expired(expires_at: Option<&str>) -> bool {
    match expires_at.and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
        Some(expiry) => Utc::now() > expiry,
        None => true,
    }
}
