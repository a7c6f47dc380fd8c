//! SMS delivery for owner access codes.
//!
//! Runs in simulation mode: the message is logged instead of sent, which is
//! what development and test deployments need. A provider integration slots
//! in behind `send_access_code` without touching callers.

/// E.164-ish check: optional +, 10 to 15 digits.
pub fn is_valid_phone_number(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Deliver a login access code to an owner's phone.
pub fn send_access_code(phone_number: &str, code: &str) {
    tracing::info!(
        phone_number = %phone_number,
        code = %code,
        "SMS simulation: access code delivery"
    );
}
