//! Email delivery for employee access codes and welcome mail.
//!
//! Runs in simulation mode: messages are logged instead of sent. The
//! handlers only ever call these fire-and-forget, so swapping in a real
//! provider changes nothing upstream.

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Deliver a login access code to an employee's address.
pub fn send_access_code(email: &str, code: &str) {
    tracing::info!(
        email = %email,
        code = %code,
        "Email simulation: access code delivery"
    );
}

/// Welcome mail with the account-setup link sent when an owner creates an
/// employee.
pub fn send_welcome(email: &str, name: &str, setup_url: &str) {
    tracing::info!(
        email = %email,
        name = %name,
        setup_url = %setup_url,
        "Email simulation: welcome mail"
    );
}
