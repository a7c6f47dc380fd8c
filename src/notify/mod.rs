//! Outbound notification collaborators. Fire-and-forget: a delivery failure
//! is logged and never fails the request that triggered it.

pub mod email;
pub mod sms;
