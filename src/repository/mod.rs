//! Storage access for users and tasks.
//!
//! Every function takes an explicit `&mut PgConnection`. Handlers acquire one pooled
//! connection per request, and it goes back to the pool when dropped, whichever way
//! the handler returns.

pub mod tasks;
pub mod users;

/// Normalises an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
