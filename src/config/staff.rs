//! Acting staff member, loaded from environment variables.
//!
//! `DESK_STAFF_UID` identifies the staff member; `DESK_STAFF_NAME` is an
//! optional display name used in notifications.

use crate::core::session::Actor;
use crate::errors::Result;

/// Builds the acting staff member from the environment.
///
/// # Errors
/// Returns an error if `DESK_STAFF_UID` is not set.
pub fn current_actor() -> Result<Actor> {
    let uid = std::env::var("DESK_STAFF_UID")?;
    Ok(actor_from(uid, std::env::var("DESK_STAFF_NAME").ok()))
}

fn actor_from(uid: String, name: Option<String>) -> Actor {
    let actor = Actor::new(uid.trim());
    match name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => actor.with_name(name),
        _ => actor,
    }
}
