//! The acting staff member.
//!
//! There is no ambient session: forms, editors and pages receive the [`Actor`]
//! explicitly.

use serde::{Deserialize, Serialize};

/// Identity of the staff member performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable uid; stored as the owner of records this actor creates
    pub uid: String,
    /// Name shown in notifications, if known
    pub display_name: Option<String>,
}

impl Actor {
    /// Actor known only by uid.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Attaches a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name, falling back to the uid.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.uid)
    }

    /// Whether this actor owns a record with the given owner uid.
    #[must_use]
    pub fn owns(&self, owner_uid: &str) -> bool {
        !self.uid.is_empty() && self.uid == owner_uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_falls_back_to_uid() {
        assert_eq!(Actor::new("u-1").label(), "u-1");
        assert_eq!(Actor::new("u-1").with_name("Hina").label(), "Hina");
    }

    #[test]
    fn test_blank_uid_owns_nothing() {
        assert!(!Actor::new("").owns(""));
        assert!(Actor::new("u-1").owns("u-1"));
        assert!(!Actor::new("u-1").owns("u-2"));
    }
}
