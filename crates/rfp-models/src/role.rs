//! Actor roles.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Role string stored on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates and owns RFPs, reviews responses.
    Buyer,
    /// Browses published RFPs and submits responses.
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Supplier => "supplier",
        }
    }

    /// Parse from the stored role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Some(Role::Buyer),
            "supplier" => Some(Role::Supplier),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated caller, passed explicitly into every guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn buyer(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Buyer)
    }

    pub fn supplier(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Supplier)
    }

    pub fn is_buyer(&self) -> bool {
        self.role == Role::Buyer
    }

    pub fn is_supplier(&self) -> bool {
        self.role == Role::Supplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("buyer"), Some(Role::Buyer));
        assert_eq!(Role::parse(" Supplier "), Some(Role::Supplier));
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Supplier).unwrap();
        assert_eq!(json, "\"supplier\"");
    }

    #[test]
    fn test_actor_role_checks() {
        let actor = Actor::supplier("s-1");
        assert!(actor.is_supplier());
        assert!(!actor.is_buyer());
        assert!(Actor::buyer("b-1").is_buyer());
    }
}
