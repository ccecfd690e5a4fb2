//! User profile models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::role::{Actor, Role};

/// Profile record holding the user's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    pub user_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            display_name: None,
            company: None,
            email: None,
            created_at: now,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id.clone(), self.role)
    }
}
