//! Tutor entity.
//!
//! Maps to the `tutors` table and is the JSON body of every `/api/tutors` route.

use serde::{Deserialize, Serialize};

/// Entity name used in alert headers and error bodies.
pub const ENTITY_NAME: &str = "tutor";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutor {
    /// `None` until the tutor has been persisted.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl Tutor {
    /// Creates an unsaved tutor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: None,
            subject: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}
