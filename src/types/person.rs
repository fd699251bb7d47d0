//! Person types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::option_timestamp;

/// A person enrolled in the Reeve system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Person ID.
    pub id: i64,

    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,

    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,

    /// Creation timestamp.
    #[serde(default, with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    #[serde(default, with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Person {
    /// Returns "first last", skipping missing parts.
    pub fn full_name(&self) -> String {
        [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Body of a person creation request.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct NewPerson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<&'a str>,
}

/// Partial update of a person. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonUpdate {
    /// New first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,

    /// New last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

impl PersonUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first name.
    pub fn firstname(mut self, firstname: impl Into<String>) -> Self {
        self.firstname = Some(firstname.into());
        self
    }

    /// Sets the last name.
    pub fn lastname(mut self, lastname: impl Into<String>) -> Self {
        self.lastname = Some(lastname.into());
        self
    }

    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.firstname.is_none() && self.lastname.is_none()
    }
}

/// Body of a person edit request: the ID plus the changed fields.
#[derive(Debug, Serialize)]
pub(crate) struct EditPerson<'a> {
    pub id: i64,
    #[serde(flatten)]
    pub update: &'a PersonUpdate,
}
