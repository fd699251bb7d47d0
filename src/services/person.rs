//! Person management service.

use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::errors::{ReeveError, ReeveResult};
use crate::executor::RequestExecutor;
use crate::types::person::{EditPerson, NewPerson};
use crate::types::{ApiResponse, Person, PersonUpdate};

/// Create, list, edit and delete persons.
#[derive(Debug, Clone)]
pub struct PersonService {
    executor: Arc<RequestExecutor>,
}

impl PersonService {
    /// Creates a new person service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Creates a person.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        firstname: Option<&str>,
        lastname: Option<&str>,
    ) -> ReeveResult<ApiResponse<Person>> {
        let body = NewPerson {
            firstname,
            lastname,
        };
        self.executor.post("person.add", "Person", &body).await
    }

    /// Lists persons in the order the service returns them.
    #[instrument(skip(self))]
    pub async fn list(&self) -> ReeveResult<ApiResponse<Vec<Person>>> {
        self.executor.get("person.list", "Person", &[]).await
    }

    /// Lists one page of persons. Pages start at 1.
    #[instrument(skip(self))]
    pub async fn list_page(
        &self,
        page: u32,
        amount: u32,
    ) -> ReeveResult<ApiResponse<Vec<Person>>> {
        if page == 0 || amount == 0 {
            return Err(ReeveError::validation(
                "Page and amount must be greater than zero",
            ));
        }

        let query = [("Page", page.to_string()), ("Amount", amount.to_string())];
        self.executor.get("person.list", "Person", &query).await
    }

    /// Updates the set fields of a person.
    #[instrument(skip(self))]
    pub async fn edit(
        &self,
        person_id: i64,
        update: &PersonUpdate,
    ) -> ReeveResult<ApiResponse<Person>> {
        if update.is_empty() {
            return Err(ReeveError::validation("Person update has no fields set"));
        }

        let body = EditPerson {
            id: person_id,
            update,
        };
        self.executor
            .put("person.edit", &format!("Person/{person_id}"), &body)
            .await
    }

    /// Deletes a person. Deleting a missing person is a not-found error.
    #[instrument(skip(self))]
    pub async fn delete(&self, person_id: i64) -> ReeveResult<ApiResponse<Value>> {
        self.executor
            .delete("person.delete", &format!("Person/{person_id}"))
            .await
    }
}
