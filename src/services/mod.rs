//! Service implementations for the Reeve API.
//!
//! One service per resource: authentication, persons, faces and subject
//! comparison. All of them send through one shared [`RequestExecutor`].
//!
//! [`RequestExecutor`]: crate::executor::RequestExecutor

mod auth;
mod face;
mod person;
mod subject;

pub use auth::AuthService;
pub use face::FaceService;
pub use person::PersonService;
pub use subject::SubjectService;
