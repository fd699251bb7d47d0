//! Type definitions for the Reeve API.
//!
//! Every model here is only ever received as the `result` of an
//! [`ApiResponse`] envelope.

pub mod auth;
pub mod envelope;
pub mod face;
pub mod image;
pub mod person;
pub(crate) mod serde_helpers;
pub mod subject;

pub use auth::{ChangePasswordResponse, LoginResponse, RegisterResponse, UserInfo};
pub use envelope::ApiResponse;
pub use face::{Face, FaceAttributes, IdentifyResult, VerificationResult};
pub use image::FaceImage;
pub use person::{Person, PersonUpdate};
pub use subject::SubjectVerificationResult;
