//! Reeve Client Library
//!
//! An async Rust client for the Reeve facial recognition REST API. Covers
//! authentication, person management, face enrollment, recognition and
//! verification, and one-to-one subject comparison.
//!
//! # Features
//!
//! - **Authentication**: Static API key or username/password with automatic login
//! - **Persons**: Create, list, page, edit and delete enrolled persons
//! - **Faces**: Upload, list, delete, recognize and verify faces
//! - **Subjects**: Compare two faces without enrolling anyone
//! - **Observability**: Tracing spans, metrics, structured logging
//! - **Async/Await**: Built on Tokio with a shared connection pool
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reeve_client::{FaceImage, ReeveClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ReeveClient::builder()
//!         .api_url("https://reeve.example.com/api")
//!         .username("admin")
//!         .password("secret")
//!         .build()?;
//!
//!     let session = client.open().await?;
//!
//!     let image = FaceImage::jpeg(std::fs::read("visitor.jpg")?);
//!     let response = session.face().recognize(image).await?;
//!     match response.result() {
//!         Some(hit) => println!("Recognized {:?}", hit.name),
//!         None => println!("No match"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! ```rust,no_run
//! use reeve_client::{ErrorKind, ReeveClient};
//!
//! # async fn run(client: &ReeveClient) {
//! match client.person().delete(42).await {
//!     Ok(_) => println!("Deleted"),
//!     Err(err) if err.kind() == ErrorKind::NotFound => println!("Already gone"),
//!     Err(err) => eprintln!("Delete failed: {err}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod observability;
pub mod services;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use auth::{AuthProvider, SessionToken, TokenManager};
pub use client::{ReeveClient, ReeveClientBuilder, ReeveSession};
pub use config::{Credentials, ReeveConfig, ReeveConfigBuilder};
pub use errors::{ApiErrorBody, ErrorKind, ReeveError, ReeveResult};
pub use observability::{LogConfig, LogFormat, LogLevel, MetricsCollector, RequestMetrics};
pub use types::{
    ApiResponse, ChangePasswordResponse, Face, FaceAttributes, FaceImage, IdentifyResult,
    LoginResponse, Person, PersonUpdate, RegisterResponse, SubjectVerificationResult, UserInfo,
    VerificationResult,
};
