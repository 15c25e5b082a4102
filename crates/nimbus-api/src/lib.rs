//! # nimbus-api
//!
//! Typed client for the Nimbus cloud control-plane REST API.
//!
//! The control plane is asynchronous: mutating calls (create, delete)
//! return one or more *task* identifiers instead of the finished resource.
//! Callers poll the task endpoint until the task reaches a terminal state,
//! then fetch the produced resource by the ID recorded in the task's
//! metadata. This crate holds the pieces both sides of that protocol need:
//!
//! - [`client::ApiClient`]: authenticated HTTP client with the
//!   `/{version}/{service}/{project}/{region}` path convention
//! - [`tasks`]: the task model ([`TaskId`], [`TaskState`], [`TaskInfo`])
//! - [`instances`]: instance resource types, request options, and calls
//! - [`validation`]: field-level request validation with full error
//!   collection
//!
//! ```text
//! ┌────────────┐   REST (JSON)    ┌──────────────────┐
//! │ nimbus-api │◄────────────────►│  control plane   │
//! └────────────┘                  └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod instances;
pub mod tasks;
pub mod validation;

pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, ApiResult};
pub use tasks::{TaskId, TaskInfo, TaskList, TaskState};
pub use validation::{ValidationBuilder, ValidationError, ValidationErrorKind, ValidationErrors};
