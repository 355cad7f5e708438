#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for cmbuild
//!
//! Wire and domain types for the remote build service: applications,
//! workflows, builds and their artifacts. Field names follow the remote
//! API's JSON (`_id`, `appName`, `artefacts`, ...).

pub mod app;
pub mod build;

pub use app::{find_application, Application, ApplicationDetail, ApplicationList, Workflow};
pub use build::{Artifact, Build, BuildCreated, BuildRequest, BuildStatus};

/// Identifier of an application as assigned by the build service
pub type ApplicationId = String;

/// Identifier of a workflow inside an application's configuration
pub type WorkflowId = String;

/// Identifier returned when a build is submitted
pub type BuildId = String;
