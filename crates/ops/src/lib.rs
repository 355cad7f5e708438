#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build operations for cmbuild
//!
//! Every operation is a free function over an [`OpsCtx`]. The context owns
//! the [`BuildService`] used to reach the remote service, so the same code
//! runs against HTTP in production and scripted services in tests.

mod apps;
mod artifacts;
mod builds;
mod context;
mod monitor;
mod process;
mod service;

pub use context::{OpsContextBuilder, OpsCtx};
pub use service::{BuildService, RemoteService};

pub use apps::{list_workflows, resolve_application};
pub use artifacts::{download_artifacts, DownloadReport, FailedArtifact, SavedArtifact};
pub use builds::{poll_build_status, submit_build};
pub use monitor::{await_completion, MonitorOptions};
pub use process::{run_full_process, RunReport, RunRequest};
