/*!

The scorecard run: creating an operator's resources and CRs in a cluster, waiting for the operator
to react, running the Basic or OLM suite against each CR and removing everything it created.

The cluster is only reached through [`model::clients::ControlPlane`], so a run can be driven
against a fake control plane in tests.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use apply::{apply, inject_proxy};
pub use cleanup::{CleanupAction, CleanupRegistry};
pub use context::{RunContext, Timing};
pub use duplicates::check_duplicates;
pub use error::{Error, Result};
pub use run_log::RunLog;
pub use runner::{list, Scorecard};
pub use wait::{has_status, wait_for_status, STATUS_POLL_INTERVAL};

mod apply;
mod cleanup;
mod context;
pub mod csv;
mod duplicates;
mod error;
pub mod manifests;
mod run_log;
mod runner;
pub mod suites;
mod wait;
