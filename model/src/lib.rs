/*!

This library provides the data model of an operator scorecard run (its configuration, the declared
tests and their results, the aggregated report) and the client used to talk to the cluster.

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

pub use configuration::{PluginType, PullPolicy, RunConfig};
pub use csv::{ClusterServiceVersion, CrdDescription, CsvValidation, Descriptor};
pub use error::{Error, Result};
pub use gvk::{Gvk, ObjectRef};
pub use report::AggregatedReport;
pub use selector::{Requirement, Selector};
pub use test::{State, SuiteName, SuiteOutput, Test, TestResult};

pub mod clients;
mod configuration;
pub mod constants;
mod csv;
mod error;
mod gvk;
mod report;
mod selector;
mod test;
