use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", source))]
    Config { source: model::Error },

    #[snafu(display("Invalid configuration: {}", reason))]
    InvalidConfig { reason: String },

    #[snafu(display("Unable to read file '{}': {}", path.display(), source))]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to decode '{}': {}", path.display(), source))]
    Decode {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Unable to decode object in '{}': {}", path.display(), source))]
    DecodeObject {
        path: PathBuf,
        source: model::Error,
    },

    #[snafu(display("No objects found in '{}'", path.display()))]
    EmptyManifest { path: PathBuf },

    #[snafu(display(
        "metadata.annotations['alm-examples'] in CSV {} incorrectly formatted: {}",
        csv,
        source
    ))]
    AlmExamples {
        csv: String,
        source: serde_json::Error,
    },

    #[snafu(display("Error validating ClusterServiceVersion '{}': {}", path.display(), reason))]
    CsvValidation { path: PathBuf, reason: String },

    #[snafu(display("Unable to write temporary manifest: {}", source))]
    TempFile { source: std::io::Error },

    #[snafu(display("Unable to serialize example CR to YAML: {}", source))]
    SerializeCr { source: serde_yaml::Error },

    #[snafu(display("Unable to create {}: {}", what, source))]
    Create {
        what: String,
        source: model::clients::Error,
    },

    #[snafu(display("Unable to get {}: {}", what, source))]
    Get {
        what: String,
        source: model::clients::Error,
    },

    #[snafu(display("Unable to delete {}: {}", what, source))]
    Delete {
        what: String,
        source: model::clients::Error,
    },

    #[snafu(display("Timed out after {:?} waiting for {} to report a status", timeout, object))]
    StatusTimeout { object: String, timeout: Duration },

    #[snafu(display("Timed out after {:?} waiting for {} to be deleted", timeout, object))]
    DeletionTimeout { object: String, timeout: Duration },

    #[snafu(display(
        "Timed out after {:?} waiting for a running pod of deployment '{}'",
        timeout,
        deployment
    ))]
    PodTimeout {
        deployment: String,
        timeout: Duration,
    },

    #[snafu(display("Failed to create {}: {}", what, source))]
    Provision {
        what: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },
}

impl Error {
    /// `true` when the operator never reported a status for its CR within the deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::StatusTimeout { .. } => true,
            Error::Provision { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
