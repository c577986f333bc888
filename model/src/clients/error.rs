use crate::clients::{HttpStatusCode, StatusCode};
use snafu::Snafu;
use std::path::PathBuf;

/// The `Result` type returned by `clients`.
pub type Result<T> = std::result::Result<T, Error>;

/// The public error type returned by `clients`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

/// The private error type returned by `clients`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub(crate) enum InnerError {
    #[snafu(display("Error initializing the Kubernetes client: {}", source))]
    Initialization { source: kube::Error },

    #[snafu(display("Unable to read kubeconfig '{}': {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to create client from kubeconfig: {}", source))]
    ClientCreateKubeconfig {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Unable to discover the resource kinds served by the cluster: {}", source))]
    Discovery { source: kube::Error },

    #[snafu(display("The cluster does not serve resources of kind '{}'", gvk))]
    UnknownKind { gvk: String },

    #[snafu(display("Object of kind '{}' has no metadata.name", kind))]
    MissingName { kind: String },

    #[snafu(display("Object has no apiVersion or kind: {}", source))]
    MissingType { source: crate::Error },

    #[snafu(display("Unable to {} {}: {}", method, what, source))]
    KubeApiCall {
        method: String,
        what: String,
        source: kube::Error,
    },
}

impl Error {
    /// Wrap an error returned by the Kubernetes API while performing `method` on `what`.
    pub fn api_call<S1, S2>(method: S1, what: S2, source: kube::Error) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Error(InnerError::KubeApiCall {
            method: method.into(),
            what: what.into(),
            source,
        })
    }

    /// `true` when the API server answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.is_status_code(StatusCode::NOT_FOUND)
    }
}

impl HttpStatusCode for InnerError {
    fn status_code(&self) -> Option<StatusCode> {
        match self {
            InnerError::KubeApiCall { source: e, .. } => e.status_code(),
            InnerError::Initialization { .. }
            | InnerError::ConfigRead { .. }
            | InnerError::ClientCreateKubeconfig { .. }
            | InnerError::Discovery { .. }
            | InnerError::UnknownKind { .. }
            | InnerError::MissingName { .. }
            | InnerError::MissingType { .. } => None,
        }
    }
}

impl HttpStatusCode for Error {
    fn status_code(&self) -> Option<StatusCode> {
        self.0.status_code()
    }
}
