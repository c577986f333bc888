use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Unable to read config file '{}': {}", path.display(), source))]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to parse config file '{}': {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("Invalid configuration: {}", reason))]
    InvalidConfig { reason: String },

    #[snafu(display("Invalid apiVersion '{}'", api_version))]
    ApiVersion { api_version: String },

    #[snafu(display("Unable to parse label selector '{}': {}", selector, reason))]
    Selector { selector: String, reason: String },

    #[snafu(display("Unable to serialize report: {}", source))]
    ReportSerialize { source: serde_json::Error },
}
