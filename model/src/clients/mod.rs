mod control_plane;
mod error;
mod http_status_code;
mod kube_control_plane;

pub use control_plane::ControlPlane;
pub use error::{Error, Result};
pub use http_status_code::{HttpStatusCode, StatusCode};
pub use kube_control_plane::KubeControlPlane;
