//! Pipeline assembly errors.

use crate::config::loader::join_errors;
use crate::config::validation::ValidationError;
use crate::container::ResolveError;
use crate::pipeline::builder::StageKind;

/// Error raised while building or installing a single stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("stage {stage} cannot be installed after {after}")]
    OutOfOrder { stage: StageKind, after: StageKind },

    #[error("invalid setting {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },

    #[error("{0}")]
    Failed(String),
}

/// Fatal startup error. No pipeline is served when assembly returns one.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("required argument missing: {0}")]
    Argument(&'static str),

    #[error("server configuration is invalid: {}", join_errors(.0))]
    Configuration(Vec<ValidationError>),

    #[error("failed to install {stage} stage")]
    StageInstallation {
        stage: StageKind,
        #[source]
        source: StageError,
    },

    #[error("startup diagnostics failed")]
    Diagnostics(#[source] ResolveError),
}

impl StartupError {
    pub(crate) fn stage(stage: StageKind) -> impl FnOnce(StageError) -> Self {
        move |source| Self::StageInstallation { stage, source }
    }
}
