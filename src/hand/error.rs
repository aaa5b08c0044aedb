//! Errors raised while validating hand observations and tunables.

/// Failure of a classification call or a configuration update.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GestureError {
    #[error("malformed hand observation: {reason}")]
    MalformedInput { reason: String },

    #[error("missing handedness: {}", describe_label(.found))]
    MissingHandedness { found: Option<String> },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl GestureError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Protocol name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "malformed-input",
            Self::MissingHandedness { .. } => "missing-handedness",
            Self::InvalidConfig { .. } => "invalid-config",
        }
    }
}

fn describe_label(found: &Option<String>) -> String {
    match found {
        Some(label) => format!("unknown label {label:?}"),
        None => "no label given".to_string(),
    }
}
