use thiserror::Error;

/// Failures raised by the bridge core (`crate::bridge`).
///
/// Both kinds are unrecoverable for the bridge instance being computed and are
/// propagated to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// Rejected inputs: non-positive horizon, fewer than two steps, non-positive
    /// marginal variance, invalid diffusion, or misaligned path/field.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A grid point carries a variance that is not strictly positive (or not finite).
    #[error("invalid bridge state at index {index} (t={t}): variance {variance} is not positive")]
    InvalidBridgeState { index: usize, t: f64, variance: f64 },
}

impl BridgeError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        BridgeError::InvalidConfiguration(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        let exit_code = match err {
            BridgeError::InvalidConfiguration(_) => 2,
            BridgeError::InvalidBridgeState { .. } => 4,
        };
        AppError::new(exit_code, format!("Bridge computation failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_map_to_exit_codes() {
        let cfg: AppError = BridgeError::config("steps must be >= 2").into();
        assert_eq!(cfg.exit_code(), 2);
        assert!(cfg.message().contains("steps must be >= 2"));

        let state: AppError = BridgeError::InvalidBridgeState {
            index: 3,
            t: 0.5,
            variance: -1.0,
        }
        .into();
        assert_eq!(state.exit_code(), 4);
        assert!(state.message().contains("index 3"));
    }
}
