use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running a scattering simulation.
///
/// Contract violations inside the hot loop (out-of-range random numbers,
/// malformed directions) are not represented here; everything that can be
/// checked once before the history loop starts is.
#[derive(Debug, Error)]
pub enum Error {
    /// A simulation was requested with zero histories.
    #[error("invalid history count: {0} (must be > 0)")]
    InvalidHistoryCount(u64),

    /// Transport settings or configuration values out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Tabulated constants produced a non-physical step table.
    #[error("invalid physics for {material}: {reason}")]
    InvalidPhysics { material: String, reason: String },

    /// Two histograms compared bin-by-bin do not share a bin structure.
    #[error("histogram bin mismatch: {left} bins vs {right} bins")]
    BinMismatch { left: usize, right: usize },

    /// Unknown material name.
    #[error("unknown material: '{0}'")]
    UnknownMaterial(String),

    /// Worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// Offload device failed to produce histograms.
    #[error("device '{device}' failed: {reason}")]
    Device { device: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::BinMismatch { left: 201, right: 101 };
        let msg = format!("{e}");
        assert!(msg.contains("201"));
        assert!(msg.contains("101"));

        let e = Error::InvalidHistoryCount(0);
        assert!(format!("{e}").contains("must be > 0"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
