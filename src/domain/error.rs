//! Domain error types.

/// Top-level error type for stratanalyzer.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("missing column: {column}")]
    MissingColumn { column: String },

    #[error("bar times must be strictly increasing (violated at bar {index})")]
    UnorderedSeries { index: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no data for {stock} at timeframe {timeframe}")]
    NoData { stock: String, timeframe: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        AnalyzerError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&AnalyzerError> for std::process::ExitCode {
    fn from(err: &AnalyzerError) -> Self {
        let code: u8 = match err {
            AnalyzerError::Io(_) | AnalyzerError::Report { .. } => 1,
            AnalyzerError::ConfigParse { .. }
            | AnalyzerError::ConfigMissing { .. }
            | AnalyzerError::ConfigInvalid { .. } => 2,
            AnalyzerError::Data { .. }
            | AnalyzerError::MissingColumn { .. }
            | AnalyzerError::UnorderedSeries { .. } => 3,
            AnalyzerError::InvalidParameter { .. } => 4,
            AnalyzerError::NoData { .. } | AnalyzerError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
