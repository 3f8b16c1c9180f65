/// Crate-wide result alias.
pub type TrafficResult<T> = Result<T, TrafficError>;

/// Errors surfaced by the arc layer and its preview tooling.
#[derive(thiserror::Error, Debug)]
pub enum TrafficError {
    /// No dataset was supplied to the layer.
    #[error("missing data: no dataset supplied")]
    MissingData,

    /// A single event lacks usable source or target coordinates.
    #[error("invalid event '{id}': {reason}")]
    InvalidEvent {
        /// Event id, or its display fallback.
        id: String,
        /// What is wrong with the event.
        reason: String,
    },

    /// The host exposes no per-frame callback facility.
    #[error("scheduling unavailable: host provides no frame callback")]
    SchedulingUnavailable,

    /// Invalid configuration, arguments or lifecycle use.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Preview rasterization failure.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped IO or dependency error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrafficError {
    /// Build [`TrafficError::InvalidEvent`].
    pub fn invalid_event(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Build [`TrafficError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build [`TrafficError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build [`TrafficError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

impl From<serde_json::Error> for TrafficError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}
