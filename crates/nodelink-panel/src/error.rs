//! Panel client error types.

/// Panel client error type.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// The request never produced a response (connect failure, timeout),
    /// after all retries were spent.
    #[error("request {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The panel answered with an HTTP error status.
    #[error("request {url} failed: HTTP {status}, {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The envelope decoded but its `status` was not `success`.
    #[error("panel returned unsuccessful envelope: {0}")]
    Envelope(String),

    /// A payload did not match the expected schema.
    #[error("failed to decode {payload}: {source}")]
    Decode {
        payload: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("failed to encode {payload}: {source}")]
    Encode {
        payload: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),

    #[error("rule {id} has an invalid pattern {pattern:?}: {source}")]
    RuleCompile {
        id: i64,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl PanelError {
    /// Create a decode error for the named payload type.
    #[inline]
    pub fn decode(payload: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { payload, source }
    }

    /// Whether the failure is transport-level (no response, or an HTTP error status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http { .. })
    }
}
