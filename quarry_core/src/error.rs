// src/error.rs
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream returned status {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ConnectorError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ConnectorError::InvalidInput(_) => "invalid_input",
            ConnectorError::ParseError(_) | ConnectorError::SerdeJson(_) => "parse_error",
            ConnectorError::Timeout(_) => "timeout",
            ConnectorError::HttpRequest(e) if e.is_timeout() => "timeout",
            ConnectorError::HttpRequest(_) => "upstream_error",
            ConnectorError::UpstreamStatus { .. } => "upstream_status",
            ConnectorError::Io(_) | ConnectorError::Other(_) => "internal_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code_str() == "timeout"
    }

    /// `{"code": ..., "message": ...}`
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code_str(),
            "message": self.to_string(),
        })
    }
}

#[cfg(any(feature = "arxiv", feature = "pubmed"))]
impl From<quick_xml::Error> for ConnectorError {
    fn from(e: quick_xml::Error) -> Self {
        ConnectorError::ParseError(e.to_string())
    }
}
