use thiserror::Error;

/// Failure kinds a query sequence can end in.
///
/// Every variant is recoverable: the session lands in `QueryState::Failed`
/// and the next query starts from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Enter a city")]
    EmptyInput,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream request failed with status {status}: {}", truncate_body(.body))]
    Upstream { status: u16, body: String },

    #[error("Geolocation denied or failed: {0}")]
    GeolocationDenied(String),

    #[error("Could not interpret provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Network(err.to_string())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
