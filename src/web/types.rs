//! Form and query payloads.

use serde::Deserialize;

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pw: String,
}

/// Body of `POST /submit-answer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerForm {
    #[serde(default)]
    pub answer: String,
}

/// `?error=1` flag carried back to a page after a failed attempt.
///
/// Read from the raw query string so that repeated or malformed parameters
/// never reject the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFlag {
    pub error: Option<String>,
}

impl ErrorFlag {
    /// Take the first non-empty `error` value from a query string.
    pub fn from_query(query: Option<&str>) -> Self {
        let error = query
            .into_iter()
            .flat_map(|query| query.split('&'))
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (key == "error").then(|| {
                    urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_default()
                })
            })
            .find(|value| !value.is_empty());
        Self { error }
    }

    pub fn is_set(&self) -> bool {
        matches!(self.error.as_deref(), Some(v) if !v.is_empty() && v != "0")
    }
}
