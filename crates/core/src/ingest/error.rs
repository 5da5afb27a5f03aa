use crate::domain::instrument::Instrument;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Transport,
    Status(u16),
    Parse,
    NoData,
}

/// A failed fetch for one instrument. Rendered inline in that instrument's panel.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub instrument: Instrument,
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(instrument: Instrument, kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            instrument,
            kind,
            detail: detail.into(),
        }
    }

    pub fn from_reqwest(instrument: Instrument, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_decode() {
            FetchErrorKind::Parse
        } else if let Some(status) = err.status() {
            FetchErrorKind::Status(status.as_u16())
        } else {
            FetchErrorKind::Transport
        };
        // Strip the URL: it carries the credentials in its query string.
        let detail = err.without_url().to_string();
        Self::new(instrument, kind, detail)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => f.write_str("timed out"),
            FetchErrorKind::Transport => f.write_str("network error"),
            FetchErrorKind::Status(code) => write!(f, "HTTP {code}"),
            FetchErrorKind::Parse => f.write_str("malformed response"),
            FetchErrorKind::NoData => f.write_str("no data"),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to fetch {} ({}): {}",
            self.instrument, self.kind, self.detail
        )
    }
}

impl std::error::Error for FetchError {}
