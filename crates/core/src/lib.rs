pub mod dashboard;
pub mod domain;
pub mod ingest;

pub mod config {
    use anyhow::Context;
    use std::fmt;
    use std::time::Duration;

    pub const DEFAULT_TE_BASE_URL: &str = "https://api.tradingeconomics.com";
    pub const DEFAULT_TE_TIMEOUT_SECS: u64 = 5;
    pub const DEFAULT_PORT: u16 = 3000;

    #[derive(Clone)]
    pub struct Settings {
        pub te_username: Option<String>,
        pub te_api_key: Option<String>,
        pub te_base_url: String,
        pub te_timeout: Duration,
        pub port: u16,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup so callers (and tests) are not tied to
        /// the process environment.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let te_timeout_secs = match lookup("TE_TIMEOUT_SECS") {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("TE_TIMEOUT_SECS must be a whole number of seconds (got {v:?})"))?,
                None => DEFAULT_TE_TIMEOUT_SECS,
            };
            anyhow::ensure!(te_timeout_secs > 0, "TE_TIMEOUT_SECS must be greater than zero");

            let port = match lookup("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {v:?})"))?,
                None => DEFAULT_PORT,
            };

            let te_base_url = lookup("TE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TE_BASE_URL.to_string());

            Ok(Self {
                te_username: lookup("TE_USERNAME"),
                te_api_key: lookup("TE_API_KEY"),
                te_base_url,
                te_timeout: Duration::from_secs(te_timeout_secs),
                port,
                sentry_dsn: lookup("SENTRY_DSN"),
            })
        }

        pub fn require_credentials(&self) -> Result<Credentials, ConfigurationError> {
            let username = non_blank(self.te_username.as_deref());
            let api_key = non_blank(self.te_api_key.as_deref());

            match (username, api_key) {
                (Some(username), Some(api_key)) => Ok(Credentials {
                    username: username.to_string(),
                    api_key: api_key.to_string(),
                }),
                (username, api_key) => {
                    let mut missing = Vec::new();
                    if username.is_none() {
                        missing.push("TE_USERNAME");
                    }
                    if api_key.is_none() {
                        missing.push("TE_API_KEY");
                    }
                    Err(ConfigurationError { missing })
                }
            }
        }
    }

    impl fmt::Debug for Settings {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Settings")
                .field("te_username", &self.te_username)
                .field("te_api_key", &self.te_api_key.as_ref().map(|_| "<redacted>"))
                .field("te_base_url", &self.te_base_url)
                .field("te_timeout", &self.te_timeout)
                .field("port", &self.port)
                .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "<redacted>"))
                .finish()
        }
    }

    fn non_blank(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }

    #[derive(Clone, PartialEq, Eq)]
    pub struct Credentials {
        pub username: String,
        pub api_key: String,
    }

    impl Credentials {
        /// The provider's `c=` query value.
        pub fn query_value(&self) -> String {
            format!("{}:{}", self.username, self.api_key)
        }
    }

    impl fmt::Debug for Credentials {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Credentials")
                .field("username", &self.username)
                .field("api_key", &"<redacted>")
                .finish()
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ConfigurationError {
        pub missing: Vec<&'static str>,
    }

    impl fmt::Display for ConfigurationError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "missing required configuration: {} (set them in the environment or the secrets file)",
                self.missing.join(", ")
            )
        }
    }

    impl std::error::Error for ConfigurationError {}

}
