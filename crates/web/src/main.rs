use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::Html, routing::get, Router};
use market_bias_core::config::{ConfigurationError, Settings};
use market_bias_core::dashboard::load_dashboard;
use market_bias_core::ingest::provider::{SentimentProvider, TradingEconomicsClient};
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod page;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    load_secrets_file(std::env::var_os("TE_SECRETS_FILE").as_deref().map(Path::new))?;

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState::from_settings(&settings).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        e
    })?;
    let app = app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    provider: Result<Arc<dyn SentimentProvider>, ConfigurationError>,
}

impl AppState {
    /// Missing credentials do not stop the server: every page view shows the configuration error
    /// instead of the panels.
    fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = match settings.require_credentials() {
            Ok(credentials) => {
                let client = TradingEconomicsClient::from_settings(settings, credentials)?;
                tracing::info!(
                    provider = client.provider_name(),
                    base_url = %settings.te_base_url,
                    timeout = ?settings.te_timeout,
                    "provider configured"
                );
                Ok(Arc::new(client) as Arc<dyn SentimentProvider>)
            }
            Err(err) => {
                tracing::error!(error = %err, "credentials missing; serving configuration error page");
                Err(err)
            }
        };
        Ok(Self { provider })
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn dashboard(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    match &state.provider {
        Ok(provider) => {
            let dashboard = load_dashboard(provider.as_ref()).await;
            tracing::info!(failures = dashboard.failures(), "dashboard rendered");
            (StatusCode::OK, Html(page::render_dashboard(&dashboard)))
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(page::render_config_error(err, &chrono::Utc::now())),
        ),
    }
}

/// Loads a dotenv-format secrets file (`TE_SECRETS_FILE`) when one is named. Values already in
/// the environment win.
fn load_secrets_file(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    dotenvy::from_path(path)
        .with_context(|| format!("failed to load secrets file {}", path.display()))?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path as UrlPath;
    use axum::Json;
    use market_bias_core::config::Credentials;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    type Quotes = Arc<Mutex<HashMap<String, Option<f64>>>>;

    /// Provider stand-in: a `None` price answers HTTP 500 for that symbol.
    async fn stub_provider(quotes: Quotes) -> String {
        let router = Router::new()
            .route(
                "/markets/symbol/:symbol",
                get(
                    |State(quotes): State<Quotes>, UrlPath(symbol): UrlPath<String>| async move {
                        let last = quotes.lock().unwrap().get(&symbol).copied().flatten();
                        match last {
                            Some(last) => Ok(Json(json!([{
                                "Symbol": symbol,
                                "Last": last,
                                "DailyPercentualChange": 0.5,
                                "WeeklyPercentualChange": 0.0,
                            }]))),
                            None => Err(StatusCode::INTERNAL_SERVER_ERROR),
                        }
                    },
                ),
            )
            .route("/calendar", get(|| async { Json(Value::Array(Vec::new())) }))
            .with_state(quotes);
        serve(router).await
    }

    fn quotes(ndx: Option<f64>, gold: Option<f64>) -> Quotes {
        Arc::new(Mutex::new(HashMap::from([
            ("NDX:IND".to_string(), ndx),
            ("XAUUSD:CUR".to_string(), gold),
        ])))
    }

    async fn dashboard_with(provider_base: &str) -> String {
        let client = TradingEconomicsClient::new(
            provider_base,
            Credentials {
                username: "user".to_string(),
                api_key: "key".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap();
        let state = AppState {
            provider: Ok(Arc::new(client) as Arc<dyn SentimentProvider>),
        };
        serve(app(state)).await
    }

    async fn get_page(base: &str) -> (u16, String) {
        let res = reqwest::get(format!("{base}/")).await.unwrap();
        let status = res.status().as_u16();
        (status, res.text().await.unwrap())
    }

    #[tokio::test]
    async fn renders_both_values_one_per_panel() {
        let provider = stub_provider(quotes(Some(18123.4), Some(2391.5))).await;
        let base = dashboard_with(&provider).await;

        let (status, html) = get_page(&base).await;
        assert_eq!(status, 200);
        assert_eq!(html.matches("<section class=\"panel\"").count(), 2);
        assert!(html.contains("NDX:IND last: 18123.40"));
        assert!(html.contains("XAUUSD:CUR last: 2391.50"));
    }

    #[tokio::test]
    async fn missing_credentials_render_neither_panel() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let base = serve(app(AppState::from_settings(&settings).unwrap())).await;

        let (status, html) = get_page(&base).await;
        assert_eq!(status, 503);
        assert!(html.contains("Configuration error:"));
        assert!(html.contains("TE_USERNAME, TE_API_KEY"));
        assert!(!html.contains("<section"));
    }

    #[tokio::test]
    async fn one_provider_failure_only_degrades_its_panel() {
        let provider = stub_provider(quotes(Some(18123.4), None)).await;
        let base = dashboard_with(&provider).await;

        let (status, html) = get_page(&base).await;
        assert_eq!(status, 200);
        assert!(html.contains("NDX:IND last: 18123.40"));
        assert!(html.contains(r#"<section class="panel panel-error" data-instrument="XAUUSD:CUR">"#));
        assert!(html.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn both_failures_render_two_error_panels() {
        let provider = stub_provider(quotes(None, None)).await;
        let base = dashboard_with(&provider).await;

        let (_, html) = get_page(&base).await;
        assert_eq!(html.matches("panel panel-error").count(), 2);
    }

    #[tokio::test]
    async fn each_page_view_fetches_fresh_values() {
        let q = quotes(Some(100.0), Some(200.0));
        let provider = stub_provider(q.clone()).await;
        let base = dashboard_with(&provider).await;

        let (_, first) = get_page(&base).await;
        q.lock()
            .unwrap()
            .insert("XAUUSD:CUR".to_string(), Some(321.0));
        let (_, second) = get_page(&base).await;

        assert!(first.contains("XAUUSD:CUR last: 200.00"));
        assert!(second.contains("XAUUSD:CUR last: 321.00"));
        assert!(!second.contains("XAUUSD:CUR last: 200.00"));
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        let base = serve(app(AppState::from_settings(&settings).unwrap())).await;
        let body = reqwest::get(format!("{base}/healthz"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[test]
    fn secrets_file_fills_gaps_without_overriding_env() {
        let pid = std::process::id();
        let kept = format!("MARKET_BIAS_TEST_KEPT_{pid}");
        let added = format!("MARKET_BIAS_TEST_ADDED_{pid}");
        let file = std::env::temp_dir().join(format!("market-bias-secrets-{pid}.env"));
        std::fs::write(&file, format!("{kept}=from-file\n{added}=from-file\n")).unwrap();
        std::env::set_var(&kept, "from-env");

        load_secrets_file(Some(file.as_path())).unwrap();

        assert_eq!(std::env::var(&kept).unwrap(), "from-env");
        assert_eq!(std::env::var(&added).unwrap(), "from-file");
        let _ = std::fs::remove_file(&file);
    }

    #[test]
    fn unreadable_secrets_file_is_a_startup_error() {
        let missing = std::env::temp_dir().join("market-bias-no-such-dir/secrets.env");
        let err = load_secrets_file(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to load secrets file"));
        assert!(load_secrets_file(None).is_ok());
    }
}
