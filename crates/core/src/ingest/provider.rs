use crate::config::{Credentials, Settings};
use crate::domain::instrument::Instrument;
use crate::domain::scoring::{self, CrossMarket, SignalInputs};
use crate::domain::sentiment::SentimentSnapshot;
use crate::ingest::error::{FetchError, FetchErrorKind};
use crate::ingest::types::{CalendarEvent, MarketQuote};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

const MARKETS_PATH: &str = "/markets/symbol";
const CALENDAR_PATH: &str = "/calendar";
const MAX_ERROR_BODY_CHARS: usize = 200;

#[async_trait::async_trait]
pub trait SentimentProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_snapshot(&self, instrument: Instrument)
        -> Result<SentimentSnapshot, FetchError>;
}

#[derive(Debug, Clone)]
pub struct TradingEconomicsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl TradingEconomicsClient {
    pub fn from_settings(settings: &Settings, credentials: Credentials) -> Result<Self> {
        Self::new(&settings.te_base_url, credentials, settings.te_timeout)
    }

    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build provider http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        instrument: Instrument,
        url: String,
    ) -> Result<T, FetchError> {
        let auth = self.credentials.query_value();
        let res = self
            .http
            .get(url)
            .query(&[("c", auth.as_str()), ("f", "json")])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(instrument, e))?;

        let status = res.status();
        if !status.is_success() {
            // The body is only a hint for the error panel; a failed read must not hide the status.
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::new(
                instrument,
                FetchErrorKind::Status(status.as_u16()),
                truncate(&body, MAX_ERROR_BODY_CHARS),
            ));
        }

        let text = res
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(instrument, e))?;

        serde_json::from_str::<T>(&text).map_err(|e| {
            FetchError::new(
                instrument,
                FetchErrorKind::Parse,
                format!("unexpected response shape: {e}"),
            )
        })
    }

    pub async fn fetch_quote(&self, instrument: Instrument) -> Result<MarketQuote, FetchError> {
        self.fetch_symbol(instrument, instrument.symbol()).await
    }

    /// Quote for any provider symbol, with failures attributed to `instrument`.
    pub async fn fetch_symbol(
        &self,
        instrument: Instrument,
        symbol: &str,
    ) -> Result<MarketQuote, FetchError> {
        let url = self.url(&format!("{MARKETS_PATH}/{symbol}"));
        let rows: Vec<MarketQuote> = self.get_json(instrument, url).await?;
        pick_quote(instrument, symbol, rows)
    }

    /// Daily changes of the gold drivers. Each failed driver is logged and left out; `None` when
    /// none of them could be fetched.
    pub async fn fetch_cross_market(&self, instrument: Instrument) -> Option<CrossMarket> {
        let (dxy, us10y, vix) = tokio::join!(
            self.fetch_symbol(instrument, scoring::DXY_SYMBOL),
            self.fetch_symbol(instrument, scoring::US10Y_SYMBOL),
            self.fetch_symbol(instrument, scoring::VIX_SYMBOL),
        );
        let daily_change = |symbol: &str, res: Result<MarketQuote, FetchError>| match res {
            Ok(quote) => quote.daily_percentual_change,
            Err(err) => {
                tracing::warn!(%instrument, symbol, error = %err, "cross-market quote fetch failed");
                None
            }
        };
        let cross = CrossMarket {
            dxy: daily_change(scoring::DXY_SYMBOL, dxy),
            us10y: daily_change(scoring::US10Y_SYMBOL, us10y),
            vix: daily_change(scoring::VIX_SYMBOL, vix),
        };
        (!cross.is_empty()).then_some(cross)
    }

    /// The calendar is requested on behalf of `instrument` so failures are attributed to it.
    pub async fn fetch_calendar(
        &self,
        instrument: Instrument,
    ) -> Result<Vec<CalendarEvent>, FetchError> {
        self.get_json(instrument, self.url(CALENDAR_PATH)).await
    }
}

#[async_trait::async_trait]
impl SentimentProvider for TradingEconomicsClient {
    fn provider_name(&self) -> &'static str {
        "trading_economics"
    }

    async fn fetch_snapshot(
        &self,
        instrument: Instrument,
    ) -> Result<SentimentSnapshot, FetchError> {
        let calendar = async {
            if !instrument.uses_macro_calendar() {
                return None;
            }
            match self.fetch_calendar(instrument).await {
                Ok(events) => Some(events),
                Err(err) => {
                    tracing::warn!(%instrument, error = %err, "macro calendar fetch failed; scoring without it");
                    None
                }
            }
        };
        let cross_market = async {
            if !instrument.uses_cross_market() {
                return None;
            }
            self.fetch_cross_market(instrument).await
        };

        let (quote, calendar, cross_market) =
            tokio::join!(self.fetch_quote(instrument), calendar, cross_market);
        let inputs = SignalInputs {
            calendar,
            cross_market,
        };

        let snapshot = scoring::score_snapshot(instrument, &quote?, &inputs, chrono::Utc::now());
        tracing::debug!(
            %instrument,
            score = snapshot.score,
            bias = snapshot.bias.label(),
            "sentiment snapshot fetched"
        );
        Ok(snapshot)
    }
}

fn pick_quote(
    instrument: Instrument,
    symbol: &str,
    rows: Vec<MarketQuote>,
) -> Result<MarketQuote, FetchError> {
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Err(FetchError::new(
            instrument,
            FetchErrorKind::NoData,
            format!("provider returned no rows for {symbol}"),
        ));
    };
    if first.symbol.eq_ignore_ascii_case(symbol) {
        return Ok(first);
    }
    Ok(rows
        .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
        .unwrap_or(first))
}

fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
