//! Turns provider quotes and calendar events into weighted signal components.
//!
//! Each signal is scored on a small scale (daily and weekly moves in `-2..=2`, the macro
//! calendar in `-3..=3`, cross-market moves in `-2..=2`) and multiplied by a per-instrument
//! weight; the weighted sum is the snapshot's composite score.

use crate::domain::instrument::Instrument;
use crate::domain::sentiment::{SentimentSnapshot, SignalComponent};
use crate::ingest::types::{CalendarEvent, MarketQuote, Surprise};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

pub const MACRO_COUNTRIES: [&str; 3] = ["United States", "Euro Area", "China"];

const MACRO_WINDOW_DAYS: i64 = 3;
const MACRO_CLAMP: f64 = 3.0;
const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const CROSS_MARKET_CLAMP: f64 = 2.0;

/// Dollar index, US 10-year yield and VIX, as quoted by the provider.
pub const DXY_SYMBOL: &str = "DXY:CUR";
pub const US10Y_SYMBOL: &str = "USGG10YR:IND";
pub const VIX_SYMBOL: &str = "VIX:IND";

/// Daily percentage changes of the gold drivers. `None` where a quote could not be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CrossMarket {
    pub dxy: Option<f64>,
    pub us10y: Option<f64>,
    pub vix: Option<f64>,
}

impl CrossMarket {
    pub fn is_empty(&self) -> bool {
        self.dxy.is_none() && self.us10y.is_none() && self.vix.is_none()
    }
}

/// Everything beyond the instrument's own quote that may feed its score. `None` means the
/// input was wanted but could not be fetched.
#[derive(Debug, Clone, Default)]
pub struct SignalInputs {
    pub calendar: Option<Vec<CalendarEvent>>,
    pub cross_market: Option<CrossMarket>,
}

#[derive(Debug, Clone, Copy)]
pub struct Bands {
    pub mild: f64,
    pub strong: f64,
}

pub const DAILY_BANDS: Bands = Bands {
    mild: 0.2,
    strong: 1.0,
};

pub const WEEKLY_BANDS: Bands = Bands {
    mild: 1.0,
    strong: 3.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub daily: f64,
    pub weekly: f64,
    pub macro_calendar: f64,
    pub cross_market: f64,
}

pub fn weights(instrument: Instrument) -> Weights {
    match instrument {
        Instrument::Nasdaq100 => Weights {
            daily: 0.5,
            weekly: 0.3,
            macro_calendar: 0.2,
            cross_market: 0.0,
        },
        Instrument::Gold => Weights {
            daily: 0.4,
            weekly: 0.3,
            macro_calendar: 0.0,
            cross_market: 0.3,
        },
    }
}

/// Maps a percentage change onto `-2..=2`.
pub fn band_score(change_pct: f64, bands: Bands) -> f64 {
    if change_pct > bands.strong {
        2.0
    } else if change_pct > bands.mild {
        1.0
    } else if change_pct < -bands.strong {
        -2.0
    } else if change_pct < -bands.mild {
        -1.0
    } else {
        0.0
    }
}

fn change_signal(
    name: &str,
    label: &str,
    symbol: &str,
    change_pct: Option<f64>,
    bands: Bands,
    weight: f64,
) -> SignalComponent {
    let (score, note) = match change_pct {
        Some(chg) => (
            band_score(chg, bands),
            format!("{symbol} {label} {chg:.2}%"),
        ),
        None => (0.0, format!("No {label}")),
    };
    SignalComponent {
        name: name.to_string(),
        score,
        weight,
        note,
    }
}

pub fn daily_signal(quote: &MarketQuote, weight: f64) -> SignalComponent {
    change_signal(
        "Price",
        "daily change",
        &quote.symbol,
        quote.daily_percentual_change,
        DAILY_BANDS,
        weight,
    )
}

pub fn weekly_signal(quote: &MarketQuote, weight: f64) -> SignalComponent {
    change_signal(
        "Trend",
        "weekly change",
        &quote.symbol,
        quote.weekly_percentual_change,
        WEEKLY_BANDS,
        weight,
    )
}

/// Scores calendar events within three days either side of `now`.
///
/// Released events with a numeric surprise add or subtract their impact; events without a
/// surprise yet count as upcoming risk at half their impact. The total is clamped to `-3..=3`.
pub fn macro_score(events: &[CalendarEvent], now: DateTime<Utc>) -> f64 {
    let start = now - Duration::days(MACRO_WINDOW_DAYS);
    let end = now + Duration::days(MACRO_WINDOW_DAYS);

    let mut score = 0.0_f64;
    for event in events {
        let in_scope = event
            .country
            .as_deref()
            .is_some_and(|c| MACRO_COUNTRIES.contains(&c));
        if !in_scope {
            continue;
        }

        let Some(at) = event.date.as_deref().and_then(parse_calendar_date) else {
            continue;
        };
        if at < start || at > end {
            continue;
        }

        let impact = event.impact_weight();
        match event.surprise_state() {
            Surprise::Released(v) => score += if v > 0.0 { impact } else { -impact },
            Surprise::Pending => score -= impact * 0.5,
            Surprise::Unreadable => {}
        }
    }

    score.clamp(-MACRO_CLAMP, MACRO_CLAMP)
}

pub fn macro_signal(events: &[CalendarEvent], now: DateTime<Utc>, weight: f64) -> SignalComponent {
    let score = macro_score(events, now);
    SignalComponent {
        name: "Macro (USD/Euro/China)".to_string(),
        score,
        weight,
        note: format!("Macro impact score {score:.2}"),
    }
}

pub fn macro_unavailable(weight: f64) -> SignalComponent {
    SignalComponent {
        name: "Macro (USD/Euro/China)".to_string(),
        score: 0.0,
        weight,
        note: "Macro calendar unavailable".to_string(),
    }
}

/// Scores the gold drivers: a falling dollar or falling yields support gold, rising volatility
/// (risk-off) supports it at half weight. Missing drivers are skipped. Clamped to `-2..=2`.
pub fn cross_market_score(cross: &CrossMarket) -> (f64, Vec<&'static str>) {
    let mut score = 0.0_f64;
    let mut notes = Vec::new();

    if let Some(dxy) = cross.dxy {
        if dxy < 0.0 {
            score += 1.0;
            notes.push("DXY↓ supports gold");
        } else {
            score -= 1.0;
            notes.push("DXY↑ hurts gold");
        }
    }
    if let Some(us10y) = cross.us10y {
        if us10y > 0.0 {
            score -= 1.0;
            notes.push("US10Y↑ hurts gold");
        } else {
            score += 1.0;
            notes.push("US10Y↓ supports gold");
        }
    }
    if let Some(vix) = cross.vix {
        if vix < 0.0 {
            score -= 0.5;
            notes.push("VIX↓ risk-on (bearish gold)");
        } else {
            score += 0.5;
            notes.push("VIX↑ risk-off (bullish gold)");
        }
    }

    (score.clamp(-CROSS_MARKET_CLAMP, CROSS_MARKET_CLAMP), notes)
}

pub fn cross_market_signal(cross: &CrossMarket, weight: f64) -> SignalComponent {
    if cross.is_empty() {
        return cross_market_unavailable(weight);
    }
    let (score, notes) = cross_market_score(cross);
    SignalComponent {
        name: "Cross-Market".to_string(),
        score,
        weight,
        note: notes.join("; "),
    }
}

pub fn cross_market_unavailable(weight: f64) -> SignalComponent {
    SignalComponent {
        name: "Cross-Market".to_string(),
        score: 0.0,
        weight,
        note: "Cross-market data unavailable".to_string(),
    }
}

/// Builds the snapshot for `instrument`.
///
/// Inputs the instrument does not use are ignored; a used input that is `None` scores zero with
/// an "unavailable" note.
pub fn score_snapshot(
    instrument: Instrument,
    quote: &MarketQuote,
    inputs: &SignalInputs,
    retrieved_at: DateTime<Utc>,
) -> SentimentSnapshot {
    let w = weights(instrument);
    let mut components = vec![daily_signal(quote, w.daily), weekly_signal(quote, w.weekly)];

    if instrument.uses_macro_calendar() {
        components.push(match &inputs.calendar {
            Some(events) => macro_signal(events, retrieved_at, w.macro_calendar),
            None => macro_unavailable(w.macro_calendar),
        });
    }

    if instrument.uses_cross_market() {
        components.push(match &inputs.cross_market {
            Some(cross) => cross_market_signal(cross, w.cross_market),
            None => cross_market_unavailable(w.cross_market),
        });
    }

    SentimentSnapshot::from_components(
        instrument,
        quote.symbol.clone(),
        quote.last,
        quote.last_update.clone(),
        components,
        retrieved_at,
    )
}

fn parse_calendar_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), CALENDAR_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn quote(daily: Option<f64>, weekly: Option<f64>) -> MarketQuote {
        serde_json::from_value(json!({
            "Symbol": "NDX:IND",
            "Name": "Nasdaq 100",
            "Last": 18000.5,
            "DailyPercentualChange": daily,
            "WeeklyPercentualChange": weekly,
        }))
        .unwrap()
    }

    fn event(country: &str, date: &str, impact: &str, surprise: serde_json::Value) -> CalendarEvent {
        serde_json::from_value(json!({
            "Country": country,
            "Date": date,
            "Impact": impact,
            "Surprise": surprise,
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn bands_are_symmetric_and_exclusive_at_edges() {
        assert_eq!(band_score(0.2, DAILY_BANDS), 0.0);
        assert_eq!(band_score(0.21, DAILY_BANDS), 1.0);
        assert_eq!(band_score(1.01, DAILY_BANDS), 2.0);
        assert_eq!(band_score(-0.21, DAILY_BANDS), -1.0);
        assert_eq!(band_score(-1.5, DAILY_BANDS), -2.0);
        assert_eq!(band_score(2.5, WEEKLY_BANDS), 1.0);
    }

    #[test]
    fn missing_change_scores_zero_with_note() {
        let c = daily_signal(&quote(None, None), 0.5);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.note, "No daily change");
    }

    #[test]
    fn daily_note_names_symbol_and_change() {
        let c = daily_signal(&quote(Some(0.456), None), 0.5);
        assert_eq!(c.score, 1.0);
        assert_eq!(c.note, "NDX:IND daily change 0.46%");
    }

    #[test]
    fn macro_counts_released_and_pending_events_in_window() {
        let events = vec![
            event("United States", "2026-03-09T13:30:00", "High", json!(0.3)),
            event("Euro Area", "2026-03-11T10:00:00", "Medium", json!(null)),
            // outside the window
            event("United States", "2026-03-01T13:30:00", "High", json!(-1.0)),
            // untracked country
            event("Japan", "2026-03-10T01:00:00", "High", json!(1.0)),
        ];
        // +2 for the positive surprise, -0.5 for the upcoming medium event
        assert!((macro_score(&events, now()) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn macro_surprise_may_arrive_as_text() {
        let events = vec![
            event("China", "2026-03-10T02:00:00", "High", json!("-0.4")),
            event("China", "2026-03-10T03:00:00", "High", json!("n/a")),
            event("China", "2026-03-10T04:00:00", "Low", json!("")),
        ];
        assert!((macro_score(&events, now()) - -2.0).abs() < 1e-9);
    }

    #[test]
    fn macro_score_is_clamped() {
        let events: Vec<_> = (0..5)
            .map(|_| event("United States", "2026-03-10T08:00:00", "High", json!(1.0)))
            .collect();
        assert_eq!(macro_score(&events, now()), 3.0);
    }

    #[test]
    fn missing_inputs_degrade_to_zero_signals() {
        let q = quote(Some(1.2), Some(3.5));
        let gold = score_snapshot(Instrument::Gold, &q, &SignalInputs::default(), now());
        assert_eq!(gold.components.len(), 3);
        assert_eq!(gold.components[2].note, "Cross-market data unavailable");
        // 2 * 0.4 + 2 * 0.3
        assert!((gold.score - 1.4).abs() < 1e-9);

        let ndx = score_snapshot(Instrument::Nasdaq100, &q, &SignalInputs::default(), now());
        assert_eq!(ndx.components.len(), 3);
        assert_eq!(ndx.components[2].note, "Macro calendar unavailable");
        assert!((ndx.score - 1.6).abs() < 1e-9);
    }

    #[test]
    fn each_instrument_only_uses_its_own_inputs() {
        let q = quote(Some(0.0), Some(0.0));
        let inputs = SignalInputs {
            calendar: Some(Vec::new()),
            cross_market: Some(CrossMarket {
                dxy: Some(-0.4),
                ..Default::default()
            }),
        };
        let gold = score_snapshot(Instrument::Gold, &q, &inputs, now());
        assert!(gold.components.iter().all(|c| !c.name.starts_with("Macro")));
        let ndx = score_snapshot(Instrument::Nasdaq100, &q, &inputs, now());
        assert!(ndx.components.iter().all(|c| c.name != "Cross-Market"));
    }

    #[test]
    fn cross_market_signs_follow_gold_drivers() {
        let (score, notes) = cross_market_score(&CrossMarket {
            dxy: Some(-0.3),
            us10y: None,
            vix: None,
        });
        assert_eq!(score, 1.0);
        assert_eq!(notes, vec!["DXY↓ supports gold"]);

        let (score, _) = cross_market_score(&CrossMarket {
            dxy: Some(0.2),
            us10y: Some(1.1),
            vix: Some(-2.0),
        });
        // -1 - 1 - 0.5, clamped
        assert_eq!(score, -2.0);

        let (score, notes) = cross_market_score(&CrossMarket {
            dxy: None,
            us10y: Some(0.0),
            vix: Some(3.0),
        });
        assert_eq!(score, 1.5);
        assert_eq!(
            notes,
            vec!["US10Y↓ supports gold", "VIX↑ risk-off (bullish gold)"]
        );
    }

    #[test]
    fn cross_market_score_is_clamped() {
        let (score, notes) = cross_market_score(&CrossMarket {
            dxy: Some(-0.5),
            us10y: Some(-0.1),
            vix: Some(4.0),
        });
        assert_eq!(notes.len(), 3);
        assert_eq!(score, 2.0);
    }

    #[test]
    fn empty_cross_market_counts_as_unavailable() {
        let c = cross_market_signal(&CrossMarket::default(), 0.3);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.note, "Cross-market data unavailable");
    }
}
