use serde::Deserialize;
use serde_json::Value;

/// One row of the provider's `/markets/symbol/{symbol}` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketQuote {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub daily_percentual_change: Option<f64>,
    #[serde(default)]
    pub weekly_percentual_change: Option<f64>,
    /// Provider-side timestamp of the quote, shown as-is.
    #[serde(default)]
    pub last_update: Option<String>,
}

/// One row of the provider's `/calendar` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CalendarEvent {
    pub country: Option<String>,
    pub date: Option<String>,
    pub impact: Option<String>,
    pub importance: Option<i64>,
    pub surprise: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surprise {
    Released(f64),
    Pending,
    Unreadable,
}

impl CalendarEvent {
    /// High = 2, Medium = 1, anything else 0. Falls back to the numeric `Importance` (1..=3)
    /// when `Impact` is absent.
    pub fn impact_weight(&self) -> f64 {
        match self.impact.as_deref().map(str::trim) {
            Some("High") => 2.0,
            Some("Medium") => 1.0,
            Some(_) => 0.0,
            None => match self.importance {
                Some(3) => 2.0,
                Some(2) => 1.0,
                _ => 0.0,
            },
        }
    }

    pub fn surprise_state(&self) -> Surprise {
        match &self.surprise {
            None | Some(Value::Null) => Surprise::Pending,
            Some(Value::Number(n)) => n.as_f64().map_or(Surprise::Unreadable, Surprise::Released),
            Some(Value::String(s)) if s.trim().is_empty() => Surprise::Pending,
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_or(Surprise::Unreadable, Surprise::Released),
            Some(_) => Surprise::Unreadable,
        }
    }
}
