use crate::domain::instrument::Instrument;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bullish,
    MildBullish,
    Neutral,
    MildBearish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Flat,
    Down,
}

impl Bias {
    pub fn from_score(score: f64) -> Self {
        if score >= 1.5 {
            Bias::Bullish
        } else if score >= 0.5 {
            Bias::MildBullish
        } else if score > -0.5 {
            Bias::Neutral
        } else if score > -1.5 {
            Bias::MildBearish
        } else {
            Bias::Bearish
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::MildBullish => "Mild Bullish",
            Bias::Neutral => "Neutral",
            Bias::MildBearish => "Mild Bearish",
            Bias::Bearish => "Bearish",
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Bias::Bullish => "🟢",
            Bias::MildBullish => "🟩",
            Bias::Neutral => "🟨",
            Bias::MildBearish => "🟧",
            Bias::Bearish => "🔴",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Bias::Bullish | Bias::MildBullish => Direction::Up,
            Bias::Neutral => Direction::Flat,
            Bias::MildBearish | Bias::Bearish => Direction::Down,
        }
    }
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Flat => "flat",
            Direction::Down => "down",
        }
    }
}

/// One weighted input to a snapshot's composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalComponent {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct SentimentSnapshot {
    pub instrument: Instrument,
    pub symbol: String,
    pub last: Option<f64>,
    /// The provider's own quote timestamp, when it reports one.
    pub provider_updated: Option<String>,
    pub score: f64,
    pub bias: Bias,
    pub components: Vec<SignalComponent>,
    pub retrieved_at: DateTime<Utc>,
}

impl SentimentSnapshot {
    pub fn from_components(
        instrument: Instrument,
        symbol: String,
        last: Option<f64>,
        provider_updated: Option<String>,
        components: Vec<SignalComponent>,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        let score = components.iter().map(|c| c.score * c.weight).sum::<f64>();
        Self {
            instrument,
            symbol,
            last,
            provider_updated,
            score,
            bias: Bias::from_score(score),
            components,
            retrieved_at,
        }
    }
}
