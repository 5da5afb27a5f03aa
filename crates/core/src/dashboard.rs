//! One page view's worth of data: both instruments fetched fresh, each outcome kept separate so a
//! failure only ever degrades its own panel.

use crate::domain::instrument::Instrument;
use crate::domain::sentiment::SentimentSnapshot;
use crate::ingest::error::FetchError;
use crate::ingest::provider::SentimentProvider;
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct Panel {
    pub instrument: Instrument,
    pub outcome: Result<SentimentSnapshot, FetchError>,
}

#[derive(Debug)]
pub struct Dashboard {
    pub panels: [Panel; 2],
    pub generated_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn failures(&self) -> usize {
        self.panels.iter().filter(|p| p.outcome.is_err()).count()
    }
}

pub async fn load_dashboard(provider: &dyn SentimentProvider) -> Dashboard {
    let [left, right] = Instrument::ALL;
    let (left_outcome, right_outcome) = tokio::join!(
        provider.fetch_snapshot(left),
        provider.fetch_snapshot(right)
    );

    let panels = [
        Panel {
            instrument: left,
            outcome: left_outcome,
        },
        Panel {
            instrument: right,
            outcome: right_outcome,
        },
    ];

    for panel in &panels {
        if let Err(err) = &panel.outcome {
            tracing::warn!(
                provider = provider.provider_name(),
                instrument = %panel.instrument,
                kind = %err.kind,
                error = %err,
                "instrument fetch failed; rendering inline error"
            );
        }
    }

    Dashboard {
        panels,
        generated_at: Utc::now(),
    }
}
