//! Server-rendered HTML for the dashboard page.
//!
//! The page has two equal-width columns (Nasdaq 100 left, Gold right). A failed fetch renders an
//! inline error inside its own column; a configuration error replaces both columns with a single
//! blocking message.

use chrono::{DateTime, Utc};
use market_bias_core::config::ConfigurationError;
use market_bias_core::dashboard::{Dashboard, Panel};
use market_bias_core::domain::sentiment::SentimentSnapshot;

const TITLE: &str = "Daily Market Bias — Nasdaq 100 & Gold (XAUUSD)";
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; color: #1f2328; }
    header { display: flex; align-items: baseline; justify-content: space-between; gap: 16px; }
    .updated { color: #656d76; margin: 0; }
    .refresh { padding: 6px 12px; border: 1px solid #d0d7de; border-radius: 6px; text-decoration: none; color: inherit; }
    .columns { display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 24px; margin-top: 16px; }
    .panel { border: 1px solid #d0d7de; border-radius: 8px; padding: 16px; }
    .bias { font-size: 1.25rem; padding-left: 10px; border-left: 6px solid #d4a72c; }
    .bias-up { border-left-color: #1a7f37; }
    .bias-flat { border-left-color: #d4a72c; }
    .bias-down { border-left-color: #cf222e; }
    .last { color: #656d76; }
    .error, .config-error { color: #cf222e; background: #ffebe9; padding: 12px; border-radius: 6px; }
    footer { color: #656d76; }
"#;

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let columns: String = dashboard.panels.iter().map(render_panel).collect();
    document(
        &dashboard.generated_at,
        &format!(r#"<main class="columns">{columns}</main>"#),
    )
}

pub fn render_config_error(err: &ConfigurationError, now: &DateTime<Utc>) -> String {
    document(
        now,
        &format!(
            r#"<div class="config-error" role="alert"><strong>Configuration error:</strong> {}</div>"#,
            escape(&err.to_string())
        ),
    )
}

fn document(stamp: &DateTime<Utc>, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<header>
<h2>📈 {title}</h2>
<a class="refresh" href="/">🔄 Refresh Now</a>
</header>
<p class="updated">Last updated: {stamp} UTC</p>
{body}
<hr>
<footer><small>Source: Trading Economics. Data is fetched fresh on every page load; click Refresh to update.</small></footer>
</body>
</html>
"#,
        title = escape(TITLE),
        stamp = stamp.format(STAMP_FORMAT),
    )
}

fn render_panel(panel: &Panel) -> String {
    let instrument = panel.instrument;
    let inner = match &panel.outcome {
        Ok(snapshot) => render_snapshot(snapshot),
        Err(err) => format!(r#"<p class="error" role="alert">{}</p>"#, escape(&err.to_string())),
    };
    let class = if panel.outcome.is_ok() {
        "panel"
    } else {
        "panel panel-error"
    };

    format!(
        r#"<section class="{class}" data-instrument="{symbol}"><h3>{icon} {name} Sentiment</h3>{inner}</section>"#,
        symbol = escape(instrument.symbol()),
        icon = instrument.icon(),
        name = escape(instrument.display_name()),
    )
}

fn render_snapshot(snapshot: &SentimentSnapshot) -> String {
    let bias = snapshot.bias;
    let last = match snapshot.last {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    };
    let provider_time = match &snapshot.provider_updated {
        Some(stamp) => format!(", provider time {}", escape(stamp)),
        None => String::new(),
    };
    let details: String = snapshot
        .components
        .iter()
        .map(|c| {
            format!(
                "<li><strong>{}:</strong> {}</li>",
                escape(&c.name),
                escape(&c.note)
            )
        })
        .collect();

    format!(
        r#"<p class="bias bias-{direction}">{indicator} Overall {name} Bias: <strong>{label}</strong> ({score:.2})</p><p class="last">{symbol} last: {last} (retrieved {retrieved} UTC{provider_time})</p><details><summary>Details</summary><ul>{details}</ul></details>"#,
        direction = bias.direction().as_str(),
        indicator = bias.indicator(),
        name = escape(snapshot.instrument.display_name()),
        label = bias.label(),
        score = snapshot.score,
        symbol = escape(&snapshot.symbol),
        retrieved = snapshot.retrieved_at.format(STAMP_FORMAT),
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
