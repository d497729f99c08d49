use std::env;

use crate::error::{IngestError, Result};
use crate::fetch::Market;

/// Event listing pages live here, keyed by ?egid=..&seid=..
pub const DEFAULT_HTML_BASE: &str = "https://odds.bookmakersreview.com";

/// The odds query service behind the listing pages.
pub const DEFAULT_ODDS_BASE: &str = "https://ms.production-us-east-1.bookmakersreview.com";

/// A desktop UA is required or the site serves a reduced grid.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub html_base: String,
    pub odds_base: String,
    pub http_timeout_secs: u64,
    /// Outbound request quota per minute (politeness toward the site).
    pub requests_per_minute: u32,
    /// Which bet markets to fetch and reshape.
    pub markets: Vec<Market>,
    pub health_port: u16,
    /// If true, run one week (SEASON/WEEK env) and exit (no server).
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let markets = match env::var("MARKETS") {
            Ok(v) if !v.trim().is_empty() => parse_markets(&v)?,
            _ => vec![Market::Spread, Market::Moneyline],
        };

        Ok(Self {
            html_base: env::var("HTML_BASE").unwrap_or_else(|_| DEFAULT_HTML_BASE.to_string()),
            odds_base: env::var("ODDS_BASE").unwrap_or_else(|_| DEFAULT_ODDS_BASE.to_string()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            requests_per_minute: env::var("REQUESTS_PER_MINUTE")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            markets,
            health_port: env::var("HEALTH_PORT")
                .unwrap_or_else(|_| "8083".to_string())
                .parse()
                .unwrap_or(8083),
            run_once: env::var("RUN_ONCE")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                == "true",
        })
    }
}

/// Parse a comma-separated market list, e.g. "spread,moneyline,total".
fn parse_markets(raw: &str) -> Result<Vec<Market>> {
    let mut markets = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let market = match token.to_lowercase().as_str() {
            "spread" | "spr" => Market::Spread,
            "moneyline" | "ml" => Market::Moneyline,
            "total" | "tot" => Market::Total,
            other => {
                return Err(IngestError::Configuration(format!(
                    "unknown market {other:?} in MARKETS"
                )))
            }
        };
        if !markets.contains(&market) {
            markets.push(market);
        }
    }
    if markets.is_empty() {
        return Err(IngestError::Configuration(
            "MARKETS selected no markets".to_string(),
        ));
    }
    Ok(markets)
}
