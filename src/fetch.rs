//! Batched line fetching from the odds query service.
//!
//! One GET per week covers every event on the slate: three aliased result
//! sets (current lines across the book roster, opening lines from the
//! reference book, consensus) in a single query. A week's slate (~16
//! events) always fits in one payload, so there is no pagination.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{Config, DESKTOP_USER_AGENT};
use crate::error::{IngestError, Result};

/// Bookmaker (affiliate) ids tracked for current lines, in the order the
/// site's own grid requests them.
pub const BOOK_PAIDS: &[u32] = &[8, 9, 10, 123, 44, 29, 16, 130, 54, 82, 36, 20, 127, 28, 84];

/// The pseudo-book that carries opening lines.
pub const OPENER_PAID: u32 = 8;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

/// Bet market, identified upstream by a numeric market-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Market {
    Moneyline,
    Spread,
    Total,
}

impl Market {
    pub const fn code(self) -> u16 {
        match self {
            Market::Moneyline => 83,
            Market::Spread => 401,
            Market::Total => 402,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            83 => Some(Market::Moneyline),
            401 => Some(Market::Spread),
            402 => Some(Market::Total),
            _ => None,
        }
    }

    /// Short tag used in flattened column names.
    pub const fn tag(self) -> &'static str {
        match self {
            Market::Moneyline => "ml",
            Market::Spread => "spr",
            Market::Total => "tot",
        }
    }

    /// Spread and total carry a line value alongside the price; moneyline
    /// carries a price only.
    pub const fn has_line(self) -> bool {
        !matches!(self, Market::Moneyline)
    }
}

/// One long-format line record as returned by the odds service. Fields the
/// service carries but the pipeline ignores (boid, sbid, lineid, sequence,
/// tim, ...) are simply not declared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineRecord {
    pub eid: u64,
    pub mtid: u16,
    pub partid: u64,
    pub paid: u32,
    /// Line value: spread points or total points, in 0.5 increments.
    pub adj: Option<f64>,
    /// American-odds price; integer-valued, may be negative.
    pub ap: Option<f64>,
    /// Consensus bet percentage (consensus records only).
    pub perc: Option<f64>,
    /// Consensus wager volume (consensus records only).
    pub wag: Option<f64>,
}

/// The three aliased result sets of one batched query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LineSets {
    #[serde(rename = "A_CL")]
    pub current: Vec<LineRecord>,
    #[serde(rename = "A_OL")]
    pub opening: Vec<LineRecord>,
    #[serde(rename = "A_CO")]
    pub consensus: Vec<LineRecord>,
}

#[derive(Debug, Deserialize)]
struct OddsResponse {
    data: LineSets,
}

/// Fetch all line records for the given events and markets in one request.
pub async fn fetch_lines(
    client: &reqwest::Client,
    cfg: &Config,
    eids: &[u64],
    markets: &[Market],
) -> Result<LineSets> {
    let query = build_query(eids, markets);
    let url = format!("{}/ms-odds-v2/odds-v2-service", cfg.odds_base);
    let referer = format!("{}/nfl/", cfg.html_base);

    let body = get_text_with_retry(
        || {
            client
                .get(&url)
                .query(&[("query", query.as_str())])
                .header(reqwest::header::USER_AGENT, DESKTOP_USER_AGENT)
                .header(reqwest::header::ACCEPT, "application/json")
                .header(reqwest::header::REFERER, referer.as_str())
                .header("X-Requested-With", "XMLHttpRequest")
        },
        "odds query",
    )
    .await?;

    let parsed: OddsResponse = serde_json::from_str(&body).map_err(|e| {
        IngestError::MalformedResponse(format!("odds payload missing expected shape: {e}"))
    })?;

    info!(
        "fetched {} current / {} opening / {} consensus line records for {} events",
        parsed.data.current.len(),
        parsed.data.opening.len(),
        parsed.data.consensus.len(),
        eids.len()
    );

    Ok(parsed.data)
}

/// Build the three-alias query string. The service accepts a GraphQL-like
/// expression as a plain `query` parameter.
fn build_query(eids: &[u64], markets: &[Market]) -> String {
    let eid_list = join_ids(eids.iter().map(|e| e.to_string()));
    let mtid_list = join_ids(markets.iter().map(|m| m.code().to_string()));
    let paid_list = join_ids(BOOK_PAIDS.iter().map(|p| p.to_string()));

    format!(
        "{{A_CL: currentLines(paid: [{paid_list}], eid: [{eid_list}], mtid: [{mtid_list}]) \
         A_OL: openingLines(paid: {OPENER_PAID}, eid: [{eid_list}], mtid: [{mtid_list}]) \
         A_CO: consensus(eid: [{eid_list}], mtid: [{mtid_list}]) \
         {{ eid mtid boid partid sbid paid lineid adj ap wag perc vol tvol sequence tim }}}}"
    )
}

fn join_ids(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(",")
}

/// Issue a GET with bounded retry. Transport errors and 5xx responses are
/// retried with exponential backoff; any other non-2xx status fails
/// immediately with the upstream status and body attached.
pub(crate) async fn get_text_with_retry<F>(build: F, what: &str) -> Result<String>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        attempt += 1;

        let detail = match build().send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) if status.is_success() => return Ok(body),
                    Ok(body) if status.is_server_error() => {
                        format!("{what} returned {status}: {body}")
                    }
                    Ok(body) => {
                        return Err(IngestError::Fetch(format!(
                            "{what} returned {status}: {body}"
                        )))
                    }
                    Err(e) => format!("{what} body read failed: {e}"),
                }
            }
            Err(e) => format!("{what} request failed: {e}"),
        };

        if attempt >= MAX_ATTEMPTS {
            return Err(IngestError::Fetch(format!(
                "{detail} (after {MAX_ATTEMPTS} attempts)"
            )));
        }
        warn!("{detail}; retrying (attempt {attempt}/{MAX_ATTEMPTS})");
        tokio::time::sleep(Duration::from_millis(
            BACKOFF_BASE_MS * 2u64.pow(attempt - 1),
        ))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_codes_round_trip() {
        for market in [Market::Moneyline, Market::Spread, Market::Total] {
            assert_eq!(Market::from_code(market.code()), Some(market));
        }
        assert_eq!(Market::from_code(999), None);
    }

    #[test]
    fn query_names_all_three_aliases() {
        let query = build_query(&[4_675_301, 4_675_302], &[Market::Spread, Market::Moneyline]);
        assert!(query.contains("A_CL: currentLines(paid: [8,9,10,123,44,29,16,130,54,82,36,20,127,28,84], eid: [4675301,4675302], mtid: [401,83])"));
        assert!(query.contains("A_OL: openingLines(paid: 8, eid: [4675301,4675302], mtid: [401,83])"));
        assert!(query.contains("A_CO: consensus(eid: [4675301,4675302], mtid: [401,83])"));
    }

    #[test]
    fn payload_parses_with_missing_arrays_defaulted() {
        let body = r#"{"data": {"A_CL": [
            {"eid": 1, "mtid": 401, "partid": 1531, "paid": 9, "adj": -3.5, "ap": -110}
        ]}}"#;
        let parsed: OddsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.current.len(), 1);
        assert!(parsed.data.opening.is_empty());
        assert_eq!(parsed.data.current[0].adj, Some(-3.5));
    }

    #[test]
    fn payload_without_data_object_is_rejected() {
        let parsed: std::result::Result<OddsResponse, _> =
            serde_json::from_str(r#"{"errors": ["nope"]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn retry_gives_up_with_a_fetch_error() {
        let client = reqwest::Client::new();
        // Port 9 (discard) refuses the connection on every attempt.
        let err = tokio_test::block_on(get_text_with_retry(
            || client.get("http://127.0.0.1:9/"),
            "unreachable endpoint",
        ))
        .unwrap_err();
        match err {
            IngestError::Fetch(detail) => assert!(detail.contains("attempts")),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
