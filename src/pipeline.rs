//! Week pipeline: extract identifiers, fetch lines, reshape, reconcile.
//!
//! One call per (season, week). The two upstream fetches run in sequence
//! (the odds query needs the event ids the listing page yields) and any
//! stage failure fails the whole week with no partial output. Repeated
//! calls re-fetch everything and, for a completed week, render
//! byte-identical output.

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use tracing::info;

use crate::config::Config;
use crate::csv;
use crate::error::{IngestError, Result};
use crate::extract;
use crate::fetch;
use crate::merge::{self, MergedRow, ReconcileReport};
use crate::reshape::{self, OddsColumn};
use crate::schedule::{self, Slate};
use crate::teams::TeamTable;

/// The final table for one week: a stable identifier/metadata block plus
/// whatever odds columns the batch produced.
#[derive(Debug)]
pub struct WeekTable {
    pub slate: Slate,
    /// Ordered union of odds columns across all rows. Consumers must treat
    /// this set as discoverable, not fixed: it varies with book coverage.
    pub columns: Vec<OddsColumn>,
    pub rows: Vec<MergedRow>,
    pub report: ReconcileReport,
}

impl WeekTable {
    pub fn to_csv(&self) -> String {
        csv::render(&self.columns, &self.rows)
    }
}

/// The four pipeline stages behind one handle, sharing an HTTP client and
/// a politeness rate limit across requests.
pub struct OddsPipeline {
    config: Config,
    http: reqwest::Client,
    limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    teams: TeamTable,
}

impl OddsPipeline {
    pub fn new(config: Config) -> Result<Self> {
        let teams = TeamTable::load()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                IngestError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let quota = NonZeroU32::new(config.requests_per_minute.max(1)).unwrap();
        let limiter = RateLimiter::direct(Quota::per_minute(quota));

        Ok(Self {
            config,
            http,
            limiter,
            teams,
        })
    }

    /// Build the merged odds table for one week.
    pub async fn run_week(&self, season: u16, week: u8) -> Result<WeekTable> {
        let slate = schedule::resolve(season, week)?;

        self.limiter.until_ready().await;
        let meta =
            extract::extract_game_meta(&self.http, &self.config, &self.teams, &slate).await?;
        if meta.is_empty() {
            return Err(IngestError::MalformedResponse(format!(
                "listing page for season {season} week {week} contained no participant rows"
            )));
        }

        let eids: BTreeSet<u64> = meta.iter().filter_map(|m| m.eid).collect();
        if eids.is_empty() {
            return Err(IngestError::MalformedResponse(format!(
                "no event ids could be parsed for season {season} week {week}"
            )));
        }
        let eids: Vec<u64> = eids.into_iter().collect();

        self.limiter.until_ready().await;
        let sets =
            fetch::fetch_lines(&self.http, &self.config, &eids, &self.config.markets).await?;

        let wide = reshape::reshape(&sets, &self.config.markets)?;
        let (rows, report) = merge::merge(meta, wide, &self.teams);

        let columns: Vec<OddsColumn> = rows
            .iter()
            .flat_map(|r| r.cells.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(
            "season {} week {}: {} rows, {} odds columns, {} unmatched listing rows, {} dropped odds rows",
            season,
            slate.label,
            rows.len(),
            columns.len(),
            report.unmatched_meta,
            report.unmatched_odds
        );

        Ok(WeekTable {
            slate,
            columns,
            rows,
            report,
        })
    }
}
