//! Long-to-wide reshaping of line records.
//!
//! The odds service returns one record per (event, participant, book,
//! market, attribute). Downstream wants one row per (event, participant)
//! with a column per (book, market, attribute) combination. The column set
//! is whatever the fetched batch actually contains (a book with no data
//! this week contributes no columns at all), so cells live in an ordered
//! map keyed by a structured column key, and flattening to names happens
//! only at the CSV boundary.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{IngestError, Result};
use crate::fetch::{LineSets, Market};

/// Which of a market's two attributes a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Line,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConsensusKind {
    Percentage,
    Volume,
}

/// Structured column key. The derived ordering fixes the column layout:
/// consensus first, then opening, then per-book cells ascending by book id
/// with line before price. Deterministic for any input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OddsColumn {
    Consensus { market: Market, kind: ConsensusKind },
    Opening { market: Market, attr: Attr },
    Book { market: Market, paid: u32, attr: Attr },
}

impl OddsColumn {
    /// Flattened header name, matching the layout of the historical CSV
    /// datasets: `spr_perc`, `op_spr`, `op_spr_odds`, `9_spr`, `9_spr_odds`,
    /// `9_ml`, ...
    pub fn name(&self) -> String {
        match *self {
            OddsColumn::Consensus { market, kind } => {
                let suffix = match kind {
                    ConsensusKind::Percentage => "perc",
                    ConsensusKind::Volume => "wag",
                };
                format!("{}_{}", market.tag(), suffix)
            }
            OddsColumn::Opening { market, attr } => match (market, attr) {
                (Market::Moneyline, _) => "op_ml_odds".to_string(),
                (market, Attr::Line) => format!("op_{}", market.tag()),
                (market, Attr::Price) => format!("op_{}_odds", market.tag()),
            },
            OddsColumn::Book { market, paid, attr } => match (market, attr) {
                (Market::Moneyline, _) => format!("{paid}_ml"),
                (market, Attr::Line) => format!("{paid}_{}", market.tag()),
                (market, Attr::Price) => format!("{paid}_{}_odds", market.tag()),
            },
        }
    }
}

/// One (event, participant) row of the wide table.
#[derive(Debug, Clone)]
pub struct WideOddsRow {
    pub eid: u64,
    pub partid: u64,
    pub cells: BTreeMap<OddsColumn, f64>,
}

/// Pivot the three result sets into wide rows, outer-joined on
/// (eid, partid). Duplicate records for one cell keep the first seen,
/// matching the first-wins reduction the historical datasets were built
/// with. Fails if the current-lines array is empty: without current lines
/// the week has no betting content and no partial result is emitted.
pub fn reshape(sets: &LineSets, markets: &[Market]) -> Result<Vec<WideOddsRow>> {
    if sets.current.is_empty() {
        return Err(IngestError::MalformedResponse(
            "current lines array is empty".to_string(),
        ));
    }

    let mut rows: BTreeMap<(u64, u64), BTreeMap<OddsColumn, f64>> = BTreeMap::new();

    for rec in &sets.current {
        let Some(market) = requested_market(rec.mtid, markets) else {
            continue;
        };
        let cells = rows.entry((rec.eid, rec.partid)).or_default();
        if market.has_line() {
            if let Some(line) = line_value(rec.adj, rec.ap) {
                cells
                    .entry(OddsColumn::Book {
                        market,
                        paid: rec.paid,
                        attr: Attr::Line,
                    })
                    .or_insert(line);
            }
        }
        if let Some(price) = rec.ap {
            cells
                .entry(OddsColumn::Book {
                    market,
                    paid: rec.paid,
                    attr: Attr::Price,
                })
                .or_insert(price);
        }
    }

    // Opening lines come from the single reference book, so there is no
    // per-book pivot on this set.
    for rec in &sets.opening {
        let Some(market) = requested_market(rec.mtid, markets) else {
            continue;
        };
        let cells = rows.entry((rec.eid, rec.partid)).or_default();
        if market.has_line() {
            if let Some(line) = line_value(rec.adj, rec.ap) {
                cells
                    .entry(OddsColumn::Opening {
                        market,
                        attr: Attr::Line,
                    })
                    .or_insert(line);
            }
        }
        if let Some(price) = rec.ap {
            cells
                .entry(OddsColumn::Opening {
                    market,
                    attr: Attr::Price,
                })
                .or_insert(price);
        }
    }

    for rec in &sets.consensus {
        let Some(market) = requested_market(rec.mtid, markets) else {
            continue;
        };
        let cells = rows.entry((rec.eid, rec.partid)).or_default();
        if let Some(perc) = rec.perc {
            cells
                .entry(OddsColumn::Consensus {
                    market,
                    kind: ConsensusKind::Percentage,
                })
                .or_insert(perc);
        }
        if let Some(wag) = rec.wag {
            cells
                .entry(OddsColumn::Consensus {
                    market,
                    kind: ConsensusKind::Volume,
                })
                .or_insert(wag);
        }
    }

    let out: Vec<WideOddsRow> = rows
        .into_iter()
        .map(|((eid, partid), cells)| WideOddsRow { eid, partid, cells })
        .collect();

    info!(
        "reshaped {} current line records into {} wide rows",
        sets.current.len(),
        out.len()
    );
    Ok(out)
}

fn requested_market(mtid: u16, markets: &[Market]) -> Option<Market> {
    Market::from_code(mtid).filter(|m| markets.contains(m))
}

/// A priced record with no line value is a pick'em: the site omits the
/// adjust rather than rendering 0.
fn line_value(adj: Option<f64>, ap: Option<f64>) -> Option<f64> {
    adj.or_else(|| ap.map(|_| 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::LineRecord;

    fn current(eid: u64, partid: u64, mtid: u16, paid: u32, adj: Option<f64>, ap: Option<f64>) -> LineRecord {
        LineRecord {
            eid,
            mtid,
            partid,
            paid,
            adj,
            ap,
            ..LineRecord::default()
        }
    }

    fn consensus(eid: u64, partid: u64, mtid: u16, perc: f64, wag: f64) -> LineRecord {
        LineRecord {
            eid,
            mtid,
            partid,
            perc: Some(perc),
            wag: Some(wag),
            ..LineRecord::default()
        }
    }

    #[test]
    fn spread_books_get_line_and_price_columns() {
        let sets = LineSets {
            current: vec![
                current(1, 1531, 401, 9, Some(-3.5), Some(-110.0)),
                current(1, 1531, 401, 44, Some(-3.0), Some(-115.0)),
            ],
            ..LineSets::default()
        };

        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        assert_eq!(rows.len(), 1);
        let names: Vec<String> = rows[0].cells.keys().map(|c| c.name()).collect();
        assert_eq!(names, vec!["9_spr", "9_spr_odds", "44_spr", "44_spr_odds"]);
    }

    #[test]
    fn absent_book_contributes_no_columns() {
        let sets = LineSets {
            current: vec![current(1, 1531, 401, 9, Some(-3.5), Some(-110.0))],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        assert!(rows[0]
            .cells
            .keys()
            .all(|c| !matches!(c, OddsColumn::Book { paid: 44, .. })));
    }

    #[test]
    fn moneyline_carries_price_only() {
        let sets = LineSets {
            current: vec![current(1, 1531, 83, 9, Some(-3.5), Some(150.0))],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Moneyline]).unwrap();
        let names: Vec<String> = rows[0].cells.keys().map(|c| c.name()).collect();
        assert_eq!(names, vec!["9_ml"]);
    }

    #[test]
    fn pickem_spread_with_price_gets_zero_line() {
        let sets = LineSets {
            current: vec![current(1, 1531, 401, 9, None, Some(-105.0))],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        assert_eq!(
            rows[0].cells.get(&OddsColumn::Book {
                market: Market::Spread,
                paid: 9,
                attr: Attr::Line
            }),
            Some(&0.0)
        );
    }

    #[test]
    fn participant_without_opening_line_still_appears() {
        let sets = LineSets {
            current: vec![
                current(1, 1531, 401, 9, Some(-3.5), Some(-110.0)),
                current(1, 75380, 401, 9, Some(3.5), Some(-110.0)),
            ],
            opening: vec![current(1, 1531, 401, 8, Some(-3.0), Some(-110.0))],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        assert_eq!(rows.len(), 2);
        let opener_col = OddsColumn::Opening {
            market: Market::Spread,
            attr: Attr::Line,
        };
        assert_eq!(rows[0].cells.get(&opener_col), Some(&-3.0));
        assert_eq!(rows[1].cells.get(&opener_col), None);
    }

    #[test]
    fn duplicate_consensus_records_keep_the_first() {
        let sets = LineSets {
            current: vec![current(1, 1531, 401, 9, Some(-3.5), Some(-110.0))],
            consensus: vec![
                consensus(1, 1531, 401, 61.0, 1400.0),
                consensus(1, 1531, 401, 59.0, 1300.0),
            ],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        assert_eq!(
            rows[0].cells.get(&OddsColumn::Consensus {
                market: Market::Spread,
                kind: ConsensusKind::Percentage
            }),
            Some(&61.0)
        );
    }

    #[test]
    fn unrequested_markets_are_filtered_out() {
        let sets = LineSets {
            current: vec![
                current(1, 1531, 401, 9, Some(-3.5), Some(-110.0)),
                current(1, 1531, 83, 9, None, Some(150.0)),
            ],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread]).unwrap();
        let names: Vec<String> = rows[0].cells.keys().map(|c| c.name()).collect();
        assert_eq!(names, vec!["9_spr", "9_spr_odds"]);
    }

    #[test]
    fn empty_current_lines_fail_the_week() {
        let sets = LineSets::default();
        let err = reshape(&sets, &[Market::Spread]).unwrap_err();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
    }

    #[test]
    fn column_order_is_consensus_then_opening_then_books() {
        let sets = LineSets {
            current: vec![
                current(1, 1531, 401, 44, Some(-3.0), Some(-115.0)),
                current(1, 1531, 401, 9, Some(-3.5), Some(-110.0)),
                current(1, 1531, 83, 9, None, Some(160.0)),
            ],
            opening: vec![current(1, 1531, 401, 8, Some(-3.0), Some(-110.0))],
            consensus: vec![consensus(1, 1531, 401, 61.0, 1400.0)],
            ..LineSets::default()
        };
        let rows = reshape(&sets, &[Market::Spread, Market::Moneyline]).unwrap();
        let names: Vec<String> = rows[0].cells.keys().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "spr_perc",
                "spr_wag",
                "op_spr",
                "op_spr_odds",
                "9_ml",
                "9_spr",
                "9_spr_odds",
                "44_spr",
                "44_spr_odds",
            ]
        );
    }
}
