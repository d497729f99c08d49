//! Reconciliation of listing metadata with wide odds rows.
//!
//! The two sources identify teams differently: the listing page by display
//! label (mapped to a participant id through the alias table) and the odds
//! service by participant id directly. The primary join key is
//! (event id, participant id). Markets whose records carry synthetic
//! participant ids (the totals market encodes its over/under sides with
//! ids outside the team roster) fall back to pairing by position within
//! the event.
//!
//! Unmatched listing rows are kept with empty odds cells; unmatched odds
//! rows are dropped, since they cannot be labeled with a team or game.
//! Both counts are reported alongside the rows and logged.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::extract::GameMeta;
use crate::reshape::{OddsColumn, WideOddsRow};
use crate::teams::TeamTable;

/// One team's final row: listing metadata joined with its odds cells.
/// The listing side's team label is authoritative; the odds side's name
/// (reconstructed from the id map) can lag behind a franchise relocation.
#[derive(Debug, Clone)]
pub struct MergedRow {
    pub meta: GameMeta,
    /// Empty when no odds row matched; the row is emitted anyway.
    pub cells: BTreeMap<OddsColumn, f64>,
}

/// Reconciliation outcome counts, returned alongside the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Listing rows that joined to no odds row (emitted with empty cells).
    pub unmatched_meta: usize,
    /// Odds rows that joined to no listing row (dropped).
    pub unmatched_odds: usize,
    /// Listing rows that violate the two-rows-per-event pairing.
    pub unpaired_rows: usize,
}

/// Join listing rows against wide odds rows, preserving scrape order.
pub fn merge(
    meta: Vec<GameMeta>,
    wide: Vec<WideOddsRow>,
    teams: &TeamTable,
) -> (Vec<MergedRow>, ReconcileReport) {
    let mut exact: HashMap<(u64, u64), usize> = HashMap::new();
    let mut synthetic: HashMap<u64, Vec<usize>> = HashMap::new();
    for (i, row) in wide.iter().enumerate() {
        if teams.is_roster_id(row.partid) {
            exact.insert((row.eid, row.partid), i);
        } else {
            synthetic.entry(row.eid).or_default().push(i);
        }
    }
    for indices in synthetic.values_mut() {
        indices.sort_by_key(|&i| wide[i].partid);
    }

    let mut report = ReconcileReport {
        unpaired_rows: audit_pairing(&meta),
        ..ReconcileReport::default()
    };

    let mut consumed = vec![false; wide.len()];
    let mut position_in_event: HashMap<u64, usize> = HashMap::new();
    let mut rows = Vec::with_capacity(meta.len());

    for m in meta {
        let mut cells: BTreeMap<OddsColumn, f64> = BTreeMap::new();

        if let (Some(eid), Some(partid)) = (m.eid, m.partid) {
            if let Some(&i) = exact.get(&(eid, partid)) {
                consumed[i] = true;
                cells.extend(wide[i].cells.iter().map(|(k, v)| (*k, *v)));
            }
        }

        // Synthetic-participant rows pair by position: nth listing row of
        // the event takes the nth synthetic row, ascending by partid.
        if let Some(eid) = m.eid {
            let counter = position_in_event.entry(eid).or_insert(0);
            let position = *counter;
            *counter += 1;

            if let Some(&i) = synthetic.get(&eid).and_then(|idxs| idxs.get(position)) {
                consumed[i] = true;
                cells.extend(wide[i].cells.iter().map(|(k, v)| (*k, *v)));
            }
        }

        if cells.is_empty() {
            report.unmatched_meta += 1;
        }
        rows.push(MergedRow { meta: m, cells });
    }

    for (i, row) in wide.iter().enumerate() {
        if !consumed[i] {
            report.unmatched_odds += 1;
            debug!(
                "dropping odds row with no identifier match: eid={} partid={} ({})",
                row.eid,
                row.partid,
                teams.display_name(row.partid).unwrap_or("not on roster")
            );
        }
    }

    if report.unmatched_meta > 0 {
        warn!(
            "{} listing rows joined to no odds row (emitted with empty odds)",
            report.unmatched_meta
        );
    }
    if report.unmatched_odds > 0 {
        warn!("{} odds rows dropped with no identifier match", report.unmatched_odds);
    }

    (rows, report)
}

/// Verify the two-consecutive-rows-per-event invariant. Violations are
/// counted and logged, never silently truncated.
fn audit_pairing(meta: &[GameMeta]) -> usize {
    let mut unpaired = 0;
    for pair in meta.chunks(2) {
        match pair {
            [a, b] => {
                if a.eid != b.eid {
                    warn!(
                        "participant rows {:?}/{:?} do not share an event id ({:?} vs {:?})",
                        a.team, b.team, a.eid, b.eid
                    );
                    unpaired += 2;
                }
            }
            _ => {
                warn!("listing page produced an odd number of participant rows");
                unpaired += 1;
            }
        }
    }
    unpaired
}
