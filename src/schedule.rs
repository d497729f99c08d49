//! Static season/week lookup tables for the odds site.
//!
//! The site keys everything by an internal season id (`seid`) and an event
//! group id (`egid`, one per week). Both are opaque and change every year,
//! so the mappings are versioned here alongside the code and must be
//! extended when a new season appears upstream.

use crate::error::{IngestError, Result};

/// Internal season ids by year.
const SEASON_IDS: &[(u16, u32)] = &[
    (2018, 4494),
    (2019, 5703),
    (2020, 8582),
    (2021, 29178),
    (2022, 38109),
    (2023, 38292),
    (2024, 42499),
    (2025, 59654),
];

/// Event group id for week 18 in the 17-game era (2021 onward). The site
/// grafted this week on with an out-of-band id instead of extending the
/// 9 + week sequence.
const WEEK_18_EGID: u32 = 33573;

/// Event group ids for the four postseason slots, in order:
/// Wild Card, Divisional, Conference, Super Bowl.
const POSTSEASON_EGIDS: [u32; 4] = [28, 29, 30, 31];

/// A resolved (season, week) request: the query identifiers plus the label
/// the site renders for that week ("4", "18", "Wild Card", ...).
#[derive(Debug, Clone)]
pub struct Slate {
    pub season: u16,
    pub week: u8,
    pub seid: u32,
    pub egid: u32,
    pub label: String,
}

/// Resolve a (season, week) pair to the site's internal identifiers.
///
/// Regular season weeks are 1..=17 (1..=18 from 2021), followed by the four
/// postseason slots. Anything outside the mapped range is a configuration
/// error, surfaced immediately and never retried.
pub fn resolve(season: u16, week: u8) -> Result<Slate> {
    let seid = SEASON_IDS
        .iter()
        .find(|(year, _)| *year == season)
        .map(|(_, id)| *id)
        .ok_or_else(|| {
            IngestError::Configuration(format!("no season id mapped for {season}"))
        })?;

    let egid = egid_for(season, week).ok_or_else(|| {
        IngestError::Configuration(format!(
            "week {week} is outside the mapped range for season {season}"
        ))
    })?;

    Ok(Slate {
        season,
        week,
        seid,
        egid,
        label: week_label(egid),
    })
}

fn egid_for(season: u16, week: u8) -> Option<u32> {
    // Weeks 1..=17 follow a fixed offset in every season.
    if (1..=17).contains(&week) {
        return Some(9 + week as u32);
    }
    if season >= 2021 && week == 18 {
        return Some(WEEK_18_EGID);
    }
    let first_postseason_week = if season >= 2021 { 19 } else { 18 };
    let slot = week.checked_sub(first_postseason_week)? as usize;
    POSTSEASON_EGIDS.get(slot).copied()
}

/// Display label for a week, as rendered by the site.
pub fn week_label(egid: u32) -> String {
    match egid {
        28 => "Wild Card".to_string(),
        29 => "Divisional".to_string(),
        30 => "Conference".to_string(),
        31 => "Super Bowl".to_string(),
        WEEK_18_EGID => "18".to_string(),
        other => (other - 9).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_season_weeks_use_fixed_offset() {
        let slate = resolve(2018, 1).unwrap();
        assert_eq!(slate.seid, 4494);
        assert_eq!(slate.egid, 10);
        assert_eq!(slate.label, "1");

        let slate = resolve(2023, 17).unwrap();
        assert_eq!(slate.egid, 26);
        assert_eq!(slate.label, "17");
    }

    #[test]
    fn week_18_exists_only_from_2021() {
        let slate = resolve(2021, 18).unwrap();
        assert_eq!(slate.egid, WEEK_18_EGID);
        assert_eq!(slate.label, "18");

        // In the 16-game era week 18 is the Wild Card round.
        let slate = resolve(2019, 18).unwrap();
        assert_eq!(slate.egid, 28);
        assert_eq!(slate.label, "Wild Card");
    }

    #[test]
    fn postseason_slots_shift_with_the_17_game_era() {
        assert_eq!(resolve(2020, 21).unwrap().label, "Super Bowl");
        assert_eq!(resolve(2022, 19).unwrap().label, "Wild Card");
        assert_eq!(resolve(2022, 22).unwrap().label, "Super Bowl");
    }

    #[test]
    fn unknown_season_is_a_configuration_error() {
        let err = resolve(2016, 1).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn out_of_range_week_is_a_configuration_error() {
        assert!(resolve(2019, 0).is_err());
        assert!(resolve(2019, 22).is_err());
        assert!(resolve(2022, 23).is_err());
    }
}
