//! Team name resolution.
//!
//! The listing page and the odds API disagree about team identity: the page
//! renders display labels ("Kansas City", "N.Y. Jets"), the API speaks
//! participant ids. The alias table below maps every label the site has
//! used to one participant id; a relocated franchise keeps its id under
//! both city names, so historical seasons resolve consistently.

use std::collections::HashMap;

use crate::error::{IngestError, Result};

/// Alias → participant id. Keys are upper-cased forms of the labels the
/// listing page renders. OAKLAND and LAS VEGAS are the same franchise.
const ALIASES: &[(&str, u64)] = &[
    ("CAROLINA", 1545),
    ("DALLAS", 1538),
    ("L.A. RAMS", 1550),
    ("PITTSBURGH", 1519),
    ("CLEVELAND", 1520),
    ("BALTIMORE", 1521),
    ("CINCINNATI", 1522),
    ("N.Y. JETS", 1523),
    ("MIAMI", 1524),
    ("NEW ENGLAND", 1525),
    ("BUFFALO", 1526),
    ("INDIANAPOLIS", 1527),
    ("TENNESSEE", 1528),
    ("JACKSONVILLE", 1529),
    ("HOUSTON", 1530),
    ("KANSAS CITY", 1531),
    ("OAKLAND", 1533),
    ("LAS VEGAS", 1533),
    ("DENVER", 1534),
    ("N.Y. GIANTS", 1535),
    ("PHILADELPHIA", 1536),
    ("WASHINGTON", 1537),
    ("DETROIT", 1539),
    ("CHICAGO", 1540),
    ("MINNESOTA", 1541),
    ("GREEN BAY", 1542),
    ("NEW ORLEANS", 1543),
    ("TAMPA BAY", 1544),
    ("ATLANTA", 1546),
    ("SAN FRANCISCO", 1547),
    ("SEATTLE", 1548),
    ("ARIZONA", 1549),
    ("L.A. CHARGERS", 75380),
];

/// Participant id → current display name, for the odds side of the merge.
/// The listing page's label stays authoritative where both are present;
/// this map can lag behind a relocation.
const DISPLAY_NAMES: &[(u64, &str)] = &[
    (1519, "Pittsburgh"),
    (1520, "Cleveland"),
    (1521, "Baltimore"),
    (1522, "Cincinnati"),
    (1523, "N.Y. Jets"),
    (1524, "Miami"),
    (1525, "New England"),
    (1526, "Buffalo"),
    (1527, "Indianapolis"),
    (1528, "Tennessee"),
    (1529, "Jacksonville"),
    (1530, "Houston"),
    (1531, "Kansas City"),
    (1533, "Las Vegas"),
    (1534, "Denver"),
    (1535, "N.Y. Giants"),
    (1536, "Philadelphia"),
    (1537, "Washington"),
    (1538, "Dallas"),
    (1539, "Detroit"),
    (1540, "Chicago"),
    (1541, "Minnesota"),
    (1542, "Green Bay"),
    (1543, "New Orleans"),
    (1544, "Tampa Bay"),
    (1545, "Carolina"),
    (1546, "Atlanta"),
    (1547, "San Francisco"),
    (1548, "Seattle"),
    (1549, "Arizona"),
    (1550, "L.A. Rams"),
    (75380, "L.A. Chargers"),
];

/// Validated two-way team lookup, built once per service.
#[derive(Debug, Clone)]
pub struct TeamTable {
    alias_to_id: HashMap<String, u64>,
    id_to_name: HashMap<u64, &'static str>,
}

impl TeamTable {
    /// Build the table. An alias mapping to two different ids is a
    /// load-time configuration error, never a silent override.
    pub fn load() -> Result<Self> {
        let mut alias_to_id = HashMap::with_capacity(ALIASES.len());
        for (alias, id) in ALIASES {
            let key = normalize(alias);
            if let Some(existing) = alias_to_id.insert(key, *id) {
                if existing != *id {
                    return Err(IngestError::Configuration(format!(
                        "team alias {alias:?} maps to both {existing} and {id}"
                    )));
                }
            }
        }

        let mut id_to_name = HashMap::with_capacity(DISPLAY_NAMES.len());
        for (id, name) in DISPLAY_NAMES {
            id_to_name.insert(*id, *name);
        }

        Ok(Self {
            alias_to_id,
            id_to_name,
        })
    }

    /// Resolve a scraped team label to a participant id. Labels are matched
    /// case-insensitively after trimming; spelling drift beyond that is not
    /// corrected and yields None.
    pub fn participant_id(&self, label: &str) -> Option<u64> {
        self.alias_to_id.get(&normalize(label)).copied()
    }

    /// Current display name for a participant id.
    pub fn display_name(&self, id: u64) -> Option<&'static str> {
        self.id_to_name.get(&id).copied()
    }

    /// Whether an id belongs to the real team roster. The totals market
    /// encodes its over/under sides with ids outside this set.
    pub fn is_roster_id(&self, id: u64) -> bool {
        self.id_to_name.contains_key(&id)
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_loads_and_covers_the_roster() {
        let table = TeamTable::load().unwrap();
        assert_eq!(table.participant_id("Kansas City"), Some(1531));
        assert_eq!(table.participant_id("  n.y. jets "), Some(1523));
        assert_eq!(table.display_name(1550), Some("L.A. Rams"));
    }

    #[test]
    fn relocated_franchise_resolves_to_one_id() {
        let table = TeamTable::load().unwrap();
        assert_eq!(table.participant_id("Oakland"), Some(1533));
        assert_eq!(table.participant_id("Las Vegas"), Some(1533));
    }

    #[test]
    fn unknown_label_yields_none() {
        let table = TeamTable::load().unwrap();
        assert_eq!(table.participant_id("London"), None);
    }

    #[test]
    fn synthetic_ids_are_not_roster_ids() {
        let table = TeamTable::load().unwrap();
        assert!(table.is_roster_id(1533));
        assert!(!table.is_roster_id(9_000_001));
    }
}
