use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::GcCategory;
use crate::timeutil::parse_date_lenient;

/// Visa-bulletin chargeability area. The four oversubscribed countries are
/// listed separately; everything else shares the rest-of-world column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Chargeability {
    India,
    China,
    Mexico,
    Philippines,
    RestOfWorld,
}

impl Chargeability {
    /// Number of separately-capped chargeability areas, used when sizing
    /// the rest-of-world residual.
    pub const CAPPED_AREAS: usize = 4;
}

impl fmt::Display for Chargeability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chargeability::India => "India",
            Chargeability::China => "China (mainland)",
            Chargeability::Mexico => "Mexico",
            Chargeability::Philippines => "Philippines",
            Chargeability::RestOfWorld => "all other countries",
        };
        f.write_str(name)
    }
}

/// One cell of a bulletin table: either the literal "Current" or a cutoff
/// date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    Current,
    Date(NaiveDate),
}

impl Cutoff {
    /// Whether a priority date may proceed under this cutoff. A date at or
    /// before the cutoff is current.
    pub fn reached(&self, priority_date: NaiveDate) -> bool {
        match self {
            Cutoff::Current => true,
            Cutoff::Date(cutoff) => priority_date <= *cutoff,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Cutoff::Current => None,
            Cutoff::Date(d) => Some(*d),
        }
    }

    /// Lenient cell parser: "Current"/"C" (any case), ISO dates, or the
    /// bulletin's own `01MAY12` format. Anything else is a missing cell.
    pub fn parse(cell: &str) -> Option<Cutoff> {
        let trimmed = cell.trim();
        if trimmed.eq_ignore_ascii_case("current") || trimmed.eq_ignore_ascii_case("c") {
            return Some(Cutoff::Current);
        }
        parse_date_lenient(trimmed).map(Cutoff::Date)
    }
}

impl Serialize for Cutoff {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Cutoff::Current => serializer.serialize_str("Current"),
            Cutoff::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// One bulletin table (Final Action Dates or Dates for Filing), keyed by
/// category then chargeability. Unparseable cells and unknown keys are
/// dropped at deserialization time, never errors: a sparse table degrades
/// the forecast, not its availability.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct BulletinTable(pub BTreeMap<GcCategory, BTreeMap<Chargeability, Cutoff>>);

impl BulletinTable {
    pub fn cutoff(&self, category: GcCategory, country: Chargeability) -> Option<Cutoff> {
        self.0.get(&category).and_then(|row| row.get(&country)).copied()
    }
}

impl<'de> Deserialize<'de> for BulletinTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: BTreeMap<String, BTreeMap<String, String>> =
            BTreeMap::deserialize(deserializer)?;

        let mut table = BTreeMap::new();
        for (cat_key, row) in raw {
            let category: GcCategory =
                match serde_json::from_value(serde_json::Value::String(cat_key.clone())) {
                    Ok(c) => c,
                    Err(_) => {
                        debug!(category = %cat_key, "skipping unknown bulletin category");
                        continue;
                    }
                };
            let mut cells = BTreeMap::new();
            for (country_key, cell) in row {
                let country: Chargeability =
                    match serde_json::from_value(serde_json::Value::String(country_key.clone())) {
                        Ok(c) => c,
                        Err(_) => {
                            debug!(country = %country_key, "skipping unknown chargeability");
                            continue;
                        }
                    };
                match Cutoff::parse(&cell) {
                    Some(cutoff) => {
                        cells.insert(country, cutoff);
                    }
                    None => {
                        debug!(category = %category, country = %country, cell = %cell,
                               "skipping unparseable bulletin cell");
                    }
                }
            }
            table.insert(category, cells);
        }

        Ok(BulletinTable(table))
    }
}

/// The monthly visa bulletin: Final Action Dates plus the more permissive
/// Dates for Filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisaBulletin {
    #[serde(default)]
    pub final_action: BulletinTable,
    #[serde(default)]
    pub dates_for_filing: BulletinTable,
    /// Bulletin month, e.g. "2026-08", informational only.
    #[serde(default)]
    pub effective_month: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cutoff_parse_variants() {
        assert_eq!(Cutoff::parse("Current"), Some(Cutoff::Current));
        assert_eq!(Cutoff::parse("C"), Some(Cutoff::Current));
        assert_eq!(
            Cutoff::parse("2012-05-01"),
            Some(Cutoff::Date(date(2012, 5, 1)))
        );
        assert_eq!(
            Cutoff::parse("01MAY12"),
            Some(Cutoff::Date(date(2012, 5, 1)))
        );
        assert_eq!(Cutoff::parse("unavailable"), None);
    }

    #[test]
    fn test_cutoff_reached_boundary() {
        let cutoff = Cutoff::Date(date(2012, 5, 1));
        assert!(cutoff.reached(date(2012, 5, 1)));
        assert!(cutoff.reached(date(2012, 4, 30)));
        assert!(!cutoff.reached(date(2012, 5, 2)));
        assert!(Cutoff::Current.reached(date(2030, 1, 1)));
    }

    #[test]
    fn test_table_deserialize_skips_bad_cells() {
        let json = r#"
        {
            "eb2": { "india": "2012-05-01", "china": "Current", "restOfWorld": "???" },
            "notACategory": { "india": "2020-01-01" }
        }
        "#;
        let table: BulletinTable = serde_json::from_str(json).unwrap();
        assert_eq!(
            table.cutoff(GcCategory::Eb2, Chargeability::India),
            Some(Cutoff::Date(date(2012, 5, 1)))
        );
        assert_eq!(
            table.cutoff(GcCategory::Eb2, Chargeability::China),
            Some(Cutoff::Current)
        );
        assert_eq!(
            table.cutoff(GcCategory::Eb2, Chargeability::RestOfWorld),
            None
        );
    }

    #[test]
    fn test_bulletin_defaults_empty() {
        let bulletin: VisaBulletin = serde_json::from_str("{}").unwrap();
        assert!(bulletin
            .final_action
            .cutoff(GcCategory::Eb2, Chargeability::India)
            .is_none());
    }
}
