use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::{Country, EducationLevel, ExperienceBand, VisaStatus};

/// Every administrative step the engine knows about, resolved from the
/// catalog JSON into a closed enum at load time so downstream code matches
/// exhaustively instead of probing string ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageId {
    // Status track
    H1bLottery,
    H1b,
    H1bExtension,
    Tn,
    TnRenewal,
    O1,
    L1,
    F1Opt,
    StemOpt,
    // Green-card track
    Pwd,
    Perm,
    I140,
    I130,
    I526,
    PdWait,
    I485,
    GreenCard,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageId::H1bLottery => "h1bLottery",
            StageId::H1b => "h1b",
            StageId::H1bExtension => "h1bExtension",
            StageId::Tn => "tn",
            StageId::TnRenewal => "tnRenewal",
            StageId::O1 => "o1",
            StageId::L1 => "l1",
            StageId::F1Opt => "f1Opt",
            StageId::StemOpt => "stemOpt",
            StageId::Pwd => "pwd",
            StageId::Perm => "perm",
            StageId::I140 => "i140",
            StageId::I130 => "i130",
            StageId::I526 => "i526",
            StageId::PdWait => "pdWait",
            StageId::I485 => "i485",
            StageId::GreenCard => "greenCard",
        };
        f.write_str(name)
    }
}

/// The two parallel timelines a path is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Track {
    Status,
    GreenCard,
}

/// Green-card preference category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GcCategory {
    Eb1,
    Eb2,
    Eb3,
    Eb5,
    FamilyImmediate,
}

impl fmt::Display for GcCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GcCategory::Eb1 => "EB-1",
            GcCategory::Eb2 => "EB-2",
            GcCategory::Eb3 => "EB-3",
            GcCategory::Eb5 => "EB-5",
            GcCategory::FamilyImmediate => "family (immediate relative)",
        };
        f.write_str(name)
    }
}

/// Raw min/max months pair as it appears in the catalog JSON. The resolver
/// turns this into a validated `DurationRange`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackMonths {
    pub min: f64,
    pub max: f64,
}

/// Static description of one administrative step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDef {
    pub id: StageId,
    pub name: String,
    pub track: Track,
    /// Typical processing range used when live data is missing or stale.
    pub fallback_months: FallbackMonths,
    #[serde(default)]
    pub cost_usd: u32,
    /// Whether filing this stage sets the applicant's place in the queue.
    #[serde(default)]
    pub establishes_priority_date: bool,
    #[serde(default)]
    pub premium_available: bool,
    /// Marks the priority-date queue-wait pseudo-stage, whose duration is
    /// produced by the velocity model rather than the duration resolver.
    #[serde(default)]
    pub queue_wait: bool,
}

/// A stage as referenced from a pathway template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub id: StageId,
    /// Runs alongside the previous stage instead of after it.
    #[serde(default)]
    pub concurrent: bool,
}

/// One legally distinct route to a green card.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayTemplate {
    pub id: String,
    pub name: String,
    pub category: GcCategory,
    pub stages: Vec<StageRef>,
    #[serde(default)]
    pub self_petitioned: bool,
    #[serde(default)]
    pub lottery: bool,
    /// Status-track stage whose completion gates the start of the
    /// green-card track (e.g. the H-1B lottery for students).
    #[serde(default)]
    pub gc_after_status: Option<StageId>,
    pub eligibility: Condition,
}

/// Profile flags a condition can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    ExtraordinaryAbility,
    OutstandingResearcher,
    ExecutiveManager,
    MarriedToCitizen,
    InvestmentCapital,
    Stem,
}

/// Eligibility condition tree. Both variants carry only optional fields, so
/// deserialization keys off the compound combinators (`all`/`any`/`not`)
/// first, the same way rule match conditions distinguish themselves.
#[derive(Debug, Clone, Serialize)]
pub enum Condition {
    Simple(SimpleCondition),
    Compound(CompoundCondition),
}

impl<'de> serde::Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde_json::Value;

        let value = Value::deserialize(deserializer)?;

        if let Value::Object(map) = &value {
            if map.contains_key("all") || map.contains_key("any") || map.contains_key("not") {
                let compound: CompoundCondition = serde_json::from_value(value)
                    .map_err(|e| D::Error::custom(format!("Invalid compound condition: {}", e)))?;
                return Ok(Condition::Compound(compound));
            }
            let simple: SimpleCondition = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("Invalid simple condition: {}", e)))?;
            return Ok(Condition::Simple(simple));
        }

        Err(D::Error::custom("Condition must be an object"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundCondition {
    #[serde(default)]
    pub all: Option<Vec<Condition>>,
    #[serde(default)]
    pub any: Option<Vec<Condition>>,
    #[serde(default)]
    pub not: Option<Box<Condition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleCondition {
    #[serde(default)]
    pub status_in: Option<Vec<VisaStatus>>,
    #[serde(default)]
    pub education_at_least: Option<EducationLevel>,
    #[serde(default)]
    pub experience_at_least: Option<ExperienceBand>,
    #[serde(default)]
    pub country_of_birth_in: Option<Vec<Country>>,
    /// Judged on the citizenship override when present, else on country of
    /// birth (treaty eligibility).
    #[serde(default)]
    pub citizenship_in: Option<Vec<Country>>,
    #[serde(default)]
    pub has_flag: Option<Flag>,
}

/// The loaded, validated reference catalog: stage definitions plus pathway
/// templates. Immutable after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    stages: BTreeMap<StageId, StageDef>,
    pathways: Vec<PathwayTemplate>,
}

impl Catalog {
    pub(crate) fn new(stages: BTreeMap<StageId, StageDef>, pathways: Vec<PathwayTemplate>) -> Self {
        Self { stages, pathways }
    }

    /// Definition for a stage id. The loader guarantees every referenced
    /// stage has a definition.
    pub fn stage(&self, id: StageId) -> &StageDef {
        self.stages
            .get(&id)
            .expect("stage references validated at catalog load")
    }

    pub fn stage_opt(&self, id: StageId) -> Option<&StageDef> {
        self.stages.get(&id)
    }

    pub fn pathways(&self) -> &[PathwayTemplate] {
        &self.pathways
    }
}

/// Raw JSON document shape prior to semantic validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCatalog {
    pub version: String,
    pub stages: Vec<StageDef>,
    pub pathways: Vec<PathwayTemplate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_deserialize_simple() {
        let json = r#"{ "educationAtLeast": "masters" }"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        match cond {
            Condition::Simple(simple) => {
                assert_eq!(simple.education_at_least, Some(EducationLevel::Masters));
            }
            Condition::Compound(_) => panic!("expected simple condition"),
        }
    }

    #[test]
    fn test_condition_deserialize_compound() {
        let json = r#"{ "any": [ { "hasFlag": "stem" }, { "educationAtLeast": "doctorate" } ] }"#;
        let cond: Condition = serde_json::from_str(json).unwrap();
        match cond {
            Condition::Compound(compound) => {
                assert_eq!(compound.any.as_ref().map(Vec::len), Some(2));
            }
            Condition::Simple(_) => panic!("expected compound condition"),
        }
    }

    #[test]
    fn test_condition_rejects_non_object() {
        let result: Result<Condition, _> = serde_json::from_str("\"masters\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_stage_id_display_matches_serde() {
        let json = serde_json::to_string(&StageId::H1bLottery).unwrap();
        assert_eq!(json, format!("\"{}\"", StageId::H1bLottery));
    }
}
