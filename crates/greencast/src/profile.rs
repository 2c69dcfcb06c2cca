//! The user's immigration-relevant attributes.
//!
//! A [`Profile`] is owned and persisted by the caller; the engine only ever
//! reads it. Every field is a closed enum so eligibility predicates can
//! match exhaustively instead of probing loosely-typed records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::GcCategory;
use crate::feeds::Chargeability;

/// Current nonimmigrant status (or the absence of one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisaStatus {
    H1b,
    L1,
    Tn,
    O1,
    E3,
    F1Opt,
    NoStatus,
}

/// Highest completed education level, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EducationLevel {
    HighSchool,
    Bachelors,
    Masters,
    Doctorate,
}

/// Years of professional experience, bucketed the way intake forms ask for
/// it, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceBand {
    #[serde(rename = "0to2")]
    LessThanTwo,
    #[serde(rename = "2to5")]
    TwoToFive,
    #[serde(rename = "5to10")]
    FiveToTen,
    #[serde(rename = "10plus")]
    TenPlus,
}

/// Country of birth (or of citizenship, for the treaty override). Only the
/// chargeability-relevant and treaty-relevant countries are distinguished;
/// everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Country {
    India,
    China,
    Mexico,
    Philippines,
    Canada,
    Other,
}

impl Country {
    /// The visa-bulletin chargeability area this country falls under.
    pub fn chargeability(self) -> Chargeability {
        match self {
            Country::India => Chargeability::India,
            Country::China => Chargeability::China,
            Country::Mexico => Chargeability::Mexico,
            Country::Philippines => Chargeability::Philippines,
            Country::Canada | Country::Other => Chargeability::RestOfWorld,
        }
    }
}

/// Special-circumstance flags that unlock specific pathway templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialFlags {
    pub extraordinary_ability: bool,
    pub outstanding_researcher: bool,
    pub executive_manager: bool,
    pub married_to_citizen: bool,
    pub investment_capital: bool,
    pub is_stem: bool,
}

/// A priority date carried over from an earlier case. Porting keeps the
/// person's place in the queue even when the category changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorCase {
    pub priority_date: NaiveDate,
    pub category: GcCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub status: VisaStatus,
    pub education: EducationLevel,
    pub experience: ExperienceBand,
    pub country_of_birth: Country,
    /// Treaty-based eligibility is judged on citizenship when it differs
    /// from the country of birth.
    #[serde(default)]
    pub citizenship: Option<Country>,
    #[serde(default)]
    pub flags: SpecialFlags,
    #[serde(default)]
    pub prior_case: Option<PriorCase>,
}

impl Profile {
    /// Effective citizenship: the explicit override, else country of birth.
    pub fn citizenship(&self) -> Country {
        self.citizenship.unwrap_or(self.country_of_birth)
    }

    /// Bulletin chargeability is always judged on country of birth.
    pub fn chargeability(&self) -> Chargeability {
        self.country_of_birth.chargeability()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_ordering() {
        assert!(EducationLevel::Masters > EducationLevel::Bachelors);
        assert!(EducationLevel::Doctorate > EducationLevel::Masters);
        assert!(EducationLevel::HighSchool < EducationLevel::Bachelors);
    }

    #[test]
    fn test_experience_serde_names() {
        let band: ExperienceBand = serde_json::from_str("\"2to5\"").unwrap();
        assert_eq!(band, ExperienceBand::TwoToFive);
        assert_eq!(serde_json::to_string(&band).unwrap(), "\"2to5\"");
    }

    #[test]
    fn test_chargeability_mapping() {
        assert_eq!(Country::India.chargeability(), Chargeability::India);
        assert_eq!(Country::Canada.chargeability(), Chargeability::RestOfWorld);
        assert_eq!(Country::Other.chargeability(), Chargeability::RestOfWorld);
    }

    #[test]
    fn test_citizenship_falls_back_to_birth_country() {
        let profile = Profile {
            status: VisaStatus::H1b,
            education: EducationLevel::Masters,
            experience: ExperienceBand::TwoToFive,
            country_of_birth: Country::Canada,
            citizenship: None,
            flags: SpecialFlags::default(),
            prior_case: None,
        };
        assert_eq!(profile.citizenship(), Country::Canada);

        let with_override = Profile {
            citizenship: Some(Country::Mexico),
            ..profile
        };
        assert_eq!(with_override.citizenship(), Country::Mexico);
    }
}
