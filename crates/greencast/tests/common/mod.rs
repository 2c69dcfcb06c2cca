//! Shared builders and fixtures for integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use greencast::feeds::{ProcessingTimes, VisaBulletin};
use greencast::profile::{Country, EducationLevel, ExperienceBand, Profile, SpecialFlags, VisaStatus};

/// Install a test subscriber so `RUST_LOG=greencast=debug cargo test`
/// surfaces the engine's tracing output.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fluent profile construction for test cases.
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self {
            profile: Profile {
                status: VisaStatus::H1b,
                education: EducationLevel::Bachelors,
                experience: ExperienceBand::TwoToFive,
                country_of_birth: Country::Other,
                citizenship: None,
                flags: SpecialFlags::default(),
                prior_case: None,
            },
        }
    }

    pub fn status(mut self, status: VisaStatus) -> Self {
        self.profile.status = status;
        self
    }

    pub fn education(mut self, education: EducationLevel) -> Self {
        self.profile.education = education;
        self
    }

    pub fn experience(mut self, experience: ExperienceBand) -> Self {
        self.profile.experience = experience;
        self
    }

    pub fn born_in(mut self, country: Country) -> Self {
        self.profile.country_of_birth = country;
        self
    }

    pub fn citizen_of(mut self, country: Country) -> Self {
        self.profile.citizenship = Some(country);
        self
    }

    pub fn stem(mut self) -> Self {
        self.profile.flags.is_stem = true;
        self
    }

    pub fn flags(mut self, flags: SpecialFlags) -> Self {
        self.profile.flags = flags;
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bulletin snapshot resembling a heavily retrogressed month: India far
/// behind in the employment categories, rest of world current.
pub fn retrogressed_bulletin() -> VisaBulletin {
    serde_json::from_str(
        r#"
        {
            "finalAction": {
                "eb1": { "india": "2022-02-01", "china": "2022-11-08", "restOfWorld": "Current" },
                "eb2": { "india": "2012-05-01", "china": "2020-10-01", "restOfWorld": "2023-04-15" },
                "eb3": { "india": "2013-01-01", "china": "2021-06-01", "restOfWorld": "Current" },
                "eb5": { "india": "2019-01-01", "china": "2015-10-01", "restOfWorld": "Current" }
            },
            "datesForFiling": {
                "eb2": { "india": "2013-06-01", "china": "2021-01-01", "restOfWorld": "Current" },
                "eb3": { "india": "2013-08-01", "china": "2022-01-01", "restOfWorld": "Current" }
            },
            "effectiveMonth": "2026-08"
        }
        "#,
    )
    .unwrap()
}

/// A processing-time snapshot with the usual forms populated.
pub fn live_processing_times() -> ProcessingTimes {
    serde_json::from_str(
        r#"
        {
            "uscis": {
                "forms": {
                    "I-140": [
                        { "serviceCenter": "Texas Service Center",
                          "processingTime": { "min": 7.0, "max": 10.0 } },
                        { "serviceCenter": "Nebraska Service Center",
                          "processingTime": { "min": 6.5, "max": 9.5 } },
                        { "tier": "premium",
                          "processingTime": { "min": 0.5, "max": 0.5 } }
                    ],
                    "I-485": [
                        { "processingTime": { "min": 9.0, "max": 13.5 } }
                    ],
                    "I-130": [
                        { "processingTime": { "min": 11.0, "max": 15.0 } }
                    ]
                }
            },
            "dol": {
                "pwd": { "estimatedMonths": 6.0, "currentlyProcessing": "2026-01" },
                "perm": {
                    "analystReview": { "averageDays": 440, "currentlyProcessing": "2025-03" },
                    "auditReview": { "averageDays": 590 }
                }
            },
            "fetchedAt": "2026-08-01"
        }
        "#,
    )
    .unwrap()
}
