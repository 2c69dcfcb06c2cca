//! Eligibility filtering: which pathway templates a profile can pursue.
//!
//! Pure predicate logic over the catalog's condition trees. Same profile in,
//! same template set out, independent of call order.

use crate::catalog::{Catalog, CompoundCondition, Condition, Flag, PathwayTemplate, SimpleCondition};
use crate::profile::Profile;

/// All templates whose eligibility condition the profile satisfies, in
/// catalog order.
pub fn filter<'a>(catalog: &'a Catalog, profile: &Profile) -> Vec<&'a PathwayTemplate> {
    catalog
        .pathways()
        .iter()
        .filter(|pathway| matches(&pathway.eligibility, profile))
        .collect()
}

pub fn matches(condition: &Condition, profile: &Profile) -> bool {
    match condition {
        Condition::Compound(compound) => matches_compound(compound, profile),
        Condition::Simple(simple) => matches_simple(simple, profile),
    }
}

fn matches_compound(compound: &CompoundCondition, profile: &Profile) -> bool {
    if let Some(all) = &compound.all {
        return all.iter().all(|cond| matches(cond, profile));
    }

    if let Some(any) = &compound.any {
        return any.iter().any(|cond| matches(cond, profile));
    }

    if let Some(not) = &compound.not {
        return !matches(not, profile);
    }

    false
}

/// Every predicate present on a simple condition must hold. An empty
/// condition matches nothing.
fn matches_simple(simple: &SimpleCondition, profile: &Profile) -> bool {
    let mut any_present = false;

    if let Some(statuses) = &simple.status_in {
        any_present = true;
        if !statuses.contains(&profile.status) {
            return false;
        }
    }

    if let Some(min_education) = simple.education_at_least {
        any_present = true;
        if profile.education < min_education {
            return false;
        }
    }

    if let Some(min_experience) = simple.experience_at_least {
        any_present = true;
        if profile.experience < min_experience {
            return false;
        }
    }

    if let Some(countries) = &simple.country_of_birth_in {
        any_present = true;
        if !countries.contains(&profile.country_of_birth) {
            return false;
        }
    }

    if let Some(countries) = &simple.citizenship_in {
        any_present = true;
        if !countries.contains(&profile.citizenship()) {
            return false;
        }
    }

    if let Some(flag) = simple.has_flag {
        any_present = true;
        let set = match flag {
            Flag::ExtraordinaryAbility => profile.flags.extraordinary_ability,
            Flag::OutstandingResearcher => profile.flags.outstanding_researcher,
            Flag::ExecutiveManager => profile.flags.executive_manager,
            Flag::MarriedToCitizen => profile.flags.married_to_citizen,
            Flag::InvestmentCapital => profile.flags.investment_capital,
            Flag::Stem => profile.flags.is_stem,
        };
        if !set {
            return false;
        }
    }

    any_present
}
