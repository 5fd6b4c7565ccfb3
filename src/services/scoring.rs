//! Match score between a candidate profile and a posting.
//!
//! A deterministic weighted sum, not a model: substring skill overlap,
//! stipend tiers, location containment, sector intersection and a fixed
//! company tier list. Always in `1..=100`.

use crate::models::{Internship, Profile, WorkMode};

const SKILLS_MAX: f64 = 40.0;
const STIPEND_MAX: u32 = 20;
const LOCATION_MAX: u32 = 15;
const SECTOR_MAX: u32 = 15;

const TIER_ONE: &[&str] = &[
    "google", "microsoft", "amazon", "apple", "meta", "netflix", "adobe", "salesforce", "nvidia",
    "uber",
];
const TIER_TWO: &[&str] = &[
    "flipkart", "swiggy", "zomato", "paytm", "razorpay", "cred", "infosys", "tcs", "wipro",
    "accenture", "deloitte", "ibm", "oracle", "zoho", "freshworks",
];

/// Score in `1..=100` for how well `profile` fits `internship`.
pub fn match_score(profile: &Profile, internship: &Internship) -> u8 {
    let total = skills_score(&profile.skills, &internship.skills)
        + stipend_score(internship.stipend, profile.stipend_preference)
        + location_score(profile, internship)
        + sector_score(&profile.sectors, internship.sector.as_deref())
        + company_score(&internship.company);

    total.clamp(1, 100) as u8
}

fn skill_matches(candidate: &str, required: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    let required = required.trim().to_lowercase();
    if candidate.is_empty() || required.is_empty() {
        return false;
    }
    candidate.contains(&required) || required.contains(&candidate)
}

fn skills_score(candidate: &[String], required: &[String]) -> u32 {
    let required: Vec<&String> = required.iter().filter(|s| !s.trim().is_empty()).collect();
    if required.is_empty() {
        return (SKILLS_MAX / 2.0) as u32;
    }
    let matched = required
        .iter()
        .filter(|req| candidate.iter().any(|c| skill_matches(c, req)))
        .count();

    (SKILLS_MAX * matched as f64 / required.len() as f64).round() as u32
}

fn stipend_score(stipend: Option<u32>, preference: Option<u32>) -> u32 {
    let stipend = stipend.unwrap_or(0);
    match preference.filter(|p| *p > 0) {
        Some(preference) => {
            let ratio = stipend as f64 / preference as f64;
            if ratio >= 1.0 {
                STIPEND_MAX
            } else if ratio >= 0.75 {
                14
            } else if ratio >= 0.5 {
                8
            } else {
                2
            }
        }
        None => match stipend {
            s if s >= 20_000 => STIPEND_MAX,
            s if s >= 10_000 => 15,
            s if s >= 5_000 => 10,
            s if s > 0 => 5,
            _ => 2,
        },
    }
}

fn contains_either_way(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}

fn location_score(profile: &Profile, internship: &Internship) -> u32 {
    if internship.work_mode == WorkMode::Remote {
        return LOCATION_MAX;
    }
    let candidate_locations: Vec<&str> = profile
        .location
        .iter()
        .chain(profile.preferred_locations.iter())
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .collect();
    if candidate_locations.is_empty() {
        return LOCATION_MAX / 2;
    }
    if candidate_locations
        .iter()
        .any(|l| contains_either_way(l, &internship.location))
    {
        LOCATION_MAX
    } else {
        0
    }
}

fn sector_score(sectors: &[String], sector: Option<&str>) -> u32 {
    if sectors.is_empty() {
        return SECTOR_MAX / 2;
    }
    match sector {
        Some(sector) if sectors.iter().any(|s| s.trim().eq_ignore_ascii_case(sector.trim())) => {
            SECTOR_MAX
        }
        _ => 0,
    }
}

/// Tier names must appear as a whole word of the company name.
fn company_score(company: &str) -> u32 {
    let company = company.to_lowercase();
    let words: Vec<&str> = company
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let listed = |tier: &[&str]| tier.iter().any(|name| words.contains(name));

    if listed(TIER_ONE) {
        10
    } else if listed(TIER_TWO) {
        6
    } else {
        3
    }
}
