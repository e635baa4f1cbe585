//! Clause Models
//!
//! Structured records extracted from model output: risk tiers, trick
//! categories and clause cards.

use serde::{Deserialize, Serialize};

/// Risk tier of a flagged clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Green,
    Yellow,
    Red,
}

impl RiskTier {
    /// Tier whose score band contains `score`.
    ///
    /// Bands: 0-30 green, 31-65 yellow, 66-100 red. Scores above 100 are
    /// treated as 100.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => RiskTier::Green,
            31..=65 => RiskTier::Yellow,
            _ => RiskTier::Red,
        }
    }

    /// Whether `score` falls inside this tier's band.
    pub fn matches_score(&self, score: u8) -> bool {
        RiskTier::from_score(score) == *self
    }

    /// Parse a tier label, ignoring case and surrounding punctuation.
    pub fn parse(label: &str) -> Option<Self> {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_uppercase();
        match cleaned.as_str() {
            "GREEN" => Some(RiskTier::Green),
            "YELLOW" => Some(RiskTier::Yellow),
            "RED" => Some(RiskTier::Red),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Green => "GREEN",
            RiskTier::Yellow => "YELLOW",
            RiskTier::Red => "RED",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drafting pattern that makes a clause worse than it looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrickCategory {
    PenaltyDisguise,
    SoleDiscretion,
    AutoRenewalTrap,
    UnilateralAmendment,
    LiabilityShield,
    BroadIndemnity,
    HiddenFee,
    RightsWaiver,
    ForcedArbitration,
    PerpetualLicense,
    IpGrab,
    NonCompeteOverreach,
    ConfidentialityGag,
    TerminationAsymmetry,
    VagueStandard,
    CrossDefault,
    AssignmentWithoutConsent,
    SurvivalCreep,
}

impl TrickCategory {
    pub const ALL: [TrickCategory; 18] = [
        TrickCategory::PenaltyDisguise,
        TrickCategory::SoleDiscretion,
        TrickCategory::AutoRenewalTrap,
        TrickCategory::UnilateralAmendment,
        TrickCategory::LiabilityShield,
        TrickCategory::BroadIndemnity,
        TrickCategory::HiddenFee,
        TrickCategory::RightsWaiver,
        TrickCategory::ForcedArbitration,
        TrickCategory::PerpetualLicense,
        TrickCategory::IpGrab,
        TrickCategory::NonCompeteOverreach,
        TrickCategory::ConfidentialityGag,
        TrickCategory::TerminationAsymmetry,
        TrickCategory::VagueStandard,
        TrickCategory::CrossDefault,
        TrickCategory::AssignmentWithoutConsent,
        TrickCategory::SurvivalCreep,
    ];

    /// Human-readable label as the model writes it.
    pub fn label(&self) -> &'static str {
        match self {
            TrickCategory::PenaltyDisguise => "Penalty Disguise",
            TrickCategory::SoleDiscretion => "Sole Discretion",
            TrickCategory::AutoRenewalTrap => "Auto-Renewal Trap",
            TrickCategory::UnilateralAmendment => "Unilateral Amendment",
            TrickCategory::LiabilityShield => "Liability Shield",
            TrickCategory::BroadIndemnity => "Broad Indemnity",
            TrickCategory::HiddenFee => "Hidden Fee",
            TrickCategory::RightsWaiver => "Rights Waiver",
            TrickCategory::ForcedArbitration => "Forced Arbitration",
            TrickCategory::PerpetualLicense => "Perpetual License",
            TrickCategory::IpGrab => "IP Grab",
            TrickCategory::NonCompeteOverreach => "Non-Compete Overreach",
            TrickCategory::ConfidentialityGag => "Confidentiality Gag",
            TrickCategory::TerminationAsymmetry => "Termination Asymmetry",
            TrickCategory::VagueStandard => "Vague Standard",
            TrickCategory::CrossDefault => "Cross-Default",
            TrickCategory::AssignmentWithoutConsent => "Assignment Without Consent",
            TrickCategory::SurvivalCreep => "Survival Creep",
        }
    }

    /// Parse a label, ignoring case, spacing and punctuation.
    ///
    /// Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let key = normalize_label(label);
        if key.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|category| normalize_label(category.label()) == key)
    }
}

impl std::fmt::Display for TrickCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Risk tier, score and trick attached to a clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trick: Option<TrickCategory>,
}

impl RiskAssessment {
    /// Build an assessment whose tier agrees with its score.
    ///
    /// When both are given and disagree, the score decides the tier.
    pub fn new(tier: RiskTier, score: Option<u8>, trick: Option<TrickCategory>) -> Self {
        let score = score.map(|s| s.min(100));
        let tier = match score {
            Some(s) if !tier.matches_score(s) => {
                tracing::debug!(
                    "Risk tier {} disagrees with score {}; using score band",
                    tier,
                    s
                );
                RiskTier::from_score(s)
            }
            _ => tier,
        };
        Self { tier, score, trick }
    }

    /// Whether the score (when present) lies in the tier's band.
    pub fn is_consistent(&self) -> bool {
        self.score.map_or(true, |s| self.tier.matches_score(s))
    }
}

/// Long-form supporting text of a clause card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseDetails {
    /// Verbatim quote from the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Plain-language restatement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain: Option<String>,
    /// What the clause means for the reader
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    /// Worst-case figure or outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_case: Option<String>,
    /// Concrete example
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// A structured clause extracted from model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRecord {
    /// Clause title (never empty)
    pub title: String,
    /// Section reference, empty when the model gave none
    pub section: String,
    /// Risk assessment; `None` when a card carried no risk line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(default)]
    pub details: ClauseDetails,
    /// Raw text of the block the record was parsed from
    #[serde(default)]
    pub body: String,
}

impl ClauseRecord {
    /// Title of the rollup card covering every unflagged clause.
    pub const FAIR_SUMMARY_TITLE: &'static str = "Fair Clauses Summary";

    /// Headings of the document-level sections that follow the cards.
    pub const SYNTHESIS_TITLES: &'static [&'static str] =
        &["Overall Assessment", "Negotiation Playbook"];

    pub fn new(title: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section: section.into(),
            assessment: None,
            details: ClauseDetails::default(),
            body: String::new(),
        }
    }

    /// Builder: attach a risk assessment.
    pub fn with_assessment(mut self, assessment: RiskAssessment) -> Self {
        self.assessment = Some(assessment);
        self
    }

    /// Whether this is the fair-clauses rollup rather than a finding.
    pub fn is_fair_summary(&self) -> bool {
        self.title
            .to_lowercase()
            .contains(&Self::FAIR_SUMMARY_TITLE.to_lowercase())
    }

    /// Whether this is a document-level synthesis section.
    pub fn is_synthesis_section(&self) -> bool {
        let title = self.title.to_lowercase();
        Self::SYNTHESIS_TITLES
            .iter()
            .any(|heading| title.contains(&heading.to_lowercase()))
    }

    /// Whether this record is a per-clause finding.
    pub fn is_finding(&self) -> bool {
        !self.is_fair_summary() && !self.is_synthesis_section()
    }
}

/// One entry of the `GREEN_CLAUSES:` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenClause {
    pub reference: String,
    pub description: String,
}
