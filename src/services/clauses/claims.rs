//! Claims assembly
//!
//! Joins the full cards with the identification pass so every flagged clause
//! carries a risk assessment, then renders the list for the synthesis stage.

use crate::models::clause::{ClauseRecord, RiskAssessment, RiskTier};

/// Attach risk data to every flagged card.
///
/// Cards and coarse records are joined by position after dropping the fair
/// clauses rollup and the synthesis sections from both sides. A card keeps its own risk line when it
/// has one; otherwise it takes the coarse record's assessment, and cards
/// past the end of the coarse list default to `RED` with no score.
/// Returns an empty list when either side has no clauses.
pub fn assemble_claims(coarse: &[ClauseRecord], cards: &[ClauseRecord]) -> Vec<ClauseRecord> {
    let coarse: Vec<&ClauseRecord> = coarse.iter().filter(|r| r.is_finding()).collect();
    let flagged: Vec<&ClauseRecord> = cards.iter().filter(|r| r.is_finding()).collect();

    if coarse.is_empty() || flagged.is_empty() {
        return Vec::new();
    }
    if coarse.len() != flagged.len() {
        tracing::debug!(
            "Card count {} differs from identified clause count {}",
            flagged.len(),
            coarse.len()
        );
    }

    flagged
        .into_iter()
        .enumerate()
        .map(|(idx, card)| {
            let mut claim = card.clone();
            if claim.assessment.is_none() {
                let fallback = coarse
                    .get(idx)
                    .and_then(|record| record.assessment)
                    .unwrap_or_else(|| RiskAssessment::new(RiskTier::Red, None, None));
                claim.assessment = Some(fallback);
            }
            if claim.section.is_empty() {
                if let Some(record) = coarse.get(idx) {
                    claim.section = record.section.clone();
                }
            }
            claim
        })
        .collect()
}

/// Render claims as the plain-text block passed to later synthesis.
///
/// Empty input renders to an empty string.
pub fn render_claims_summary(claims: &[ClauseRecord]) -> String {
    if claims.is_empty() {
        return String::new();
    }

    let mut out = format!("FLAGGED CLAUSES ({})\n", claims.len());
    for (idx, claim) in claims.iter().enumerate() {
        out.push_str(&format!("{}. {}", idx + 1, claim.title));
        if !claim.section.is_empty() {
            out.push_str(&format!(" ({})", claim.section));
        }
        if let Some(assessment) = &claim.assessment {
            out.push_str(&format!(" | RISK: {}", assessment.tier));
            if let Some(score) = assessment.score {
                out.push_str(&format!(" | SCORE: {}", score));
            }
            if let Some(trick) = assessment.trick {
                out.push_str(&format!(" | TRICK: {}", trick));
            }
        }
        out.push('\n');

        let details = &claim.details;
        if let Some(impact) = details.impact.as_ref().or(details.plain.as_ref()) {
            out.push_str(&format!("   Impact: {}\n", impact));
        }
        if let Some(worst) = &details.worst_case {
            out.push_str(&format!("   Worst case: {}\n", worst));
        }
    }
    out
}
