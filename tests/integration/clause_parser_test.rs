//! Clause Parser Integration Tests
//!
//! Full identification + card output as a model would produce it.

use clausewise::models::clause::{RiskTier, TrickCategory};
use clausewise::services::clauses::{
    assemble_claims, parse_cards, parse_identification, render_claims_summary,
};

const IDENTIFICATION: &str = "\
Here is my scan.

- **CLAUSE:** Liquidated Damages (Section 12(b)) | RISK: RED | SCORE: 91 | TRICK: Penalty Disguise
* CLAUSE: Unilateral Changes (§14) | RISK: yellow | SCORE: 40 | TRICK: unilateral amendment
CLAUSE: Arbitration | RISK: RED | SCORE: 75
CLAUSE: (§2)
GREEN_CLAUSES: none

## Document Profile


Consulting agreement between Acme and the contractor.
Governing law: Delaware.
";

const CARDS: &str = "\
#### Liquidated Damages (Section 12(b))
RISK: RED | SCORE: 91 | TRICK: Penalty Disguise
> Contractor shall pay $50,000 as liquidated damages
> for any breach of Section 8.
**What it says:** Any breach costs a fixed $50,000.
**What it means for you:** Even a small slip triggers
the full amount.
**Worst case:** You owe $50,000 for a late report.
**Example:** A report filed one day late.
  ---
### Unilateral Changes (§14)
**What it says:** Acme can change the terms by email.
---
no heading in this block
---
### Arbitration
---
### Fair Clauses Summary
Payment terms and IP assignment are standard.
";

#[test]
fn test_identification_from_model_output() {
    let result = parse_identification(IDENTIFICATION);

    assert_eq!(result.clauses.len(), 3);
    let damages = &result.clauses[0];
    assert_eq!(damages.title, "Liquidated Damages");
    assert_eq!(damages.section, "Section 12(b)");
    let assessment = damages.assessment.unwrap();
    assert_eq!(assessment.tier, RiskTier::Red);
    assert_eq!(assessment.trick, Some(TrickCategory::PenaltyDisguise));

    let changes = result.clauses[1].assessment.unwrap();
    assert_eq!(changes.tier, RiskTier::Yellow);
    assert_eq!(changes.trick, Some(TrickCategory::UnilateralAmendment));

    assert_eq!(result.clauses[2].section, "");
    assert!(result.green_clauses.is_empty());

    assert!(result.profile.starts_with("## Document Profile"));
    assert!(!result.profile.contains("\n\n\n"));
    assert!(result.profile.contains("Governing law: Delaware."));
}

#[test]
fn test_cards_from_model_output() {
    let cards = parse_cards(CARDS);

    assert_eq!(cards.len(), 4);
    let damages = &cards[0];
    assert_eq!(damages.section, "Section 12(b)");
    assert_eq!(
        damages.details.quote.as_deref(),
        Some("Contractor shall pay $50,000 as liquidated damages\nfor any breach of Section 8.")
    );
    assert_eq!(
        damages.details.impact.as_deref(),
        Some("Even a small slip triggers the full amount.")
    );
    assert_eq!(damages.details.example.as_deref(), Some("A report filed one day late."));

    assert!(cards[1].assessment.is_none());
    assert_eq!(cards[2].title, "Arbitration");
    assert!(cards[3].is_fair_summary());
}

#[test]
fn test_claims_join_every_flagged_card() {
    let coarse = parse_identification(IDENTIFICATION).clauses;
    let cards = parse_cards(CARDS);
    let claims = assemble_claims(&coarse, &cards);

    let flagged = cards.iter().filter(|c| c.is_finding()).count();
    assert_eq!(claims.len(), flagged);
    assert!(claims.iter().all(|c| c.assessment.is_some()));

    // Card without a risk line inherits the identification assessment
    assert_eq!(claims[1].assessment, coarse[1].assessment);
    // Card without details falls back to identification data
    assert_eq!(claims[2].assessment.unwrap().score, Some(75));

    let summary = render_claims_summary(&claims);
    assert!(summary.starts_with("FLAGGED CLAUSES (3)\n"));
    assert!(summary.contains("1. Liquidated Damages (Section 12(b)) | RISK: RED | SCORE: 91"));
    assert!(summary.contains("   Worst case: You owe $50,000 for a late report."));
}

const LEASE_OUTPUT: &str = "\
### Late Fees (§5)
RISK: RED | SCORE: 85 | TRICK: Penalty Disguise
> A late fee of $75 per day applies after the 3rd.
**Worst case:** $900 in fees for one late month.

---

### Fair Clauses Summary
Deposit, repairs and notice terms are standard.

---

## Overall Assessment
Reasonable lease apart from the late fee schedule.

---

## Negotiation Playbook
1. Ask for a flat $50 late fee.
";

#[test]
fn test_synthesis_sections_excluded_from_claims() {
    let coarse = parse_identification(
        "CLAUSE: Late Fees (§5) | RISK: RED | SCORE: 85 | TRICK: Penalty Disguise\n",
    )
    .clauses;
    let cards = parse_cards(LEASE_OUTPUT);
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|c| !c.is_synthesis_section()));

    let claims = assemble_claims(&coarse, &cards);
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].title, "Late Fees");
    assert_eq!(claims[0].assessment.unwrap().tier, RiskTier::Red);
    assert!(render_claims_summary(&claims).starts_with("FLAGGED CLAUSES (1)\n"));
}

#[test]
fn test_claims_empty_when_either_side_empty() {
    let coarse = parse_identification(IDENTIFICATION).clauses;
    let cards = parse_cards(CARDS);

    assert!(assemble_claims(&[], &cards).is_empty());
    assert!(assemble_claims(&coarse, &[]).is_empty());
    assert_eq!(render_claims_summary(&[]), "");
}
