//! Clause Parser
//!
//! Turns completed model output into structured clause records. Parsing is
//! total: malformed lines and blocks are skipped or fall back to defaults,
//! never surfaced as errors.
//!
//! ## Rules
//!
//! | Input | Rule | Result |
//! |---|---|---|
//! | identification line | `CLAUSE: <title> (<section>) \| RISK: <tier> \| SCORE: <n> \| TRICK: <label>`, case-insensitive, bullets and `*` allowed before the keyword | one `ClauseRecord` |
//! | title + section | section is the last balanced `(...)` group at the end of the segment; title is the text before it, delimiters trimmed | empty title: no record |
//! | `RISK:` segment | `GREEN`/`YELLOW`/`RED`; missing or unknown tier defaults to `RED` | |
//! | `SCORE:` segment | first run of digits, clamped to 100; a score outside the tier's band overrides the tier | |
//! | `TRICK:` segment | one of the 18 trick labels, tolerant of case and punctuation; unknown labels dropped | |
//! | `GREEN_CLAUSES:` line | entries split on `;`, each split on its first `:` into reference and description; `none` ignored | `GreenClause` list |
//! | other identification lines | kept in order with runs of blank lines collapsed; `## Document Profile` heading prepended if missing | profile text |
//! | card output | blocks separated by lines consisting only of `---` | one record per block with a `#` heading |
//! | card heading | `## <title> (<section>)`, same title/section rule as above | |
//! | card risk line | any line whose first key is `RISK:`, same segments as identification | no line: no assessment |
//! | card quote | lines starting with `>` | joined with newlines |
//! | card fields | `**What it says:**`, `**What it means for you:**`, `**Worst case:**`, `**Example:**`; value runs until the next blank, label, quote or risk line | |
//! | claims | non-summary cards joined positionally with identification records; a card without a risk line takes the coarse record's assessment, or `RED` past the end | empty if either side is empty |

pub mod cards;
pub mod claims;
pub mod identification;

pub use cards::{parse_card_block, parse_cards};
pub use claims::{assemble_claims, render_claims_summary};
pub use identification::{
    parse_clause_line, parse_green_clauses, parse_identification, split_title_section,
    IdentificationResult,
};

use regex::Regex;

use crate::models::clause::{RiskAssessment, RiskTier, TrickCategory};

/// Compile a pattern, logging instead of panicking on a bad expression.
fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid clause pattern {}: {}", pattern, e);
            None
        }
    }
}

/// Parse `KEY: value` segments of a risk line into an assessment.
///
/// Returns `None` when no segment names `RISK`, `SCORE` or `TRICK`.
fn parse_risk_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Option<RiskAssessment> {
    let mut seen = false;
    let mut tier = None;
    let mut score = None;
    let mut trick = None;

    for segment in segments {
        let cleaned = segment.replace('*', "");
        let Some((key, value)) = cleaned.split_once(':') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "RISK" => {
                seen = true;
                tier = RiskTier::parse(value);
            }
            "SCORE" => {
                seen = true;
                score = parse_score(value);
            }
            "TRICK" => {
                seen = true;
                trick = TrickCategory::parse(value);
            }
            _ => {}
        }
    }

    seen.then(|| RiskAssessment::new(tier.unwrap_or(RiskTier::Red), score, trick))
}

/// First run of ASCII digits in `value`, clamped to 100.
fn parse_score(value: &str) -> Option<u8> {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs still mean "maximum"
    let score = digits.parse::<u32>().unwrap_or(u32::MAX).min(100);
    u8::try_from(score).ok()
}
