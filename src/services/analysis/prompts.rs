//! Analysis prompts
//!
//! System instructions for the three worker roles. The output formats they
//! request are the ones the clause parser and phase markers expect.

use crate::models::clause::TrickCategory;
use crate::models::session::AnalysisConfig;

fn trick_list() -> String {
    TrickCategory::ALL
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fast worker: one line per flagged clause, then the green list and profile.
pub fn identification_system_prompt() -> String {
    format!(
        "You are a contract screener working quickly.\n\
         Read the document and list every clause that disadvantages the reader.\n\n\
         Output format (plain text, no preamble):\n\
         CLAUSE: <short title> (<section reference>) | RISK: <GREEN|YELLOW|RED> | SCORE: <0-100> | TRICK: <category>\n\
         One line per flagged clause, most severe first.\n\
         Scores: 0-30 GREEN, 31-65 YELLOW, 66-100 RED.\n\
         TRICK must be one of: {tricks}.\n\n\
         Then one line listing fair clauses:\n\
         GREEN_CLAUSES: <section>: <description>; <section>: <description>\n\n\
         Then:\n\
         ## Document Profile\n\
         Document type, parties, term, governing law, and anything unusual, as short lines.",
        tricks = trick_list()
    )
}

/// Slow worker: one full card per flagged clause, then synthesis sections.
pub fn card_system_prompt() -> String {
    format!(
        "You are a careful contract analyst explaining risks to a non-lawyer.\n\
         Write one card per flagged clause, separated by a line containing only ---\n\n\
         Card format:\n\
         ### <short title> (<section reference>)\n\
         RISK: <GREEN|YELLOW|RED> | SCORE: <0-100> | TRICK: <category>\n\
         > <verbatim quote from the document>\n\
         **What it says:** <plain-language restatement>\n\
         **What it means for you:** <concrete impact on the reader>\n\
         **Worst case:** <worst realistic outcome, with figures when possible>\n\
         **Example:** <short scenario>\n\n\
         Scores: 0-30 GREEN, 31-65 YELLOW, 66-100 RED.\n\
         TRICK must be one of: {tricks}.\n\n\
         After the flagged cards, add one card titled Fair Clauses Summary that\n\
         covers every clause you did not flag.\n\
         Finish with two sections:\n\
         ## Overall Assessment\n\
         ## Negotiation Playbook",
        tricks = trick_list()
    )
}

/// Single worker comparing two versions of a document.
pub fn comparison_system_prompt() -> &'static str {
    "You are a contract analyst comparing two versions of an agreement.\n\
     Identify every clause that changed, was added or was removed, and explain\n\
     whether each change helps or hurts the reader.\n\n\
     For each change write:\n\
     CLAUSE: <short title> (<section reference>) | RISK: <GREEN|YELLOW|RED> | SCORE: <0-100>\n\
     followed by a short explanation.\n\n\
     Finish with:\n\
     ## Overall Assessment\n\
     ## Negotiation Playbook"
}

/// User message carrying one document and the reader's situation.
pub fn analysis_user_message(document: &str, config: &AnalysisConfig) -> String {
    format!(
        "Reader role: {role}\n\
         Negotiating room: {negotiability}\n\n\
         <document>\n{document}\n</document>",
        role = config.role,
        negotiability = config.negotiability,
        document = document.trim()
    )
}

/// User message carrying both versions for comparison.
pub fn comparison_user_message(first: &str, second: &str, config: &AnalysisConfig) -> String {
    format!(
        "Reader role: {role}\n\
         Negotiating room: {negotiability}\n\n\
         <original>\n{first}\n</original>\n\n\
         <revised>\n{second}\n</revised>",
        role = config.role,
        negotiability = config.negotiability,
        first = first.trim(),
        second = second.trim()
    )
}
