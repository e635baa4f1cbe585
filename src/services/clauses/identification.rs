//! Identification pass parsing
//!
//! The fast worker emits one `CLAUSE:` line per flagged clause, an optional
//! `GREEN_CLAUSES:` line and free-form document profile text, in any order.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{compile, parse_risk_segments};
use crate::models::clause::{ClauseRecord, GreenClause, RiskAssessment, RiskTier};

const PROFILE_HEADING: &str = "## Document Profile";

/// Everything extracted from the identification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationResult {
    pub clauses: Vec<ClauseRecord>,
    pub green_clauses: Vec<GreenClause>,
    /// Profile text with a `## Document Profile` heading; empty when absent
    pub profile: String,
}

fn clause_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?i)^\s*(?:[-*•+]\s*)*\**\s*CLAUSE\s*\**\s*:\s*\**\s*(.*)$"))
        .as_ref()
}

fn green_line_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        compile(r"(?i)^\s*(?:[-*•+]\s*)*\**\s*GREEN[_ ]CLAUSES\s*\**\s*:\s*\**\s*(.*)$")
    })
    .as_ref()
}

/// Capture the payload after a line keyword, if the line carries it.
fn capture_payload<'a>(re: Option<&Regex>, line: &'a str) -> Option<&'a str> {
    re?.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse the whole identification output.
pub fn parse_identification(text: &str) -> IdentificationResult {
    let mut result = IdentificationResult::default();
    let mut profile_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(payload) = capture_payload(clause_line_re(), line) {
            match parse_clause_payload(payload) {
                Some(record) => result.clauses.push(record),
                None => tracing::debug!("Skipping clause line without title: {}", line.trim()),
            }
            continue;
        }
        if let Some(payload) = capture_payload(green_line_re(), line) {
            result.green_clauses.extend(parse_green_entries(payload));
            continue;
        }
        profile_lines.push(line.trim_end());
    }

    result.profile = build_profile(&profile_lines);
    result
}

/// Parse a single `CLAUSE:` line. Non-clause lines yield `None`.
pub fn parse_clause_line(line: &str) -> Option<ClauseRecord> {
    capture_payload(clause_line_re(), line).and_then(parse_clause_payload)
}

fn parse_clause_payload(payload: &str) -> Option<ClauseRecord> {
    let mut segments = payload.split('|');
    let head = segments.next().unwrap_or_default();
    let (title, section) = split_title_section(head);
    if title.is_empty() {
        return None;
    }

    let assessment = parse_risk_segments(segments)
        .unwrap_or_else(|| RiskAssessment::new(RiskTier::Red, None, None));

    let mut record = ClauseRecord::new(title, section).with_assessment(assessment);
    record.body = payload.trim().to_string();
    Some(record)
}

/// Split `Title words (Section 4.2)` into title and section reference.
///
/// The section is the last balanced parenthesized group when it closes the
/// segment; anything before it is the title. Unbalanced or missing groups
/// leave the section empty.
pub fn split_title_section(segment: &str) -> (String, String) {
    let trimmed = segment.trim().trim_end_matches('*').trim_end();

    if let Some(open) = last_group_start(trimmed) {
        let section = trimmed[open + 1..trimmed.len() - 1].trim().to_string();
        let title = trim_delimiters(&trimmed[..open]).to_string();
        return (title, section);
    }

    (trim_delimiters(trimmed).to_string(), String::new())
}

/// Byte index of the `(` matching a trailing `)`, scanning backwards.
fn last_group_start(text: &str) -> Option<usize> {
    if !text.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn trim_delimiters(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '*' | '#' | '|' | ',')
    })
}

/// Parse a `GREEN_CLAUSES:` line. Non-matching lines yield an empty list.
pub fn parse_green_clauses(line: &str) -> Vec<GreenClause> {
    capture_payload(green_line_re(), line)
        .map(parse_green_entries)
        .unwrap_or_default()
}

fn parse_green_entries(payload: &str) -> Vec<GreenClause> {
    payload
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.eq_ignore_ascii_case("none"))
        .map(|entry| match entry.split_once(':') {
            Some((reference, description)) => GreenClause {
                reference: reference.trim().to_string(),
                description: description.trim().to_string(),
            },
            None => GreenClause {
                reference: entry.to_string(),
                description: String::new(),
            },
        })
        .collect()
}

fn build_profile(lines: &[&str]) -> String {
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    for &line in lines {
        let blank = line.trim().is_empty();
        if blank && kept.last().map_or(true, |prev| prev.trim().is_empty()) {
            continue;
        }
        kept.push(line);
    }
    while kept.last().is_some_and(|line| line.trim().is_empty()) {
        kept.pop();
    }
    if kept.is_empty() {
        return String::new();
    }

    let body = kept.join("\n");
    let has_heading = kept
        .iter()
        .any(|line| line.trim().eq_ignore_ascii_case(PROFILE_HEADING));
    if has_heading {
        body
    } else {
        format!("{}\n\n{}", PROFILE_HEADING, body)
    }
}
