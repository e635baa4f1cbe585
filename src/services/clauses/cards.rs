//! Full clause card parsing
//!
//! The slow worker writes one markdown card per clause, separated by `---`
//! lines. Each card has a heading, an optional risk line, a quote and
//! labeled explanation fields.

use std::sync::OnceLock;

use regex::Regex;

use super::identification::split_title_section;
use super::{compile, parse_risk_segments};
use crate::models::clause::{ClauseDetails, ClauseRecord, RiskAssessment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Plain,
    Impact,
    WorstCase,
    Example,
}

const FIELD_LABELS: &[(&str, Field)] = &[
    ("what it says", Field::Plain),
    ("what it means for you", Field::Impact),
    ("worst case", Field::WorstCase),
    ("example", Field::Example),
];

fn separator_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"(?m)^[ \t]*-{3,}[ \t]*\r?$")).as_ref()
}

fn heading_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| compile(r"^\s*#{1,4}\s+(.+)$")).as_ref()
}

/// Split card output into blocks on `---` separator lines.
fn split_blocks(text: &str) -> Vec<&str> {
    match separator_re() {
        Some(re) => re.split(text).collect(),
        None => vec![text],
    }
}

/// Parse every card in the slow worker's output, in order.
///
/// Parsing stops at the first synthesis section; everything after the cards
/// describes the whole document, not a clause.
pub fn parse_cards(text: &str) -> Vec<ClauseRecord> {
    split_blocks(text)
        .into_iter()
        .filter_map(parse_card_block)
        .take_while(|record| !record.is_synthesis_section())
        .collect()
}

/// Parse one card block. Blocks without a titled heading yield `None`.
pub fn parse_card_block(block: &str) -> Option<ClauseRecord> {
    let block = block.trim();
    if block.is_empty() {
        return None;
    }

    let heading_re = heading_re()?;
    let mut lines = block.lines();
    let heading = lines.by_ref().find_map(|line| {
        heading_re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    });
    let Some(heading) = heading else {
        tracing::debug!("Skipping card block without heading");
        return None;
    };

    let (title, section) = split_title_section(heading);
    if title.is_empty() {
        return None;
    }

    let mut record = ClauseRecord::new(title, section);
    let mut quote: Vec<&str> = Vec::new();
    let mut current: Option<(Field, Vec<String>)> = None;

    for line in lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_field(&mut record.details, current.take());
            continue;
        }

        if let Some(assessment) = risk_line(trimmed) {
            flush_field(&mut record.details, current.take());
            record.assessment = Some(assessment);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            flush_field(&mut record.details, current.take());
            quote.push(rest.trim());
            continue;
        }

        if let Some((field, value)) = labeled_field(trimmed) {
            flush_field(&mut record.details, current.take());
            let mut parts = Vec::new();
            if !value.is_empty() {
                parts.push(value);
            }
            current = Some((field, parts));
            continue;
        }

        if let Some((_, parts)) = current.as_mut() {
            parts.push(trimmed.to_string());
        }
    }
    flush_field(&mut record.details, current.take());

    let quote = quote.join("\n");
    if !quote.trim().is_empty() {
        record.details.quote = Some(quote);
    }
    record.body = block.to_string();
    Some(record)
}

fn risk_line(line: &str) -> Option<RiskAssessment> {
    let cleaned = line.trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | ' '));
    let starts_with_risk = cleaned
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("risk"));
    if !starts_with_risk {
        return None;
    }
    let after = cleaned[4..].trim_start_matches(|c: char| c == '*' || c == ' ');
    if !after.starts_with(':') {
        return None;
    }
    parse_risk_segments(line.split('|'))
}

/// Match a `**Label:** value` line, returning the field and inline value.
fn labeled_field(line: &str) -> Option<(Field, String)> {
    let cleaned = line
        .trim_start_matches(|c: char| matches!(c, '-' | '•' | ' '))
        .replace("**", "");
    let cleaned = cleaned.trim_start();

    for (label, field) in FIELD_LABELS {
        let matches_label = cleaned
            .get(..label.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(label));
        if !matches_label {
            continue;
        }
        let rest = cleaned[label.len()..].trim_start();
        if let Some(value) = rest.strip_prefix(':') {
            return Some((*field, value.trim().to_string()));
        }
    }
    None
}

fn flush_field(details: &mut ClauseDetails, pending: Option<(Field, Vec<String>)>) {
    let Some((field, parts)) = pending else {
        return;
    };
    let value = parts.join(" ");
    if value.is_empty() {
        return;
    }
    let slot = match field {
        Field::Plain => &mut details.plain,
        Field::Impact => &mut details.impact,
        Field::WorstCase => &mut details.worst_case,
        Field::Example => &mut details.example,
    };
    *slot = Some(value);
}
