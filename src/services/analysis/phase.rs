//! Phase Detector
//!
//! Watches text deltas for section markers and reports the logical phase the
//! model has entered. Each stream keeps a bounded trailing window so markers
//! split across deltas are still found; each phase id is reported at most
//! once per session.

use std::collections::{HashMap, HashSet};

use clausewise_core::streaming::{EventPayload, WorkerLabel};

/// Marker substring and the phase id it announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseMarker {
    pub marker: &'static str,
    pub phase: &'static str,
}

impl PhaseMarker {
    pub const fn new(marker: &'static str, phase: &'static str) -> Self {
        Self { marker, phase }
    }
}

/// Markers written by the analysis prompts, in table order.
pub const DEFAULT_MARKERS: &[PhaseMarker] = &[
    PhaseMarker::new("CLAUSE:", "identifying"),
    PhaseMarker::new("GREEN_CLAUSES:", "green_scan"),
    PhaseMarker::new("## Document Profile", "profile"),
    PhaseMarker::new("RISK:", "scoring"),
    PhaseMarker::new("Fair Clauses Summary", "fair_summary"),
    PhaseMarker::new("## Overall Assessment", "assessment"),
    PhaseMarker::new("## Negotiation Playbook", "playbook"),
];

pub const DEFAULT_WINDOW_CAPACITY: usize = 300;
pub const DEFAULT_WINDOW_TAIL: usize = 150;

/// Per-session phase detector
#[derive(Debug, Clone)]
pub struct PhaseDetector {
    markers: Vec<PhaseMarker>,
    capacity: usize,
    retain: usize,
    windows: HashMap<WorkerLabel, String>,
    emitted: HashSet<&'static str>,
}

impl PhaseDetector {
    /// Create a detector. The retained tail is widened to `longest marker - 1`
    /// characters when `tail` is shorter.
    pub fn new(markers: Vec<PhaseMarker>, capacity: usize, tail: usize) -> Self {
        let longest = markers
            .iter()
            .map(|m| m.marker.chars().count())
            .max()
            .unwrap_or(0);
        let retain = tail.max(longest.saturating_sub(1));
        Self {
            markers,
            capacity: capacity.max(retain + 1),
            retain,
            windows: HashMap::new(),
            emitted: HashSet::new(),
        }
    }

    /// Feed one text delta from `label`'s stream, returning any new phases.
    pub fn observe(&mut self, label: WorkerLabel, delta: &str) -> Vec<EventPayload> {
        if delta.is_empty() {
            return Vec::new();
        }

        let window = self.windows.entry(label).or_default();
        window.push_str(delta);

        let mut found = Vec::new();
        for marker in &self.markers {
            if self.emitted.contains(marker.phase) {
                continue;
            }
            if window.contains(marker.marker) {
                self.emitted.insert(marker.phase);
                tracing::debug!("Phase '{}' detected on {} stream", marker.phase, label);
                found.push(EventPayload::Phase {
                    phase: marker.phase.to_string(),
                });
            }
        }

        trim_window(window, self.capacity, self.retain);
        found
    }

    /// Phase ids reported so far.
    pub fn emitted(&self) -> &HashSet<&'static str> {
        &self.emitted
    }

    /// Current trailing window of a stream (for diagnostics).
    pub fn window(&self, label: WorkerLabel) -> &str {
        self.windows.get(&label).map(String::as_str).unwrap_or("")
    }
}

impl Default for PhaseDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_MARKERS.to_vec(),
            DEFAULT_WINDOW_CAPACITY,
            DEFAULT_WINDOW_TAIL,
        )
    }
}

/// Keep the last `retain` chars once the window exceeds `capacity` chars.
fn trim_window(window: &mut String, capacity: usize, retain: usize) {
    let len = window.chars().count();
    if len <= capacity {
        return;
    }
    let skip = len - retain;
    if let Some((byte_idx, _)) = window.char_indices().nth(skip) {
        window.drain(..byte_idx);
    }
}
