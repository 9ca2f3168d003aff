//! Classification policy and result rendering
//!
//! The engine only ranks candidates; deciding what counts as a
//! duplicate is front-end policy, applied here with a single score
//! threshold against the top result.

use echomark_core::MatchResult;
use serde::Serialize;

/// Verdict rendered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Original,
    Duplicate,
    Uncertain,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Original => write!(f, "ORIGINAL"),
            Classification::Duplicate => write!(f, "DUPLICATE"),
            Classification::Uncertain => write!(f, "UNCERTAIN"),
        }
    }
}

/// Apply the threshold to the ranked candidate list. A top score
/// exactly at the threshold counts as a duplicate.
pub fn classify(matches: &[MatchResult], threshold: f64) -> Classification {
    match matches.first() {
        None => Classification::Original,
        Some(top) if top.score >= threshold => Classification::Duplicate,
        Some(_) => Classification::Original,
    }
}

/// Full check outcome in machine-readable form.
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub status: Classification,
    pub top_score: f64,
    pub matches: &'a [MatchResult],
}

impl<'a> CheckReport<'a> {
    pub fn new(matches: &'a [MatchResult], threshold: f64) -> Self {
        Self {
            status: classify(matches, threshold),
            top_score: matches.first().map(|m| m.score).unwrap_or(0.0),
            matches,
        }
    }
}

/// Print a check report as JSON
pub fn print_json_report(report: &CheckReport<'_>) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report: {}", e),
    }
}

/// Print a check report as plain text
pub fn print_text_report(report: &CheckReport<'_>) {
    println!("CLASSIFICATION: {}", report.status);
    if report.matches.is_empty() {
        return;
    }
    println!("MATCHES:");
    for m in report.matches {
        println!(
            "SongID: {} | Score: {:.0} | Time(ms): {}",
            m.song_id, m.score, m.timestamp_ms
        );
    }
}
