//! Plain-text summaries of analysis results for the terminal.

use std::fmt::Write;
use trends_core::{AggregateResult, EntitySentiments};

pub fn format_by_trends(result: &AggregateResult) -> String {
    let mut out = String::new();
    for (name, sentiment) in &result.trends {
        let _ = writeln!(
            out,
            "{}: score of {} with magnitude of {}",
            name, sentiment.score, sentiment.magnitude
        );
    }
    if !result.skipped.is_empty() {
        let _ = writeln!(out, "Skipped: {}", result.skipped.join(", "));
    }
    let _ = writeln!(
        out,
        "Overall Sentiment: score of {} with magnitude of {}",
        result.score(),
        result.magnitude()
    );
    out
}

/// Entities from most to least salient.
pub fn format_entities(entities: &EntitySentiments) -> String {
    let mut records: Vec<_> = entities.values().collect();
    records.sort_by(|a, b| b.salience.total_cmp(&a.salience));

    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "Name: \"{}\"", record.name);
        let _ = writeln!(out, "Salience: {}", record.salience);
        let _ = writeln!(
            out,
            "Sentiment: score of {} with magnitude of {}\n",
            record.sentiment.score, record.sentiment.magnitude
        );
    }
    out
}
