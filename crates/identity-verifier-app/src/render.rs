//! Terminal rendering of validated results and read-only views.

use std::fmt::Write as _;

use identity_verifier_contract::{VerificationRecord, VerificationResult, VerificationStats};

/// Placeholder printed for empty extracted fields.
pub const UNREADABLE: &str = "UNREADABLE";

/// Display category of one explanation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    /// Mentions a failure, detection or mismatch.
    Alert,
    /// Mentions a pass or match.
    Pass,
    /// Anything else.
    Info,
}

impl FindingKind {
    /// Classifies a finding by keyword; alerts are checked first, so
    /// "mismatch" is an alert even though it contains "match".
    pub fn classify(finding: &str) -> Self {
        let lower = finding.to_lowercase();
        if ["fail", "detect", "mismatch"].iter().any(|word| lower.contains(word)) {
            Self::Alert
        } else if ["pass", "match"].iter().any(|word| lower.contains(word)) {
            Self::Pass
        } else {
            Self::Info
        }
    }

    fn marker(&self) -> char {
        match self {
            Self::Alert => '!',
            Self::Pass => '+',
            Self::Info => '-',
        }
    }
}

fn or_unreadable(value: &str) -> &str {
    if value.trim().is_empty() { UNREADABLE } else { value }
}

/// Renders one result as a multi-line summary.
pub fn summarize_result(result: &VerificationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Risk: {} (score {}/100, label {:?})",
        result.risk_tier().as_str().to_uppercase(),
        result.risk_score,
        result.risk_level
    );
    let _ = writeln!(out, "Name: {}", or_unreadable(&result.extracted_data.name));
    let _ = writeln!(out, "ID number: {}", or_unreadable(&result.extracted_data.id_number));
    let _ = writeln!(out, "Date of birth: {}", or_unreadable(&result.extracted_data.dob));

    if result.explanation.is_empty() {
        let _ = writeln!(out, "Findings: none reported");
    } else {
        let _ = writeln!(out, "Findings:");
        for finding in &result.explanation {
            let _ = writeln!(out, "  {} {finding}", FindingKind::classify(finding).marker());
        }
    }
    out
}

/// Renders aggregate counters.
pub fn summarize_stats(stats: &VerificationStats) -> String {
    format!(
        "Total: {}\nLow: {} ({}% clear rate)\nMedium: {}\nHigh: {}\nAverage score: {:.2}\n",
        stats.total_verifications,
        stats.low_risk_count,
        stats.clear_rate_percent(),
        stats.medium_risk_count,
        stats.high_risk_count,
        stats.average_risk_score
    )
}

/// Renders history as one line per record.
pub fn summarize_history(records: &[VerificationRecord]) -> String {
    if records.is_empty() {
        return "No verifications yet\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{}  {:<6}  {:>3}  {}  {}",
            record.id,
            record.result.risk_tier().as_str(),
            record.result.risk_score,
            record.created_at,
            record.file_name
        );
    }
    out
}
