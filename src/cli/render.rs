use console::style;

use crate::models::finding::{Finding, Severity, SeverityCounts};
use crate::models::history::HistoryEntry;

pub fn render_severity_badge(severity: &Severity) -> String {
    match severity {
        Severity::High => style(" HIGH ").red().bold().to_string(),
        Severity::Medium => style(" MEDIUM ").yellow().bold().to_string(),
        Severity::Low => style(" LOW ").blue().to_string(),
    }
}

pub fn render_counts(counts: &SeverityCounts) -> String {
    format!(
        "{} high, {} medium, {} low",
        style(counts.high).red().bold(),
        style(counts.medium).yellow().bold(),
        style(counts.low).blue(),
    )
}

pub fn render_findings(target: &str, findings: &[Finding]) -> String {
    if findings.is_empty() {
        return format!(
            "\n  {} {}\n",
            style("✓").green(),
            style(format!("No high, medium or low findings for {}", target)).dim()
        );
    }

    let mut out = String::new();
    out.push_str(&format!(
        "\n{} {}\n  {}\n\n",
        style(format!("Findings ({}):", findings.len())).white().bold(),
        style(target).cyan(),
        render_counts(&SeverityCounts::tally(findings)),
    ));
    for finding in findings {
        out.push_str(&format!("  {} {}\n", render_severity_badge(&finding.severity), finding.title));
        if let Some(url) = &finding.url {
            out.push_str(&format!("         {}\n", style(url).dim()));
        }
    }
    out
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return format!("\n  {}\n", style("No scans recorded.").dim());
    }

    let mut out = String::new();
    out.push_str(&format!("\n{}\n\n", style(format!("Recent scans ({}):", entries.len())).white().bold()));
    for entry in entries {
        out.push_str(&format!(
            "  {}  {}\n      {}\n",
            style(entry.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
            style(&entry.url).cyan(),
            render_counts(&entry.counts),
        ));
    }
    out
}
