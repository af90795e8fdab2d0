//! Text and JSON run reports.

use crate::outcome::Outcome;
use crate::runner::RunSummary;
use console::style;
use std::fmt::Write;

/// One line per case, failure details indented beneath, then a totals line.
pub fn render_text(summary: &RunSummary, color: bool) -> String {
    let mut out = String::new();
    for case in &summary.cases {
        let label = match &case.outcome {
            Outcome::Passed => style(case.outcome.label()).green(),
            Outcome::Skipped { .. } => style(case.outcome.label()).yellow(),
            Outcome::Failed { .. } => style(case.outcome.label()).red().bold(),
        }
        .force_styling(color);
        match &case.outcome {
            Outcome::Passed => {
                let _ = writeln!(out, "{label} {}", case.name);
            }
            Outcome::Skipped { reason } => {
                let _ = writeln!(out, "{label} {} ({reason})", case.name);
            }
            Outcome::Failed { failures } => {
                let _ = writeln!(out, "{label} {}", case.name);
                for failure in failures {
                    let _ = writeln!(out, "    {failure}");
                }
            }
        }
    }

    let verdict = if summary.is_success() {
        style("ok").green()
    } else {
        style("FAILED").red().bold()
    }
    .force_styling(color);
    let _ = writeln!(
        out,
        "\n{verdict}: {} cases on {} backend: {} passed, {} failed, {} skipped{}",
        summary.total(),
        summary.backend,
        summary.passed,
        summary.failed,
        summary.skipped,
        if summary.strict_skips && summary.skipped > 0 { " (skips are strict)" } else { "" },
    );
    out
}

pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{CaseReport, Failure};
    use std::time::Duration;

    fn summary(strict: bool) -> RunSummary {
        let report = |name: &str, outcome| CaseReport {
            name: name.into(),
            outcome,
            duration: Duration::from_micros(1500),
        };
        RunSummary::new(
            "fake",
            vec![
                report("device_get.count", Outcome::Passed),
                report(
                    "p2p.properties",
                    Outcome::Skipped { reason: "multiple devices do not exist".into() },
                ),
                report(
                    "memory_properties.valid",
                    Outcome::Failed {
                        failures: vec![Failure {
                            check: "[0x10000] fetched memory banks".into(),
                            expected: "2".into(),
                            actual: "1".into(),
                            location: "src/cases/properties.rs:99".into(),
                        }],
                    },
                ),
            ],
            strict,
        )
    }

    #[test]
    fn text_report_layout() {
        insta::assert_snapshot!(render_text(&summary(false), false), @r"
        PASS device_get.count
        SKIP p2p.properties (multiple devices do not exist)
        FAIL memory_properties.valid
            [0x10000] fetched memory banks: expected 2, got 1 (at src/cases/properties.rs:99)

        FAILED: 3 cases on fake backend: 1 passed, 1 failed, 1 skipped
        ");
    }

    #[test]
    fn json_report_carries_counts_and_outcomes() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&summary(true)).unwrap()).unwrap();
        assert_eq!(json["backend"], "fake");
        assert_eq!(json["failed"], 1);
        assert_eq!(json["strict_skips"], true);
        assert_eq!(json["cases"][1]["outcome"]["status"], "skipped");
        assert_eq!(json["cases"][2]["outcome"]["failures"][0]["expected"], "2");
        assert_eq!(json["cases"][0]["duration_ms"], 1.5);
    }
}
