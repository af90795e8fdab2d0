//! Per-case outcomes and recorded check failures.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// One failed check: what was compared, what was expected, what was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub check: String,
    pub expected: String,
    pub actual: String,
    /// `file:line` of the check.
    pub location: String,
}

impl Failure {
    /// A failure with no expected/actual pair, e.g. a facade error.
    pub fn message(check: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            expected: "success".to_string(),
            actual: actual.into(),
            location: String::new(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.check, self.expected, self.actual)?;
        if !self.location.is_empty() {
            write!(f, " (at {})", self.location)?;
        }
        Ok(())
    }
}

/// Result of running one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// Not applicable to this system; counts as success unless skips are
    /// strict.
    Skipped { reason: String },
    Failed { failures: Vec<Failure> },
}

impl Outcome {
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Skipped { .. } => "SKIP",
            Self::Failed { .. } => "FAIL",
        }
    }
}

/// A finished case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub outcome: Outcome,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_micros() as f64 / 1e3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display_includes_location_when_known() {
        let f = Failure {
            check: "core_clock_rate".into(),
            expected: "1600".into(),
            actual: "1500".into(),
            location: "src/x.rs:10".into(),
        };
        assert_eq!(f.to_string(), "core_clock_rate: expected 1600, got 1500 (at src/x.rs:10)");
        assert_eq!(
            Failure::message("zeDeviceGet", "boom").to_string(),
            "zeDeviceGet: expected success, got boom"
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::Skipped { reason: "one device".into() }).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "one device");
        assert_eq!(serde_json::to_value(Outcome::Passed).unwrap()["status"], "passed");
    }
}
