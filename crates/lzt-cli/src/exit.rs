use lzt_conformance::RunSummary;

// Exit codes for CI triage
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFORMANCE_FAIL: i32 = 1;
pub const EXIT_ENVIRONMENT: i32 = 2;
pub const EXIT_USAGE: i32 = 3;

/// Exit code for a finished run.
pub fn run_exit_code(summary: &RunSummary) -> i32 {
    if summary.is_success() { EXIT_SUCCESS } else { EXIT_CONFORMANCE_FAIL }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzt_conformance::{CaseReport, Failure, Outcome};

    fn summary(outcome: Outcome, strict_skips: bool) -> RunSummary {
        let case = CaseReport { name: "p2p.properties".into(), outcome, duration: Default::default() };
        RunSummary::new("fake", vec![case], strict_skips)
    }

    #[test]
    fn run_verdicts_map_to_exit_codes() {
        let skipped = || Outcome::Skipped { reason: "one device".into() };
        let failed = Outcome::Failed { failures: vec![Failure::message("check", "boom")] };
        assert_eq!(run_exit_code(&summary(Outcome::Passed, true)), EXIT_SUCCESS);
        assert_eq!(run_exit_code(&summary(skipped(), false)), EXIT_SUCCESS);
        assert_eq!(run_exit_code(&summary(skipped(), true)), EXIT_CONFORMANCE_FAIL);
        assert_eq!(run_exit_code(&summary(failed, false)), EXIT_CONFORMANCE_FAIL);
    }
}
