//! Case selection and sequential execution.

use crate::cases::{Case, registry};
use crate::context::{CaseContext, CheckOptions};
use crate::error::CaseError;
use crate::outcome::{CaseReport, Failure, Outcome};
use lzt_level_zero::{DeviceApi, LevelZeroError};
use serde::Serialize;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;
use tracing::{error, info, warn};

/// Comma-separated name patterns. `*` matches any run of characters; a
/// leading `-` excludes. With no include patterns every case is included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl CaseFilter {
    pub fn parse(patterns: &str) -> Self {
        let mut filter = Self::default();
        for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pattern.strip_prefix('-') {
                Some(excluded) => filter.exclude.push(excluded.to_string()),
                None => filter.include.push(pattern.to_string()),
            }
        }
        filter
    }

    pub fn matches(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| glob_match(p, name));
        included && !self.exclude.iter().any(|p| glob_match(p, name))
    }
}

fn glob_match(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else { return true };
    let Some(mut rest) = name.strip_prefix(head) else { return false };
    let parts: Vec<&str> = parts.collect();
    let Some((tail, middle)) = parts.split_last() else {
        // no wildcard
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.len() >= tail.len() && rest.ends_with(tail)
}

/// Aggregate of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub backend: String,
    pub cases: Vec<CaseReport>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub strict_skips: bool,
}

impl RunSummary {
    pub fn new(backend: impl Into<String>, cases: Vec<CaseReport>, strict_skips: bool) -> Self {
        let count = |f: fn(&Outcome) -> bool| cases.iter().filter(|c| f(&c.outcome)).count();
        let (passed, failed, skipped) =
            (count(Outcome::is_passed), count(Outcome::is_failed), count(Outcome::is_skipped));
        Self { backend: backend.into(), cases, passed, failed, skipped, strict_skips }
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// No failures, and no skips when skips are strict.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !(self.strict_skips && self.skipped > 0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Runner {
    pub options: CheckOptions,
    pub filter: CaseFilter,
    pub strict_skips: bool,
}

impl Runner {
    pub fn new(options: CheckOptions) -> Self {
        Self { options, ..Self::default() }
    }

    pub fn with_filter(mut self, filter: CaseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_strict_skips(mut self, strict: bool) -> Self {
        self.strict_skips = strict;
        self
    }

    /// Registered cases this runner will execute, in order.
    pub fn selected(&self) -> Vec<&'static Case> {
        registry().iter().filter(|c| self.filter.matches(&c.full_name())).collect()
    }

    pub fn run(&self, api: &dyn DeviceApi) -> RunSummary {
        let selected = self.selected();
        info!(backend = api.backend_name(), cases = selected.len(), "starting conformance run");
        let reports: Vec<CaseReport> = selected.into_iter().map(|case| self.run_case(api, case)).collect();
        let summary = RunSummary::new(api.backend_name(), reports, self.strict_skips);
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "conformance run finished"
        );
        summary
    }

    pub fn run_case(&self, api: &dyn DeviceApi, case: &Case) -> CaseReport {
        let name = case.full_name();
        info!(case = %name, "running");
        let start = Instant::now();
        let mut ctx = CaseContext::new(api, &self.options);
        let result = catch_unwind(AssertUnwindSafe(|| (case.run)(&mut ctx)));
        let mut failures = ctx.check.into_failures();

        let skip = match result {
            Ok(Ok(())) => None,
            Ok(Err(CaseError::Skip(reason))) => Some(reason),
            Ok(Err(CaseError::Abort(failure))) => {
                failures.push(failure);
                None
            }
            Ok(Err(CaseError::Api(err))) => {
                failures.push(api_failure(&err));
                None
            }
            Ok(Err(CaseError::Sku(err))) => {
                failures.push(Failure::message("sku grouping", err.to_string()));
                None
            }
            Err(payload) => {
                failures.push(Failure::message("case completed", panic_message(payload.as_ref())));
                None
            }
        };

        let outcome = match (skip, failures.is_empty()) {
            (_, false) => {
                error!(case = %name, failures = failures.len(), "failed");
                for failure in &failures {
                    error!(case = %name, "{failure}");
                }
                Outcome::Failed { failures }
            }
            (Some(reason), true) => {
                warn!(case = %name, %reason, "skipped");
                Outcome::Skipped { reason }
            }
            (None, true) => Outcome::Passed,
        };
        CaseReport { name, outcome, duration: start.elapsed() }
    }
}

fn api_failure(err: &LevelZeroError) -> Failure {
    match err {
        LevelZeroError::ApiError { call, result } => Failure::message(*call, result.to_string()),
        other => Failure::message("device query", other.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
