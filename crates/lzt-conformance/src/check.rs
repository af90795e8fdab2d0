//! Soft and hard checks.
//!
//! `expect_*` methods record a [`Failure`] and let the case continue.
//! `require_*` methods return [`CaseError::Abort`] so `?` ends the case; use
//! them only where continuing would index an empty or mismatched collection.
//! Every check captures its caller's location.

use crate::error::CaseError;
use crate::outcome::Failure;
use std::fmt::Debug;
use std::panic::Location;
use tracing::debug;

/// Records soft-check failures for one case.
#[derive(Debug, Default)]
pub struct Checker {
    failures: Vec<Failure>,
}

#[track_caller]
fn failure(check: String, expected: String, actual: String) -> Failure {
    let caller = Location::caller();
    Failure { check, expected, actual, location: format!("{}:{}", caller.file(), caller.line()) }
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    fn record(&mut self, failure: Failure) -> bool {
        debug!(check = %failure.check, expected = %failure.expected, actual = %failure.actual, "check failed");
        self.failures.push(failure);
        false
    }

    #[track_caller]
    pub fn expect_eq<T: PartialEq + Debug>(
        &mut self,
        check: impl Into<String>,
        expected: T,
        actual: T,
    ) -> bool {
        if expected == actual {
            return true;
        }
        self.record(failure(check.into(), format!("{expected:?}"), format!("{actual:?}")))
    }

    #[track_caller]
    pub fn expect_ne<T: PartialEq + Debug>(
        &mut self,
        check: impl Into<String>,
        unexpected: T,
        actual: T,
    ) -> bool {
        if unexpected != actual {
            return true;
        }
        self.record(failure(check.into(), format!("!= {unexpected:?}"), format!("{actual:?}")))
    }

    #[track_caller]
    pub fn expect_gt<T: PartialOrd + Debug>(
        &mut self,
        check: impl Into<String>,
        actual: T,
        bound: T,
    ) -> bool {
        if actual > bound {
            return true;
        }
        self.record(failure(check.into(), format!("> {bound:?}"), format!("{actual:?}")))
    }

    #[track_caller]
    pub fn expect_true(&mut self, check: impl Into<String>, value: bool) -> bool {
        self.expect_eq(check, true, value)
    }

    #[track_caller]
    pub fn expect_false(&mut self, check: impl Into<String>, value: bool) -> bool {
        self.expect_eq(check, false, value)
    }

    #[track_caller]
    pub fn require_gt<T: PartialOrd + Debug>(
        &self,
        check: impl Into<String>,
        actual: T,
        bound: T,
    ) -> Result<(), CaseError> {
        if actual > bound {
            return Ok(());
        }
        Err(CaseError::Abort(failure(check.into(), format!("> {bound:?}"), format!("{actual:?}"))))
    }

    #[track_caller]
    pub fn require_eq<T: PartialEq + Debug>(
        &self,
        check: impl Into<String>,
        expected: T,
        actual: T,
    ) -> Result<(), CaseError> {
        if expected == actual {
            return Ok(());
        }
        Err(CaseError::Abort(failure(check.into(), format!("{expected:?}"), format!("{actual:?}"))))
    }

    #[track_caller]
    pub fn require_true(&self, check: impl Into<String>, value: bool) -> Result<(), CaseError> {
        self.require_eq(check, true, value)
    }
}
