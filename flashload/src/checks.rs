use crate::request::{Outcome, Response};
use crate::sample_log::CheckResult;
use flashload_core::{CheckSpec, Predicate};
use std::fmt;
use std::sync::Arc;

type CheckFn = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

#[derive(Clone)]
enum Assertion {
    Predicate(Predicate),
    Fn(CheckFn),
}

#[derive(Clone)]
struct Check {
    name: Arc<str>,
    assertion: Assertion,
}

/// Named assertions evaluated against every outcome. A failing check never aborts the
/// iteration; it is only recorded.
#[derive(Clone, Default)]
pub struct CheckSet {
    checks: Vec<Check>,
}

impl CheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: &[CheckSpec]) -> Self {
        specs
            .iter()
            .fold(Self::new(), |set, spec| set.check(&spec.name, spec.predicate.clone()))
    }

    pub fn check(mut self, name: &str, predicate: Predicate) -> Self {
        self.checks.push(Check {
            name: name.into(),
            assertion: Assertion::Predicate(predicate),
        });
        self
    }

    /// Add a check with arbitrary logic over the received response.
    pub fn check_fn<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.checks.push(Check {
            name: name.into(),
            assertion: Assertion::Fn(Arc::new(f)),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| &*c.name)
    }

    /// One result per check, in declaration order. Every check fails on a transport failure.
    pub fn evaluate(&self, outcome: &Outcome) -> Vec<CheckResult> {
        self.checks
            .iter()
            .map(|check| CheckResult {
                name: check.name.clone(),
                passed: match (outcome.response(), &check.assertion) {
                    (None, _) => false,
                    (Some(r), Assertion::Predicate(p)) => p.matches(r.status, &r.body),
                    (Some(r), Assertion::Fn(f)) => f(r),
                },
            })
            .collect()
    }
}

impl fmt::Debug for CheckSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{TransportFailure, TransportFailureKind};
    use std::time::Duration;

    fn response(status: u16, body: &str) -> Outcome {
        Outcome::Response(Response {
            status,
            body: body.as_bytes().to_vec(),
            latency: Duration::from_millis(3),
        })
    }

    fn checks() -> CheckSet {
        CheckSet::new()
            .check("is status 200 or 409 or 429", Predicate::StatusIn(vec![200, 409, 429]))
            .check("precheck accepted", Predicate::StatusIs(200))
            .check_fn("has a body", |r| !r.body.is_empty())
    }

    fn passed(results: &[CheckResult]) -> Vec<bool> {
        results.iter().map(|r| r.passed).collect()
    }

    #[test]
    fn every_check_is_evaluated() {
        let set = checks();
        assert_eq!(set.len(), 3);

        assert_eq!(
            passed(&set.evaluate(&response(409, r#"{"status":"USER_ALREADY_PURCHASED"}"#))),
            vec![true, false, true]
        );
        assert_eq!(
            passed(&set.evaluate(&response(200, ""))),
            vec![true, true, false]
        );
        assert_eq!(
            passed(&set.evaluate(&response(500, "boom"))),
            vec![false, false, true]
        );
    }

    #[test]
    fn transport_failure_fails_everything() {
        let outcome = Outcome::TransportFailure(TransportFailure {
            kind: TransportFailureKind::Connect,
            cause: "connection refused".to_string(),
            latency: Duration::from_millis(1),
        });
        let results = CheckSet::new()
            .check("rejected", Predicate::StatusIs(200).negate())
            .evaluate(&outcome);
        assert_eq!(passed(&results), vec![false]);
    }

    #[test]
    fn from_specs_keeps_order() {
        let set = CheckSet::from_specs(&[
            CheckSpec::new("b", Predicate::StatusIs(200)),
            CheckSpec::new("a", Predicate::StatusIs(409)),
        ]);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
