use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Run-level metric a threshold is declared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Request latency, in milliseconds. Failed attempts included.
    HttpReqDuration,
    /// Share of samples classified as failed.
    HttpReqFailed,
    /// Share of passed checks.
    Checks,
    /// Number of completed iterations.
    Iterations,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::HttpReqDuration => "http_req_duration",
            Metric::HttpReqFailed => "http_req_failed",
            Metric::Checks => "checks",
            Metric::Iterations => "iterations",
        }
    }

    fn supports(&self, aggregation: &Aggregation) -> bool {
        use Aggregation::*;
        match self {
            Metric::HttpReqDuration => matches!(aggregation, Percentile(_) | Avg | Min | Med | Max),
            Metric::HttpReqFailed | Metric::Checks => matches!(aggregation, Rate),
            Metric::Iterations => matches!(aggregation, Count),
        }
    }
}

impl FromStr for Metric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "http_req_duration" => Ok(Metric::HttpReqDuration),
            "http_req_failed" => Ok(Metric::HttpReqFailed),
            "checks" => Ok(Metric::Checks),
            "iterations" => Ok(Metric::Iterations),
            other => Err(ConfigError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aggregation {
    /// `p(N)` with `N` in `[0, 100]`
    Percentile(f64),
    Avg,
    Min,
    Med,
    Max,
    Rate,
    Count,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Percentile(p) => write!(f, "p({p})"),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Count => f.write_str("count"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Comparator {
    pub fn holds(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparator::Lt => observed < bound,
            Comparator::Le => observed <= bound,
            Comparator::Gt => observed > bound,
            Comparator::Ge => observed >= bound,
            Comparator::Eq => observed == bound,
            Comparator::Ne => observed != bound,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Le),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Ge),
            "==" | "===" => Ok(Comparator::Eq),
            "!=" | "!==" => Ok(Comparator::Ne),
            other => Err(format!("unknown comparator `{other}`")),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed `aggregation comparator bound` expression, e.g. `p(95)<300`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Condition {
    pub aggregation: Aggregation,
    pub comparator: Comparator,
    pub bound: f64,
}

impl FromStr for Condition {
    type Err = ConfigError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| ConfigError::MalformedThreshold {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let op_start = expr
            .find(['<', '>', '=', '!'])
            .ok_or_else(|| malformed("missing comparator"))?;
        let (lhs, rest) = expr.split_at(op_start);
        let op_len = rest
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '!'))
            .unwrap_or(rest.len());
        let (op, rhs) = rest.split_at(op_len);

        let comparator = op.parse::<Comparator>().map_err(|e| malformed(&e))?;
        let bound = rhs
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed("bound is not a number"))?;
        if !bound.is_finite() {
            return Err(malformed("bound is not finite"));
        }
        let aggregation = parse_aggregation(lhs.trim()).map_err(|e| malformed(&e))?;

        Ok(Condition {
            aggregation,
            comparator,
            bound,
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.aggregation, self.comparator, self.bound)
    }
}

fn parse_aggregation(lhs: &str) -> Result<Aggregation, String> {
    match lhs {
        "avg" => Ok(Aggregation::Avg),
        "min" => Ok(Aggregation::Min),
        "med" => Ok(Aggregation::Med),
        "max" => Ok(Aggregation::Max),
        "rate" => Ok(Aggregation::Rate),
        "count" => Ok(Aggregation::Count),
        "" => Err("missing aggregation".to_string()),
        other => {
            let inner = other
                .strip_prefix("p(")
                .and_then(|s| s.strip_suffix(')'))
                .ok_or_else(|| format!("unknown aggregation `{other}`"))?;
            let p = inner
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid percentile `{inner}`"))?;
            if (0.0..=100.0).contains(&p) {
                Ok(Aggregation::Percentile(p))
            } else {
                Err(format!("percentile {p} outside [0, 100]"))
            }
        }
    }
}

/// Decides which samples count as failed for an `http_req_failed` threshold.
///
/// A sample fails when no response was received, or when its status is outside `2xx` and not
/// listed as tolerated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureClassifier {
    tolerated: Vec<u16>,
}

impl FailureClassifier {
    pub fn new(tolerated: &[u16]) -> Self {
        Self {
            tolerated: tolerated.to_vec(),
        }
    }

    pub fn is_failure(&self, status: Option<u16>) -> bool {
        match status {
            None => true,
            Some(status) => !(200..300).contains(&status) && !self.tolerated.contains(&status),
        }
    }

    pub fn tolerated(&self) -> &[u16] {
        &self.tolerated
    }
}

/// A threshold as declared in a run configuration.
///
/// `metric` and `expr` stay textual so that a bad declaration surfaces as a [`ConfigError`] when
/// the run is validated rather than as a deserialization failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    pub metric: String,
    pub expr: String,
    /// Statuses excluded from the failure tally (`http_req_failed` only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerate: Vec<u16>,
    /// Restrict a `checks` threshold to one named check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl ThresholdSpec {
    pub fn new(metric: &str, expr: &str) -> Self {
        Self {
            metric: metric.to_string(),
            expr: expr.to_string(),
            tolerate: vec![],
            check: None,
        }
    }

    pub fn tolerate(mut self, statuses: &[u16]) -> Self {
        self.tolerate = statuses.to_vec();
        self
    }

    pub fn for_check(mut self, name: &str) -> Self {
        self.check = Some(name.to_string());
        self
    }

    pub fn compile(&self) -> Result<Threshold, ConfigError> {
        let metric: Metric = self.metric.parse()?;
        let condition: Condition = self.expr.parse()?;

        if !metric.supports(&condition.aggregation) {
            return Err(ConfigError::UnsupportedAggregation {
                metric: metric.to_string(),
                aggregation: condition.aggregation.to_string(),
            });
        }

        let check = match (&self.check, metric) {
            (Some(name), Metric::Checks) => Some(name.clone()),
            (Some(_), _) => {
                return Err(ConfigError::MalformedThreshold {
                    expr: self.expr.clone(),
                    reason: format!("`check` only applies to the `checks` metric, not `{metric}`"),
                })
            }
            (None, _) => None,
        };

        let classifier = FailureClassifier::new(&self.tolerate);
        let qualifier = match &check {
            Some(check) => format!("{{{check}}}"),
            None if !classifier.tolerated().is_empty() => {
                let statuses: Vec<String> =
                    classifier.tolerated().iter().map(u16::to_string).collect();
                format!("{{tolerate={}}}", statuses.join(","))
            }
            None => String::new(),
        };
        let name = format!("{metric}{qualifier}: {}", self.expr.trim());

        Ok(Threshold {
            name,
            metric,
            condition,
            classifier,
            check,
        })
    }
}

/// A validated threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Threshold {
    pub name: String,
    pub metric: Metric,
    pub condition: Condition,
    pub classifier: FailureClassifier,
    pub check: Option<String>,
}
