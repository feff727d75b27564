use serde::{Deserialize, Serialize};

/// Boolean predicate over a received response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    StatusIs(u16),
    StatusIn(Vec<u16>),
    BodyContains(String),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn matches(&self, status: u16, body: &[u8]) -> bool {
        match self {
            Predicate::StatusIs(expected) => status == *expected,
            Predicate::StatusIn(expected) => expected.contains(&status),
            Predicate::BodyContains(needle) => contains(body, needle.as_bytes()),
            Predicate::All(all) => all.iter().all(|p| p.matches(status, body)),
            Predicate::Any(any) => any.iter().any(|p| p.matches(status, body)),
            Predicate::Not(inner) => !inner.matches(status, body),
        }
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A named check as declared in a run configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub predicate: Predicate,
}

impl CheckSpec {
    pub fn new(name: &str, predicate: Predicate) -> Self {
        Self {
            name: name.to_string(),
            predicate,
        }
    }
}
