use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class label produced by the scorer for a composite bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(i64);

impl Confidence {
    pub fn new(label: i64) -> Self {
        Confidence(label)
    }

    pub fn label(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence(1)
    }
}

/// Decides whether a scored candidate becomes a signal.
///
/// A candidate with no label at all (scorer failed or abstained) is always
/// rejected; the policy only judges labels that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConfidencePolicy {
    #[default]
    AcceptAll,
    RequireLabel(i64),
}

impl ConfidencePolicy {
    pub fn accepts(&self, confidence: Option<Confidence>) -> bool {
        match (self, confidence) {
            (_, None) => false,
            (ConfidencePolicy::AcceptAll, Some(_)) => true,
            (ConfidencePolicy::RequireLabel(want), Some(c)) => c.label() == *want,
        }
    }
}

impl fmt::Display for ConfidencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidencePolicy::AcceptAll => write!(f, "accept-all"),
            ConfidencePolicy::RequireLabel(label) => write!(f, "label:{label}"),
        }
    }
}

impl FromStr for ConfidencePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "accept-all" || s == "accept_all" {
            return Ok(ConfidencePolicy::AcceptAll);
        }
        match s.strip_prefix("label:") {
            Some(label) => label
                .parse::<i64>()
                .map(ConfidencePolicy::RequireLabel)
                .map_err(|_| format!("Invalid label in confidence policy: {s}")),
            None => Err(format!(
                "Unknown confidence policy: {s} (use accept-all or label:<n>)"
            )),
        }
    }
}

impl TryFrom<String> for ConfidencePolicy {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ConfidencePolicy> for String {
    fn from(policy: ConfidencePolicy) -> Self {
        policy.to_string()
    }
}
