use serde::{Deserialize, Serialize};

/// User-facing reason a fetch failed, derived from the extractor's diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    RequiresAuth,
    Private,
    Unavailable,
    RateLimited,
    Generic,
}

/// Ordered rules; the first rule with any matching needle wins.
const RULES: &[(FailureCause, &[&str])] = &[
    (FailureCause::RequiresAuth, &["login", "cookies"]),
    (FailureCause::Private, &["private"]),
    (FailureCause::Unavailable, &["unavailable", "removed"]),
    (FailureCause::RateLimited, &["rate", "429"]),
];

impl FailureCause {
    /// Classify raw diagnostic text. Matching is case-insensitive.
    pub fn classify(diagnostic: &str) -> Self {
        let lowered = diagnostic.to_lowercase();
        RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lowered.contains(n)))
            .map_or(Self::Generic, |(cause, _)| *cause)
    }

    /// Classify a failed fetch. A run killed by the wall-clock timeout is
    /// always generic, whatever partial output it left behind.
    pub fn from_failure(diagnostic: &str, timed_out: bool) -> Self {
        if timed_out {
            Self::Generic
        } else {
            Self::classify(diagnostic)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequiresAuth => "requires_auth",
            Self::Private => "private",
            Self::Unavailable => "unavailable",
            Self::RateLimited => "rate_limited",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
