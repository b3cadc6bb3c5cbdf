//! Heuristic attributes read out of an assessment's free text.
//!
//! Matching is purely lexical: "not remote-compatible" still
//! counts as remote support.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Candidate, Recommendation, Support};

static ADAPTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)adaptive|adaptive test|\bCAT\b|computer.?adaptive")
        .expect("adaptive pattern is valid")
});

static REMOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)remote|proctor|online|unproctored|at home").expect("remote pattern is valid")
});

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(minutes|min)\b").expect("duration pattern is valid")
});

pub fn adaptive_support(text: &str) -> Support {
    ADAPTIVE_REGEX.is_match(text).into()
}

pub fn remote_support(text: &str) -> Support {
    REMOTE_REGEX.is_match(text).into()
}

/// First "<n> minutes" / "<n> min" mention, in minutes.
pub fn duration_minutes(text: &str) -> Option<u32> {
    DURATION_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl From<Candidate> for Recommendation {
    fn from(candidate: Candidate) -> Self {
        let text = format!("{} {}", candidate.description, candidate.name);

        Recommendation {
            adaptive_support: adaptive_support(&text),
            remote_support: remote_support(&text),
            duration: duration_minutes(&text),
            test_type: candidate.test_type.into_iter().collect(),
            url: candidate.url,
            description: candidate.description,
            relevance_score: Some(candidate.score),
        }
    }
}
