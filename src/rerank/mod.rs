//! Optional second-stage relevance scoring by an external text model.
//!
//! The top candidates are described in a numbered prompt, the model replies
//! with `{"scores":[{"index":1,"score":0.9}, ...]}`, and each scored
//! candidate's similarity is blended 50/50 with the model's score.
//!
//! Every failure (transport, status, unparseable reply) comes back as a
//! `RerankError`; callers keep their original ordering in that case.

pub mod gemini;

use std::collections::HashMap;

use serde_json::Value;

use crate::config::RerankConfig;
use crate::types::Candidate;

pub use gemini::GeminiModel;

/// Default number of candidates described to the relevance model.
pub const DEFAULT_MAX_CANDIDATES: usize = 30;

/// Weight of the embedding similarity in the blended score.
const SIMILARITY_WEIGHT: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum RerankError {
    #[error("reqwest error: {0:?}")]
    Reqwest(#[from] reqwest::Error),

    #[error("relevance service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed relevance response: {0}")]
    Malformed(String),

    #[error("relevance response contained no usable scores")]
    NoScores,
}

/// An external service that completes a text prompt.
pub trait RelevanceModel: Send + Sync {
    /// Get the name of this model for logging/debugging
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw text of the reply.
    fn generate(&self, prompt: &str) -> Result<String, RerankError>;
}

/// Relevance reranking capability, selected once at startup.
pub enum Reranker {
    Disabled,
    Available {
        model: Box<dyn RelevanceModel>,
        max_candidates: usize,
    },
}

impl Reranker {
    /// Select the reranker from configuration and the environment.
    ///
    /// Available only when enabled in config and the credential variable
    /// holds a non-empty value.
    pub fn from_config(config: &RerankConfig) -> Self {
        if !config.enabled {
            log::info!("reranker=disabled reason=config");
            return Reranker::Disabled;
        }

        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                log::info!(
                    "reranker=disabled reason={} is not set",
                    config.api_key_env
                );
                return Reranker::Disabled;
            }
        };

        match GeminiModel::new(api_key, config) {
            Ok(model) => {
                log::info!("reranker={} enabled", model.name());
                Reranker::available(Box::new(model), config.max_candidates)
            }
            Err(err) => {
                log::warn!("reranker=disabled reason=client err={err}");
                Reranker::Disabled
            }
        }
    }

    pub fn available(model: Box<dyn RelevanceModel>, max_candidates: usize) -> Self {
        Reranker::Available {
            model,
            max_candidates: max_candidates.max(1),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reranker::Available { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Reranker::Disabled => "disabled",
            Reranker::Available { model, .. } => model.name(),
        }
    }

    /// Return `candidates` reordered by blended relevance.
    ///
    /// `Disabled` returns them unchanged. Only the first `max_candidates`
    /// are sent for scoring; the rest keep their similarity score but take
    /// part in the final sort.
    pub fn rerank(
        &self,
        query: &str,
        candidates: &[Candidate],
    ) -> Result<Vec<Candidate>, RerankError> {
        let (model, max_candidates) = match self {
            Reranker::Disabled => return Ok(candidates.to_vec()),
            Reranker::Available {
                model,
                max_candidates,
            } => (model, *max_candidates),
        };

        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let prompted = candidates.len().min(max_candidates);
        let prompt = build_prompt(query, &candidates[..prompted]);
        let reply = model.generate(&prompt)?;
        let scores = parse_scores(&reply, prompted)?;

        let mut reranked = candidates.to_vec();
        blend_scores(&mut reranked, &scores);

        log::debug!(
            "reranker={} scored={} of {}",
            model.name(),
            scores.len(),
            candidates.len()
        );

        Ok(reranked)
    }
}

/// Numbered candidate listing plus the query and the reply format.
pub fn build_prompt(query: &str, candidates: &[Candidate]) -> String {
    let mut prompt = String::from(
        "You are a ranking model. Given a hiring query, score each candidate assessment for \
         relevance on a 0..1 scale. Return strictly JSON with an array of objects {index, score}. \
         No extra text.\n\n",
    );

    prompt.push_str(&format!("Query: {query}\n"));
    prompt.push_str("Candidates:\n");
    for (i, c) in candidates.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. name={}; url={}; type={}; desc={}\n",
            i + 1,
            c.name,
            c.url,
            c.test_type.as_deref().unwrap_or("none"),
            c.description
        ));
    }
    prompt.push_str("\nJSON only: {\"scores\":[{\"index\":1,\"score\":0.9}] }");

    prompt
}

/// Parse the model's reply into zero-based candidate position -> score.
///
/// Entries that cannot be read, or that point outside the `prompted`
/// candidates, are skipped. A reply with no usable entry is an error.
pub fn parse_scores(reply: &str, prompted: usize) -> Result<HashMap<usize, f32>, RerankError> {
    let body = strip_code_fence(reply.trim());
    if !body.starts_with('{') {
        return Err(RerankError::Malformed(format!(
            "expected a JSON object, got {:?}",
            body.chars().take(40).collect::<String>()
        )));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| RerankError::Malformed(e.to_string()))?;

    let entries = value
        .get("scores")
        .and_then(Value::as_array)
        .ok_or_else(|| RerankError::Malformed("missing `scores` array".to_string()))?;

    let mut scores = HashMap::new();
    for entry in entries {
        let index = entry.get("index").and_then(read_index);
        let score = entry.get("score").and_then(read_score);
        let (Some(index), Some(score)) = (index, score) else {
            continue;
        };

        if index == 0 || index > prompted {
            continue;
        }
        scores.insert(index - 1, score);
    }

    if scores.is_empty() {
        return Err(RerankError::NoScores);
    }

    Ok(scores)
}

/// Blend external scores into the similarity scores and re-sort.
///
/// The sort is stable, so equal scores keep their previous relative order.
pub fn blend_scores(candidates: &mut [Candidate], scores: &HashMap<usize, f32>) {
    for (i, candidate) in candidates.iter_mut().enumerate() {
        if let Some(external) = scores.get(&i) {
            candidate.score =
                SIMILARITY_WEIGHT * candidate.score + (1.0 - SIMILARITY_WEIGHT) * external;
        }
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };

    rest.trim_end().trim_end_matches("```").trim()
}

fn read_index(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    if let Some(f) = value.as_f64() {
        if f >= 0.0 && f.fract() == 0.0 {
            return Some(f as usize);
        }
        return None;
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

fn read_score(value: &Value) -> Option<f32> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    if score.is_finite() {
        Some(score as f32)
    } else {
        None
    }
}
