mod semantic;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::catalog::CatalogItem;
use crate::semantic::{EmbeddingError, TextEncoder};

/// Bag-of-words encoder hashing lowercase tokens into a fixed number of
/// buckets. Deterministic and offline; texts sharing words score higher.
pub struct HashingEncoder {
    dimensions: usize,
}

impl HashingEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl TextEncoder for HashingEncoder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0; self.dimensions];
                for token in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|t| !t.is_empty())
                {
                    let mut hasher = DefaultHasher::new();
                    token.to_lowercase().hash(&mut hasher);
                    v[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
                }
                // keep every vector non-zero
                v[0] += 0.01;
                v
            })
            .collect())
    }
}

pub fn item(name: &str, url: &str, test_type: Option<&str>, description: &str) -> CatalogItem {
    CatalogItem {
        name: name.to_string(),
        url: url.to_string(),
        description: description.to_string(),
        test_type: test_type.map(str::to_string),
        category: "Individual Test Solutions".to_string(),
    }
}

/// A small catalog spanning knowledge (K), personality (P) and ability (A)
/// assessments.
pub fn sample_items() -> Vec<CatalogItem> {
    vec![
        item("Core Java (Entry Level)", "https://catalog.test/core-java-entry", Some("K"), "Multi-choice test of Java fundamentals, 30 minutes, remote proctored."),
        item("Core Java (Advanced Level)", "https://catalog.test/core-java-advanced", Some("K"), "Advanced Java programming knowledge. Completion time 40 minutes."),
        item("Java 8 (New)", "https://catalog.test/java-8", Some("K"), "Java 8 streams, lambdas and collections. Online test."),
        item("Python (New)", "https://catalog.test/python", Some("K"), "Python programming knowledge, 11 min."),
        item("SQL Server", "https://catalog.test/sql-server", Some("K"), "SQL queries and database design."),
        item("JavaScript", "https://catalog.test/javascript", Some("K"), "JavaScript language and browser programming."),
        item("Occupational Personality Questionnaire OPQ32r", "https://catalog.test/opq32r", Some("P"), "Personality questionnaire for work behaviour, 25 minutes, unproctored."),
        item("Motivation Questionnaire", "https://catalog.test/mq", Some("P"), "What motivates people at work."),
        item("Global Skills Assessment", "https://catalog.test/gsa", Some("P"), "Collaboration and communication skills at work."),
        item("Verify Numerical Ability", "https://catalog.test/verify-numerical", Some("A"), "Computer adaptive numerical reasoning (CAT), 18 minutes."),
        item("Verify Verbal Ability", "https://catalog.test/verify-verbal", Some("A"), "Adaptive verbal reasoning test taken at home."),
        item("Verify Inductive Reasoning", "https://catalog.test/verify-inductive", Some("A"), "Inductive reasoning with abstract patterns."),
        item("Account Manager Solution", "https://catalog.test/account-manager", None, "Sales and account management simulation."),
    ]
}
