//! Static assessment catalog, loaded once from a JSON-lines file.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Items in this category are bundles, not individual assessments.
pub const EXCLUDED_CATEGORY: &str = "Pre-packaged Job Solutions";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    /// Identity key
    pub url: String,
    pub description: String,
    pub test_type: Option<String>,
    pub category: String,
}

impl CatalogItem {
    /// Text fed to the encoder: name first, then description.
    pub fn embedding_text(&self) -> String {
        format!("{} \n{}", self.name, self.description)
    }
}

/// One line of the catalog file. Every field may be missing or null.
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    test_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

impl From<CatalogRecord> for CatalogItem {
    fn from(record: CatalogRecord) -> Self {
        CatalogItem {
            name: record.name.unwrap_or_default(),
            url: record.url.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            test_type: record.test_type.filter(|t| !t.trim().is_empty()),
            category: record.category.unwrap_or_default(),
        }
    }
}

/// Immutable, ordered list of catalog items.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Load the catalog from a JSON-lines file.
    ///
    /// Malformed lines are skipped. A missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("no catalog at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let now = Instant::now();
        let reader = BufReader::new(file);

        let mut items = vec![];
        let mut skipped = 0usize;
        let mut excluded = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) if err.kind() == ErrorKind::InvalidData => {
                    log::debug!("catalog line {}: not valid utf8, skipping", line_no + 1);
                    skipped += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if line.trim().is_empty() {
                continue;
            }

            let record: CatalogRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(err) => {
                    log::debug!("catalog line {}: {err}, skipping", line_no + 1);
                    skipped += 1;
                    continue;
                }
            };

            let item = CatalogItem::from(record);
            if item.category == EXCLUDED_CATEGORY {
                excluded += 1;
                continue;
            }

            items.push(item);
        }

        log::info!(
            "loaded {} catalog items from {} (skipped={skipped} excluded={excluded})",
            items.len(),
            path.display()
        );
        log::debug!(
            "took {}ms to read catalog",
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(Self { items })
    }

    /// Build a catalog from items already in memory, applying the same
    /// category filter as `load`.
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let items = items
            .into_iter()
            .filter(|item| item.category != EXCLUDED_CATEGORY)
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    /// Encoder input for every item, in catalog order.
    pub fn texts(&self) -> Vec<String> {
        self.items.iter().map(CatalogItem::embedding_text).collect()
    }

    /// Distinct type codes present in the catalog, sorted.
    pub fn type_codes(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.test_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
