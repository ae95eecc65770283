use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("reading word list {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("word list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry {index} ({word:?}) has a negative or non-finite weight")]
    InvalidWeight { index: usize, word: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordItem {
    pub text: String,
    pub weight: f32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl WordItem {
    pub fn new(text: impl Into<String>, weight: f32) -> Self {
        Self {
            text: text.into(),
            weight,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Accepts both `["word", 12]` pairs and `{"word": .., "weight": ..}` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Pair(String, f32),
    Object {
        #[serde(alias = "text")]
        word: String,
        weight: f32,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
}

impl From<RawEntry> for WordItem {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Pair(text, weight) => WordItem::new(text, weight),
            RawEntry::Object {
                word,
                weight,
                attributes,
            } => WordItem {
                text: word,
                weight,
                attributes,
            },
        }
    }
}

pub fn parse_word_list(json: &str) -> Result<Vec<WordItem>, ListError> {
    let raw: Vec<RawEntry> = serde_json::from_str(json)?;
    let items = raw.into_iter().map(WordItem::from).collect::<Vec<_>>();
    for (index, item) in items.iter().enumerate() {
        if !item.weight.is_finite() || item.weight < 0.0 {
            return Err(ListError::InvalidWeight {
                index,
                word: item.text.clone(),
            });
        }
    }
    Ok(items)
}

pub fn load_word_list(path: &Path) -> Result<Vec<WordItem>, ListError> {
    let content = fs::read_to_string(path).map_err(|source| ListError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_word_list(&content)
}
