use crate::error::{Bm25Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TermId = u32;
pub type DocId = u32;

/// Field name to field text, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, String>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    pub fn field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(name.into(), text.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.fields.get(name).map(String::as_str) }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Build a document from a JSON object. Non-string values are indexed by their
    /// JSON text; `null` values are skipped and a `null` document is rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Err(Bm25Error::NullDocument),
            Value::Object(map) => Ok(map
                .iter()
                .filter_map(|(name, v)| match v {
                    Value::Null => None,
                    Value::String(s) => Some((name.clone(), s.clone())),
                    other => Some((name.clone(), other.to_string())),
                })
                .collect()),
            other => {
                let text = other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string());
                Ok(Document::new().field("content", text))
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Document {
    fn from(pairs: [(K, V); N]) -> Self { pairs.into_iter().collect() }
}

/// One ranked result: document index and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: DocId,
    pub score: f64,
}
