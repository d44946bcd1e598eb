use serde_json::Value;

use super::Document;
use crate::error::{AppError, Result};

/// Conjunction of top-level field equalities. Empty matches everything.
///
/// A condition matches only a JSON string equal to its value: numbers,
/// booleans and nulls never match, whatever their text form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    conditions: Vec<(String, String)>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field == value`, replacing an earlier condition on the same field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.conditions.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.conditions.push((field, value)),
        }
        self
    }

    /// Like [`eq`](Self::eq) but skips `None` and empty strings.
    pub fn eq_opt(self, field: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(v) if !v.is_empty() => self.eq(field, v),
            _ => self,
        }
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| matches!(doc.get(field), Some(Value::String(s)) if s == value))
    }

    /// Field names end up inside JSON paths, so only plain identifiers pass.
    pub fn validate(&self) -> Result<()> {
        for (field, _) in &self.conditions {
            let ok = !field.is_empty()
                && field
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !ok {
                return Err(AppError::BadRequest(format!(
                    "invalid filter field: {}",
                    field
                )));
            }
        }
        Ok(())
    }
}
