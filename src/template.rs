use std::collections::HashMap;
use std::path::Path;

use crate::error::GustError;

/// A prompt template with `{name}` placeholders. `{{` and `}}` escape
/// literal braces. Loaded once per run, applied once per row.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Template {
    /// Read a template from a UTF-8 text file. A missing, unreadable,
    /// or empty file is a fatal configuration error.
    pub fn load(path: &Path) -> Result<Self, GustError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GustError::Configuration(format!(
                "failed to load prompt template {}: {e}",
                path.display()
            ))
        })?;
        if text.is_empty() {
            return Err(GustError::Configuration(format!(
                "prompt template {} is empty",
                path.display()
            )));
        }
        Ok(Self { text })
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Distinct placeholder names, in first-appearance order.
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let mut chars = self.text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                }
                '{' => {
                    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    if !name.is_empty() && !seen.contains(&name) {
                        seen.push(name);
                    }
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                }
                _ => {}
            }
        }
        seen
    }

    /// Resolve every placeholder against `fields`. A placeholder with no
    /// matching field is a row-level formatting error naming the field.
    pub fn substitute(&self, fields: &HashMap<String, String>) -> Result<String, GustError> {
        let mut out = String::with_capacity(self.text.len());
        let mut chars = self.text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '{' => {
                    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    let value = fields.get(&name).ok_or_else(|| GustError::Formatting {
                        field: name.clone(),
                    })?;
                    out.push_str(value);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}
