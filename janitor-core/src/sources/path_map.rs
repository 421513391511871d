use crate::config::PathMapping;

/// Rewrites remote path prefixes to local ones. The first matching mapping
/// wins; unmatched paths pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTranslator {
    mappings: Vec<PathMapping>,
}

impl PathTranslator {
    pub fn new(mappings: Vec<PathMapping>) -> Self {
        Self { mappings }
    }

    /// Rewrites the first matching prefix; other paths pass through unchanged.
    pub fn translate(&self, raw: &str) -> String {
        for mapping in &self.mappings {
            if mapping.from.is_empty() {
                continue;
            }
            if let Some(rest) = raw.strip_prefix(mapping.from.as_str()) {
                return format!("{}{}", mapping.to, rest);
            }
        }
        raw.to_string()
    }
}
