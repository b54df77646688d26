use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::config::{read_to_string, ConfigError};

const BUILTIN_TAXONOMY: &str = include_str!("../config/categories.toml");

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaxonomyError {
    #[error("Failed to parse taxonomy TOML: {0}")]
    Toml(String),
    #[error("Taxonomy declares no categories")]
    NoCategories,
    #[error("Category #{0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate category: '{0}'")]
    DuplicateName(String),
    #[error("Category '{0}' has no triggers")]
    NoTriggers(String),
    #[error("Category '{0}' has an empty trigger")]
    EmptyTrigger(String),
    #[error("Fallback category name is empty")]
    EmptyFallback,
}

/// One row of the rule table: a label and the literals that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub triggers: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, triggers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Case-sensitive literal substring match on any trigger.
    pub fn matches(&self, body: &str) -> bool {
        self.triggers.iter().any(|t| body.contains(t.as_str()))
    }
}

/// The ordered rule table plus its fallback label, as stored in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub fallback: String,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategoryRule>,
}

impl Taxonomy {
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        if self.categories.is_empty() {
            return Err(TaxonomyError::NoCategories);
        }
        if self.fallback.trim().is_empty() {
            return Err(TaxonomyError::EmptyFallback);
        }
        let mut seen = HashSet::new();
        for (idx, rule) in self.categories.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(TaxonomyError::EmptyName(idx));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(TaxonomyError::DuplicateName(rule.name.clone()));
            }
            if rule.triggers.is_empty() {
                return Err(TaxonomyError::NoTriggers(rule.name.clone()));
            }
            if rule.triggers.iter().any(|t| t.is_empty()) {
                return Err(TaxonomyError::EmptyTrigger(rule.name.clone()));
            }
        }
        Ok(())
    }
}

/// Outcome of classifying one body. `rule_index` is `None` for the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub label: &'a str,
    pub rule_index: Option<usize>,
}

impl Classification<'_> {
    pub fn is_fallback(&self) -> bool {
        self.rule_index.is_none()
    }
}

/// First-match-wins classifier over an ordered [`Taxonomy`].
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    taxonomy: Taxonomy,
}

impl CategoryClassifier {
    pub fn new(taxonomy: Taxonomy) -> Result<Self, TaxonomyError> {
        taxonomy.validate()?;
        Ok(Self { taxonomy })
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, TaxonomyError> {
        let taxonomy: Taxonomy =
            toml::from_str(toml_content).map_err(|e| TaxonomyError::Toml(e.to_string()))?;
        Self::new(taxonomy)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    /// The table shipped in `config/categories.toml`.
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_TAXONOMY).expect("built-in taxonomy is valid")
    }

    pub fn classify<'a>(&'a self, body: &str) -> Classification<'a> {
        self.taxonomy
            .categories
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(body))
            .map(|(idx, rule)| Classification {
                label: &rule.name,
                rule_index: Some(idx),
            })
            .unwrap_or(Classification {
                label: &self.taxonomy.fallback,
                rule_index: None,
            })
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.taxonomy.categories
    }

    pub fn fallback(&self) -> &str {
        &self.taxonomy.fallback
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
