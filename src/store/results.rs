//! The standard tabular envelope returned by graph-pattern queries
//! (`application/sparql-results+json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: Rows,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rows {
    #[serde(default)]
    pub bindings: Vec<Row>,
}

/// One solution: variable name to bound term. Unbound variables are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub BTreeMap<String, Term>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl Term {
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: "literal".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: "uri".to_string(),
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }
}

impl TabularResult {
    pub fn variable_names(&self) -> &[String] {
        &self.head.vars
    }

    pub fn rows(&self) -> &[Row] {
        &self.results.bindings
    }
}

impl Row {
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.0.get(variable)
    }

    /// Bound value of `variable`, treating empty strings as unbound.
    pub fn value(&self, variable: &str) -> Option<&str> {
        self.get(variable)
            .map(|term| term.value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn with(mut self, variable: &str, term: Term) -> Self {
        self.0.insert(variable.to_string(), term);
        self
    }
}
