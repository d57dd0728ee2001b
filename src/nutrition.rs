use serde::{Deserialize, Serialize};

use crate::store::queries::vars;
use crate::store::Row;

/// Per-100 g nutrition facts of one ingredient as recorded in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbohydrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturated_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsaturated_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
}

fn number(row: &Row, variable: &str) -> Option<f64> {
    row.value(variable)
        .and_then(|value| value.trim().parse::<f64>().ok())
}

impl NutritionFacts {
    pub fn from_row(row: &Row) -> Self {
        Self {
            calories: number(row, vars::CALORIES),
            carbohydrate: number(row, "carbohydrate"),
            fiber: number(row, "fiber"),
            salt: number(row, "salt"),
            saturated_fat: number(row, "saturatedFat"),
            sugar: number(row, "sugar"),
            unsaturated_fat: number(row, "unsaturatedFat"),
            protein: number(row, "protein"),
        }
    }
}

/// Body of `/ingredients/nutrition`: the record, or an error message when the
/// store knows nothing about the ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutritionLookup {
    Missing { error: String },
    Found(NutritionFacts),
}

impl NutritionLookup {
    pub fn missing(ingredient: &str) -> Self {
        Self::Missing {
            error: format!("no nutrition facts for '{ingredient}'"),
        }
    }

    pub fn facts(&self) -> Option<&NutritionFacts> {
        match self {
            Self::Found(facts) => Some(facts),
            Self::Missing { .. } => None,
        }
    }

    pub fn into_facts(self) -> Option<NutritionFacts> {
        match self {
            Self::Found(facts) => Some(facts),
            Self::Missing { .. } => None,
        }
    }
}

/// Body of `/ingredients/calories`; empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaloriesLookup {
    pub calories: String,
}
