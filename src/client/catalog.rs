//! The in-memory recipe collection and the mapping from store rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::api::RecipeSource;
use super::names::{display_name, local_name};
use crate::error::Result;
use crate::store::queries::vars;
use crate::store::{Row, TabularResult};
use crate::vocab::DietTag;

/// Placeholder for a missing region or category.
pub const NOT_AVAILABLE: &str = "N/D";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: String,
    pub label: String,
    pub region: String,
    pub category: String,
    /// Ingredient resource identifiers in store order.
    pub ingredients: Vec<String>,
    pub topic: Option<String>,
    pub preparation_text: Option<String>,
    pub ingredient_text: Option<String>,
}

impl Recipe {
    /// Builds a recipe from one result row; rows without a recipe binding are skipped.
    pub fn from_row(row: &Row) -> Option<Self> {
        let uri = row.value(vars::RECIPE)?;
        let label = row
            .value(vars::NAME)
            .map(str::to_string)
            .unwrap_or_else(|| display_name(uri));
        let tag = |variable: &str| {
            row.value(variable)
                .map(display_name)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Some(Self {
            id: local_name(uri),
            label,
            region: tag(vars::REGION),
            category: tag(vars::CATEGORY),
            ingredients: row
                .value(vars::INGREDIENTS)
                .map(split_ingredients)
                .unwrap_or_default(),
            topic: row.value(vars::TOPIC).map(str::to_string),
            preparation_text: row.value(vars::PREPARATION).map(str::to_string),
            ingredient_text: row.value(vars::INGREDIENT_TEXT).map(str::to_string),
        })
    }

    /// Display names of the ingredients, in order.
    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|uri| display_name(uri)).collect()
    }

    /// Folds a later row for the same recipe into this one. Ingredients
    /// already listed are not repeated.
    fn absorb(&mut self, other: Recipe) {
        for ingredient in other.ingredients {
            if !self.ingredients.contains(&ingredient) {
                self.ingredients.push(ingredient);
            }
        }
        if self.region == NOT_AVAILABLE {
            self.region = other.region;
        }
        if self.category == NOT_AVAILABLE {
            self.category = other.category;
        }
        self.topic = self.topic.take().or(other.topic);
        self.preparation_text = self.preparation_text.take().or(other.preparation_text);
        self.ingredient_text = self.ingredient_text.take().or(other.ingredient_text);
    }
}

fn split_ingredients(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps a result to recipes, one per recipe identifier, sorted by label.
pub fn recipes_from_result(result: &TabularResult) -> Vec<Recipe> {
    let mut recipes: Vec<Recipe> = Vec::with_capacity(result.rows().len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for recipe in result.rows().iter().filter_map(Recipe::from_row) {
        match positions.get(&recipe.id) {
            Some(&index) => recipes[index].absorb(recipe),
            None => {
                positions.insert(recipe.id.clone(), recipes.len());
                recipes.push(recipe);
            }
        }
    }
    sort_by_label(&mut recipes);
    recipes
}

/// Stable sort, so equal labels keep their store order.
pub fn sort_by_label(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| compare_labels(&a.label, &b.label));
}

/// Ordering close to a locale collation for Latin scripts: letters compare
/// without case and accents first, then unaccented before accented, then
/// lowercase before uppercase.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| {
            let case = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();
            case(a).cmp(&case(b))
        })
}

fn primary_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => key.push('a'),
            'æ' => key.push_str("ae"),
            'ç' => key.push('c'),
            'è' | 'é' | 'ê' | 'ë' => key.push('e'),
            'ì' | 'í' | 'î' | 'ï' => key.push('i'),
            'ñ' => key.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => key.push('o'),
            'œ' => key.push_str("oe"),
            'ù' | 'ú' | 'û' | 'ü' => key.push('u'),
            'ý' | 'ÿ' => key.push('y'),
            'ß' => key.push_str("ss"),
            other => key.push(other),
        }
    }
    key
}

/// Every loaded recipe plus the working set the browse view filters.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    all: Vec<Recipe>,
    working: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every recipe; replaces both the full list and the working set.
    pub async fn load_all(&mut self, source: &dyn RecipeSource) -> Result<&[Recipe]> {
        let result = source.recipes().await?;
        self.all = recipes_from_result(&result);
        self.working = self.all.clone();
        info!(recipes = self.all.len(), "catalog loaded");
        Ok(&self.working)
    }

    /// Loads the recipes tagged with diet `tag` into the working set.
    ///
    /// `tag` is validated before anything is fetched.
    pub async fn load_by_diet_tag(
        &mut self,
        source: &dyn RecipeSource,
        tag: &str,
    ) -> Result<&[Recipe]> {
        let tag: DietTag = tag.parse()?;
        self.load_by_diet(source, tag).await
    }

    pub async fn load_by_diet(
        &mut self,
        source: &dyn RecipeSource,
        tag: DietTag,
    ) -> Result<&[Recipe]> {
        let result = source.recipes_by_diet(tag).await?;
        self.working = recipes_from_result(&result);
        debug!(%tag, recipes = self.working.len(), "diet recipes loaded");
        Ok(&self.working)
    }

    /// Restores the full list as the working set.
    pub fn reset_filters(&mut self) {
        self.working = self.all.clone();
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.working
    }

    pub fn all(&self) -> &[Recipe] {
        &self.all
    }

    pub fn find(&self, id: &str) -> Option<&Recipe> {
        self.working
            .iter()
            .chain(self.all.iter())
            .find(|recipe| recipe.id == id)
    }
}
