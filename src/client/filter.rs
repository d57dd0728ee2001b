//! Pure filtering, paging and option derivation over a recipe list.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use serde::Serialize;

use super::catalog::{Recipe, NOT_AVAILABLE};
use crate::vocab::DietTag;

/// Conjunctive recipe predicate. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub search_term: String,
    pub region: String,
    pub category: String,
}

impl RecipeFilter {
    pub fn new(
        search_term: impl Into<String>,
        region: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            region: region.into(),
            category: category.into(),
        }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        recipe
            .label
            .to_lowercase()
            .contains(&self.search_term.to_lowercase())
            && (self.region.is_empty() || recipe.region == self.region)
            && (self.category.is_empty() || recipe.category == self.category)
    }
}

/// Recipes of `recipes` that satisfy `filter`, in their original order.
pub fn filter<'a>(recipes: &'a [Recipe], filter: &RecipeFilter) -> Vec<&'a Recipe> {
    recipes.iter().filter(|recipe| filter.matches(recipe)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// Number of pages needed for `len` items; an empty list still has one page.
pub fn page_count(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Slice for page `page_number` (1-based). Out-of-range numbers are clamped to
/// the first or last page, so a non-empty list never yields an empty page.
pub fn paginate<T>(items: &[T], page_number: usize, page_size: NonZeroUsize) -> Page<'_, T> {
    let total_pages = page_count(items.len(), page_size);
    let number = page_number.clamp(1, total_pages);
    let start = (number - 1) * page_size.get();
    let end = (start + page_size.get()).min(items.len());
    Page {
        number,
        total_pages,
        total_items: items.len(),
        items: &items[start.min(items.len())..end],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub diet_tags: Vec<&'static str>,
}

/// Distinct regions and categories present in `recipes`, sorted, without the
/// "N/D" placeholder; diet tags are the fixed sorted list.
pub fn filter_options(recipes: &[Recipe]) -> FilterOptions {
    FilterOptions {
        regions: distinct(recipes.iter().map(|recipe| recipe.region.as_str())),
        categories: distinct(recipes.iter().map(|recipe| recipe.category.as_str())),
        diet_tags: DietTag::sorted_labels(),
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty() && *value != NOT_AVAILABLE)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
