//! Browse-screen state and its transitions. Views are recomputed from the
//! state and the catalog's working set; nothing is mutated in place.

use std::num::NonZeroUsize;

use super::catalog::Recipe;
use super::filter::{filter, filter_options, page_count, paginate, FilterOptions, RecipeFilter};
use crate::vocab::DietTag;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    Search(String),
    Region(String),
    Category(String),
    /// The working set has been reloaded for this diet (`None` = all recipes).
    Diet(Option<DietTag>),
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
    Select(String),
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    pub filter: RecipeFilter,
    pub diet: Option<DietTag>,
    /// 1-based.
    pub page: usize,
    pub page_size: NonZeroUsize,
    /// Identifier of the recipe whose detail is open.
    pub selected: Option<String>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl BrowseState {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            filter: RecipeFilter::default(),
            diet: None,
            page: 1,
            page_size,
            selected: None,
        }
    }

    /// Next state after `action`, given the working set it applies to.
    pub fn apply(mut self, action: BrowseAction, recipes: &[Recipe]) -> Self {
        match action {
            BrowseAction::Search(term) => {
                self.filter.search_term = term;
                self.restart();
            }
            BrowseAction::Region(region) => {
                self.filter.region = region;
                self.restart();
            }
            BrowseAction::Category(category) => {
                self.filter.category = category;
                self.restart();
            }
            BrowseAction::Diet(diet) => {
                self.diet = diet;
                // Selections that the new working set cannot offer fall back to "any".
                let options = filter_options(recipes);
                if !options.regions.contains(&self.filter.region) {
                    self.filter.region.clear();
                }
                if !options.categories.contains(&self.filter.category) {
                    self.filter.category.clear();
                }
                self.restart();
            }
            BrowseAction::FirstPage => self.page = 1,
            BrowseAction::PreviousPage => self.page = self.page.saturating_sub(1).max(1),
            BrowseAction::NextPage => {
                self.page = (self.page + 1).min(self.total_pages(recipes));
            }
            BrowseAction::LastPage => self.page = self.total_pages(recipes),
            BrowseAction::Select(id) => self.selected = Some(id),
            BrowseAction::Back => self.selected = None,
        }
        self
    }

    fn restart(&mut self) {
        self.page = 1;
        self.selected = None;
    }

    fn total_pages(&self, recipes: &[Recipe]) -> usize {
        page_count(filter(recipes, &self.filter).len(), self.page_size)
    }
}

/// What the list screen shows for a state.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<'a> {
    pub recipes: Vec<&'a Recipe>,
    pub total_matches: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub options: FilterOptions,
    pub selected: Option<&'a Recipe>,
}

pub fn list_view<'a>(recipes: &'a [Recipe], state: &BrowseState) -> ListView<'a> {
    let matches = filter(recipes, &state.filter);
    let page = paginate(&matches, state.page, state.page_size);
    let selected = state
        .selected
        .as_deref()
        .and_then(|id| recipes.iter().find(|recipe| recipe.id == id));
    ListView {
        // The list is hidden while a detail is open.
        recipes: if selected.is_some() {
            Vec::new()
        } else {
            page.items.to_vec()
        },
        total_matches: matches.len(),
        page: page.number,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        options: filter_options(recipes),
        selected,
    }
}
