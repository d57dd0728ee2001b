//! Consumer side of the recipe server: cached route client, catalog, browse
//! state and the detail view.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod detail;
pub mod filter;
pub mod names;
pub mod state;

pub use api::{RecipeApi, RecipeSource};
pub use cache::ResponseCache;
pub use catalog::{Recipe, RecipeCatalog};
pub use detail::{assemble, rework, DetailEvent, DetailView, Selection};
pub use filter::{filter, filter_options, paginate, RecipeFilter};
pub use state::{list_view, BrowseAction, BrowseState};
