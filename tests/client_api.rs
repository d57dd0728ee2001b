use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use httpmock::prelude::*;
use recipe_graph::client::catalog::NOT_AVAILABLE;
use recipe_graph::client::filter::filter_options;
use recipe_graph::client::{RecipeApi, RecipeCatalog, RecipeSource, ResponseCache};
use recipe_graph::completion::CompletionKind;
use recipe_graph::nutrition::NutritionLookup;
use recipe_graph::store::TabularResult;
use recipe_graph::vocab::DietTag;
use recipe_graph::Result;
use serde_json::{json, Value};

fn recipe_binding(local: &str, label: &str, region: Option<&str>) -> Value {
    let mut binding = json!({
        "recipe": {"type": "uri", "value": format!("http://dbpedia.org/resource/{local}")},
        "name": {"type": "literal", "value": label, "xml:lang": "it"},
        "category": {"type": "uri", "value": "http://dbpedia.org/resource/Dolce"},
    });
    if let Some(region) = region {
        binding["region"] = json!({"type": "uri", "value": format!("http://dbpedia.org/resource/{region}")});
    }
    binding
}

fn recipes_body(bindings: Vec<Value>) -> Value {
    json!({
        "head": {"vars": ["recipe", "name", "region", "category"]},
        "results": {"bindings": bindings}
    })
}

#[tokio::test]
async fn responses_are_cached_by_logical_key() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(recipes_body(vec![]));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    api.recipes().await.unwrap();
    api.recipes().await.unwrap();
    mock.assert_hits(1);

    api.clear_cache();
    api.recipes().await.unwrap();
    mock.assert_hits(2);
}

#[tokio::test]
async fn expired_entries_are_fetched_again() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/recipes/diet").query_param("type", "isVegan");
        then.status(200).json_body(recipes_body(vec![]));
    });

    let api = RecipeApi::with_cache(&server.base_url(), ResponseCache::with_ttl(Duration::ZERO)).unwrap();
    api.recipes_by_diet(DietTag::Vegan).await.unwrap();
    api.recipes_by_diet(DietTag::Vegan).await.unwrap();
    mock.assert_hits(2);
}

#[tokio::test]
async fn null_completions_are_not_cached() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/gemini")
            .query_param("type", "rework")
            .query_param("jsonToSend", "Replace Egg with Tofu");
        then.status(200).json_body(Value::Null);
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    let first = api.completion(CompletionKind::Rework, "Replace Egg with Tofu").await.unwrap();
    let second = api.completion(CompletionKind::Rework, "Replace Egg with Tofu").await.unwrap();
    assert_eq!(first, None);
    assert_eq!(second, None);
    mock.assert_hits(2);
}

#[tokio::test]
async fn ingredient_lookups_use_compact_names() {
    let server = MockServer::start();
    let alternatives = server.mock(|when, then| {
        when.method(GET).path("/alternatives").query_param("ingredient", "OliveOil");
        then.status(200).json_body(json!({"head": {"vars": []}, "results": {"bindings": []}}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ingredients/nutrition").query_param("name", "unicorn");
        then.status(200).json_body(json!({"error": "no nutrition facts for 'unicorn'"}));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    api.ingredient_alternatives("Olive Oil").await.unwrap();
    alternatives.assert();

    let lookup = api.ingredient_nutrition("unicorn").await.unwrap();
    assert!(matches!(lookup, NutritionLookup::Missing { .. }));
}

#[tokio::test]
async fn calorie_failures_resolve_to_empty_string() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ingredients/calories").query_param("name", "Egg");
        then.status(200).json_body(json!({"calories": "155"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/ingredients/calories").query_param("name", "Broken");
        then.status(500).json_body(json!({"error": "graph store error"}));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    assert_eq!(api.ingredient_calories("Egg").await, "155");
    assert_eq!(api.ingredient_calories("Broken").await, "");
}

#[tokio::test]
async fn server_errors_surface_as_upstream() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(500).json_body(json!({"error": "graph store error: Server error: Bad Gateway"}));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    let err = api.recipes().await.unwrap_err();
    assert!(!err.is_validation());
}

#[tokio::test]
async fn placeholder_region_is_not_offered_as_option() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(recipes_body(vec![
            recipe_binding("Zeppole", "Zeppole", None),
            recipe_binding("Cannoli", "Cannoli", None),
            recipe_binding("Pastiera", "Pastiera", Some("Campania")),
        ]));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    let mut catalog = RecipeCatalog::new();
    let recipes = catalog.load_all(&api).await.unwrap();

    let labels: Vec<_> = recipes.iter().map(|recipe| recipe.label.as_str()).collect();
    assert_eq!(labels, ["Cannoli", "Pastiera", "Zeppole"]);
    assert_eq!(recipes.iter().filter(|recipe| recipe.region == NOT_AVAILABLE).count(), 2);

    let options = filter_options(recipes);
    assert_eq!(options.regions, vec!["Campania"]);
    assert_eq!(options.categories, vec!["Dolce"]);
}

#[tokio::test]
async fn diet_load_replaces_working_set_until_reset() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/recipes");
        then.status(200).json_body(recipes_body(vec![
            recipe_binding("Cannoli", "Cannoli", Some("Sicilia")),
            recipe_binding("Sorbetto", "Sorbetto", Some("Sicilia")),
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/recipes/diet").query_param("type", "isLactoseFree");
        then.status(200)
            .json_body(recipes_body(vec![recipe_binding("Sorbetto", "Sorbetto", Some("Sicilia"))]));
    });

    let api = RecipeApi::new(&server.base_url()).unwrap();
    let mut catalog = RecipeCatalog::new();
    catalog.load_all(&api).await.unwrap();
    let lactose_free = catalog.load_by_diet_tag(&api, "lactoseFree").await.unwrap();
    assert_eq!(lactose_free.len(), 1);
    assert_eq!(catalog.all().len(), 2);

    catalog.reset_filters();
    assert_eq!(catalog.recipes().len(), 2);
}

#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
}

impl CountingSource {
    fn empty(&self) -> Result<TabularResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TabularResult::default())
    }
}

#[async_trait]
impl RecipeSource for CountingSource {
    async fn recipes(&self) -> Result<TabularResult> {
        self.empty()
    }

    async fn recipes_by_diet(&self, _tag: DietTag) -> Result<TabularResult> {
        self.empty()
    }

    async fn ingredient_nutrition(&self, ingredient: &str) -> Result<NutritionLookup> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NutritionLookup::missing(ingredient))
    }

    async fn ingredient_alternatives(&self, _ingredient: &str) -> Result<TabularResult> {
        self.empty()
    }

    async fn completion(&self, _kind: CompletionKind, _payload: &str) -> Result<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn unknown_diet_tag_is_rejected_before_any_call() {
    let source = CountingSource::default();
    let mut catalog = RecipeCatalog::new();
    let err = catalog.load_by_diet_tag(&source, "bogus").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    catalog.load_by_diet_tag(&source, "vegan").await.unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}
