use std::sync::Mutex;

use async_trait::async_trait;
use recipe_graph::client::catalog::Recipe;
use recipe_graph::client::detail::{assemble, rework, DetailEvent, DetailStatus, Selection, NO_REWORK_FOUND};
use recipe_graph::client::RecipeSource;
use recipe_graph::completion::CompletionKind;
use recipe_graph::nutrition::{NutritionFacts, NutritionLookup};
use recipe_graph::store::{Row, TabularResult, Term};
use recipe_graph::vocab::{AlternativeRelation, DietTag};
use recipe_graph::{Error, Result};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FakeSource {
    missing: Vec<&'static str>,
    failing: Vec<&'static str>,
    hanging: Vec<&'static str>,
    reply: Option<Value>,
    completions: Mutex<Vec<(CompletionKind, String)>>,
}

impl FakeSource {
    fn completions(&self) -> Vec<(CompletionKind, String)> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeSource for FakeSource {
    async fn recipes(&self) -> Result<TabularResult> {
        Ok(TabularResult::default())
    }

    async fn recipes_by_diet(&self, _tag: DietTag) -> Result<TabularResult> {
        Ok(TabularResult::default())
    }

    async fn ingredient_nutrition(&self, ingredient: &str) -> Result<NutritionLookup> {
        if self.hanging.iter().any(|name| *name == ingredient) {
            futures::future::pending::<()>().await;
        }
        if self.failing.iter().any(|name| *name == ingredient) {
            return Err(Error::upstream("recipe server", "connection reset"));
        }
        if self.missing.iter().any(|name| *name == ingredient) {
            return Ok(NutritionLookup::missing(ingredient));
        }
        Ok(NutritionLookup::Found(NutritionFacts {
            calories: Some(ingredient.len() as f64 * 10.0),
            ..Default::default()
        }))
    }

    async fn ingredient_alternatives(&self, ingredient: &str) -> Result<TabularResult> {
        let mut result = TabularResult::default();
        if ingredient == "egg" {
            result.results.bindings = vec![Row::default()
                .with("type", Term::uri("http://dbpedia.org/ontology/veganAlternative"))
                .with("alternatives", Term::literal("Tofu, Aquafaba"))];
        }
        Ok(result)
    }

    async fn completion(&self, kind: CompletionKind, payload: &str) -> Result<Option<Value>> {
        self.completions
            .lock()
            .unwrap()
            .push((kind, payload.to_string()));
        Ok(self.reply.clone())
    }
}

fn frittata(ingredients: &[&str]) -> Recipe {
    Recipe {
        id: "Frittata".into(),
        label: "Frittata".into(),
        region: "Lazio".into(),
        category: "Secondo".into(),
        ingredients: ingredients
            .iter()
            .map(|local| format!("http://dbpedia.org/resource/{local}"))
            .collect(),
        topic: Some("https://it.wikipedia.org/wiki/Frittata".into()),
        preparation_text: Some("Beat the eggs and fry.".into()),
        ingredient_text: Some("Ingredients: 4 eggs, 2 tbsp olive oil".into()),
    }
}

#[tokio::test]
async fn estimate_fires_once_every_ingredient_answered() {
    let source = FakeSource {
        missing: vec!["unicornHorn"],
        reply: Some(json!({"Frittata": {"kcal": 320, "protein": "18 g"}})),
        ..Default::default()
    };
    let recipe = frittata(&["egg", "oliveOil", "unicornHorn"]);
    let mut events = Vec::new();
    let view = assemble(&recipe, &source, CancellationToken::new(), |event| {
        events.push(event.clone())
    })
    .await;

    assert_eq!(view.status, DetailStatus::Ready);
    assert_eq!(view.topic, recipe.topic);
    assert_eq!(view.cards.len(), 3);
    assert_eq!(view.cards[0].name, "Egg");
    assert_eq!(view.cards[0].alternatives[0].relation, AlternativeRelation::Vegan);
    assert_eq!(view.cards[0].alternatives[0].names, vec!["Tofu", "Aquafaba"]);
    assert!(view.cards[2].nutrition.is_none());
    assert_eq!(view.estimate.as_ref().and_then(|e| e.kcal.clone()), Some(json!(320)));

    let completions = source.completions();
    assert_eq!(completions.len(), 1);
    let (kind, payload) = &completions[0];
    assert_eq!(*kind, CompletionKind::Nutrition);
    let payload: Value = serde_json::from_str(payload).unwrap();
    assert_eq!(payload["recipeName"], "Frittata");
    assert_eq!(payload["ingredientListText"], "4 eggs, 2 tbsp olive oil");
    assert_eq!(payload["nutritionFactsByIngredient"]["Egg"]["calories"], json!(30.0));
    assert_eq!(payload["nutritionFactsByIngredient"]["Unicorn Horn"], Value::Null);

    let requested = events
        .iter()
        .position(|event| *event == DetailEvent::EstimateRequested)
        .unwrap();
    let last_nutrition = events
        .iter()
        .rposition(|event| matches!(event, DetailEvent::NutritionResolved { .. }))
        .unwrap();
    assert!(requested > last_nutrition);
    assert_eq!(
        events.iter().filter(|event| matches!(event, DetailEvent::CardReady { .. })).count(),
        3
    );
    assert_eq!(events.last(), Some(&DetailEvent::Ready));
}

#[tokio::test]
async fn transport_failure_leaves_card_empty_and_skips_estimate() {
    let source = FakeSource {
        failing: vec!["oliveOil"],
        reply: Some(json!({"Frittata": {"kcal": 320}})),
        ..Default::default()
    };
    let recipe = frittata(&["egg", "oliveOil", "salt"]);
    let mut failures = Vec::new();
    let view = assemble(&recipe, &source, CancellationToken::new(), |event| {
        if let DetailEvent::LookupFailed { ingredient, lookup, .. } = event {
            failures.push((ingredient.clone(), *lookup));
        }
    })
    .await;

    assert_eq!(view.status, DetailStatus::Ready);
    assert!(view.cards[0].nutrition.is_some());
    assert!(view.cards[1].nutrition.is_none());
    assert!(view.cards[2].nutrition.is_some());
    assert_eq!(failures, vec![("Olive Oil".to_string(), "nutrition")]);
    assert!(source.completions().is_empty());
    assert!(view.estimate.is_none());
}

#[tokio::test]
async fn repeated_ingredients_count_once() {
    let source = FakeSource::default();
    let recipe = frittata(&["egg", "egg"]);
    let view = assemble(&recipe, &source, CancellationToken::new(), |_| {}).await;
    assert_eq!(view.cards.len(), 2);
    assert_eq!(source.completions().len(), 1);
    assert!(view.estimate.is_none());
}

#[tokio::test]
async fn cancellation_returns_partial_view() {
    let source = FakeSource {
        hanging: vec!["oliveOil"],
        ..Default::default()
    };
    let recipe = frittata(&["egg", "oliveOil"]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut saw_cancelled = false;
    let view = assemble(&recipe, &source, cancel, |event| match event {
        DetailEvent::CardReady { ingredient } if ingredient == "Egg" => trigger.cancel(),
        DetailEvent::Cancelled => saw_cancelled = true,
        _ => {}
    })
    .await;

    assert!(saw_cancelled);
    assert_eq!(view.status, DetailStatus::Cancelled);
    assert!(view.cards[0].nutrition.is_some());
    assert!(view.cards[1].nutrition.is_none());
    assert!(source.completions().is_empty());
}

#[tokio::test]
async fn rework_sends_substitutions_and_reads_preparation() {
    let source = FakeSource {
        reply: Some(json!({"preparation": "Whisk the tofu and fry."})),
        ..Default::default()
    };
    let recipe = frittata(&["egg"]);
    let mut selection = Selection::new();
    selection.toggle("Egg", "Tofu");

    let text = rework(&recipe, &selection, &source).await.unwrap();
    assert_eq!(text, "Whisk the tofu and fry.");

    let completions = source.completions();
    assert_eq!(completions[0].0, CompletionKind::Rework);
    assert_eq!(
        completions[0].1,
        "Replace Egg with Tofu\n\n\nThe recipe is: Beat the eggs and fry.\n\n"
    );
}

#[tokio::test]
async fn empty_rework_reply_is_reported() {
    let source = FakeSource::default();
    let text = rework(&frittata(&["egg"]), &Selection::new(), &source)
        .await
        .unwrap();
    assert_eq!(text, NO_REWORK_FOUND);
}
