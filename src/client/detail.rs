//! Detail view of one recipe: per-ingredient lookups fanned out concurrently,
//! a portion estimate once every ingredient's nutrition is known, and the
//! substitution rework.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::RecipeSource;
use super::catalog::Recipe;
use super::names::{display_name, local_name, strip_leading};
use crate::completion::CompletionKind;
use crate::error::Result;
use crate::nutrition::{NutritionFacts, NutritionLookup};
use crate::store::queries::{vars, GROUP_SEPARATOR};
use crate::store::TabularResult;
use crate::vocab::AlternativeRelation;

/// Shown when the model returns nothing usable for a rework.
pub const NO_REWORK_FOUND: &str = "no rework found";

const INGREDIENT_TEXT_PREFIX: &str = "Ingredients:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeGroup {
    pub relation: AlternativeRelation,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientCard {
    pub name: String,
    pub resource: String,
    /// `None` until found; stays `None` when the store has no record or the
    /// lookup failed.
    pub nutrition: Option<NutritionFacts>,
    pub alternatives: Vec<AlternativeGroup>,
}

impl IngredientCard {
    fn new(resource: &str) -> Self {
        Self {
            name: display_name(resource),
            resource: resource.to_string(),
            nutrition: None,
            alternatives: Vec::new(),
        }
    }
}

/// Model estimate for one portion. Values are whatever the model wrote
/// (numbers or strings with units).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortionEstimate {
    pub kcal: Option<Value>,
    pub protein: Option<Value>,
    pub saturated_fat: Option<Value>,
    pub unsaturated_fat: Option<Value>,
    pub carbohydrates: Option<Value>,
    pub sugars: Option<Value>,
    pub fiber: Option<Value>,
    pub salt: Option<Value>,
}

impl PortionEstimate {
    /// Reads the estimate stored under `label`, or under the first key when
    /// the model used another one.
    pub fn from_completion(value: &Value, label: &str) -> Option<Self> {
        let entry = entry_for(value, label)?;
        serde_json::from_value(entry.clone()).ok()
    }
}

fn entry_for<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let object = value.as_object()?;
    object
        .get(key)
        .or_else(|| object.values().next())
        .filter(|entry| entry.is_object())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailStatus {
    Loading,
    Ready,
    /// Assembly stopped early; cards hold whatever had arrived.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub recipe_id: String,
    pub label: String,
    pub topic: Option<String>,
    pub ingredient_text: Option<String>,
    pub preparation_text: Option<String>,
    pub status: DetailStatus,
    pub cards: Vec<IngredientCard>,
    pub estimate: Option<PortionEstimate>,
}

impl DetailView {
    fn loading(recipe: &Recipe) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            label: recipe.label.clone(),
            topic: recipe.topic.clone(),
            ingredient_text: recipe.ingredient_text.clone(),
            preparation_text: recipe.preparation_text.clone(),
            status: DetailStatus::Loading,
            cards: recipe
                .ingredients
                .iter()
                .map(|uri| IngredientCard::new(uri))
                .collect(),
            estimate: None,
        }
    }
}

/// Progress reported while a view assembles.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailEvent {
    Started { ingredients: usize },
    NutritionResolved { ingredient: String, found: bool },
    AlternativesResolved { ingredient: String, relations: usize },
    LookupFailed { ingredient: String, lookup: &'static str, error: String },
    /// Both lookups of the card have settled.
    CardReady { ingredient: String },
    EstimateRequested,
    EstimateReady(PortionEstimate),
    EstimateUnavailable,
    Ready,
    Cancelled,
}

enum Outcome {
    Nutrition(usize, Result<NutritionLookup>),
    Alternatives(usize, Result<TabularResult>),
    Estimate(Result<Option<Value>>),
}

/// Body sent with the nutrition estimate request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionPayload<'a> {
    pub recipe_name: &'a str,
    pub ingredient_list_text: &'a str,
    pub nutrition_facts_by_ingredient: &'a BTreeMap<String, Option<NutritionFacts>>,
}

/// Assembles the detail view of `recipe`.
///
/// Every nutrition and alternatives lookup is started at once, one per
/// ingredient entry. The estimate is requested once the number of distinct
/// ingredient display names with a nutrition answer (found or not) equals the
/// number of distinct names. Repeated entries therefore count once, and a
/// recipe listing the same ingredient twice still gets its estimate. A lookup
/// that fails in transport never answers, so such a recipe gets no estimate.
/// Cancelling `cancel` returns the partial view.
pub async fn assemble(
    recipe: &Recipe,
    source: &dyn RecipeSource,
    cancel: CancellationToken,
    mut on_event: impl FnMut(&DetailEvent),
) -> DetailView {
    let mut view = DetailView::loading(recipe);
    let resources: Vec<String> = view.cards.iter().map(|card| local_name(&card.resource)).collect();
    let expected = view
        .cards
        .iter()
        .map(|card| card.name.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    on_event(&DetailEvent::Started {
        ingredients: view.cards.len(),
    });

    let mut pending: FuturesUnordered<BoxFuture<'_, Outcome>> = FuturesUnordered::new();
    for (index, resource) in resources.iter().enumerate() {
        pending.push(
            async move { Outcome::Nutrition(index, source.ingredient_nutrition(resource).await) }
                .boxed(),
        );
        pending.push(
            async move {
                Outcome::Alternatives(index, source.ingredient_alternatives(resource).await)
            }
            .boxed(),
        );
    }

    let mut nutrition_by_name: BTreeMap<String, Option<NutritionFacts>> = BTreeMap::new();
    let mut settled = vec![0u8; view.cards.len()];
    let mut estimate_requested = false;

    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(recipe = %recipe.id, "detail assembly cancelled");
                view.status = DetailStatus::Cancelled;
                on_event(&DetailEvent::Cancelled);
                return view;
            }
            next = pending.next() => match next {
                Some(outcome) => outcome,
                None => break,
            },
        };

        match outcome {
            Outcome::Nutrition(index, result) => {
                let card = &mut view.cards[index];
                match result {
                    Ok(lookup) => {
                        let facts = lookup.into_facts();
                        on_event(&DetailEvent::NutritionResolved {
                            ingredient: card.name.clone(),
                            found: facts.is_some(),
                        });
                        card.nutrition = facts.clone();
                        nutrition_by_name.insert(card.name.clone(), facts);
                    }
                    Err(err) => {
                        warn!(ingredient = %card.name, error = %err, "nutrition lookup failed");
                        on_event(&DetailEvent::LookupFailed {
                            ingredient: card.name.clone(),
                            lookup: "nutrition",
                            error: err.to_string(),
                        });
                    }
                }
                settle(&mut settled, index, &view.cards, &mut on_event);

                if !estimate_requested && expected > 0 && nutrition_by_name.len() == expected {
                    estimate_requested = true;
                    let payload = NutritionPayload {
                        recipe_name: &recipe.label,
                        ingredient_list_text: ingredient_list_text(recipe),
                        nutrition_facts_by_ingredient: &nutrition_by_name,
                    };
                    match serde_json::to_string(&payload) {
                        Ok(payload) => {
                            debug!(recipe = %recipe.id, "requesting portion estimate");
                            on_event(&DetailEvent::EstimateRequested);
                            pending.push(
                                async move {
                                    Outcome::Estimate(
                                        source.completion(CompletionKind::Nutrition, &payload).await,
                                    )
                                }
                                .boxed(),
                            );
                        }
                        Err(err) => {
                            warn!(error = %err, "could not encode estimate payload");
                            on_event(&DetailEvent::EstimateUnavailable);
                        }
                    }
                }
            }
            Outcome::Alternatives(index, result) => {
                let card = &mut view.cards[index];
                match result {
                    Ok(result) => {
                        card.alternatives = alternative_groups(&result);
                        on_event(&DetailEvent::AlternativesResolved {
                            ingredient: card.name.clone(),
                            relations: card.alternatives.len(),
                        });
                    }
                    Err(err) => {
                        warn!(ingredient = %card.name, error = %err, "alternatives lookup failed");
                        on_event(&DetailEvent::LookupFailed {
                            ingredient: card.name.clone(),
                            lookup: "alternatives",
                            error: err.to_string(),
                        });
                    }
                }
                settle(&mut settled, index, &view.cards, &mut on_event);
            }
            Outcome::Estimate(result) => {
                let estimate = match result {
                    Ok(Some(value)) => PortionEstimate::from_completion(&value, &recipe.label),
                    Ok(None) => None,
                    Err(err) => {
                        warn!(recipe = %recipe.id, error = %err, "portion estimate failed");
                        None
                    }
                };
                match estimate {
                    Some(estimate) => {
                        on_event(&DetailEvent::EstimateReady(estimate.clone()));
                        view.estimate = Some(estimate);
                    }
                    None => on_event(&DetailEvent::EstimateUnavailable),
                }
            }
        }
    }

    if !estimate_requested && expected > 0 {
        debug!(
            recipe = %recipe.id,
            answered = nutrition_by_name.len(),
            expected,
            "portion estimate not requested"
        );
    }
    view.status = DetailStatus::Ready;
    on_event(&DetailEvent::Ready);
    view
}

fn settle(
    settled: &mut [u8],
    index: usize,
    cards: &[IngredientCard],
    on_event: &mut impl FnMut(&DetailEvent),
) {
    settled[index] += 1;
    if settled[index] == 2 {
        on_event(&DetailEvent::CardReady {
            ingredient: cards[index].name.clone(),
        });
    }
}

fn ingredient_list_text(recipe: &Recipe) -> &str {
    recipe
        .ingredient_text
        .as_deref()
        .map(|text| strip_leading(text, INGREDIENT_TEXT_PREFIX).trim())
        .unwrap_or_default()
}

/// Chips grouped by relation, in store order. Relations outside the known
/// set are dropped.
pub fn alternative_groups(result: &TabularResult) -> Vec<AlternativeGroup> {
    result
        .rows()
        .iter()
        .filter_map(|row| {
            let relation = AlternativeRelation::from_property(&local_name(row.value(vars::RELATION)?))?;
            let names: Vec<String> = row
                .value(vars::ALTERNATIVES)?
                .split(GROUP_SEPARATOR)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(display_name)
                .collect();
            (!names.is_empty()).then_some(AlternativeGroup { relation, names })
        })
        .collect()
}

/// Chosen substitutions, ingredient by ingredient, in the order they were
/// first picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: Vec<(String, Vec<String>)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `alternative` for `ingredient`, or deselects it when already
    /// chosen. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, ingredient: &str, alternative: &str) -> bool {
        let position = self.entries.iter().position(|(name, _)| name == ingredient);
        match position {
            Some(index) => {
                let chosen = &mut self.entries[index].1;
                if let Some(at) = chosen.iter().position(|name| name == alternative) {
                    chosen.remove(at);
                    if chosen.is_empty() {
                        self.entries.remove(index);
                    }
                    false
                } else {
                    chosen.push(alternative.to_string());
                    true
                }
            }
            None => {
                self.entries
                    .push((ingredient.to_string(), vec![alternative.to_string()]));
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, chosen)| (name.as_str(), chosen.as_slice()))
    }
}

/// Text sent to the rework template. The substitution section is kept even
/// when nothing is selected.
pub fn rework_prompt(selection: &Selection, preparation: &str) -> String {
    let mut text = String::new();
    for (ingredient, chosen) in selection.iter() {
        text.push_str(&format!("Replace {ingredient} with {}\n", chosen.join(", ")));
    }
    text.push_str(&format!("\n\nThe recipe is: {preparation}\n\n"));
    text
}

/// Asks for the preparation text rewritten around `selection`.
pub async fn rework(
    recipe: &Recipe,
    selection: &Selection,
    source: &dyn RecipeSource,
) -> Result<String> {
    let prompt = rework_prompt(selection, recipe.preparation_text.as_deref().unwrap_or_default());
    let value = source.completion(CompletionKind::Rework, &prompt).await?;
    let preparation = value.as_ref().and_then(reworked_preparation);
    if preparation.is_none() {
        info!(recipe = %recipe.id, "rework returned nothing usable");
    }
    Ok(preparation.unwrap_or_else(|| NO_REWORK_FOUND.to_string()))
}

fn reworked_preparation(value: &Value) -> Option<String> {
    let read = |entry: &Value| {
        entry
            .get("preparation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };
    read(value).or_else(|| entry_for(value, "preparation").and_then(read))
}
