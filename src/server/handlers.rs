use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::AppState;
use crate::completion::CompletionKind;
use crate::error::{Error, Result};
use crate::nutrition::{CaloriesLookup, NutritionFacts, NutritionLookup};
use crate::store::queries::{self, vars};
use crate::store::{ResourceName, TabularResult};
use crate::vocab::DietTag;

#[derive(Debug, Deserialize)]
pub struct DietQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlternativesQuery {
    pub ingredient: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub json_to_send: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::validation(format!("missing required parameter '{name}'")))
}

fn resource(value: &Option<String>, name: &str) -> Result<ResourceName> {
    ResourceName::parse(required(value, name)?)
}

pub async fn list_recipes(State(state): State<AppState>) -> Result<Json<TabularResult>> {
    let result = state.store.execute(&queries::list_recipes()).await?;
    Ok(Json(result))
}

pub async fn recipes_by_diet(
    State(state): State<AppState>,
    Query(query): Query<DietQuery>,
) -> Result<Json<TabularResult>> {
    let param = required(&query.kind, "type")?;
    let tag = DietTag::from_param(param).ok_or_else(|| {
        Error::validation(format!(
            "invalid diet type '{param}'; expected one of {}",
            DietTag::ALL.map(DietTag::param).join(", ")
        ))
    })?;
    let result = state.store.execute(&queries::recipes_by_diet(tag)).await?;
    Ok(Json(result))
}

pub async fn alternatives(
    State(state): State<AppState>,
    Query(query): Query<AlternativesQuery>,
) -> Result<Json<TabularResult>> {
    let ingredient = resource(&query.ingredient, "ingredient")?;
    let result = state.store.execute(&queries::alternatives(&ingredient)).await?;
    Ok(Json(result))
}

pub async fn ingredient_calories(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<CaloriesLookup>> {
    let ingredient = resource(&query.name, "name")?;
    let result = state
        .store
        .execute(&queries::ingredient_calories(&ingredient))
        .await?;
    let calories = result
        .rows()
        .first()
        .and_then(|row| row.value(vars::CALORIES))
        .unwrap_or_default()
        .to_string();
    Ok(Json(CaloriesLookup { calories }))
}

pub async fn ingredient_nutrition(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<NutritionLookup>> {
    let ingredient = resource(&query.name, "name")?;
    let result = state
        .store
        .execute(&queries::ingredient_nutrition(&ingredient))
        .await?;
    let lookup = match result.rows().first() {
        Some(row) => NutritionLookup::Found(NutritionFacts::from_row(row)),
        None => {
            debug!(%ingredient, "no nutrition record");
            NutritionLookup::missing(ingredient.as_str())
        }
    };
    Ok(Json(lookup))
}

/// Runs a completion; the body is the extracted JSON object or `null`.
pub async fn completion(
    State(state): State<AppState>,
    Query(query): Query<CompletionQuery>,
) -> Result<Json<Option<Value>>> {
    let kind = CompletionKind::from_param(required(&query.kind, "type")?);
    let payload = required(&query.json_to_send, "jsonToSend")?;
    let value = state.completion.complete(kind, payload).await?;
    Ok(Json(value))
}
