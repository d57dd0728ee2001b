//! Caching client for the recipe server's JSON routes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use super::cache::ResponseCache;
use crate::completion::CompletionKind;
use crate::error::{Error, Result};
use crate::nutrition::{CaloriesLookup, NutritionLookup};
use crate::store::TabularResult;
use crate::vocab::DietTag;

const SERVICE: &str = "recipe server";

/// Data the catalog and the detail assembler need. `RecipeApi` is the real
/// implementation; tests substitute in-memory fakes.
///
/// Ingredient arguments are local names ("oliveOil"); display names also work
/// since whitespace is removed before they reach a query.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn recipes(&self) -> Result<TabularResult>;

    async fn recipes_by_diet(&self, tag: DietTag) -> Result<TabularResult>;

    async fn ingredient_nutrition(&self, ingredient: &str) -> Result<NutritionLookup>;

    async fn ingredient_alternatives(&self, ingredient: &str) -> Result<TabularResult>;

    async fn completion(&self, kind: CompletionKind, payload: &str) -> Result<Option<Value>>;
}

#[derive(Debug)]
pub struct RecipeApi {
    client: Client,
    base_url: Url,
    cache: Mutex<ResponseCache<Value>>,
}

impl RecipeApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_cache(base_url, ResponseCache::new())
    }

    pub fn with_cache(base_url: &str, cache: ResponseCache<Value>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| Error::validation(format!("invalid server URL '{base_url}': {err}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            cache: Mutex::new(cache),
        })
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache<Value>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// GETs `path` unless `cache_key` holds a live response. Null bodies are
    /// returned but not cached.
    async fn fetch_with_cache(
        &self,
        path: &str,
        query: &[(&str, &str)],
        cache_key: String,
    ) -> Result<Value> {
        let cached = self.cache().get(&cache_key);
        if let Some(hit) = cached {
            debug!(key = %cache_key, "response cache hit");
            return Ok(hit);
        }
        debug!(key = %cache_key, "response cache miss");

        let url = self
            .base_url
            .join(path)
            .map_err(|err| Error::validation(format!("invalid route '{path}': {err}")))?;
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                error!(path, error = %err, "request failed");
                Error::upstream(SERVICE, err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(path, %status, "request rejected");
            return Err(Error::upstream(SERVICE, format!("request failed: {status}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|err| Error::upstream(SERVICE, format!("invalid body: {err}")))?;
        if !value.is_null() {
            self.cache().set(cache_key, value.clone());
        }
        Ok(value)
    }

    async fn fetch_as<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        cache_key: String,
    ) -> Result<T> {
        let value = self.fetch_with_cache(path, query, cache_key).await?;
        serde_json::from_value(value)
            .map_err(|err| Error::upstream(SERVICE, format!("unexpected body from {path}: {err}")))
    }

    /// Calorie literal for an ingredient; any failure resolves to an empty string.
    pub async fn ingredient_calories(&self, ingredient: &str) -> String {
        let result: Result<CaloriesLookup> = self
            .fetch_as(
                "/ingredients/calories",
                &[("name", ingredient)],
                format!("calories_{ingredient}"),
            )
            .await;
        match result {
            Ok(lookup) => lookup.calories,
            Err(err) => {
                warn!(ingredient, error = %err, "calorie lookup failed");
                String::new()
            }
        }
    }
}

#[async_trait]
impl RecipeSource for RecipeApi {
    async fn recipes(&self) -> Result<TabularResult> {
        self.fetch_as("/recipes", &[], "all_recipes".to_string())
            .await
    }

    async fn recipes_by_diet(&self, tag: DietTag) -> Result<TabularResult> {
        self.fetch_as(
            "/recipes/diet",
            &[("type", tag.param())],
            format!("diet_{}", tag.param()),
        )
        .await
    }

    async fn ingredient_nutrition(&self, ingredient: &str) -> Result<NutritionLookup> {
        self.fetch_as(
            "/ingredients/nutrition",
            &[("name", ingredient)],
            format!("nutrition_{ingredient}"),
        )
        .await
    }

    async fn ingredient_alternatives(&self, ingredient: &str) -> Result<TabularResult> {
        let compact: String = ingredient.chars().filter(|c| !c.is_whitespace()).collect();
        self.fetch_as(
            "/alternatives",
            &[("ingredient", compact.as_str())],
            format!("alternatives_{compact}"),
        )
        .await
    }

    async fn completion(&self, kind: CompletionKind, payload: &str) -> Result<Option<Value>> {
        let value = self
            .fetch_with_cache(
                "/gemini",
                &[("type", kind.param()), ("jsonToSend", payload)],
                format!("completion_{}_{payload}", kind.param()),
            )
            .await?;
        Ok((!value.is_null()).then_some(value))
    }
}
