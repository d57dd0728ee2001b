//! Completion gateway: fills a prompt template, asks the language model, and
//! pulls the first well-formed JSON object out of whatever text comes back.

use serde_json::Value;
use tracing::{debug, warn};

use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider};
use crate::error::Result;

/// Token replaced by the caller-supplied JSON payload.
pub const PAYLOAD_PLACEHOLDER: &str = "{{payload}}";

const SYSTEM_PROMPT: &str =
    "You are a culinary assistant. Answer with a single JSON object and nothing else.";

const NUTRITION_TEMPLATE: &str = "Estimate the nutrition values of ONE portion of the recipe described below.
The input is a JSON object with:
- \"recipeName\": the recipe name;
- \"ingredientListText\": the ingredient list with quantities, as free text;
- \"nutritionFactsByIngredient\": nutrition facts per 100 g of each ingredient (null when unknown).

Reply with a JSON object keyed by the recipe name, for example:
{ \"<recipeName>\": { \"kcal\": 0, \"protein\": \"0 g\", \"saturatedFat\": \"0 g\", \"unsaturatedFat\": \"0 g\", \"carbohydrates\": \"0 g\", \"sugars\": \"0 g\", \"fiber\": \"0 g\", \"salt\": \"0 g\" } }

Input:
{{payload}}";

const REWORK_TEMPLATE: &str = "Rewrite the preparation text of a recipe so that it uses the requested ingredient substitutions.
Adjust quantities, times and steps where a substitution requires it, and keep everything else unchanged.

Reply with a JSON object of the form { \"preparation\": \"<rewritten preparation text>\" }.

Request:
{{payload}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Per-portion nutrition estimate from ingredient facts.
    Nutrition,
    /// Preparation text rewritten around chosen substitutions.
    Rework,
}

impl CompletionKind {
    /// `nutrition` selects the estimate template; any other value selects the rewrite.
    pub fn from_param(param: &str) -> Self {
        if param == "nutrition" {
            Self::Nutrition
        } else {
            Self::Rework
        }
    }

    pub fn param(self) -> &'static str {
        match self {
            Self::Nutrition => "nutrition",
            Self::Rework => "rework",
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Self::Nutrition => NUTRITION_TEMPLATE,
            Self::Rework => REWORK_TEMPLATE,
        }
    }
}

pub fn build_prompt(kind: CompletionKind, payload: &str) -> String {
    kind.template().replacen(PAYLOAD_PLACEHOLDER, payload, 1)
}

/// Returns the first balanced `{...}` block in `text` that parses as a JSON object.
///
/// Braces inside JSON strings are ignored while balancing. A candidate that
/// balances but does not parse is skipped and the scan resumes after its
/// opening brace.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = matching_brace(bytes, open) {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&text[open..=close])
            {
                return Some(value);
            }
        }
        start = open + 1;
    }
    None
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (index, &byte) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct CompletionGateway {
    provider: Provider,
}

impl CompletionGateway {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Sends the filled template and returns the extracted JSON object.
    ///
    /// Transport, auth and quota failures are errors; a reply without a
    /// parseable object resolves to `Ok(None)`.
    pub async fn complete(&self, kind: CompletionKind, payload: &str) -> Result<Option<Value>> {
        let request = ChatCompletionRequest {
            model: self.provider.model().to_string(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(kind, payload)),
            ],
            temperature: Some(0.2),
            max_tokens: Some(2048),
        };

        let response = self.provider.call_chat_completion(request).await?;
        let Some(content) = response.first_content() else {
            warn!(kind = kind.param(), "completion returned no choices");
            return Ok(None);
        };
        debug!(kind = kind.param(), chars = content.len(), "completion received");

        let extracted = extract_json_object(content);
        if extracted.is_none() {
            warn!(kind = kind.param(), raw = %content, "no JSON object in completion");
        }
        Ok(extracted)
    }
}
