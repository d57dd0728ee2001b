//! Graph-pattern query templates, one per use case.
//!
//! Resource names are spliced into full `<...>` IRIs rather than prefixed
//! names, so accented names, apostrophes and parentheses need no escaping.
//! Every template that takes one requires a [`ResourceName`], which rejects
//! the characters an IRI reference cannot hold.

use std::fmt;

use crate::error::Error;
use crate::vocab::{AlternativeRelation, DietTag, DBO, DBR};

/// Variables bound by the recipe listing queries.
pub mod vars {
    pub const RECIPE: &str = "recipe";
    pub const NAME: &str = "name";
    pub const INGREDIENTS: &str = "ingredients";
    pub const REGION: &str = "region";
    pub const CATEGORY: &str = "category";
    pub const TOPIC: &str = "topic";
    pub const PREPARATION: &str = "preparation";
    pub const INGREDIENT_TEXT: &str = "ingredientText";
    pub const RELATION: &str = "type";
    pub const ALTERNATIVES: &str = "alternatives";
    pub const CALORIES: &str = "calories";
}

/// Separator used when the store concatenates grouped values.
pub const GROUP_SEPARATOR: &str = ", ";

/// Nutrition properties, in the order the nutrition query selects them.
pub const NUTRITION_PROPERTIES: [&str; 8] = [
    "calories",
    "carbohydrate",
    "fiber",
    "salt",
    "saturatedFat",
    "sugar",
    "unsaturatedFat",
    "protein",
];

/// A local name that is safe to splice into `<http://dbpedia.org/resource/NAME>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName(String);

impl ResourceName {
    /// Accepts either a local name or a display name; whitespace is dropped so
    /// that "Olive Oil" and "OliveOil" address the same resource.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let name: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if name.is_empty() {
            return Err(Error::validation("resource name must not be empty"));
        }
        if let Some(bad) = name.chars().find(|c| is_iri_forbidden(*c)) {
            return Err(Error::validation(format!(
                "resource name '{raw}' contains unsupported character '{bad}'"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource IRI in angle brackets, ready to use as a query term.
    pub fn iri(&self) -> String {
        format!("<{DBR}{}>", self.0)
    }
}

fn is_iri_forbidden(c: char) -> bool {
    c.is_control() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn prologue() -> String {
    format!(
        "PREFIX dbo: <{DBO}>\n\
         PREFIX dbr: <{DBR}>\n\
         PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
         PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n"
    )
}

fn recipe_query(extra_pattern: &str) -> String {
    format!(
        "{prologue}
SELECT ?recipe ?name
       (GROUP_CONCAT(DISTINCT ?ingredient; separator=\"{GROUP_SEPARATOR}\") AS ?ingredients)
       ?region ?category ?topic ?preparation ?ingredientText
WHERE {{
  ?recipe a dbo:Recipe .
  {extra_pattern}
  OPTIONAL {{ ?recipe rdfs:label ?name . FILTER (lang(?name) = \"it\") }}
  OPTIONAL {{ ?recipe dbo:ingredient ?ingredient . }}
  OPTIONAL {{ ?recipe dbo:region ?region . }}
  OPTIONAL {{ ?recipe dbo:type ?category . }}
  OPTIONAL {{ ?recipe foaf:isPrimaryTopicOf ?topic . }}
  OPTIONAL {{ ?recipe dbo:preparation ?preparation . }}
  OPTIONAL {{ ?recipe dbo:ingredientText ?ingredientText . }}
}}
GROUP BY ?recipe ?name ?region ?category ?topic ?preparation ?ingredientText
",
        prologue = prologue(),
    )
}

/// Every recipe in the store with its grouped ingredient list.
pub fn list_recipes() -> String {
    recipe_query("")
}

/// Recipes carrying the boolean flag of `tag`.
pub fn recipes_by_diet(tag: DietTag) -> String {
    recipe_query(&format!("?recipe dbo:{} true .", tag.param()))
}

/// Substitution alternatives of one ingredient, one row per relation type.
pub fn alternatives(ingredient: &ResourceName) -> String {
    let ingredient = ingredient.iri();
    let relations = AlternativeRelation::ALL
        .iter()
        .map(|relation| format!("dbo:{}", relation.property()))
        .collect::<Vec<_>>()
        .join(",\n      ");
    format!(
        "{prologue}
SELECT ?type (GROUP_CONCAT(DISTINCT ?alternativeLabel; separator=\"{GROUP_SEPARATOR}\") AS ?alternatives)
WHERE {{
  {ingredient} ?type ?alternative .
  FILTER (?type IN (
      {relations}
  ))
  ?alternative rdfs:label ?alternativeLabel .
  FILTER (lang(?alternativeLabel) = \"it\")
}}
GROUP BY ?type
",
        prologue = prologue(),
    )
}

pub fn ingredient_calories(ingredient: &ResourceName) -> String {
    let ingredient = ingredient.iri();
    format!(
        "{prologue}
SELECT ?calories
WHERE {{
  {ingredient} dbo:calories ?calories .
}}
LIMIT 1
",
        prologue = prologue(),
    )
}

/// Full nutrition record; returns no row when the ingredient has no calories.
pub fn ingredient_nutrition(ingredient: &ResourceName) -> String {
    let ingredient = ingredient.iri();
    let select = NUTRITION_PROPERTIES
        .iter()
        .map(|property| format!("?{property}"))
        .collect::<Vec<_>>()
        .join(" ");
    let optionals = NUTRITION_PROPERTIES[1..]
        .iter()
        .map(|property| format!("  OPTIONAL {{ {ingredient} dbo:{property} ?{property} . }}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{prologue}
SELECT {select}
WHERE {{
  {ingredient} dbo:calories ?calories .
{optionals}
}}
LIMIT 1
",
        prologue = prologue(),
    )
}
