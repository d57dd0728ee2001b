//! Closed vocabularies shared by the server and the client: diet tags and
//! ingredient substitution relations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DBO: &str = "http://dbpedia.org/ontology/";
pub const DBR: &str = "http://dbpedia.org/resource/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DietTag {
    GlutenFree,
    LactoseFree,
    Vegan,
    Vegetarian,
}

impl DietTag {
    pub const ALL: [DietTag; 4] = [
        DietTag::GlutenFree,
        DietTag::LactoseFree,
        DietTag::Vegan,
        DietTag::Vegetarian,
    ];

    /// Tag name as the client names it.
    pub fn name(self) -> &'static str {
        match self {
            DietTag::GlutenFree => "glutenFree",
            DietTag::LactoseFree => "lactoseFree",
            DietTag::Vegan => "vegan",
            DietTag::Vegetarian => "vegetarian",
        }
    }

    /// Value of the `type` query parameter on `/recipes/diet`; also the
    /// ontology property carrying the flag.
    pub fn param(self) -> &'static str {
        match self {
            DietTag::GlutenFree => "isGlutenFree",
            DietTag::LactoseFree => "isLactoseFree",
            DietTag::Vegan => "isVegan",
            DietTag::Vegetarian => "isVegetarian",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DietTag::GlutenFree => "Gluten free",
            DietTag::LactoseFree => "Lactose free",
            DietTag::Vegan => "Vegan",
            DietTag::Vegetarian => "Vegetarian",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.param() == param)
    }

    /// Display labels of every tag, sorted.
    pub fn sorted_labels() -> Vec<&'static str> {
        let mut labels: Vec<_> = Self::ALL.iter().map(|tag| tag.label()).collect();
        labels.sort_unstable();
        labels
    }
}

impl FromStr for DietTag {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.name() == value)
            .ok_or_else(|| {
                Error::validation(format!(
                    "unknown diet tag '{value}', expected one of glutenFree, lactoseFree, vegan, vegetarian"
                ))
            })
    }
}

impl fmt::Display for DietTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of substitution edge between two ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlternativeRelation {
    Generic,
    Binding,
    Leavening,
    Vegan,
    Vegetarian,
    GlutenFree,
}

impl AlternativeRelation {
    pub const ALL: [AlternativeRelation; 6] = [
        AlternativeRelation::Generic,
        AlternativeRelation::Binding,
        AlternativeRelation::Leavening,
        AlternativeRelation::Vegan,
        AlternativeRelation::Vegetarian,
        AlternativeRelation::GlutenFree,
    ];

    /// Local name of the ontology property.
    pub fn property(self) -> &'static str {
        match self {
            AlternativeRelation::Generic => "alternative",
            AlternativeRelation::Binding => "bindingAlternative",
            AlternativeRelation::Leavening => "leaveningAlternative",
            AlternativeRelation::Vegan => "veganAlternative",
            AlternativeRelation::Vegetarian => "vegetarianAlternative",
            AlternativeRelation::GlutenFree => "glutenFreeAlternative",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlternativeRelation::Generic => "Alternative",
            AlternativeRelation::Binding => "Binding",
            AlternativeRelation::Leavening => "Leavening",
            AlternativeRelation::Vegan => "Vegan",
            AlternativeRelation::Vegetarian => "Vegetarian",
            AlternativeRelation::GlutenFree => "Gluten",
        }
    }

    /// Material icon shown on the chip.
    pub fn icon(self) -> &'static str {
        match self {
            AlternativeRelation::Generic => "sync",
            AlternativeRelation::Binding => "link",
            AlternativeRelation::Leavening => "emoji_food_beverage",
            AlternativeRelation::Vegan => "eco",
            AlternativeRelation::Vegetarian => "spa",
            AlternativeRelation::GlutenFree => "compost",
        }
    }

    pub fn from_property(local_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.property() == local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diet_tags_parse_by_name_and_param() {
        assert_eq!("vegan".parse::<DietTag>().unwrap(), DietTag::Vegan);
        assert_eq!(DietTag::from_param("isGlutenFree"), Some(DietTag::GlutenFree));
        assert_eq!(DietTag::from_param("vegan"), None);
        assert!("bogus".parse::<DietTag>().unwrap_err().is_validation());
    }

    #[test]
    fn diet_labels_are_sorted() {
        assert_eq!(
            DietTag::sorted_labels(),
            vec!["Gluten free", "Lactose free", "Vegan", "Vegetarian"]
        );
    }

    #[test]
    fn relations_round_trip_through_property_names() {
        for relation in AlternativeRelation::ALL {
            assert_eq!(AlternativeRelation::from_property(relation.property()), Some(relation));
        }
        assert_eq!(AlternativeRelation::from_property("sameAs"), None);
    }
}
