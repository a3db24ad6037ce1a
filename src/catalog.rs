// catalog.rs
// Listing, type, species and region payloads consumed from the upstream API.

use serde::{Deserialize, Serialize};

use crate::pokemon::{Id, NamedResource};

/// One page of `/pokemon?limit&offset`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Page {
    pub count: u32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// Response shape of list endpoints such as `/type` and `/region`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceList {
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DamageRelations {
    #[serde(default)]
    pub double_damage_from: Vec<NamedResource>,
    #[serde(default)]
    pub double_damage_to: Vec<NamedResource>,
    #[serde(default)]
    pub half_damage_from: Vec<NamedResource>,
    #[serde(default)]
    pub half_damage_to: Vec<NamedResource>,
    #[serde(default)]
    pub no_damage_from: Vec<NamedResource>,
    #[serde(default)]
    pub no_damage_to: Vec<NamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypePayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub damage_relations: DamageRelations,
    #[serde(default)]
    pub pokemon: Vec<TypeMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeMember {
    pub pokemon: NamedResource,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub id: Id,
    pub name: String,
}

/// Type detail as exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDetails {
    pub id: u32,
    pub name: String,
    pub damage_relations: DamageRelations,
    pub members: Vec<Summary>,
}

impl TypeDetails {
    pub const MEMBER_LIMIT: usize = 20;

    /// Keeps the first members whose URLs carry an identifier.
    pub fn from_payload(payload: TypePayload) -> Self {
        let members = payload
            .pokemon
            .into_iter()
            .take(Self::MEMBER_LIMIT)
            .filter_map(|member| {
                let id = member.pokemon.id()?;
                Some(Summary {
                    id: Id(id),
                    name: member.pokemon.name,
                })
            })
            .collect();

        Self {
            id: payload.id,
            name: payload.name,
            damage_relations: payload.damage_relations,
            members,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Species {
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub evolution_chain: Option<ApiResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResource {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
}

impl Species {
    pub const FALLBACK_DESCRIPTION: &'static str = "Description not available.";

    /// Prefers Brazilian Portuguese, then Portuguese, then English.
    pub fn description(&self) -> String {
        ["pt-br", "pt", "en"]
            .iter()
            .find_map(|language| {
                self.flavor_text_entries
                    .iter()
                    .find(|entry| entry.language.name == *language)
            })
            .map(|entry| entry.flavor_text.replace(['\u{c}', '\n'], " "))
            .unwrap_or_else(|| Self::FALLBACK_DESCRIPTION.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub main_generation: Option<NamedResource>,
    #[serde(default)]
    pub locations: Vec<NamedResource>,
}
