// pokemon.rs
// Creature records and the raw PokeAPI payloads they are built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a creature (its national dex number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub u32);

impl From<u32> for Id {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
    #[serde(other)]
    Unknown,
}

impl PokemonType {
    pub const ALL: [PokemonType; 18] = [
        PokemonType::Normal,
        PokemonType::Fire,
        PokemonType::Water,
        PokemonType::Electric,
        PokemonType::Grass,
        PokemonType::Ice,
        PokemonType::Fighting,
        PokemonType::Poison,
        PokemonType::Ground,
        PokemonType::Flying,
        PokemonType::Psychic,
        PokemonType::Bug,
        PokemonType::Rock,
        PokemonType::Ghost,
        PokemonType::Dragon,
        PokemonType::Dark,
        PokemonType::Steel,
        PokemonType::Fairy,
    ];

    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or(PokemonType::Unknown)
    }

    pub fn name(self) -> &'static str {
        match self {
            PokemonType::Normal => "normal",
            PokemonType::Fire => "fire",
            PokemonType::Water => "water",
            PokemonType::Electric => "electric",
            PokemonType::Grass => "grass",
            PokemonType::Ice => "ice",
            PokemonType::Fighting => "fighting",
            PokemonType::Poison => "poison",
            PokemonType::Ground => "ground",
            PokemonType::Flying => "flying",
            PokemonType::Psychic => "psychic",
            PokemonType::Bug => "bug",
            PokemonType::Rock => "rock",
            PokemonType::Ghost => "ghost",
            PokemonType::Dragon => "dragon",
            PokemonType::Dark => "dark",
            PokemonType::Steel => "steel",
            PokemonType::Fairy => "fairy",
            PokemonType::Unknown => "unknown",
        }
    }

    /// Badge color as a hex string.
    pub fn color(self) -> &'static str {
        match self {
            PokemonType::Normal => "#A8A77A",
            PokemonType::Fire => "#EE8130",
            PokemonType::Water => "#6390F0",
            PokemonType::Electric => "#F7D02C",
            PokemonType::Grass => "#7AC74C",
            PokemonType::Ice => "#96D9D6",
            PokemonType::Fighting => "#C22E28",
            PokemonType::Poison => "#A33EA1",
            PokemonType::Ground => "#E2BF65",
            PokemonType::Flying => "#A98FF3",
            PokemonType::Psychic => "#F95587",
            PokemonType::Bug => "#A6B91A",
            PokemonType::Rock => "#B6A136",
            PokemonType::Ghost => "#735797",
            PokemonType::Dragon => "#6F35FC",
            PokemonType::Dark => "#705746",
            PokemonType::Steel => "#B7B7CE",
            PokemonType::Fairy => "#D685AD",
            PokemonType::Unknown => "#777777",
        }
    }
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub special_attack: u8,
    pub special_defense: u8,
    pub speed: u8,
}

/// A catalog entry, built once from an API payload and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub stats: Stats,
    /// Decimetres.
    #[serde(default)]
    pub height: u32,
    /// Hectograms.
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub abilities: Vec<String>,
}

impl Creature {
    /// Placeholder used when the detail lookup for a catalog entry fails.
    pub fn stub(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            types: Vec::new(),
            stats: Stats::default(),
            height: 0,
            weight: 0,
            artwork: None,
            abilities: Vec::new(),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.types.is_empty() && self.abilities.is_empty() && self.artwork.is_none()
    }

    pub fn from_payload(payload: PokemonPayload) -> Self {
        let stat = |index: usize| {
            payload
                .stats
                .get(index)
                .map(|stat| u8::try_from(stat.base_stat).unwrap_or(u8::MAX))
                .unwrap_or(0)
        };

        let stats = Stats {
            hp: stat(0),
            attack: stat(1),
            defense: stat(2),
            special_attack: stat(3),
            special_defense: stat(4),
            speed: stat(5),
        };

        let mut slots = payload.types;
        slots.sort_by_key(|slot| slot.slot);

        Self {
            id: Id(payload.id),
            artwork: payload.sprites.as_ref().and_then(Sprites::artwork),
            name: payload.name,
            types: slots
                .into_iter()
                .map(|slot| PokemonType::from_name(&slot.r#type.name))
                .collect(),
            stats,
            height: payload.height.unwrap_or(0),
            weight: payload.weight.unwrap_or(0),
            abilities: payload
                .abilities
                .into_iter()
                .map(|slot| slot.ability.name)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NamedResource {
    /// Identifier parsed from the trailing path segment of the resource URL.
    pub fn id(&self) -> Option<u32> {
        resource_id(&self.url)
    }
}

/// Parses `https://pokeapi.co/api/v2/pokemon-species/25/` into `25`.
pub fn resource_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PokemonPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub types: Vec<PokemonTypeSlot>,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub sprites: Option<Sprites>,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonTypeSlot {
    #[serde(default)]
    pub slot: u8,
    pub r#type: NamedResource,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonStat {
    pub base_stat: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokemonAbility {
    pub ability: NamedResource,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OtherSprites {
    #[serde(default, rename = "official-artwork")]
    pub official_artwork: Option<SpriteSet>,
    #[serde(default)]
    pub home: Option<SpriteSet>,
    #[serde(default)]
    pub dream_world: Option<SpriteSet>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SpriteSet {
    #[serde(default)]
    pub front_default: Option<String>,
}

impl Sprites {
    /// Official artwork, then home, then dream world, then the plain front sprite.
    pub fn artwork(&self) -> Option<String> {
        let other = self.other.as_ref();
        let pick = |set: Option<&SpriteSet>| set.and_then(|set| set.front_default.clone());

        pick(other.and_then(|other| other.official_artwork.as_ref()))
            .or_else(|| pick(other.and_then(|other| other.home.as_ref())))
            .or_else(|| pick(other.and_then(|other| other.dream_world.as_ref())))
            .or_else(|| self.front_default.clone())
    }
}

/// Display-ready labels for a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub number: String,
    pub name: String,
    pub height: String,
    pub weight: String,
    pub types: Vec<TypeBadge>,
    pub artwork: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeBadge {
    pub name: &'static str,
    pub color: &'static str,
}

impl From<PokemonType> for TypeBadge {
    fn from(kind: PokemonType) -> Self {
        Self {
            name: kind.name(),
            color: kind.color(),
        }
    }
}

impl From<&Creature> for Card {
    fn from(creature: &Creature) -> Self {
        Self {
            number: format_id(creature.id),
            name: capitalize(&creature.name),
            height: format_height(creature.height),
            weight: format_weight(creature.weight),
            types: creature.types.iter().copied().map(TypeBadge::from).collect(),
            artwork: creature.artwork.clone(),
        }
    }
}

/// `#001` style label.
pub fn format_id(id: Id) -> String {
    format!("#{:03}", id.0)
}

pub fn format_height(decimetres: u32) -> String {
    format!("{:.1} m", f64::from(decimetres) / 10.0)
}

pub fn format_weight(hectograms: u32) -> String {
    format!("{:.1} kg", f64::from(hectograms) / 10.0)
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
