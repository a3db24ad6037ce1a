//! In-process doubles for the upstream API and local storage.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::api::CatalogSource;
use crate::catalog::{Page, Region, Species, TypeDetails};
use crate::config::Config;
use crate::error::{ApiError, StorageError};
use crate::evolution::EvolutionChain;
use crate::pokemon::{Creature, Id, NamedResource, PokemonType, Stats};
use crate::storage::KeyValueStore;

pub fn config() -> Config {
    let mut config = Config::embedded().expect("embedded config");
    config.pokemon.page_size = 20;
    config
}

pub fn creature(id: u32, name: &str) -> Creature {
    Creature {
        id: Id(id),
        name: name.to_string(),
        types: vec![PokemonType::Normal],
        stats: Stats {
            hp: 50,
            attack: 50,
            defense: 50,
            special_attack: 50,
            special_defense: 50,
            speed: 50,
        },
        height: 10,
        weight: 100,
        artwork: Some(format!("https://img.example/{id}.png")),
        abilities: vec!["run-away".to_string()],
    }
}

fn not_found(resource: String) -> ApiError {
    ApiError::Status {
        resource,
        status: reqwest::StatusCode::NOT_FOUND,
    }
}

/// A catalog of `names.len()` creatures with ids starting at 1.
#[derive(Default)]
pub struct FakeSource {
    names: Vec<String>,
    details: HashMap<Id, Creature>,
    types: Vec<String>,
    species: HashMap<Id, Species>,
    chains: HashMap<String, EvolutionChain>,
    page_delays: Mutex<VecDeque<Duration>>,
    fail_pages: AtomicBool,
    fail_types: AtomicBool,
    pub detail_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_names(names: &[&str]) -> Self {
        let details = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let id = index as u32 + 1;
                (Id(id), creature(id, name))
            })
            .collect();

        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            details,
            types: vec!["normal".to_string(), "fire".to_string()],
            ..Self::default()
        }
    }

    pub fn numbered(count: u32) -> Self {
        let names: Vec<String> = (1..=count).map(|id| format!("creature-{id}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Self::with_names(&names)
    }

    pub fn without_detail(mut self, id: u32) -> Self {
        self.details.remove(&Id(id));
        self
    }

    pub fn with_detail(mut self, creature: Creature) -> Self {
        self.details.insert(creature.id, creature);
        self
    }

    pub fn with_species(mut self, id: u32, species: Species) -> Self {
        self.species.insert(Id(id), species);
        self
    }

    pub fn with_chain(mut self, url: &str, chain: EvolutionChain) -> Self {
        self.chains.insert(url.to_string(), chain);
        self
    }

    /// Delays applied to successive page requests, in order.
    pub fn with_page_delays(self, delays: &[Duration]) -> Self {
        *self.page_delays.lock().unwrap() = delays.iter().copied().collect();
        self
    }

    pub fn fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_types(&self, fail: bool) {
        self.fail_types.store(fail, Ordering::SeqCst);
    }
}

impl CatalogSource for FakeSource {
    async fn pokemon_page(&self, limit: u32, offset: u32) -> Result<Page, ApiError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.page_delays.lock().unwrap().pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                resource: "pokemon list".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }

        let start = (offset as usize).min(self.names.len());
        let end = (start + limit as usize).min(self.names.len());

        Ok(Page {
            count: self.names.len() as u32,
            next: (end < self.names.len()).then(|| format!("/pokemon?offset={end}")),
            previous: None,
            results: self.names[start..end]
                .iter()
                .enumerate()
                .map(|(index, name)| NamedResource {
                    name: name.clone(),
                    url: format!("https://pokeapi.co/api/v2/pokemon/{}/", start + index + 1),
                })
                .collect(),
        })
    }

    async fn pokemon(&self, id: Id) -> Result<Creature, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("pokemon {id}")))
    }

    async fn types(&self) -> Result<Vec<NamedResource>, ApiError> {
        if self.fail_types.load(Ordering::SeqCst) {
            return Err(not_found("type list".to_string()));
        }

        Ok(self
            .types
            .iter()
            .map(|name| NamedResource {
                name: name.clone(),
                url: String::new(),
            })
            .collect())
    }

    async fn type_details(&self, name: &str) -> Result<TypeDetails, ApiError> {
        Err(not_found(format!("type {name}")))
    }

    async fn species(&self, id: Id) -> Result<Species, ApiError> {
        self.species
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("species {id}")))
    }

    async fn evolution_chain(&self, url: &str) -> Result<EvolutionChain, ApiError> {
        self.chains
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(format!("evolution chain {url}")))
    }

    async fn regions(&self) -> Result<Vec<NamedResource>, ApiError> {
        Ok(Vec::new())
    }

    async fn region(&self, name: &str) -> Result<Region, ApiError> {
        Err(not_found(format!("region {name}")))
    }
}

/// Storage whose writes always fail.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Io(io::Error::other("storage unavailable")))
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Io(io::Error::other("disk full")))
    }
}
