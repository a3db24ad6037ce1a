// store.rs
// Catalog state shared with the presentation layer.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future;
use serde::Serialize;

use crate::api::CatalogSource;
use crate::cache::{CacheStats, InmemoryCache};
use crate::catalog::{Region, Species, TypeDetails};
use crate::config::Config;
use crate::error::{ApiError, StoreError};
use crate::evolution::{self, EvolutionEntry};
use crate::pokemon::{Card, Creature, Id, NamedResource};
use crate::storage::KeyValueStore;

/// Ids drawn by [`CatalogStore::featured`] (the first generation).
pub const FEATURED_RANGE: std::ops::RangeInclusive<u32> = 1..=151;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl Cursor {
    fn new(limit: u32) -> Self {
        Self {
            offset: 0,
            limit,
            has_more: true,
        }
    }
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogState {
    pub catalog: Vec<Creature>,
    pub search_results: Vec<Creature>,
    pub is_searching: bool,
    pub favorites: Vec<Creature>,
    pub types: Vec<String>,
    pub cursor: Cursor,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped by every reset; page loads started under an older value are discarded.
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    favorites_version: u64,
}

impl CatalogState {
    fn new(page_size: u32) -> Self {
        Self {
            catalog: Vec::new(),
            search_results: Vec::new(),
            is_searching: false,
            favorites: Vec::new(),
            types: Vec::new(),
            cursor: Cursor::new(page_size),
            loading: false,
            error: None,
            generation: 0,
            favorites_version: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize, has_more: bool },
    /// A refresh started while this load was in flight; its result was dropped.
    Superseded,
    /// Nothing left to page in.
    Exhausted,
}

/// One stage of an evolution line with the record it resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionMember {
    #[serde(flatten)]
    pub entry: EvolutionEntry,
    pub creature: Creature,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheUsage {
    pub entries: usize,
    pub hit_rate: f64,
    #[serde(flatten)]
    pub stats: CacheStats,
}

impl<K, V> From<&InmemoryCache<K, V>> for CacheUsage
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn from(cache: &InmemoryCache<K, V>) -> Self {
        let stats = cache.stats();

        Self {
            entries: cache.len(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub creatures: CacheUsage,
    pub evolutions: CacheUsage,
}

pub struct CatalogStore<S, K> {
    source: S,
    storage: K,
    favorites_key: String,
    page_size: u32,
    state: Mutex<CatalogState>,
    creatures: InmemoryCache<Id, Creature>,
    evolutions: InmemoryCache<Id, Vec<EvolutionEntry>>,
    /// Version of the last favorites snapshot written to storage.
    favorites_writer: tokio::sync::Mutex<u64>,
}

impl<S, K> CatalogStore<S, K>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    pub fn new(source: S, storage: K, config: &Config) -> Self {
        let (creatures, evolutions) = if config.pokemon.cache_enabled {
            (
                InmemoryCache::new(&config.cache),
                InmemoryCache::new(&config.cache),
            )
        } else {
            (InmemoryCache::disabled(), InmemoryCache::disabled())
        };

        Self {
            source,
            storage,
            favorites_key: config.storage.favorites_key.clone(),
            page_size: config.pokemon.page_size,
            state: Mutex::new(CatalogState::new(config.pokemon.page_size)),
            creatures,
            evolutions,
            favorites_writer: tokio::sync::Mutex::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CatalogState {
        self.state().clone()
    }

    /// Spawns a periodic expiry sweep for each enabled cache.
    pub fn spawn_cache_cleanup(&self, period: Duration) {
        if self.creatures.is_enabled() {
            tokio::spawn(self.creatures.clone().run_cleanup(period));
        }

        if self.evolutions.is_enabled() {
            tokio::spawn(self.evolutions.clone().run_cleanup(period));
        }
    }

    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            creatures: CacheUsage::from(&self.creatures),
            evolutions: CacheUsage::from(&self.evolutions),
        }
    }

    /// Forgets every cached record and evolution line.
    pub fn clear_caches(&self) {
        self.creatures.clear();
        self.evolutions.clear();
    }

    /// Loads favorites, types and the first page concurrently.
    pub async fn initialize(&self) {
        let (_, types, page) = tokio::join!(
            self.load_favorites(),
            self.load_types(),
            self.load_page(false)
        );

        if let Err(e) = types {
            tracing::warn!("Starting without creature types: {}", e);
        }

        if let Err(e) = page {
            tracing::warn!("Starting without a catalog page: {}", e);
        }
    }

    pub async fn load_types(&self) -> Result<(), StoreError> {
        match self.source.types().await {
            Ok(types) => {
                let names: Vec<String> = types.into_iter().map(|kind| kind.name).collect();
                tracing::info!("Loaded {} creature types", names.len());
                self.state().types = names;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load creature types: {}", e);
                self.state().error = Some("Could not load creature types".to_string());
                Err(e.into())
            }
        }
    }

    /// Loads the page at the cursor, or the first page when `reset` is set.
    ///
    /// A plain load is rejected while another load is in flight. A reset is
    /// never rejected: it supersedes whatever is in flight.
    pub async fn load_page(&self, reset: bool) -> Result<LoadOutcome, StoreError> {
        let (generation, offset, limit) = {
            let mut state = self.state();

            if state.loading && !reset {
                tracing::debug!("Rejecting page load: another load is in flight");
                return Err(StoreError::Busy);
            }

            if reset {
                state.generation += 1;
            }

            state.loading = true;
            state.error = None;

            let offset = if reset { 0 } else { state.cursor.offset };
            (state.generation, offset, self.page_size)
        };

        let page = match self.source.pokemon_page(limit, offset).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to load catalog page at offset {}: {}", offset, e);

                let mut state = self.state();
                if state.generation == generation {
                    state.error = Some("Could not load the creature list".to_string());
                    state.loading = false;
                }

                return Err(e.into());
            }
        };

        let has_more = page.next.is_some();
        let lookups: Vec<_> = page
            .results
            .iter()
            .filter_map(|summary| {
                let Some(id) = summary.id() else {
                    tracing::warn!(
                        "Skipping catalog entry {} without an id in {:?}",
                        summary.name,
                        summary.url
                    );
                    return None;
                };

                Some(self.creature_or_stub(Id(id), &summary.name))
            })
            .collect();
        let creatures = future::join_all(lookups).await;

        let mut state = self.state();

        if state.generation != generation {
            tracing::debug!("Discarding stale catalog page at offset {}", offset);
            return Ok(LoadOutcome::Superseded);
        }

        let count = creatures.len();

        if reset {
            state.catalog = creatures;
        } else {
            state.catalog.extend(creatures);
        }

        state.cursor.offset = offset + limit;
        state.cursor.has_more = has_more;
        state.loading = false;

        tracing::info!(
            "Loaded {} creatures at offset {} ({} in catalog)",
            count,
            offset,
            state.catalog.len()
        );

        Ok(LoadOutcome::Loaded { count, has_more })
    }

    /// Pages in the next batch when there is one and nothing is loading.
    pub async fn load_more(&self) -> Result<LoadOutcome, StoreError> {
        {
            let state = self.state();

            if state.loading {
                return Err(StoreError::Busy);
            }

            if !state.cursor.has_more {
                return Ok(LoadOutcome::Exhausted);
            }
        }

        self.load_page(false).await
    }

    /// Reloads the catalog from offset zero.
    pub async fn refresh(&self) -> Result<LoadOutcome, StoreError> {
        tracing::info!("Refreshing catalog");
        self.load_page(true).await
    }

    /// Filters the loaded catalog by name. Blank terms leave search mode.
    pub fn search(&self, term: &str) -> Vec<Creature> {
        if term.trim().is_empty() {
            self.clear_search();
            return Vec::new();
        }

        let needle = term.to_lowercase();
        let mut state = self.state();

        let results: Vec<Creature> = state
            .catalog
            .iter()
            .filter(|creature| creature.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        tracing::debug!("Search for {:?} matched {} creatures", term, results.len());

        state.search_results = results.clone();
        state.is_searching = true;
        results
    }

    pub fn clear_search(&self) {
        let mut state = self.state();
        state.is_searching = false;
        state.search_results.clear();
    }

    pub fn is_favorite(&self, id: impl Into<Id>) -> bool {
        let id = id.into();
        self.state().favorites.iter().any(|favorite| favorite.id == id)
    }

    /// Returns `false` when the creature was already a favorite.
    pub async fn add_favorite(&self, creature: Creature) -> bool {
        let snapshot = {
            let mut state = self.state();

            if state.favorites.iter().any(|favorite| favorite.id == creature.id) {
                return false;
            }

            tracing::info!("Adding {} to favorites", creature.name);
            state.favorites.push(creature);
            state.favorites_version += 1;
            (state.favorites_version, state.favorites.clone())
        };

        self.persist_favorites(snapshot).await;
        true
    }

    /// Returns `false` when the creature was not a favorite.
    pub async fn remove_favorite(&self, id: impl Into<Id>) -> bool {
        let id = id.into();

        let snapshot = {
            let mut state = self.state();
            let before = state.favorites.len();
            state.favorites.retain(|favorite| favorite.id != id);

            if state.favorites.len() == before {
                return false;
            }

            tracing::info!("Removing {} from favorites", id);
            state.favorites_version += 1;
            (state.favorites_version, state.favorites.clone())
        };

        self.persist_favorites(snapshot).await;
        true
    }

    /// Writes are serialized; a snapshot older than the last one written is dropped.
    async fn persist_favorites(&self, (version, favorites): (u64, Vec<Creature>)) {
        let mut written = self.favorites_writer.lock().await;

        if version <= *written {
            tracing::debug!("Skipping stale favorites snapshot v{}", version);
            return;
        }

        let json = match serde_json::to_string(&favorites) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize favorites: {}", e);
                return;
            }
        };

        match self.storage.set(&self.favorites_key, json).await {
            Ok(()) => {
                *written = version;
                tracing::debug!("Persisted {} favorites (v{})", favorites.len(), version);
            }
            Err(e) => tracing::warn!("Failed to persist favorites: {}", e),
        }
    }

    /// Restores favorites saved by a previous session.
    pub async fn load_favorites(&self) {
        let json = match self.storage.get(&self.favorites_key).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                tracing::debug!("No stored favorites");
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to read favorites: {}", e);
                return;
            }
        };

        let stored: Vec<Creature> = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Ignoring malformed favorites: {}", e);
                return;
            }
        };

        let mut favorites: Vec<Creature> = Vec::with_capacity(stored.len());
        for creature in stored {
            if !favorites.iter().any(|favorite| favorite.id == creature.id) {
                favorites.push(creature);
            }
        }

        tracing::info!("Restored {} favorites", favorites.len());
        self.state().favorites = favorites;
    }

    /// Full record for `id`, served from the record cache when possible.
    pub async fn creature(&self, id: Id) -> Result<Creature, ApiError> {
        if let Some(creature) = self.creatures.get(&id) {
            return Ok(creature);
        }

        let creature = self.source.pokemon(id).await?;
        self.creatures.insert(id, creature.clone());
        Ok(creature)
    }

    pub async fn card(&self, id: Id) -> Result<Card, ApiError> {
        Ok(Card::from(&self.creature(id).await?))
    }

    async fn creature_or_stub(&self, id: Id, name: &str) -> Creature {
        match self.creature(id).await {
            Ok(creature) => creature,
            Err(e) => {
                tracing::warn!("Using stub record for {} ({}): {}", name, id, e);
                Creature::stub(id, name)
            }
        }
    }

    /// The flattened evolution line of `id`, each stage resolved to a record.
    ///
    /// Stages whose record cannot be fetched are returned as stubs.
    pub async fn evolution_line(&self, id: Id) -> Result<Vec<EvolutionMember>, ApiError> {
        let entries = match self.evolutions.get(&id) {
            Some(entries) => entries,
            None => {
                let species = self.source.species(id).await?;
                let Some(chain) = species.evolution_chain else {
                    tracing::warn!("No evolution chain available for creature {}", id);
                    return Err(ApiError::MissingEvolutionChain(id.0));
                };

                let chain = self.source.evolution_chain(&chain.url).await?;
                let entries = evolution::flatten(&chain);
                self.evolutions.insert(id, entries.clone());
                entries
            }
        };

        let lookups: Vec<_> = entries
            .iter()
            .map(|entry| self.creature_or_stub(entry.species_id, &entry.species_name))
            .collect();
        let creatures = future::join_all(lookups).await;

        Ok(entries
            .into_iter()
            .zip(creatures)
            .map(|(entry, creature)| EvolutionMember { entry, creature })
            .collect())
    }

    /// Localized flavor text, or a placeholder when none can be fetched.
    pub async fn description(&self, id: Id) -> String {
        match self.source.species(id).await {
            Ok(species) => species.description(),
            Err(e) => {
                tracing::warn!("Failed to fetch description of {}: {}", id, e);
                Species::FALLBACK_DESCRIPTION.to_string()
            }
        }
    }

    pub async fn type_details(&self, name: &str) -> Result<TypeDetails, ApiError> {
        self.source.type_details(name).await
    }

    pub async fn regions(&self) -> Result<Vec<NamedResource>, ApiError> {
        self.source.regions().await
    }

    pub async fn region(&self, name: &str) -> Result<Region, ApiError> {
        self.source.region(name).await
    }

    /// A random first-generation creature.
    pub async fn featured(&self) -> Result<Creature, ApiError> {
        let id = rand::random_range(FEATURED_RANGE);
        tracing::debug!("Featuring creature {}", id);
        self.creature(Id(id)).await
    }

    /// Loaded catalog grouped under every known type tag.
    pub fn group_by_type(&self) -> BTreeMap<String, Vec<Creature>> {
        let state = self.state();

        let mut groups: BTreeMap<String, Vec<Creature>> = state
            .types
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();

        for creature in &state.catalog {
            for kind in &creature.types {
                if let Some(group) = groups.get_mut(kind.name()) {
                    group.push(creature.clone());
                }
            }
        }

        groups
    }
}
