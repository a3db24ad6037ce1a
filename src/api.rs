// api.rs
// Read-only client for the PokeAPI REST endpoints.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::catalog::{Page, Region, ResourceList, Species, TypeDetails, TypePayload};
use crate::config::PokemonConfig;
use crate::error::ApiError;
use crate::evolution::EvolutionChain;
use crate::pokemon::{Creature, Id, NamedResource, PokemonPayload};

/// Everything the catalog store reads from upstream.
pub trait CatalogSource: Send + Sync {
    fn pokemon_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Page, ApiError>> + Send;

    fn pokemon(&self, id: Id) -> impl Future<Output = Result<Creature, ApiError>> + Send;

    fn types(&self) -> impl Future<Output = Result<Vec<NamedResource>, ApiError>> + Send;

    fn type_details(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<TypeDetails, ApiError>> + Send;

    fn species(&self, id: Id) -> impl Future<Output = Result<Species, ApiError>> + Send;

    fn evolution_chain(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<EvolutionChain, ApiError>> + Send;

    fn regions(&self) -> impl Future<Output = Result<Vec<NamedResource>, ApiError>> + Send;

    fn region(&self, name: &str) -> impl Future<Output = Result<Region, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct PokeApi {
    client: reqwest::Client,
    api_url: String,
}

impl PokeApi {
    pub fn new(config: &PokemonConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout)))
            .build()?;

        tracing::info!("PokeAPI session started against {}", config.api_url);

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> Result<T, ApiError> {
        tracing::debug!("Fetching {} from URL: {}", resource, url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Failed to make HTTP request to {}: {}", url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Request for {} failed with status: {}", resource, status);
            return Err(ApiError::Status {
                resource: resource.to_string(),
                status,
            });
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse JSON response from {}: {}", url, e);
            ApiError::Decode {
                resource: resource.to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl CatalogSource for PokeApi {
    async fn pokemon_page(&self, limit: u32, offset: u32) -> Result<Page, ApiError> {
        let url = format!("{}/pokemon?limit={limit}&offset={offset}", self.api_url);
        self.get_json(&url, &format!("pokemon list (limit {limit}, offset {offset})"))
            .await
    }

    async fn pokemon(&self, id: Id) -> Result<Creature, ApiError> {
        let url = format!("{}/pokemon/{id}", self.api_url);
        let payload: PokemonPayload = self.get_json(&url, &format!("pokemon {id}")).await?;

        tracing::debug!(
            "Successfully fetched Pokemon: {} (ID: {})",
            payload.name,
            payload.id
        );
        Ok(Creature::from_payload(payload))
    }

    async fn types(&self) -> Result<Vec<NamedResource>, ApiError> {
        let url = format!("{}/type", self.api_url);
        let list: ResourceList = self.get_json(&url, "type list").await?;
        Ok(list.results)
    }

    async fn type_details(&self, name: &str) -> Result<TypeDetails, ApiError> {
        let url = format!("{}/type/{name}", self.api_url);
        let payload: TypePayload = self.get_json(&url, &format!("type {name}")).await?;
        Ok(TypeDetails::from_payload(payload))
    }

    async fn species(&self, id: Id) -> Result<Species, ApiError> {
        let url = format!("{}/pokemon-species/{id}", self.api_url);
        self.get_json(&url, &format!("species {id}")).await
    }

    async fn evolution_chain(&self, url: &str) -> Result<EvolutionChain, ApiError> {
        self.get_json(url, &format!("evolution chain {url}")).await
    }

    async fn regions(&self) -> Result<Vec<NamedResource>, ApiError> {
        let url = format!("{}/region", self.api_url);
        let list: ResourceList = self.get_json(&url, "region list").await?;
        Ok(list.results)
    }

    async fn region(&self, name: &str) -> Result<Region, ApiError> {
        let url = format!("{}/region/{name}", self.api_url);
        self.get_json(&url, &format!("region {name}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn fixture_pokemon(Path(id): Path<u32>) -> Result<Json<Value>, StatusCode> {
        if id == 404 {
            return Err(StatusCode::NOT_FOUND);
        }

        Ok(Json(json!({
            "id": id,
            "name": format!("creature-{id}"),
            "height": 4,
            "weight": 60,
            "types": [{"slot": 1, "type": {"name": "electric", "url": ""}}],
            "stats": [{"base_stat": 35}, {"base_stat": 55}],
            "sprites": {"front_default": "front.png"},
            "abilities": [{"ability": {"name": "static", "url": ""}}]
        })))
    }

    async fn fixture_page(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let offset: u32 = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);

        Json(json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [
                {"name": "bulbasaur", "url": format!("https://pokeapi.co/api/v2/pokemon/{}/", offset + 1)},
                {"name": "ivysaur", "url": format!("https://pokeapi.co/api/v2/pokemon/{}/", offset + 2)}
            ]
        }))
    }

    async fn serve() -> PokeApi {
        let app = Router::new()
            .route("/pokemon", get(fixture_page))
            .route("/pokemon/{id}", get(fixture_pokemon))
            .route(
                "/type",
                get(|| async { Json(json!({"results": [{"name": "fire", "url": ""}, {"name": "water", "url": ""}]})) }),
            )
            .route("/broken", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        PokeApi::new(&PokemonConfig {
            api_url: format!("http://{address}/"),
            timeout: 5,
            cache_enabled: false,
            page_size: 20,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_pokemon() {
        let api = serve().await;

        let creature = api.pokemon(Id(25)).await.unwrap();

        assert_eq!(creature.id, Id(25));
        assert_eq!(creature.name, "creature-25");
        assert_eq!(creature.stats.attack, 55);
        assert_eq!(creature.artwork.as_deref(), Some("front.png"));
    }

    #[tokio::test]
    async fn test_non_success_status_names_the_resource() {
        let api = serve().await;

        let error = api.pokemon(Id(404)).await.unwrap_err();

        assert!(error.is_not_found());
        assert!(error.to_string().contains("pokemon 404"));
    }

    #[tokio::test]
    async fn test_fetch_page_and_types() {
        let api = serve().await;

        let page = api.pokemon_page(20, 40).await.unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].id(), Some(41));
        assert!(page.next.is_none());

        let types = api.types().await.unwrap();
        assert_eq!(types[1].name, "water");
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let api = serve().await;
        let url = format!("{}/broken", api.api_url());

        let error = api.evolution_chain(&url).await.unwrap_err();

        assert!(matches!(error, ApiError::Decode { .. }));
    }
}
