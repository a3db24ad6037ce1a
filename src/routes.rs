// routes.rs
// HTTP surface over the catalog store.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::CatalogSource;
use crate::catalog::{Region, TypeDetails};
use crate::error::{ApiError, StoreError};
use crate::pokemon::{Card, Creature, Id, NamedResource};
use crate::storage::KeyValueStore;
use crate::store::{CacheReport, CatalogState, CatalogStore, EvolutionMember};

type AppState<S, K> = State<Arc<CatalogStore<S, K>>>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(error: ApiError) -> Self {
        let status = match &error {
            ApiError::MissingEvolutionChain(_) => StatusCode::NOT_FOUND,
            error if error.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };

        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<StoreError> for HttpError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Api(error) => error.into(),
            StoreError::Busy => Self {
                status: StatusCode::CONFLICT,
                message: error.to_string(),
            },
        }
    }
}

pub fn router<S, K>(store: Arc<CatalogStore<S, K>>) -> Router
where
    S: CatalogSource + 'static,
    K: KeyValueStore + 'static,
{
    Router::new()
        .route("/pokemon", get(snapshot::<S, K>))
        .route("/pokemon/more", post(load_more::<S, K>))
        .route("/pokemon/refresh", post(refresh::<S, K>))
        .route("/pokemon/{id}", get(creature::<S, K>))
        .route("/pokemon/{id}/card", get(card::<S, K>))
        .route("/pokemon/{id}/evolution", get(evolution::<S, K>))
        .route("/pokemon/{id}/description", get(description::<S, K>))
        .route("/search", get(search::<S, K>).delete(clear_search::<S, K>))
        .route("/favorites", get(favorites::<S, K>))
        .route(
            "/favorites/{id}",
            put(add_favorite::<S, K>).delete(remove_favorite::<S, K>),
        )
        .route("/types", get(types::<S, K>))
        .route("/types/{name}", get(type_details::<S, K>))
        .route("/catalog/by-type", get(by_type::<S, K>))
        .route("/regions", get(regions::<S, K>))
        .route("/regions/{name}", get(region::<S, K>))
        .route("/random", get(random::<S, K>))
        .route("/cache", get(cache_report::<S, K>).delete(clear_caches::<S, K>))
        .with_state(store)
}

async fn snapshot<S, K>(State(store): AppState<S, K>) -> Json<CatalogState>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.snapshot())
}

async fn load_more<S, K>(State(store): AppState<S, K>) -> Result<Json<CatalogState>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    store.load_more().await?;
    Ok(Json(store.snapshot()))
}

async fn refresh<S, K>(State(store): AppState<S, K>) -> Result<Json<CatalogState>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    store.refresh().await?;
    Ok(Json(store.snapshot()))
}

async fn creature<S, K>(
    State(store): AppState<S, K>,
    Path(id): Path<u32>,
) -> Result<Json<Creature>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.creature(Id(id)).await?))
}

async fn card<S, K>(
    State(store): AppState<S, K>,
    Path(id): Path<u32>,
) -> Result<Json<Card>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.card(Id(id)).await?))
}

async fn evolution<S, K>(
    State(store): AppState<S, K>,
    Path(id): Path<u32>,
) -> Result<Json<Vec<EvolutionMember>>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.evolution_line(Id(id)).await?))
}

#[derive(Debug, Serialize)]
struct Description {
    id: Id,
    description: String,
}

async fn description<S, K>(State(store): AppState<S, K>, Path(id): Path<u32>) -> Json<Description>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    let id = Id(id);

    Json(Description {
        id,
        description: store.description(id).await,
    })
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search<S, K>(
    State(store): AppState<S, K>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Creature>>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.search(&query.q))
}

async fn clear_search<S, K>(State(store): AppState<S, K>) -> StatusCode
where
    S: CatalogSource,
    K: KeyValueStore,
{
    store.clear_search();
    StatusCode::NO_CONTENT
}

async fn favorites<S, K>(State(store): AppState<S, K>) -> Json<Vec<Creature>>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.snapshot().favorites)
}

async fn add_favorite<S, K>(
    State(store): AppState<S, K>,
    Path(id): Path<u32>,
) -> Result<StatusCode, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    let creature = store.creature(Id(id)).await?;

    if store.add_favorite(creature).await {
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}

async fn remove_favorite<S, K>(State(store): AppState<S, K>, Path(id): Path<u32>) -> StatusCode
where
    S: CatalogSource,
    K: KeyValueStore,
{
    if store.remove_favorite(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn types<S, K>(State(store): AppState<S, K>) -> Json<Vec<String>>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.snapshot().types)
}

async fn type_details<S, K>(
    State(store): AppState<S, K>,
    Path(name): Path<String>,
) -> Result<Json<TypeDetails>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.type_details(&name).await?))
}

async fn by_type<S, K>(State(store): AppState<S, K>) -> Json<BTreeMap<String, Vec<Creature>>>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.group_by_type())
}

async fn regions<S, K>(State(store): AppState<S, K>) -> Result<Json<Vec<NamedResource>>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.regions().await?))
}

async fn region<S, K>(
    State(store): AppState<S, K>,
    Path(name): Path<String>,
) -> Result<Json<Region>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.region(&name).await?))
}

async fn random<S, K>(State(store): AppState<S, K>) -> Result<Json<Creature>, HttpError>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Ok(Json(store.featured().await?))
}

async fn cache_report<S, K>(State(store): AppState<S, K>) -> Json<CacheReport>
where
    S: CatalogSource,
    K: KeyValueStore,
{
    Json(store.cache_report())
}

async fn clear_caches<S, K>(State(store): AppState<S, K>) -> StatusCode
where
    S: CatalogSource,
    K: KeyValueStore,
{
    store.clear_caches();
    StatusCode::NO_CONTENT
}
