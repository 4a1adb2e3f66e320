//! Deck provider backed by the public PokeAPI.
//!
//! Enabled with the `pokeapi` feature. Picks distinct creatures from the
//! first generation (ids `1..=151`), fetches them concurrently and uses the
//! official artwork, falling back to the default sprite.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::try_join_all;
use serde::Deserialize;

use super::{DeckItem, DeckProvider};
use crate::core::{CardId, DeckError, GameRng};

/// Public API root.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Only the first generation is dealt.
pub const DEFAULT_CATALOG_LIMIT: u32 = 151;

#[derive(Debug, Deserialize)]
struct PokemonList {
    count: u32,
}

impl PokemonList {
    /// Creatures that may be dealt: the listed count, capped at `limit`.
    fn available(&self, limit: u32) -> usize {
        self.count.min(limit) as usize
    }
}

/// Distinct creature ids in `1..=available` for request number `request`.
fn pick_ids(
    seed: u64,
    request: u64,
    available: usize,
    pair_count: usize,
) -> Result<Vec<u32>, DeckError> {
    let mut rng = GameRng::stream(seed, request);
    let indices = rng
        .sample_indices(available, pair_count)
        .ok_or(DeckError::Insufficient {
            requested: pair_count,
            available,
        })?;

    // Ids are 1-based
    Ok(indices.into_iter().map(|index| index as u32 + 1).collect())
}

#[derive(Debug, Deserialize)]
struct Pokemon {
    id: u32,
    name: String,
    sprites: Sprites,
}

#[derive(Debug, Deserialize)]
struct Sprites {
    front_default: Option<String>,
    #[serde(default)]
    other: Option<OtherSprites>,
}

#[derive(Debug, Deserialize)]
struct OtherSprites {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<Artwork>,
}

#[derive(Debug, Deserialize)]
struct Artwork {
    front_default: Option<String>,
}

impl Pokemon {
    fn into_item(self) -> Result<DeckItem, DeckError> {
        let identity = CardId::new(self.id);
        let artwork = self
            .sprites
            .other
            .and_then(|other| other.official_artwork)
            .and_then(|artwork| artwork.front_default);

        let image_ref = artwork
            .or(self.sprites.front_default)
            .filter(|url| !url.trim().is_empty())
            .ok_or(DeckError::MissingImage(identity))?;

        Ok(DeckItem::new(identity, self.name, image_ref))
    }
}

/// Fetches decks from PokeAPI.
#[derive(Debug)]
pub struct PokeApiProvider {
    client: reqwest::Client,
    base_url: String,
    catalog_limit: u32,
    seed: u64,
    requests: AtomicU64,
}

impl PokeApiProvider {
    /// Create a provider against the public API.
    pub fn new(seed: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog_limit: DEFAULT_CATALOG_LIMIT,
            seed,
            requests: AtomicU64::new(0),
        }
    }

    /// Point at another API root (mirrors, local fixtures).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Restrict sampling to ids `1..=limit`.
    #[must_use]
    pub fn with_catalog_limit(mut self, limit: u32) -> Self {
        self.catalog_limit = limit;
        self
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, DeckError> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| {
                tracing::warn!(%url, %error, "deck request failed");
                DeckError::unavailable(error.to_string())
            })?;

        response.json::<T>().await.map_err(|error| {
            tracing::warn!(%url, %error, "malformed deck response");
            DeckError::unavailable(format!("malformed response from {url}: {error}"))
        })
    }

    async fn catalog_size(&self) -> Result<usize, DeckError> {
        let url = format!("{}/pokemon?limit={}", self.base_url, self.catalog_limit);
        let list: PokemonList = self.get(url).await?;
        Ok(list.available(self.catalog_limit))
    }

    async fn fetch(&self, id: u32) -> Result<DeckItem, DeckError> {
        let pokemon: Pokemon = self.get(format!("{}/pokemon/{id}", self.base_url)).await?;
        pokemon.into_item()
    }
}

impl DeckProvider for PokeApiProvider {
    async fn request_deck(&self, pair_count: usize) -> Result<Vec<DeckItem>, DeckError> {
        let available = self.catalog_size().await?;
        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        let ids = pick_ids(self.seed, request, available, pair_count)?;

        tracing::debug!(pair_count, available, "fetching creatures");
        try_join_all(ids.into_iter().map(|id| self.fetch(id))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<DeckItem, DeckError> {
        serde_json::from_str::<Pokemon>(json).unwrap().into_item()
    }

    #[test]
    fn test_prefers_official_artwork() {
        let item = parse(
            r#"{
                "id": 25,
                "name": "pikachu",
                "sprites": {
                    "front_default": "sprite.png",
                    "other": { "official-artwork": { "front_default": "art.png" } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(item.identity, CardId::new(25));
        assert_eq!(item.display_name, "pikachu");
        assert_eq!(item.image_ref, "art.png");
    }

    #[test]
    fn test_falls_back_to_sprite() {
        let item = parse(
            r#"{
                "id": 1,
                "name": "bulbasaur",
                "sprites": { "front_default": "sprite.png", "other": { "official-artwork": null } }
            }"#,
        )
        .unwrap();
        assert_eq!(item.image_ref, "sprite.png");
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let result = parse(r#"{ "id": 7, "name": "squirtle", "sprites": { "front_default": null } }"#);
        assert_eq!(result, Err(DeckError::MissingImage(CardId::new(7))));
    }

    #[test]
    fn test_catalog_size_is_capped() {
        let list: PokemonList = serde_json::from_str(r#"{ "count": 1302, "results": [] }"#).unwrap();
        assert_eq!(list.available(DEFAULT_CATALOG_LIMIT), 151);

        let small: PokemonList = serde_json::from_str(r#"{ "count": 40 }"#).unwrap();
        assert_eq!(small.available(DEFAULT_CATALOG_LIMIT), 40);
    }

    #[test]
    fn test_pick_ids_are_distinct_and_one_based() {
        let ids = pick_ids(42, 0, 151, 12).unwrap();
        assert_eq!(ids.len(), 12);
        assert!(ids.iter().all(|&id| (1..=151).contains(&id)));

        let mut unique = ids.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 12);

        // Every id of a full catalog shows up, so none is off by one
        let mut all = pick_ids(42, 0, 6, 6).unwrap();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pick_ids_per_request() {
        assert_eq!(pick_ids(7, 3, 151, 6), pick_ids(7, 3, 151, 6));
        assert_ne!(pick_ids(7, 0, 151, 6), pick_ids(7, 1, 151, 6));
    }

    #[test]
    fn test_pick_ids_insufficient() {
        assert_eq!(
            pick_ids(1, 0, 4, 12),
            Err(DeckError::Insufficient { requested: 12, available: 4 })
        );
    }

    #[test]
    fn test_catalog_limit_builder() {
        let provider = PokeApiProvider::new(3).with_catalog_limit(20);
        assert_eq!(provider.catalog_limit, 20);
        assert_eq!(provider.requests.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let provider = PokeApiProvider::new(1).with_base_url("http://localhost:8080/api/");
        assert_eq!(provider.base_url, "http://localhost:8080/api");
    }
}
