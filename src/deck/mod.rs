//! Deck supply: the provider boundary, validation, and dealing.
//!
//! ## Key Types
//!
//! - `DeckItem`: One distinct identity with its name and art
//! - `DeckProvider`: Async source of distinct items
//! - `CatalogProvider`: In-memory provider (tests, offline play)
//! - `PokeApiProvider`: HTTP provider (feature `pokeapi`)
//!
//! `deal` turns a validated deck into a shuffled board of pairs.

mod catalog;
mod dealer;
mod item;
#[cfg(feature = "pokeapi")]
pub mod pokeapi;
mod provider;

pub use catalog::CatalogProvider;
pub use dealer::deal;
pub use item::DeckItem;
#[cfg(feature = "pokeapi")]
pub use pokeapi::PokeApiProvider;
pub use provider::{validate_deck, DeckProvider};
