pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store, load_fixtures, FixtureOpinion};
pub use sled_store::SledStore;
pub use store::*;
