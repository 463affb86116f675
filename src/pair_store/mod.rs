pub mod normalizer;
pub mod pair_store;
pub mod registry;
pub mod sources;
