#![allow(clippy::module_inception)]

pub mod config;
pub mod dictionary;
pub mod graph;
pub mod pair_store;
pub mod pipeline;
pub mod resolver;
pub mod store;
pub mod utils;
