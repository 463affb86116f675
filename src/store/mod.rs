pub mod resolution_store;
