pub mod association_graph;
pub mod reduction;
