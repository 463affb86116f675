pub mod lookup;
pub mod materializer;
