pub mod interrupt;
pub mod key_source;
pub mod session;
pub mod view;
