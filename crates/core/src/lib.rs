pub mod common;
pub mod config;
pub mod market;
pub mod store;
