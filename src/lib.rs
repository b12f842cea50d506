pub mod config;
pub mod controller;
pub mod data_store;
pub mod graph;
pub mod metadata;
pub mod persistence;
pub mod projection;
pub mod request;

pub use controller::Controller;

#[cfg(test)]
mod test_utils;
