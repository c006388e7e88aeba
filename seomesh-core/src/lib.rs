pub mod audit;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod linking;
pub mod model;
pub mod network;
pub mod report;
pub mod scoring;

pub use error::{Result, SeoError};
