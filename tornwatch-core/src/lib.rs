// src/lib.rs

pub mod cache;
pub mod clock;
pub mod config;
pub mod credential;
pub mod fetcher;
pub mod http;
pub mod services;
pub mod tasks;
pub mod test_utils;
pub mod utils;

pub use tornwatch_common::error::Error;
pub use http::{DefaultHttpClient, HttpClient};
pub use services::engine::{Collaborators, Engine, EngineHandle};
