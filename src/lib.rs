// powo library - plant lookups against plants of the world online

pub mod agent;
pub mod card;
pub mod cli;
mod core;
mod error;
pub mod logging;
pub mod output;
mod server;

pub use agent::{Agent, Response};
pub use card::AgentCard;
pub use crate::core::{
    Ai, DEFAULT_SEARCH_URL, DEFAULT_TAXON_URL, DEFAULT_TIMEOUT, Distribution, Lookup, Powo,
    PowoConfig, Provider, SpeciesQuery, SpeciesRecord,
};
pub use error::Error;
pub use server::Server;
