// core logic - query formatting, the powo adapter, and model extraction

mod ai;
mod powo;
mod query;

pub use ai::{Ai, Provider};
pub use powo::{
    DEFAULT_SEARCH_URL, DEFAULT_TAXON_URL, DEFAULT_TIMEOUT, Distribution, Lookup, Powo,
    PowoConfig, SpeciesRecord,
};
pub use query::SpeciesQuery;
