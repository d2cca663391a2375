// genus + species query, normalized the way powo expects it

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// powo caps a page at 500, the cursor "*" asks for the first page
const PER_PAGE: &str = "500";
const CURSOR: &str = "*";
const SPECIES_FILTER: &str = "species_f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct SpeciesQuery {
    pub genus: String,
    pub species: String,
}

// deserialized queries go through the same checks as `new`
#[derive(Deserialize)]
struct RawQuery {
    genus: String,
    species: String,
}

impl TryFrom<RawQuery> for SpeciesQuery {
    type Error = Error;

    fn try_from(raw: RawQuery) -> Result<Self, Error> {
        Self::new(&raw.genus, &raw.species)
    }
}

impl SpeciesQuery {
    /// Build a query from a genus and species epithet.
    ///
    /// Both parts are trimmed and must be a single non-empty word. The genus
    /// is capitalized and the epithet lower-cased, so `"QUERCUS", "Alba"`
    /// becomes `Quercus alba`.
    pub fn new(genus: &str, species: &str) -> Result<Self, Error> {
        let genus = single_word("genus", genus)?;
        let species = single_word("species", species)?;

        Ok(Self {
            genus: capitalize(genus),
            species: species.to_lowercase(),
        })
    }

    /// Parse free text like `"Quercus alba"`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let words: Vec<&str> = text.split_whitespace().collect();
        match words.as_slice() {
            [genus, species] => Self::new(genus, species),
            [] => Err(Error::invalid("expected a genus and species, got nothing")),
            _ => Err(Error::invalid(format!(
                "expected exactly two words (genus species), got {}",
                words.len()
            ))),
        }
    }

    // order matters, it shows up in the url we log and hand back
    pub fn search_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("perPage", PER_PAGE.to_string()),
            ("cursor", CURSOR.to_string()),
            ("q", format!("genus:{},species:{}", self.genus, self.species)),
            ("f", SPECIES_FILTER.to_string()),
        ]
    }

    pub fn search_url(&self, base: &str) -> Result<Url, Error> {
        Url::parse_with_params(base, self.search_params())
            .map_err(|e| Error::invalid(format!("bad search url {base}: {e}")))
    }
}

impl fmt::Display for SpeciesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.genus, self.species)
    }
}

fn single_word<'a>(field: &str, value: &'a str) -> Result<&'a str, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid(format!("{field} must not be empty")));
    }
    if value.contains(char::is_whitespace) {
        return Err(Error::invalid(format!("{field} must be a single word, got {value:?}")));
    }
    Ok(value)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
