// plants of the world online - search for a species, then pull taxon details

use crate::Error;
use crate::core::SpeciesQuery;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_SEARCH_URL: &str = "https://powo.science.kew.org/api/2/search";
pub const DEFAULT_TAXON_URL: &str = "https://powo.science.kew.org/api/2/taxon";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PowoConfig {
    pub search_url: String,
    pub taxon_url: String,
    pub timeout: Duration,
}

impl Default for PowoConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            taxon_url: DEFAULT_TAXON_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct Powo {
    client: reqwest::Client,
    config: PowoConfig,
}

/// One taxon, reshaped from powo's detail payload.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesRecord {
    pub fq_id: String,
    pub accepted_name: String,
    pub authors: Option<String>,
    pub family: Option<String>,
    pub rank: Option<String>,
    pub taxonomic_status: Option<String>,
    pub synonyms: Vec<String>,
    pub distribution: Distribution,
    pub source_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Distribution {
    pub native: Vec<String>,
    pub introduced: Vec<String>,
}

/// Everything one search turned up.
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    pub query: SpeciesQuery,
    pub search_url: String,
    pub total_found: usize,
    pub records: Vec<SpeciesRecord>,
}

// what the search endpoint sends back, we only need the ids
#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "fqId")]
    fq_id: Option<String>,
}

// what the taxon endpoint sends back
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxonPayload {
    fq_id: String,
    name: String,
    authors: Option<String>,
    family: Option<String>,
    rank: Option<String>,
    taxonomic_status: Option<String>,
    #[serde(default)]
    synonym: bool,
    accepted: Option<NameRef>,
    #[serde(default)]
    synonyms: Vec<NameRef>,
    #[serde(default)]
    distribution: Option<DistributionPayload>,
}

#[derive(Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Deserialize, Default)]
struct DistributionPayload {
    #[serde(default)]
    natives: Vec<Region>,
    #[serde(default)]
    introduced: Vec<Region>,
}

#[derive(Deserialize)]
struct Region {
    name: String,
}

impl Powo {
    pub fn new(config: PowoConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn search_url(&self, query: &SpeciesQuery) -> Result<Url, Error> {
        query.search_url(&self.config.search_url)
    }

    pub fn taxon_url(&self, fq_id: &str) -> Result<Url, Error> {
        let base = self.config.taxon_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{fq_id}"))
            .map_err(|e| Error::invalid(format!("bad taxon url {base}: {e}")))?;
        url.query_pairs_mut().append_pair("fields", "distribution");
        Ok(url)
    }

    // ids of every species that matched, first occurrence wins
    pub async fn search(&self, query: &SpeciesQuery) -> Result<Vec<String>, Error> {
        let url = self.search_url(query)?;
        debug!(%url, "searching powo");

        let body = self.get(url).await?;
        let payload: SearchPayload = serde_json::from_str(&body)
            .map_err(|e| Error::lookup(format!("malformed search response: {e}")))?;

        let mut ids: Vec<String> = Vec::new();
        for id in payload.results.into_iter().filter_map(|hit| hit.fq_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        info!(query = %query, hits = ids.len(), "powo search finished");
        Ok(ids)
    }

    pub async fn taxon(&self, fq_id: &str) -> Result<SpeciesRecord, Error> {
        let url = self.taxon_url(fq_id)?;
        debug!(%url, "fetching taxon");

        let body = self.get(url.clone()).await?;
        let payload: TaxonPayload = serde_json::from_str(&body)
            .map_err(|e| Error::lookup(format!("malformed taxon response for {fq_id}: {e}")))?;

        Ok(payload.into_record(url.to_string()))
    }

    // search, then details for every hit; any failure fails the lot
    pub async fn lookup(&self, query: &SpeciesQuery) -> Result<Lookup, Error> {
        let search_url = self.search_url(query)?.to_string();
        let ids = self.search(query).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            records.push(self.taxon(id).await?);
        }

        Ok(Lookup {
            query: query.clone(),
            search_url,
            total_found: ids.len(),
            records,
        })
    }

    async fn get(&self, url: Url) -> Result<String, Error> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::lookup(format!("could not reach {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "powo returned an error status");
            return Err(Error::lookup(format!("{url} returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| Error::lookup(format!("could not read response from {url}: {e}")))
    }
}

impl TaxonPayload {
    fn into_record(self, source_url: String) -> SpeciesRecord {
        // a synonym points at its accepted name
        let accepted_name = match (self.synonym, self.accepted) {
            (true, Some(accepted)) => accepted.name,
            _ => self.name,
        };

        let distribution = self.distribution.unwrap_or_default();

        SpeciesRecord {
            fq_id: self.fq_id,
            accepted_name,
            authors: self.authors,
            family: self.family,
            rank: self.rank,
            taxonomic_status: self.taxonomic_status,
            synonyms: self.synonyms.into_iter().map(|s| s.name).collect(),
            distribution: Distribution {
                native: distribution.natives.into_iter().map(|r| r.name).collect(),
                introduced: distribution.introduced.into_iter().map(|r| r.name).collect(),
            },
            source_url,
        }
    }
}
