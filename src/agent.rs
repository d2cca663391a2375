// request handling - plain english in, a trail of progress messages out

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{Ai, Error, Powo, SpeciesQuery};

const MARKDOWN: &str = "text/markdown";

/// What a request produces, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    ProcessBegin {
        summary: String,
    },
    ProcessLog {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Artifact {
        mimetype: String,
        description: String,
        uris: Vec<String>,
        metadata: serde_json::Value,
    },
    Reply {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
}

pub struct Agent {
    powo: Powo,
    ai: Option<Ai>,
}

impl Agent {
    /// `ai` may be left out when every request comes with structured params.
    pub fn new(powo: Powo, ai: Option<Ai>) -> Self {
        Self { powo, ai }
    }

    pub async fn run(&self, request: &str, params: Option<SpeciesQuery>) -> Vec<Response> {
        let mut out = vec![Response::ProcessBegin {
            summary: "Analyzing plant request".to_string(),
        }];

        let query = match params {
            Some(query) => query,
            None => match self.extract(request).await {
                Ok(query) => query,
                Err(e @ (Error::Extraction(_) | Error::InvalidInput(_))) => {
                    warn!(error = %e, "could not extract a species query");
                    out.push(reply("Sorry, I couldn't extract plant information from your request."));
                    return out;
                }
                // the model itself failed, the user should see why
                Err(e) => {
                    warn!(error = %e, "model request failed");
                    out.push(failure(&e));
                    return out;
                }
            },
        };

        info!(query = %query, "handling plant request");
        self.search(&query, &mut out).await;
        out
    }

    async fn extract(&self, request: &str) -> Result<SpeciesQuery, Error> {
        match &self.ai {
            Some(ai) => ai.extract_query(request).await,
            // without a model the request has to be "genus species" already
            None => SpeciesQuery::parse(request),
        }
    }

    async fn search(&self, query: &SpeciesQuery, out: &mut Vec<Response>) {
        out.push(log(
            format!("Identified: {query}"),
            Some(json!({ "genus": query.genus, "species": query.species })),
        ));

        let search_url = match self.powo.search_url(query) {
            Ok(url) => url.to_string(),
            Err(e) => {
                out.push(failure(&e));
                return;
            }
        };

        out.push(log(
            format!("Searching Kew Gardens database by querying: {query}"),
            Some(json!({ "search_url": search_url })),
        ));

        let ids = match self.powo.search(query).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "powo search failed");
                out.push(reply("Search failed due to server error"));
                return;
            }
        };

        if ids.is_empty() {
            out.push(reply(format!("No plants found matching {query}")));
            return;
        }

        let total = ids.len();
        out.push(Response::Artifact {
            mimetype: MARKDOWN.to_string(),
            description: format!("Search results for {query}"),
            uris: vec![search_url.clone()],
            metadata: json!({
                "genus": query.genus,
                "species": query.species,
                "total_found": total,
                "search_url": search_url,
            }),
        });
        out.push(log(
            format!("Search completed. Found {total} matching plants."),
            Some(json!({ "total_matches": total })),
        ));
        out.push(log(
            format!("Retrieving plant details by fetching detailed information for {total} plants."),
            None,
        ));

        let mut records = Vec::with_capacity(total);
        for id in &ids {
            match self.powo.taxon(id).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(fq_id = %id, error = %e, "taxon lookup failed");
                    out.push(failure(&e));
                    return;
                }
            }
        }

        out.push(log(
            format!("Successfully retrieved {} plant details.", records.len()),
            None,
        ));

        let detail_urls: Vec<String> = records.iter().map(|r| r.source_url.clone()).collect();
        out.push(Response::Artifact {
            mimetype: MARKDOWN.to_string(),
            description: format!("Detailed botanical information for {query}"),
            uris: detail_urls.clone(),
            metadata: json!({
                "genus": query.genus,
                "species": query.species,
                "total_found": total,
                "details_retrieved": records.len(),
                "search_url": search_url,
                "plant_details_url": detail_urls,
            }),
        });

        out.push(Response::Reply {
            text: format!(
                "Found {total} total matches for {query}. \
                 The artifact contains the complete botanical information."
            ),
            data: Some(json!({ "records": records })),
        });
    }
}

fn log(text: impl Into<String>, data: Option<serde_json::Value>) -> Response {
    Response::ProcessLog {
        text: text.into(),
        data,
    }
}

fn reply(text: impl Into<String>) -> Response {
    Response::Reply {
        text: text.into(),
        data: None,
    }
}

fn failure(e: &Error) -> Response {
    Response::Reply {
        text: "An error occurred while retrieving plant information".to_string(),
        data: Some(json!({ "error": e.to_string() })),
    }
}
