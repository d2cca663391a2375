use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("Invalid input: {0}")]
    #[diagnostic(code(powo::invalid_input), help("give a genus and a species, e.g. `Quercus alba`"))]
    InvalidInput(String),

    #[error("Lookup failed: {0}")]
    #[diagnostic(code(powo::lookup))]
    Lookup(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Could not extract a genus and species from the request: {0}")]
    Extraction(String),

    #[error("Missing API key. Set OPENAI_API_KEY (openai) or ANTHROPIC_API_KEY (claude)")]
    #[diagnostic(help("or pass --api-key"))]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }
}
