// agent card - served at /.well-known/agent.json so orchestrators can find us

use serde::{Deserialize, Serialize};
use serde_json::json;

pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Entry point that takes a free-form request and lets the model pick the plant.
pub const ENTRYPOINT_PLANT_INFO: &str = "get_plant_info";
/// Entry point that takes an explicit genus and species.
pub const ENTRYPOINT_PLANT_DATA: &str = "get_plant_data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icon: Option<String>,
    pub entrypoints: Vec<Entrypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrypoint {
    pub id: String,
    pub description: String,
    pub parameters: Option<serde_json::Value>,
}

impl AgentCard {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: "POWO Plant Data Agent".to_string(),
            description: "Retrieves detailed plant information from Kew Gardens POWO API \
                          using genus and species names."
                .to_string(),
            url: url.into(),
            icon: None,
            entrypoints: vec![
                Entrypoint {
                    id: ENTRYPOINT_PLANT_INFO.to_string(),
                    description: "Returns detailed botanical information for plants".to_string(),
                    parameters: None,
                },
                Entrypoint {
                    id: ENTRYPOINT_PLANT_DATA.to_string(),
                    description: "Get plant data using structured genus and species input."
                        .to_string(),
                    parameters: Some(species_schema()),
                },
            ],
        }
    }

    pub fn entrypoint(&self, id: &str) -> Option<&Entrypoint> {
        self.entrypoints.iter().find(|e| e.id == id)
    }
}

fn species_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "genus": {
                "type": "string",
                "description": "Genus of the plant, e.g Mangifera"
            },
            "species": {
                "type": "string",
                "description": "Species of the plant, e.g indica"
            }
        },
        "required": ["genus", "species"]
    })
}
