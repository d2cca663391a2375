// command line interface

use crate::output::Output;
use crate::{
    Agent, Ai, DEFAULT_SEARCH_URL, DEFAULT_TAXON_URL, Powo, PowoConfig, Provider, Server,
    SpeciesQuery,
};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

#[derive(Parser)]
#[command(name = "powo", about = "Look up plants in Plants of the World Online")]
struct Cli {
    /// powo search endpoint
    #[arg(long, env = "BASE_SEARCH_URL", default_value = DEFAULT_SEARCH_URL, global = true)]
    search_url: String,

    /// powo taxon endpoint
    #[arg(long, env = "BASE_TAXON_URL", default_value = DEFAULT_TAXON_URL, global = true)]
    taxon_url: String,

    /// seconds to wait on each powo or model request
    #[arg(long, env = "POWO_TIMEOUT", default_value = "30", global = true)]
    timeout: u64,

    /// ai provider (openai, claude)
    #[arg(long, short = 'p', default_value = "openai", global = true)]
    provider: Provider,

    /// api key for the ai provider
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    /// debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// look up a species by genus and species
    Lookup {
        genus: String,
        species: String,

        /// print json instead of text
        #[arg(long)]
        json: bool,
    },

    /// ask in plain english, e.g. "tell me about white oak"
    Ask {
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,
    },

    /// ask questions one after another
    Chat,

    /// start as http server
    Serve {
        /// port number
        #[arg(long, short = 'P', env = "PORT", default_value = "9999")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// url advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,
    },
}

impl Cli {
    fn powo(&self) -> Result<Powo> {
        Ok(Powo::new(PowoConfig {
            search_url: self.search_url.clone(),
            taxon_url: self.taxon_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        })?)
    }

    // no key means no model; requests then have to be "genus species"
    fn ai(&self) -> Option<Ai> {
        let ai = Ai::new(self.provider, self.api_key.clone())
            .and_then(|ai| ai.with_timeout(Duration::from_secs(self.timeout)));

        match ai {
            Ok(ai) => Some(ai),
            Err(e) => {
                warn!("{e}; only plain \"genus species\" requests will work");
                None
            }
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    match &cli.command {
        Commands::Lookup {
            genus,
            species,
            json,
        } => {
            // validate before touching the network
            let query = SpeciesQuery::new(genus, species)?;
            let lookup = cli.powo()?.lookup(&query).await?;

            if *json {
                Output::raw(&lookup);
            } else {
                Output::pretty(&lookup);
            }
            Ok(())
        }

        Commands::Ask { request } => {
            let agent = Agent::new(cli.powo()?, cli.ai());
            let messages = agent.run(&request.join(" "), None).await;
            Output::messages(&messages);
            Ok(())
        }

        Commands::Chat => chat(Agent::new(cli.powo()?, cli.ai())).await,

        Commands::Serve {
            port,
            host,
            public_url,
        } => {
            let agent = Agent::new(cli.powo()?, cli.ai());
            Ok(Server::run(agent, host, *port, public_url.clone()).await?)
        }
    }
}

async fn chat(agent: Agent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(b"\nEnter plant name (or type 'exit' to quit): ")
            .await
            .into_diagnostic()?;
        stdout.flush().await.into_diagnostic()?;

        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            break;
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            println!("Thank you!");
            break;
        }

        let messages = agent.run(line, None).await;
        Output::messages(&messages);
    }

    Ok(())
}
