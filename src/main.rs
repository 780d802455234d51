use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use smartrecipe::classify::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use smartrecipe::config::AppConfig;
use smartrecipe::{build_service, init_tracing, present, server};

#[derive(Parser, Debug)]
#[command(
    name = "smartrecipe",
    about = "Answers grocery product and recipe questions over local catalogs"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Directory with hemkop_*.json, ica_*.csv and ica_*.json product files.
    #[arg(long, global = true, env = "SMARTRECIPE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Recipes CSV (Title, Ingredients, Instructions, Image_Name, Cleaned_Ingredients).
    #[arg(long, global = true, env = "SMARTRECIPE_RECIPES", default_value = "recipes.csv")]
    recipes: PathBuf,

    /// Optional JSON glossary extending the built-in English → Swedish terms.
    #[arg(long, global = true, env = "SMARTRECIPE_GLOSSARY")]
    glossary: Option<PathBuf>,

    /// Gemini API key; without one queries are routed by rules only.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Classifier model identifier.
    #[arg(long, global = true, env = "SMARTRECIPE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Generative Language API.
    #[arg(long, global = true, env = "SMARTRECIPE_MODEL_BASE", default_value = DEFAULT_BASE_URL)]
    model_base_url: String,

    /// Seconds before a classification gives up.
    #[arg(long, global = true, env = "SMARTRECIPE_CLASSIFY_TIMEOUT_SECS", default_value_t = 20)]
    classify_timeout_secs: u64,

    /// Cached classifications kept in memory (0 disables caching).
    #[arg(long, global = true, env = "SMARTRECIPE_CACHE_SIZE", default_value_t = 256)]
    cache_size: usize,

    /// Seconds a cached classification stays valid.
    #[arg(long, global = true, env = "SMARTRECIPE_CACHE_TTL_SECS", default_value_t = 600)]
    cache_ttl_secs: u64,
}

impl ConfigArgs {
    fn into_config(self) -> AppConfig {
        AppConfig {
            data_dir: self.data_dir,
            recipes_path: self.recipes,
            glossary_path: self.glossary,
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            model: self.model,
            base_url: self.model_base_url,
            classify_timeout: Duration::from_secs(self.classify_timeout_secs.max(1)),
            cache_capacity: self.cache_size,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Address to bind the HTTP server to (host:port).
        #[arg(long, env = "SMARTRECIPE_BIND", default_value = "127.0.0.1:8000")]
        bind: String,
    },
    /// Answer a single question and print it.
    Ask {
        /// The question, e.g. "How much protein is in kebab?"
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let service = build_service(&cli.config.into_config());

    match cli.command {
        Command::Serve { bind } => {
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address {bind}"))?;
            server::serve(addr, Arc::new(service)).await?;
        }
        Command::Ask { query } => {
            let response = service.ask(&query).await;
            println!("{}", present::decorate(response.intent, &response.answer));
        }
    }
    Ok(())
}
