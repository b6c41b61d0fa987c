// command line interface

use crate::core::{
    AiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, Groq, ResponseRouter, RuleSet,
    Session, classify, prompt,
};
use crate::output::{Output, Typewriter};
use crate::{Error, Server};
use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genguard", about = "Generator safety help for hurricane season")]
struct Cli {
    /// api key for the completion service
    #[arg(long, short = 'k', env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// model name
    #[arg(long, short, env = "GENGUARD_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// openai-compatible api base url
    #[arg(long, env = "GENGUARD_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// sampling temperature
    #[arg(long, default_value_t = 0.5, global = true)]
    temperature: f32,

    /// reply length cap in tokens
    #[arg(long, default_value_t = 1024, global = true)]
    max_tokens: u32,

    /// seconds to wait for the model before falling back
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), global = true)]
    timeout: u64,

    /// toml file replacing the built-in danger rules
    #[arg(long, env = "GENGUARD_RULES", global = true)]
    rules: Option<PathBuf>,

    /// file replacing the built-in system prompt
    #[arg(long, env = "GENGUARD_PROMPT", global = true)]
    prompt: Option<PathBuf>,

    /// more logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// interactive chat (default)
    Chat,

    /// ask a single question
    Ask {
        message: String,

        /// print the reply as json
        #[arg(long)]
        json: bool,
    },

    /// show which danger rule a message triggers, without calling the model
    Classify { message: String },

    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

impl Cli {
    fn rules(&self) -> Result<RuleSet, Error> {
        match &self.rules {
            Some(path) => RuleSet::load(path),
            None => Ok(RuleSet::default()),
        }
    }

    fn router(&self, rules: RuleSet) -> Result<ResponseRouter, Error> {
        let config = AiConfig {
            api_key: AiConfig::resolve_key(self.api_key.clone())?,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let system_prompt = prompt::load(self.prompt.as_deref())?;

        info!(model = %config.model, base_url = %config.base_url, "completion service configured");

        Ok(
            ResponseRouter::new(Arc::new(rules), Arc::new(Groq::new(config)), system_prompt)
                .with_timeout(Duration::from_secs(self.timeout)),
        )
    }
}

fn init_logging(verbose: u8) {
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rules = cli.rules()?;
    info!(rules = rules.len(), "danger rules loaded");

    match &cli.command {
        Some(Commands::Classify { message }) => {
            Output::classification(&classify(message, &rules));
            Ok(())
        }

        Some(Commands::Ask { message, json }) => {
            let router = cli.router(rules)?;
            let mut session = Session::new();

            if *json {
                let reply = router.route(&mut session.history, message).await;
                Output::raw(&reply);
            } else {
                let mut writer = Typewriter::new();
                let reply = router
                    .route_with(&mut session.history, message, |text| writer.update(text))
                    .await;
                writer.finish(&reply);
            }
            Ok(())
        }

        Some(Commands::Serve { port, host }) => {
            let router = cli.router(rules)?;
            Ok(Server::run(router, host, *port).await?)
        }

        Some(Commands::Chat) | None => chat(cli.router(rules)?).await,
    }
}

// the two screening questions decide how urgent the rest of the chat is
const GREETING: [&str; 3] = [
    "Generator safety assistant. /reset clears the chat, /quit leaves.",
    "Are you dealing with a power outage right now, or preparing before a hurricane?",
    "Is your generator currently running, or are you planning to use it soon?",
];

async fn chat(router: ResponseRouter) -> Result<()> {
    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    for line in GREETING {
        println!("{line}");
    }

    loop {
        print!("\n> ");
        std::io::stdout().flush().into_diagnostic()?;

        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                info!(id = %session.id, "chat reset");
                println!("chat cleared");
                continue;
            }
            _ => {}
        }

        let mut writer = Typewriter::new();
        let reply = router
            .route_with(&mut session.history, line, |text| writer.update(text))
            .await;
        writer.finish(&reply);
    }

    Ok(())
}
