//! Binary entry point for the redify graph gateway.
#![forbid(unsafe_code)]

use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use redify::config::{GatewayConfig, Overrides};
use redify::server;

#[derive(Parser, Debug)]
#[command(
    name = "redify",
    version,
    about = "Declarative HTTP gateway for Neo4j property graphs",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "REDIFY_CONFIG",
        help = "Path to the TOML config file"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP gateway.
    Serve(ServeArgs),
    /// Resolve and print the effective configuration, then exit.
    CheckConfig(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "REDIFY_HOST", help = "HTTP bind address")]
    host: Option<IpAddr>,

    #[arg(long, env = "REDIFY_PORT", help = "HTTP port")]
    port: Option<u16>,

    #[arg(long, env = "REDIFY_BOLT_URI", help = "Bolt endpoint of the graph engine")]
    bolt_uri: Option<String>,

    #[arg(long, env = "REDIFY_BOLT_USER", help = "Graph engine username")]
    bolt_user: Option<String>,

    #[arg(
        long,
        env = "REDIFY_BOLT_PASSWORD",
        hide_env_values = true,
        help = "Graph engine password"
    )]
    bolt_password: Option<String>,

    #[arg(
        long = "allow-origin",
        help = "Allowed CORS origin (repeatable)",
        value_name = "ORIGIN"
    )]
    allow_origins: Vec<String>,
}

impl ServeArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host,
            port: self.port,
            bolt_uri: self.bolt_uri.clone(),
            bolt_user: self.bolt_user.clone(),
            bolt_password: self.bolt_password.clone(),
            allow_origins: self.allow_origins.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = GatewayConfig::load(cli.config)?;
    match cli.command {
        Command::Serve(args) => {
            let options = config.serve_options(&args.overrides())?;
            server::serve(options).await?;
        }
        Command::CheckConfig(args) => {
            let options = config.serve_options(&args.overrides())?;
            match config.path() {
                Some(path) => println!("config file: {}", path.display()),
                None => println!("config file: (none, defaults only)"),
            }
            println!("http bind:   {}:{}", options.host, options.port);
            println!("bolt uri:    {}", options.bolt_uri);
            println!("bolt user:   {}", options.bolt_user);
            println!("cors:        {:?}", options.allow_origins);
        }
    }
    Ok(())
}
