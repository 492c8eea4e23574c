use clap::Parser;
use cli::{Args, Commands};
use fetch::fetch_manifest;
use logging::setup_logging;
use parse::parse_manifest;
use tracing::debug;
use utils::COLOR;
use webfeat_config::{config, ConfigError, CONFIG_PATH};
use webfeat_core::WebfeatResult;
use webfeat_utils::path::resolve_path;

mod cli;
mod fetch;
mod logging;
mod parse;
mod report;
mod utils;

/// Loads the configuration and layers the command line flags on top.
fn load_config(args: &Args) -> WebfeatResult<config::Config> {
    if let Some(ref c) = args.config {
        let path = resolve_path(c).map_err(ConfigError::from)?;
        debug!("Using configuration file {}", path.display());
        *CONFIG_PATH.write().unwrap() = path;
    }

    config::init()?;
    let mut config = config::get_config();

    if let Some(proxy) = &args.proxy {
        config.proxy = Some(proxy.clone());
    }
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = Some(timeout.clone());
    }

    Ok(config)
}

async fn handle_cli() -> WebfeatResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    let mut config = load_config(&args)?;

    match args.command {
        Commands::Fetch {
            output,
            repository,
            asset,
            report,
        } => {
            if repository.is_some() {
                config.repository = repository;
            }
            if asset.is_some() {
                config.asset_name = asset;
            }
            config.resolve()?;

            fetch_manifest(config, output, &report).await?;
        }
        Commands::Parse {
            file,
            gzip,
            report,
        } => parse_manifest(&file, gzip, &report)?,
        Commands::Config => {
            config.resolve()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli().await {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
