use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use dl_avatars::{
    cli::{Cli, Commands},
    config::Settings,
    discord::{DiscordClient, GuildDirectory},
    download::HttpFetcher,
    error::{AvatarDlError, ConfigError, DiscordError},
    orchestrator::Harvester,
    progress,
};

type Result<T> = std::result::Result<T, AvatarDlError>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_and_validate();

    // Initialize logging
    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let result = match &cli.command {
        Some(command) => handle_command(command, &cli).await,
        None => handle_harvest(&cli).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Initialize logging based on CLI arguments
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_new(cli.get_log_level()).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if cli.quiet {
        subscriber.without_time().init();
    } else if let Some(log_file) = &cli.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        subscriber.with_ansi(false).with_writer(file).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Load, override and validate settings; nothing touches the network before this passes
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match Settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(AvatarDlError::Config(ConfigError::NotFound(path))) => {
            Settings::create_sample(&path)?;
            println!("📝 Created a sample settings file at: {}", path.display());
            println!("⚙️  Fill in your bot token and server IDs, then run again.");
            return Err(ConfigError::NotFound(path).into());
        }
        Err(e) => return Err(e),
    };

    settings.apply_overrides(cli.get_settings_overrides());
    settings.validate()?;
    tracing::debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

/// Build the API client and check the token against Discord
async fn connect(settings: &Settings, quiet: bool) -> Result<DiscordClient> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        progress::create_spinner("Connecting to Discord...")
    };

    let result = async {
        let client = DiscordClient::new(&settings.token, settings.timeout())?;
        let me = client.current_user().await?;
        Ok::<_, DiscordError>((client, me))
    }
    .await;

    spinner.finish_and_clear();

    let (client, me) = result?;
    tracing::info!("Logged in as {}", me.username);
    Ok(client)
}

/// Handle subcommands
async fn handle_command(command: &Commands, cli: &Cli) -> Result<()> {
    match command {
        Commands::Test => {
            let settings = load_settings(cli)?;
            let client = connect(&settings, cli.quiet).await?;

            for server_id in &settings.server_ids {
                match client.guild(server_id).await {
                    Ok(guild) => println!("✓ {} → {}", server_id, guild.name),
                    Err(e) => println!("❌ {}: {}", server_id, e),
                }
            }
            Ok(())
        }

        Commands::Config => {
            println!("Settings file location:");
            println!("  {}", cli.settings.display());
            println!();

            if cli.settings.exists() {
                let mut settings = Settings::load(&cli.settings)?;
                settings.apply_overrides(cli.get_settings_overrides());
                if !settings.token.is_empty() {
                    settings.token = "<REDACTED>".to_string();
                }

                let json = serde_json::to_string_pretty(&settings).map_err(|e| {
                    ConfigError::ParseError(format!("Failed to serialize settings: {}", e))
                })?;
                println!("Effective settings:");
                println!("{}", "─".repeat(60));
                println!("{}", json);
                println!("{}", "─".repeat(60));
            } else {
                println!("Settings file does not exist yet.");
                println!("Run dl-avatars once to create a sample.");
            }
            Ok(())
        }

        Commands::Version { detailed } => {
            println!("dl-avatars {}", env!("CARGO_PKG_VERSION"));

            if *detailed {
                println!("Build information:");
                println!("  Package version: {}", env!("CARGO_PKG_VERSION"));
                println!("  API: {}", dl_avatars::discord::API_BASE);
                println!("  CDN: {}", dl_avatars::discord::CDN_BASE);
            }
            Ok(())
        }
    }
}

/// Harvest every configured server
async fn handle_harvest(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let base_dir = settings.ensure_base_dir()?;
    let client = connect(&settings, cli.quiet).await?;
    let fetcher = HttpFetcher::new(client.http().clone());

    Harvester::new(&client, &fetcher, &settings, base_dir)
        .show_progress(!cli.quiet)
        .run(&settings.server_ids)
        .await;

    Ok(())
}
