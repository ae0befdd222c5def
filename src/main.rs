use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use predictify::{cli, config, error, logging};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP proxy
    Serve(ServeOptions),

    /// Authorize with Spotify and store the session
    Login,

    /// Remove the stored session
    Logout,

    /// Show recent and top tracks with their audio features
    Dashboard(LimitOptions),

    /// Recommend tracks based on your top tracks
    Recommend,

    /// Search the song catalog
    Search(SearchOptions),

    /// Songs similar to a catalog track
    Similar(TrackOptions),

    /// Show a single catalog song
    Song(SongOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to bind, overrides SERVER_ADDRESS
    #[clap(long)]
    addr: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct LimitOptions {
    /// Maximum number of items per list
    #[clap(long)]
    limit: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Free-text query
    query: String,
    #[clap(long)]
    limit: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Catalog track id
    track_id: String,
    #[clap(long)]
    limit: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct SongOptions {
    /// Catalog track id
    track_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Command::Completions(opt) = &args.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    match &args.command {
        Command::Serve(_) | Command::Login => logging::init_logging(),
        _ => logging::init_cli_logging(),
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    match args.command {
        Command::Logout => cli::logout().await,
        Command::Search(opt) => {
            cli::search(&config::catalog_url_from_env(), &opt.query, opt.limit).await
        }
        Command::Similar(opt) => {
            cli::similar(&config::catalog_url_from_env(), &opt.track_id, opt.limit).await
        }
        Command::Song(opt) => cli::song(&config::catalog_url_from_env(), &opt.track_id).await,
        Command::Serve(opt) => cli::serve(full_config(), opt.addr).await,
        Command::Login => cli::login(&full_config()).await,
        Command::Dashboard(opt) => cli::dashboard(&full_config(), opt.limit).await,
        Command::Recommend => cli::recommend(&full_config()).await,
        Command::Completions(_) => {}
    }
}

/// Configuration for the commands that talk to Spotify.
fn full_config() -> config::Config {
    match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    }
}
