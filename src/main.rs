//! SkyFav command line front end.
//!
//! Each command drives the same controllers a UI would: it issues an
//! operation, then polls until every controller is idle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use skyfav_client::{AddOrigin, AppController, AppServices, GateDecision, ToggleAction};
use skyfav_core::Config;
use skyfav_services::Credentials;
use skyfav_weather::WeatherSnapshot;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const WAIT_LIMIT: Duration = Duration::from_secs(120);

#[derive(Parser)]
#[command(name = "skyfav")]
#[command(author, version, about = "Weather and favorite cities", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to <config dir>/skyfav/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log in with this account before running the command
    #[arg(long, env = "SKYFAV_USERNAME", global = true)]
    username: Option<String>,

    #[arg(long, env = "SKYFAV_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the weather for a city, or for the configured position
    Weather {
        #[arg(long)]
        city: Option<String>,
    },

    /// Look up a city by name
    Search { name: String },

    /// Manage favorite cities
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },

    /// Toggle the star on a city's weather
    Star {
        #[arg(long)]
        city: Option<String>,
    },

    Login,

    Register,

    Logout,

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum FavoritesCommand {
    List,
    Add { name: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Validate,
}

const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    skyfav_core::init(log_filter_from_verbosity(cli.verbose))?;

    if let Commands::Config { action } = &cli.command {
        return run_config(cli.config.as_deref(), action);
    }

    let (config, _) = Config::load_validated(cli.config.as_deref())?;
    tracing::debug!(base_url = %config.backend.base_url, "Configuration loaded");
    let credentials = match (cli.username, cli.password) {
        (Some(username), Some(password)) => Some(Credentials::new(username, password)),
        (None, None) => None,
        _ => bail!("--username and --password must be given together"),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let services = AppServices::from_config(&config, runtime.handle().clone())?;
    let mut app = AppController::new(Arc::new(services));

    app.start();
    wait_idle(&mut app)?;

    match cli.command {
        Commands::Login => {
            let credentials = credentials.context("login needs --username and --password")?;
            app.login(credentials);
            wait_idle(&mut app)?;
            session_or_bail(&app)?;
            println!("Logged in");
        }
        Commands::Register => {
            let credentials = credentials.context("register needs --username and --password")?;
            app.register(credentials);
            wait_idle(&mut app)?;
            session_or_bail(&app)?;
            println!("Account created");
        }
        Commands::Logout => {
            ensure_session(&mut app, credentials)?;
            app.logout();
            wait_idle(&mut app)?;
            println!("Logged out");
        }
        Commands::Weather { city } => {
            ensure_session(&mut app, credentials)?;
            open_weather(&mut app, city.as_deref())?;
            print_weather(&app)?;
        }
        Commands::Search { name } => {
            ensure_session(&mut app, credentials)?;
            app.weather_mut()
                .submit_manual_search(&name)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            wait_idle(&mut app)?;
            print_weather(&app)?;
        }
        Commands::Star { city } => {
            ensure_session(&mut app, credentials)?;
            open_weather(&mut app, city.as_deref())?;
            print_weather(&app)?;
            match app.toggle_favorite() {
                ToggleAction::Adding | ToggleAction::Removing => {}
                ToggleAction::Busy => bail!("A change to this city is already in progress"),
                ToggleAction::NoCity => bail!("No city to star"),
            }
            wait_idle(&mut app)?;
            favorites_outcome(&app)?;
            println!("{}", star(app.is_favorite()));
        }
        Commands::Favorites { action } => {
            ensure_session(&mut app, credentials)?;
            run_favorites(&mut app, action)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(path: Option<&std::path::Path>, action: &ConfigCommand) -> Result<()> {
    let config = match path {
        Some(p) => Config::load_from(p)?,
        None => Config::load()?,
    };

    match action {
        ConfigCommand::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommand::Validate => {
            let result = config.validate();
            for warning in &result.warnings {
                println!("warning: {}", warning);
            }
            for error in &result.errors {
                println!("error: {}", error);
            }
            if !result.is_valid() {
                bail!("Configuration is invalid");
            }
            println!("Configuration is valid");
        }
    }
    Ok(())
}

fn run_favorites(app: &mut AppController, action: FavoritesCommand) -> Result<()> {
    match action {
        FavoritesCommand::List => {
            favorites_outcome(app)?;
        }
        FavoritesCommand::Add { name } => {
            app.favorites_mut()
                .add(&name, AddOrigin::Form)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            wait_idle(app)?;
            favorites_outcome(app)?;
        }
        FavoritesCommand::Rename { id, name } => {
            let favorites = app.favorites_mut();
            if !favorites.start_edit(&id) {
                bail!("No favorite with id {}", id);
            }
            favorites.set_edit_value(name);
            favorites
                .commit_edit()
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            wait_idle(app)?;
            favorites_outcome(app)?;
        }
        FavoritesCommand::Delete { id } => {
            if !app.favorites().list().iter().any(|f| f.id == id) {
                bail!("No favorite with id {}", id);
            }
            app.favorites_mut().delete(&id);
            wait_idle(app)?;
            favorites_outcome(app)?;
        }
    }

    let favorites = app.favorites();
    if let Some(empty) = favorites.empty_message() {
        println!("{}", empty);
    }
    for favorite in favorites.list() {
        println!("{}  {}", favorite.id, favorite.city);
    }
    Ok(())
}

/// Poll until no request is outstanding.
fn wait_idle(app: &mut AppController) -> Result<()> {
    let started = Instant::now();
    loop {
        app.poll();
        if !app.is_busy() {
            return Ok(());
        }
        if started.elapsed() > WAIT_LIMIT {
            bail!("Timed out waiting for the backend");
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Log in with `credentials` unless the probe already found a session.
fn ensure_session(app: &mut AppController, credentials: Option<Credentials>) -> Result<()> {
    if app.session().is_authenticated() {
        return Ok(());
    }
    let Some(credentials) = credentials else {
        bail!("Not logged in; pass --username and --password");
    };
    app.login(credentials);
    wait_idle(app)?;
    session_or_bail(app)
}

fn session_or_bail(app: &AppController) -> Result<()> {
    if app.session().is_authenticated() {
        return Ok(());
    }
    match app.session().error_message() {
        Some(message) => bail!(message),
        None => bail!("Not logged in"),
    }
}

fn open_weather(app: &mut AppController, city: Option<&str>) -> Result<()> {
    match app.open_weather(city) {
        GateDecision::Allow => wait_idle(app),
        GateDecision::Loading | GateDecision::RedirectToLogin => bail!("Not logged in"),
    }
}

fn favorites_outcome(app: &AppController) -> Result<()> {
    let favorites = app.favorites();
    if let Some(message) = favorites.error_message() {
        bail!(message);
    }
    if let Some(notice) = favorites.notice() {
        println!("{}", notice.message);
    }
    Ok(())
}

fn star(is_favorite: bool) -> &'static str {
    if is_favorite {
        "★"
    } else {
        "☆"
    }
}

fn print_weather(app: &AppController) -> Result<()> {
    let weather = app.weather();
    let Some(snapshot) = weather.snapshot() else {
        let message = weather
            .error_message()
            .unwrap_or_else(|| "No weather available".to_string());
        if weather.offers_manual_search() {
            bail!("{}\nTry: skyfav search <city>", message);
        }
        bail!(message);
    };
    if let Some(message) = weather.error_message() {
        eprintln!("{}", message);
    }
    print_snapshot(snapshot, app.is_favorite());
    Ok(())
}

fn print_snapshot(snapshot: &WeatherSnapshot, is_favorite: bool) {
    println!("{} {}", snapshot.city_name, star(is_favorite));
    println!("{}", snapshot.display_date());
    println!(
        "{}°  ({}° / {}°)",
        snapshot.display_temperature(),
        snapshot.display_min(),
        snapshot.display_max()
    );
    if let Some(icon) = snapshot.icon_url() {
        println!("{}", icon);
    }
}
