//! Lumen CLI - developer harness for the lumen auth core.
//!
//! Drives a real [`lumen_auth::AuthClient`] from the terminal so the
//! bootstrap, operation, and deep-link paths can be exercised outside the
//! app shells.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use lumen_core::{Config, Paths, PlatformKind};

/// Lumen CLI - exercise the client auth core from the terminal.
#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Lumen auth developer harness")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Platform adapter to run under
    #[arg(long, value_enum, default_value = "ios", global = true)]
    platform: PlatformArg,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Web,
    Ios,
    Android,
}

impl From<PlatformArg> for PlatformKind {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Web => PlatformKind::Web,
            PlatformArg::Ios => PlatformKind::NativeIos,
            PlatformArg::Android => PlatformKind::NativeAndroid,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with email and password
    Signup,

    /// Sign in with email and password
    Login {
        /// Use Google instead of email/password
        #[arg(long)]
        google: bool,
    },

    /// Sign out and clear cached metadata
    Logout,

    /// Show the current session
    Status,

    /// Send a password-reset email
    ResetPassword,

    /// Update the signed-in user's password
    UpdatePassword,

    /// Feed a deep link or redirect URL through reconciliation
    Link {
        /// The URL to reconcile
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new()?;
    let config = Config::load(&paths)?;
    lumen_core::init_logging(&cli.log_level);

    let client = commands::build_client(&config, &paths, cli.platform.into());

    match cli.command {
        Commands::Signup => commands::signup(&client).await,
        Commands::Login { google: false } => commands::login(&client).await,
        Commands::Login { google: true } => commands::login_google(&client).await,
        Commands::Logout => commands::logout(&client).await,
        Commands::Status => commands::status(&client).await,
        Commands::ResetPassword => commands::reset_password(&client).await,
        Commands::UpdatePassword => commands::update_password(&client).await,
        Commands::Link { url } => commands::link(&client, &url).await,
    }
}
