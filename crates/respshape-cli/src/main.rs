//! respshape CLI
//!
//! Provisions the Apigee response-shaping demo assets into an organization, or
//! deletes them again with `--reset`.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{debug, error};

use respshape::{ConnectionProfile, Outcome, RawOptions, UsageError};
use respshape_client::EdgeConnector;

mod display;

#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Environment to provision into (e.g. test, prod)
    #[arg(short = 'e', long = "env")]
    environment: Option<String>,

    /// Delete the demo assets instead of creating them
    #[arg(short = 'R', long)]
    reset: bool,

    /// Name of the key-value map receiving the upstream credentials
    #[arg(long = "secretsmap", value_name = "NAME")]
    secrets_map: Option<String>,

    /// Client id for the Amadeus test APIs (or set amadeus_client_id)
    #[arg(long, value_name = "ID")]
    amadeus_client_id: Option<String>,

    /// Client secret for the Amadeus test APIs (or set amadeus_client_secret)
    #[arg(long, value_name = "SECRET")]
    amadeus_client_secret: Option<String>,

    /// Apigee organization
    #[arg(short = 'o', long = "org")]
    organization: Option<String>,

    /// Management API username
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Management API password (or set APIGEE_PASSWORD)
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Management API bearer token (or set APIGEE_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Management server base URL [default: https://api.enterprise.apigee.com]
    #[arg(short = 'M', long = "mgmtserver", value_name = "URL")]
    mgmt_server: Option<String>,

    /// Connection profile (defaults to ~/.config/respshape/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the apiproxy bundle [default: ./bundle]
    #[arg(long = "bundle", value_name = "DIR")]
    bundle_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short = 'v', long)]
    verbose: bool,
}

// Secrets are printed through RawOptions' redacting Debug
impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("options", &self.clone().into_raw())
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Args {
    fn into_raw(self) -> RawOptions {
        RawOptions {
            environment: self.environment,
            reset: self.reset,
            secrets_map: self.secrets_map,
            client_id: self.amadeus_client_id,
            client_secret: self.amadeus_client_secret,
            organization: self.organization,
            username: self.username,
            password: self.password,
            token: self.token,
            mgmt_server: self.mgmt_server,
            bundle_dir: self.bundle_dir,
        }
    }
}

/// Initializes structured logging with tracing.
///
/// `RESPSHAPE_LOG_FORMAT=json` switches to JSON output; anything else gives
/// human-readable lines. `RUST_LOG` overrides the level, `--verbose` raises
/// the default to debug. Records from the `log` facade are captured too.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("RESPSHAPE_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("respshape={default_level}")));

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(io::stderr)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }
}

/// Routes panics through tracing before the default hook prints them.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("unhandled panic: {info}");
        default_hook(info);
    }));
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    install_panic_hook();
    display::banner();

    let profile = match ConnectionProfile::load(args.config.as_deref()) {
        Ok(profile) => profile,
        Err(e) => {
            error!("Failed to load connection profile: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = respshape::launch(
        args.into_raw(),
        &profile,
        &|key: &str| std::env::var(key).ok(),
        &EdgeConnector,
        &mut io::stdout(),
    )
    .await;

    match result {
        Ok(Outcome::Provisioned(_)) => ExitCode::SUCCESS,
        Ok(Outcome::Reset(report)) => {
            for step in &report.steps {
                debug!(step = %step.step, ok = step.succeeded(), "reset step");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(usage) = e.downcast_ref::<UsageError>() {
                display::usage_error(usage);
                eprintln!("{}", Args::command().render_help());
            } else {
                error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
