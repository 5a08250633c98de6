//! hookwire - receive webhooks, translate them, deliver them elsewhere.
//!
//! ```text
//! hookwire --config /etc/hookwire/config.toml --port 8080 --log-level info
//! ```

use clap::Parser;
use hookwire::{GatewayError, app};
use hookwire_core::Application;
use hookwire_core::logging::{LogConfig, LogFormat, LogLevel, LogOutput};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Webhook translation gateway
#[derive(Parser, Debug)]
#[command(name = "hookwire")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Receive webhooks, render them through templates and deliver them elsewhere")]
struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "HOOKWIRE_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "HOOKWIRE_PORT", default_value_t = 8080)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOOKWIRE_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// trace, debug, info, warn or error
    #[arg(short, long, env = "HOOKWIRE_LOG_LEVEL", default_value = "warn")]
    log_level: LogLevel,

    /// json, plain, pretty or compact
    #[arg(long, env = "HOOKWIRE_LOG_FORMAT", default_value = "plain")]
    log_format: LogFormat,

    /// Append logs to this file instead of STDOUT
    #[arg(long, env = "HOOKWIRE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Filter directives such as "hookwire=debug,hyper=info"; replaces --log-level
    #[arg(long, env = "HOOKWIRE_LOG_FILTER")]
    log_filter: Option<String>,

    /// Colorize plain, pretty and compact output
    #[arg(long, env = "HOOKWIRE_LOG_COLOR")]
    log_color: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let output = match &cli.log_file {
        Some(path) => LogOutput::File(path.display().to_string()),
        None => LogOutput::Stdout,
    };

    let mut logging = LogConfig::new()
        .level(cli.log_level)
        .format(cli.log_format)
        .output(output)
        .with_colors(cli.log_color);
    if let Some(filter) = &cli.log_filter {
        logging = logging.with_env_filter(filter);
    }

    let _guard = match logging.init() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{}", GatewayError::Logging(err));
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "hookwire stopped");
            eprintln!("hookwire: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> hookwire::Result<()> {
    let router = app::load(&cli.config)?;
    let addr = SocketAddr::new(cli.bind, cli.port);
    Application::new(router).listen(addr).await?;
    Ok(())
}
