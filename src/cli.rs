//! Command-line interface for puzzle-gate.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Unset options leave the value from the environment or config file alone.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address for the web server.
    pub host: Option<IpAddr>,
    /// Port for the web server.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Destination port for puzzle notifications.
    pub notify_port: Option<u16>,
    /// Port for the diagnostic TCP listener.
    pub listener_port: Option<u16>,
    /// Do not start the diagnostic TCP listener.
    pub no_listener: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                result.port = Some(parse_port(&mut parser, "port")?);
            }
            Long("notify-port") => {
                result.notify_port = Some(parse_port(&mut parser, "notify-port")?);
            }
            Long("listener-port") => {
                result.listener_port = Some(parse_port(&mut parser, "listener-port")?);
            }
            Long("no-listener") => {
                result.no_listener = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_port(parser: &mut lexopt::Parser, name: &'static str) -> Result<u16, ArgsError> {
    use lexopt::ValueExt;

    let value: String = parser.value()?.parse()?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue(name, value))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"puzzle-gate {version}
Session-gated puzzle flow with a TCP side-channel notifier and listener

USAGE:
    puzzle-gate [OPTIONS]

OPTIONS:
    -H, --host <ADDR>         Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>         Web server port [default: 3000]
    -c, --config <FILE>       Path to configuration file (JSON)
    -l, --log-level <LVL>     Log level (error, warn, info, debug, trace)
        --notify-port <PORT>  Destination port for notifications [default: 5000]
        --listener-port <PORT>
                              Port for the TCP listener [default: 5000]
        --no-listener         Do not start the TCP listener
    -h, --help                Print help
    -V, --version             Print version

ENVIRONMENT VARIABLES (a .env file in the working directory is loaded first):
    VALID_ID                Login identifier (required)
    VALID_PW                Login password (required)
    CORRECT_ANSWER          Puzzle answer (required)
    SESSION_SECRET          Key for signing session cookies [default: random]
    PORT                    Web server port
    GATE_HOST               Web server host address
    NOTIFY_HOST             Destination host for notifications
    NOTIFY_PORT             Destination port for notifications
    NOTIFY_MESSAGE          Text sent when the puzzle page is reached
    LISTENER_PORT           Port for the TCP listener
    VIEWS_DIR               Directory with part1.html, problem.html, success.html
    PUBLIC_DIR              Directory served under /static
    DOWNLOAD_FILE           File served by /download
    GATE_LOG_LEVEL          Log level
    RUST_LOG                Full tracing filter (overrides everything else)

EXAMPLES:
    # Start with credentials from the environment
    VALID_ID=alice VALID_PW=secret CORRECT_ANSWER=0700 puzzle-gate

    # Public interface on port 8080, no listener
    puzzle-gate -H 0.0.0.0 -p 8080 --no-listener
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("puzzle-gate {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
