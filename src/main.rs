//! puzzle-gate binary entry point.

use puzzle_gate::cli::{self, Args};
use puzzle_gate::config::Config;
use puzzle_gate::notify::Listener;
use puzzle_gate::{logging, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if args.help {
        cli::print_help();
        return;
    }
    if args.version {
        cli::print_version();
        return;
    }

    if let Err(e) = run(args).await {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> puzzle_gate::Result<()> {
    // A missing .env file is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    let config = Config::load(&args)?;
    logging::init(config.log_filter());

    info!("puzzle-gate v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.to_gate_settings()?;
    let server_config = config.to_server_config()?;

    if let Some(addr) = config.listener_address()? {
        let listener = Listener::bind(&addr).await?;
        tokio::spawn(listener.run());
    } else {
        info!("TCP listener disabled");
    }

    let notifier = config.notifier();
    info!("notifications go to {}", notifier.target());

    let state = AppState::new(settings, notifier);
    puzzle_gate::web::serve(server_config, state).await
}
