use clap::Parser;
use std::time::Duration;

use agent_console::cli::{Cli, Commands};
use agent_console::clients::ClientManager;
use agent_console::dashboard::server::DashboardServer;
use agent_console::db;
use agent_console::error::{ConsoleError, Result};
use agent_console::logging::{ApplicationMode, LoggingConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut log_config = match cli.command {
        Commands::Serve { .. } if !cli.quiet && cli.verbose == 0 && !cli.json => {
            LoggingConfig::for_mode(ApplicationMode::Server)
        },
        _ => LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json),
    };
    log_config.file_output = cli.log_file.clone();

    if let Err(e) = agent_console::logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        let error_response = e.to_error_response();
        eprintln!("{}", serde_json::to_string_pretty(&error_response).unwrap());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match cli.command.clone() {
        Commands::Serve {
            host,
            port,
            db,
            public_url,
            command_timeout,
        } => {
            let server = DashboardServer::new(
                host,
                port,
                db,
                public_url,
                Duration::from_secs(command_timeout),
            );

            server
                .run()
                .await
                .map_err(|e| ConsoleError::Server(format!("{:#}", e)))?;
        },

        Commands::Clients { db: db_path } => {
            let pool = db::create_pool(&db_path).await?;
            db::run_migrations(&pool).await?;

            let clients = ClientManager::new(&pool).list_clients().await?;
            println!("{}", serde_json::to_string_pretty(&clients)?);
        },
    }

    Ok(())
}
