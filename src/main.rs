use log::info;

use vyfun::{AppConfig, EngineConfig, Error, Result, VyFunApp};

mod app_config;
mod commands;

use app_config::{resolve_data_dir, Cli, Commands};
use commands::commands as cmd;

#[tokio::main]
async fn main() -> Result<()> {
    use clap::Parser;

    // Set up global panic handler so a crashed session leaves a trace
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("🚨 CRITICAL: Application panic detected!");
        eprintln!(
            "Location: {}",
            panic_info
                .location()
                .map_or("unknown".to_string(), |l| l.to_string())
        );
        eprintln!(
            "Message: {}",
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .unwrap_or(&"Unknown panic")
        );

        // Log to file if possible
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("vyfun_panic.log")
        {
            use std::io::Write;
            let _ = writeln!(
                file,
                "[{}] PANIC: {} at {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs(),
                panic_info
                    .payload()
                    .downcast_ref::<&str>()
                    .unwrap_or(&"Unknown panic"),
                panic_info
                    .location()
                    .map_or("unknown".to_string(), |l| l.to_string())
            );
        }

        std::process::exit(1);
    }));

    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    println!("🎡 VyFun - Color Prediction Betting Engine");
    println!("⚡ Periodic 0-9 draws with fixed multiplier payouts");
    println!();

    // Resolve data directory path
    let data_dir = resolve_data_dir(&cli.data_dir).map_err(Error::Config)?;

    let config = AppConfig {
        data_dir,
        nickname: cli.nickname,
        engine: EngineConfig::from_env(),
    };

    match cli.command {
        Commands::Start => {
            info!("Starting VyFun engine...");
            let mut app = VyFunApp::new(config).await?;
            cmd::start_command(&mut app).await?;
        }

        Commands::Bet { selection, amount } => {
            let mut app = VyFunApp::new(config).await?;
            cmd::bet_command(&mut app, &selection, amount).await?;
        }

        Commands::Balance => {
            cmd::balance_command(&VyFunApp::new(config).await?).await?;
        }

        Commands::Stats => {
            cmd::stats_command(&VyFunApp::new(config).await?).await?;
        }

        Commands::Simulate {
            rounds,
            players,
            seed,
        } => {
            cmd::simulate_command(rounds, players, seed).await?;
        }
    }

    Ok(())
}
