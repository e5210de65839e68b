//! footctl - config-driven MIDI foot controller engine
//!
//! Runs the input resolution engine against simulated hardware (REPL),
//! with config hot-reload. `--check` validates a config and prints the
//! resolved control mapping.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use footctl::cli::Repl;
use footctl::config::watcher::ConfigWatcher;
use footctl::engine::resolver;
use footctl::{AppConfig, Engine};

/// Footctl - input resolution engine for MIDI foot controllers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Validate the config and print the resolved mapping, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    info!("Starting footctl");
    info!("Configuration file: {}", args.config);

    if args.check {
        let config = AppConfig::load(&args.config).await?;
        print_mapping(&config);
        return Ok(());
    }

    // Missing or broken files fall back to built-in defaults; hot reload
    // only runs when the file can actually be watched
    let config = AppConfig::load_or_default(&args.config).await;
    let watcher = match ConfigWatcher::watch(&args.config) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("{:#}; hot reload disabled", e);
            None
        }
    };

    let engine = Engine::new(config);
    let mut repl = Repl::new(engine, watcher);
    repl.run().await?;

    info!("footctl shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("footctl={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Dump the resolved outbound mapping for every control, keytime by keytime
fn print_mapping(config: &AppConfig) {
    println!("channel: {}", config.channel);
    for (index, button) in config.buttons.iter().enumerate() {
        let keytimes = button.keytimes();
        println!(
            "button {:>2} [{}] {} mode={:?} keytimes={}",
            index + 1,
            button.label_or(index),
            button.message_type,
            button.mode,
            keytimes,
        );
        for keytime in 1..=keytimes {
            let spec = resolver::resolve(button, keytime);
            println!("    keytime {}: {:?}", keytime, spec.action);
        }
    }
    if let Some(encoder) = &config.encoder {
        if encoder.enabled {
            match encoder.steps.filter(|s| *s > 1) {
                Some(steps) => println!(
                    "encoder [{}] cc {} ({} slots, outputs 0-{})",
                    encoder.label,
                    encoder.cc,
                    steps,
                    steps - 1
                ),
                None => println!(
                    "encoder [{}] cc {} (0-127, initial {})",
                    encoder.label, encoder.cc, encoder.initial
                ),
            }
            if encoder.push.enabled {
                println!(
                    "encoder push [{}] cc {} ({:?})",
                    encoder.push.label, encoder.push.cc, encoder.push.mode
                );
            }
        }
    }
    if let Some(expression) = &config.expression {
        for pedal in [&expression.exp1, &expression.exp2].into_iter().flatten() {
            if pedal.enabled {
                println!(
                    "expression [{}] cc {} range {}-{} threshold {} ({:?})",
                    pedal.label, pedal.cc, pedal.min, pedal.max, pedal.threshold, pedal.polarity
                );
            }
        }
    }
}
