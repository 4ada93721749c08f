//! `memoir-cli` – Memories in Motion from the terminal.
//!
//! This binary wires the flyover stack together:
//!
//! 1. Loads `~/.memoir/config.toml`, writing the defaults on first run.
//! 2. Loads the memory catalog (a TOML document or the built-in set).
//! 3. Applies the map style once to a console map surface.
//! 4. Spawns the flyover task and narrates its events.
//! 5. Selects the oldest year and drops the user into a REPL
//!    (`/years`, `/year <Y>`, `/pause`, `/resume`, `/open`, `/close`, `/status`).
//! 6. Intercepts **Ctrl-C** to stop the flyover and clear the map.

mod config;
mod console;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use memoir_catalog::Catalog;
use memoir_map::StyleSink;
use memoir_middleware::EventBus;
use memoir_runtime::{FlyoverHandle, FlyoverSequencer, SelectionController, init_tracing, spawn_flyover};
use memoir_types::FlyoverError;
use tracing::{info, warn};

use crate::config::Config;
use crate::console::ConsoleMap;

fn main() -> ExitCode {
    let _tracing = init_tracing("memoir");

    print_banner();

    let cfg = match config::load_or_init() {
        Ok((cfg, true)) => {
            println!(
                "  {} Default config written to {}",
                "✓".green().bold(),
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok((cfg, false)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            Config::default()
        }
    };

    let catalog = match load_catalog(&cfg) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            println!("{}: {}", "Catalog error".red(), e);
            return ExitCode::FAILURE;
        }
    };
    println!("  {} memories loaded", catalog.len().to_string().bold());

    if let Err(e) = ConsoleMap::new().apply_style(&cfg.style) {
        warn!(error = %e, "map style rejected; continuing with the engine default");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start the async runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let bus = EventBus::default();
    runtime.spawn(console::narrate(bus.subscribe()));

    let sequencer = FlyoverSequencer::new(
        Arc::clone(&catalog),
        Box::new(ConsoleMap::new()),
        Box::new(ConsoleMap::new()),
        cfg.flyover.clone(),
    )
    .with_bus(bus);
    let (flyover, task) = {
        let _enter = runtime.enter();
        spawn_flyover(sequencer)
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc(flyover.clone(), Arc::clone(&shutdown));

    let mut selection = SelectionController::new(catalog, flyover.clone());
    match selection.auto_select() {
        Ok(Some(year)) => info!(year, "initial year selected"),
        Ok(None) => println!("  {}", "The catalog is empty; nothing to fly through.".yellow()),
        Err(e) => println!("{}: {}", "Failed to start the flyover".red(), e),
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&mut selection, &flyover, shutdown);

    // Already stopped if Ctrl-C got there first.
    let _ = flyover.shutdown();
    if let Err(e) = runtime.block_on(task) {
        warn!(error = %e, "flyover task ended abnormally");
    }
    ExitCode::SUCCESS
}

fn load_catalog(cfg: &Config) -> Result<Catalog, FlyoverError> {
    match &cfg.catalog_path {
        Some(path) => Catalog::load(path),
        None => Ok(Catalog::builtin()),
    }
}

fn install_ctrlc(flyover: FlyoverHandle, shutdown: Arc<AtomicBool>) {
    let installed = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the flyover …".yellow().bold());
        if flyover.shutdown().is_ok() {
            println!("{}", "  ✓ Map cleared.".green());
        }
        shutdown.store(true, Ordering::SeqCst);
    });
    if let Err(e) = installed {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   __  ___                 _      "#.bold().cyan());
    println!("{}", r#"  /  |/  /__ __ _  ___  (_)___   "#.bold().cyan());
    println!("{}", r#" / /|_/ / -_)  ' \/ _ \/ / __/   "#.bold().cyan());
    println!("{}", r#"/_/  /_/\__/_/_/_/\___/_/_/      "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Memoir".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Memories in Motion");
    println!();
}
