#[path = "trualias-cli/args.rs"]
mod args;
#[path = "trualias-cli/output.rs"]
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Cli, Commands, mode_from_str};
use clap::Parser;
use output::{print_diagnostics, print_resolved};
use trualias::service::hooks::{ExternalCommandHook, Hook, NoopHook};
use trualias::service::server::{Server, ServerConfig};
use trualias::service::watcher::ConfigWatcher;

const DEFAULT_BIND: &str = "127.0.0.1:3047";

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Check { config, json } => run_check(&config, json),
        Commands::Resolve {
            config,
            mode,
            input,
        } => run_resolve(&config, &mode, &input),
        Commands::Serve {
            config,
            bind,
            mode,
        } => run_serve(&config, bind.as_deref(), &mode),
    }
}

fn run_check(path: &str, json: bool) -> Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("read '{path}'"))?;
    match trualias::compile(&source) {
        Ok(config) => {
            println!(
                "OK: {} specification(s) compiled",
                config.specifications.len()
            );
            if !config.warnings.is_empty() {
                print_diagnostics(&config.warnings, json)?;
            }
            Ok(())
        }
        Err(diags) => {
            print_diagnostics(&diags, json)?;
            std::process::exit(2);
        }
    }
}

fn run_resolve(path: &str, mode: &str, input: &str) -> Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("read '{path}'"))?;
    let config = match trualias::compile(&source) {
        Ok(config) => config,
        Err(diags) => {
            print_diagnostics(&diags, false)?;
            std::process::exit(2);
        }
    };
    let mode = mode_from_str(mode)?;
    let resolved = trualias::resolve(&config, mode, input);
    print_resolved(&resolved)?;
    Ok(())
}

fn run_serve(path: &str, bind: Option<&str>, mode: &str) -> Result<()> {
    init_logging();
    let mode = mode_from_str(mode)?;
    let watcher = match ConfigWatcher::open(path) {
        Ok(watcher) => watcher,
        Err(diags) => {
            print_diagnostics(&diags, false)?;
            std::process::exit(2);
        }
    };

    let bind_addr = bind
        .map(str::to_string)
        .or_else(|| {
            let snapshot = watcher.snapshot();
            match (&snapshot.options.host, snapshot.options.port) {
                (Some(host), Some(port)) => Some(format!("{host}:{port}")),
                (Some(host), None) => Some(format!("{host}:3047")),
                (None, Some(port)) => Some(format!("127.0.0.1:{port}")),
                (None, None) => None,
            }
        })
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let hook: Arc<dyn Hook> = match &watcher.snapshot().options.preprocess_hook {
        Some(executable) => Arc::new(ExternalCommandHook::new(executable.clone())),
        None => Arc::new(NoopHook),
    };

    let server = Server::new(
        ServerConfig {
            bind_addr: bind_addr.clone(),
            mode,
        },
        Arc::new(watcher),
        hook,
    );

    eprintln!("trualias listening on {bind_addr}");
    if let Err(err) = server.run() {
        eprintln!("bind failed: {err}");
        std::process::exit(3);
    }
    Ok(())
}

#[cfg(feature = "with-tracing")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

#[cfg(not(feature = "with-tracing"))]
fn init_logging() {}
