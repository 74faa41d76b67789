//! # CLI Layer
//!
//! 1. **Argument Parsing**: clap, see `setup.rs`
//! 2. **Logging**: tracing-subscriber on stderr, filtered by `CONTENTKIT_LOG`
//! 3. **Context Setup**: locate and load `contentkit.toml`, build the manager
//! 4. **Dispatch**: one handler per subcommand
//! 5. **Output Formatting**: `print.rs`

use super::print;
use super::setup::{Cli, Commands};
use clap::Parser;
use contentkit::config::{self, ContentConfig, CONFIG_FILE};
use contentkit::error::Result;
use contentkit::manager::Manager;
use contentkit::model::RenderData;
use directories::ProjectDirs;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CONTENTKIT_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let manager = create_manager(&cli)?;

    match cli.command {
        Commands::Get { key, field } => handle_get(&manager, &key, field.as_deref()),
        Commands::List => handle_list(&manager),
        Commands::Render {
            key,
            field,
            vars,
            data,
        } => handle_render(&manager, &key, &field, vars, data.as_deref()),
        Commands::Set {
            key,
            field,
            value,
            no_validate,
        } => handle_set(&manager, &key, &field, value, !no_validate),
        Commands::Reset { key } => handle_reset(&manager, &key),
        Commands::Meta { key } => handle_meta(&manager, &key),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// `--config`, else `./contentkit.toml`, else the user config directory.
/// Falls back to the working directory path, which loads defaults.
fn config_path(cli: &Cli, cwd: &Path) -> PathBuf {
    if let Some(path) = &cli.config {
        return path.clone();
    }
    let local = cwd.join(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    ProjectDirs::from("com", "contentkit", "contentkit")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

fn create_manager(cli: &Cli) -> Result<Manager> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path = config_path(cli, &cwd);
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or(cwd);

    let config = ContentConfig::load(&path)?.resolve_paths(&base);
    config::build_manager(&config)
}

fn handle_get(manager: &Manager, key: &str, field: Option<&str>) -> Result<()> {
    let item = manager.get(key)?;
    match field {
        Some(field) => println!("{}", item.get(field)?),
        None => print::print_item(&item),
    }
    Ok(())
}

fn handle_list(manager: &Manager) -> Result<()> {
    let items = manager.get_all()?;
    print::print_list(&items);
    Ok(())
}

fn handle_render(
    manager: &Manager,
    key: &str,
    field: &str,
    vars: Vec<(String, String)>,
    json: Option<&str>,
) -> Result<()> {
    let mut data: RenderData = match json {
        Some(json) => serde_json::from_str(json)?,
        None => RenderData::new(),
    };
    data.extend(vars.into_iter().map(|(k, v)| (k, Value::String(v))));

    let item = manager.get(key)?;
    println!("{}", item.render(field, &data)?);
    Ok(())
}

fn handle_set(
    manager: &Manager,
    key: &str,
    field: &str,
    value: String,
    validate: bool,
) -> Result<()> {
    let mut item = manager.get(key)?;
    item.set(field, value)?;
    if !item.save(validate)? {
        print::print_validation_errors(key, item.errors());
        std::process::exit(1);
    }
    print::print_success(&format!("Saved override for {}", key));
    Ok(())
}

fn handle_reset(manager: &Manager, key: &str) -> Result<()> {
    manager.reset(key)?;
    print::print_success(&format!("Reset {} to source content", key));
    Ok(())
}

fn handle_meta(manager: &Manager, key: &str) -> Result<()> {
    let meta = manager.get_meta_data(key)?;
    print::print_fields(key, &meta);
    Ok(())
}
