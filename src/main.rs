#[macro_use] extern crate prettytable;

use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use std::path::PathBuf;
use structopt::StructOpt;

mod cli;
mod config;
mod draft;
mod error;
mod interface;
mod logging;
mod model;
mod parameterize;
mod payload;
mod slugid;
mod submit;
mod template;

use cli::{Command::*, CommandLineArgs};
use config::Config;

fn find_default_store_file() -> anyhow::Result<PathBuf> {
    let base_dirs = ProjectDirs::from("org", "taskdraft", "taskdraft")
        .ok_or(anyhow!("Failed to find a data directory, use --db."))?;
    let root_dir = base_dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir)
            .with_context(|| format!("Failed to create directory {}.", root_dir.display()))?;
    }
    let mut path = PathBuf::from(root_dir);
    path.push("taskdraft.sqlite");
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        action,
        db,
        root_url,
        endpoint,
        verbose,
    } = CommandLineArgs::from_args();

    let mut config = Config::from_env()?;
    if let Some(root_url) = root_url {
        config.set_root_url(&root_url);
    }
    if let Some(endpoint) = endpoint {
        config.endpoint = Some(endpoint);
    }
    logging::init_logging(&config.log_level, verbose)?;

    // Unpack the store file.
    let store_file = match db {
        Some(path) => path,
        None => find_default_store_file()?,
    };
    tracing::debug!(store = %store_file.display(), "opening store");
    let (database, store_error) = model::open_store_or_memory(&store_file)
        .with_context(|| format!("Failed to open store {}.", store_file.display()))?;

    // The draft works without a store, recent definitions do not.
    if let (Some(err), Recent | Use { .. }) = (store_error, &action) {
        return Err(anyhow::Error::new(err).context(format!("Failed to open store {}.", store_file.display())));
    }

    // Perform the action.
    match action {
        Show => interface::show(&database, &config),
        Reset { schema } => interface::reset(&database, &config, schema),
        Refresh => interface::refresh(&database, &config),
        Edit { file } => interface::edit(&database, &file),
        Recent => interface::recent(&database, &config),
        Use { position } => interface::use_recent(&database, &config, position),
        Lint { schema } => interface::lint(&database, &config, schema),
        Submit { interactive } => interface::submit(&database, &config, interactive),
        Schemas => interface::schemas(&config),
    }?;
    Ok(())
}
