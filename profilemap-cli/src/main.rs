mod config;
mod form;
mod render;

use crate::config::Config;
use crate::form::{Form, ProfileFields, TerminalPrompt};
use crate::render::TerminalMap;
use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use profilemap_lib::{
    MapDisplay, MapOverlay, OverlayState, ProfileStore, SledStorage, ValidationPolicy,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{event, Level};

#[derive(Parser)]
#[command(name = "profilemap")]
#[command(about = "Browse and manage a directory of profiles", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "KEY")]
    storage_key: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List profiles, optionally filtered by name and location")]
    List {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        location: Option<String>,
    },
    #[command(about = "List the distinct locations in the directory")]
    Locations,
    #[command(about = "Show everything about one profile")]
    Show { id: String },
    #[command(about = "Show where a profile is on the map")]
    Map {
        id: String,

        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
    },
    #[command(about = "Create a new profile")]
    Create {
        #[command(flatten)]
        fields: ProfileFields,

        /// Never prompt for missing fields
        #[arg(long)]
        no_input: bool,
    },
    #[command(about = "Manage profiles")]
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    #[command(about = "Add a profile with every field filled in")]
    Add {
        #[command(flatten)]
        fields: ProfileFields,

        #[arg(long)]
        no_input: bool,
    },
    #[command(about = "Edit a profile, keeping fields that are not given")]
    Edit {
        id: String,

        #[command(flatten)]
        fields: ProfileFields,

        #[arg(long)]
        no_input: bool,
    },
    #[command(about = "Delete a profile")]
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let collector = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(collector)?;

    let map_delay_ms = match &cli.command {
        Commands::Map { delay_ms, .. } => *delay_ms,
        _ => None,
    };
    let config = Config::resolve(cli.data_dir, cli.storage_key, map_delay_ms)?;

    // Open the store over its on-disk storage
    if let Some(parent) = config.data_dir.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = SledStorage::open(&config.data_dir)?;
    let mut store = ProfileStore::open_with_key(storage, config.storage_key.as_str());
    event!(Level::DEBUG, path = ?config.data_dir, profiles = store.len(), "Store ready");

    let interactive = io::stdin().is_terminal();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::List { search, location } => {
            let profiles = store.query(search.as_deref().unwrap_or_default(), location.as_deref());
            render::cards(&mut stdout, &profiles)?;
        }
        Commands::Locations => {
            render::locations(&mut stdout, &store.locations())?;
        }
        Commands::Show { id } => {
            let profile = store
                .get(&id)
                .ok_or_else(|| anyhow!("Profile not found: {id}"))?;
            render::details(&mut stdout, profile)?;
        }
        Commands::Map { id, .. } => {
            let profile = store
                .get(&id)
                .ok_or_else(|| anyhow!("Profile not found: {id}"))?;

            let mut overlay = MapOverlay::new(config.map_delay);
            overlay.show(profile, Instant::now());
            eprintln!("Loading map...");

            // Wait out the reveal delay; Ctrl+C closes the overlay instead.
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(async {
                while let Some(wait) = overlay.remaining(Instant::now()) {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {
                            overlay.poll(Instant::now());
                        }
                        _ = tokio::signal::ctrl_c() => {
                            overlay.close();
                        }
                    }
                }
            });

            match overlay.state() {
                OverlayState::Ready(target) => TerminalMap::new(&mut stdout).display(target)?,
                _ => eprintln!("Map closed."),
            }
            overlay.close();
        }
        Commands::Create { fields, no_input } => {
            let mut form = Form::new(
                ValidationPolicy::Standard,
                TerminalPrompt::boxed(interactive && !no_input),
            );
            form.apply(fields);
            form.complete()?;
            let profile = form.submit(|input, policy| store.create(input, policy))?;
            println!("Created profile {}", profile.id);
        }
        Commands::Admin { action } => match action {
            AdminAction::Add { fields, no_input } => {
                let mut form = Form::new(
                    ValidationPolicy::Strict,
                    TerminalPrompt::boxed(interactive && !no_input),
                );
                form.apply(fields);
                form.complete()?;
                let profile = form.submit(|input, policy| store.create(input, policy))?;
                println!("Created profile {}", profile.id);
            }
            AdminAction::Edit {
                id,
                fields,
                no_input,
            } => {
                let existing = store
                    .get(&id)
                    .ok_or_else(|| anyhow!("Profile not found: {id}"))?;
                let mut form = Form::editing(
                    existing,
                    ValidationPolicy::Strict,
                    TerminalPrompt::boxed(interactive && !no_input),
                );
                form.apply(fields);
                form.complete()?;
                let profile = form.submit(|input, policy| store.update(&id, input, policy))?;
                println!("Updated profile {}", profile.id);
            }
            AdminAction::Delete { id, yes } => {
                if store.get(&id).is_none() {
                    bail!("Profile not found: {id}");
                }
                if !yes {
                    if !interactive {
                        bail!("Refusing to delete without confirmation, pass --yes");
                    }
                    let confirmed = Confirm::new()
                        .with_prompt("Are you sure you want to delete this profile?")
                        .default(false)
                        .interact()?;
                    if !confirmed {
                        return Ok(());
                    }
                }
                store.remove(&id)?;
                println!("Deleted profile {id}");
            }
        },
    }

    Ok(())
}
