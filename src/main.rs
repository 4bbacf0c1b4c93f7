use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use startpage::collection::CollectionType;
use startpage::config::Settings;
use startpage::index::{expand_query, SearchIndex};
use startpage::manager::{CardCollection, DeleteOutcome};
use startpage::render::{write_cards, MemoryMount, TextMount};
use startpage::session::{self, Session};
use startpage::state::Field;
use startpage::storage::FileStorage;
use startpage::transfer::default_export_filename;

#[derive(Parser)]
#[command(name = "startpage")]
#[command(about = "Manage the pinned sites and search engines of your start page", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the saved collections (overrides config.json)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Collection to operate on
    #[arg(short, long, value_enum, default_value = "sites", global = true)]
    collection: CollectionArg,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CollectionArg {
    Sites,
    Engines,
}

impl From<CollectionArg> for CollectionType {
    fn from(arg: CollectionArg) -> Self {
        match arg {
            CollectionArg::Sites => CollectionType::Sites,
            CollectionArg::Engines => CollectionType::Engines,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cards of the collection
    List,

    /// Append a new card
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Site URL, or search URL containing {query} for engines
        #[arg(short, long)]
        url: String,

        /// Emoji or image URL
        #[arg(short, long)]
        icon: Option<String>,
    },

    /// Change the name and/or url of a card
    Edit {
        /// 1-based card position
        position: usize,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        url: Option<String>,
    },

    /// Change the icon of a card
    Icon {
        /// 1-based card position
        position: usize,

        /// Emoji or image URL
        icon: String,
    },

    /// Delete a card
    Delete {
        /// 1-based card position
        position: usize,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Move a card so it sits immediately before another
    Move {
        /// Position of the card to move
        from: usize,

        /// Position of the card it should precede
        to: usize,
    },

    /// Import cards from a JSON export
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Export the collection as JSON
    Export {
        /// Output file (default: startpage-<collection>-<date>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Search names and urls across both collections
    Search {
        /// Text to look for
        query: String,
    },

    /// Interactive shell with live cards, drag and drop and timed delete confirmation
    Shell,
}

type Headless = CardCollection<FileStorage, MemoryMount>;

fn open_headless(data_dir: &Path, collection: CollectionType) -> Headless {
    CardCollection::new(
        collection.config(),
        FileStorage::new(data_dir),
        MemoryMount::new(),
    )
}

fn position_id(manager: &Headless, position: usize) -> Result<String> {
    manager
        .id_at(position)
        .with_context(|| {
            format!(
                "No card at position {} ({} cards)",
                position,
                manager.items().len()
            )
        })
}

fn print_cards(manager: &Headless, collection: CollectionType) -> Result<()> {
    let mut stdout = std::io::stdout();
    write_cards(&mut stdout, collection.name(), &manager.mount().cards)?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load();
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    let collection: CollectionType = cli.collection.into();
    let data_dir = settings.data_dir.clone();

    match cli.command {
        Commands::List => {
            let manager = open_headless(&data_dir, collection);
            print_cards(&manager, collection)?;
        }

        Commands::Add { name, url, icon } => {
            let mut manager = open_headless(&data_dir, collection);
            let id = manager.add_item();
            manager.update_field(&id, Field::Name, &name);
            manager.update_field(&id, Field::Url, &url);
            if let Some(icon) = icon {
                manager.edit_icon(&id, &icon);
            }
            if let Err(e) = manager.commit_edit(&id) {
                // Drop the placeholder again; nothing half-made stays behind.
                manager.request_delete(&id);
                manager.request_delete(&id);
                anyhow::bail!("Cannot add card: {}", e);
            }
            info!("✅ Added '{}'", name.trim());
            print_cards(&manager, collection)?;
        }

        Commands::Edit {
            position,
            name,
            url,
        } => {
            let mut manager = open_headless(&data_dir, collection);
            let id = position_id(&manager, position)?;
            manager.start_edit(&id);
            if let Some(name) = name {
                manager.update_field(&id, Field::Name, &name);
            }
            if let Some(url) = url {
                manager.update_field(&id, Field::Url, &url);
            }
            if let Err(e) = manager.commit_edit(&id) {
                manager.cancel_edit(&id);
                anyhow::bail!("Cannot save card {}: {}", position, e);
            }
            info!("✅ Updated card {}", position);
            print_cards(&manager, collection)?;
        }

        Commands::Icon { position, icon } => {
            let mut manager = open_headless(&data_dir, collection);
            let id = position_id(&manager, position)?;
            manager.start_edit(&id);
            let changed = manager.edit_icon(&id, &icon);
            manager.cancel_edit(&id);
            if !changed {
                anyhow::bail!("Icon cannot be empty");
            }
            info!("✅ Updated icon of card {}", position);
            print_cards(&manager, collection)?;
        }

        Commands::Delete { position, yes } => {
            let mut manager = open_headless(&data_dir, collection);
            let id = position_id(&manager, position)?;
            let name = manager.items()[position - 1].name.clone();

            if manager.request_delete(&id) != DeleteOutcome::Armed {
                anyhow::bail!("Card {} could not be armed for deletion", position);
            }
            if !yes {
                print!("Delete '{}'? (y/N): ", name);
                use std::io::{self, Write};
                io::stdout().flush().ok();

                let mut input = String::new();
                io::stdin().read_line(&mut input).ok();

                if !input.trim().eq_ignore_ascii_case("y") {
                    manager.key_press(&id);
                    info!("❌ Cancelled");
                    return Ok(());
                }
            }
            manager.request_delete(&id);
            info!("🗑️  Deleted '{}'", name);
            print_cards(&manager, collection)?;
        }

        Commands::Move { from, to } => {
            let mut manager = open_headless(&data_dir, collection);
            let dragged = position_id(&manager, from)?;
            let target = position_id(&manager, to)?;
            if manager.reorder(&dragged, &target) {
                info!("✅ Moved card {} before card {}", from, to);
            } else {
                warn!("⚠️  Order unchanged");
            }
            print_cards(&manager, collection)?;
        }

        Commands::Import { file } => {
            info!("📥 Importing {} from: {:?}", collection.name(), file);
            let mut manager = open_headless(&data_dir, collection);
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let count = manager.import_many(&raw).context("Import failed")?;
            info!("✅ Imported {} item(s)", count);
        }

        Commands::Export { out } => {
            let manager = open_headless(&data_dir, collection);
            let path = out.unwrap_or_else(|| default_export_filename(manager.config().key).into());
            let count = session::export_to(&manager, &path)?;
            if count == 0 {
                warn!("⚠️  Nothing to export");
            } else {
                info!("📤 Exported {} item(s) to {:?}", count, path);
            }
        }

        Commands::Search { query } => {
            let mut index = SearchIndex::new();
            for source in [CollectionType::Sites, CollectionType::Engines] {
                index.refresh(source, open_headless(&data_dir, source).items());
            }
            let matches = index.lookup(&query);
            if matches.is_empty() {
                println!("🔍 No matches for '{}'", query);
            }
            for entry in matches {
                println!("  {} {}  {}", entry.icon, entry.name, entry.url);
            }
            for engine in index.engines() {
                println!("  ↪ {}: {}", engine.name, expand_query(&engine.url, &query));
            }
        }

        Commands::Shell => {
            info!("🖥️  Starting shell (data in {:?})", data_dir);
            let open = |source: CollectionType| {
                CardCollection::new(
                    source.config(),
                    FileStorage::new(&data_dir),
                    TextMount::new(std::io::stdout(), source.name()),
                )
            };
            let sites = open(CollectionType::Sites);
            let engines = open(CollectionType::Engines);

            let (tx, rx) = session::channel();
            let shell = Session::new(sites, engines, &settings, tx.clone());
            shell.run(tx, rx).await?;
        }
    }

    Ok(())
}
