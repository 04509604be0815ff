// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use transapi::app_config::{self, Config};
use transapi::file_utils::FileManager;
use transapi::{Controller, SearchField};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SearchField to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSearchField {
    Name,
    Content,
    All,
}

impl From<CliSearchField> for SearchField {
    fn from(field: CliSearchField) -> Self {
        match field {
            CliSearchField::Name => SearchField::Name,
            CliSearchField::Content => SearchField::Content,
            CliSearchField::All => SearchField::All,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or upgrade the database tables
    InitDb,

    /// Remove every table created by init-db
    RemoveDb {
        /// Required, as this deletes all translation data
        #[arg(long)]
        force: bool,
    },

    /// Import XLIFF files from a directory
    Import {
        /// Directory to import from (defaults to xliff.import_path)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Export domains as XLIFF files
    Export {
        /// Only export this domain
        #[arg(short, long)]
        domain: Option<String>,

        /// Directory to export to (defaults to xliff.export_path)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// List all languages
    Languages,

    /// List all domains
    Domains,

    /// Print a domain with all of its translations as JSON
    Show {
        domain: String,
    },

    /// Set the content of a string in one language
    Set {
        domain: String,
        string: String,
        language: String,
        content: String,

        /// Create the string and translation if they do not exist yet
        #[arg(long)]
        create: bool,
    },

    /// Delete a string with all of its translations
    DeleteString {
        domain: String,
        string: String,
    },

    /// Delete one translation of a string
    DeleteTranslation {
        domain: String,
        string: String,
        language: String,
    },

    /// Register a new language
    AddLanguage {
        code: String,
        name: String,
    },

    /// Search string names and translation content
    Search {
        term: String,

        /// Which fields to match
        #[arg(short, long, value_enum, default_value = "all")]
        field: CliSearchField,
    },

    /// Generate shell completions for transapi
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// transapi - translation management
///
/// Stores translatable strings per domain and language in SQLite or
/// PostgreSQL, and imports/exports them as XLIFF 1.2 files.
#[derive(Parser, Debug)]
#[command(name = "transapi")]
#[command(version)]
#[command(about = "Translation management with XLIFF import/export")]
#[command(long_about = "transapi stores translation strings in SQLite or PostgreSQL and exchanges them as XLIFF files.

EXAMPLES:
    transapi init-db                                 # Create the database tables
    transapi import ./xliff-in                       # Import {domain}.{lang}.xliff files
    transapi export --domain homepage                # Export one domain
    transapi set homepage welcome de Willkommen!     # Update a translation
    transapi search welcome --field name             # Find strings by name
    transapi completions bash > transapi.bash        # Generate bash completions

CONFIGURATION:
    Configuration is read from transapi.toml by default. If the file does not
    exist, a default one is written.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "transapi.toml")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Accept every level here; the effective level is set once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "transapi", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;
    log::set_max_level(config.log_level.to_level_filter());

    // Store calls block, so they run on this thread with the runtime entered
    // rather than inside it
    let runtime = Runtime::new().context("Failed to start the async runtime")?;
    let _guard = runtime.enter();

    let controller = Controller::with_config(config)?;
    let result = run_command(&runtime, &controller, cli.command);

    let stats = runtime.block_on(controller.shutdown());
    if !stats.is_empty() {
        eprintln!("\n{}", stats);
    }

    result
}

// @loads: Config file, writing a default one when it does not exist
fn load_config(config_path: &Path, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        warn!(
            "Config file not found at {:?}, creating default config.",
            config_path
        );
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).context("Failed to serialize default config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write default config to {:?}", config_path))?;
        config
    };

    if let Some(level) = log_level {
        config.log_level = level.into();
    }

    Ok(config)
}

fn run_command(runtime: &Runtime, controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::InitDb => {
            let version = controller.init_db().map_err(|e| {
                anyhow!(
                    "Could not complete database migration, last applied version was {}: {}",
                    e.version,
                    e.source
                )
            })?;
            println!("Successfully migrated the database to version {}", version);
        }
        Commands::RemoveDb { force } => {
            if !force {
                return Err(anyhow!("The remove-db command requires the '--force' flag"));
            }
            let version = controller.remove_db().map_err(|e| {
                anyhow!(
                    "Could not complete database removal, last applied version was {}: {}",
                    e.version,
                    e.source
                )
            })?;
            println!("Successfully migrated the database to version {}", version);
        }
        Commands::Import { dir } => import(controller, dir.as_deref())?,
        Commands::Export { domain, dir } => {
            let written = controller.export(domain.as_deref(), dir.as_deref())?;
            for path in &written {
                println!("{}", path.display());
            }
            info!("Exported {} file(s)", written.len());
        }
        Commands::Languages => {
            for language in controller.languages()? {
                println!("{:<8} {}", language.code, language.name);
            }
        }
        Commands::Domains => {
            for domain in controller.domains()? {
                println!("{}", domain.name);
            }
        }
        Commands::Show { domain } => {
            let domain = controller.domain(&domain)?;
            println!("{}", serde_json::to_string_pretty(&domain)?);
        }
        Commands::Set {
            domain,
            string,
            language,
            content,
            create,
        } => {
            runtime.block_on(controller.set_translation(
                &domain, &string, &language, &content, create,
            ))?;
        }
        Commands::DeleteString { domain, string } => {
            runtime.block_on(controller.delete_string(&domain, &string))?;
        }
        Commands::DeleteTranslation {
            domain,
            string,
            language,
        } => {
            runtime.block_on(controller.delete_translation(&domain, &string, &language))?;
        }
        Commands::AddLanguage { code, name } => {
            let id = controller.add_language(&code, &name)?;
            println!("Added language {} ({}) with id {}", name, code, id);
        }
        Commands::Search { term, field } => {
            for hit in controller.search(&term, field.into())? {
                println!("{}/{} [{}]: {}", hit.domain, hit.string, hit.language, hit.content);
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

// @imports: Directory with a progress bar per file
fn import(controller: &Controller, dir: Option<&Path>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            controller.config().validate_import_path()?;
            PathBuf::from(&controller.config().xliff.import_path)
        }
    };

    let total = FileManager::find_files(&dir, "xliff")
        .with_context(|| format!("Failed to list XLIFF files in {:?}", dir))?
        .len();

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let start = std::time::Instant::now();
    let result = controller.import(Some(&dir), |name| {
        progress.set_message(format!("Imported domain: {}", name));
        progress.inc(1);
    });
    progress.finish_and_clear();

    let count = result.map_err(|e| {
        anyhow!(
            "Import stopped after {} file(s): {}",
            e.processed,
            e.source
        )
    })?;

    println!(
        "Imported {} files in {:.3}s",
        count,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
