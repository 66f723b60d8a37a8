//! regkv: command-line access to application settings.
//!
//! Reads and writes the same application roots a program using
//! [`regkv::SettingsStore`] sees, which makes it handy for inspecting or
//! seeding settings by hand.
//!
//! # Usage
//!
//! ```text
//! regkv --app <APP> [OPTIONS] <COMMAND>
//!
//! Commands:
//!   get     NAME [--default D] [--as string|int|uint|float|bool|uuid|duration]
//!   set     NAME VALUE... [--kind string|expand|dword|qword|binary|multi|REG_*]
//!   delete  NAME
//!   list    [SUBCONTAINER]
//!   clear
//!
//! Options:
//!   --options <PATH>         options file [default: platform config dir]
//!   --backend <BACKEND>      auto | registry | file | memory
//!   --hive-file <PATH>       JSON file for the file backend
//!   --subcontainer <NAME>    subcontainer for get/set/delete
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable        | Description                                   |
//! |-----------------|-----------------------------------------------|
//! | `REGKV_APP`     | application name when `--app` is absent        |
//! | `REGKV_OPTIONS` | options file when `--options` is absent       |
//! | `RUST_LOG`      | log filter, overriding `[logging] level`       |
//!
//! Values go to stdout; logs go to stderr.  Any failure exits non-zero.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use regkv::infrastructure::options::{
    build_store, load_options, load_options_from, BackendKind, OptionsError, StoreOptions,
};
use regkv::{FromSettingsString, SettingsStore, ValueKind};
use regkv_core::convert::timespan;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Fault-tolerant application settings over the native configuration store.
#[derive(Debug, Parser)]
#[command(
    name = "regkv",
    about = "Read and write application settings in the native configuration store",
    version
)]
struct Cli {
    /// Application whose root container is used (`<location>\<APP>`).
    #[arg(long, env = "REGKV_APP")]
    app: String,

    /// Options file to load instead of the platform default.
    #[arg(long, env = "REGKV_OPTIONS")]
    options: Option<PathBuf>,

    /// Backend overriding `[store] backend`.
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// JSON file overriding `[store] hive_file`.
    #[arg(long)]
    hive_file: Option<PathBuf>,

    /// Subcontainer overriding `[store] default_subcontainer`.
    #[arg(long)]
    subcontainer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a value.
    Get {
        name: String,
        /// Printed when the value does not exist.
        #[arg(long)]
        default: Option<String>,
        /// Convert the value before printing it.
        #[arg(long = "as", value_enum, default_value_t = ReadAs::String)]
        read_as: ReadAs,
    },
    /// Write a value, creating the subcontainer if needed.
    Set {
        name: String,
        /// The value; `binary` takes hex digits, `multi` takes one argument per line.
        #[arg(required = true, num_args = 1..)]
        values: Vec<String>,
        /// string, expand, dword, qword, binary, multi, or a REG_* name.
        #[arg(long, value_parser = str::parse::<ValueKind>, default_value = "string")]
        kind: ValueKind,
    },
    /// Delete a value.
    Delete { name: String },
    /// List values, of one subcontainer or of all of them.
    List { subcontainer: Option<String> },
    /// Remove the whole application root.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Auto,
    Registry,
    File,
    Memory,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendKind::Auto,
            BackendArg::Registry => BackendKind::Registry,
            BackendArg::File => BackendKind::File,
            BackendArg::Memory => BackendKind::Memory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReadAs {
    String,
    Int,
    Uint,
    Float,
    Bool,
    Uuid,
    Duration,
}

impl Cli {
    /// Loads the options file and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named options file cannot be read or
    /// parsed, or if the platform options file exists but is malformed.
    fn effective_options(&self) -> anyhow::Result<StoreOptions> {
        let mut options = match &self.options {
            Some(path) => load_options_from(path)
                .with_context(|| format!("failed to load options from {}", path.display()))?,
            None => match load_options() {
                Ok(options) => options,
                Err(OptionsError::NoPlatformConfigDir) => StoreOptions::default(),
                Err(e) => return Err(e).context("failed to load options"),
            },
        };

        if let Some(backend) = self.backend {
            options.store.backend = backend.into();
        }
        if let Some(path) = &self.hive_file {
            options.store.hive_file = Some(path.clone());
        }
        if let Some(name) = &self.subcontainer {
            options.store.default_subcontainer = name.clone();
        }
        Ok(options)
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Builds the store from `options`, binds it to the app, and runs the command.
fn run(cli: Cli, options: &StoreOptions, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut store = build_store(options).context("failed to build the settings store")?;
    store
        .initialize(&cli.app)
        .with_context(|| format!("failed to open settings for '{}'", cli.app))?;
    debug!(
        root = store.root_path().unwrap_or_default(),
        "settings store ready"
    );

    let subcontainer = store.default_subcontainer().to_string();
    match cli.command {
        Command::Get {
            name,
            default,
            read_as,
        } => {
            let value = read(&store, &name, &subcontainer, read_as)?;
            match value.or(default) {
                Some(text) => writeln!(out, "{text}")?,
                None => bail!("value '{name}' not found in '{subcontainer}'"),
            }
        }
        Command::Set { name, values, kind } => {
            write(&store, &name, values, kind, &subcontainer)?;
        }
        Command::Delete { name } => {
            if store.try_delete_value_in(&name, &subcontainer)? {
                writeln!(out, "deleted '{name}'")?;
            } else {
                writeln!(out, "'{name}' was not present")?;
            }
        }
        Command::List {
            subcontainer: Some(only),
        } => list(&store, &only, out)?,
        Command::List { subcontainer: None } => {
            for name in store.try_list_subcontainers()? {
                writeln!(out, "[{name}]")?;
                list(&store, &name, out)?;
            }
        }
        Command::Clear => {
            store.try_delete_all()?;
            writeln!(out, "removed all settings of '{}'", cli.app)?;
        }
    }
    Ok(())
}

fn read(
    store: &SettingsStore,
    name: &str,
    subcontainer: &str,
    read_as: ReadAs,
) -> anyhow::Result<Option<String>> {
    fn typed<T: FromSettingsString>(
        store: &SettingsStore,
        name: &str,
        subcontainer: &str,
        show: impl FnOnce(T) -> String,
    ) -> anyhow::Result<Option<String>> {
        Ok(store
            .try_get_typed_value_in::<T>(name, subcontainer)?
            .map(show))
    }

    match read_as {
        ReadAs::String => Ok(store.try_get_value_in(name, subcontainer)?),
        ReadAs::Int => typed(store, name, subcontainer, |v: i64| v.to_string()),
        ReadAs::Uint => typed(store, name, subcontainer, |v: u64| v.to_string()),
        ReadAs::Float => typed(store, name, subcontainer, |v: f64| v.to_string()),
        ReadAs::Bool => typed(store, name, subcontainer, |v: bool| v.to_string()),
        ReadAs::Uuid => typed(store, name, subcontainer, |v: Uuid| v.to_string()),
        ReadAs::Duration => typed(store, name, subcontainer, |v: Duration| timespan::format(v)),
    }
}

fn write(
    store: &SettingsStore,
    name: &str,
    values: Vec<String>,
    kind: ValueKind,
    subcontainer: &str,
) -> anyhow::Result<()> {
    match kind {
        ValueKind::MultiString => {
            store.try_set_value_in(name, Some(&values), kind, subcontainer)?;
        }
        ValueKind::Binary => {
            let bytes = parse_hex(&values.concat())?;
            store.try_set_value_in(name, Some(&bytes), kind, subcontainer)?;
        }
        _ => {
            let [value] = values.as_slice() else {
                bail!("{kind} values take exactly one argument, got {}", values.len());
            };
            store.try_set_value_in(name, Some(value.as_str()), kind, subcontainer)?;
        }
    }
    Ok(())
}

/// Decodes hex digits, ignoring whitespace and an optional `0x` prefix.
fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);

    if digits.len() % 2 != 0 {
        bail!("hex input must have an even number of digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = digits.get(i..i + 2).context("hex input must be ASCII")?;
            u8::from_str_radix(pair, 16).with_context(|| format!("invalid hex byte '{pair}'"))
        })
        .collect()
}

fn list(store: &SettingsStore, subcontainer: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    for (name, value) in store.try_list_values_in(subcontainer)? {
        writeln!(out, "{name} ({}) = {value}", value.kind())?;
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let options = cli.effective_options()?;

    // `RUST_LOG` wins over the options file.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&options.logging.level)),
        )
        .init();

    let mut stdout = std::io::stdout().lock();
    run(cli, &options, &mut stdout)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
