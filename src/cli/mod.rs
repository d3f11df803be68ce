mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use savekit::CorruptPolicy;
use savekit::logging::init_logging;

#[derive(Parser)]
#[command(name = "savekit", version, about = "Inspect and edit a savekit data file")]
struct Cli {
    /// Base directory holding the `data/` folder (defaults to the executable's directory)
    #[arg(
        short = 'b',
        long = "base-dir",
        global = true,
        env = "SAVEKIT_BASE_DIR",
        value_name = "PATH"
    )]
    base_dir: Option<PathBuf>,

    /// Refuse to start over when the data file is corrupt
    #[arg(long = "strict", global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a value, creating or overwriting the key
    Set {
        key: String,
        /// Literal to store; JSON is accepted, anything else is stored as a string
        value: String,
        /// Explicit kind (string, int, float, bool, string[], int[], float[], bool[])
        #[arg(long = "kind", value_name = "KIND")]
        kind: Option<String>,
        /// Caller identity for the private namespace; omit for global
        #[arg(long = "private", value_name = "CALLER")]
        private: Option<String>,
    },
    /// Print a stored value
    Get {
        key: String,
        #[arg(long = "kind", value_name = "KIND")]
        kind: String,
        #[arg(long = "private", value_name = "CALLER")]
        private: Option<String>,
    },
    /// Print the whole data file as pretty JSON
    Dump,
    /// Print value counts per kind and the known callers
    Stats,
    /// Print the resolved data file path
    Path,
}

pub(crate) fn run() -> Result<()> {
    init_logging("warn");
    let cli = Cli::parse();
    let policy = if cli.strict {
        CorruptPolicy::Fail
    } else {
        CorruptPolicy::Reset
    };
    let registry = commands::open_registry(cli.base_dir, policy)?;
    if !matches!(cli.command, Command::Path) {
        // Surface a corrupt file under --strict before doing anything else.
        registry.load_now()?;
    }

    match cli.command {
        Command::Set {
            key,
            value,
            kind,
            private,
        } => commands::cmd_set(
            &registry,
            &key,
            &value,
            kind.as_deref(),
            private.as_deref(),
        ),
        Command::Get { key, kind, private } => {
            commands::cmd_get(&registry, &key, &kind, private.as_deref())
        }
        Command::Dump => commands::cmd_dump(&registry),
        Command::Stats => commands::cmd_stats(&registry),
        Command::Path => {
            println!("{}", registry.path().display());
            Ok(())
        }
    }
}
