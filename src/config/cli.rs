use clap::Parser;

/// Command line for the `swift-codes` server.
#[derive(Debug, Clone, Parser)]
#[command(name = "swift-codes")]
#[command(about = "SWIFT code directory: imports bank data and serves it over HTTP")]
pub struct Cli {
    #[arg(short, long, help = "Path to the TOML configuration file")]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, help = "Override server.port")]
    pub port: Option<u16>,

    #[arg(long, help = "Serve whatever is already stored, without re-importing")]
    pub skip_import: bool,
}

/// Command line for the one-shot `swift-import` tool.
#[derive(Debug, Clone, Parser)]
#[command(name = "swift-import")]
#[command(about = "Import the SWIFT code spreadsheet into the configured store")]
pub struct ImportCli {
    #[arg(short, long, help = "Path to the TOML configuration file")]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Read the CSV from a local file instead of the configured source")]
    pub csv: Option<String>,

    #[arg(long, help = "Parse and assemble only, do not touch the store")]
    pub dry_run: bool,

    #[arg(long, help = "Fail on duplicate headquarters or orphan branches")]
    pub strict: bool,
}
