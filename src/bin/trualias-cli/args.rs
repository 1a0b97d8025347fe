use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trualias-cli")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// compile a configuration file and report diagnostics
    Check {
        /// path to the trualias configuration file
        config: String,
        /// emit diagnostics as JSON (`with-serde` feature)
        #[arg(long)]
        json: bool,
    },
    /// compile a configuration file and resolve one lookup against it
    Resolve {
        /// path to the trualias configuration file
        config: String,
        /// account (bare local part) or virtual (local@domain)
        #[arg(long, default_value = "account")]
        mode: String,
        /// the string an MTA TCP-table client would look up
        input: String,
    },
    /// run the TCP-table server
    Serve {
        /// path to the trualias configuration file
        config: String,
        /// bind address, overriding the configuration's HOST/PORT
        #[arg(long)]
        bind: Option<String>,
        /// account (bare local part) or virtual (local@domain)
        #[arg(long, default_value = "account")]
        mode: String,
    },
}

pub fn mode_from_str(s: &str) -> anyhow::Result<trualias::Mode> {
    match s {
        "account" => Ok(trualias::Mode::Account),
        "virtual" => Ok(trualias::Mode::Virtual),
        other => anyhow::bail!("unknown --mode '{other}', expected 'account' or 'virtual'"),
    }
}
