pub mod params;

use crate::commands::disasm::{Disasm, DisasmCmd};
use crate::commands::verify::{Verify, VerifyCmd};
use crate::error::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mass_script=info,mass_script_cli=info";

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Verify the inputs of a transaction against the outputs they spend.
    Verify(Verify),

    /// Disassemble a script, or the witness scripts of a transaction input.
    Disasm(Disasm),
}

#[derive(Debug, Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Logs to stderr, filtered by `RUST_LOG` when set.
fn init_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parses the command line and runs the command.
pub fn run() -> Result<()> {
    let Cli { command } = Cli::parse();

    init_logger();

    match command {
        Command::Verify(verify) => VerifyCmd::try_from(verify)?.execute(),
        Command::Disasm(disasm) => DisasmCmd::try_from(disasm)?.execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mass_script::VerifyFlags;

    #[test]
    fn test_parse_verify() {
        let cli = Cli::try_parse_from([
            "mass-script",
            "verify",
            "0x0100",
            "0x51",
            "0x52",
            "--amount",
            "1000,2000",
            "--strict-encoding",
            "--check-sequence",
        ])
        .unwrap();

        let Command::Verify(verify) = cli.command else {
            panic!("expected the verify command");
        };
        assert_eq!(verify.locking_scripts, vec!["0x51", "0x52"]);
        assert_eq!(verify.amount, vec![1000, 2000]);
        assert_eq!(verify.input_index, None);
        assert_eq!(
            verify.flags.verify_flags(),
            VerifyFlags::STRICTENC | VerifyFlags::CHECKSEQUENCEVERIFY
        );
    }

    #[test]
    fn test_verify_requires_locking_script() {
        assert!(Cli::try_parse_from(["mass-script", "verify", "0x0100"]).is_err());
    }

    #[test]
    fn test_parse_disasm() {
        let cli = Cli::try_parse_from(["mass-script", "disasm", "76a9", "--lines"]).unwrap();
        let Command::Disasm(disasm) = cli.command else {
            panic!("expected the disasm command");
        };
        assert_eq!(disasm.input, "76a9");
        assert!(disasm.lines);
        assert_eq!(disasm.witness, None);
    }
}
