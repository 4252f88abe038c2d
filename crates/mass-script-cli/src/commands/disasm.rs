use crate::commands::{decode_hex, decode_transaction};
use crate::error::{Error, Result};
use mass_script::{disasm_string, parse_script};

#[derive(Debug, clap::Parser)]
pub struct Disasm {
    /// Hex encoded script, or a transaction when `--witness` is given.
    #[arg(index = 1)]
    pub input: String,

    /// Disassemble the witness scripts of this transaction input.
    #[clap(long, value_name = "INPUT_INDEX")]
    pub witness: Option<usize>,

    /// Print one opcode per line, prefixed with the script and opcode index.
    #[clap(long)]
    pub lines: bool,
}

pub struct DisasmCmd {
    scripts: Vec<Vec<u8>>,
    lines: bool,
}

impl TryFrom<Disasm> for DisasmCmd {
    type Error = Error;

    fn try_from(disasm: Disasm) -> Result<Self> {
        let Disasm {
            input,
            witness,
            lines,
        } = disasm;

        let scripts = match witness {
            Some(index) => {
                let tx = decode_transaction(&input)?;
                let txin = tx.input.get(index).ok_or(Error::MissingInput {
                    index,
                    inputs: tx.input.len(),
                })?;
                txin.witness.to_vec()
            }
            None => vec![decode_hex(&input)?],
        };

        Ok(Self { scripts, lines })
    }
}

impl DisasmCmd {
    fn render(&self) -> Result<Vec<String>> {
        if !self.lines {
            return Ok(self
                .scripts
                .iter()
                .map(|script| disasm_string(script))
                .collect());
        }

        let mut out = Vec::new();
        for (index, script) in self.scripts.iter().enumerate() {
            for (offset, pop) in parse_script(script)?.iter().enumerate() {
                out.push(format!("{index:02x}:{offset:04x}: {}", pop.print(false)));
            }
        }
        Ok(out)
    }

    pub fn execute(self) -> Result<()> {
        for line in self.render()? {
            println!("{line}");
        }
        Ok(())
    }
}
