use crate::LOG_TARGET;
use crate::cli::params::VerifyFlagParams;
use crate::commands::{decode_hex, decode_transaction};
use crate::error::{Error, Result};
use bitcoin::{Amount, ScriptBuf, Transaction, TxOut};
use mass_script::{SigCache, VerifyFlags, verify_input, verify_transaction_inputs};

#[derive(Debug, clap::Parser)]
pub struct Verify {
    /// Hex encoded spending transaction.
    #[arg(index = 1)]
    pub tx: String,

    /// Hex encoded locking scripts of the spent outputs, in input order.
    ///
    /// Exactly one script is expected when `--input-index` is given.
    #[arg(index = 2, required = true)]
    pub locking_scripts: Vec<String>,

    /// Values of the spent outputs in satoshis, one per locking script.
    ///
    /// A single value applies to every locking script.
    #[clap(long, value_delimiter = ',', default_value = "0")]
    pub amount: Vec<u64>,

    /// Verify only the input at this index.
    ///
    /// Defaults to every input, verified in parallel.
    #[clap(long)]
    pub input_index: Option<usize>,

    /// Maximum number of entries in the signature cache, 0 disables it.
    #[clap(long, default_value = "1000")]
    pub sig_cache_size: usize,

    #[allow(missing_docs)]
    #[clap(flatten)]
    pub flags: VerifyFlagParams,
}

pub struct VerifyCmd {
    tx: Transaction,
    spent_outputs: Vec<TxOut>,
    input_index: Option<usize>,
    flags: VerifyFlags,
    sig_cache: SigCache,
}

impl TryFrom<Verify> for VerifyCmd {
    type Error = Error;

    fn try_from(verify: Verify) -> Result<Self> {
        let Verify {
            tx,
            locking_scripts,
            amount,
            input_index,
            sig_cache_size,
            flags,
        } = verify;

        let tx = decode_transaction(&tx)?;

        let expected = match input_index {
            Some(index) if index >= tx.input.len() => {
                return Err(Error::MissingInput {
                    index,
                    inputs: tx.input.len(),
                });
            }
            Some(_) => 1,
            None => tx.input.len(),
        };

        if locking_scripts.len() != expected {
            return Err(Error::LockingScriptCount {
                expected,
                got: locking_scripts.len(),
            });
        }

        let amounts = match amount.as_slice() {
            [single] => vec![*single; expected],
            amounts if amounts.len() == expected => amounts.to_vec(),
            amounts => {
                return Err(Error::AmountCount {
                    expected,
                    got: amounts.len(),
                });
            }
        };

        let spent_outputs = locking_scripts
            .iter()
            .zip(amounts)
            .map(|(script, value)| {
                Ok(TxOut {
                    value: Amount::from_sat(value),
                    script_pubkey: ScriptBuf::from_bytes(decode_hex(script)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tx,
            spent_outputs,
            input_index,
            flags: flags.verify_flags(),
            sig_cache: SigCache::new(sig_cache_size),
        })
    }
}

impl VerifyCmd {
    /// Returns the verdict of every verified input, keyed by input index.
    fn verify(&self) -> Vec<(usize, std::result::Result<(), mass_script::Error>)> {
        tracing::info!(
            target: LOG_TARGET,
            "Verifying {} input(s) of {} with flags {:?}",
            self.spent_outputs.len(),
            self.tx.compute_txid(),
            self.flags
        );

        match (self.input_index, self.spent_outputs.as_slice()) {
            (Some(index), [spent]) => {
                let result = verify_input(
                    spent.script_pubkey.as_bytes(),
                    &self.tx,
                    index,
                    spent.value,
                    self.flags,
                    Some(&self.sig_cache),
                );
                vec![(index, result)]
            }
            _ => verify_transaction_inputs(
                &self.tx,
                &self.spent_outputs,
                self.flags,
                Some(&self.sig_cache),
            )
            .into_iter()
            .enumerate()
            .collect(),
        }
    }

    pub fn execute(self) -> Result<()> {
        let results = self.verify();
        let total = results.len();

        let mut failed = 0;
        for (index, result) in results {
            match result {
                Ok(()) => println!("input {index}: ok"),
                Err(err) => {
                    failed += 1;
                    println!("input {index}: {err}");
                }
            }
        }

        tracing::debug!(
            target: LOG_TARGET,
            "Signature cache holds {} entries",
            self.sig_cache.len()
        );

        if failed > 0 {
            return Err(Error::VerificationFailed { failed, total });
        }

        Ok(())
    }
}
