mod multisig;
mod ops;

use crate::LOG_TARGET;
use crate::VerifyFlags;
use crate::cond_stack::ConditionalStack;
use crate::constants::{
    LOCK_HEIGHT_WITNESS_VERSION, MAX_OPS_PER_SCRIPT, MAX_SCRIPT_ELEMENT_SIZE, MAX_STACK_SIZE,
};
use crate::error::Error;
use crate::parser::{ParsedOpcode, parse_script, unparse_script};
use crate::sig_cache::SigCache;
use crate::signature_checker::{SignatureChecker, TransactionSignatureChecker};
use crate::stack::Stack;
use crate::witness::{SpendCondition, WitnessError, classify_spend};
use bitcoin::opcodes::all::{OP_PUSHDATA4, OP_PUSHNUM_16};
use bitcoin::{Amount, ScriptBuf, Transaction};

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, nothing executed yet.
    Ready,
    /// At least one step executed.
    Running,
    /// All scripts executed and the final check passed.
    Success,
    /// A step or the final check failed.
    Failed,
}

/// Virtual machine executing the witness scripts of one transaction input.
///
/// `scripts[0]` is the witness signature script and `scripts[1]` the witness
/// redeem script. Lock-height spends append the locking script as a third
/// script once the redeem script has completed.
pub struct Engine<C> {
    scripts: Vec<Vec<ParsedOpcode>>,
    script_index: usize,
    offset: usize,
    last_code_separator: usize,
    num_ops: usize,
    flags: VerifyFlags,
    witness_version: u8,
    witness_program: Vec<u8>,
    saved_first_stack: Vec<Vec<u8>>,
    expanded: bool,
    stack: Stack,
    alt_stack: Stack,
    cond_stack: ConditionalStack,
    state: EngineState,
    checker: C,
}

impl<'a> Engine<TransactionSignatureChecker<'a>> {
    /// Creates an engine validating input `input_index` of `tx`, which spends an
    /// output of `amount` locked by `locking_script`.
    pub fn new(
        locking_script: &[u8],
        tx: &'a Transaction,
        input_index: usize,
        flags: VerifyFlags,
        sig_cache: Option<&'a SigCache>,
        amount: Amount,
    ) -> Result<Self, Error> {
        let input = tx
            .input
            .get(input_index)
            .ok_or(WitnessError::InvalidInputIndex {
                index: input_index,
                inputs: tx.input.len(),
            })?;

        let checker = TransactionSignatureChecker::new(tx, input_index, amount, sig_cache);

        Self::with_checker(locking_script, input.witness.to_vec(), flags, checker)
    }
}

impl<C: SignatureChecker> Engine<C> {
    /// Creates an engine for `witness` spending `locking_script`, checking
    /// signatures with `checker`.
    pub fn with_checker(
        locking_script: &[u8],
        witness: Vec<Vec<u8>>,
        flags: VerifyFlags,
        checker: C,
    ) -> Result<Self, Error> {
        let condition = classify_spend(locking_script, &witness)?;

        let scripts = witness[..2]
            .iter()
            .map(|script| parse_script(script))
            .collect::<Result<Vec<_>, _>>()?;

        let witness_version = condition.witness_version();
        let (witness_program, saved_first_stack) = match condition {
            SpendCondition::HashLocked { program } => (program, Vec::new()),
            SpendCondition::LockHeight { .. } => (locking_script.to_vec(), witness),
        };

        Ok(Self {
            witness_version,
            witness_program,
            saved_first_stack,
            ..Self::from_parsed(scripts, flags, checker)
        })
    }

    fn from_parsed(scripts: Vec<Vec<ParsedOpcode>>, flags: VerifyFlags, checker: C) -> Self {
        let verify_minimaldata = flags.contains(VerifyFlags::MINIMALDATA);

        Self {
            scripts,
            script_index: 0,
            offset: 0,
            last_code_separator: 0,
            num_ops: 0,
            flags,
            witness_version: 0,
            witness_program: Vec::new(),
            saved_first_stack: Vec::new(),
            expanded: false,
            stack: Stack::new(verify_minimaldata),
            alt_stack: Stack::new(verify_minimaldata),
            cond_stack: ConditionalStack::default(),
            state: EngineState::Ready,
            checker,
        }
    }

    /// Creates an engine running raw scripts in order, without witness classification.
    #[cfg(test)]
    pub(crate) fn from_scripts(
        scripts: &[&[u8]],
        flags: VerifyFlags,
        checker: C,
    ) -> Result<Self, Error> {
        let scripts = scripts
            .iter()
            .map(|script| parse_script(script))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_parsed(scripts, flags, checker))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn witness_version(&self) -> u8 {
        self.witness_version
    }

    /// Hash committed to by a hash-locked spend, or the whole locking script
    /// of a lock-height spend.
    pub fn witness_program(&self) -> &[u8] {
        &self.witness_program
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Replaces the data stack, the last item of `data` becoming the top.
    pub fn set_stack(&mut self, data: Vec<Vec<u8>>) {
        self.stack.set(data);
    }

    pub fn alt_stack(&self) -> &Stack {
        &self.alt_stack
    }

    fn valid_pc(&self) -> Result<(), Error> {
        let in_range = self
            .scripts
            .get(self.script_index)
            .is_some_and(|script| self.offset < script.len());

        if in_range {
            Ok(())
        } else {
            Err(Error::PastEndOfScript {
                script_index: self.script_index,
                offset: self.offset,
                script_count: self.scripts.len(),
            })
        }
    }

    // Version 0 spends only accept compressed public keys.
    fn is_witness_v0(&self) -> bool {
        self.witness_version == 0
    }

    /// Disassembles the opcode the program counter points at.
    pub fn disasm_pc(&self) -> Result<String, Error> {
        self.valid_pc()?;
        let pop = &self.scripts[self.script_index][self.offset];
        Ok(format!(
            "{:02x}:{:04x}: {}",
            self.script_index,
            self.offset,
            pop.print(false)
        ))
    }

    /// Disassembles script `index`, one opcode per line.
    pub fn disasm_script(&self, index: usize) -> Result<String, Error> {
        let script = self.scripts.get(index).ok_or(Error::PastEndOfScript {
            script_index: index,
            offset: 0,
            script_count: self.scripts.len(),
        })?;

        Ok(script
            .iter()
            .enumerate()
            .map(|(offset, pop)| format!("{index:02x}:{offset:04x}: {}\n", pop.print(false)))
            .collect())
    }

    // Sub-script starting right after the last executed OP_CODESEPARATOR.
    fn sub_script(&self) -> ScriptBuf {
        let script = &self.scripts[self.script_index];
        let start = self.last_code_separator.min(script.len());
        ScriptBuf::from_bytes(unparse_script(&script[start..]))
    }

    /// Checks the state of the stacks once a script, or all of them, completed.
    ///
    /// In the final check a top level spend must leave exactly one element.
    /// Lock-height spends keep the remaining witness items, so only the top
    /// element is checked after the expansion.
    pub fn check_error_condition(&mut self, final_script: bool) -> Result<(), Error> {
        if self.script_index < self.scripts.len() {
            return Err(Error::ScriptUnfinished);
        }

        let depth = self.stack.depth();

        if depth == 0 {
            return Err(Error::EmptyStack);
        }

        if final_script && !self.expanded && depth != 1 {
            return Err(Error::CleanStack(depth));
        }

        if !self.stack.pop_bool()? {
            tracing::debug!(
                target: LOG_TARGET,
                "Script failed with a false stack element, script 0: [{}], script 1: [{}]",
                self.disasm_script(0).unwrap_or_default().trim_end(),
                self.disasm_script(1).unwrap_or_default().trim_end(),
            );
            return Err(Error::ScriptFailed);
        }

        Ok(())
    }

    fn execute_opcode(&mut self, pop: &ParsedOpcode) -> Result<(), Error> {
        // Disabled and always illegal opcodes fail even in a non-executing branch.
        if pop.is_disabled() {
            return Err(Error::DisabledOpcode(pop.opcode.opcode));
        }

        if pop.always_illegal() {
            return Err(Error::ReservedOpcode(pop.opcode.opcode));
        }

        if pop.value() > OP_PUSHNUM_16.to_u8() {
            self.num_ops += 1;
            if self.num_ops > MAX_OPS_PER_SCRIPT {
                return Err(Error::TooManyOperations);
            }
        } else if pop.data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(Error::ElementTooBig(pop.data.len()));
        }

        if !self.cond_stack.is_executing() && !pop.is_conditional() {
            return Ok(());
        }

        if self.flags.contains(VerifyFlags::MINIMALDATA)
            && self.cond_stack.is_executing()
            && pop.value() <= OP_PUSHDATA4.to_u8()
        {
            pop.check_minimal_data_push()?;
        }

        self.dispatch(pop)
    }

    /// Executes the opcode at the program counter and advances it.
    ///
    /// Returns `true` once the last script has been executed. The engine
    /// moves to [`EngineState::Failed`] on error.
    pub fn step(&mut self) -> Result<bool, Error> {
        let result = self.step_inner();
        if result.is_err() {
            self.state = EngineState::Failed;
        }
        result
    }

    fn step_inner(&mut self) -> Result<bool, Error> {
        self.valid_pc()?;
        self.state = EngineState::Running;

        let pop = self.scripts[self.script_index][self.offset].clone();
        self.execute_opcode(&pop)?;

        let depth = self.stack.depth() + self.alt_stack.depth();
        if depth > MAX_STACK_SIZE {
            return Err(Error::StackOverflow(depth));
        }

        self.offset += 1;

        if self.offset < self.scripts[self.script_index].len() {
            return Ok(false);
        }

        // End of the current script.
        if !self.cond_stack.is_empty() {
            return Err(Error::MissingEndif);
        }

        self.alt_stack.clear();
        self.num_ops = 0;
        self.offset = 0;
        self.script_index += 1;

        if self.script_index == 2
            && self.witness_version >= LOCK_HEIGHT_WITNESS_VERSION
            && !self.expanded
        {
            self.check_error_condition(false)?;

            let script = parse_script(&self.witness_program)?;
            self.scripts.push(script);

            let restored = self.saved_first_stack.get(1..).unwrap_or_default().to_vec();
            self.set_stack(restored);
            self.expanded = true;

            tracing::debug!(
                target: LOG_TARGET,
                "Expanded lock-height spend, stack restored to {}",
                self.stack
            );
        }

        if self
            .scripts
            .get(self.script_index)
            .is_some_and(|script| script.is_empty())
        {
            self.script_index += 1;
        }

        self.last_code_separator = 0;

        Ok(self.script_index >= self.scripts.len())
    }

    /// Runs all scripts to completion and performs the final check.
    pub fn execute(&mut self) -> Result<(), Error> {
        let result = self.run();
        self.state = match result {
            Ok(()) => EngineState::Success,
            Err(_) => EngineState::Failed,
        };
        result
    }

    fn run(&mut self) -> Result<(), Error> {
        loop {
            tracing::trace!(
                target: LOG_TARGET,
                "Stepping {}, stack: {}, alt stack: {}",
                self.disasm_pc().unwrap_or_else(|err| err.to_string()),
                self.stack,
                self.alt_stack,
            );

            if self.step()? {
                break;
            }
        }

        self.check_error_condition(true)
    }
}
