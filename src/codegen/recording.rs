//! In-memory backend.
//!
//! Records every emitted instruction against ID handles instead of talking
//! to LLVM. The recorded module can be rendered as text (`--emit trace`)
//! or executed directly, which is how the pipeline is tested without a
//! native toolchain.

use super::builder::{CodegenResult, IrBuilder};
use crate::error::CodegenError;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%slot{}", self.0)
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Alloca { slot: SlotId, name: String },
    Store { slot: SlotId, value: i32 },
    Load { dest: ValueId, slot: SlotId },
    PrintInt { value: ValueId },
    Return { value: i32 },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Return { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { slot, name } => write!(f, "{} = alloca i32 ; {}", slot, name),
            Instruction::Store { slot, value } => write!(f, "store i32 {}, {}", value, slot),
            Instruction::Load { dest, slot } => write!(f, "{} = load i32, {}", dest, slot),
            Instruction::PrintInt { value } => write!(f, "call print_int({})", value),
            Instruction::Return { value } => write!(f, "ret i32 {}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
}

impl RecordedBlock {
    pub fn is_terminated(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(Instruction::is_terminator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFunction {
    pub name: String,
    pub blocks: Vec<RecordedBlock>,
}

/// Outcome of running a recorded function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    /// Every printed integer, in order
    pub output: Vec<i32>,
    pub return_value: i32,
}

impl Execution {
    /// What the compiled program would write to stdout
    pub fn stdout(&self) -> String {
        self.output.iter().map(|v| format!("{}\n", v)).collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("no function named `{0}`")]
    UnknownFunction(String),

    #[error("function `{0}` has no entry block")]
    MissingEntry(String),

    #[error("read of {0} before any store")]
    UninitializedSlot(SlotId),

    #[error("use of undefined value {0}")]
    UndefinedValue(ValueId),

    #[error("function `{0}` falls off the end without returning")]
    MissingReturn(String),
}

#[derive(Debug, Clone)]
pub struct RecordingModule {
    name: String,
    functions: Vec<RecordedFunction>,
    insert_point: Option<FunctionId>,
    next_slot: usize,
    next_value: usize,
}

impl RecordingModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            insert_point: None,
            next_slot: 0,
            next_value: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &[RecordedFunction] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&RecordedFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Run `name` and collect what it prints.
    ///
    /// Execution starts at the entry block and stops at the first `ret`.
    pub fn execute(&self, name: &str) -> Result<Execution, ExecutionError> {
        let function = self
            .function(name)
            .ok_or_else(|| ExecutionError::UnknownFunction(name.to_string()))?;
        let entry = function
            .blocks
            .first()
            .ok_or_else(|| ExecutionError::MissingEntry(name.to_string()))?;

        let mut slots: HashMap<SlotId, Option<i32>> = HashMap::new();
        let mut values: HashMap<ValueId, i32> = HashMap::new();
        let mut output = Vec::new();

        for inst in &entry.instructions {
            match inst {
                Instruction::Alloca { slot, .. } => {
                    slots.insert(*slot, None);
                }
                Instruction::Store { slot, value } => {
                    slots.insert(*slot, Some(*value));
                }
                Instruction::Load { dest, slot } => {
                    let value = slots
                        .get(slot)
                        .copied()
                        .flatten()
                        .ok_or(ExecutionError::UninitializedSlot(*slot))?;
                    values.insert(*dest, value);
                }
                Instruction::PrintInt { value } => {
                    let value = values
                        .get(value)
                        .copied()
                        .ok_or(ExecutionError::UndefinedValue(*value))?;
                    output.push(value);
                }
                Instruction::Return { value } => {
                    return Ok(Execution {
                        output,
                        return_value: *value,
                    });
                }
            }
        }

        Err(ExecutionError::MissingReturn(name.to_string()))
    }

    fn current_block(&mut self) -> CodegenResult<&mut RecordedBlock> {
        let FunctionId(index) = self.insert_point.ok_or_else(|| CodegenError::Builder {
            message: "no insertion point: append an entry block first".to_string(),
        })?;
        let block = self.functions[index]
            .blocks
            .last_mut()
            .ok_or_else(|| CodegenError::Builder {
                message: "function has no basic block".to_string(),
            })?;
        if block.is_terminated() {
            return Err(CodegenError::Builder {
                message: format!("block `{}` is already terminated", block.label),
            });
        }
        Ok(block)
    }

    fn push(&mut self, inst: Instruction) -> CodegenResult<()> {
        self.current_block()?.instructions.push(inst);
        Ok(())
    }
}

impl IrBuilder for RecordingModule {
    type Function = FunctionId;
    type Slot = SlotId;
    type Value = ValueId;

    fn declare_function(&mut self, name: &str) -> CodegenResult<FunctionId> {
        if self.function(name).is_some() {
            return Err(CodegenError::Builder {
                message: format!("function `{}` is already declared", name),
            });
        }
        self.functions.push(RecordedFunction {
            name: name.to_string(),
            blocks: Vec::new(),
        });
        Ok(FunctionId(self.functions.len() - 1))
    }

    fn append_entry_block(&mut self, function: FunctionId) -> CodegenResult<()> {
        let target = self
            .functions
            .get_mut(function.0)
            .ok_or_else(|| CodegenError::Builder {
                message: format!("unknown function handle {:?}", function),
            })?;
        target.blocks.push(RecordedBlock {
            label: "entry".to_string(),
            instructions: Vec::new(),
        });
        self.insert_point = Some(function);
        Ok(())
    }

    fn allocate_slot(&mut self, name: &str) -> CodegenResult<SlotId> {
        let slot = SlotId(self.next_slot);
        self.push(Instruction::Alloca {
            slot,
            name: name.to_string(),
        })?;
        self.next_slot += 1;
        Ok(slot)
    }

    fn store_constant(&mut self, slot: SlotId, value: i32) -> CodegenResult<()> {
        self.push(Instruction::Store { slot, value })
    }

    fn load_slot(&mut self, slot: SlotId, _name: &str) -> CodegenResult<ValueId> {
        let dest = ValueId(self.next_value);
        self.push(Instruction::Load { dest, slot })?;
        self.next_value += 1;
        Ok(dest)
    }

    fn call_print_int(&mut self, value: ValueId) -> CodegenResult<()> {
        self.push(Instruction::PrintInt { value })
    }

    fn return_int(&mut self, value: i32) -> CodegenResult<()> {
        self.push(Instruction::Return { value })
    }

    fn finish_function(&mut self, function: FunctionId) -> CodegenResult<()> {
        let recorded = &self.functions[function.0];
        if !recorded.blocks.iter().all(RecordedBlock::is_terminated) {
            return Err(CodegenError::Builder {
                message: format!("function `{}` has an unterminated block", recorded.name),
            });
        }
        self.insert_point = None;
        Ok(())
    }
}

impl fmt::Display for RecordingModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for function in &self.functions {
            writeln!(f, "define external i32 @{}() {{", function.name)?;
            for block in &function.blocks {
                writeln!(f, "{}:", block.label)?;
                for inst in &block.instructions {
                    writeln!(f, "  {}", inst)?;
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
