//! Code generation module for the Octa language.
//!
//! [`CodeGenerator`] walks a [`Function`] in source order, binds each
//! declared name to a storage slot and emits instructions through an
//! [`IrBuilder`]. Which backend receives them is up to the caller.

mod builder;
mod llvm;
mod recording;
mod symbol_table;

pub use builder::{CodegenResult, IrBuilder};
pub use llvm::LlvmModule;
pub use recording::{
    Execution, ExecutionError, FunctionId, Instruction, RecordedBlock, RecordedFunction,
    RecordingModule, SlotId, ValueId,
};
pub use symbol_table::SymbolTable;

use crate::ast::*;
use crate::error::CodegenError;

/// Value returned by every generated block
pub const EXIT_SUCCESS: i32 = 0;

pub struct CodeGenerator<B: IrBuilder> {
    backend: B,
    symbols: SymbolTable<B::Slot>,
}

impl<B: IrBuilder> CodeGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            symbols: SymbolTable::new(),
        }
    }

    /// Compile the block into the backend
    pub fn compile_function(&mut self, function: &Function) -> CodegenResult<()> {
        log::debug!(
            "generating `{}` ({} statement(s))",
            function.name,
            function.body.len()
        );

        let handle = self.backend.declare_function(&function.name)?;
        self.backend.append_entry_block(handle)?;

        for stmt in &function.body {
            self.compile_statement(stmt)?;
        }

        self.backend.return_int(EXIT_SUCCESS)?;
        self.backend.finish_function(handle)
    }

    fn compile_statement(&mut self, stmt: &Statement) -> CodegenResult<()> {
        match stmt {
            Statement::VarDecl(decl) => self.compile_var_decl(decl),
            Statement::Assign(assign) => self.compile_assign(assign),
            Statement::Print(print) => self.compile_print(print),
        }
    }

    fn compile_var_decl(&mut self, decl: &VarDecl) -> CodegenResult<()> {
        if self.symbols.contains(&decl.name) {
            return Err(CodegenError::DuplicateDeclaration {
                name: decl.name.clone(),
                span: decl.span,
            });
        }
        let value = constant_value(&decl.initializer)?;

        let slot = self.backend.allocate_slot(&decl.name)?;
        self.symbols.bind(decl.name.as_str(), slot);
        self.backend.store_constant(slot, value)
    }

    fn compile_assign(&mut self, assign: &Assign) -> CodegenResult<()> {
        let slot = self.lookup(&assign.name, assign.span)?;
        let value = constant_value(&assign.value)?;
        self.backend.store_constant(slot, value)
    }

    fn compile_print(&mut self, print: &Print) -> CodegenResult<()> {
        let var = match &print.target {
            Expression::Variable(var) => var,
            Expression::Number(lit) => {
                return Err(CodegenError::UnsupportedExpression { span: lit.span })
            }
        };
        let slot = self.lookup(&var.name, var.span)?;
        let value = self.backend.load_slot(slot, &var.name)?;
        self.backend.call_print_int(value)
    }

    fn lookup(&self, name: &str, span: Span) -> CodegenResult<B::Slot> {
        self.symbols
            .lookup(name)
            .ok_or_else(|| CodegenError::UndeclaredVariable {
                name: name.to_string(),
                span,
            })
    }

    pub fn symbols(&self) -> &SymbolTable<B::Slot> {
        &self.symbols
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Only integer literals can be stored; the generator evaluates nothing.
fn constant_value(expr: &Expression) -> CodegenResult<i32> {
    match expr {
        Expression::Number(lit) => Ok(lit.value),
        Expression::Variable(var) => Err(CodegenError::UnsupportedExpression { span: var.span }),
    }
}

/// Generate `function` into `backend` and hand the populated backend back.
pub fn generate<B: IrBuilder>(function: &Function, backend: B) -> CodegenResult<B> {
    let mut codegen = CodeGenerator::new(backend);
    codegen.compile_function(function)?;
    Ok(codegen.into_backend())
}
