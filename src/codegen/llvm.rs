//! LLVM backend built on inkwell.
//!
//! One [`LlvmModule`] holds one LLVM module per source file. Printing goes
//! through libc `printf` with a shared `"%d\n"` format string.

use super::builder::{CodegenResult, IrBuilder};
use crate::error::{BackendError, CodegenError};
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine,
};
use inkwell::values::{FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, OptimizationLevel};
use std::path::Path;

const PRINTF: &str = "printf";
const INT_FORMAT: &str = "%d\n";

#[derive(Debug)]
pub struct LlvmModule<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    int_format: Option<PointerValue<'ctx>>,
}

impl<'ctx> LlvmModule<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            int_format: None,
        }
    }

    /// Get the LLVM module
    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Textual LLVM IR of the whole module
    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn verify(&self) -> Result<(), BackendError> {
        self.module
            .verify()
            .map_err(|e| BackendError::Verification {
                message: e.to_string(),
            })
    }

    /// Write LLVM IR to file
    pub fn write_llvm_ir(&self, path: &Path) -> Result<(), BackendError> {
        self.module
            .print_to_file(path)
            .map_err(|e| BackendError::Emit {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Write LLVM bitcode to file
    pub fn write_bitcode(&self, path: &Path) -> Result<(), BackendError> {
        if self.module.write_bitcode_to_path(path) {
            Ok(())
        } else {
            Err(BackendError::Emit {
                path: path.to_path_buf(),
                message: "LLVM could not write bitcode".to_string(),
            })
        }
    }

    /// Write a native object file for the host target
    pub fn write_object_file(&self, path: &Path) -> Result<(), BackendError> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|message| BackendError::TargetInit { message })?;

        let target_triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&target_triple).map_err(|e| BackendError::TargetInit {
            message: e.to_string(),
        })?;

        // No optimization passes: the module is lowered as generated.
        let target_machine = target
            .create_target_machine(
                &target_triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| BackendError::TargetInit {
                message: format!("no target machine for {:?}", target_triple),
            })?;

        self.module.set_triple(&target_triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());

        log::debug!("writing object file {:?} for {:?}", path, target_triple);
        target_machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| BackendError::Emit {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// `int printf(ptr, ...)`, declared on first use
    fn printf(&self) -> FunctionValue<'ctx> {
        self.module.get_function(PRINTF).unwrap_or_else(|| {
            let ptr_type = self.context.ptr_type(AddressSpace::default());
            let printf_type = self.context.i32_type().fn_type(&[ptr_type.into()], true);
            self.module
                .add_function(PRINTF, printf_type, Some(Linkage::External))
        })
    }

    /// Global `"%d\n"` string, created once per module
    fn int_format(&mut self) -> CodegenResult<PointerValue<'ctx>> {
        if let Some(format) = self.int_format {
            return Ok(format);
        }
        let format = self
            .builder
            .build_global_string_ptr(INT_FORMAT, "fmt")?
            .as_pointer_value();
        self.int_format = Some(format);
        Ok(format)
    }
}

impl<'ctx> IrBuilder for LlvmModule<'ctx> {
    type Function = FunctionValue<'ctx>;
    type Slot = PointerValue<'ctx>;
    type Value = IntValue<'ctx>;

    fn declare_function(&mut self, name: &str) -> CodegenResult<FunctionValue<'ctx>> {
        if name == PRINTF {
            return Err(CodegenError::Builder {
                message: format!("`{}` is reserved for the output runtime", name),
            });
        }
        if self.module.get_function(name).is_some() {
            return Err(CodegenError::Builder {
                message: format!("symbol `{}` is already defined in this module", name),
            });
        }
        let fn_type = self.context.i32_type().fn_type(&[], false);
        Ok(self
            .module
            .add_function(name, fn_type, Some(Linkage::External)))
    }

    fn append_entry_block(&mut self, function: FunctionValue<'ctx>) -> CodegenResult<()> {
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        Ok(())
    }

    fn allocate_slot(&mut self, name: &str) -> CodegenResult<PointerValue<'ctx>> {
        Ok(self.builder.build_alloca(self.context.i32_type(), name)?)
    }

    fn store_constant(&mut self, slot: PointerValue<'ctx>, value: i32) -> CodegenResult<()> {
        let constant = self.context.i32_type().const_int(value as u64, true);
        self.builder.build_store(slot, constant)?;
        Ok(())
    }

    fn load_slot(&mut self, slot: PointerValue<'ctx>, name: &str) -> CodegenResult<IntValue<'ctx>> {
        let value = self
            .builder
            .build_load(self.context.i32_type(), slot, name)?;
        Ok(value.into_int_value())
    }

    fn call_print_int(&mut self, value: IntValue<'ctx>) -> CodegenResult<()> {
        let printf = self.printf();
        let format = self.int_format()?;
        self.builder
            .build_call(printf, &[format.into(), value.into()], "")?;
        Ok(())
    }

    fn return_int(&mut self, value: i32) -> CodegenResult<()> {
        let constant = self.context.i32_type().const_int(value as u64, true);
        self.builder.build_return(Some(&constant))?;
        Ok(())
    }

    fn finish_function(&mut self, function: FunctionValue<'ctx>) -> CodegenResult<()> {
        if function.verify(true) {
            Ok(())
        } else {
            Err(CodegenError::Builder {
                message: format!(
                    "function verification failed: {}",
                    function.get_name().to_string_lossy()
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_creation() {
        let context = Context::create();
        let module = LlvmModule::new(&context, "test_module");
        assert_eq!(module.module().get_name().to_str().unwrap(), "test_module");
    }

    #[test]
    fn test_printf_declared_once() {
        let context = Context::create();
        let mut module = LlvmModule::new(&context, "printf_once");
        let f = module.declare_function("f").unwrap();
        module.append_entry_block(f).unwrap();
        let slot = module.allocate_slot("a").unwrap();
        module.store_constant(slot, 4).unwrap();
        for _ in 0..2 {
            let v = module.load_slot(slot, "a").unwrap();
            module.call_print_int(v).unwrap();
        }
        module.return_int(0).unwrap();
        module.finish_function(f).unwrap();

        let ir = module.print_to_string();
        assert_eq!(ir.matches("declare i32 @printf").count(), 1);
        assert_eq!(ir.matches("@fmt = ").count(), 1);
        assert!(module.verify().is_ok());
    }
}
