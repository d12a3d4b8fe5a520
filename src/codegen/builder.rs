//! The narrow instruction-builder interface the code generator emits into.
//!
//! The generator only ever needs these operations, so any backend
//! that can provide them can host an Octa module: the in-memory
//! [`RecordingModule`](super::RecordingModule) used by tests and trace
//! output, and the LLVM-backed [`LlvmModule`](super::LlvmModule).

use crate::error::CodegenError;

pub type CodegenResult<T> = Result<T, CodegenError>;

pub trait IrBuilder {
    /// Handle of a declared function
    type Function: Copy;
    /// Handle of one integer storage slot
    type Slot: Copy;
    /// Handle of a loaded integer value
    type Value: Copy;

    /// Declare an externally linkable `i32 ()` function.
    fn declare_function(&mut self, name: &str) -> CodegenResult<Self::Function>;

    /// Append the entry block to `function` and make it the insertion point.
    fn append_entry_block(&mut self, function: Self::Function) -> CodegenResult<()>;

    /// Allocate stack storage for one integer.
    fn allocate_slot(&mut self, name: &str) -> CodegenResult<Self::Slot>;

    fn store_constant(&mut self, slot: Self::Slot, value: i32) -> CodegenResult<()>;

    fn load_slot(&mut self, slot: Self::Slot, name: &str) -> CodegenResult<Self::Value>;

    /// Print `value` followed by a newline.
    fn call_print_int(&mut self, value: Self::Value) -> CodegenResult<()>;

    /// Terminate the current block with `ret i32 value`.
    fn return_int(&mut self, value: i32) -> CodegenResult<()>;

    /// Called once the function body is complete.
    fn finish_function(&mut self, _function: Self::Function) -> CodegenResult<()> {
        Ok(())
    }
}
