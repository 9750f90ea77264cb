//! Code generation backend of the MiniC compiler.
//!
//! Takes the typed syntax tree and the symbol table produced by semantic analysis
//! and lowers them to 32-bit x86 assembly in GAS/AT&T syntax:
//! - `syntax` holds the input data model.
//! - `assembly` holds the operand/instruction model, the stack frame allocator,
//!   the literal pool and the lowering rules.
//! - `compile_error` and `options` are shared by both.

pub mod assembly;
pub mod compile_error;
pub mod options;
pub mod syntax;

pub use compile_error::{CompileError, CompileResult};
pub use options::CodegenOptions;

use assembly::CodeGenerator;
use syntax::{Program, SymbolTable};

/// Compile one unit into assembly text. Every call starts from fresh frames,
/// literal labels and branch-label counters.
pub fn generate_assembly(program: &Program, symbols: &SymbolTable, options: &CodegenOptions) -> CompileResult<String> {
    CodeGenerator::new(symbols, options).generate(program)
}
