/**
minic-codegen | assembly/mod.rs
This module holds the assembly-generating logic, including:
    - Operand and instruction model (ast.rs) and its rendering (emit.rs)
    - Stack frame allocation (alloc.rs) and the string literal pool (literals.rs)
    - Lowering of the syntax tree (lower.rs)
*/

pub mod ast;
pub mod alloc;
pub mod emit;
pub mod literals;
pub mod lower;

pub use ast::*;
pub use emit::{AssemblyGeneration, EmissionLog};
pub use lower::CodeGenerator;
