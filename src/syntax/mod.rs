/**
minic-codegen | syntax/mod.rs
The typed syntax tree and resolved symbol table handed over by semantic analysis.
Both are read-only for the code generator.
*/

pub mod ast;
pub mod pretty;
pub mod symbols;

pub use ast::*;
pub use pretty::PrettyPrint;
pub use symbols::*;
