use crate::compile_error::{CompileError, CompileResult};
use crate::syntax::{BlockId, FunctionId, NodeId, VarId, VariableType};

/**
minic-codegen | syntax/symbols.rs
Resolved symbols: functions with their assembly labels, variables with their
declared type and owning block, and the string literals needing data storage.
*/

pub struct FunctionSymbol {
    pub name: String,
    pub asm_label: String,
    pub parameters: Vec<VarId>,
}

pub struct VariableSymbol {
    pub name: String,
    pub ty: VariableType,
    pub block: BlockId,
}

pub struct StringLiteral {
    pub node: NodeId,
    pub text: String,
}

#[derive(Default)]
pub struct SymbolTable {
    functions: Vec<FunctionSymbol>,
    variables: Vec<VariableSymbol>,
    literals: Vec<StringLiteral>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, symbol: FunctionSymbol) -> FunctionId {
        self.functions.push(symbol);
        FunctionId(self.functions.len() as u32 - 1)
    }

    pub fn add_variable(&mut self, name: impl Into<String>, ty: VariableType, block: BlockId) -> VarId {
        self.variables.push(VariableSymbol { name: name.into(), ty, block });
        VarId(self.variables.len() as u32 - 1)
    }

    pub fn add_literal(&mut self, node: NodeId, text: impl Into<String>) {
        self.literals.push(StringLiteral { node, text: text.into() });
    }

    pub fn function(&self, id: FunctionId) -> CompileResult<&FunctionSymbol> {
        self.functions
            .get(id.0 as usize)
            .ok_or(CompileError::UnknownFunction(id))
    }

    pub fn variable(&self, id: VarId) -> CompileResult<&VariableSymbol> {
        self.variables
            .get(id.0 as usize)
            .ok_or(CompileError::UnknownVariable(id))
    }

    /// Function symbols in declaration order.
    pub fn functions(&self) -> &[FunctionSymbol] {
        &self.functions
    }

    /// String literals in enumeration order.
    pub fn literals(&self) -> &[StringLiteral] {
        &self.literals
    }
}
