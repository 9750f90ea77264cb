use std::fmt;

/// Identity of a literal node, assigned upstream and stable across tree rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Identity of a lexical block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// Index of a variable symbol in the [`SymbolTable`](super::SymbolTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// Index of a function symbol in the [`SymbolTable`](super::SymbolTable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "block{}", self.0)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// Value types known to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableType {
    Int,
    Char,
    Bool,
    Float,
    /// Strings and other pointer-sized values.
    Address,
}

impl VariableType {
    /// Bytes reserved on the stack for a variable of this type.
    /// Characters get a full slot of their own rather than being packed.
    pub fn slot_size(self) -> i32 {
        4
    }

    /// Usual arithmetic promotion: float dominates int, int dominates char.
    /// Booleans and addresses promote like integers.
    pub fn promote(self, other: VariableType) -> VariableType {
        use VariableType::*;
        match (self, other) {
            (Float, _) | (_, Float) => Float,
            (Char, Char) => Char,
            _ => Int,
        }
    }
}

pub struct Program {
    pub statements: Vec<Statement>,
}

pub struct Block {
    pub id: BlockId,
    pub statements: Vec<Statement>,
}

pub struct FunctionDeclaration {
    pub symbol: FunctionId,
    pub arguments: Vec<FormalArgument>,
    pub body: Block,
}

pub struct FormalArgument {
    pub variable: VarId,
}

pub enum Statement {
    Function(FunctionDeclaration),
    /// A variable declaration with one or more declarators.
    Variable(Vec<VarId>),
    Block(Block),
    If {
        test: Expression,
        body: Block,
    },
    For {
        init: Expression,
        test: Expression,
        step: Option<Expression>,
        body: Block,
    },
    While {
        test: Expression,
        body: Block,
    },
    Return(Option<Expression>),
    Expression(Expression),
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Function(_) => "function declaration",
            Statement::Variable(_) => "variable declaration",
            Statement::Block(_) => "block",
            Statement::If { .. } => "if statement",
            Statement::For { .. } => "for statement",
            Statement::While { .. } => "while statement",
            Statement::Return(_) => "return statement",
            Statement::Expression(_) => "expression statement",
        }
    }
}

/// An expression annotated with the type semantic analysis resolved for it.
pub struct Expression {
    pub ty: VariableType,
    pub kind: ExpressionKind,
}

pub enum ExpressionKind {
    Identifier(VarId),
    Literal(Literal),
    Assignment {
        target: VarId,
        value: Box<Expression>,
    },
    Binary(BinaryOperator, Box<Expression>, Box<Expression>),
    Unary(UnaryOperator, Box<Expression>),
    Call {
        function: FunctionId,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn new(ty: VariableType, kind: ExpressionKind) -> Self {
        Self { ty, kind }
    }
}

pub struct Literal {
    pub id: NodeId,
    pub value: LiteralValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Integer(i32),
    Char(char),
    Bool(bool),
    Null,
    Float(f32),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
    AddressOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus, Minus, Multiply, Divide,
    And, Or,
    Equal, NotEqual, LessThan, LessEqual, GreaterThan, GreaterEqual,
}

impl BinaryOperator {
    pub fn is_relational(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Equal | NotEqual | LessThan | LessEqual | GreaterThan | GreaterEqual)
    }
}
