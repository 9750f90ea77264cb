/**
minic-codegen | assembly/ast.rs
Operand and instruction model for the 32-bit AT&T target.
Rendering lives in emit.rs.
*/

/// Operand size of an instruction: byte (`b` suffix, `%al`) or long (`l` suffix, `%eax`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Byte,
    Long,
}

impl Width {
    pub fn suffix(self) -> &'static str {
        match self {
            Width::Byte => "b",
            Width::Long => "l",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterIdentifier {
    AX,
    BX,
    CX,
    DX,
    SI,
    DI,
    BP,
    SP,
}

/// Represents an operand in an instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(RegisterIdentifier),
    /// `offset(%base)`
    Memory { base: RegisterIdentifier, offset: i32 },
    Immediate(i32),
    /// Address of a label, used as an immediate (`$SL0`).
    LabelAddress(String),
}

impl Operand {
    /// The accumulator, through which every expression result passes.
    pub const ACC: Operand = Operand::Register(RegisterIdentifier::AX);
    /// Holds the left operand of a binary expression.
    pub const SECONDARY: Operand = Operand::Register(RegisterIdentifier::DX);
    /// Divisor scratch; `%edx` is taken by the dividend's high half.
    pub const SCRATCH: Operand = Operand::Register(RegisterIdentifier::CX);

    /// A slot addressed from the frame pointer.
    pub fn frame(offset: i32) -> Operand {
        Operand::Memory { base: RegisterIdentifier::BP, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionalCode {
    E, NE, G, GE, L, LE
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Imul,
    And,
    Or,
}

/// A single instruction or directive line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssemblyInstruction {
    Mov(Width, Operand, Operand),
    /// `movsbl`: sign-extend a byte into a long.
    MovSignExtend(Operand, Operand),
    /// `movzbl`: zero-extend a byte into a long.
    MovZeroExtend(Operand, Operand),
    Lea(Operand, Operand),
    Binary(ArithmeticOp, Width, Operand, Operand),
    /// One-operand `imulb`: `%ax = %al * src`.
    MulByte(Operand),
    Idiv(Width, Operand),
    /// Sign-extend `%eax` into `%edx:%eax`.
    Cltd,
    /// Sign-extend `%al` into `%ax`.
    Cbtw,
    Neg(Width, Operand),
    Cmp(Width, Operand, Operand),
    SetCC(ConditionalCode, Operand),
    Xchg(Width, Operand, Operand),
    Push(Operand),
    Pop(Operand),
    Call(String),
    Jmp(String),
    JmpCC(ConditionalCode, String),
    Label(String),
    Leave,
    Ret,
    Globl(String),
    /// `.ascii "text\0"`
    Ascii(String),
}
