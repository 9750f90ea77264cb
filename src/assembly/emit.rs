use crate::assembly::AssemblyInstruction::*;
use crate::assembly::{ArithmeticOp, AssemblyInstruction, ConditionalCode, Operand, RegisterIdentifier, Width};

/**
minic-codegen | assembly/emit.rs
Renders the instruction model as GAS/AT&T text and collects the rendered lines.
*/

/// Generate proper Assembly code for oneself
pub trait AssemblyGeneration {
    /// Generate proper Assembly code from this struct
    fn to_assembly(&self) -> String;
}

pub trait WidthSpecificAssemblyGeneration {
    fn to_assembly(&self, width: Width) -> String;
}

impl AssemblyGeneration for AssemblyInstruction {
    fn to_assembly(&self) -> String {
        match self {
            Mov(width, src, dest) => {
                format!("\tmov{} {}, {}", width.suffix(), src.to_assembly(*width), dest.to_assembly(*width))
            },
            MovSignExtend(src, dest) => {
                format!("\tmovsbl {}, {}", src.to_assembly(Width::Byte), dest.to_assembly(Width::Long))
            },
            MovZeroExtend(src, dest) => {
                format!("\tmovzbl {}, {}", src.to_assembly(Width::Byte), dest.to_assembly(Width::Long))
            },
            Lea(src, dest) => {
                format!("\tleal {}, {}", src.to_assembly(Width::Long), dest.to_assembly(Width::Long))
            },
            Binary(op, width, src, dest) => {
                let mnem = match op {
                    ArithmeticOp::Add => "add",
                    ArithmeticOp::Sub => "sub",
                    ArithmeticOp::Imul => "imul",
                    ArithmeticOp::And => "and",
                    ArithmeticOp::Or => "or",
                };
                format!("\t{}{} {}, {}", mnem, width.suffix(), src.to_assembly(*width), dest.to_assembly(*width))
            },
            MulByte(src) => {
                format!("\timulb {}", src.to_assembly(Width::Byte))
            },
            Idiv(width, divisor) => {
                format!("\tidiv{} {}", width.suffix(), divisor.to_assembly(*width))
            },
            Cltd => "\tcltd".to_string(),
            Cbtw => "\tcbtw".to_string(),
            Neg(width, operand) => {
                format!("\tneg{} {}", width.suffix(), operand.to_assembly(*width))
            },
            Cmp(width, left, right) => {
                format!("\tcmp{} {}, {}", width.suffix(), left.to_assembly(*width), right.to_assembly(*width))
            },
            SetCC(cond, operand) => {
                format!("\tset{} {}", cond.suffix(), operand.to_assembly(Width::Byte))
            },
            Xchg(width, left, right) => {
                format!("\txchg{} {}, {}", width.suffix(), left.to_assembly(*width), right.to_assembly(*width))
            },
            Push(operand) => {
                format!("\tpushl {}", operand.to_assembly(Width::Long))
            },
            Pop(operand) => {
                format!("\tpopl {}", operand.to_assembly(Width::Long))
            },
            Call(target) => format!("\tcall {}", target),
            Jmp(target) => format!("\tjmp {}", target),
            JmpCC(cond, target) => format!("\tj{} {}", cond.suffix(), target),
            Label(name) => format!("{}:", name),
            Leave => "\tleave".to_string(),
            Ret => "\tret".to_string(),
            Globl(name) => format!("\t.globl {}", name),
            Ascii(text) => format!("\t.ascii \"{}\\0\"", text),
        }
    }
}

impl WidthSpecificAssemblyGeneration for Operand {
    fn to_assembly(&self, width: Width) -> String {
        match self {
            Operand::Register(identifier) => {
                format!("%{}", identifier.to_assembly(width))
            },
            Operand::Memory { base, offset: 0 } => {
                format!("(%{})", base.to_assembly(Width::Long))
            },
            Operand::Memory { base, offset } => {
                format!("{}(%{})", offset, base.to_assembly(Width::Long))
            },
            Operand::Immediate(imm) => {
                format!("${}", imm)
            },
            Operand::LabelAddress(label) => {
                format!("${}", label)
            },
        }
    }
}

impl WidthSpecificAssemblyGeneration for RegisterIdentifier {
    fn to_assembly(&self, width: Width) -> String {
        match width {
            Width::Long => match self {
                RegisterIdentifier::AX => "eax".to_string(),
                RegisterIdentifier::BX => "ebx".to_string(),
                RegisterIdentifier::CX => "ecx".to_string(),
                RegisterIdentifier::DX => "edx".to_string(),
                RegisterIdentifier::SI => "esi".to_string(),
                RegisterIdentifier::DI => "edi".to_string(),
                RegisterIdentifier::BP => "ebp".to_string(),
                RegisterIdentifier::SP => "esp".to_string(),
            },

            // Only the legacy a/b/c/d registers have byte halves in 32-bit mode.
            Width::Byte => match self {
                RegisterIdentifier::AX => "al".to_string(),
                RegisterIdentifier::BX => "bl".to_string(),
                RegisterIdentifier::CX => "cl".to_string(),
                RegisterIdentifier::DX => "dl".to_string(),
                other => other.to_assembly(Width::Long),
            },
        }
    }
}

impl ConditionalCode {
    pub fn suffix(&self) -> &'static str {
        match self {
            ConditionalCode::E  => "e",
            ConditionalCode::NE => "ne",
            ConditionalCode::G  => "g",
            ConditionalCode::GE => "ge",
            ConditionalCode::L  => "l",
            ConditionalCode::LE => "le",
        }
    }
}

/// Ordered, append-only record of every emitted line. The compiled unit is the
/// join of these lines.
#[derive(Debug, Default)]
pub struct EmissionLog {
    lines: Vec<String>,
}

impl EmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::trace!("emit {}", line.trim_start());
        self.lines.push(line);
    }

    /// Render and append one instruction.
    pub fn instruction(&mut self, instruction: AssemblyInstruction) {
        self.emit(instruction.to_assembly());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Joins every line with `separator`; the last line is terminated as well.
    pub fn render(&self, separator: &str) -> String {
        let mut output = String::new();
        for line in &self.lines {
            output.push_str(line);
            output.push_str(separator);
        }
        output
    }
}
