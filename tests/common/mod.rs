//! Shared helpers for the integration tests: a small builder for typed trees and
//! an interpreter for the subset of 32-bit x86 the generator emits.

#![allow(dead_code)]

use std::collections::HashMap;

use minic_codegen::syntax::*;
use minic_codegen::{generate_assembly, CodegenOptions, CompileResult};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn options() -> CodegenOptions {
    CodegenOptions {
        line_separator: "\n".to_string(),
        ..CodegenOptions::default()
    }
}

/* ---------------- Tree builder ---------------- */

/// Builds a program and its symbol table side by side, handing out node and
/// block ids the way semantic analysis would.
#[derive(Default)]
pub struct TreeBuilder {
    pub symbols: SymbolTable,
    next_node: u32,
    next_block: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_id(&mut self) -> BlockId {
        self.next_block += 1;
        BlockId(self.next_block)
    }

    fn node(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    pub fn function(&mut self, name: &str, parameters: Vec<VarId>) -> FunctionId {
        self.symbols.add_function(FunctionSymbol {
            name: name.to_string(),
            asm_label: format!("_{}", name),
            parameters,
        })
    }

    pub fn variable(&mut self, name: &str, ty: VariableType, block: BlockId) -> VarId {
        self.symbols.add_variable(name, ty, block)
    }

    pub fn literal(&mut self, ty: VariableType, value: LiteralValue) -> Expression {
        let id = self.node();
        if let LiteralValue::String(text) = &value {
            self.symbols.add_literal(id, text.clone());
        }
        Expression::new(ty, ExpressionKind::Literal(Literal { id, value }))
    }

    pub fn int(&mut self, value: i32) -> Expression {
        self.literal(VariableType::Int, LiteralValue::Integer(value))
    }

    pub fn char(&mut self, value: char) -> Expression {
        self.literal(VariableType::Char, LiteralValue::Char(value))
    }

    pub fn boolean(&mut self, value: bool) -> Expression {
        self.literal(VariableType::Bool, LiteralValue::Bool(value))
    }

    pub fn string(&mut self, text: &str) -> Expression {
        self.literal(VariableType::Address, LiteralValue::String(text.to_string()))
    }

    pub fn generate(&self, statements: Vec<Statement>) -> CompileResult<String> {
        init_logging();
        generate_assembly(&Program { statements }, &self.symbols, &options())
    }
}

pub fn var(id: VarId, ty: VariableType) -> Expression {
    Expression::new(ty, ExpressionKind::Identifier(id))
}

pub fn assign(target: VarId, ty: VariableType, value: Expression) -> Expression {
    Expression::new(ty, ExpressionKind::Assignment { target, value: Box::new(value) })
}

pub fn binary(op: BinaryOperator, ty: VariableType, left: Expression, right: Expression) -> Expression {
    Expression::new(ty, ExpressionKind::Binary(op, Box::new(left), Box::new(right)))
}

pub fn unary(op: UnaryOperator, ty: VariableType, operand: Expression) -> Expression {
    Expression::new(ty, ExpressionKind::Unary(op, Box::new(operand)))
}

pub fn call(function: FunctionId, arguments: Vec<Expression>) -> Expression {
    Expression::new(VariableType::Int, ExpressionKind::Call { function, arguments })
}

pub fn block(id: BlockId, statements: Vec<Statement>) -> Block {
    Block { id, statements }
}

pub fn function_decl(symbol: FunctionId, arguments: &[VarId], body: Block) -> Statement {
    Statement::Function(FunctionDeclaration {
        symbol,
        arguments: arguments.iter().map(|&variable| FormalArgument { variable }).collect(),
        body,
    })
}

/* ---------------- Interpreter ---------------- */

const EAX: usize = 0;
const ECX: usize = 2;
const EDX: usize = 3;
const EBP: usize = 6;
const ESP: usize = 7;

const STACK_TOP: u32 = 0x0010_0000;
const DATA_BASE: u32 = 0x0000_1000;
const RETURN_SENTINEL: u32 = 0xFFFF_FFF0;
const STEP_LIMIT: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Size {
    Byte,
    Long,
}

#[derive(Clone, Debug, PartialEq)]
enum Arg {
    Reg(usize, Size),
    Mem(usize, i32),
    Imm(i32),
}

/// Executes emitted assembly. External routines (anything without a label in the
/// unit) are recorded instead of run, together with their stack arguments.
pub struct Machine {
    lines: Vec<String>,
    labels: HashMap<String, usize>,
    data: HashMap<String, u32>,
    strings: HashMap<u32, String>,
    regs: [u32; 8],
    memory: HashMap<u32, u8>,
    zf: bool,
    sf: bool,
    of: bool,
    /// External calls in order, with the first stack argument.
    pub external_calls: Vec<(String, u32)>,
    /// Every executed line, in order.
    pub trace: Vec<String>,
}

impl Machine {
    pub fn load(asm: &str) -> Self {
        let lines: Vec<String> = asm.lines().map(str::to_string).collect();
        let mut labels = HashMap::new();
        let mut data = HashMap::new();
        let mut strings = HashMap::new();
        let mut next_data = DATA_BASE;

        for (index, line) in lines.iter().enumerate() {
            if let Some(label) = line.strip_suffix(':') {
                labels.insert(label.trim().to_string(), index);
            }
            let trimmed = line.trim();
            if let Some(text) = trimmed.strip_prefix(".ascii \"") {
                let text = text.trim_end_matches('"').trim_end_matches("\\0");
                let label = lines[index - 1].trim_end_matches(':').to_string();
                data.insert(label, next_data);
                strings.insert(next_data, text.to_string());
                next_data += 0x100;
            }
        }

        Self {
            lines,
            labels,
            data,
            strings,
            regs: [0; 8],
            memory: HashMap::new(),
            zf: false,
            sf: false,
            of: false,
            external_calls: vec![],
            trace: vec![],
        }
    }

    pub fn string_at(&self, address: u32) -> Option<&str> {
        self.strings.get(&address).map(String::as_str)
    }

    pub fn data_address(&self, label: &str) -> u32 {
        self.data[label]
    }

    /// Calls `label` with `arguments` (cdecl) and returns `%eax`.
    pub fn call(&mut self, label: &str, arguments: &[i32]) -> i32 {
        self.regs[ESP] = STACK_TOP;
        self.regs[EBP] = 0xDEAD_BEEF;
        for &argument in arguments.iter().rev() {
            self.push(argument as u32);
        }
        self.push(RETURN_SENTINEL);

        let mut pc = self.labels[label] + 1;
        for _ in 0..STEP_LIMIT {
            let line = self.lines[pc].clone();
            pc += 1;
            if line.ends_with(':') {
                continue;
            }
            self.trace.push(line.trim().to_string());
            if let Some(next) = self.execute(line.trim(), pc) {
                if next == RETURN_SENTINEL as usize {
                    return self.regs[EAX] as i32;
                }
                pc = next;
            }
        }
        panic!("step limit reached in {}", label);
    }

    fn push(&mut self, value: u32) {
        self.regs[ESP] = self.regs[ESP].wrapping_sub(4);
        self.write(self.regs[ESP], value, Size::Long);
    }

    fn pop(&mut self) -> u32 {
        let value = self.read_mem(self.regs[ESP], Size::Long);
        self.regs[ESP] = self.regs[ESP].wrapping_add(4);
        value
    }

    fn read_mem(&self, address: u32, size: Size) -> u32 {
        let bytes = if size == Size::Long { 4 } else { 1 };
        (0..bytes).fold(0u32, |value, i| {
            let byte = *self.memory.get(&(address.wrapping_add(i))).unwrap_or(&0) as u32;
            value | (byte << (8 * i))
        })
    }

    fn write(&mut self, address: u32, value: u32, size: Size) {
        let bytes = if size == Size::Long { 4 } else { 1 };
        for i in 0..bytes {
            self.memory.insert(address.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    fn parse(&self, text: &str) -> Arg {
        let text = text.trim();
        if let Some(imm) = text.strip_prefix('$') {
            return match imm.parse::<i32>() {
                Ok(value) => Arg::Imm(value),
                Err(_) => Arg::Imm(self.data[imm] as i32),
            };
        }
        if let Some(reg) = text.strip_prefix('%') {
            return register(reg);
        }
        let open = text.find('(').expect("memory operand");
        let offset = if open == 0 { 0 } else { text[..open].parse().expect("offset") };
        match register(text[open + 1..].trim_end_matches(')').trim_start_matches('%')) {
            Arg::Reg(base, _) => Arg::Mem(base, offset),
            other => panic!("bad base {:?}", other),
        }
    }

    fn get(&self, arg: &Arg, size: Size) -> u32 {
        match *arg {
            Arg::Reg(r, Size::Byte) => self.regs[r] & 0xFF,
            Arg::Reg(r, Size::Long) => self.regs[r],
            Arg::Mem(base, offset) => self.read_mem(self.regs[base].wrapping_add(offset as u32), size),
            Arg::Imm(value) => value as u32 & mask(size),
        }
    }

    fn set(&mut self, arg: &Arg, value: u32, size: Size) {
        match *arg {
            Arg::Reg(r, Size::Byte) => self.regs[r] = (self.regs[r] & !0xFF) | (value & 0xFF),
            Arg::Reg(r, Size::Long) => self.regs[r] = value,
            Arg::Mem(base, offset) => {
                let address = self.regs[base].wrapping_add(offset as u32);
                self.write(address, value, size)
            }
            Arg::Imm(_) => panic!("store to immediate"),
        }
    }

    fn flags(&mut self, result: u32, size: Size, overflow: bool) {
        let result = result & mask(size);
        self.zf = result == 0;
        self.sf = result & sign_bit(size) != 0;
        self.of = overflow;
    }

    fn condition(&self, cc: &str) -> bool {
        match cc {
            "e" => self.zf,
            "ne" => !self.zf,
            "l" => self.sf != self.of,
            "le" => self.zf || self.sf != self.of,
            "g" => !self.zf && self.sf == self.of,
            "ge" => self.sf == self.of,
            other => panic!("condition {}", other),
        }
    }

    /// Runs one instruction; returns the new program counter for taken jumps.
    fn execute(&mut self, line: &str, pc: usize) -> Option<usize> {
        let (mnemonic, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args: Vec<Arg> = if rest.trim().is_empty() || mnemonic.starts_with('j') || mnemonic == "call" {
            vec![]
        } else if mnemonic.starts_with('.') {
            return None;
        } else {
            rest.split(',').map(|a| self.parse(a)).collect()
        };

        match mnemonic {
            "movl" | "movb" => {
                let size = suffix(mnemonic);
                let value = self.get(&args[0], size);
                self.set(&args[1], value, size);
            }
            "movsbl" => {
                let value = self.get(&args[0], Size::Byte) as u8 as i8 as i32 as u32;
                self.set(&args[1], value, Size::Long);
            }
            "movzbl" => {
                let value = self.get(&args[0], Size::Byte);
                self.set(&args[1], value, Size::Long);
            }
            "leal" => match args[0] {
                Arg::Mem(base, offset) => {
                    let address = self.regs[base].wrapping_add(offset as u32);
                    self.set(&args[1], address, Size::Long);
                }
                _ => panic!("leal needs memory"),
            },
            "addl" | "addb" | "subl" | "subb" => {
                let size = suffix(mnemonic);
                let src = signed(self.get(&args[0], size), size);
                let dst = signed(self.get(&args[1], size), size);
                let (result, overflow) = if mnemonic.starts_with("add") {
                    add_overflow(dst, src, size)
                } else {
                    add_overflow(dst, src.wrapping_neg(), size)
                };
                self.set(&args[1], result as u32, size);
                self.flags(result as u32, size, overflow);
            }
            "andl" | "andb" | "orl" | "orb" => {
                let size = suffix(mnemonic);
                let src = self.get(&args[0], size);
                let dst = self.get(&args[1], size);
                let result = if mnemonic.starts_with("and") { dst & src } else { dst | src };
                self.set(&args[1], result, size);
                self.flags(result, size, false);
            }
            "imull" => {
                let result = (self.get(&args[1], Size::Long) as i32).wrapping_mul(self.get(&args[0], Size::Long) as i32);
                self.set(&args[1], result as u32, Size::Long);
            }
            "imulb" => {
                let product = (self.regs[EAX] as u8 as i8 as i16) * (self.get(&args[0], Size::Byte) as u8 as i8 as i16);
                self.regs[EAX] = (self.regs[EAX] & !0xFFFF) | (product as u16 as u32);
            }
            "cltd" => {
                self.regs[EDX] = if (self.regs[EAX] as i32) < 0 { u32::MAX } else { 0 };
            }
            "cbtw" => {
                let extended = self.regs[EAX] as u8 as i8 as i16 as u16 as u32;
                self.regs[EAX] = (self.regs[EAX] & !0xFFFF) | extended;
            }
            "idivl" => {
                let dividend = ((self.regs[EDX] as u64) << 32 | self.regs[EAX] as u64) as i64;
                let divisor = self.get(&args[0], Size::Long) as i32 as i64;
                self.regs[EAX] = (dividend / divisor) as i32 as u32;
                self.regs[EDX] = (dividend % divisor) as i32 as u32;
            }
            "idivb" => {
                let dividend = self.regs[EAX] as u16 as i16;
                let divisor = self.get(&args[0], Size::Byte) as u8 as i8 as i16;
                let quotient = (dividend / divisor) as u8 as u32;
                let remainder = (dividend % divisor) as u8 as u32;
                self.regs[EAX] = (self.regs[EAX] & !0xFFFF) | (remainder << 8) | quotient;
            }
            "negl" | "negb" => {
                let size = suffix(mnemonic);
                let value = signed(self.get(&args[0], size), size);
                let (result, overflow) = add_overflow(0, value.wrapping_neg(), size);
                self.set(&args[0], result as u32, size);
                self.flags(result as u32, size, overflow || value == min(size));
            }
            "cmpl" | "cmpb" => {
                let size = suffix(mnemonic);
                let src = signed(self.get(&args[0], size), size);
                let dst = signed(self.get(&args[1], size), size);
                let (result, overflow) = sub_overflow(dst, src, size);
                self.flags(result as u32, size, overflow);
            }
            "xchgl" | "xchgb" => {
                let size = suffix(mnemonic);
                let a = self.get(&args[0], size);
                let b = self.get(&args[1], size);
                self.set(&args[0], b, size);
                self.set(&args[1], a, size);
            }
            "pushl" => {
                let value = self.get(&args[0], Size::Long);
                self.push(value);
            }
            "popl" => {
                let value = self.pop();
                self.set(&args[0], value, Size::Long);
            }
            "call" => {
                let target = rest.trim();
                match self.labels.get(target) {
                    Some(&index) => {
                        self.push(pc as u32);
                        return Some(index + 1);
                    }
                    None => {
                        let argument = self.read_mem(self.regs[ESP], Size::Long);
                        self.external_calls.push((target.to_string(), argument));
                        // External routines clobber the caller-saved registers.
                        self.regs[EAX] = 0x5555_5555;
                        self.regs[ECX] = 0x5555_5555;
                        self.regs[EDX] = 0x5555_5555;
                    }
                }
            }
            "leave" => {
                self.regs[ESP] = self.regs[EBP];
                self.regs[EBP] = self.pop();
            }
            "ret" => return Some(self.pop() as usize),
            "jmp" => return Some(self.labels[rest.trim()] + 1),
            jump if jump.starts_with('j') => {
                if self.condition(&jump[1..]) {
                    return Some(self.labels[rest.trim()] + 1);
                }
            }
            set if set.starts_with("set") => {
                let value = self.condition(&set[3..]) as u32;
                self.set(&args[0], value, Size::Byte);
            }
            other => panic!("unsupported instruction {}", other),
        }
        None
    }
}

fn register(name: &str) -> Arg {
    let (index, size) = match name {
        "eax" => (0, Size::Long),
        "ebx" => (1, Size::Long),
        "ecx" => (2, Size::Long),
        "edx" => (3, Size::Long),
        "esi" => (4, Size::Long),
        "edi" => (5, Size::Long),
        "ebp" => (6, Size::Long),
        "esp" => (7, Size::Long),
        "al" => (0, Size::Byte),
        "bl" => (1, Size::Byte),
        "cl" => (2, Size::Byte),
        "dl" => (3, Size::Byte),
        other => panic!("unknown register {}", other),
    };
    Arg::Reg(index, size)
}

fn suffix(mnemonic: &str) -> Size {
    if mnemonic.ends_with('b') {
        Size::Byte
    } else {
        Size::Long
    }
}

fn mask(size: Size) -> u32 {
    match size {
        Size::Byte => 0xFF,
        Size::Long => u32::MAX,
    }
}

fn sign_bit(size: Size) -> u32 {
    match size {
        Size::Byte => 0x80,
        Size::Long => 0x8000_0000,
    }
}

fn min(size: Size) -> i64 {
    match size {
        Size::Byte => i8::MIN as i64,
        Size::Long => i32::MIN as i64,
    }
}

fn signed(value: u32, size: Size) -> i64 {
    match size {
        Size::Byte => value as u8 as i8 as i64,
        Size::Long => value as i32 as i64,
    }
}

fn wrap(value: i64, size: Size) -> (i64, bool) {
    let wrapped = match size {
        Size::Byte => value as i8 as i64,
        Size::Long => value as i32 as i64,
    };
    (wrapped, wrapped != value)
}

fn add_overflow(a: i64, b: i64, size: Size) -> (i64, bool) {
    wrap(a + b, size)
}

fn sub_overflow(a: i64, b: i64, size: Size) -> (i64, bool) {
    wrap(a - b, size)
}
