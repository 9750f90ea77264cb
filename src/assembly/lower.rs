use log::debug;

use crate::assembly::alloc::StackFrameAllocator;
use crate::assembly::emit::EmissionLog;
use crate::assembly::literals::LiteralPool;
use crate::assembly::ArithmeticOp::{Add, And, Imul, Or, Sub};
use crate::assembly::AssemblyInstruction::*;
use crate::assembly::ConditionalCode::{E, G, GE, L, LE, NE};
use crate::assembly::Operand::{Immediate, LabelAddress, Register};
use crate::assembly::RegisterIdentifier::{BP, SP};
use crate::assembly::{ConditionalCode, Operand, Width};
use crate::compile_error::{CompileError, CompileResult};
use crate::options::CodegenOptions;
use crate::syntax::{
    BinaryOperator, Block, Expression, ExpressionKind, FunctionDeclaration, FunctionId, Literal, LiteralValue,
    Program, Statement, SymbolTable, UnaryOperator, VarId, VariableType,
};

/**
minic-codegen | assembly/lower.rs
Lowers the typed syntax tree straight into emitted assembly lines.
Every expression leaves its value in the accumulator (%eax, or %al for byte values).
*/

const ACC: Operand = Operand::ACC;
const SECONDARY: Operand = Operand::SECONDARY;
const SCRATCH: Operand = Operand::SCRATCH;

/// Per-construct counters that keep branch labels unique within one unit.
#[derive(Debug, Default)]
struct LabelCounters {
    if_count: usize,
    for_count: usize,
    while_count: usize,
}

#[derive(Clone, Copy)]
enum Loop {
    For,
    While,
}

impl LabelCounters {
    fn next_if(&mut self) -> String {
        let label = format!("L_endif{}", self.if_count);
        self.if_count += 1;
        label
    }

    /// Returns the (header, end) labels of the next loop of this kind.
    fn next_loop(&mut self, kind: Loop) -> (String, String) {
        match kind {
            Loop::For => {
                let n = self.for_count;
                self.for_count += 1;
                (format!("L_for{}", n), format!("L_endfor{}", n))
            }
            Loop::While => {
                let n = self.while_count;
                self.while_count += 1;
                (format!("L_while{}", n), format!("L_endwhile{}", n))
            }
        }
    }
}

/// Width a variable of this type is loaded and stored with.
fn storage_width(ty: VariableType) -> Width {
    match ty {
        VariableType::Char => Width::Byte,
        _ => Width::Long,
    }
}

/// Whether lowering `expr` may overwrite the secondary register.
fn clobbers_secondary(expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::Binary(..) | ExpressionKind::Call { .. } => true,
        ExpressionKind::Assignment { value, .. } => clobbers_secondary(value),
        ExpressionKind::Unary(_, operand) => clobbers_secondary(operand),
        ExpressionKind::Identifier(_) | ExpressionKind::Literal(_) => false,
    }
}

fn condition_code(op: BinaryOperator) -> Option<ConditionalCode> {
    match op {
        BinaryOperator::Equal => Some(E),
        BinaryOperator::NotEqual => Some(NE),
        BinaryOperator::LessThan => Some(L),
        BinaryOperator::LessEqual => Some(LE),
        BinaryOperator::GreaterThan => Some(G),
        BinaryOperator::GreaterEqual => Some(GE),
        _ => None,
    }
}

/// Code generator for one compilation unit. It is consumed by [`CodeGenerator::generate`],
/// so frames, pooled literals and label counters never outlive the unit.
pub struct CodeGenerator<'a> {
    symbols: &'a SymbolTable,
    options: &'a CodegenOptions,
    frames: StackFrameAllocator,
    literals: LiteralPool,
    log: EmissionLog,
    labels: LabelCounters,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(symbols: &'a SymbolTable, options: &'a CodegenOptions) -> Self {
        Self {
            symbols,
            options,
            frames: StackFrameAllocator::new(),
            literals: LiteralPool::new(),
            log: EmissionLog::new(),
            labels: LabelCounters::default(),
        }
    }

    /// Emits the literal section, the global directives and every top-level
    /// declaration, in that order, and returns the rendered unit.
    pub fn generate(mut self, program: &Program) -> CompileResult<String> {
        log::trace!("syntax tree:\n{}", program);
        let symbols = self.symbols;

        for literal in symbols.literals() {
            self.literals.register(literal, &mut self.log);
        }
        self.literals.register_pause(&self.options.pause_command, &mut self.log);

        for function in symbols.functions() {
            self.log.instruction(Globl(function.asm_label.clone()));
        }

        for statement in &program.statements {
            self.lower_top_level(statement)?;
        }

        debug!(
            "generated {} lines for {} functions",
            self.log.lines().len(),
            symbols.functions().len()
        );
        Ok(self.log.render(&self.options.line_separator))
    }

    fn lower_top_level(&mut self, statement: &Statement) -> CompileResult<()> {
        match statement {
            Statement::Function(function) => self.lower_function(function),
            other => Err(CompileError::UnsupportedNode {
                kind: other.kind_name(),
                context: "outside a function body",
            }),
        }
    }

    /* ---------------- Frames ---------------- */

    /// Gives every argument and local of `function` a slot and returns the number
    /// of bytes the prologue has to reserve.
    fn allocate_frame(&mut self, function: &FunctionDeclaration) -> CompileResult<i32> {
        for argument in &function.arguments {
            let symbol = self.symbols.variable(argument.variable)?;
            self.frames.allocate(symbol.block, symbol.ty, argument.variable);
        }
        // Arguments may live in their own block; the body's locals go below them.
        for argument in &function.arguments {
            let block = self.symbols.variable(argument.variable)?.block;
            if block != function.body.id {
                self.frames.open_nested(function.body.id, block);
            }
        }

        let mut reserved = self.frames.extent(function.body.id);
        self.allocate_locals(&function.body, &mut reserved)?;
        Ok(reserved)
    }

    fn allocate_locals(&mut self, block: &Block, reserved: &mut i32) -> CompileResult<()> {
        for statement in &block.statements {
            match statement {
                Statement::Variable(variables) => {
                    for &variable in variables {
                        let symbol = self.symbols.variable(variable)?;
                        self.frames.allocate(symbol.block, symbol.ty, variable);
                        *reserved = (*reserved).max(self.frames.extent(symbol.block));
                    }
                }
                Statement::Block(inner)
                | Statement::If { body: inner, .. }
                | Statement::For { body: inner, .. }
                | Statement::While { body: inner, .. } => {
                    self.frames.open_nested(inner.id, block.id);
                    self.allocate_locals(inner, reserved)?;
                }
                Statement::Function(_) | Statement::Return(_) | Statement::Expression(_) => {}
            }
        }

        *reserved = (*reserved).max(self.frames.extent(block.id));
        Ok(())
    }

    fn slot(&self, variable: VarId) -> CompileResult<(Operand, VariableType)> {
        let symbol = self.symbols.variable(variable)?;
        let offset = self.frames.offset_of(variable, symbol.block, &symbol.name)?;
        Ok((Operand::frame(offset), symbol.ty))
    }

    /* ---------------- Functions ---------------- */

    fn lower_function(&mut self, function: &FunctionDeclaration) -> CompileResult<()> {
        let symbols = self.symbols;
        let symbol = symbols.function(function.symbol)?;
        let reserved = self.allocate_frame(function)?;
        let is_entry = symbol.name == self.options.entry_point;
        debug!("lowering {} as {} ({} bytes of locals)", symbol.name, symbol.asm_label, reserved);

        self.log.instruction(Label(symbol.asm_label.clone()));
        self.log.instruction(Push(Register(BP)));
        self.log.instruction(Mov(Width::Long, Register(SP), Register(BP)));
        self.log.instruction(Binary(And, Width::Long, Immediate(-16), Register(SP)));
        if reserved != 0 {
            self.log.instruction(Binary(Sub, Width::Long, Immediate(reserved), Register(SP)));
        }

        if is_entry {
            self.log.instruction(Call(self.options.init_routine.clone()));
        }

        // Arguments arrive above the return address; copy them into their slots.
        for (index, argument) in function.arguments.iter().enumerate() {
            let (slot, ty) = self.slot(argument.variable)?;
            let width = storage_width(ty);
            let incoming = Operand::frame(8 + 4 * index as i32);
            self.log.instruction(Mov(width, incoming, ACC));
            self.log.instruction(Mov(width, ACC, slot));
        }

        for statement in &function.body.statements {
            self.lower_statement(statement, is_entry)?;
        }

        if !matches!(function.body.statements.last(), Some(Statement::Return(_))) {
            self.epilogue();
        }
        Ok(())
    }

    fn epilogue(&mut self) {
        self.log.instruction(Leave);
        self.log.instruction(Ret);
    }

    /// Calls the halt routine with the pause string, keeping the return value.
    fn pause(&mut self) -> CompileResult<()> {
        let label = self.literals.pause_label()?.to_string();
        self.log.instruction(Push(ACC));
        self.log.instruction(Push(LabelAddress(label)));
        self.log.instruction(Call(self.options.pause_routine.clone()));
        self.log.instruction(Binary(Add, Width::Long, Immediate(4), Register(SP)));
        self.log.instruction(Pop(ACC));
        Ok(())
    }

    /* ---------------- Statements ---------------- */

    /// `entry_body` is set only for statements sitting directly in the entry
    /// point's body; their returns run the halt routine first.
    fn lower_statement(&mut self, statement: &Statement, entry_body: bool) -> CompileResult<()> {
        match statement {
            Statement::Function(_) => {
                return Err(CompileError::UnsupportedNode {
                    kind: statement.kind_name(),
                    context: "inside a function body",
                });
            }

            // Slots were handed out before the body was visited.
            Statement::Variable(_) => {}

            Statement::Block(block) => self.lower_block(block)?,

            Statement::If { test, body } => {
                let end = self.labels.next_if();
                let width = self.lower_expression(test)?;
                self.log.instruction(Cmp(width, Immediate(0), ACC));
                self.log.instruction(JmpCC(E, end.clone()));
                self.lower_block(body)?;
                self.log.instruction(Label(end));
            }

            Statement::While { test, body } => {
                let labels = self.labels.next_loop(Loop::While);
                self.lower_loop(labels, test, None, body)?;
            }

            Statement::For { init, test, step, body } => {
                let labels = self.labels.next_loop(Loop::For);
                self.lower_expression(init)?;
                self.lower_loop(labels, test, step.as_ref(), body)?;
            }

            Statement::Return(value) => {
                if let Some(value) = value {
                    let width = self.lower_expression(value)?;
                    self.widen(width);
                }
                if entry_body {
                    self.pause()?;
                }
                self.epilogue();
            }

            Statement::Expression(expr) => {
                self.lower_expression(expr)?;
            }
        }
        Ok(())
    }

    fn lower_block(&mut self, block: &Block) -> CompileResult<()> {
        for statement in &block.statements {
            self.lower_statement(statement, false)?;
        }
        Ok(())
    }

    fn lower_loop(
        &mut self,
        (head, end): (String, String),
        test: &Expression,
        step: Option<&Expression>,
        body: &Block,
    ) -> CompileResult<()> {
        self.log.instruction(Label(head.clone()));
        let width = self.lower_expression(test)?;
        self.exit_unless_true(width, &end);
        self.lower_block(body)?;
        if let Some(step) = step {
            self.lower_expression(step)?;
        }
        self.log.instruction(Jmp(head));
        self.log.instruction(Label(end));
        Ok(())
    }

    /// Loop exits branch when the test is non-negative. The test value is first
    /// turned into a boolean mask (0 or all ones) so any non-zero value is true.
    fn exit_unless_true(&mut self, width: Width, end: &str) {
        self.log.instruction(Cmp(width, Immediate(0), ACC));
        self.log.instruction(SetCC(NE, ACC));
        self.log.instruction(MovZeroExtend(ACC, ACC));
        self.log.instruction(Neg(Width::Long, ACC));
        self.log.instruction(JmpCC(GE, end.to_string()));
    }

    /* ---------------- Expressions ---------------- */

    /// Lowers `expr` into the accumulator and returns the width of the result.
    fn lower_expression(&mut self, expr: &Expression) -> CompileResult<Width> {
        match &expr.kind {
            ExpressionKind::Identifier(variable) => {
                let (slot, ty) = self.slot(*variable)?;
                let width = storage_width(ty);
                self.log.instruction(Mov(width, slot, ACC));
                Ok(width)
            }

            ExpressionKind::Literal(literal) => self.lower_literal(literal),

            ExpressionKind::Assignment { target, value } => {
                let (slot, ty) = self.slot(*target)?;
                let value_width = self.lower_expression(value)?;
                let width = storage_width(ty);
                self.fit(value_width, width);
                self.log.instruction(Mov(width, ACC, slot));
                Ok(width)
            }

            ExpressionKind::Unary(op, operand) => self.lower_unary(*op, operand),

            ExpressionKind::Binary(op, left, right) => self.lower_binary(*op, left, right),

            ExpressionKind::Call { function, arguments } => self.lower_call(*function, arguments),
        }
    }

    /// Sign-extends a byte result when a full word is expected.
    fn fit(&mut self, have: Width, want: Width) {
        if have == Width::Byte && want == Width::Long {
            self.log.instruction(MovSignExtend(ACC, ACC));
        }
    }

    fn widen(&mut self, have: Width) {
        self.fit(have, Width::Long);
    }

    fn lower_literal(&mut self, literal: &Literal) -> CompileResult<Width> {
        let value = match &literal.value {
            LiteralValue::Integer(value) => Immediate(*value),
            LiteralValue::Char(c) => Immediate(u32::from(*c) as i32),
            // Booleans double as bit masks.
            LiteralValue::Bool(true) => Immediate(-1),
            LiteralValue::Bool(false) | LiteralValue::Null => Immediate(0),
            LiteralValue::String(_) => LabelAddress(self.literals.label_of(literal.id)?.to_string()),
            LiteralValue::Float(_) => return Err(CompileError::UnsupportedFloat("literal")),
        };
        self.log.instruction(Mov(Width::Long, value, ACC));
        Ok(Width::Long)
    }

    fn lower_unary(&mut self, op: UnaryOperator, operand: &Expression) -> CompileResult<Width> {
        match op {
            UnaryOperator::AddressOf => match &operand.kind {
                ExpressionKind::Identifier(variable) => {
                    let (slot, _) = self.slot(*variable)?;
                    self.log.instruction(Lea(slot, ACC));
                    Ok(Width::Long)
                }
                _ => Err(CompileError::Semantic(
                    "cannot take the address of a non-variable value".to_string(),
                )),
            },

            // Booleans are read off the flags of a comparison against zero.
            UnaryOperator::Not => {
                let width = self.lower_expression(operand)?;
                self.log.instruction(Cmp(width, Immediate(0), ACC));
                self.log.instruction(SetCC(E, ACC));
                self.log.instruction(MovZeroExtend(ACC, ACC));
                Ok(Width::Long)
            }

            UnaryOperator::Negate => {
                if operand.ty == VariableType::Float {
                    return Err(CompileError::UnsupportedFloat("negation"));
                }
                let width = self.lower_expression(operand)?;
                self.log.instruction(Neg(width, ACC));
                Ok(width)
            }
        }
    }

    fn lower_binary(&mut self, op: BinaryOperator, left: &Expression, right: &Expression) -> CompileResult<Width> {
        let width = match left.ty.promote(right.ty) {
            VariableType::Float => return Err(CompileError::UnsupportedFloat("arithmetic")),
            VariableType::Char => Width::Byte,
            _ => Width::Long,
        };

        let left_width = self.lower_expression(left)?;
        self.fit(left_width, width);
        self.log.instruction(Mov(width, ACC, SECONDARY));

        let preserve = clobbers_secondary(right);
        if preserve {
            self.log.instruction(Push(SECONDARY));
        }
        let right_width = self.lower_expression(right)?;
        self.fit(right_width, width);
        if preserve {
            self.log.instruction(Pop(SECONDARY));
        }

        // Left operand in the accumulator, right operand in the secondary register.
        self.log.instruction(Xchg(width, ACC, SECONDARY));

        match op {
            BinaryOperator::Plus => self.log.instruction(Binary(Add, width, SECONDARY, ACC)),
            BinaryOperator::Minus => self.log.instruction(Binary(Sub, width, SECONDARY, ACC)),
            BinaryOperator::And => self.log.instruction(Binary(And, width, SECONDARY, ACC)),
            BinaryOperator::Or => self.log.instruction(Binary(Or, width, SECONDARY, ACC)),
            BinaryOperator::Multiply => match width {
                Width::Long => self.log.instruction(Binary(Imul, width, SECONDARY, ACC)),
                Width::Byte => self.log.instruction(MulByte(SECONDARY)),
            },
            BinaryOperator::Divide => self.divide(width),
            relational => {
                if let Some(cond) = condition_code(relational) {
                    self.log.instruction(Cmp(width, SECONDARY, ACC));
                    self.log.instruction(SetCC(cond, ACC));
                    if width == Width::Long {
                        self.log.instruction(MovZeroExtend(ACC, ACC));
                    }
                }
            }
        }
        Ok(width)
    }

    /// Signed division of the accumulator by the secondary register. The dividend
    /// is sign-extended into %edx:%eax (or %ax) first, so the divisor moves to %ecx.
    fn divide(&mut self, width: Width) {
        self.log.instruction(Mov(width, SECONDARY, SCRATCH));
        match width {
            Width::Long => self.log.instruction(Cltd),
            Width::Byte => self.log.instruction(Cbtw),
        }
        self.log.instruction(Idiv(width, SCRATCH));
    }

    /// Arguments are evaluated and pushed last to first, leaving the first one
    /// next to the return address. The caller pops them after the call.
    fn lower_call(&mut self, function: FunctionId, arguments: &[Expression]) -> CompileResult<Width> {
        let symbols = self.symbols;
        let callee = symbols.function(function)?;

        for argument in arguments.iter().rev() {
            let width = self.lower_expression(argument)?;
            self.widen(width);
            self.log.instruction(Push(ACC));
        }

        self.log.instruction(Call(callee.asm_label.clone()));
        if !arguments.is_empty() {
            let bytes = 4 * arguments.len() as i32;
            self.log.instruction(Binary(Add, Width::Long, Immediate(bytes), Register(SP)));
        }
        Ok(Width::Long)
    }
}
