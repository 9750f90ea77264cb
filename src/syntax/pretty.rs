use std::fmt;
use std::fmt::Formatter;

use super::ast::*;

pub trait PrettyPrint {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result;
}

fn ind(n: usize) -> String {
    "  ".repeat(n)
}

fn comma_line(f: &mut Formatter, indent: usize) -> fmt::Result {
    writeln!(f, "{},", ind(indent))
}

/* ---------------- Program / Function / Block ---------------- */

impl PrettyPrint for Program {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        writeln!(f, "{}Program(", ind(indent))?;
        for statement in &self.statements {
            statement.pretty_print(f, indent + 1)?;
        }
        writeln!(f, "{})", ind(indent))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.pretty_print(f, 0)
    }
}

impl PrettyPrint for FunctionDeclaration {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        writeln!(f, "{}Function({}", ind(indent), self.symbol)?;
        for argument in &self.arguments {
            writeln!(f, "{}FormalArgument({})", ind(indent + 1), argument.variable)?;
        }
        self.body.pretty_print(f, indent + 1)?;
        writeln!(f, "{})", ind(indent))
    }
}

impl PrettyPrint for Block {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        writeln!(f, "{}Block({}", ind(indent), self.id)?;
        for (i, statement) in self.statements.iter().enumerate() {
            statement.pretty_print(f, indent + 1)?;
            if i + 1 != self.statements.len() {
                comma_line(f, indent + 1)?;
            }
        }
        writeln!(f, "{})", ind(indent))
    }
}

/* ---------------- Statements ---------------- */

impl PrettyPrint for Statement {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        match self {
            Statement::Function(function) => function.pretty_print(f, indent),

            Statement::Variable(variables) => {
                let names: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
                writeln!(f, "{}VariableDeclaration({})", ind(indent), names.join(", "))
            }

            Statement::Block(block) => block.pretty_print(f, indent),

            Statement::If { test, body } => {
                writeln!(f, "{}If(", ind(indent))?;
                writeln!(f, "{}Condition(", ind(indent + 1))?;
                test.pretty_print(f, indent + 2)?;
                writeln!(f, "{})", ind(indent + 1))?;
                comma_line(f, indent + 1)?;
                body.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            Statement::For { init, test, step, body } => {
                writeln!(f, "{}For(", ind(indent))?;
                writeln!(f, "{}Init(", ind(indent + 1))?;
                init.pretty_print(f, indent + 2)?;
                writeln!(f, "{})", ind(indent + 1))?;
                writeln!(f, "{}Condition(", ind(indent + 1))?;
                test.pretty_print(f, indent + 2)?;
                writeln!(f, "{})", ind(indent + 1))?;
                if let Some(step) = step {
                    writeln!(f, "{}Step(", ind(indent + 1))?;
                    step.pretty_print(f, indent + 2)?;
                    writeln!(f, "{})", ind(indent + 1))?;
                }
                body.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            Statement::While { test, body } => {
                writeln!(f, "{}While(", ind(indent))?;
                writeln!(f, "{}Condition(", ind(indent + 1))?;
                test.pretty_print(f, indent + 2)?;
                writeln!(f, "{})", ind(indent + 1))?;
                comma_line(f, indent + 1)?;
                body.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            Statement::Return(None) => writeln!(f, "{}Return", ind(indent)),

            Statement::Return(Some(value)) => {
                writeln!(f, "{}Return(", ind(indent))?;
                value.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            Statement::Expression(expr) => {
                writeln!(f, "{}ExpressionStmt(", ind(indent))?;
                expr.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }
        }
    }
}

/* ---------------- Expressions ---------------- */

impl PrettyPrint for Expression {
    fn pretty_print(&self, f: &mut Formatter, indent: usize) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Identifier(var) => writeln!(f, "{}Identifier({}: {:?})", ind(indent), var, self.ty),

            ExpressionKind::Literal(literal) => {
                writeln!(f, "{}Literal({} {:?})", ind(indent), literal.id, literal.value)
            }

            ExpressionKind::Assignment { target, value } => {
                writeln!(f, "{}Assignment({}", ind(indent), target)?;
                value.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            ExpressionKind::Binary(op, left, right) => {
                writeln!(f, "{}Binary({:?}: {:?}", ind(indent), op, self.ty)?;
                left.pretty_print(f, indent + 1)?;
                comma_line(f, indent + 1)?;
                right.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            ExpressionKind::Unary(op, operand) => {
                writeln!(f, "{}Unary({:?}", ind(indent), op)?;
                operand.pretty_print(f, indent + 1)?;
                writeln!(f, "{})", ind(indent))
            }

            ExpressionKind::Call { function, arguments } => {
                writeln!(f, "{}Call({}", ind(indent), function)?;
                for (i, argument) in arguments.iter().enumerate() {
                    argument.pretty_print(f, indent + 1)?;
                    if i + 1 != arguments.len() {
                        comma_line(f, indent + 1)?;
                    }
                }
                writeln!(f, "{})", ind(indent))
            }
        }
    }
}
