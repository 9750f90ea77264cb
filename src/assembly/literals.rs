use std::collections::HashMap;

use crate::assembly::emit::EmissionLog;
use crate::assembly::AssemblyInstruction::{Ascii, Label};
use crate::compile_error::{CompileError, CompileResult};
use crate::syntax::{NodeId, StringLiteral};

/**
minic-codegen | assembly/literals.rs
Pools string literals into the data section under sequential `SL<n>` labels.
*/

/// Labels are assigned per literal node, not per value: two equal strings are
/// stored twice.
#[derive(Debug, Default)]
pub struct LiteralPool {
    labels: HashMap<NodeId, String>,
    pause: Option<String>,
    count: usize,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_label(&mut self) -> String {
        let label = format!("SL{}", self.count);
        self.count += 1;
        label
    }

    fn define(log: &mut EmissionLog, label: &str, text: &str) {
        log.instruction(Label(label.to_string()));
        // Quotes are dropped rather than escaped.
        log.instruction(Ascii(text.replace('"', "")));
    }

    /// Pools one user literal and emits its data definition.
    pub fn register(&mut self, literal: &StringLiteral, log: &mut EmissionLog) -> String {
        let label = self.next_label();
        Self::define(log, &label, &literal.text);
        log::trace!("literal {} pooled as {}", literal.node, label);
        self.labels.insert(literal.node, label.clone());
        label
    }

    /// Pools the string handed to the halt routine at the end of the entry point.
    /// Registered after every user literal.
    pub fn register_pause(&mut self, command: &str, log: &mut EmissionLog) -> String {
        let label = self.next_label();
        Self::define(log, &label, command);
        self.pause = Some(label.clone());
        label
    }

    pub fn label_of(&self, node: NodeId) -> CompileResult<&str> {
        self.labels
            .get(&node)
            .map(String::as_str)
            .ok_or(CompileError::UnregisteredLiteral { node })
    }

    pub fn pause_label(&self) -> CompileResult<&str> {
        self.pause.as_deref().ok_or(CompileError::MissingPauseLiteral)
    }
}
