/**
minic-codegen | options.rs
Knobs for the runtime symbols and output format the generated code depends on.
*/

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Source name of the function the program starts in.
    pub entry_point: String,
    /// Runtime initialization routine called right after the entry point's prologue.
    pub init_routine: String,
    /// Routine called with the pause string before the entry point returns.
    pub pause_routine: String,
    /// Text of the pooled pause string.
    pub pause_command: String,
    /// Separator placed after every emitted line.
    pub line_separator: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
            init_routine: "___main".to_string(),
            pause_routine: "_system".to_string(),
            pause_command: "pause".to_string(),
            line_separator: if cfg!(windows) { "\r\n" } else { "\n" }.to_string(),
        }
    }
}
