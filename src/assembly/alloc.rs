use std::collections::HashMap;

use crate::compile_error::{CompileError, CompileResult};
use crate::syntax::{BlockId, VarId, VariableType};

/**
minic-codegen | assembly/alloc.rs
Assigns frame-pointer-relative stack slots to variables, one frame per lexical block.
*/

/// Slots of one lexical block. Offsets are negative and relative to `%ebp`.
#[derive(Debug, Default)]
pub struct StackFrame {
    /// Bytes already claimed by enclosing blocks when this block was opened.
    base: i32,
    total_bytes: i32,
    offsets: HashMap<VarId, i32>,
}

impl StackFrame {
    fn extent(&self) -> i32 {
        self.base + self.total_bytes
    }
}

#[derive(Debug, Default)]
pub struct StackFrameAllocator {
    frames: HashMap<BlockId, StackFrame>,
}

impl StackFrameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frame of `block`, creating an empty one on first touch.
    fn frame(&mut self, block: BlockId) -> &mut StackFrame {
        self.frames.entry(block).or_default()
    }

    /// Reserves a slot for `variable` in `block` and returns its offset.
    /// A variable that already has a slot keeps it.
    pub fn allocate(&mut self, block: BlockId, ty: VariableType, variable: VarId) -> i32 {
        let frame = self.frame(block);
        if let Some(&offset) = frame.offsets.get(&variable) {
            return offset;
        }

        frame.total_bytes += ty.slot_size();
        let offset = -frame.extent();
        frame.offsets.insert(variable, offset);
        log::trace!("{} in {}: {:?} at {}(%ebp)", variable, block, ty, offset);
        offset
    }

    /// Bytes allocated directly in `block`.
    pub fn total_bytes(&mut self, block: BlockId) -> i32 {
        self.frame(block).total_bytes
    }

    /// Lowest byte (as a positive distance from `%ebp`) used by `block`.
    pub fn extent(&mut self, block: BlockId) -> i32 {
        self.frame(block).extent()
    }

    /// Opens `child` below everything `parent` has allocated so far. A child
    /// opened under several parents starts below the deepest of them.
    pub fn open_nested(&mut self, child: BlockId, parent: BlockId) {
        let base = self.extent(parent);
        let frame = self.frame(child);
        if frame.offsets.is_empty() {
            frame.base = frame.base.max(base);
        }
    }

    /// Offset of a variable owned by `block`.
    pub fn offset_of(&self, variable: VarId, block: BlockId, name: &str) -> CompileResult<i32> {
        self.frames
            .get(&block)
            .and_then(|frame| frame.offsets.get(&variable))
            .copied()
            .ok_or_else(|| CompileError::UnallocatedVariable {
                variable,
                name: name.to_string(),
            })
    }
}
