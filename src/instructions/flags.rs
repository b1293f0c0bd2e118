use std::ops::{BitOr, BitOrAssign};

/// Behaviour bits attached to an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InstructionFlags(u32);

impl InstructionFlags {
    pub const NONE: InstructionFlags = InstructionFlags(0);
    pub const FLOW_CONTROL: InstructionFlags = InstructionFlags(1 << 0);
    /// Not part of the original instruction set.
    pub const EXTENDED: InstructionFlags = InstructionFlags(1 << 1);
    /// Allowed inside `#FUNCTION` bodies.
    pub const METHOD_SAFE: InstructionFlags = InstructionFlags(1 << 2);
    pub const DEBUG_ONLY: InstructionFlags = InstructionFlags(1 << 3);
    /// Only valid in the middle of a block (`ELSE`, `CASE`, ...).
    pub const PARTIAL: InstructionFlags = InstructionFlags(1 << 4);
    /// Arguments are parsed at load time even when the body is skipped.
    pub const FORCE_SET_ARGUMENT: InstructionFlags = InstructionFlags(1 << 5);
    pub const JUMP: InstructionFlags = InstructionFlags(1 << 6);
    pub const TRY: InstructionFlags = InstructionFlags(1 << 7);
    pub const NEWLINE: InstructionFlags = InstructionFlags(1 << 8);
    pub const WAIT: InstructionFlags = InstructionFlags(1 << 9);
    pub const SINGLE_LINE: InstructionFlags = InstructionFlags(1 << 10);
    pub const PRINT_DATA: InstructionFlags = InstructionFlags(1 << 11);
    /// Output that a skip request suppresses.
    pub const IS_PRINT: InstructionFlags = InstructionFlags(1 << 12);
    pub const SKIP_WARNING: InstructionFlags = InstructionFlags(1 << 13);
    pub const BLOCK_START: InstructionFlags = InstructionFlags(1 << 14);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn union(self, other: InstructionFlags) -> InstructionFlags {
        InstructionFlags(self.0 | other.0)
    }

    pub const fn contains(&self, other: InstructionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for InstructionFlags {
    type Output = InstructionFlags;

    fn bitor(self, rhs: InstructionFlags) -> InstructionFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for InstructionFlags {
    fn bitor_assign(&mut self, rhs: InstructionFlags) {
        self.0 |= rhs.0;
    }
}
