//! Variable descriptors.
//!
//! A descriptor records every independent axis of a variable: its shape, the
//! element type, where it comes from, and a set of capability flags. The
//! axes are kept in separate fields so that a flag bit never has to be read
//! in the context of another to know what it means.

use std::{
    fmt::Display,
    ops::{BitOr, BitOrAssign},
};

/// Static type of a value: every variable element and every expression term
/// is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    String,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::String => "string",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableShape {
    Scalar,
    Array1D,
    Array2D,
    Array3D,
}

impl VariableShape {
    pub fn dimension(&self) -> usize {
        match self {
            VariableShape::Scalar => 0,
            VariableShape::Array1D => 1,
            VariableShape::Array2D => 2,
            VariableShape::Array3D => 3,
        }
    }

    pub fn from_dimension(dimension: usize) -> Option<Self> {
        match dimension {
            0 => Some(VariableShape::Scalar),
            1 => Some(VariableShape::Array1D),
            2 => Some(VariableShape::Array2D),
            3 => Some(VariableShape::Array3D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableOrigin {
    Builtin,
    /// Declared by a script (`#DIM`).
    Extended,
    /// Every element comes from an external CSV table.
    ExternalConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariableFlags(u16);

impl VariableFlags {
    pub const NONE: VariableFlags = VariableFlags(0);
    /// Implicitly indexed by a character (`CFLAG:target:index`).
    pub const CHARACTER_DATA: VariableFlags = VariableFlags(1 << 0);
    /// A per-character two-dimensional array (`CDFLAG`).
    pub const CHARACTER_2D_DATA: VariableFlags = VariableFlags(1 << 1);
    pub const UNCHANGEABLE: VariableFlags = VariableFlags(1 << 2);
    pub const SAVE_DATA: VariableFlags = VariableFlags(1 << 3);
    pub const CALCULATED: VariableFlags = VariableFlags(1 << 4);
    pub const CAN_FORBID: VariableFlags = VariableFlags(1 << 5);
    pub const GLOBAL: VariableFlags = VariableFlags(1 << 6);
    /// Scoped to a label, addressed with an `@` sub-key.
    pub const LOCAL: VariableFlags = VariableFlags(1 << 7);

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn union(self, other: VariableFlags) -> VariableFlags {
        VariableFlags(self.0 | other.0)
    }

    pub const fn difference(self, other: VariableFlags) -> VariableFlags {
        VariableFlags(self.0 & !other.0)
    }

    pub const fn contains(&self, other: VariableFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for VariableFlags {
    type Output = VariableFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for VariableFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableDescriptor {
    pub shape: VariableShape,
    pub element_type: ValueType,
    pub origin: VariableOrigin,
    pub flags: VariableFlags,
}

/// A broken descriptor invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorViolation {
    CalculatedButWritable,
    CalculatedButSaved,
    ConflictingCharacterData,
    Character2DNotTwoDimensional,
}

impl VariableDescriptor {
    pub const fn new(
        shape: VariableShape,
        element_type: ValueType,
        origin: VariableOrigin,
        flags: VariableFlags,
    ) -> Self {
        VariableDescriptor { shape, element_type, origin, flags }
    }

    /// Descriptor for a script-declared variable. User variables are always
    /// writable and never calculated, whatever flags are requested.
    pub fn user(shape: VariableShape, element_type: ValueType, flags: VariableFlags) -> Self {
        let flags = flags
            .difference(VariableFlags::UNCHANGEABLE)
            .difference(VariableFlags::CALCULATED)
            .difference(VariableFlags::CHARACTER_2D_DATA);

        VariableDescriptor::new(shape, element_type, VariableOrigin::Extended, flags)
    }

    pub fn validate(&self) -> Result<(), DescriptorViolation> {
        if self.flags.contains(VariableFlags::CALCULATED) {
            if !self.flags.contains(VariableFlags::UNCHANGEABLE) {
                return Err(DescriptorViolation::CalculatedButWritable);
            }
            if self.flags.contains(VariableFlags::SAVE_DATA) {
                return Err(DescriptorViolation::CalculatedButSaved);
            }
        }
        if self.flags.contains(VariableFlags::CHARACTER_2D_DATA) {
            if self.flags.contains(VariableFlags::CHARACTER_DATA) {
                return Err(DescriptorViolation::ConflictingCharacterData);
            }
            if self.shape != VariableShape::Array2D {
                return Err(DescriptorViolation::Character2DNotTwoDimensional);
            }
        }
        Ok(())
    }

    /// Number of index arguments, not counting the character index.
    pub fn index_count(&self) -> usize {
        self.shape.dimension()
    }

    pub fn value_type(&self) -> ValueType {
        self.element_type
    }

    pub fn is_character_data(&self) -> bool {
        self.flags.contains(VariableFlags::CHARACTER_DATA)
            || self.flags.contains(VariableFlags::CHARACTER_2D_DATA)
    }

    pub fn is_writable(&self) -> bool {
        !self.flags.contains(VariableFlags::UNCHANGEABLE)
    }

    pub fn is_calculated(&self) -> bool {
        self.flags.contains(VariableFlags::CALCULATED)
    }

    pub fn is_save_data(&self) -> bool {
        self.flags.contains(VariableFlags::SAVE_DATA)
    }

    pub fn can_forbid(&self) -> bool {
        self.flags.contains(VariableFlags::CAN_FORBID)
    }

    pub fn is_local(&self) -> bool {
        self.flags.contains(VariableFlags::LOCAL)
    }
}
