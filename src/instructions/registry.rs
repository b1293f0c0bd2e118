//! Instruction dispatch table.
//!
//! The table is built once from two sources: the instruction definitions in
//! `create_instruction_lookups` and the expression functions in
//! `functions::EXPRESSION_FUNCTION_TABLE`. A function becomes a method-call
//! instruction only when no instruction already uses its name. Every
//! instruction flagged `BLOCK_START` has one entry in the block-match table.

use std::{collections::HashMap, sync::Arc};

use lazy_static::lazy_static;

use super::{
    flags::InstructionFlags,
    functions::{ExpressionFunction, EXPRESSION_FUNCTIONS, EXPRESSION_FUNCTION_TABLE},
    shapes::ArgumentShape,
};

use ArgumentShape::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub name: &'static str,
    pub shape: ArgumentShape,
    pub flags: InstructionFlags,
    /// Closing instruction, for block openers.
    pub block_end: Option<&'static str>,
}

impl InstructionDescriptor {
    pub fn has_flag(&self, flag: InstructionFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_block_start(&self) -> bool {
        self.has_flag(InstructionFlags::BLOCK_START)
    }

    pub fn is_method(&self) -> bool {
        matches!(self.shape, ArgumentShape::Method(_))
    }
}

#[derive(Debug, Clone)]
pub struct InstructionRegistry {
    instructions: HashMap<&'static str, InstructionDescriptor>,
    block_matches: HashMap<&'static str, &'static str>,
}

lazy_static! {
    static ref BUILTIN_REGISTRY: Arc<InstructionRegistry> = Arc::new(InstructionRegistry::new());
}

impl InstructionRegistry {
    /// Builds a fresh registry with every builtin instruction and function.
    pub fn new() -> Self {
        let mut registry = InstructionRegistry {
            instructions: HashMap::new(),
            block_matches: HashMap::new(),
        };
        create_instruction_lookups(&mut registry);

        for function in EXPRESSION_FUNCTION_TABLE {
            if !registry.instructions.contains_key(function.name) {
                registry.instruction(function.name, Method(function.name), InstructionFlags::METHOD_SAFE);
            }
        }

        registry
    }

    /// The process-wide registry, built on first use.
    pub fn builtin() -> Arc<InstructionRegistry> {
        Arc::clone(&BUILTIN_REGISTRY)
    }

    pub fn lookup(&self, name: &str) -> Option<&InstructionDescriptor> {
        self.instructions.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&'static ExpressionFunction> {
        EXPRESSION_FUNCTIONS.get(name)
    }

    pub fn block_end(&self, opener: &str) -> Option<&'static str> {
        self.block_matches.get(opener).copied()
    }

    pub fn block_matches(&self) -> &HashMap<&'static str, &'static str> {
        &self.block_matches
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.instructions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn instruction(&mut self, name: &'static str, shape: ArgumentShape, flags: InstructionFlags) {
        self.instructions.insert(name, InstructionDescriptor { name, shape, flags, block_end: None });
    }

    fn block(
        &mut self,
        name: &'static str,
        shape: ArgumentShape,
        flags: InstructionFlags,
        end: &'static str,
    ) {
        self.instructions.insert(
            name,
            InstructionDescriptor {
                name,
                shape,
                flags: flags | InstructionFlags::BLOCK_START,
                block_end: Some(end),
            },
        );
        self.block_matches.insert(name, end);
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        InstructionRegistry::new()
    }
}

const NONE: InstructionFlags = InstructionFlags::NONE;
const FLOW: InstructionFlags = InstructionFlags::FLOW_CONTROL.union(InstructionFlags::METHOD_SAFE);
const PARTIAL: InstructionFlags = FLOW.union(InstructionFlags::PARTIAL);
const EXTENDED: InstructionFlags = InstructionFlags::EXTENDED;
const SAFE: InstructionFlags = InstructionFlags::METHOD_SAFE;
const PRINT: InstructionFlags = InstructionFlags::IS_PRINT;
const PRINT_L: InstructionFlags = PRINT.union(InstructionFlags::NEWLINE);
const PRINT_W: InstructionFlags = PRINT_L.union(InstructionFlags::WAIT);
const JUMP: InstructionFlags = InstructionFlags::FLOW_CONTROL.union(InstructionFlags::JUMP);
const TRY_JUMP: InstructionFlags = JUMP.union(InstructionFlags::TRY);
const DEBUG: InstructionFlags = InstructionFlags::DEBUG_ONLY
    .union(InstructionFlags::METHOD_SAFE)
    .union(InstructionFlags::EXTENDED);
const DATA: InstructionFlags = InstructionFlags::PRINT_DATA.union(InstructionFlags::PARTIAL);

fn create_instruction_lookups(registry: &mut InstructionRegistry) {
    // Output
    registry.instruction("PRINT", RawString, PRINT);
    registry.instruction("PRINTL", RawString, PRINT_L);
    registry.instruction("PRINTW", RawString, PRINT_W);
    registry.instruction("PRINTC", RawString, PRINT | EXTENDED);
    registry.instruction("PRINTLC", RawString, PRINT | EXTENDED);
    registry.instruction("PRINTV", Expressions, PRINT);
    registry.instruction("PRINTVL", Expressions, PRINT_L);
    registry.instruction("PRINTVW", Expressions, PRINT_W);
    registry.instruction("PRINTS", StrExpression, PRINT);
    registry.instruction("PRINTSL", StrExpression, PRINT_L);
    registry.instruction("PRINTSW", StrExpression, PRINT_W);
    registry.instruction("PRINTFORM", Formatted, PRINT);
    registry.instruction("PRINTFORML", Formatted, PRINT_L);
    registry.instruction("PRINTFORMW", Formatted, PRINT_W);
    registry.instruction("PRINTFORMC", Formatted, PRINT | EXTENDED);
    registry.instruction("PRINTFORMS", StrExpression, PRINT);
    registry.instruction("PRINTFORMSL", StrExpression, PRINT_L);
    registry.instruction("PRINTSINGLE", RawString, PRINT | InstructionFlags::SINGLE_LINE | EXTENDED);
    registry.instruction("PRINTSINGLEFORM", Formatted, PRINT | InstructionFlags::SINGLE_LINE | EXTENDED);
    registry.instruction("PRINTBUTTON", Expressions, PRINT | EXTENDED);
    registry.instruction("PRINTPLAIN", RawString, PRINT | EXTENDED);
    registry.instruction("PRINTPLAINFORM", Formatted, PRINT | EXTENDED);
    registry.instruction("DRAWLINE", Void, PRINT);
    registry.instruction("CUSTOMDRAWLINE", RawString, PRINT | EXTENDED);
    registry.instruction("DRAWLINEFORM", Formatted, PRINT | EXTENDED);
    registry.instruction("REUSELASTLINE", Formatted, PRINT | EXTENDED);
    registry.instruction("CLEARLINE", Expression, EXTENDED);
    registry.instruction("BAR", Bar, PRINT);
    registry.instruction("BARL", Bar, PRINT_L);
    registry.instruction("ALIGNMENT", RawString, EXTENDED);
    registry.instruction("SETCOLOR", SetColor, EXTENDED);
    registry.instruction("SETBGCOLOR", SetColor, EXTENDED);
    registry.instruction("RESETCOLOR", Void, EXTENDED);
    registry.instruction("RESETBGCOLOR", Void, EXTENDED);
    registry.instruction("FONTBOLD", Void, EXTENDED);
    registry.instruction("FONTITALIC", Void, EXTENDED);
    registry.instruction("FONTREGULAR", Void, EXTENDED);
    registry.instruction("SETFONT", OptionalStrExpression, EXTENDED);
    registry.instruction("REDRAW", Expression, EXTENDED);
    registry.instruction("SKIPDISP", Expression, EXTENDED);
    registry.block("NOSKIP", Void, EXTENDED, "ENDNOSKIP");
    registry.instruction("ENDNOSKIP", Void, EXTENDED | InstructionFlags::PARTIAL);

    // Print data blocks
    registry.block("PRINTDATA", Variable, PRINT | InstructionFlags::PRINT_DATA | EXTENDED, "ENDDATA");
    registry.block("PRINTDATAL", Variable, PRINT_L | InstructionFlags::PRINT_DATA | EXTENDED, "ENDDATA");
    registry.block("PRINTDATAW", Variable, PRINT_W | InstructionFlags::PRINT_DATA | EXTENDED, "ENDDATA");
    registry.block("STRDATA", Variable, InstructionFlags::PRINT_DATA | EXTENDED, "ENDDATA");
    registry.block("DATALIST", Void, DATA, "ENDLIST");
    registry.instruction("DATA", RawString, DATA | InstructionFlags::SKIP_WARNING);
    registry.instruction("DATAFORM", Formatted, DATA | InstructionFlags::SKIP_WARNING);
    registry.instruction("ENDLIST", Void, DATA);
    registry.instruction("ENDDATA", Void, DATA);

    // Input
    registry.instruction("WAIT", Void, InstructionFlags::WAIT);
    registry.instruction("FORCEWAIT", Void, InstructionFlags::WAIT | EXTENDED);
    registry.instruction("WAITANYKEY", Void, InstructionFlags::WAIT | EXTENDED);
    registry.instruction("TWAIT", Expressions, InstructionFlags::WAIT | EXTENDED);
    registry.instruction("INPUT", OptionalExpression, NONE);
    registry.instruction("INPUTS", OptionalStrExpression, NONE);
    registry.instruction("ONEINPUT", OptionalExpression, EXTENDED);
    registry.instruction("ONEINPUTS", OptionalStrExpression, EXTENDED);
    registry.instruction("TINPUT", Expressions, EXTENDED);
    registry.instruction("TINPUTS", Expressions, EXTENDED);

    // Variables
    registry.instruction("VARSET", VariableAssignment, SAFE | EXTENDED);
    registry.instruction("CVARSET", Expressions, SAFE | EXTENDED);
    registry.instruction("SWAP", Expressions, SAFE | EXTENDED);
    registry.instruction("STRLEN", RawString, SAFE);
    registry.instruction("STRLENFORM", Formatted, SAFE);
    registry.instruction("STRLENU", RawString, SAFE | EXTENDED);
    registry.instruction("STRLENFORMU", Formatted, SAFE | EXTENDED);
    registry.instruction("PUTFORM", Formatted, NONE);
    registry.instruction("RANDOMIZE", OptionalExpression, SAFE);
    registry.instruction("INITRAND", Void, SAFE);
    registry.instruction("DUMPRAND", Void, SAFE);
    registry.instruction("GETTIME", Void, SAFE | EXTENDED);

    // Characters
    registry.instruction("ADDCHARA", Expressions, NONE);
    registry.instruction("ADDSPCHARA", Expressions, NONE);
    registry.instruction("DELCHARA", Expressions, NONE);
    registry.instruction("SWAPCHARA", Expressions, NONE);
    registry.instruction("COPYCHARA", Expressions, EXTENDED);
    registry.instruction("ADDDEFCHARA", Void, NONE);
    registry.instruction("ADDVOIDCHARA", Void, EXTENDED);
    registry.instruction("DELALLCHARA", Void, EXTENDED);

    // Save data
    registry.instruction("SAVEGAME", Void, NONE);
    registry.instruction("LOADGAME", Void, NONE);
    registry.instruction("SAVEVAR", SaveVariables, EXTENDED);
    registry.instruction("LOADVAR", SaveVariables, EXTENDED);
    registry.instruction("SAVECHARA", SaveVariables, EXTENDED);
    registry.instruction("LOADCHARA", Expressions, EXTENDED);
    registry.instruction("LOADDATA", Expression, EXTENDED);
    registry.instruction("DELDATA", Expression, EXTENDED);
    registry.instruction("SAVEGLOBAL", Void, NONE);
    registry.instruction("LOADGLOBAL", Void, NONE);
    registry.instruction("RESETDATA", Void, NONE);
    registry.instruction("RESETGLOBAL", Void, NONE);

    // Flow control
    registry.block("IF", Expression, FLOW | InstructionFlags::FORCE_SET_ARGUMENT, "ENDIF");
    registry.instruction("ELSEIF", Expression, PARTIAL | InstructionFlags::FORCE_SET_ARGUMENT);
    registry.instruction("ELSE", Void, PARTIAL);
    registry.instruction("ENDIF", Void, PARTIAL);
    registry.instruction("SIF", Expression, FLOW | InstructionFlags::FORCE_SET_ARGUMENT);
    registry.block("SELECTCASE", AnyExpression, FLOW | InstructionFlags::FORCE_SET_ARGUMENT, "ENDSELECT");
    registry.instruction("CASE", Case, PARTIAL | InstructionFlags::FORCE_SET_ARGUMENT);
    registry.instruction("CASEELSE", Void, PARTIAL);
    registry.instruction("ENDSELECT", Void, PARTIAL);
    registry.block("FOR", ForNext, FLOW | InstructionFlags::FORCE_SET_ARGUMENT | EXTENDED, "NEXT");
    registry.instruction("NEXT", Void, PARTIAL | EXTENDED);
    registry.block("WHILE", Expression, FLOW | InstructionFlags::FORCE_SET_ARGUMENT | EXTENDED, "WEND");
    registry.instruction("WEND", Void, PARTIAL | EXTENDED);
    registry.block("DO", Void, FLOW | EXTENDED, "LOOP");
    registry.instruction("LOOP", Expression, PARTIAL | InstructionFlags::FORCE_SET_ARGUMENT | EXTENDED);
    registry.block("REPEAT", Expression, FLOW | InstructionFlags::FORCE_SET_ARGUMENT, "REND");
    registry.instruction("REND", Void, PARTIAL);
    registry.instruction("BREAK", Void, FLOW);
    registry.instruction("CONTINUE", Void, FLOW);
    registry.instruction("RETURN", Expressions, InstructionFlags::FLOW_CONTROL);
    registry.instruction("RETURNFORM", Formatted, InstructionFlags::FLOW_CONTROL | EXTENDED);
    registry.instruction("RETURNF", OptionalExpression, FLOW | EXTENDED);
    registry.instruction("RESTART", Void, InstructionFlags::FLOW_CONTROL);
    registry.instruction("BEGIN", RawString, InstructionFlags::FLOW_CONTROL);
    registry.instruction("QUIT", Void, InstructionFlags::FLOW_CONTROL);
    registry.instruction("THROW", Formatted, FLOW | EXTENDED);

    // Jumps
    registry.instruction("CALL", Call, JUMP);
    registry.instruction("JUMP", Call, JUMP);
    registry.instruction("GOTO", Call, JUMP);
    registry.instruction("TRYCALL", Call, TRY_JUMP);
    registry.instruction("TRYJUMP", Call, TRY_JUMP);
    registry.instruction("TRYGOTO", Call, TRY_JUMP);
    registry.instruction("CALLFORM", CallForm, JUMP);
    registry.instruction("JUMPFORM", CallForm, JUMP);
    registry.instruction("GOTOFORM", CallForm, JUMP);
    registry.instruction("TRYCALLFORM", CallForm, TRY_JUMP);
    registry.instruction("TRYJUMPFORM", CallForm, TRY_JUMP);
    registry.instruction("TRYGOTOFORM", CallForm, TRY_JUMP);
    registry.block("TRYCCALL", Call, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("TRYCJUMP", Call, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("TRYCGOTO", Call, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("TRYCCALLFORM", CallForm, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("TRYCJUMPFORM", CallForm, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("TRYCGOTOFORM", CallForm, TRY_JUMP | EXTENDED, "CATCH");
    registry.block("CATCH", Void, PARTIAL | EXTENDED, "ENDCATCH");
    registry.instruction("ENDCATCH", Void, PARTIAL | EXTENDED);
    registry.block("TRYCALLLIST", Void, TRY_JUMP | EXTENDED, "ENDFUNC");
    registry.block("TRYJUMPLIST", Void, TRY_JUMP | EXTENDED, "ENDFUNC");
    registry.block("TRYGOTOLIST", Void, TRY_JUMP | EXTENDED, "ENDFUNC");
    registry.instruction("FUNC", CallForm, PARTIAL | EXTENDED);
    registry.instruction("ENDFUNC", Void, PARTIAL | EXTENDED);

    // Debugging
    registry.instruction("DEBUGPRINT", RawString, DEBUG);
    registry.instruction("DEBUGPRINTL", RawString, DEBUG | InstructionFlags::NEWLINE);
    registry.instruction("DEBUGPRINTFORM", Formatted, DEBUG);
    registry.instruction("DEBUGPRINTFORML", Formatted, DEBUG | InstructionFlags::NEWLINE);
    registry.instruction("DEBUGCLEAR", Void, DEBUG);
    registry.instruction("ASSERT", Expression, DEBUG);
}
