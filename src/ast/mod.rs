/// AST module
/// Contains the expression tree produced by the parser
///
/// Submodules:
/// - operators: Operator codes, arity and priority
/// - terms: Operand terms, static result types and constant folding
pub mod operators;
pub mod terms;
