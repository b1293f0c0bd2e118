use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{ast::terms::Term, errors::errors::ErrorImpl, variables::descriptor::ValueType};

const INT: ValueType = ValueType::Integer;
const STR: ValueType = ValueType::String;

/// A builtin function usable inside expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionFunction {
    pub name: &'static str,
    pub return_type: ValueType,
    pub parameters: &'static [ValueType],
    /// Leading parameters that must be present.
    pub required: usize,
    /// The last parameter repeats without limit.
    pub variadic: bool,
}

impl ExpressionFunction {
    const fn new(
        name: &'static str,
        return_type: ValueType,
        parameters: &'static [ValueType],
        required: usize,
    ) -> Self {
        ExpressionFunction { name, return_type, parameters, required, variadic: false }
    }

    const fn variadic(
        name: &'static str,
        return_type: ValueType,
        parameters: &'static [ValueType],
        required: usize,
    ) -> Self {
        ExpressionFunction { name, return_type, parameters, required, variadic: true }
    }

    pub fn max_arguments(&self) -> Option<usize> {
        if self.variadic {
            None
        } else {
            Some(self.parameters.len())
        }
    }

    pub fn parameter_type(&self, index: usize) -> Option<ValueType> {
        match self.parameters.get(index) {
            Some(ty) => Some(*ty),
            None if self.variadic => self.parameters.last().copied(),
            None => None,
        }
    }

    /// Checks arity and argument types. Omitted arguments are only allowed
    /// past the required ones.
    pub fn check_arguments(&self, arguments: &[Option<Term>]) -> Result<(), ErrorImpl> {
        if let Some(max) = self.max_arguments() {
            if arguments.len() > max {
                return Err(ErrorImpl::UnexpectedArguments {
                    expected: max,
                    received: arguments.len(),
                });
            }
        }

        let present = arguments.iter().filter(|a| a.is_some()).count();
        let leading_missing = arguments.iter().take(self.required).any(|a| a.is_none());
        if arguments.len() < self.required || leading_missing {
            return Err(ErrorImpl::MissingArguments { expected: self.required, received: present });
        }

        for (index, argument) in arguments.iter().enumerate() {
            let (Some(argument), Some(expected)) = (argument, self.parameter_type(index)) else {
                continue;
            };
            if argument.result_type() != expected {
                return Err(ErrorImpl::ArgumentTypeMatchError {
                    expected: expected.to_string(),
                    received: argument.result_type().to_string(),
                });
            }
        }

        Ok(())
    }
}

pub const EXPRESSION_FUNCTION_TABLE: &[ExpressionFunction] = &[
    // Arithmetic
    ExpressionFunction::new("ABS", INT, &[INT], 1),
    ExpressionFunction::new("SIGN", INT, &[INT], 1),
    ExpressionFunction::new("SQRT", INT, &[INT], 1),
    ExpressionFunction::new("CBRT", INT, &[INT], 1),
    ExpressionFunction::new("LOG", INT, &[INT], 1),
    ExpressionFunction::new("LOG10", INT, &[INT], 1),
    ExpressionFunction::new("EXPONENT", INT, &[INT], 1),
    ExpressionFunction::new("POWER", INT, &[INT, INT], 2),
    ExpressionFunction::variadic("MAX", INT, &[INT, INT], 1),
    ExpressionFunction::variadic("MIN", INT, &[INT, INT], 1),
    ExpressionFunction::new("LIMIT", INT, &[INT, INT, INT], 3),
    ExpressionFunction::new("INRANGE", INT, &[INT, INT, INT], 3),
    ExpressionFunction::new("RAND", INT, &[INT, INT], 1),
    ExpressionFunction::new("GETBIT", INT, &[INT, INT], 2),
    ExpressionFunction::variadic("GROUPMATCH", INT, &[INT, INT], 1),
    ExpressionFunction::variadic("NOSAMES", INT, &[INT, INT], 2),
    ExpressionFunction::variadic("ALLSAMES", INT, &[INT, INT], 2),
    // Strings
    ExpressionFunction::new("STRLENS", INT, &[STR], 1),
    ExpressionFunction::new("STRLENSU", INT, &[STR], 1),
    ExpressionFunction::new("SUBSTRING", STR, &[STR, INT, INT], 1),
    ExpressionFunction::new("SUBSTRINGU", STR, &[STR, INT, INT], 1),
    ExpressionFunction::new("STRFIND", INT, &[STR, STR, INT], 2),
    ExpressionFunction::new("STRFINDU", INT, &[STR, STR, INT], 2),
    ExpressionFunction::new("STRCOUNT", INT, &[STR, STR], 2),
    ExpressionFunction::new("REPLACE", STR, &[STR, STR, STR], 3),
    ExpressionFunction::new("TOSTR", STR, &[INT, STR], 1),
    ExpressionFunction::new("TOINT", INT, &[STR], 1),
    ExpressionFunction::new("ISNUMERIC", INT, &[STR], 1),
    ExpressionFunction::new("TOUPPER", STR, &[STR], 1),
    ExpressionFunction::new("TOLOWER", STR, &[STR], 1),
    ExpressionFunction::new("TOHALF", STR, &[STR], 1),
    ExpressionFunction::new("TOFULL", STR, &[STR], 1),
    ExpressionFunction::new("UNICODE", STR, &[INT], 1),
    ExpressionFunction::new("ENCODETOUNI", INT, &[STR, INT], 1),
    ExpressionFunction::new("ESCAPE", STR, &[STR], 1),
    ExpressionFunction::new("MONEYSTR", STR, &[INT, STR], 1),
    ExpressionFunction::new("CHARATU", STR, &[STR, INT], 2),
    // Characters and CSV data
    ExpressionFunction::new("GETCHARA", INT, &[INT, INT], 1),
    ExpressionFunction::new("GETSPCHARA", INT, &[INT], 1),
    ExpressionFunction::new("EXISTCSV", INT, &[INT, INT], 1),
    ExpressionFunction::new("CSVNAME", STR, &[INT, INT], 1),
    ExpressionFunction::new("CSVCALLNAME", STR, &[INT, INT], 1),
    ExpressionFunction::new("CSVNICKNAME", STR, &[INT, INT], 1),
    ExpressionFunction::new("CSVBASE", INT, &[INT, INT, INT], 2),
    ExpressionFunction::new("CSVABL", INT, &[INT, INT, INT], 2),
    ExpressionFunction::new("CSVTALENT", INT, &[INT, INT, INT], 2),
    ExpressionFunction::new("CSVCFLAG", INT, &[INT, INT, INT], 2),
    // Runtime
    ExpressionFunction::new("GETTIME", INT, &[], 0),
    ExpressionFunction::new("GETTIMES", STR, &[], 0),
    ExpressionFunction::new("GETMILLISECOND", INT, &[], 0),
    ExpressionFunction::new("GETSECOND", INT, &[], 0),
    ExpressionFunction::new("GETCOLOR", INT, &[], 0),
    ExpressionFunction::new("GETBGCOLOR", INT, &[], 0),
    ExpressionFunction::new("GETDEFCOLOR", INT, &[], 0),
    ExpressionFunction::new("GETFOCUSCOLOR", INT, &[], 0),
    ExpressionFunction::new("GETSTYLE", INT, &[], 0),
    ExpressionFunction::new("GETFONT", STR, &[], 0),
    ExpressionFunction::new("CURRENTALIGN", STR, &[], 0),
    ExpressionFunction::new("CURRENTREDRAW", INT, &[], 0),
    ExpressionFunction::new("CHKFONT", INT, &[STR], 1),
    ExpressionFunction::new("ISSKIP", INT, &[], 0),
    ExpressionFunction::new("MOUSESKIP", INT, &[], 0),
    ExpressionFunction::new("LINEISEMPTY", INT, &[], 0),
    ExpressionFunction::new("SAVENOS", INT, &[], 0),
    ExpressionFunction::new("GETCONFIG", INT, &[STR], 1),
    ExpressionFunction::new("GETCONFIGS", STR, &[STR], 1),
];

lazy_static! {
    /// Expression functions by upper case name.
    pub static ref EXPRESSION_FUNCTIONS: HashMap<&'static str, ExpressionFunction> = {
        let mut map = HashMap::new();
        for function in EXPRESSION_FUNCTION_TABLE {
            map.insert(function.name, *function);
        }
        map
    };
}
