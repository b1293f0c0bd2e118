/// Name resolution options, read-only once loading starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Upper-case every identifier on insert and lookup.
    pub case_insensitive: bool,
    /// Let functions and labels reuse the names of builtin functions and variables.
    pub allow_overloading: bool,
    pub warn_on_overload: bool,
    /// Warn instead of silently keeping the first of two labels with one name.
    pub warn_on_function_duplicate: bool,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    pub fn allow_overloading(mut self, value: bool) -> Self {
        self.allow_overloading = value;
        self
    }

    pub fn warn_on_overload(mut self, value: bool) -> Self {
        self.warn_on_overload = value;
        self
    }

    pub fn warn_on_function_duplicate(mut self, value: bool) -> Self {
        self.warn_on_function_duplicate = value;
        self
    }
}
