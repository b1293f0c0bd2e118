use std::{collections::HashMap, rc::Rc};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Keyword tables read from the game's CSV files. Each table maps a
/// keyword to the array index it names, so `FLAG:Friendship` can stand for
/// `FLAG:3`.
#[derive(Debug, Clone, Default)]
pub struct ConstantTables {
    tables: HashMap<String, HashMap<String, i64>>,
}

impl ConstantTables {
    pub fn new() -> Self {
        ConstantTables { tables: HashMap::new() }
    }

    pub fn insert(&mut self, table: &str, keyword: &str, index: i64) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(keyword.to_string(), index);
    }

    /// Reads `index,keyword[,...]` rows into `table`. Text after `;` is a
    /// comment; blank rows and rows without a keyword are skipped.
    pub fn load_csv(&mut self, table: &str, source: &str, file: Rc<String>) -> Result<(), Error> {
        for (number, row) in source.lines().enumerate() {
            let row = match row.find(';') {
                Some(comment) => &row[..comment],
                None => row,
            };
            if row.trim().is_empty() {
                continue;
            }

            let mut columns = row.split(',').map(str::trim);
            let index = columns.next().unwrap_or_default();
            let keyword = columns.next().unwrap_or_default();
            if keyword.is_empty() {
                continue;
            }

            let index = index.parse::<i64>().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError { token: index.to_string() },
                    Position::new(Rc::clone(&file), number as u32 + 1, 0),
                )
            })?;
            self.insert(table, keyword, index);
        }

        Ok(())
    }

    pub fn lookup(&self, table: &str, keyword: &str) -> Option<i64> {
        self.tables.get(table)?.get(keyword).copied()
    }

    pub fn table(&self, table: &str) -> Option<&HashMap<String, i64>> {
        self.tables.get(table)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Upper-cases every table name and keyword.
    pub fn folded(self) -> Self {
        let mut folded = ConstantTables::new();
        for (table, entries) in self.tables {
            for (keyword, index) in entries {
                folded.insert(&table.to_uppercase(), &keyword.to_uppercase(), index);
            }
        }
        folded
    }
}
