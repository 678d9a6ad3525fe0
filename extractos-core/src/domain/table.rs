//! Typed tables and the canonical statement schema

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Canonical statement columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Bank,
    Date,
    Description,
    Reference,
    TransactionType,
    Debit,
    Credit,
    Amount,
    Balance,
    Currency,
    Account,
}

impl Column {
    /// Header written to the output workbook
    pub fn header(&self) -> &'static str {
        match self {
            Column::Bank => "Banco",
            Column::Date => "Fecha",
            Column::Description => "Descripción",
            Column::Reference => "Referencia",
            Column::TransactionType => "Tipo de movimiento",
            Column::Debit => "Débito",
            Column::Credit => "Crédito",
            Column::Amount => "Importe",
            Column::Balance => "Saldo",
            Column::Currency => "Moneda",
            Column::Account => "Cuenta",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A typed scalar cell value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Text(String),
    Date(NaiveDate),
    Number(Decimal),
    Currency(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Currency(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Currency(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            Value::Number(n) => write!(f, "{:.2}", n),
        }
    }
}

/// A cell is either a value or null
pub type Cell = Option<Value>;

/// Rectangular table: every row has one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table over canonical columns
    pub fn with_columns(columns: &[Column]) -> Self {
        Self::new(columns.iter().map(|c| c.header()))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, rejecting rows whose width differs from the column count
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::validation(format!(
                "Row has {} cells but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Cell at `row` under the named column
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    /// All cells of one column, top to bottom
    pub fn column_values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Cell> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }
}
