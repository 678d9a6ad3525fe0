//! Bank tags and statement file formats

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;
use super::table::Column;

/// Supported banks. Each one maps to exactly one layout in `crate::banks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bank {
    Galicia,
    MercadoPago,
    Icbc,
    Supervielle,
    Macro,
    Nacion,
}

impl Bank {
    /// All banks in the order they are offered to the user
    pub const ALL: [Bank; 6] = [
        Bank::Galicia,
        Bank::MercadoPago,
        Bank::Icbc,
        Bank::Supervielle,
        Bank::Macro,
        Bank::Nacion,
    ];

    /// Name shown to users and written to the `bank` column
    pub fn display_name(&self) -> &'static str {
        match self {
            Bank::Galicia => "Galicia",
            Bank::MercadoPago => "MercadoPago",
            Bank::Icbc => "ICBC",
            Bank::Supervielle => "Supervielle",
            Bank::Macro => "Macro",
            Bank::Nacion => "Nación",
        }
    }

    /// File formats this bank exports
    pub fn accepted_formats(&self) -> &'static [FileFormat] {
        match self {
            Bank::Icbc | Bank::Supervielle => &[FileFormat::Workbook],
            Bank::Galicia | Bank::MercadoPago | Bank::Macro | Bank::Nacion => {
                &[FileFormat::Delimited, FileFormat::Workbook]
            }
        }
    }

    pub fn accepts(&self, format: FileFormat) -> bool {
        self.accepted_formats().contains(&format)
    }

    /// Canonical columns produced for this bank, in output order
    pub fn columns(&self) -> &'static [Column] {
        use Column as C;
        match self {
            Bank::Galicia => &[
                C::Bank, C::Date, C::Description, C::Reference, C::TransactionType, C::Debit,
                C::Credit, C::Amount, C::Balance, C::Currency,
            ],
            Bank::MercadoPago => &[
                C::Bank, C::Date, C::Description, C::Reference, C::TransactionType, C::Amount,
                C::Balance, C::Currency,
            ],
            Bank::Icbc => &[
                C::Bank, C::Date, C::Description, C::Debit, C::Credit, C::Amount, C::Balance,
                C::Currency, C::Account,
            ],
            Bank::Supervielle => &[
                C::Bank, C::Date, C::Description, C::Debit, C::Credit, C::Amount, C::Balance,
                C::Currency,
            ],
            Bank::Macro => &[
                C::Bank, C::Date, C::Description, C::Reference, C::Debit, C::Credit, C::Amount,
                C::Balance, C::Currency,
            ],
            Bank::Nacion => &[
                C::Bank, C::Date, C::Description, C::Reference, C::TransactionType, C::Amount,
                C::Balance, C::Currency,
            ],
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Bank {
    type Err = Error;

    /// Accepts display names and loose spellings: `nacion`, `Banco Nación`, `mercado-pago`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = fold_label(s)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let key = key.strip_prefix("banco").unwrap_or(&key);

        match key {
            "galicia" => Ok(Bank::Galicia),
            "mercadopago" | "mp" => Ok(Bank::MercadoPago),
            "icbc" => Ok(Bank::Icbc),
            "supervielle" => Ok(Bank::Supervielle),
            "macro" => Ok(Bank::Macro),
            "nacion" | "bna" => Ok(Bank::Nacion),
            _ => Err(Error::validation(format!(
                "Unknown bank '{}'. Expected one of: {}",
                s,
                Bank::ALL.iter().map(|b| b.display_name()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

/// Container format of a statement file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Spreadsheet workbook (xlsx, xlsm, xls, ods)
    Workbook,
    /// Delimited text (csv, tsv, txt)
    Delimited,
}

impl FileFormat {
    /// Declared format from a file name's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileFormat::Workbook),
            "csv" | "tsv" | "txt" => Some(FileFormat::Delimited),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Workbook => f.write_str("workbook"),
            FileFormat::Delimited => f.write_str("delimited text"),
        }
    }
}

/// Lowercase, trim and strip Spanish accents so labels compare loosely
pub fn fold_label(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
