//! Per-bank statement layouts
//!
//! Each layout locates its header row in a [`RawSheet`], coerces the body
//! rows and returns them in the bank's canonical column subset.

pub mod banco_macro;
pub mod coerce;
pub mod galicia;
pub mod icbc;
pub mod layout;
pub mod mercadopago;
pub mod nacion;
pub mod supervielle;

pub use coerce::NumberFormat;
pub use layout::Extracted;

use crate::domain::result::Result;
use crate::domain::{Bank, RawSheet, RowPolicy};

/// Run the layout for `bank` over a decoded sheet
pub fn extract(bank: Bank, sheet: &RawSheet, policy: RowPolicy) -> Result<Extracted> {
    match bank {
        Bank::Galicia => galicia::extract(sheet, policy),
        Bank::MercadoPago => mercadopago::extract(sheet, policy),
        Bank::Icbc => icbc::extract(sheet, policy),
        Bank::Supervielle => supervielle::extract(sheet, policy),
        Bank::Macro => banco_macro::extract(sheet, policy),
        Bank::Nacion => nacion::extract(sheet, policy),
    }
}
