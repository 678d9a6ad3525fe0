//! Banks command - list supported banks

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use extractos_core::Bank;

use crate::output;

#[derive(Serialize)]
struct BankInfo {
    bank: Bank,
    name: &'static str,
    formats: Vec<String>,
    columns: Vec<&'static str>,
}

pub fn run(json: bool) -> Result<()> {
    let banks: Vec<BankInfo> = Bank::ALL
        .iter()
        .map(|bank| BankInfo {
            bank: *bank,
            name: bank.display_name(),
            formats: bank.accepted_formats().iter().map(|f| f.to_string()).collect(),
            columns: bank.columns().iter().map(|c| c.header()).collect(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&banks)?);
        return Ok(());
    }

    println!("{}", "Supported banks".bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Bank", "Formats", "Columns"]);
    for info in &banks {
        table.add_row(vec![
            info.name.to_string(),
            info.formats.join(", "),
            info.columns.join(", "),
        ]);
    }
    println!("{}", table);
    Ok(())
}
