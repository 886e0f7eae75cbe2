//! Minimal CSV reader for bulk invites. No quoting: cells are split on `,`
//! and trimmed.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub type CsvRecord = BTreeMap<String, String>;

static HEADER_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)email|user|type|name|phone").expect("header regex"));

/// Positional columns used when the file has no header line.
pub const POSITIONAL_COLUMNS: [&str; 4] = ["email", "userType", "full_name", "phone"];

/// Downloadable example file for admins.
pub const TEMPLATE_CSV: &str = "email,userType,full_name,phone\n\
cleidycleaner@gmail.com,cleaner,Cleidy Cleaner,(00)00000-0000\n\
empresa@exemplo.com,company,Empresa Exemplo,(00)00000-0000\n\
cliente@exemplo.com,client,Cliente Teste,(00)00000-0000\n";

fn cells(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

pub fn parse_csv(text: &str) -> Vec<CsvRecord> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(first_line) = lines.next() else {
        return Vec::new();
    };
    let first = cells(first_line);
    let has_header = first.iter().any(|h| HEADER_HINT.is_match(h));

    let body: Vec<&str> = if has_header {
        lines.collect()
    } else {
        std::iter::once(first_line).chain(lines).collect()
    };

    body.into_iter()
        .map(|line| {
            let cols = cells(line);
            let cell = |j: usize| cols.get(j).copied().unwrap_or("").to_string();
            if has_header {
                first.iter().enumerate().map(|(j, h)| (h.to_string(), cell(j))).collect()
            } else {
                let mut rec: CsvRecord =
                    POSITIONAL_COLUMNS.iter().enumerate().map(|(j, h)| (h.to_string(), cell(j))).collect();
                if rec["userType"].is_empty() {
                    rec.insert("userType".into(), "client".into());
                }
                rec
            }
        })
        .collect()
}

/// First non-empty value among `keys`.
pub fn first_field<'a>(rec: &'a CsvRecord, keys: &[&str]) -> Option<&'a str> {
    keys.iter().filter_map(|k| rec.get(*k)).map(|v| v.trim()).find(|v| !v.is_empty())
}
