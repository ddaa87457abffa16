// Storage key conventions.
//   entity prefix:  idGaragem=42/
//   raw exports:    idGaragem=42/ano=2024/mes=03/dia=05/*.csv
//   dashboard:      idGaragem=42/dashboard_42.json

use chrono::{Datelike, NaiveDate};

pub const PREFIX_DELIMITER: &str = "/";
pub const RAW_EXTENSION: &str = ".csv";

/// Identifier from an entity prefix: `idGaragem=42/` -> `42`. Prefixes without `=` keep their text.
pub fn entity_id_from_prefix(prefix: &str) -> String {
    let segment = prefix.trim_matches('/');
    match segment.split_once('=') {
        Some((_, value)) => value.replace('/', ""),
        None => segment.replace('/', ""),
    }
}

/// Normalizes to exactly one trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

pub fn day_prefix(entity_prefix: &str, date: NaiveDate) -> String {
    format!(
        "{}ano={}/mes={:02}/dia={:02}/",
        normalize_prefix(entity_prefix),
        date.year(),
        date.month(),
        date.day()
    )
}

pub fn dashboard_key(entity_prefix: &str, entity_id: &str) -> String {
    format!("{}dashboard_{}.json", normalize_prefix(entity_prefix), entity_id)
}

/// Last path segment of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

pub fn is_raw_export(key: &str) -> bool {
    key.ends_with(RAW_EXTENSION)
}

/// Raw export keys of a day, ordered by file name (ties broken by full key).
pub fn sort_by_file_name(keys: &mut [String]) {
    keys.sort_by(|a, b| file_name(a).cmp(file_name(b)).then_with(|| a.cmp(b)));
}
