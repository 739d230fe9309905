use std::path::Path;

use fractal_form::validation::NATIONAL_ID_LEN;

/// One response read from a source: the raw values keyed by column name.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedResponse {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Spreadsheets store the CPF as a number and lose its leading zeros.
pub fn pad_national_id(value: &str) -> String {
    let v = value.trim();
    if !v.is_empty() && v.len() < NATIONAL_ID_LEN && v.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", v, width = NATIONAL_ID_LEN)
    } else {
        v.to_string()
    }
}
