use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::{Duration, NaiveDate};

use crate::forms::config_reader::ResponseSource;
use crate::forms::io_common::{make_default_id, pad_national_id, ParsedResponse};
use crate::forms::*;

fn get_range(path: &str, source: &ResponseSource) -> FormsResult<calamine::Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, &source.excel_worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange_o = match &source.excel_worksheet_name {
        // A worksheet name was provided, use it.
        Some(worksheet_name) => workbook.worksheet_range(worksheet_name),
        None => workbook.worksheet_range_at(0),
    };
    let wrange = wrange_o
        .context(MissingWorksheetSnafu {
            path,
            name: source.excel_worksheet_name.clone().unwrap_or_default(),
        })?
        .context(OpeningExcelSnafu { path })?;
    Ok(wrange)
}

/// Dates are stored as a number of days since 1899-12-30.
fn excel_date(serial: f64) -> Option<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    start.checked_add_signed(Duration::days(serial.floor() as i64))
}

pub fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => match excel_date(*serial) {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None => serial.to_string(),
        },
        DataType::Empty => "".to_string(),
        other => format!("{:?}", other),
    }
}

/// Birth dates may be typed as plain numbers: whole numbers are read as day serials.
fn read_date_cell(cell: &DataType) -> String {
    let serial = match cell {
        DataType::Float(f) if f.fract() == 0.0 => *f,
        DataType::Int(i) => *i as f64,
        other => return read_cell(other),
    };
    match excel_date(serial) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => read_cell(cell),
    }
}

/// Reads a spreadsheet whose header row holds the wire names of the fields.
/// Every following row with at least one value is a response.
pub fn read_xlsx_responses(path: &str, source: &ResponseSource) -> FormsResult<Vec<ParsedResponse>> {
    let default_id = make_default_id(path);
    let first_row = source.first_row_index()?;
    let wrange = get_range(path, source)?;

    let mut rows = wrange.rows().skip(first_row);
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(read_cell)
        .collect();
    debug!("read_xlsx_responses: header: {:?}", header);

    let mut res: Vec<ParsedResponse> = Vec::new();
    for (idx, row) in rows.enumerate() {
        // 1-based line number in the spreadsheet.
        let lineno = first_row + idx + 2;
        let fields: Vec<(String, String)> = header
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, cell)| match name.as_str() {
                "nationalId" => (name.clone(), pad_national_id(&read_cell(cell))),
                "birthDate" => (name.clone(), read_date_cell(cell)),
                _ => (name.clone(), read_cell(cell)),
            })
            .collect();
        if fields.iter().all(|(_, v)| v.is_empty()) {
            debug!("read_xlsx_responses: skipping empty line {}", lineno);
            continue;
        }
        res.push(ParsedResponse {
            id: default_id(lineno),
            fields,
        });
    }
    Ok(res)
}
