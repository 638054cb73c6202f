// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::{Duration, NaiveDate};

use crate::cfr::{io_common::SnapshotColumns, *};

pub fn read_excel_snapshots(
    path: &str,
    worksheet_name: Option<&str>,
) -> CfrResult<Vec<ParsedSnapshot>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu { path })?;
    let header: Vec<String> = header_cells
        .iter()
        .map(|c| read_cell(c, 1))
        .collect::<CfrResult<Vec<String>>>()?;
    debug!("read_excel_snapshots: header: {:?}", header);
    let columns = SnapshotColumns::from_header(&header, path)?;

    let mut res: Vec<ParsedSnapshot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row
            .iter()
            .map(|c| read_cell(c, lineno))
            .collect::<CfrResult<Vec<String>>>()?;
        // Trailing empty rows are common in spreadsheets.
        if cells.iter().all(|s| s.is_empty()) {
            continue;
        }
        let mut ps = columns.extract(&cells, lineno)?;
        ps.date = serial_date_text(&ps.date);
        debug!("read_excel_snapshots: lineno: {:?} row: {:?}", lineno, &ps);
        res.push(ps);
    }
    info!(
        "read_excel_snapshots: read {} rows from {}",
        res.len(),
        io_common::simplify_file_name(path)
    );
    Ok(res)
}

/// Renders a cell the way it would appear in a CSV export.
fn read_cell(cell: &DataType, lineno: usize) -> CfrResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::DateTime(serial) => {
            let date = excel_serial_to_date(*serial).context(ExcelCellSnafu {
                cell: format!("{:?}", cell),
                lineno,
            })?;
            Ok(date.format("%Y-%m-%d").to_string())
        }
        DataType::Empty => Ok("".to_string()),
        _ => ExcelCellSnafu {
            cell: format!("{:?}", cell),
            lineno,
        }
        .fail(),
    }
}

/// Dates without a date format show up as plain serial numbers.
fn serial_date_text(s: &str) -> String {
    if io_common::parse_date(s).is_some() {
        return s.to_string();
    }
    match s.parse::<f64>().ok().and_then(excel_serial_to_date) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => s.to_string(),
    }
}

/// Excel counts days from 1899-12-30 (this accounts for the 1900 leap year bug).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
