// Primitives for reading CSV files.

use crate::cfr::{io_common::SnapshotColumns, *};

pub fn read_csv_snapshots(path: &str) -> CfrResult<Vec<ParsedSnapshot>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_snapshots: header: {:?}", header);
    let columns = SnapshotColumns::from_header(&header, path)?;

    let mut res: Vec<ParsedSnapshot> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<&str> = line.iter().collect();
        let ps = columns.extract(&cells, lineno)?;
        debug!("read_csv_snapshots: lineno: {:?} row: {:?}", lineno, &ps);
        res.push(ps);
    }
    info!(
        "read_csv_snapshots: read {} rows from {}",
        res.len(),
        io_common::simplify_file_name(path)
    );
    Ok(res)
}
