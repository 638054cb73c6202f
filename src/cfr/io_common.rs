use std::path::Path;

use chrono::NaiveDate;

use crate::cfr::*;

pub const DATE_COLUMN: &str = "Date";
pub const COUNTRY_COLUMN: &str = "Country";
pub const TOTAL_CASES_COLUMN: &str = "Total Cases";
pub const TOTAL_DEATHS_COLUMN: &str = "Total Deaths";
pub const TOTAL_TESTS_COLUMN: &str = "Total Tests";
pub const POPULATION_COLUMN: &str = "Population";

/// The date formats accepted on the command line and in the data files.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parses a count. Empty cells count as zero, and floating point numbers are accepted
/// as long as they are integers.
pub fn parse_count(s: &str, column: &str, lineno: usize) -> CfrResult<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }
    if let Ok(x) = s.parse::<u64>() {
        return Ok(x);
    }
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() && x >= 0.0 && x.fract() == 0.0 => Ok(x as u64),
        _ => InvalidCountSnafu {
            column,
            value: s,
            lineno,
        }
        .fail(),
    }
}

/// The position of the columns of interest in the header of a data file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SnapshotColumns {
    date: usize,
    country: usize,
    total_cases: usize,
    total_deaths: usize,
    total_tests: usize,
    population: usize,
}

impl SnapshotColumns {
    pub fn from_header<S: AsRef<str>>(header: &[S], path: &str) -> CfrResult<SnapshotColumns> {
        let find = |column: &str| -> CfrResult<usize> {
            header
                .iter()
                .position(|h| h.as_ref().trim() == column)
                .context(MissingColumnSnafu { column, path })
        };
        Ok(SnapshotColumns {
            date: find(DATE_COLUMN)?,
            country: find(COUNTRY_COLUMN)?,
            total_cases: find(TOTAL_CASES_COLUMN)?,
            total_deaths: find(TOTAL_DEATHS_COLUMN)?,
            total_tests: find(TOTAL_TESTS_COLUMN)?,
            population: find(POPULATION_COLUMN)?,
        })
    }

    pub fn extract<S: AsRef<str>>(&self, cells: &[S], lineno: usize) -> CfrResult<ParsedSnapshot> {
        let get = |idx: usize| -> CfrResult<String> {
            cells
                .get(idx)
                .map(|s| s.as_ref().trim().to_string())
                .context(LineTooShortSnafu { lineno })
        };
        Ok(ParsedSnapshot {
            lineno,
            date: get(self.date)?,
            country: get(self.country)?,
            total_cases: get(self.total_cases)?,
            total_deaths: get(self.total_deaths)?,
            total_tests: get(self.total_tests)?,
            population: get(self.population)?,
        })
    }
}

/// Turns the rows of a data file into snapshots.
pub fn validate_snapshots(parsed: &[ParsedSnapshot]) -> CfrResult<Vec<DailyCountrySnapshot>> {
    let mut res: Vec<DailyCountrySnapshot> = Vec::new();
    for ps in parsed.iter() {
        let lineno = ps.lineno;
        if ps.country.is_empty() {
            warn!(
                "validate_snapshots: line {}: skipping row without country",
                lineno
            );
            continue;
        }
        let date = parse_date(&ps.date).context(InvalidDateSnafu {
            value: ps.date.clone(),
            lineno,
        })?;
        let snapshot = DailyCountrySnapshot {
            country: ps.country.clone(),
            date,
            total_cases: parse_count(&ps.total_cases, TOTAL_CASES_COLUMN, lineno)?,
            total_deaths: parse_count(&ps.total_deaths, TOTAL_DEATHS_COLUMN, lineno)?,
            total_tests: parse_count(&ps.total_tests, TOTAL_TESTS_COLUMN, lineno)?,
            population: parse_count(&ps.population, POPULATION_COLUMN, lineno)?,
        };
        debug!("validate_snapshots: line {}: {:?}", lineno, snapshot);
        res.push(snapshot);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2020, 5, 18).unwrap();
        assert_eq!(parse_date("2020-05-18"), Some(d));
        assert_eq!(parse_date(" 18/05/2020 "), Some(d));
        assert_eq!(parse_date("May 18"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1234", "x", 1).unwrap(), 1234);
        assert_eq!(parse_count("1234.0", "x", 1).unwrap(), 1234);
        assert_eq!(parse_count("", "x", 1).unwrap(), 0);
        assert_eq!(parse_count("  ", "x", 1).unwrap(), 0);
        assert!(parse_count("12.5", "x", 1).is_err());
        assert!(parse_count("-3", "x", 1).is_err());
        assert!(parse_count("n/a", "x", 1).is_err());
    }

    #[test]
    fn header_in_any_order() {
        let header = vec![
            "Population",
            "Country",
            " Date ",
            "Total Tests",
            "Active Cases",
            "Total Deaths",
            "Total Cases",
        ];
        let cols = SnapshotColumns::from_header(&header, "data.csv").unwrap();
        let row = vec![
            "330000000",
            "USA",
            "2020-05-18",
            "12000000",
            "900000",
            "90000",
            "1500000",
        ];
        let ps = cols.extract(&row, 2).unwrap();
        assert_eq!(ps.country, "USA");
        assert_eq!(ps.total_cases, "1500000");
        assert_eq!(ps.total_deaths, "90000");
        assert_eq!(ps.total_tests, "12000000");
        assert_eq!(ps.population, "330000000");

        assert!(cols.extract(&row[..3], 3).is_err());
    }

    #[test]
    fn missing_column() {
        let header = vec!["Date", "Country", "Total Cases"];
        let err = SnapshotColumns::from_header(&header, "data.csv").unwrap_err();
        assert!(err.to_string().contains("Total Deaths"));
    }

    #[test]
    fn validation() {
        let row = |lineno: usize, country: &str, date: &str, cases: &str| ParsedSnapshot {
            lineno,
            date: date.to_string(),
            country: country.to_string(),
            total_cases: cases.to_string(),
            total_deaths: "10".to_string(),
            total_tests: "".to_string(),
            population: "1000.0".to_string(),
        };
        let snaps = validate_snapshots(&[
            row(2, "Iceland", "2020-05-18", "1802"),
            row(3, "", "2020-05-18", "1"),
        ])
        .unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].total_cases, 1802);
        assert_eq!(snaps[0].total_tests, 0);
        assert_eq!(snaps[0].population, 1000);

        assert!(validate_snapshots(&[row(4, "Iceland", "yesterday", "1")]).is_err());
        assert!(validate_snapshots(&[row(5, "Iceland", "2020-05-18", "many")]).is_err());
    }
}
