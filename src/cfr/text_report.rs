// Plain text rendering of the results, for the terminal.

use std::fmt::Write as _;

use crate::cfr::*;

pub const NO_GOOD_TESTING_MESSAGE: &str =
    "No countries meet the selected testing quality threshold. Try adjusting the filters.";

pub fn format_report(result: &AnalysisResult, rules: &AnalysisRules) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Data for {}", result.date);
    let _ = writeln!(
        s,
        "Countries with more than {} cases: {}",
        rules.min_cases_threshold,
        result.count_above_min_cases()
    );
    let _ = writeln!(
        s,
        "Countries with testing quality > {} tests per positive case: {}",
        rules.testing_quality_threshold,
        result.count_good_testing()
    );

    let table = good_testing_table(result);
    if table.is_empty() {
        let _ = writeln!(s, "{}", NO_GOOD_TESTING_MESSAGE);
        return s;
    }

    let _ = writeln!(s);
    let _ = writeln!(
        s,
        "{:<24} {:>12} {:>12} {:>14} {:>14} {:>14}",
        "Country", "Total Cases", "Total Deaths", "Total Tests", "Tests/Case", "Fatality Ratio"
    );
    for m in table.iter() {
        let _ = writeln!(
            s,
            "{:<24} {:>12} {:>12} {:>14} {:>14.2} {:>14.4}",
            m.snapshot.country,
            m.snapshot.total_cases,
            m.snapshot.total_deaths,
            m.snapshot.total_tests,
            m.tests_per_positive_case,
            m.case_fatality_ratio
        );
    }
    let _ = writeln!(s);
    if let Some(rate) = result.estimated_death_rate {
        let _ = writeln!(
            s,
            "Estimated death rate (countries with good testing): {:.2}%",
            rate
        );
    }
    s
}

pub fn format_snapshots(rows: &[&DailyCountrySnapshot]) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{:<12} {:<24} {:>12} {:>12} {:>14} {:>14}",
        "Date", "Country", "Total Cases", "Total Deaths", "Total Tests", "Population"
    );
    for r in rows.iter() {
        let _ = writeln!(
            s,
            "{:<12} {:<24} {:>12} {:>12} {:>14} {:>14}",
            r.date.to_string(),
            r.country,
            r.total_cases,
            r.total_deaths,
            r.total_tests,
            r.population
        );
    }
    s
}
