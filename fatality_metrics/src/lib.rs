/*!
Case fatality ratios for countries with good testing.

The naive death rate of a country (deaths divided by confirmed cases) is biased upward
when the country does not test much: only the most severe cases get confirmed. This crate
estimates a less biased death rate by only looking at the countries that run many tests
for each positive case.

```
use chrono::NaiveDate;
use fatality_metrics::builder::Builder;
use fatality_metrics::AnalysisRules;

let date = NaiveDate::from_ymd_opt(2020, 5, 18).unwrap();
let mut builder = Builder::new(&AnalysisRules::DEFAULT_RULES)?;
builder.add_snapshot_simple("A", date, 2000, 40, 100_000)?;
builder.add_snapshot_simple("B", date, 1500, 15, 90_000)?;

let result = builder.analyze(date)?;
assert_eq!(result.count_above_min_cases(), 2);
assert_eq!(result.count_good_testing(), 1);
assert_eq!(result.estimated_death_rate, Some(1.0));
# Ok::<(), fatality_metrics::AnalysisErrors>(())
```
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::BTreeSet;

use chrono::NaiveDate;

pub use crate::config::*;

/// Derives the case fatality ratio and the testing quality of each snapshot of the given date.
///
/// The rows are returned in input order. Rows without any case are kept: their ratios
/// are not finite, and any minimum cases threshold removes them.
pub fn compute_fatality_metrics(
    rows: &[DailyCountrySnapshot],
    date: NaiveDate,
) -> Vec<CountryMetrics> {
    let res: Vec<CountryMetrics> = rows
        .iter()
        .filter(|s| s.date == date)
        .map(|s| {
            if s.total_deaths > s.total_cases {
                warn!(
                    "compute_fatality_metrics: {} on {} reports more deaths ({}) than cases ({})",
                    s.country, s.date, s.total_deaths, s.total_cases
                );
            }
            let cases = s.total_cases as f64;
            CountryMetrics {
                snapshot: s.clone(),
                case_fatality_ratio: s.total_deaths as f64 / cases,
                tests_per_positive_case: s.total_tests as f64 / cases,
            }
        })
        .collect();
    debug!(
        "compute_fatality_metrics: {} rows out of {} for date {}",
        res.len(),
        rows.len(),
        date
    );
    res
}

/// Applies the minimum cases filter then the testing quality filter, and aggregates the
/// good testing countries.
///
/// Both filters are strict. The estimated death rate is the ratio of the summed deaths
/// over the summed cases: larger countries weigh more than smaller ones.
pub fn filter_and_aggregate(
    rows: &[CountryMetrics],
    rules: &AnalysisRules,
) -> Result<FilteredMetrics, AnalysisErrors> {
    rules.validate()?;

    let above_min_cases: Vec<CountryMetrics> = rows
        .iter()
        .filter(|m| m.snapshot.total_cases > rules.min_cases_threshold)
        .cloned()
        .collect();

    let good_testing: Vec<CountryMetrics> = above_min_cases
        .iter()
        .filter(|m| m.tests_per_positive_case > rules.testing_quality_threshold)
        .cloned()
        .collect();

    let estimated_death_rate = estimated_death_rate(&good_testing);
    debug!(
        "filter_and_aggregate: {} rows -> {} above {} cases -> {} above {} tests per case, rate: {:?}",
        rows.len(),
        above_min_cases.len(),
        rules.min_cases_threshold,
        good_testing.len(),
        rules.testing_quality_threshold,
        estimated_death_rate
    );

    Ok(FilteredMetrics {
        above_min_cases,
        good_testing,
        estimated_death_rate,
    })
}

/// The death rate, in percent, of a group of countries taken as a whole.
///
/// Returns None if the group has no case at all.
pub fn estimated_death_rate(rows: &[CountryMetrics]) -> Option<f64> {
    let total_cases: u64 = rows.iter().map(|m| m.snapshot.total_cases).sum();
    let total_deaths: u64 = rows.iter().map(|m| m.snapshot.total_deaths).sum();
    if total_cases == 0 {
        None
    } else {
        Some(100.0 * total_deaths as f64 / total_cases as f64)
    }
}

/// Runs the full analysis for one date.
///
/// Arguments:
/// * `rows` the complete dataset, all dates included
/// * `date` the day to analyze
/// * `rules` the thresholds
pub fn run_analysis(
    rows: &[DailyCountrySnapshot],
    date: NaiveDate,
    rules: &AnalysisRules,
) -> Result<AnalysisResult, AnalysisErrors> {
    info!(
        "run_analysis: Processing {:?} snapshots, date: {}, rules: {:?}",
        rows.len(),
        date,
        rules
    );
    if rows.is_empty() {
        return Err(AnalysisErrors::EmptyDataset);
    }
    let metrics = compute_fatality_metrics(rows, date);
    let num_countries = metrics.len();
    let filtered = filter_and_aggregate(&metrics, rules)?;
    info!(
        "run_analysis: {} countries with more than {} cases, {} with more than {} tests per case",
        filtered.above_min_cases.len(),
        rules.min_cases_threshold,
        filtered.good_testing.len(),
        rules.testing_quality_threshold
    );
    Ok(AnalysisResult {
        date,
        num_countries,
        above_min_cases: filtered.above_min_cases,
        good_testing: filtered.good_testing,
        estimated_death_rate: filtered.estimated_death_rate,
    })
}

/// All the dates present in the dataset, sorted and without duplicates.
pub fn available_dates(rows: &[DailyCountrySnapshot]) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = rows.iter().map(|s| s.date).collect();
    dates.into_iter().collect()
}

/// The most recent date of the dataset, which is the default date to analyze.
pub fn latest_date(rows: &[DailyCountrySnapshot]) -> Option<NaiveDate> {
    rows.iter().map(|s| s.date).max()
}

/// All the snapshots of one country, in input order.
pub fn rows_for_country<'a>(
    rows: &'a [DailyCountrySnapshot],
    country: &str,
) -> Vec<&'a DailyCountrySnapshot> {
    rows.iter().filter(|s| s.country == country).collect()
}

/// The good testing countries, best testers first.
pub fn good_testing_table(result: &AnalysisResult) -> Vec<&CountryMetrics> {
    let mut table: Vec<&CountryMetrics> = result.good_testing.iter().collect();
    table.sort_by(|a, b| {
        b.tests_per_positive_case
            .total_cmp(&a.tests_per_positive_case)
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, d).unwrap()
    }

    fn snap(
        country: &str,
        date: NaiveDate,
        cases: u64,
        deaths: u64,
        tests: u64,
    ) -> DailyCountrySnapshot {
        DailyCountrySnapshot {
            country: country.to_string(),
            date,
            total_cases: cases,
            total_deaths: deaths,
            total_tests: tests,
            population: 1_000_000,
        }
    }

    fn sample() -> Vec<DailyCountrySnapshot> {
        vec![
            snap("A", day(18), 2000, 40, 100_000),
            snap("B", day(18), 1500, 15, 90_000),
            snap("C", day(18), 800, 80, 100_000),
            snap("D", day(18), 0, 0, 1000),
            snap("E", day(18), 50_000, 5000, 500_000),
            snap("A", day(17), 1900, 38, 95_000),
        ]
    }

    #[test]
    fn two_countries_example() {
        init();
        let rows = vec![
            snap("A", day(18), 2000, 40, 100_000),
            snap("B", day(18), 1500, 15, 90_000),
        ];
        let res = run_analysis(&rows, day(18), &AnalysisRules::DEFAULT_RULES).unwrap();
        assert_eq!(res.count_above_min_cases(), 2);
        assert_eq!(res.count_good_testing(), 1);
        assert_eq!(res.good_testing[0].snapshot.country, "B");
        let rate = res.estimated_death_rate.unwrap();
        assert!((rate - 1.0).abs() < 1e-12);
        assert_eq!(format!("{:.2}", rate), "1.00");
    }

    #[test]
    fn ratios_recover_the_counts() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        for m in metrics.iter().filter(|m| m.snapshot.total_cases > 0) {
            let deaths = m.case_fatality_ratio * m.snapshot.total_cases as f64;
            assert!((deaths - m.snapshot.total_deaths as f64).abs() < 1e-9);
            let tests = m.tests_per_positive_case * m.snapshot.total_cases as f64;
            assert!((tests - m.snapshot.total_tests as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn only_the_selected_date() {
        let metrics = compute_fatality_metrics(&sample(), day(17));
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].snapshot.total_cases, 1900);

        assert!(compute_fatality_metrics(&sample(), day(1)).is_empty());
    }

    #[test]
    fn zero_cases_are_not_finite_and_filtered_out() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        let d = metrics.iter().find(|m| m.snapshot.country == "D").unwrap();
        assert!(d.case_fatality_ratio.is_nan());
        assert!(d.tests_per_positive_case.is_infinite());

        let rules = AnalysisRules {
            min_cases_threshold: 0,
            testing_quality_threshold: 0.0,
        };
        let res = filter_and_aggregate(&metrics, &rules).unwrap();
        let above = &res.above_min_cases;
        assert!(above.iter().all(|m| m.snapshot.country != "D"));
    }

    #[test]
    fn good_testing_is_a_subset() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        for min_cases in [0, 100, 1000, 1500, 10_000] {
            for quality in [0.0, 5.0, 10.0, 50.0, 60.0, 100.0] {
                let rules = AnalysisRules {
                    min_cases_threshold: min_cases,
                    testing_quality_threshold: quality,
                };
                let res = filter_and_aggregate(&metrics, &rules).unwrap();
                for m in res.good_testing.iter() {
                    assert!(res.above_min_cases.contains(m));
                    assert!(m.tests_per_positive_case > quality);
                }
                for m in res.above_min_cases.iter() {
                    assert!(m.snapshot.total_cases > min_cases);
                }
            }
        }
    }

    #[test]
    fn rate_is_a_percentage() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        let rules = AnalysisRules {
            min_cases_threshold: 100,
            testing_quality_threshold: 5.0,
        };
        let res = filter_and_aggregate(&metrics, &rules).unwrap();
        let rate = res.estimated_death_rate.unwrap();
        assert!((0.0..=100.0).contains(&rate));
    }

    #[test]
    fn sum_of_ratios_not_mean_of_ratios() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        let rules = AnalysisRules {
            min_cases_threshold: 1000,
            testing_quality_threshold: 5.0,
        };
        let res = filter_and_aggregate(&metrics, &rules).unwrap();
        // A, B and E: (40 + 15 + 5000) / (2000 + 1500 + 50000)
        assert_eq!(res.good_testing.len(), 3);
        let expected = 100.0 * 5055.0 / 53500.0;
        assert!((res.estimated_death_rate.unwrap() - expected).abs() < 1e-12);
        let mean: f64 = res
            .good_testing
            .iter()
            .map(|m| m.death_rate_percent())
            .sum::<f64>()
            / 3.0;
        assert!((mean - expected).abs() > 1.0);
    }

    #[test]
    fn no_good_testing_country() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        let rules = AnalysisRules {
            min_cases_threshold: 1000,
            testing_quality_threshold: 1000.0,
        };
        let res = filter_and_aggregate(&metrics, &rules).unwrap();
        assert_eq!(res.above_min_cases.len(), 3);
        assert!(res.good_testing.is_empty());
        assert_eq!(res.estimated_death_rate, None);
    }

    #[test]
    fn zero_denominator() {
        assert_eq!(estimated_death_rate(&[]), None);
    }

    #[test]
    fn invalid_rules() {
        let metrics = compute_fatality_metrics(&sample(), day(18));
        let rules = AnalysisRules {
            min_cases_threshold: 1000,
            testing_quality_threshold: -1.0,
        };
        assert_eq!(
            filter_and_aggregate(&metrics, &rules),
            Err(AnalysisErrors::InvalidQualityThreshold(-1.0))
        );
        assert_eq!(
            run_analysis(&[], day(18), &AnalysisRules::DEFAULT_RULES),
            Err(AnalysisErrors::EmptyDataset)
        );
    }

    #[test]
    fn usual_ranges() {
        assert!(AnalysisRules::DEFAULT_RULES.within_usual_ranges());
        let rules = AnalysisRules {
            min_cases_threshold: 50,
            testing_quality_threshold: 50.0,
        };
        assert!(!rules.within_usual_ranges());
    }

    #[test]
    fn dates_and_countries() {
        let rows = sample();
        assert_eq!(available_dates(&rows), vec![day(17), day(18)]);
        assert_eq!(latest_date(&rows), Some(day(18)));
        assert_eq!(latest_date(&[]), None);
        let a = rows_for_country(&rows, "A");
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].date, day(17));
        assert!(rows_for_country(&rows, "Z").is_empty());
    }

    #[test]
    fn table_is_sorted_by_testing_quality() {
        let rules = AnalysisRules {
            min_cases_threshold: 100,
            testing_quality_threshold: 5.0,
        };
        let res = run_analysis(&sample(), day(18), &rules).unwrap();
        let names: Vec<&str> = good_testing_table(&res)
            .iter()
            .map(|m| m.snapshot.country.as_str())
            .collect();
        // C: 125, B: 60, A: 50, E: 10
        assert_eq!(names, vec!["C", "B", "A", "E"]);
    }
}
