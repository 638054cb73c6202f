// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// The cumulative counts reported by one country on one day.
///
/// All the counts are totals since the start of the epidemic, not daily increments.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct DailyCountrySnapshot {
    pub country: String,
    pub date: NaiveDate,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub total_tests: u64,
    pub population: u64,
}

// ******** Output data structures *********

/// A snapshot, augmented with the ratios derived from it.
///
/// Both ratios are non-finite when the country reports no case.
#[derive(PartialEq, Debug, Clone)]
pub struct CountryMetrics {
    pub snapshot: DailyCountrySnapshot,
    /// Total deaths divided by total cases.
    pub case_fatality_ratio: f64,
    /// Total tests divided by total cases.
    pub tests_per_positive_case: f64,
}

impl CountryMetrics {
    pub fn death_rate_percent(&self) -> f64 {
        100.0 * self.case_fatality_ratio
    }
}

/// The outcome of the two threshold filters and of the aggregation.
#[derive(PartialEq, Debug, Clone)]
pub struct FilteredMetrics {
    /// The countries with strictly more cases than the minimum.
    pub above_min_cases: Vec<CountryMetrics>,
    /// The subset of `above_min_cases` with a testing quality strictly above the threshold.
    pub good_testing: Vec<CountryMetrics>,
    /// The death rate (in percent) of the good testing countries, taken as a whole.
    /// None when there is no good testing country.
    pub estimated_death_rate: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisResult {
    pub date: NaiveDate,
    /// Number of snapshots found for this date, before any filtering.
    pub num_countries: usize,
    pub above_min_cases: Vec<CountryMetrics>,
    pub good_testing: Vec<CountryMetrics>,
    pub estimated_death_rate: Option<f64>,
}

impl AnalysisResult {
    pub fn count_above_min_cases(&self) -> usize {
        self.above_min_cases.len()
    }

    pub fn count_good_testing(&self) -> usize {
        self.good_testing.len()
    }
}

/// Errors that prevent the analysis from completing.
#[derive(PartialEq, Debug, Clone)]
pub enum AnalysisErrors {
    /// The testing quality threshold must be a non-negative number.
    InvalidQualityThreshold(f64),
    /// No snapshot was provided.
    EmptyDataset,
    /// A snapshot without country name, for the given date.
    EmptyCountry(NaiveDate),
    /// A second snapshot for the same country and the same date.
    DuplicateSnapshot(String, NaiveDate),
}

impl Error for AnalysisErrors {}

impl Display for AnalysisErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisErrors::InvalidQualityThreshold(x) => {
                write!(f, "invalid testing quality threshold: {}", x)
            }
            AnalysisErrors::EmptyDataset => write!(f, "the dataset contains no snapshot"),
            AnalysisErrors::EmptyCountry(date) => {
                write!(f, "snapshot without country name on {}", date)
            }
            AnalysisErrors::DuplicateSnapshot(country, date) => {
                write!(f, "more than one snapshot for {} on {}", country, date)
            }
        }
    }
}

// ********* Configuration **********

/// The two thresholds of the analysis.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisRules {
    /// Countries with this many cases or fewer are ignored.
    pub min_cases_threshold: u64,
    /// Number of tests per positive case above which a country is considered to test well.
    pub testing_quality_threshold: f64,
}

impl AnalysisRules {
    pub const DEFAULT_RULES: AnalysisRules = AnalysisRules {
        min_cases_threshold: 1000,
        testing_quality_threshold: 50.0,
    };

    /// The range offered by the interactive tools for the minimum number of cases.
    pub const MIN_CASES_RANGE: (u64, u64) = (100, 10_000);
    /// The range offered by the interactive tools for the testing quality.
    pub const TESTING_QUALITY_RANGE: (f64, f64) = (5.0, 100.0);

    pub fn validate(&self) -> Result<(), AnalysisErrors> {
        let t = self.testing_quality_threshold;
        if t.is_nan() || t < 0.0 {
            return Err(AnalysisErrors::InvalidQualityThreshold(t));
        }
        Ok(())
    }

    /// True if both thresholds lie within the ranges historically offered to the analysts.
    pub fn within_usual_ranges(&self) -> bool {
        let (min_c, max_c) = AnalysisRules::MIN_CASES_RANGE;
        let (min_q, max_q) = AnalysisRules::TESTING_QUALITY_RANGE;
        (min_c..=max_c).contains(&self.min_cases_threshold)
            && (min_q..=max_q).contains(&self.testing_quality_threshold)
    }
}

impl Default for AnalysisRules {
    fn default() -> Self {
        AnalysisRules::DEFAULT_RULES
    }
}
