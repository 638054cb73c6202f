pub use crate::config::*;

use std::collections::HashSet;

use chrono::NaiveDate;

/// A builder for collecting snapshots before running the analysis.
///
/// ```
/// use chrono::NaiveDate;
/// pub use fatality_metrics::builder::Builder;
/// pub use fatality_metrics::AnalysisRules;
/// # use fatality_metrics::AnalysisErrors;
///
/// let date = NaiveDate::from_ymd_opt(2020, 4, 18).unwrap();
/// let mut builder = Builder::new(&AnalysisRules::DEFAULT_RULES)?;
///
/// builder.add_snapshot_simple("Iceland", date, 1771, 9, 45_000)?;
///
/// let result = builder.analyze_latest()?;
/// assert_eq!(result.count_good_testing(), 0);
///
/// # Ok::<(), AnalysisErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AnalysisRules,
    pub(crate) _snapshots: Vec<DailyCountrySnapshot>,
    _seen: HashSet<(String, NaiveDate)>,
}

impl Builder {
    pub fn new(rules: &AnalysisRules) -> Result<Builder, AnalysisErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _snapshots: Vec::new(),
            _seen: HashSet::new(),
        })
    }

    /// Replaces the thresholds, keeping the snapshots collected so far.
    pub fn rules(self, rules: &AnalysisRules) -> Result<Builder, AnalysisErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _snapshots: self._snapshots,
            _seen: self._seen,
        })
    }

    /// Adds a snapshot when the population is not known.
    pub fn add_snapshot_simple(
        &mut self,
        country: &str,
        date: NaiveDate,
        total_cases: u64,
        total_deaths: u64,
        total_tests: u64,
    ) -> Result<(), AnalysisErrors> {
        self.add_snapshot(&DailyCountrySnapshot {
            country: country.to_string(),
            date,
            total_cases,
            total_deaths,
            total_tests,
            population: 0,
        })
    }

    /// Adds a snapshot.
    ///
    /// A country must have a name, and only one snapshot per country and per day is accepted.
    pub fn add_snapshot(&mut self, snapshot: &DailyCountrySnapshot) -> Result<(), AnalysisErrors> {
        if snapshot.country.trim().is_empty() {
            return Err(AnalysisErrors::EmptyCountry(snapshot.date));
        }
        let key = (snapshot.country.clone(), snapshot.date);
        if self._seen.contains(&key) {
            return Err(AnalysisErrors::DuplicateSnapshot(key.0, key.1));
        }
        self._seen.insert(key);
        self._snapshots.push(snapshot.clone());
        Ok(())
    }

    pub fn snapshots(&self) -> &[DailyCountrySnapshot] {
        &self._snapshots
    }

    pub fn analyze(&self, date: NaiveDate) -> Result<AnalysisResult, AnalysisErrors> {
        crate::run_analysis(&self._snapshots, date, &self._rules)
    }

    /// Runs the analysis on the most recent date of the collected snapshots.
    pub fn analyze_latest(&self) -> Result<AnalysisResult, AnalysisErrors> {
        let date = crate::latest_date(&self._snapshots).ok_or(AnalysisErrors::EmptyDataset)?;
        self.analyze(date)
    }
}
