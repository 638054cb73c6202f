use crate::cfr::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "analysisName")]
    pub analysis_name: Option<String>,
    #[serde(rename = "chartsDirectory")]
    pub charts_directory: Option<String>,
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "labelCountries")]
    pub label_countries: Option<Vec<String>>,
}

/// The part of the configuration that ends up in the summary.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub analysis: String,
    pub input: String,
    pub date: String,
    #[serde(rename = "minCasesThreshold")]
    pub min_cases_threshold: u64,
    #[serde(rename = "testingQualityThreshold")]
    pub testing_quality_threshold: f64,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfrRules {
    pub date: Option<String>,
    #[serde(rename = "minCasesThreshold")]
    _min_cases_threshold: Option<JSValue>,
    #[serde(rename = "testingQualityThreshold")]
    _testing_quality_threshold: Option<JSValue>,
}

impl CfrRules {
    pub fn min_cases_threshold(&self) -> CfrResult<Option<u64>> {
        match &self._min_cases_threshold {
            None => Ok(None),
            x => read_js_int(x, "minCasesThreshold").map(Some),
        }
    }

    pub fn testing_quality_threshold(&self) -> CfrResult<Option<f64>> {
        match &self._testing_quality_threshold {
            None => Ok(None),
            x => read_js_float(x, "testingQualityThreshold").map(Some),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfrConfig {
    #[serde(rename = "inputSettings", default)]
    pub input_settings: InputSettings,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub rules: CfrRules,
}

pub fn read_config(path: &str) -> CfrResult<CfrConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: CfrConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> CfrResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>, field: &str) -> CfrResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<u64>()
            .ok()
            .context(ParsingJsonNumberSnafu { field }),
        _ => None.context(ParsingJsonNumberSnafu { field }),
    }
}

fn read_js_float(x: &Option<JSValue>, field: &str) -> CfrResult<f64> {
    match x {
        Some(JSValue::Number(n)) => n.as_f64().context(ParsingJsonNumberSnafu { field }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .context(ParsingJsonNumberSnafu { field }),
        _ => None.context(ParsingJsonNumberSnafu { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let js = r#"{
            "inputSettings": {"filePath": "snapshots.csv", "provider": "csv"},
            "outputSettings": {"chartsDirectory": "charts", "labelCountries": ["USA", "Italy"]},
            "rules": {"date": "2020-05-18", "minCasesThreshold": 500, "testingQualityThreshold": "12.5"}
        }"#;
        let config: CfrConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.input_settings.file_path.as_deref(),
            Some("snapshots.csv")
        );
        assert_eq!(
            config.output_settings.charts_directory.as_deref(),
            Some("charts")
        );
        assert_eq!(
            config.output_settings.label_countries,
            Some(vec!["USA".to_string(), "Italy".to_string()])
        );
        assert_eq!(config.output_settings.summary_path, None);
        assert_eq!(config.rules.date.as_deref(), Some("2020-05-18"));
        assert_eq!(config.rules.min_cases_threshold().unwrap(), Some(500));
        assert_eq!(
            config.rules.testing_quality_threshold().unwrap(),
            Some(12.5)
        );
    }

    #[test]
    fn empty_config() {
        let config: CfrConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CfrConfig::default());
        assert_eq!(config.rules.min_cases_threshold().unwrap(), None);
        assert_eq!(config.rules.testing_quality_threshold().unwrap(), None);
    }

    #[test]
    fn bad_numbers() {
        let js = r#"{"rules": {"minCasesThreshold": -3, "testingQualityThreshold": "many"}}"#;
        let config: CfrConfig = serde_json::from_str(js).unwrap();
        assert!(matches!(
            config.rules.min_cases_threshold(),
            Err(CfrError::ParsingJsonNumber { .. })
        ));
        assert!(config.rules.testing_quality_threshold().is_err());
    }
}
