use log::{debug, info, warn};

use fatality_metrics::builder::Builder;
use fatality_metrics::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::cfr::config_reader::*;

pub mod charts;
pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod text_report;

#[derive(Debug, Snafu)]
pub enum CfrError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet in file {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("No worksheet named {name} in file {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Line {lineno}: cannot read cell {cell}"))]
    ExcelCell { cell: String, lineno: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Line {lineno}: cannot parse the line"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno}: the line is too short"))]
    LineTooShort { lineno: usize },
    #[snafu(display("Missing column '{column}' in file {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: invalid value '{value}' for column '{column}'"))]
    InvalidCount {
        column: String,
        value: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno}: invalid date '{value}'"))]
    InvalidDate { value: String, lineno: usize },
    #[snafu(display("Invalid date '{value}', expected YYYY-MM-DD or DD/MM/YYYY"))]
    InvalidDateArgument { value: String },
    #[snafu(display("No data for date {date}"))]
    UnknownDate { date: NaiveDate },
    #[snafu(display("Unknown input type {input_type}, expected csv or xlsx"))]
    UnknownInputType { input_type: String },
    #[snafu(display("No input file: use --input or the inputSettings of the configuration"))]
    MissingInput {},
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Field {field}: expected a non-negative number"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Analysis failed"))]
    Analysis { source: AnalysisErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CfrResult<T> = Result<T, CfrError>;

/// A row, as read from a data file, before any validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedSnapshot {
    pub lineno: usize,
    pub date: String,
    pub country: String,
    pub total_cases: String,
    pub total_deaths: String,
    pub total_tests: String,
    pub population: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Xlsx,
}

impl InputType {
    fn parse(s: &str) -> CfrResult<InputType> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "xlsx" | "excel" => Ok(InputType::Xlsx),
            _ => UnknownInputTypeSnafu { input_type: s }.fail(),
        }
    }

    fn from_path(path: &str) -> InputType {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => InputType::Xlsx,
            _ => InputType::Csv,
        }
    }
}

/// Everything needed to run an analysis, once the command line and the configuration
/// file have been merged.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisSettings {
    pub analysis_name: String,
    pub input_path: String,
    pub input_type: InputType,
    pub excel_worksheet_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub rules: AnalysisRules,
    pub out: Option<String>,
    pub charts_dir: Option<String>,
    pub reference: Option<String>,
    pub country: Option<String>,
    pub show_raw: bool,
    pub list_dates: bool,
    pub label_countries: Vec<String>,
}

/// Merges the command line arguments with the configuration file, if any.
///
/// The command line takes precedence. Paths in the configuration file are relative
/// to the directory of the configuration file.
pub fn settings_from_args(args: &Args) -> CfrResult<AnalysisSettings> {
    let (config, config_dir) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            let dir = Path::new(p)
                .parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_default();
            (config, dir)
        }
        None => (CfrConfig::default(), PathBuf::new()),
    };
    let in_config_dir = |p: &String| -> String { config_dir.join(p).display().to_string() };

    let input_path = match (&args.input, &config.input_settings.file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => in_config_dir(p),
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    let input_type = match args
        .input_type
        .as_ref()
        .or(config.input_settings.provider.as_ref())
    {
        Some(s) => InputType::parse(s)?,
        None => InputType::from_path(&input_path),
    };

    let date = match args.date.as_ref().or(config.rules.date.as_ref()) {
        Some(s) => Some(parse_date_argument(s)?),
        None => None,
    };

    let default_rules = AnalysisRules::DEFAULT_RULES;
    let rules = AnalysisRules {
        min_cases_threshold: match args.min_cases {
            Some(x) => x,
            None => config
                .rules
                .min_cases_threshold()?
                .unwrap_or(default_rules.min_cases_threshold),
        },
        testing_quality_threshold: match args.quality_threshold {
            Some(x) => x,
            None => config
                .rules
                .testing_quality_threshold()?
                .unwrap_or(default_rules.testing_quality_threshold),
        },
    };

    let out = args.out.clone().or_else(|| {
        config
            .output_settings
            .summary_path
            .as_ref()
            .map(|p| in_config_dir(p))
    });
    let charts_dir = args.charts_dir.clone().or_else(|| {
        config
            .output_settings
            .charts_directory
            .as_ref()
            .map(|p| in_config_dir(p))
    });
    let label_countries = config
        .output_settings
        .label_countries
        .clone()
        .unwrap_or_else(|| {
            charts::DEFAULT_LABEL_COUNTRIES
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
    let analysis_name = config
        .output_settings
        .analysis_name
        .clone()
        .unwrap_or_else(|| io_common::simplify_file_name(&input_path));

    Ok(AnalysisSettings {
        analysis_name,
        input_path,
        input_type,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or(config.input_settings.excel_worksheet_name),
        date,
        rules,
        out,
        charts_dir,
        reference: args.reference.clone(),
        country: args.country.clone(),
        show_raw: args.show_raw,
        list_dates: args.list_dates,
        label_countries,
    })
}

fn parse_date_argument(s: &str) -> CfrResult<NaiveDate> {
    io_common::parse_date(s).context(InvalidDateArgumentSnafu { value: s })
}

fn read_snapshots(settings: &AnalysisSettings) -> CfrResult<Vec<DailyCountrySnapshot>> {
    info!(
        "Attempting to read snapshot file {:?} ({:?})",
        settings.input_path, settings.input_type
    );
    let parsed = match settings.input_type {
        InputType::Csv => io_csv::read_csv_snapshots(&settings.input_path)?,
        InputType::Xlsx => io_excel::read_excel_snapshots(
            &settings.input_path,
            settings.excel_worksheet_name.as_deref(),
        )?,
    };
    io_common::validate_snapshots(&parsed)
}

fn build_summary_js(settings: &AnalysisSettings, result: &AnalysisResult) -> JSValue {
    let c = OutputConfig {
        analysis: settings.analysis_name.clone(),
        input: io_common::simplify_file_name(&settings.input_path),
        date: result.date.to_string(),
        min_cases_threshold: settings.rules.min_cases_threshold,
        testing_quality_threshold: settings.rules.testing_quality_threshold,
    };
    let good_testing: Vec<JSValue> = good_testing_table(result)
        .iter()
        .map(|m| {
            json!({
                "country": m.snapshot.country,
                "totalCases": m.snapshot.total_cases,
                "totalDeaths": m.snapshot.total_deaths,
                "totalTests": m.snapshot.total_tests,
                "testsPerPositiveCase": m.tests_per_positive_case,
                "caseFatalityRatio": m.case_fatality_ratio,
            })
        })
        .collect();
    json!({
        "config": c,
        "results": {
            "countriesForDate": result.num_countries,
            "countriesAboveMinCases": result.count_above_min_cases(),
            "goodTestingCountries": result.count_good_testing(),
            "estimatedDeathRate": result.estimated_death_rate,
            "goodTesting": good_testing,
        }
    })
}

fn write_output(path: &str, content: &str) -> CfrResult<()> {
    if path == "stdout" {
        println!("{}", content);
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingOutputSnafu { path })?;
        }
    }
    fs::write(path, content).context(WritingOutputSnafu { path })?;
    info!("Wrote {}", path);
    Ok(())
}

fn write_charts(
    dir: &str,
    snapshots: &[DailyCountrySnapshot],
    result: &AnalysisResult,
    settings: &AnalysisSettings,
) -> CfrResult<()> {
    fs::create_dir_all(dir).context(WritingOutputSnafu { path: dir })?;
    let chart_path = |name: &str| -> String { Path::new(dir).join(name).display().to_string() };

    let all_countries = compute_fatality_metrics(snapshots, result.date);
    let svg = charts::generate_histogram_svg(
        &charts::compute_death_rate_histogram(&all_countries),
        "Histogram of Death Rates for various Countries",
    );
    write_output(&chart_path("death_rate_histogram.svg"), &svg)?;

    let svg = charts::generate_histogram_svg(
        &charts::compute_death_rate_histogram(&result.above_min_cases),
        &format!(
            "Histogram of Death Rates for Countries with >{} Cases",
            settings.rules.min_cases_threshold
        ),
    );
    write_output(&chart_path("death_rate_histogram_filtered.svg"), &svg)?;

    let svg = charts::generate_scatter_svg(
        &charts::compute_scatter_points(&result.above_min_cases),
        &settings.label_countries,
    );
    write_output(&chart_path("death_rate_vs_testing.svg"), &svg)?;
    Ok(())
}

pub fn run_analysis(settings: &AnalysisSettings) -> CfrResult<()> {
    info!("settings: {:?}", settings);
    if !settings.rules.within_usual_ranges() {
        warn!(
            "Thresholds {:?} outside of the usual ranges (cases: {:?}, quality: {:?})",
            settings.rules,
            AnalysisRules::MIN_CASES_RANGE,
            AnalysisRules::TESTING_QUALITY_RANGE
        );
    }

    let snapshots = read_snapshots(settings)?;
    let mut builder = Builder::new(&settings.rules).context(AnalysisSnafu {})?;
    for s in snapshots.iter() {
        builder.add_snapshot(s).context(AnalysisSnafu {})?;
    }

    let dates = available_dates(builder.snapshots());
    debug!("available dates: {:?}", dates);
    if settings.list_dates {
        for d in dates.iter() {
            println!("{}", d);
        }
        return Ok(());
    }

    if let Some(country) = &settings.country {
        let rows = rows_for_country(builder.snapshots(), country);
        if rows.is_empty() {
            warn!("No data for country {}", country);
        }
        println!("Data for {}:", country);
        println!("{}", text_report::format_snapshots(&rows));
    }

    let date = match settings.date {
        Some(d) => d,
        None => latest_date(builder.snapshots())
            .ok_or(AnalysisErrors::EmptyDataset)
            .context(AnalysisSnafu {})?,
    };
    if dates.binary_search(&date).is_err() {
        return UnknownDateSnafu { date }.fail();
    }

    if settings.show_raw {
        let rows: Vec<&DailyCountrySnapshot> = builder
            .snapshots()
            .iter()
            .filter(|s| s.date == date)
            .collect();
        println!("{}", text_report::format_snapshots(&rows));
    }

    let result = builder.analyze(date).context(AnalysisSnafu {})?;
    print!("{}", text_report::format_report(&result, &settings.rules));

    if let Some(dir) = &settings.charts_dir {
        write_charts(dir, builder.snapshots(), &result, settings)?;
    }

    let result_js = build_summary_js(settings, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(out) = &settings.out {
        write_output(out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
