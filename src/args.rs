use clap::Parser;

/// Estimates the COVID-19 death rate from the countries that test the most.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the analysis. Options passed on the command line
    /// take precedence over the content of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of an analysis in JSON format. If provided,
    /// cfrstats will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the analysis will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The file containing the daily snapshots, one row per country and per date.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is inferred from the extension of the file.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (YYYY-MM-DD or DD/MM/YYYY) The date to analyze. Defaults to the last date of the dataset.
    #[clap(short, long, value_parser)]
    pub date: Option<String>,

    /// (default 1000) Countries with this number of cases or fewer are left out.
    #[clap(long, value_parser)]
    pub min_cases: Option<u64>,

    /// (default 50) Number of tests per positive case above which a country is considered
    /// to have a good testing coverage.
    #[clap(long, value_parser)]
    pub quality_threshold: Option<f64>,

    /// (directory) If specified, the histograms and the scatter plot will be written there as SVG files.
    #[clap(long, value_parser)]
    pub charts_dir: Option<String>,

    /// (country name) If specified, prints all the snapshots of this country.
    #[clap(long, value_parser)]
    pub country: Option<String>,

    /// Prints the raw snapshots of the selected date.
    #[clap(long, takes_value = false)]
    pub show_raw: bool,

    /// Prints the dates available in the dataset and exits.
    #[clap(long, takes_value = false)]
    pub list_dates: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
