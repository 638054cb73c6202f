/*!

This is the long-form manual for `fatality_metrics` and `cfrstats`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values (default)
* `xlsx` Excel workbook

In both cases, the first row is a header containing at least the following columns,
in any order:

| Column         | Content                                       |
|----------------|-----------------------------------------------|
| `Date`         | the day of the snapshot, `YYYY-MM-DD`         |
| `Country`      | the name of the country                       |
| `Total Cases`  | cumulative number of confirmed cases          |
| `Total Deaths` | cumulative number of deaths                   |
| `Total Tests`  | cumulative number of tests                    |
| `Population`   | population of the country                     |

Other columns are ignored. Empty counts are read as zero. Counts written as floating
point numbers (`1234.0`) are accepted as long as they hold an integer value.

### `xlsx`

The first worksheet is used, unless `--excel-worksheet-name` is given. Dates may be
stored as text or as Excel dates.

## Analysis

For the selected date (by default the last date of the dataset):

1. the case fatality ratio (deaths / cases) and the testing quality (tests / cases) of
   each country are computed
2. the countries with `Total Cases` above the minimum cases threshold are kept
3. among them, the countries with a testing quality above the testing quality threshold
   are the *good testing* countries
4. the estimated death rate is `100 * sum(deaths) / sum(cases)` over the good testing
   countries

The estimate weighs each country by its number of cases. It is not the average of the
death rates of the countries.

## Outputs

`cfrstats` prints a text report and can additionally write:
* a JSON summary (`--out`)
* three SVG charts (`--charts-dir`): the histogram of the death rates of all the
  countries, the same histogram restricted to the countries above the minimum cases, and
  the death rate as a function of the testing quality.

## Configuration file

All the options can also be provided in a JSON file passed with `--config`:

```json
{
  "inputSettings": {
    "filePath": "worldometer_snapshots_April18_to_May18.csv",
    "provider": "csv"
  },
  "outputSettings": {
    "analysisName": "worldometer",
    "chartsDirectory": "charts",
    "summaryPath": "summary.json",
    "labelCountries": ["USA", "Italy", "Iceland"]
  },
  "rules": {
    "date": "2020-05-18",
    "minCasesThreshold": 1000,
    "testingQualityThreshold": 50
  }
}
```

Paths are relative to the configuration file. Options passed on the command line take
precedence over the configuration file.
*/
