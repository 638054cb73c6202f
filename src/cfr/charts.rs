// SVG chart generation for the analysis report.

use std::fmt::Write as _;

use crate::cfr::*;

/// Death rates above this value (in percent) do not fit in the histogram.
pub const HISTOGRAM_MAX_RATE: usize = 34;
/// The testing quality is clamped to this value on the scatter plot.
pub const X_AXIS_LIMIT: f64 = 80.0;

const SCATTER_X_RANGE: (f64, f64) = (-1.0, X_AXIS_LIMIT + 12.0);
const SCATTER_Y_RANGE: (f64, f64) = (-0.2, 17.0);

const NO_DATA_MESSAGE: &str = "No data available for the selected criteria";

/// The countries labeled on the scatter plot, unless specified otherwise.
pub const DEFAULT_LABEL_COUNTRIES: [&str; 46] = [
    "USA",
    "Russia",
    "Spain",
    "Brazil",
    "UK",
    "Italy",
    "France",
    "Germany",
    "India",
    "Canada",
    "Belgium",
    "Mexico",
    "Netherlands",
    "Sweden",
    "Portugal",
    "UAE",
    "Poland",
    "Indonesia",
    "Romania",
    "Israel",
    "Thailand",
    "Kyrgyzstan",
    "El Salvador",
    "S. Korea",
    "Denmark",
    "Serbia",
    "Norway",
    "Algeria",
    "Bahrain",
    "Slovenia",
    "Greece",
    "Cuba",
    "Hong Kong",
    "Lithuania",
    "Australia",
    "Morocco",
    "Malaysia",
    "Nigeria",
    "Moldova",
    "Ghana",
    "Armenia",
    "Bolivia",
    "Iraq",
    "Hungary",
    "Cameroon",
    "Azerbaijan",
];

// Viridis, sampled at 5 points.
const COLOR_STOPS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 560.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// One point of the death rate vs testing quality chart.
#[derive(PartialEq, Debug, Clone)]
pub struct ScatterPoint {
    pub country: String,
    /// Tests per positive case, clamped to `X_AXIS_LIMIT`.
    pub tests_per_case: f64,
    pub death_rate_percent: f64,
    /// Marker area, in square pixels.
    pub size: f64,
    /// Drives the color of the marker.
    pub log_deaths: f64,
}

/// Counts the death rates (in percent) in unit bins from 0 to `HISTOGRAM_MAX_RATE`.
///
/// Returns (start, end, count) for each bin. The last bin includes its upper edge.
pub fn compute_death_rate_histogram(rows: &[CountryMetrics]) -> Vec<(f64, f64, usize)> {
    let mut counts = vec![0_usize; HISTOGRAM_MAX_RATE];
    let max_rate = HISTOGRAM_MAX_RATE as f64;
    for m in rows.iter() {
        let rate = m.death_rate_percent();
        if !rate.is_finite() || !(0.0..=max_rate).contains(&rate) {
            debug!(
                "compute_death_rate_histogram: {}: rate {} out of the histogram",
                m.snapshot.country, rate
            );
            continue;
        }
        let idx = (rate.floor() as usize).min(HISTOGRAM_MAX_RATE - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (i as f64, (i + 1) as f64, c))
        .collect()
}

pub fn compute_scatter_points(rows: &[CountryMetrics]) -> Vec<ScatterPoint> {
    rows.iter()
        .filter(|m| {
            m.case_fatality_ratio.is_finite() && !m.tests_per_positive_case.is_nan()
        })
        .map(|m| {
            let log_pop = (1.0 + m.snapshot.population as f64).ln();
            ScatterPoint {
                country: m.snapshot.country.clone(),
                tests_per_case: m.tests_per_positive_case.min(X_AXIS_LIMIT),
                death_rate_percent: m.death_rate_percent(),
                size: 0.5 * log_pop * log_pop,
                log_deaths: (1.0 + m.snapshot.total_deaths as f64).log10(),
            }
        })
        .collect()
}

pub fn generate_histogram_svg(histogram: &[(f64, f64, usize)], title: &str) -> String {
    let chart_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let total: usize = histogram.iter().map(|(_, _, c)| c).sum();
    if total == 0 {
        return empty_chart_svg(title);
    }
    let max_count = histogram
        .iter()
        .map(|(_, _, c)| *c)
        .max()
        .unwrap_or(1)
        .max(1);
    let bar_width = chart_width / histogram.len() as f64;

    let mut bars = String::new();
    for (i, (_start, _end, count)) in histogram.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let x = MARGIN_LEFT + i as f64 * bar_width;
        let bar_height = (*count as f64 / max_count as f64) * chart_height;
        let y = MARGIN_TOP + chart_height - bar_height;
        let _ = write!(
            bars,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="#1f77b4" stroke="white"/>"##,
            x,
            y,
            bar_width,
            bar_height
        );
    }

    let mut x_labels = String::new();
    for (i, (start, _, _)) in histogram.iter().enumerate().step_by(5) {
        let x = MARGIN_LEFT + i as f64 * bar_width;
        let _ = write!(
            x_labels,
            r##"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"##,
            x,
            MARGIN_TOP + chart_height + 18.0,
            start
        );
    }

    let mut y_labels = String::new();
    for k in 0..=4 {
        let value = max_count as f64 * k as f64 / 4.0;
        let y = MARGIN_TOP + chart_height - chart_height * k as f64 / 4.0;
        let _ = write!(
            y_labels,
            r##"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{:.0}</text>"##,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            value
        );
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" style="background:white">
<text x="{cx}" y="30" font-size="18" text-anchor="middle">{title}</text>
{bars}
<line x1="{ml}" y1="{by}" x2="{rx}" y2="{by}" stroke="black"/>
<line x1="{ml}" y1="{mt}" x2="{ml}" y2="{by}" stroke="black"/>
{x_labels}
{y_labels}
<text x="{cx}" y="{xl}" font-size="14" text-anchor="middle">Death Rate (%)</text>
<text x="20" y="{cy}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {cy})">Number of Countries</text>
</svg>
"##,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        cy = MARGIN_TOP + chart_height / 2.0,
        title = xml_escape(title),
        bars = bars,
        ml = MARGIN_LEFT,
        mt = MARGIN_TOP,
        rx = MARGIN_LEFT + chart_width,
        by = MARGIN_TOP + chart_height,
        xl = HEIGHT - 15.0,
        x_labels = x_labels,
        y_labels = y_labels,
    )
}

pub fn generate_scatter_svg(points: &[ScatterPoint], label_countries: &[String]) -> String {
    let title = "Death Rate as function of Testing Quality";
    if points.is_empty() {
        return empty_chart_svg(title);
    }
    let chart_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let (x_min, x_max) = SCATTER_X_RANGE;
    let (y_min, y_max) = SCATTER_Y_RANGE;
    let to_px = |x: f64, y: f64| -> (f64, f64) {
        (
            MARGIN_LEFT + (x - x_min) / (x_max - x_min) * chart_width,
            MARGIN_TOP + chart_height - (y - y_min) / (y_max - y_min) * chart_height,
        )
    };

    let min_c = points
        .iter()
        .map(|p| p.log_deaths)
        .fold(f64::INFINITY, f64::min);
    let max_c = points
        .iter()
        .map(|p| p.log_deaths)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut markers = String::new();
    let mut labels = String::new();
    for p in points.iter() {
        if !(y_min..=y_max).contains(&p.death_rate_percent) {
            debug!(
                "generate_scatter_svg: {} out of the chart ({:.2}%)",
                p.country, p.death_rate_percent
            );
            continue;
        }
        let (px, py) = to_px(p.tests_per_case, p.death_rate_percent);
        let t = if max_c > min_c {
            (p.log_deaths - min_c) / (max_c - min_c)
        } else {
            0.5
        };
        let _ = write!(
            markers,
            r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}" fill-opacity="0.8"><title>{}</title></circle>"##,
            px,
            py,
            (p.size / std::f64::consts::PI).sqrt(),
            color_scale(t),
            xml_escape(&p.country)
        );
        if label_countries.iter().any(|c| *c == p.country) {
            let (lx, ly) = to_px(p.tests_per_case + 0.5, p.death_rate_percent + 0.2);
            let _ = write!(
                labels,
                r##"<text x="{:.1}" y="{:.1}" font-size="10">{}</text>"##,
                lx,
                ly,
                xml_escape(&p.country)
            );
        }
    }

    let mut ticks = String::new();
    for x in (0..=80).step_by(10) {
        let (px, py) = to_px(x as f64, y_min);
        let _ = write!(
            ticks,
            r##"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"##,
            px,
            py + 18.0,
            x
        );
    }
    for y in (0..=16).step_by(2) {
        let (px, py) = to_px(x_min, y as f64);
        let _ = write!(
            ticks,
            r##"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{}</text>"##,
            px - 8.0,
            py + 4.0,
            y
        );
    }

    let colorbar = colorbar_svg(
        min_c,
        max_c,
        MARGIN_LEFT + chart_width - 30.0,
        MARGIN_TOP + 20.0,
    );

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" style="background:white">
<text x="{cx}" y="30" font-size="18" text-anchor="middle">{title}</text>
<rect x="{ml}" y="{mt}" width="{cw}" height="{ch}" fill="none" stroke="black"/>
{markers}
{labels}
{ticks}
{colorbar}
<text x="{cx}" y="{xl}" font-size="14" text-anchor="middle">Number of Tests per Positive Case</text>
<text x="20" y="{cy}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {cy})">Death Rate (%)</text>
</svg>
"##,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        cy = MARGIN_TOP + chart_height / 2.0,
        title = title,
        ml = MARGIN_LEFT,
        mt = MARGIN_TOP,
        cw = chart_width,
        ch = chart_height,
        markers = markers,
        labels = labels,
        ticks = ticks,
        colorbar = colorbar,
        xl = HEIGHT - 15.0,
    )
}

/// A vertical legend for the marker colors, from `min_c` at the bottom to `max_c` at the top.
fn colorbar_svg(min_c: f64, max_c: f64, x: f64, y: f64) -> String {
    let height = 160.0;
    let mut stops = String::new();
    for i in 0..COLOR_STOPS.len() {
        let t = i as f64 / (COLOR_STOPS.len() - 1) as f64;
        let _ = write!(
            stops,
            r##"<stop offset="{:.2}" stop-color="{}"/>"##,
            t,
            color_scale(t)
        );
    }
    format!(
        r##"<defs><linearGradient id="deaths" x1="0" y1="1" x2="0" y2="0">{stops}</linearGradient></defs>
<rect x="{x}" y="{y}" width="12" height="{height}" fill="url(#deaths)" stroke="black"/>
<text x="{lx}" y="{top}" font-size="10" text-anchor="end">{max_c:.1}</text>
<text x="{lx}" y="{bottom}" font-size="10" text-anchor="end">{min_c:.1}</text>
<text x="{tx}" y="{mid}" font-size="10" text-anchor="middle" transform="rotate(-90 {tx} {mid})">log10(1 + Total Deaths)</text>
"##,
        stops = stops,
        x = x,
        y = y,
        height = height,
        lx = x - 4.0,
        top = y + 8.0,
        bottom = y + height,
        max_c = max_c,
        min_c = min_c,
        tx = x + 24.0,
        mid = y + height / 2.0,
    )
}

fn empty_chart_svg(title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" style="background:white">
<text x="{cx}" y="30" font-size="18" text-anchor="middle">{title}</text>
<text x="{cx}" y="{cy}" font-size="14" text-anchor="middle">{msg}</text>
</svg>
"##,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        cy = HEIGHT / 2.0,
        title = xml_escape(title),
        msg = NO_DATA_MESSAGE,
    )
}

/// Linear interpolation in the color stops, `t` between 0 and 1.
fn color_scale(t: f64) -> String {
    let t = if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = t * (COLOR_STOPS.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(COLOR_STOPS.len() - 2);
    let frac = scaled - idx as f64;
    let (r0, g0, b0) = COLOR_STOPS[idx];
    let (r1, g1, b1) = COLOR_STOPS[idx + 1];
    let lerp = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * frac).round() as u8 };
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(r0, r1),
        lerp(g0, g1),
        lerp(b0, b1)
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
