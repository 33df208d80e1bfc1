use std::fmt::Display;
use std::fs;
use std::path::Path;
use plotters::prelude::*;
use tracing::info;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::experiment::ChartLayout;
use crate::series::SeriesMatrix;

const FONT: &str = "sans-serif";

// Anchors of the diverging blue to red "coolwarm" map, interpolated linearly between
const COOLWARM: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (59, 76, 192)),
    (0.25, (141, 176, 254)),
    (0.5, (221, 221, 221)),
    (0.75, (244, 152, 122)),
    (1.0, (180, 4, 38)),
];

/// Samples the coolwarm colormap. `t` is clamped to `[0, 1]`
///
/// # Examples
///
/// ```
/// use aatlib::chart::coolwarm;
/// use plotters::style::RGBColor;
/// assert_eq!(coolwarm(0.0), RGBColor(59, 76, 192));
/// assert_eq!(coolwarm(0.5), RGBColor(221, 221, 221));
/// ```
pub fn coolwarm(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let upper = COOLWARM.iter().position(|(stop, _)| *stop >= t).unwrap_or(COOLWARM.len() - 1).max(1);
    let (low_stop, low) = COOLWARM[upper - 1];
    let (high_stop, high) = COOLWARM[upper];
    let fraction = (t - low_stop) / (high_stop - low_stop);
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * fraction).round() as u8;
    RGBColor(channel(low.0, high.0), channel(low.1, high.1), channel(low.2, high.2))
}

/// Converts a size in points to pixels at the configured DPI
fn points(size: f64, config: &AnalysisConfig) -> u32 {
    (size * config.dpi as f64 / 72.0).round() as u32
}

fn chart_error<E: Display>(e: E) -> AnalysisError {
    AnalysisError::Chart(e.to_string())
}

/// Draws one line per column of the matrix and writes the chart as a PNG
///
/// Series are coloured by `coolwarm(index / columns)`. Empty cells break a line rather than being
/// bridged. The parent directory of `path` is created if needed
///
/// # Arguments
///
/// * `matrix`: The values to plot
/// * `layout`: Title, labels, y bounds and legend title
/// * `config`: Figure size and DPI
/// * `path`: Where to write the PNG
///
/// returns: Result<(), AnalysisError>
pub fn render(matrix: &SeriesMatrix, layout: &ChartLayout, config: &AnalysisConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| AnalysisError::Io { path: parent.to_path_buf(), source })?;
    }
    let (width, height) = config.pixel_size();
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let first = matrix.x.first().copied().unwrap_or(0) as f64;
    let last = matrix.x.last().copied().unwrap_or(1) as f64;
    let x_margin = ((last - first) * 0.05).max(0.5);
    let mut chart = ChartBuilder::on(&root)
        .caption(layout.title, (FONT, points(16.0, config)).into_font())
        .margin(points(10.0, config))
        .x_label_area_size(points(36.0, config))
        .y_label_area_size(points(48.0, config))
        .build_cartesian_2d((first - x_margin)..(last + x_margin), layout.y_range.clone())
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .bold_line_style(RGBColor(211, 211, 211).mix(0.5))
        .x_labels(matrix.x.len().max(2))
        .x_label_formatter(&|x| format!("{:.0}", x))
        .x_desc(layout.x_label)
        .y_desc(layout.y_label)
        .axis_desc_style((FONT, points(14.0, config)).into_font())
        .label_style((FONT, points(10.0, config)).into_font())
        .draw()
        .map_err(chart_error)?;

    // Legend heading, drawn as an entry with no marker
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
        .map_err(chart_error)?
        .label(layout.legend_title)
        .legend(|(x, y)| EmptyElement::at((x, y)));

    let columns = matrix.column_count();
    let stroke = points(1.5, config);
    let marker = points(20.0, config) as i32;
    for (index, label) in matrix.columns.iter().enumerate() {
        let style = coolwarm(index as f64 / columns as f64).stroke_width(stroke);
        let mut segments = matrix.segments(index);
        if segments.is_empty() {
            // Keep the legend entry for a column with nothing to draw
            segments.push(Vec::new());
        }
        for (n, segment) in segments.into_iter().enumerate() {
            let series = chart
                .draw_series(LineSeries::new(segment.into_iter().map(|(x, y)| (x as f64, y)), style))
                .map_err(chart_error)?;
            if n == 0 {
                series
                    .label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + marker, y)], style));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT, points(10.0, config)).into_font())
        .draw()
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    info!(path = %path.display(), width, height, "Wrote chart");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;
    use crate::experiment::{Experiment, Metric};
    use crate::util::Fixture;
    use tempfile::tempdir;

    #[test]
    fn coolwarm_runs_blue_to_red() {
        assert_eq!(coolwarm(0.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        let blue_end = coolwarm(0.2);
        let red_end = coolwarm(0.8);
        assert!(blue_end.2 > blue_end.0);
        assert!(red_end.0 > red_end.2);
    }

    #[test]
    fn coolwarm_clamps() {
        assert_eq!(coolwarm(-1.0), coolwarm(0.0));
        assert_eq!(coolwarm(2.0), coolwarm(1.0));
        assert_eq!(coolwarm(f64::NAN), coolwarm(0.0));
    }

    #[test]
    fn series_colours_are_distinct() {
        for columns in [2usize, 3, 5] {
            let colours: Vec<RGBColor> = (0..columns).map(|i| coolwarm(i as f64 / columns as f64)).collect();
            for pair in colours.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn points_scale_with_dpi() {
        let config = AnalysisConfig::default();
        assert_eq!(points(72.0, &config), 300);
        assert_eq!(points(14.0, &config), 58);
        let low = AnalysisConfig { dpi: 72, ..AnalysisConfig::default() };
        assert_eq!(points(14.0, &low), 14);
    }

    #[test]
    fn renders_png_at_the_configured_size() {
        let dir = tempdir().unwrap();
        let fixture = Fixture::write(dir.path()).unwrap();
        let config = AnalysisConfig::default();
        let matrix = Analysis::new(Experiment::Associativity, true, &config, &fixture.table).build(dir.path()).unwrap();
        // The known gap leaves one empty cell to break a line on
        assert_eq!(matrix.rows.iter().flatten().filter(|cell| cell.is_none()).count(), 1);

        let path = dir.path().join("charts").join("exp1").join("exp1b.png");
        render(&matrix, &Experiment::Associativity.layout(Metric::AverageAccessTime), &config, &path).unwrap();

        let png = fs::read(&path).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(&png[12..16], b"IHDR");
        let width = u32::from_be_bytes(png[16..20].try_into().unwrap());
        let height = u32::from_be_bytes(png[20..24].try_into().unwrap());
        assert_eq!((width, height), config.pixel_size());
        assert_eq!((width, height), (1920, 1440));
    }
}
