// src/renderer.rs

use crate::dataset::TouchRecord;
use crate::error::PlotError;
use chrono::NaiveDateTime;
use image::{Rgb, RgbImage};
use palette::{FromColor, Lch, Srgb};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const X_TICK_STEP: usize = 2;
const Y_TICK_WEEKS: f64 = 50.0;
const POINT_ALPHA: f32 = 0.8;

const BG_COLOR: Rgb<u8> = Rgb([8, 8, 12]);
const AXIS_COLOR: Rgb<u8> = Rgb([200, 200, 210]);
const GRID_COLOR: Rgb<u8> = Rgb([32, 32, 40]);

/// Parses a GitHub author timestamp, ignoring the `Z` suffix.
pub fn parse_date(date: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(&date.replace('Z', ""), DATE_FORMAT)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub file_index: usize,
    pub author_index: usize,
    /// Whole days since the earliest touch, in weeks
    pub weeks: f64,
}

/// Touches laid out for plotting: files and authors sorted by name, one
/// point per touch.
#[derive(Debug, Clone)]
pub struct ScatterData {
    pub files: Vec<String>,
    pub authors: Vec<String>,
    pub points: Vec<ScatterPoint>,
}

impl ScatterData {
    /// Rows with unparseable dates are dropped with a warning.
    pub fn from_records(records: &[TouchRecord]) -> Result<Self, PlotError> {
        let dated: Vec<(&TouchRecord, NaiveDateTime)> = records
            .iter()
            .filter_map(|r| match parse_date(&r.date) {
                Ok(dt) => Some((r, dt)),
                Err(e) => {
                    warn!(filename = %r.filename, date = %r.date, error = %e, "Skipping row with bad date");
                    None
                }
            })
            .collect();

        let earliest = dated.iter().map(|&(_, dt)| dt).min().ok_or(PlotError::Empty)?;

        let files: Vec<String> = dated
            .iter()
            .map(|(r, _)| r.filename.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let authors: Vec<String> = dated
            .iter()
            .map(|(r, _)| r.author.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let points = dated
            .iter()
            .map(|(r, dt)| ScatterPoint {
                file_index: files.binary_search(&r.filename).unwrap_or_default(),
                author_index: authors.binary_search(&r.author).unwrap_or_default(),
                weeks: (*dt - earliest).num_days() as f64 / 7.0,
            })
            .collect();

        Ok(ScatterData {
            files,
            authors,
            points,
        })
    }

    pub fn max_weeks(&self) -> f64 {
        self.points.iter().map(|p| p.weeks).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub point_radius: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            width: 1000,
            height: 700,
            point_radius: 3,
        }
    }
}

/// Maps data coordinates to pixels
#[derive(Debug, Clone, Copy)]
pub struct PlotLayout {
    left: f64,
    top: f64,
    plot_width: f64,
    plot_height: f64,
    file_count: usize,
    y_max: f64,
}

impl PlotLayout {
    const MARGIN_LEFT: f64 = 60.0;
    const MARGIN_RIGHT: f64 = 20.0;
    const MARGIN_TOP: f64 = 20.0;
    const MARGIN_BOTTOM: f64 = 50.0;

    pub fn new(data: &ScatterData, opts: &PlotOptions) -> Self {
        PlotLayout {
            left: Self::MARGIN_LEFT,
            top: Self::MARGIN_TOP,
            plot_width: (opts.width as f64 - Self::MARGIN_LEFT - Self::MARGIN_RIGHT).max(1.0),
            plot_height: (opts.height as f64 - Self::MARGIN_TOP - Self::MARGIN_BOTTOM).max(1.0),
            file_count: data.files.len().max(1),
            y_max: y_axis_max(data.max_weeks()),
        }
    }

    /// Files occupy equal columns, index `i` at the center of column `i`.
    pub fn x(&self, file_index: usize) -> f64 {
        self.left + (file_index as f64 + 0.5) / self.file_count as f64 * self.plot_width
    }

    pub fn y(&self, weeks: f64) -> f64 {
        self.top + self.plot_height * (1.0 - weeks / self.y_max)
    }

    pub fn project(&self, point: &ScatterPoint) -> (i64, i64) {
        (
            self.x(point.file_index).round() as i64,
            self.y(point.weeks).round() as i64,
        )
    }

    fn bottom(&self) -> f64 {
        self.top + self.plot_height
    }

    fn right(&self) -> f64 {
        self.left + self.plot_width
    }
}

/// Top of the y axis: the maximum rounded up to a whole tick, at least one tick.
pub fn y_axis_max(max_weeks: f64) -> f64 {
    ((max_weeks / Y_TICK_WEEKS).ceil() * Y_TICK_WEEKS).max(Y_TICK_WEEKS)
}

pub fn render(data: &ScatterData, opts: &PlotOptions) -> RgbImage {
    let mut image = RgbImage::from_pixel(opts.width, opts.height, BG_COLOR);
    let layout = PlotLayout::new(data, opts);
    let colors = author_colors(data.authors.len());

    draw_axes(&mut image, &layout, data.files.len());

    for point in &data.points {
        let (cx, cy) = layout.project(point);
        let color = colors[point.author_index];
        draw_disc(&mut image, cx, cy, opts.point_radius as i64, color);
    }
    image
}

pub fn render_to_file(data: &ScatterData, opts: &PlotOptions, path: &Path) -> Result<(), PlotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    render(data, opts).save(path)?;
    info!(
        path = %path.display(),
        files = data.files.len(),
        authors = data.authors.len(),
        points = data.points.len(),
        "Saved scatterplot"
    );
    Ok(())
}

fn draw_axes(image: &mut RgbImage, layout: &PlotLayout, file_count: usize) {
    let left = layout.left.round() as i64;
    let right = layout.right().round() as i64;
    let top = layout.top.round() as i64;
    let bottom = layout.bottom().round() as i64;

    // Horizontal grid and y ticks every 50 weeks
    let mut weeks = 0.0;
    while weeks <= layout.y_max {
        let y = layout.y(weeks).round() as i64;
        for x in left..=right {
            put(image, x, y, GRID_COLOR);
        }
        for x in left - 6..left {
            put(image, x, y, AXIS_COLOR);
        }
        weeks += Y_TICK_WEEKS;
    }

    // x ticks every second file
    for file_index in (0..file_count).step_by(X_TICK_STEP) {
        let x = layout.x(file_index).round() as i64;
        for y in bottom + 1..=bottom + 6 {
            put(image, x, y, AXIS_COLOR);
        }
    }

    for x in left..=right {
        put(image, x, bottom, AXIS_COLOR);
    }
    for y in top..=bottom {
        put(image, left, y, AXIS_COLOR);
    }
}

fn draw_disc(image: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                blend(image, cx + dx, cy + dy, color, POINT_ALPHA);
            }
        }
    }
}

fn put(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn blend(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in pixel.0.iter_mut().zip(color.0) {
        *dst = (src as f32 * alpha + *dst as f32 * (1.0 - alpha)).round() as u8;
    }
}

/// One color per author, hues evenly spaced around the LCh wheel
pub fn author_colors(num_authors: usize) -> Vec<Rgb<u8>> {
    (0..num_authors)
        .map(|i| {
            let hue = i as f32 * 360.0f32 / num_authors as f32;
            let color = Lch::new(70.0f32, 60.0f32, hue);
            let srgb: Srgb<f32> = Srgb::from_color(color);
            let (r, g, b) = srgb.into_components();
            Rgb([to_u8(r), to_u8(g), to_u8(b)])
        })
        .collect()
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0f32).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(filename: &str, author: &str, date: &str) -> TouchRecord {
        TouchRecord {
            filename: filename.to_string(),
            author: author.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn parse_date_strips_zulu_suffix() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2024-03-10T12:00:00Z").unwrap(), expected);
        assert_eq!(
            parse_date("2024-03-10T12:00:00Z").unwrap(),
            parse_date("2024-03-10T12:00:00").unwrap()
        );
        assert!(parse_date("Unknown").is_err());
    }

    #[test]
    fn weeks_count_from_earliest_touch() {
        let data = ScatterData::from_records(&[
            record("b.py", "Bob", "2024-01-15T00:00:00Z"),
            record("a.py", "Alice", "2024-01-01T00:00:00Z"),
            record("a.py", "Bob", "2024-01-11T23:00:00Z"),
        ])
        .unwrap();

        let weeks: Vec<f64> = data.points.iter().map(|p| p.weeks).collect();
        assert_eq!(weeks, vec![2.0, 0.0, 10.0 / 7.0]);
        assert_eq!(data.max_weeks(), 2.0);
    }

    #[test]
    fn files_and_authors_are_indexed_in_sorted_order() {
        let data = ScatterData::from_records(&[
            record("z.py", "Zed", "2024-01-01T00:00:00Z"),
            record("a.py", "Amy", "2024-01-02T00:00:00Z"),
            record("m.py", "Zed", "2024-01-03T00:00:00Z"),
        ])
        .unwrap();

        assert_eq!(data.files, vec!["a.py", "m.py", "z.py"]);
        assert_eq!(data.authors, vec!["Amy", "Zed"]);
        let indices: Vec<(usize, usize)> = data
            .points
            .iter()
            .map(|p| (p.file_index, p.author_index))
            .collect();
        assert_eq!(indices, vec![(2, 1), (0, 0), (1, 1)]);
    }

    #[test]
    fn unparseable_rows_are_dropped() {
        let data = ScatterData::from_records(&[
            record("a.py", "Unknown", "Unknown"),
            record("a.py", "Amy", "2024-01-02T00:00:00Z"),
        ])
        .unwrap();
        assert_eq!(data.points.len(), 1);
        assert_eq!(data.authors, vec!["Amy"]);
        assert_eq!(data.points[0].weeks, 0.0);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        assert!(matches!(ScatterData::from_records(&[]), Err(PlotError::Empty)));
        assert!(matches!(
            ScatterData::from_records(&[record("a.py", "x", "garbage")]),
            Err(PlotError::Empty)
        ));
    }

    #[test]
    fn y_axis_rounds_up_to_fifty_weeks() {
        assert_eq!(y_axis_max(0.0), 50.0);
        assert_eq!(y_axis_max(12.0), 50.0);
        assert_eq!(y_axis_max(50.0), 50.0);
        assert_eq!(y_axis_max(50.1), 100.0);
        assert_eq!(y_axis_max(260.0), 300.0);
    }

    #[test]
    fn author_colors_are_distinct() {
        let colors = author_colors(5);
        assert_eq!(colors.len(), 5);
        let unique: BTreeSet<[u8; 3]> = colors.iter().map(|c| c.0).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn points_are_painted_in_author_color() {
        let data = ScatterData::from_records(&[
            record("a.py", "Amy", "2024-01-01T00:00:00Z"),
            record("b.py", "Bob", "2025-01-01T00:00:00Z"),
        ])
        .unwrap();
        let opts = PlotOptions::default();
        let image = render(&data, &opts);
        assert_eq!(image.dimensions(), (opts.width, opts.height));

        let layout = PlotLayout::new(&data, &opts);
        let (x, y) = layout.project(&data.points[1]);
        let painted = *image.get_pixel(x as u32, y as u32);
        assert_ne!(painted, BG_COLOR);

        let color = author_colors(2)[1];
        for (got, want) in painted.0.iter().zip(color.0) {
            assert!((*got as i32 - want as i32).abs() <= 60);
        }

        // Far corner stays background
        assert_eq!(*image.get_pixel(opts.width - 1, 0), BG_COLOR);
    }

    #[test]
    fn render_to_file_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("scatter_repo.png");
        let data = ScatterData::from_records(&[record("a.py", "Amy", "2024-01-01T00:00:00Z")]).unwrap();
        render_to_file(&data, &PlotOptions::default(), &path).unwrap();
        assert!(path.exists());
    }
}
