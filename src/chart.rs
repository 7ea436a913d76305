use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::config::ChartConfig;
use crate::error::ExportError;
use crate::models::{ScoreType, Student};
use crate::summary::{self, ScoreSeries};

fn series_color(score_type: ScoreType) -> RGBColor {
    match score_type {
        ScoreType::InSchool => BLUE,
        ScoreType::MockExam => GREEN,
    }
}

/// Vertical range with a little headroom, never narrower than 10 points.
fn y_range(values: &[i64]) -> (i64, i64) {
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(100);
    let low = (min - 5).max(0);
    let high = (max + 5).max(low + 10);
    (low, high)
}

fn draw(
    series: &ScoreSeries,
    options: &ChartConfig,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (low, high) = y_range(&series.values);
    let points = series.values.len() as i32;
    let color = series_color(series.score_type);

    let mut chart = ChartBuilder::on(&root)
        .caption(&series.title, ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..points, low..high)?;

    let labels = &series.labels;
    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| labels.get(*x as usize).cloned().unwrap_or_default())
        .y_desc("score")
        .draw()?;

    let data: Vec<(i32, i64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as i32, *v))
        .collect();

    chart.draw_series(LineSeries::new(data.iter().copied(), &color))?;
    chart.draw_series(
        data.iter()
            .map(|point| Circle::new(*point, 4, color.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Renders one trend chart. Empty series draw nothing and return `false`.
pub fn render_trend(
    series: &ScoreSeries,
    options: &ChartConfig,
    path: &Path,
) -> Result<bool, ExportError> {
    if series.is_empty() {
        return Ok(false);
    }
    draw(series, options, path).map_err(|err| ExportError::Chart(err.to_string()))?;
    Ok(true)
}

pub fn chart_file_name(student: &Student, score_type: ScoreType) -> String {
    let name: String = student
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}-{}-{}.png", name, student.id.simple(), score_type)
}

/// Both trend charts for one student; returns the files written.
pub fn render_student(
    student: &Student,
    options: &ChartConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    for score_type in ScoreType::ALL {
        let path = out_dir.join(chart_file_name(student, score_type));
        if render_trend(&summary::series(student, score_type), options, &path)? {
            written.push(path);
        }
    }
    Ok(written)
}
