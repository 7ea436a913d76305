use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::error::ExportError;
use crate::models::Student;

pub const COLUMNS: [&str; 7] = ["name", "school", "grade", "teacher", "type", "period", "score"];

/// One row per (student, score) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub name: String,
    pub school: String,
    pub grade: i32,
    pub teacher: String,
    #[serde(rename = "type")]
    pub score_type: String,
    pub period: String,
    pub score: i64,
}

impl ExportRow {
    fn cells(&self) -> [String; 7] {
        [
            self.name.clone(),
            self.school.clone(),
            self.grade.to_string(),
            self.teacher.clone(),
            self.score_type.clone(),
            self.period.clone(),
            self.score.to_string(),
        ]
    }
}

pub fn export_rows(students: &[Student]) -> Vec<ExportRow> {
    students
        .iter()
        .flat_map(|student| {
            student.scores.iter().map(move |score| ExportRow {
                name: student.name.clone(),
                school: student.school.to_string(),
                grade: student.grade,
                teacher: student.teacher.clone(),
                score_type: score.score_type.to_string(),
                period: score.date.clone(),
                score: score.score,
            })
        })
        .collect()
}

pub fn write_csv(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_xlsx(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Scores")?;

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        worksheet.write_string(r, 0, &row.name)?;
        worksheet.write_string(r, 1, &row.school)?;
        worksheet.write_number(r, 2, row.grade as f64)?;
        worksheet.write_string(r, 3, &row.teacher)?;
        worksheet.write_string(r, 4, &row.score_type)?;
        worksheet.write_string(r, 5, &row.period)?;
        worksheet.write_number(r, 6, row.score as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx(rows: &[ExportRow], path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, to_xlsx(rows)?)?;
    Ok(())
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;
const LINE_HEIGHT: f32 = 6.0;
const FONT_SIZE: f32 = 8.0;
const COLUMN_X: [f32; 7] = [12.0, 44.0, 72.0, 86.0, 112.0, 134.0, 186.0];
const MAX_CELL_CHARS: usize = 18;

/// Table rows that fit under the title and header on one page.
pub fn rows_per_page() -> usize {
    (((TOP - BOTTOM) / LINE_HEIGHT) as usize).saturating_sub(3).max(1)
}

/// Splits rows into pages. An empty table still yields one (header-only) page.
pub fn paginate(rows: &[ExportRow], per_page: usize) -> Vec<&[ExportRow]> {
    if rows.is_empty() {
        return vec![&rows[..0]];
    }
    rows.chunks(per_page.max(1)).collect()
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
        clipped.push('~');
        clipped
    }
}

fn draw_page(
    layer: &PdfLayerReference,
    rows: &[ExportRow],
    page: usize,
    pages: usize,
    title: &str,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    layer.use_text(title, 12.0, Mm(COLUMN_X[0]), Mm(TOP + 8.0), bold);

    let mut y = TOP;
    for (heading, x) in COLUMNS.iter().zip(COLUMN_X) {
        layer.use_text(*heading, FONT_SIZE, Mm(x), Mm(y), bold);
    }

    for row in rows {
        y -= LINE_HEIGHT;
        for (index, (cell, x)) in row.cells().iter().zip(COLUMN_X).enumerate() {
            // Period labels get the wide column and are never clipped.
            let text = if index == 5 { cell.clone() } else { clip(cell) };
            layer.use_text(text, FONT_SIZE, Mm(x), Mm(y), regular);
        }
    }

    layer.use_text(
        format!("page {page} / {pages}"),
        FONT_SIZE,
        Mm(PAGE_WIDTH / 2.0 - 10.0),
        Mm(BOTTOM - 8.0),
        regular,
    );
}

/// Whether a builtin (WinAnsi-encoded) PDF font can draw `c`.
fn is_win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}')
        || "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ".contains(c)
}

fn first_unsupported_cell(rows: &[ExportRow]) -> Option<String> {
    rows.iter()
        .flat_map(|row| row.cells())
        .find(|cell| !cell.chars().all(is_win_ansi))
}

fn pdf_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Paginated score table; the header row is repeated on every page.
///
/// With `font` set, that TrueType file is embedded and used for all text.
/// Without it the builtin Helvetica faces are used, and a cell they cannot
/// encode fails the export instead of being drawn blank.
pub fn write_pdf(
    rows: &[ExportRow],
    title: &str,
    font: Option<&Path>,
    path: &Path,
) -> Result<(), ExportError> {
    if font.is_none() {
        if let Some(cell) = first_unsupported_cell(rows) {
            return Err(ExportError::Pdf(format!(
                "`{cell}` needs a font outside WinAnsi; set [pdf] font in the config"
            )));
        }
    }

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "table");
    let (regular, bold) = match font {
        Some(font_path) => {
            let embedded = doc
                .add_external_font(File::open(font_path)?)
                .map_err(pdf_error)?;
            (embedded.clone(), embedded)
        }
        None => (
            doc.add_builtin_font(BuiltinFont::Helvetica)
                .map_err(pdf_error)?,
            doc.add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(pdf_error)?,
        ),
    };

    let pages = paginate(rows, rows_per_page());
    let total = pages.len();
    for (index, chunk) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "table");
            doc.get_page(page).get_layer(layer)
        };
        draw_page(&layer, chunk, index + 1, total, title, &regular, &bold);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    doc.save(&mut writer).map_err(pdf_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{School, Score, ScoreType};
    use uuid::Uuid;

    fn students() -> Vec<Student> {
        vec![
            Student {
                id: Uuid::new_v4(),
                name: "Kim".to_string(),
                school: School::HighSchool,
                grade: 1,
                teacher: "Lee".to_string(),
                scores: vec![
                    Score {
                        score_type: ScoreType::InSchool,
                        date: "high1 1st-semester-midterm".to_string(),
                        score: 95,
                        subject: None,
                    },
                    Score {
                        score_type: ScoreType::MockExam,
                        date: "high1 June".to_string(),
                        score: 85,
                        subject: None,
                    },
                ],
            },
            Student {
                id: Uuid::new_v4(),
                name: "Park".to_string(),
                school: School::MiddleSchool,
                grade: 2,
                teacher: "Choi".to_string(),
                scores: Vec::new(),
            },
        ]
    }

    #[test]
    fn one_row_per_score() {
        let rows = export_rows(&students());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].cells(),
            [
                "Kim".to_string(),
                "high school".to_string(),
                "1".to_string(),
                "Lee".to_string(),
                "in-school".to_string(),
                "high1 1st-semester-midterm".to_string(),
                "95".to_string(),
            ]
        );
        assert_eq!(rows[1].period, "high1 June");
    }

    #[test]
    fn csv_has_fixed_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        write_csv(&export_rows(&students()), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("name,school,grade,teacher,type,period,score"));
        assert_eq!(
            lines.next(),
            Some("Kim,high school,1,Lee,in-school,high1 1st-semester-midterm,95")
        );
    }

    #[test]
    fn csv_of_empty_mirror_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&[], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), "name,school,grade,teacher,type,period,score");
    }

    #[test]
    fn xlsx_is_a_zip_archive() {
        let bytes = to_xlsx(&export_rows(&students())).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn pagination_splits_long_tables() {
        let row = export_rows(&students()).remove(0);
        let rows = vec![row; 95];
        let pages = paginate(&rows, 40);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].len(), 15);
        assert_eq!(paginate(&[], 40).len(), 1);
        assert!(rows_per_page() > 1);
    }

    #[test]
    fn clips_long_cells() {
        assert_eq!(clip("Kim"), "Kim");
        let clipped = clip("A very long student name indeed");
        assert_eq!(clipped.chars().count(), MAX_CELL_CHARS);
        assert!(clipped.ends_with('~'));
    }

    #[test]
    fn pdf_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.pdf");
        write_pdf(&export_rows(&students()), "Scores", None, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn win_ansi_covers_latin1_and_cp1252_extras() {
        assert!(is_win_ansi('a'));
        assert!(is_win_ansi('é'));
        assert!(is_win_ansi('€'));
        assert!(!is_win_ansi('김'));
        assert!(!is_win_ansi('\n'));
    }

    #[test]
    fn korean_names_without_font_fail_instead_of_blanking() {
        let mut data = students();
        data[0].name = "김민지".to_string();
        data[0].teacher = "이선생".to_string();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("korean.pdf");

        let err = write_pdf(&export_rows(&data), "Scores", None, &path).unwrap_err();
        match err {
            ExportError::Pdf(message) => assert!(message.contains("김민지")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn missing_font_file_is_reported() {
        let mut data = students();
        data[0].name = "김민지".to_string();
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("absent.ttf");
        let path = dir.path().join("korean.pdf");

        let err = write_pdf(&export_rows(&data), "Scores", Some(&font), &path).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(!path.exists());
    }
}
