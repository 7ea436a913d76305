use std::fmt::Write;

use crate::models::{Score, ScoreType, Student};
use crate::summary::{self, format_average};

fn student_heading(student: &Student) -> String {
    format!(
        "{} ({} grade {}, {})",
        student.name, student.school, student.grade, student.teacher
    )
}

fn score_line(score: &Score) -> String {
    match &score.subject {
        Some(subject) => format!(
            "{} {} {}: {} pts",
            score.score_type, score.date, subject, score.score
        ),
        None => format!("{} {}: {} pts", score.score_type, score.date, score.score),
    }
}

/// Plain-text dump of every student, in stored score order.
pub fn build_text_dump(students: &[Student]) -> String {
    students
        .iter()
        .map(|student| {
            let mut block = student_heading(student);
            for score in &student.scores {
                let _ = write!(block, "\n - {}", score_line(score));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_student_card(student: &Student) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## {}", student_heading(student));
    let _ = writeln!(output, "id: {}", student.id);

    for score_type in ScoreType::ALL {
        let summary = summary::summarize(student, score_type);
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "{} trend (average {})",
            score_type,
            format_average(summary.average)
        );
        if summary.entries.is_empty() {
            let _ = writeln!(output, "  no scores recorded");
        } else {
            for score in &summary.entries {
                let _ = writeln!(output, "  {:<32} {:>4}", score.date, score.score);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Scores");
    if student.scores.is_empty() {
        let _ = writeln!(output, "  none");
    } else {
        for (index, score) in student.scores.iter().enumerate() {
            let _ = writeln!(output, "  [{}] [{}]", index, score_line(score));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::School;
    use uuid::Uuid;

    fn kim() -> Student {
        Student {
            id: Uuid::nil(),
            name: "Kim".to_string(),
            school: School::HighSchool,
            grade: 1,
            teacher: "Lee".to_string(),
            scores: vec![
                Score {
                    score_type: ScoreType::MockExam,
                    date: "high1 June".to_string(),
                    score: 85,
                    subject: Some("English".to_string()),
                },
                Score {
                    score_type: ScoreType::InSchool,
                    date: "high1 1st-semester-midterm".to_string(),
                    score: 90,
                    subject: None,
                },
            ],
        }
    }

    #[test]
    fn dump_lists_every_score() {
        let park = Student {
            id: Uuid::nil(),
            name: "Park".to_string(),
            school: School::MiddleSchool,
            grade: 3,
            teacher: "Choi".to_string(),
            scores: Vec::new(),
        };
        let dump = build_text_dump(&[kim(), park]);
        assert_eq!(
            dump,
            "Kim (high school grade 1, Lee)\n\
             \x20- mock-exam high1 June English: 85 pts\n\
             \x20- in-school high1 1st-semester-midterm: 90 pts\n\
             \n\
             Park (middle school grade 3, Choi)"
        );
    }

    #[test]
    fn dump_of_nothing_is_empty() {
        assert_eq!(build_text_dump(&[]), "");
    }

    #[test]
    fn card_shows_averages_and_indices() {
        let card = build_student_card(&kim());
        assert!(card.contains("in-school trend (average 90.00)"));
        assert!(card.contains("mock-exam trend (average 85.00)"));
        assert!(card.contains("[0] [mock-exam high1 June English: 85 pts]"));
        assert!(card.contains("[1] [in-school high1 1st-semester-midterm: 90 pts]"));
    }

    #[test]
    fn card_for_student_without_scores() {
        let mut student = kim();
        student.scores.clear();
        let card = build_student_card(&student);
        assert!(card.contains("in-school trend (average 0.00)"));
        assert!(card.contains("no scores recorded"));
    }
}
