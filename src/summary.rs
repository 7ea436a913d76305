use crate::models::{Score, ScoreType, Student};
use crate::period::order_key;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSummary {
    pub entries: Vec<Score>,
    pub average: f64,
}

/// Chart-ready view of one score type for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSeries {
    pub title: String,
    pub score_type: ScoreType,
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

impl ScoreSeries {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Scores of the given type, stable-sorted by period key.
pub fn filter_by_type(scores: &[Score], score_type: ScoreType) -> Vec<Score> {
    let mut subset: Vec<Score> = scores
        .iter()
        .filter(|score| score.score_type == score_type)
        .cloned()
        .collect();
    subset.sort_by_key(|score| order_key(&score.date));
    subset
}

pub fn average(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
}

pub fn format_average(value: f64) -> String {
    format!("{value:.2}")
}

pub fn summarize(student: &Student, score_type: ScoreType) -> TypeSummary {
    let entries = filter_by_type(&student.scores, score_type);
    let values: Vec<i64> = entries.iter().map(|s| s.score).collect();
    TypeSummary {
        average: average(&values),
        entries,
    }
}

pub fn series(student: &Student, score_type: ScoreType) -> ScoreSeries {
    let entries = filter_by_type(&student.scores, score_type);
    ScoreSeries {
        title: format!("{} - {} trend", student.name, score_type),
        score_type,
        labels: entries.iter().map(|s| s.date.clone()).collect(),
        values: entries.iter().map(|s| s.score).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::School;
    use uuid::Uuid;

    fn score(score_type: ScoreType, date: &str, value: i64) -> Score {
        Score {
            score_type,
            date: date.to_string(),
            score: value,
            subject: None,
        }
    }

    fn student(scores: Vec<Score>) -> Student {
        Student {
            id: Uuid::new_v4(),
            name: "Kim".to_string(),
            school: School::HighSchool,
            grade: 1,
            teacher: "Lee".to_string(),
            scores,
        }
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(format_average(average(&[])), "0.00");
    }

    #[test]
    fn average_formats_two_decimals() {
        assert_eq!(format_average(average(&[80, 90])), "85.00");
        assert_eq!(format_average(average(&[90, 85, 70])), "81.67");
        assert!((average(&[90, 85, 70]) - 81.666_666).abs() < 0.001);
    }

    #[test]
    fn filters_each_type_separately() {
        let scores = vec![
            score(ScoreType::InSchool, "high1 1st-semester-midterm", 90),
            score(ScoreType::MockExam, "high1 June", 85),
        ];
        assert_eq!(filter_by_type(&scores, ScoreType::InSchool), vec![scores[0].clone()]);
        assert_eq!(filter_by_type(&scores, ScoreType::MockExam), vec![scores[1].clone()]);
    }

    #[test]
    fn sorts_by_period_and_keeps_unparsed_last_in_order() {
        let scores = vec![
            score(ScoreType::InSchool, "weird", 1),
            score(ScoreType::InSchool, "high1 2nd-semester-final", 2),
            score(ScoreType::InSchool, "also weird", 3),
            score(ScoreType::InSchool, "middle3 1st-semester-final", 4),
            score(ScoreType::InSchool, "high1 1st-semester-midterm", 5),
        ];
        let values: Vec<i64> = filter_by_type(&scores, ScoreType::InSchool)
            .iter()
            .map(|s| s.score)
            .collect();
        assert_eq!(values, vec![4, 5, 2, 1, 3]);
    }

    #[test]
    fn duplicates_are_kept() {
        let scores = vec![
            score(ScoreType::MockExam, "high2 March", 70),
            score(ScoreType::MockExam, "high2 March", 75),
        ];
        let summary = summarize(&student(scores), ScoreType::MockExam);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.average, 72.5);
    }

    #[test]
    fn series_follows_sorted_order() {
        let s = student(vec![
            score(ScoreType::MockExam, "high1 October", 88),
            score(ScoreType::MockExam, "high1 March", 60),
        ]);
        let mock = series(&s, ScoreType::MockExam);
        assert_eq!(mock.labels, vec!["high1 March", "high1 October"]);
        assert_eq!(mock.values, vec![60, 88]);
        assert!(series(&s, ScoreType::InSchool).is_empty());
    }
}
