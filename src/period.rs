use crate::models::ScoreType;

/// Key given to labels that do not follow `<level><grade> <period>`.
pub const SENTINEL_KEY: u32 = 9999;

pub const LEVELS: [&str; 2] = ["middle", "high"];
pub const GRADES: [u32; 3] = [1, 2, 3];

pub const IN_SCHOOL_TERMS: [&str; 4] = [
    "1st-semester-midterm",
    "1st-semester-final",
    "2nd-semester-midterm",
    "2nd-semester-final",
];

pub const MOCK_EXAM_MONTHS: [&str; 4] = ["March", "June", "September", "October"];

fn level_base(level: &str) -> Option<u32> {
    match level {
        "middle" => Some(0),
        "high" => Some(1000),
        _ => None,
    }
}

fn period_rank(period: &str) -> u32 {
    if let Some(pos) = IN_SCHOOL_TERMS.iter().position(|term| *term == period) {
        return pos as u32 + 1;
    }
    if let Some(pos) = MOCK_EXAM_MONTHS.iter().position(|month| *month == period) {
        return pos as u32 + 5;
    }
    0
}

/// Maps a period label to a key whose ascending order is chronological.
///
/// Never fails: anything outside the label grammar gets [`SENTINEL_KEY`].
pub fn order_key(label: &str) -> u32 {
    let Some((head, period)) = label.trim().split_once(' ') else {
        return SENTINEL_KEY;
    };
    if period.is_empty() {
        return SENTINEL_KEY;
    }

    for level in LEVELS {
        let Some(grade) = head.strip_prefix(level) else {
            continue;
        };
        let grade = match grade {
            "1" => 1,
            "2" => 2,
            "3" => 3,
            _ => return SENTINEL_KEY,
        };
        let Some(base) = level_base(level) else {
            return SENTINEL_KEY;
        };
        return base + grade * 100 + period_rank(period);
    }

    SENTINEL_KEY
}

pub fn in_school_labels() -> Vec<String> {
    LEVELS
        .into_iter()
        .flat_map(|level| {
            GRADES.into_iter().flat_map(move |grade| {
                IN_SCHOOL_TERMS
                    .into_iter()
                    .map(move |term| format!("{level}{grade} {term}"))
            })
        })
        .collect()
}

pub fn mock_exam_labels() -> Vec<String> {
    GRADES
        .into_iter()
        .flat_map(|grade| {
            MOCK_EXAM_MONTHS
                .into_iter()
                .map(move |month| format!("high{grade} {month}"))
        })
        .collect()
}

pub fn labels_for(score_type: ScoreType) -> Vec<String> {
    match score_type {
        ScoreType::InSchool => in_school_labels(),
        ScoreType::MockExam => mock_exam_labels(),
    }
}

pub fn is_known_label(score_type: ScoreType, label: &str) -> bool {
    labels_for(score_type).iter().any(|known| known == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_increase_within_grade() {
        for level in LEVELS {
            for grade in GRADES {
                let keys: Vec<u32> = IN_SCHOOL_TERMS
                    .iter()
                    .map(|term| order_key(&format!("{level}{grade} {term}")))
                    .collect();
                assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
            }
        }
    }

    #[test]
    fn lower_grades_sort_first() {
        let mut all = in_school_labels();
        all.extend(mock_exam_labels());
        for level in LEVELS {
            for low in GRADES {
                for high in GRADES.iter().copied().filter(|g| *g > low) {
                    let prefix_low = format!("{level}{low} ");
                    let prefix_high = format!("{level}{high} ");
                    let max_low = all
                        .iter()
                        .filter(|l| l.starts_with(&prefix_low))
                        .map(|l| order_key(l))
                        .max()
                        .unwrap();
                    let min_high = all
                        .iter()
                        .filter(|l| l.starts_with(&prefix_high))
                        .map(|l| order_key(l))
                        .min()
                        .unwrap();
                    assert!(max_low < min_high);
                }
            }
        }
    }

    #[test]
    fn high_school_after_middle_school() {
        let max_middle = in_school_labels()
            .iter()
            .filter(|l| l.starts_with("middle"))
            .map(|l| order_key(l))
            .max()
            .unwrap();
        let min_high = in_school_labels()
            .iter()
            .chain(mock_exam_labels().iter())
            .filter(|l| l.starts_with("high"))
            .map(|l| order_key(l))
            .min()
            .unwrap();
        assert!(max_middle < min_high);
    }

    #[test]
    fn exact_key_values() {
        assert_eq!(order_key("middle1 1st-semester-midterm"), 101);
        assert_eq!(order_key("middle3 2nd-semester-final"), 304);
        assert_eq!(order_key("high1 1st-semester-midterm"), 1101);
        assert_eq!(order_key("high1 June"), 1106);
        assert_eq!(order_key("high3 October"), 1308);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(order_key("high1 March "), 1105);
        assert_eq!(order_key(" high1 March"), 1105);
        assert_eq!(order_key("\tmiddle2 2nd-semester-final\n"), 204);
    }

    #[test]
    fn unknown_period_ranks_zero() {
        assert_eq!(order_key("high2 summer-camp"), 1200);
        assert!(order_key("high2 summer-camp") < order_key("high2 1st-semester-midterm"));
    }

    #[test]
    fn malformed_labels_get_sentinel() {
        for label in [
            "garbage",
            "",
            "high4 March",
            "high March",
            "college1 March",
            "high1",
            "high1 ",
            "high12 March",
        ] {
            assert_eq!(order_key(label), SENTINEL_KEY, "{label:?}");
        }
    }

    #[test]
    fn vocabularies_match_published_lists() {
        let in_school = in_school_labels();
        assert_eq!(in_school.len(), 24);
        assert_eq!(in_school[0], "middle1 1st-semester-midterm");
        assert_eq!(in_school[23], "high3 2nd-semester-final");

        let mock = mock_exam_labels();
        assert_eq!(mock.len(), 12);
        assert_eq!(mock[0], "high1 March");
        assert_eq!(mock[11], "high3 October");
        assert!(mock.iter().all(|l| order_key(l) != SENTINEL_KEY));
    }

    #[test]
    fn known_label_checks_type_vocabulary() {
        assert!(is_known_label(ScoreType::MockExam, "high2 September"));
        assert!(!is_known_label(ScoreType::MockExam, "middle2 March"));
        assert!(!is_known_label(ScoreType::InSchool, "high2 September"));
    }
}
