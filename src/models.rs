use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum School {
    #[serde(rename = "middle school")]
    MiddleSchool,
    #[serde(rename = "high school")]
    HighSchool,
}

impl School {
    pub fn as_str(&self) -> &'static str {
        match self {
            School::MiddleSchool => "middle school",
            School::HighSchool => "high school",
        }
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for School {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "middle school" | "middle" => Ok(School::MiddleSchool),
            "high school" | "high" => Ok(School::HighSchool),
            other => Err(format!("unknown school `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreType {
    #[serde(rename = "in-school")]
    InSchool,
    #[serde(rename = "mock-exam")]
    MockExam,
}

impl ScoreType {
    pub const ALL: [ScoreType; 2] = [ScoreType::InSchool, ScoreType::MockExam];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreType::InSchool => "in-school",
            ScoreType::MockExam => "mock-exam",
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "in-school" => Ok(ScoreType::InSchool),
            "mock-exam" => Ok(ScoreType::MockExam),
            other => Err(format!("unknown score type `{other}`")),
        }
    }
}

/// One entry of a student's embedded score list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "type")]
    pub score_type: ScoreType,
    /// Period label, e.g. `high1 June`.
    pub date: String,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub school: School,
    pub grade: i32,
    pub teacher: String,
    #[serde(default)]
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub school: School,
    pub grade: i32,
    pub teacher: String,
}
