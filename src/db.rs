use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewStudent, School, Score, ScoreType, Student};
use crate::store::StudentStore;

/// Postgres-backed `students` collection. Each row is one student document;
/// the score list lives in a JSONB column and is only ever rewritten whole.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_db(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn seed(&self) -> Result<usize, StoreError> {
        let students = vec![
            (
                Uuid::parse_str("6f1c2a9e-5b3d-4c8a-9e2f-7a1b3c5d7e90").map_err(seed_id_error)?,
                "Kim Minji",
                School::HighSchool,
                1,
                "Lee",
                vec![
                    seed_score(ScoreType::InSchool, "high1 1st-semester-midterm", 88),
                    seed_score(ScoreType::InSchool, "high1 1st-semester-final", 92),
                    seed_score(ScoreType::MockExam, "high1 March", 81),
                    seed_score(ScoreType::MockExam, "high1 June", 85),
                ],
            ),
            (
                Uuid::parse_str("a4e8b2c6-1d3f-4a5b-8c7d-9e0f1a2b3c4d").map_err(seed_id_error)?,
                "Park Jisoo",
                School::MiddleSchool,
                3,
                "Choi",
                vec![
                    seed_score(ScoreType::InSchool, "middle3 1st-semester-midterm", 74),
                    seed_score(ScoreType::InSchool, "middle3 2nd-semester-midterm", 79),
                ],
            ),
            (
                Uuid::parse_str("1b2c3d4e-5f60-4718-89a0-b1c2d3e4f506").map_err(seed_id_error)?,
                "Jung Hana",
                School::HighSchool,
                2,
                "Lee",
                Vec::new(),
            ),
        ];

        let mut inserted = 0usize;
        for (id, name, school, grade, teacher, scores) in students {
            let result = sqlx::query(
                r#"
                INSERT INTO score_manager.students (id, name, school, grade, teacher, scores)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(name)
            .bind(school.as_str())
            .bind(grade)
            .bind(teacher)
            .bind(Json(scores))
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

fn seed_id_error(err: uuid::Error) -> StoreError {
    StoreError::Unavailable(format!("invalid seed id: {err}"))
}

fn seed_score(score_type: ScoreType, date: &str, score: i64) -> Score {
    Score {
        score_type,
        date: date.to_string(),
        score,
        subject: None,
    }
}

#[async_trait]
impl StudentStore for PgStore {
    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, school, grade, teacher, scores \
             FROM score_manager.students \
             ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut students = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let school: String = row.try_get("school")?;
            let school = school
                .parse::<School>()
                .map_err(|reason| StoreError::Decode { id, reason })?;
            let scores: Json<Vec<Score>> =
                row.try_get("scores").map_err(|err| StoreError::Decode {
                    id,
                    reason: err.to_string(),
                })?;

            students.push(Student {
                id,
                name: row.try_get("name")?,
                school,
                grade: row.try_get("grade")?,
                teacher: row.try_get("teacher")?,
                scores: scores.0,
            });
        }

        Ok(students)
    }

    async fn create(&self, student: &NewStudent) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO score_manager.students (id, name, school, grade, teacher, scores)
            VALUES ($1, $2, $3, $4, $5, '[]'::jsonb)
            "#,
        )
        .bind(id)
        .bind(&student.name)
        .bind(student.school.as_str())
        .bind(student.grade)
        .bind(&student.teacher)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn replace_scores(&self, id: Uuid, scores: &[Score]) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE score_manager.students SET scores = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(scores))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM score_manager.students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
