use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{AccessGate, Identity, IdentityProvider};
use crate::error::AppError;
use crate::models::{NewStudent, Score, Student};
use crate::store::StudentStore;

/// Display-time search over the mirror. Empty text fields and an unset grade
/// match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub name: String,
    pub school: String,
    pub grade: Option<i32>,
    pub teacher: String,
}

impl SearchFilter {
    pub fn matches(&self, student: &Student) -> bool {
        student.name.contains(self.name.as_str())
            && student.school.as_str().contains(self.school.as_str())
            && self.grade.map_or(true, |grade| student.grade == grade)
            && student.teacher.contains(self.teacher.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub session: Option<Identity>,
    pub mirror: Vec<Student>,
    pub search: SearchFilter,
}

#[derive(Debug, Clone)]
pub enum Action {
    SignedIn(Identity),
    SignedOut,
    MirrorReplaced(Vec<Student>),
    SearchChanged(SearchFilter),
}

pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        Action::SignedIn(identity) => AppState {
            session: Some(identity),
            ..state
        },
        Action::SignedOut => AppState {
            session: None,
            mirror: Vec::new(),
            ..state
        },
        Action::MirrorReplaced(students) => AppState {
            mirror: students,
            ..state
        },
        Action::SearchChanged(search) => AppState { search, ..state },
    }
}

/// Drives every user action against the store.
///
/// Mutations write first, then re-fetch the whole collection and swap the
/// mirror in one step. A failed write or re-fetch returns the error and
/// leaves the mirror as it was.
pub struct App<S, P> {
    store: S,
    provider: P,
    gate: AccessGate,
    state: AppState,
}

impl<S, P> App<S, P>
where
    S: StudentStore,
    P: IdentityProvider,
{
    pub fn new(store: S, provider: P, gate: AccessGate) -> Self {
        Self {
            store,
            provider,
            gate,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    fn require_session(&self) -> Result<(), AppError> {
        if self.state.session.is_none() {
            return Err(AppError::NotSignedIn);
        }
        Ok(())
    }

    /// Signs in and checks the allow-list without touching the store.
    pub async fn authenticate(&mut self) -> Result<Identity, AppError> {
        let identity = self.provider.sign_in().await?;

        if !self.gate.admits(&identity) {
            warn!(email = %identity.email, "identity not on allow-list, signing out");
            let signed_out = self.provider.sign_out().await;
            self.dispatch(Action::SignedOut);
            if let Err(err) = signed_out {
                warn!(error = %err, "forced sign-out failed at provider");
            }
            return Err(AppError::Unauthorized {
                email: identity.email,
            });
        }

        info!(email = %identity.email, "signed in");
        self.dispatch(Action::SignedIn(identity.clone()));
        Ok(identity)
    }

    pub async fn sign_in(&mut self) -> Result<Identity, AppError> {
        let identity = self.authenticate().await?;
        self.refresh().await?;
        Ok(identity)
    }

    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.provider.sign_out().await?;
        self.dispatch(Action::SignedOut);
        Ok(())
    }

    /// Replaces the mirror with a fresh copy of the collection.
    pub async fn refresh(&mut self) -> Result<usize, AppError> {
        self.require_session()?;
        let students = self.store.list_all().await?;
        let count = students.len();
        debug!(count, "mirror refreshed");
        self.dispatch(Action::MirrorReplaced(students));
        Ok(count)
    }

    pub fn set_search(&mut self, search: SearchFilter) {
        self.dispatch(Action::SearchChanged(search));
    }

    pub fn find_student(&self, id: Uuid) -> Option<&Student> {
        self.state.mirror.iter().find(|s| s.id == id)
    }

    pub fn visible_students(&self) -> Vec<&Student> {
        self.state
            .mirror
            .iter()
            .filter(|s| self.state.search.matches(s))
            .collect()
    }

    pub async fn add_student(&mut self, student: NewStudent) -> Result<Uuid, AppError> {
        self.require_session()?;
        let id = self.store.create(&student).await?;
        info!(%id, name = %student.name, "student created");
        self.refresh().await?;
        Ok(id)
    }

    /// Appends a score. Returns `Ok(false)` when the student is not in the mirror.
    pub async fn add_score(&mut self, student_id: Uuid, score: Score) -> Result<bool, AppError> {
        self.require_session()?;
        let Some(student) = self.find_student(student_id) else {
            debug!(%student_id, "add score skipped, student not in mirror");
            return Ok(false);
        };

        let mut updated = student.scores.clone();
        updated.push(score);
        self.store.replace_scores(student_id, &updated).await?;
        info!(%student_id, scores = updated.len(), "scores replaced");
        self.refresh().await?;
        Ok(true)
    }

    /// Removes the score at `index` of the stored list.
    pub async fn delete_score(&mut self, student_id: Uuid, index: usize) -> Result<bool, AppError> {
        self.require_session()?;
        let Some(student) = self.find_student(student_id) else {
            debug!(%student_id, "delete score skipped, student not in mirror");
            return Ok(false);
        };
        if index >= student.scores.len() {
            debug!(%student_id, index, "delete score skipped, index out of range");
            return Ok(false);
        }

        let updated: Vec<Score> = student
            .scores
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, score)| score.clone())
            .collect();
        self.store.replace_scores(student_id, &updated).await?;
        info!(%student_id, scores = updated.len(), "scores replaced");
        self.refresh().await?;
        Ok(true)
    }

    pub async fn delete_student(&mut self, student_id: Uuid) -> Result<bool, AppError> {
        self.require_session()?;
        if self.find_student(student_id).is_none() {
            debug!(%student_id, "delete student skipped, not in mirror");
            return Ok(false);
        }

        self.store.delete(student_id).await?;
        info!(%student_id, "student deleted");
        self.refresh().await?;
        Ok(true)
    }
}
