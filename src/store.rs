use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewStudent, Score, Student};

/// Whole-document access to the `students` collection.
///
/// There is no per-entry score update: `replace_scores` always rewrites the
/// full embedded list.
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Student>, StoreError>;

    /// Creates the student with an empty score list and returns its id.
    async fn create(&self, student: &NewStudent) -> Result<Uuid, StoreError>;

    async fn replace_scores(&self, id: Uuid, scores: &[Score]) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// In-process store. Keeps insertion order.
///
/// When opened on a path, every write is persisted as a JSON snapshot before
/// it becomes visible; a failed snapshot write leaves the data unchanged.
#[derive(Default)]
pub struct MemoryStore {
    students: Mutex<Vec<Student>>,
    snapshot: Option<PathBuf>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let students = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            students: Mutex::new(students),
            snapshot: Some(path.to_path_buf()),
            ..Self::default()
        })
    }

    /// Makes every following write fail with `StoreError::Unavailable`.
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Student>>, StoreError> {
        self.students
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }

    /// Applies `change` to a copy of the collection and swaps it in once the
    /// snapshot (if any) is on disk.
    fn write<T>(
        &self,
        change: impl FnOnce(&mut Vec<Student>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        let mut students = self.lock()?;
        let mut next = students.clone();
        let result = change(&mut next)?;
        if let Some(path) = &self.snapshot {
            std::fs::write(path, serde_json::to_string_pretty(&next)?)?;
        }
        *students = next;
        Ok(result)
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read rejected".to_string()));
        }
        Ok(self.lock()?.clone())
    }

    async fn create(&self, student: &NewStudent) -> Result<Uuid, StoreError> {
        self.write(|students| {
            let id = Uuid::new_v4();
            students.push(Student {
                id,
                name: student.name.clone(),
                school: student.school,
                grade: student.grade,
                teacher: student.teacher.clone(),
                scores: Vec::new(),
            });
            Ok(id)
        })
    }

    async fn replace_scores(&self, id: Uuid, scores: &[Score]) -> Result<(), StoreError> {
        self.write(|students| {
            let student = students
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(StoreError::NotFound(id))?;
            student.scores = scores.to_vec();
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.write(|students| {
            students.retain(|s| s.id != id);
            Ok(())
        })
    }
}
