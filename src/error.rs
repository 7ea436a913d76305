use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("student {0} not found in store")]
    NotFound(Uuid),
    #[error("malformed student record {id}: {reason}")]
    Decode { id: Uuid, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no identity available: {0}")]
    NoIdentity(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{email} is not allowed to use this application")]
    Unauthorized { email: String },
    #[error("sign in required")]
    NotSignedIn,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("pdf error: {0}")]
    Pdf(String),
    #[error("chart error: {0}")]
    Chart(String),
}
