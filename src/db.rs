//! MongoDB connection and the process-wide holder around it.
//!
//! The holder moves one way, from empty to initialized, and is never torn down.
//! `main` installs the connection once at startup and hands the resulting
//! `Arc<Connection>` to the router state; handlers never touch the holder.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    options::{ClientOptions, Credential},
    results::InsertOneResult,
    Client, Collection, Database,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::models::{MediaKind, MediaRecord, ScoreRecord};
use crate::store::MediaStore;

const SCORES_COLLECTION: &str = "scores";

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Only a single database connection is allowed per process")]
    AlreadyInitialized,

    #[error("No database connection exists and no credentials were supplied")]
    MissingCredentials,

    #[error("MongoDB driver error: {0}")]
    Driver(#[from] mongodb::error::Error),
}

#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One client handle plus the logical database all collections live in.
pub struct Connection {
    client: Client,
    database: Database,
    username: String,
}

impl Connection {
    /// Build the client. For plain `mongodb://` URIs no network I/O happens
    /// until the first operation; `mongodb+srv://` resolves SRV records here.
    pub async fn connect(
        uri: &str,
        database: &str,
        credentials: Credentials,
    ) -> Result<Self, ConnectionError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.credential = Some(
            Credential::builder()
                .username(credentials.username().to_string())
                .password(credentials.password)
                .build(),
        );

        let client = Client::with_options(options)?;
        let database = client.database(database);

        Ok(Self {
            client,
            database,
            username: credentials.username,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub async fn ping(&self) -> Result<(), ConnectionError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn media(&self, kind: MediaKind) -> Collection<MediaRecord> {
        self.database.collection(kind.collection())
    }

    fn scores(&self) -> Collection<ScoreRecord> {
        self.database.collection(SCORES_COLLECTION)
    }
}

fn inserted_id(result: InsertOneResult) -> String {
    match result.inserted_id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl MediaStore for Connection {
    async fn insert_media(&self, kind: MediaKind, record: MediaRecord) -> crate::Result<String> {
        let result = self.media(kind).insert_one(&record).await?;
        let id = inserted_id(result);
        tracing::debug!("Inserted {} '{}' as {}", kind, record.filename, id);
        Ok(id)
    }

    async fn list_media(&self, kind: MediaKind) -> crate::Result<Vec<MediaRecord>> {
        let cursor = self.media(kind).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_media(
        &self,
        kind: MediaKind,
        filename: &str,
    ) -> crate::Result<Option<MediaRecord>> {
        Ok(self
            .media(kind)
            .find_one(doc! { "filename": filename })
            .await?)
    }

    async fn insert_score(&self, record: ScoreRecord) -> crate::Result<String> {
        let result = self.scores().insert_one(&record).await?;
        Ok(inserted_id(result))
    }

    async fn list_scores(&self) -> crate::Result<Vec<ScoreRecord>> {
        let cursor = self.scores().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Holds at most one [`Connection`].
pub struct ConnectionHolder {
    cell: OnceCell<Arc<Connection>>,
}

static GLOBAL: ConnectionHolder = ConnectionHolder::new();

impl ConnectionHolder {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// The holder shared by the whole process.
    pub fn global() -> &'static ConnectionHolder {
        &GLOBAL
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// First construction. Fails if a connection already exists; callers are
    /// expected to treat that as fatal.
    pub async fn install(
        &self,
        uri: &str,
        database: &str,
        credentials: Credentials,
    ) -> Result<Arc<Connection>, ConnectionError> {
        if self.is_initialized() {
            return Err(ConnectionError::AlreadyInitialized);
        }

        // Concurrent first installs share the single connection built by get_or_try_init.
        self.get_or_connect(uri, database, Some(credentials)).await
    }

    /// Existing connection, or a new one built from `credentials`.
    ///
    /// Credentials passed after initialization are ignored with a warning.
    pub async fn get_or_connect(
        &self,
        uri: &str,
        database: &str,
        credentials: Option<Credentials>,
    ) -> Result<Arc<Connection>, ConnectionError> {
        if let Some(existing) = self.cell.get() {
            if credentials.is_some() {
                tracing::warn!(
                    "Credentials were supplied but the database connection is already initialized; they have no effect"
                );
            }
            return Ok(existing.clone());
        }

        let credentials = credentials.ok_or(ConnectionError::MissingCredentials)?;
        let connection = self
            .cell
            .get_or_try_init(|| async {
                Connection::connect(uri, database, credentials)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(connection.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Plain mongodb:// URIs build a client without contacting a server.
    const LOCAL_URI: &str = "mongodb://localhost:27017";
    const DB_NAME: &str = "multimedia_test";

    #[tokio::test]
    async fn test_accessor_returns_same_instance() {
        let holder = ConnectionHolder::new();
        assert!(!holder.is_initialized());

        let first = holder
            .get_or_connect(LOCAL_URI, DB_NAME, Some(Credentials::new("alice", "pw")))
            .await
            .unwrap();
        let second = holder.get_or_connect(LOCAL_URI, DB_NAME, None).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(holder.is_initialized());
        assert_eq!(first.database().name(), DB_NAME);
    }

    #[tokio::test]
    async fn test_second_install_fails() {
        let holder = ConnectionHolder::new();
        holder
            .install(LOCAL_URI, DB_NAME, Credentials::new("alice", "pw"))
            .await
            .unwrap();

        let result = holder
            .install(LOCAL_URI, DB_NAME, Credentials::new("mallory", "pw2"))
            .await;
        assert!(matches!(result, Err(ConnectionError::AlreadyInitialized)));

        let current = holder.get_or_connect(LOCAL_URI, DB_NAME, None).await.unwrap();
        assert_eq!(current.username(), "alice");
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_late_credentials_are_ignored_with_warning() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let holder = ConnectionHolder::new();
        let original = holder
            .install(LOCAL_URI, DB_NAME, Credentials::new("alice", "pw"))
            .await
            .unwrap();
        assert!(!logs.contents().contains("WARN"));

        let again = holder
            .get_or_connect(LOCAL_URI, DB_NAME, Some(Credentials::new("bob", "other")))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&original, &again));
        assert_eq!(again.username(), "alice");

        let output = logs.contents();
        assert!(output.contains("WARN"), "no warning logged: {output}");
        assert!(output.contains("already initialized"));
    }

    #[tokio::test]
    async fn test_accessor_without_credentials_on_empty_holder() {
        let holder = ConnectionHolder::new();
        let result = holder.get_or_connect(LOCAL_URI, DB_NAME, None).await;
        assert!(matches!(result, Err(ConnectionError::MissingCredentials)));
        assert!(!holder.is_initialized());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }
}
