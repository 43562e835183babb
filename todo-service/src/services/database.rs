use crate::models::Todo;
use mongodb::{
    bson::doc, options::ClientOptions, Client as MongoClient, Collection, Database,
};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;

pub const TODOS_COLLECTION: &str = "todos";
/// Used when neither `DB_NAME` nor the connection string names a database.
pub const DEFAULT_DATABASE: &str = "test";

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Parses the connection string and builds a client. The driver connects lazily, so
    /// this succeeds even when the server is down; only a malformed URI fails here.
    pub async fn connect(
        uri: &Secret<String>,
        database: Option<&str>,
        app_name: &str,
    ) -> Result<Self, AppError> {
        let mut options = ClientOptions::parse(uri.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::from(e)
            })?;
        options.app_name = Some(app_name.to_string());

        let database = database
            .map(str::to_string)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = MongoClient::with_options(options)?;
        let db = client.database(&database);
        tracing::info!(database = %database, "MongoDB client initialized");
        Ok(Self { client, db })
    }

    pub async fn health_check(&self) -> Result<(), mongodb::error::Error> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    pub fn todos(&self) -> Collection<Todo> {
        self.db.collection(TODOS_COLLECTION)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect_to(uri: &str, database: Option<&str>) -> MongoDb {
        MongoDb::connect(&Secret::new(uri.to_string()), database, "todo-service")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn database_defaults_to_test() {
        let db = connect_to("mongodb://localhost:27017", None).await;
        assert_eq!(db.database().name(), "test");
    }

    #[tokio::test]
    async fn database_comes_from_uri_then_explicit_name() {
        let db = connect_to("mongodb://localhost:27017/from_uri", None).await;
        assert_eq!(db.database().name(), "from_uri");

        let db = connect_to("mongodb://localhost:27017/from_uri", Some("explicit")).await;
        assert_eq!(db.database().name(), "explicit");
    }

    #[tokio::test]
    async fn malformed_uri_fails_to_connect() {
        let result = MongoDb::connect(&Secret::new("not-a-uri".to_string()), None, "todo-service").await;
        assert!(result.is_err());
    }
}
