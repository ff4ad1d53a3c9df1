//! Key/value config repository implementation

use crate::error::Result;
use libsql::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for config storage operations (async). Values are stored as JSON.
#[allow(async_fn_in_trait)]
pub trait ConfigRepository {
    /// Load and deserialize the value stored under `key`
    async fn get_config<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Serialize and store `value` under `key`, replacing any previous value
    async fn set_config<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Remove `key`; returns whether it existed
    async fn delete_config(&self, key: &str) -> Result<bool>;

    /// Remove every key
    async fn clear(&self) -> Result<()>;
}

/// libSQL implementation of `ConfigRepository`
pub struct LibSqlConfigRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlConfigRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM config WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO config (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

impl ConfigRepository for LibSqlConfigRepository<'_> {
    async fn get_config<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_config<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw).await
    }

    async fn delete_config(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM config WHERE key = ?", [key])
            .await?;
        Ok(rows > 0)
    }

    async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM config", ()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::RepositorySyncConfig;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_key_is_none() {
        let db = setup().await;
        let repo = LibSqlConfigRepository::new(db.connection());

        let value: Option<String> = repo.get_config("nothing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_and_get_structured_value() {
        let db = setup().await;
        let repo = LibSqlConfigRepository::new(db.connection());

        let config = RepositorySyncConfig::new("octo", "notes", "tok").with_branch("dev");
        repo.set_config("github", &config).await.unwrap();

        let loaded: RepositorySyncConfig = repo.get_config("github").await.unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_replaces_and_delete_removes() {
        let db = setup().await;
        let repo = LibSqlConfigRepository::new(db.connection());

        repo.set_config("auth_token", &"one").await.unwrap();
        repo.set_config("auth_token", &"two").await.unwrap();
        let token: Option<String> = repo.get_config("auth_token").await.unwrap();
        assert_eq!(token.as_deref(), Some("two"));

        assert!(repo.delete_config("auth_token").await.unwrap());
        assert!(!repo.delete_config("auth_token").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clear_removes_everything() {
        let db = setup().await;
        let repo = LibSqlConfigRepository::new(db.connection());

        repo.set_config("a", &1).await.unwrap();
        repo.set_config("b", &2).await.unwrap();
        repo.clear().await.unwrap();

        let a: Option<i32> = repo.get_config("a").await.unwrap();
        assert!(a.is_none());
    }
}
