//! Folder repository implementation

use crate::error::{Error, Result};
use crate::models::{Folder, FolderId};
use libsql::{Connection, Row};

/// Trait for folder storage operations (async)
#[allow(async_fn_in_trait)]
pub trait FolderRepository {
    async fn get(&self, id: &FolderId) -> Result<Option<Folder>>;

    /// List folders, oldest first
    async fn list(&self) -> Result<Vec<Folder>>;

    /// Insert or replace a folder
    async fn put(&self, folder: &Folder) -> Result<()>;

    /// Delete a folder and every note inside it.
    ///
    /// Returns the number of notes removed; `Error::NotFound` if the folder
    /// does not exist.
    async fn delete(&self, id: &FolderId) -> Result<u64>;
}

/// libSQL implementation of `FolderRepository`
pub struct LibSqlFolderRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFolderRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_folder(row: &Row) -> Result<Folder> {
        let id: String = row.get(0)?;
        Ok(Folder {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid folder id '{id}'")))?,
            name: row.get(1)?,
            remote_path: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    async fn delete_in_transaction(&self, id: &FolderId) -> Result<(u64, u64)> {
        let notes = self
            .conn
            .execute("DELETE FROM notes WHERE folder_id = ?", [id.as_str()])
            .await?;
        let folders = self
            .conn
            .execute("DELETE FROM folders WHERE id = ?", [id.as_str()])
            .await?;
        Ok((notes, folders))
    }
}

impl FolderRepository for LibSqlFolderRepository<'_> {
    async fn get(&self, id: &FolderId) -> Result<Option<Folder>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, remote_path, created_at, updated_at FROM folders WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_folder(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Folder>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, remote_path, created_at, updated_at
                 FROM folders
                 ORDER BY created_at ASC, name ASC",
                (),
            )
            .await?;

        let mut folders = Vec::new();
        while let Some(row) = rows.next().await? {
            folders.push(Self::parse_folder(&row)?);
        }
        Ok(folders)
    }

    async fn put(&self, folder: &Folder) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO folders (id, name, remote_path, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    remote_path = excluded.remote_path,
                    updated_at = excluded.updated_at",
                libsql::params![
                    folder.id.as_str(),
                    folder.name.as_str(),
                    folder.remote_path.as_str(),
                    folder.created_at,
                    folder.updated_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &FolderId) -> Result<u64> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let (notes, folders) = match self.delete_in_transaction(id).await {
            Ok(counts) => counts,
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        };

        if folders == 0 {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(Error::NotFound(id.to_string()));
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!("Deleted folder {} with {} notes", id, notes);
        Ok(notes)
    }
}
