//! Persistent mapping from directory identity to its variable set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rusqlite::{Connection, DatabaseName, OpenFlags, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info};

use crate::canon::CanonicalPath;
use crate::error::{StoreError, StoreResult, Unavailable};

/// Separates a name from its value in the `.env` format; never allowed in a name.
pub const KEY_DELIMITER: char = '=';

/// Variable set of one directory, ordered by name.
pub type EnvVars = BTreeMap<String, String>;

/// One stored record as reported by [`EnvStore::directories`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub directory: CanonicalPath,
    pub variables: usize,
}

/// Operations every backing medium supports. A record exists exactly while it
/// holds at least one variable.
pub trait EnvStore {
    /// Full variable set of `dir`; empty when nothing is stored.
    fn get(&self, dir: &CanonicalPath) -> StoreResult<EnvVars>;

    /// Insert or overwrite a single variable.
    fn set(&mut self, dir: &CanonicalPath, name: &str, value: &str) -> StoreResult<()>;

    /// Remove one variable. Absent names are not an error.
    fn unset(&mut self, dir: &CanonicalPath, name: &str) -> StoreResult<()>;

    /// Remove the whole record.
    fn delete(&mut self, dir: &CanonicalPath) -> StoreResult<()>;

    /// Swap the record's variable set for `vars` in one step. Either every
    /// entry is applied or none is.
    fn replace(&mut self, dir: &CanonicalPath, vars: &EnvVars) -> StoreResult<()>;

    /// Every stored record, sorted by identity.
    fn directories(&self) -> StoreResult<Vec<DirectorySummary>>;
}

/// A name must survive a trip through a `.env` line: non-empty, no delimiter,
/// no line breaks, no surrounding whitespace and not read as a comment.
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name.contains([KEY_DELIMITER, '\n', '\r'])
        || name.trim() != name
        || name.starts_with('#')
        || name.starts_with("export ")
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// SQLite-backed store, one row per variable.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        ensure_parent_dirs(path)?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_READ_WRITE,
        )?;
        let store = Self::prepare(conn)?;
        info!(path = %path.display(), "opened variable store");
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> StoreResult<Self> {
        configure_pragmas(&conn)?;
        check_integrity(&conn)?;
        install_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Close the connection, reporting any error the engine raises on shutdown.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| StoreError::from(err))
    }
}

impl EnvStore for SqliteStore {
    fn get(&self, dir: &CanonicalPath) -> StoreResult<EnvVars> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, value FROM env_vars WHERE directory = ?1")?;
        let rows = stmt.query_map(params![dir.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut vars = EnvVars::new();
        for row in rows {
            let (name, value) = row?;
            vars.insert(name, value);
        }
        Ok(vars)
    }

    fn set(&mut self, dir: &CanonicalPath, name: &str, value: &str) -> StoreResult<()> {
        validate_name(name)?;
        self.conn.execute(
            "INSERT INTO env_vars (directory, name, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (directory, name) DO UPDATE SET value = excluded.value",
            params![dir.as_str(), name, value],
        )?;
        debug!(directory = %dir, name, "stored variable");
        Ok(())
    }

    fn unset(&mut self, dir: &CanonicalPath, name: &str) -> StoreResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM env_vars WHERE directory = ?1 AND name = ?2",
            params![dir.as_str(), name],
        )?;
        debug!(directory = %dir, name, removed = rows > 0, "unset variable");
        Ok(())
    }

    fn delete(&mut self, dir: &CanonicalPath) -> StoreResult<()> {
        let rows = self.conn.execute(
            "DELETE FROM env_vars WHERE directory = ?1",
            params![dir.as_str()],
        )?;
        debug!(directory = %dir, removed = rows, "deleted record");
        Ok(())
    }

    fn replace(&mut self, dir: &CanonicalPath, vars: &EnvVars) -> StoreResult<()> {
        for name in vars.keys() {
            validate_name(name)?;
        }
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM env_vars WHERE directory = ?1",
            params![dir.as_str()],
        )?;
        {
            let mut insert = tx.prepare_cached(
                "INSERT INTO env_vars (directory, name, value) VALUES (?1, ?2, ?3)",
            )?;
            for (name, value) in vars {
                insert.execute(params![dir.as_str(), name, value])?;
            }
        }
        tx.commit()?;
        debug!(directory = %dir, count = vars.len(), "replaced record");
        Ok(())
    }

    fn directories(&self) -> StoreResult<Vec<DirectorySummary>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT directory, COUNT(*) FROM env_vars GROUP BY directory ORDER BY directory",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DirectorySummary {
                directory: CanonicalPath::from_stored(row.get(0)?),
                variables: row.get::<_, i64>(1)? as usize,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// In-process store used where no database is wanted.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<CanonicalPath, EnvVars>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvStore for MemoryStore {
    fn get(&self, dir: &CanonicalPath) -> StoreResult<EnvVars> {
        Ok(self.records.get(dir).cloned().unwrap_or_default())
    }

    fn set(&mut self, dir: &CanonicalPath, name: &str, value: &str) -> StoreResult<()> {
        validate_name(name)?;
        self.records
            .entry(dir.clone())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&mut self, dir: &CanonicalPath, name: &str) -> StoreResult<()> {
        if let Some(vars) = self.records.get_mut(dir) {
            vars.remove(name);
            if vars.is_empty() {
                self.records.remove(dir);
            }
        }
        Ok(())
    }

    fn delete(&mut self, dir: &CanonicalPath) -> StoreResult<()> {
        self.records.remove(dir);
        Ok(())
    }

    fn replace(&mut self, dir: &CanonicalPath, vars: &EnvVars) -> StoreResult<()> {
        for name in vars.keys() {
            validate_name(name)?;
        }
        if vars.is_empty() {
            self.records.remove(dir);
        } else {
            self.records.insert(dir.clone(), vars.clone());
        }
        Ok(())
    }

    fn directories(&self) -> StoreResult<Vec<DirectorySummary>> {
        Ok(self
            .records
            .iter()
            .map(|(directory, vars)| DirectorySummary {
                directory: directory.clone(),
                variables: vars.len(),
            })
            .collect())
    }
}

fn ensure_parent_dirs(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Unavailable::Location {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn configure_pragmas(conn: &Connection) -> StoreResult<()> {
    conn.pragma_update(Some(DatabaseName::Main), "journal_mode", "WAL")?;
    conn.pragma_update(Some(DatabaseName::Main), "synchronous", "NORMAL")?;
    Ok(())
}

fn check_integrity(conn: &Connection) -> StoreResult<()> {
    let verdict: Option<String> = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .optional()?;
    match verdict.as_deref() {
        Some("ok") | None => Ok(()),
        Some(problem) => Err(Unavailable::Corrupted(problem.to_string()).into()),
    }
}

fn install_schema(conn: &Connection) -> StoreResult<()> {
    const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS env_vars (
  directory TEXT NOT NULL,
  name      TEXT NOT NULL,
  value     TEXT NOT NULL,
  PRIMARY KEY (directory, name)
) WITHOUT ROWID;
"#;

    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    fn dir(identity: &str) -> CanonicalPath {
        CanonicalPath::from_stored(identity.to_string())
    }

    fn backends() -> Result<Vec<Box<dyn EnvStore>>> {
        Ok(vec![
            Box::new(SqliteStore::open_in_memory()?),
            Box::new(MemoryStore::new()),
        ])
    }

    #[test]
    fn set_then_get() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            store.set(&p, "K", "V")?;
            assert_eq!(store.get(&p)?.get("K").map(String::as_str), Some("V"));
        }
        Ok(())
    }

    #[test]
    fn last_write_wins() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            store.set(&p, "K", "A")?;
            store.set(&p, "K", "B")?;
            let vars = store.get(&p)?;
            assert_eq!(vars.len(), 1);
            assert_eq!(vars["K"], "B");
        }
        Ok(())
    }

    #[test]
    fn unknown_directory_is_empty() -> Result<()> {
        for store in backends()? {
            assert!(store.get(&dir("/never/seen"))?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn unset_missing_is_noop() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            store.set(&p, "KEEP", "1")?;
            store.unset(&p, "missing")?;
            store.unset(&dir("/elsewhere"), "missing")?;
            assert_eq!(store.get(&p)?.len(), 1);
        }
        Ok(())
    }

    #[test]
    fn unsetting_last_variable_drops_record() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            store.set(&p, "ONLY", "1")?;
            store.unset(&p, "ONLY")?;
            assert!(store.directories()?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn invalid_names_rejected() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            assert!(matches!(
                store.set(&p, "", "v"),
                Err(StoreError::InvalidName(_))
            ));
            assert!(matches!(
                store.set(&p, "A=B", "v"),
                Err(StoreError::InvalidName(_))
            ));
            assert!(store.get(&p)?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn names_that_break_env_lines_rejected() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            for name in ["A\nB", "A\rB", " A", "A\t", "#A", "export A"] {
                assert!(
                    matches!(store.set(&p, name, "v"), Err(StoreError::InvalidName(_))),
                    "{name:?}"
                );
            }
            store.set(&p, "A_B.c-1", "v")?;
            assert_eq!(store.get(&p)?.len(), 1);
        }
        Ok(())
    }

    #[test]
    fn records_are_isolated_and_deletable() -> Result<()> {
        for mut store in backends()? {
            let a = dir("/work/a");
            let b = dir("/work/b");
            store.set(&a, "X", "1")?;
            store.set(&b, "X", "2")?;
            store.set(&b, "Y", "3")?;
            store.delete(&a)?;
            assert!(store.get(&a)?.is_empty());
            assert_eq!(
                store.directories()?,
                vec![DirectorySummary {
                    directory: b.clone(),
                    variables: 2,
                }]
            );
        }
        Ok(())
    }

    #[test]
    fn replace_is_all_or_nothing() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            store.set(&p, "OLD", "1")?;

            let mut bad = EnvVars::new();
            bad.insert("GOOD".into(), "1".into());
            bad.insert("BAD=NAME".into(), "2".into());
            assert!(store.replace(&p, &bad).is_err());
            assert_eq!(store.get(&p)?.keys().collect::<Vec<_>>(), vec!["OLD"]);

            let mut good = EnvVars::new();
            good.insert("NEW".into(), "with space".into());
            store.replace(&p, &good)?;
            assert_eq!(store.get(&p)?, good);
        }
        Ok(())
    }

    #[test]
    fn values_keep_arbitrary_characters() -> Result<()> {
        for mut store in backends()? {
            let p = dir("/work/app");
            let value = "line one\nline \"two\"\t=tab";
            store.set(&p, "MULTI", value)?;
            assert_eq!(store.get(&p)?["MULTI"], value);
        }
        Ok(())
    }

    #[test]
    fn data_survives_reopen() -> Result<()> {
        let tmp = TempDir::new()?;
        let db = tmp.path().join("nested/envtamer.db");
        let p = dir("/work/app");
        {
            let mut store = SqliteStore::open(&db)?;
            store.set(&p, "FOO", "bar")?;
            store.close()?;
        }
        let store = SqliteStore::open(&db)?;
        assert_eq!(store.get(&p)?["FOO"], "bar");
        Ok(())
    }

    #[test]
    fn garbage_file_fails_closed() -> Result<()> {
        let tmp = TempDir::new()?;
        let db = tmp.path().join("envtamer.db");
        fs::write(&db, vec![0x5au8; 8192])?;
        let err = SqliteStore::open(&db).err().expect("open must fail");
        assert!(matches!(err, StoreError::StorageUnavailable(_)));
        Ok(())
    }
}
