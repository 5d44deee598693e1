use super::ProjectStore;
use crate::error::ScheduleResult;
use crate::project::{AssemblyOutcome, NewProject, ProjectRecord};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> ScheduleResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> ScheduleResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> ScheduleResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                owner_id TEXT,
                created_at TEXT NOT NULL,
                record_json TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS projects_owner ON projects (owner_id);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn decode_rows(json_rows: Vec<String>) -> ScheduleResult<Vec<ProjectRecord>> {
        let mut records = Vec::with_capacity(json_rows.len());
        for json in json_rows {
            records.push(serde_json::from_str(&json)?);
        }
        Ok(records)
    }
}

impl ProjectStore for SqliteProjectStore {
    fn create(
        &self,
        project: NewProject,
        document: AssemblyOutcome,
    ) -> ScheduleResult<ProjectRecord> {
        let record = ProjectRecord::new(project, document);
        let json = serde_json::to_string(&record)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO projects (id, owner_id, created_at, record_json) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                record.owner_id,
                record.created_at.to_string(),
                json
            ],
        )?;
        Ok(record)
    }

    fn get(&self, id: &Uuid) -> ScheduleResult<Option<ProjectRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT record_json FROM projects WHERE id = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![id.to_string()], |row| row.get(0))
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> ScheduleResult<Vec<ProjectRecord>> {
        let conn = self.connection.lock();
        let mut stmt =
            conn.prepare("SELECT record_json FROM projects ORDER BY created_at ASC, rowid ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut json_rows = Vec::new();
        for json in rows {
            json_rows.push(json?);
        }
        Self::decode_rows(json_rows)
    }

    fn list_by_owner(&self, owner_id: &str) -> ScheduleResult<Vec<ProjectRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT record_json FROM projects WHERE owner_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![owner_id], |row| row.get::<_, String>(0))?;
        let mut json_rows = Vec::new();
        for json in rows {
            json_rows.push(json?);
        }
        Self::decode_rows(json_rows)
    }
}
