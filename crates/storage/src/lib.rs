use std::sync::Arc;

use anyhow::{Context, Result};
use civic_core::tracker::normalize_application_id;
use civic_core::{ApplicationStatus, Category, Program, StatusBook, StatusStage};
use parking_lot::RwLock;
use sqlx::{Row, SqlitePool};

pub trait CatalogRepository: Send + Sync {
    async fn list_programs(&self) -> Result<Vec<Program>>;
    async fn upsert_program(&self, program: Program) -> Result<()>;
}

pub trait StatusRepository: Send + Sync {
    async fn find_status(&self, id: &str) -> Result<Option<ApplicationStatus>>;
    async fn upsert_status(&self, status: ApplicationStatus) -> Result<()>;
}

/// In-process store. Programs keep insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    programs: Arc<RwLock<Vec<Program>>>,
    statuses: Arc<RwLock<StatusBook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogRepository for MemoryStore {
    async fn list_programs(&self) -> Result<Vec<Program>> {
        Ok(self.programs.read().clone())
    }

    async fn upsert_program(&self, program: Program) -> Result<()> {
        let mut programs = self.programs.write();
        match programs.iter_mut().find(|existing| existing.id == program.id) {
            Some(existing) => *existing = program,
            None => programs.push(program),
        }
        Ok(())
    }
}

impl StatusRepository for MemoryStore {
    async fn find_status(&self, id: &str) -> Result<Option<ApplicationStatus>> {
        Ok(self.statuses.read().get(id).cloned())
    }

    async fn upsert_status(&self, status: ApplicationStatus) -> Result<()> {
        self.statuses.write().insert(status);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS programs (
              position INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              name TEXT NOT NULL,
              description TEXT NOT NULL,
              category TEXT NOT NULL,
              jurisdiction TEXT NOT NULL,
              age_min INTEGER NOT NULL,
              age_max INTEGER NOT NULL,
              income_max INTEGER NOT NULL,
              required_documents_json TEXT NOT NULL,
              deadline TEXT NOT NULL,
              benefits TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS application_statuses (
              id TEXT PRIMARY KEY,
              program TEXT NOT NULL,
              status TEXT NOT NULL,
              submitted_date TEXT NOT NULL,
              expected_days INTEGER NOT NULL,
              current_stage TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl CatalogRepository for SqliteStore {
    async fn list_programs(&self) -> Result<Vec<Program>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, category, jurisdiction, age_min, age_max,
                   income_max, required_documents_json, deadline, benefits
            FROM programs
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.get("id");
                let category: String = row.get("category");
                let category = Category::parse(&category)
                    .with_context(|| format!("program {id} has unknown category {category}"))?;
                let documents: String = row.get("required_documents_json");

                Ok(Program {
                    name: row.get("name"),
                    description: row.get("description"),
                    category,
                    jurisdiction: row.get("jurisdiction"),
                    age_min: u32::try_from(row.get::<i64, _>("age_min"))?,
                    age_max: u32::try_from(row.get::<i64, _>("age_max"))?,
                    income_max: u64::try_from(row.get::<i64, _>("income_max"))?,
                    required_documents: serde_json::from_str(&documents)
                        .with_context(|| format!("program {id} has malformed documents"))?,
                    deadline: row.get("deadline"),
                    benefits: row.get("benefits"),
                    id,
                })
            })
            .collect()
    }

    async fn upsert_program(&self, program: Program) -> Result<()> {
        let documents = serde_json::to_string(&program.required_documents)?;
        let income_max = i64::try_from(program.income_max)
            .with_context(|| format!("program {} income ceiling too large", program.id))?;

        sqlx::query(
            r#"
            INSERT INTO programs (id, name, description, category, jurisdiction, age_min,
                                  age_max, income_max, required_documents_json, deadline, benefits)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
              name=excluded.name,
              description=excluded.description,
              category=excluded.category,
              jurisdiction=excluded.jurisdiction,
              age_min=excluded.age_min,
              age_max=excluded.age_max,
              income_max=excluded.income_max,
              required_documents_json=excluded.required_documents_json,
              deadline=excluded.deadline,
              benefits=excluded.benefits
            "#,
        )
        .bind(&program.id)
        .bind(&program.name)
        .bind(&program.description)
        .bind(program.category.label())
        .bind(&program.jurisdiction)
        .bind(i64::from(program.age_min))
        .bind(i64::from(program.age_max))
        .bind(income_max)
        .bind(documents)
        .bind(&program.deadline)
        .bind(&program.benefits)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl StatusRepository for SqliteStore {
    async fn find_status(&self, id: &str) -> Result<Option<ApplicationStatus>> {
        let row = sqlx::query(
            r#"
            SELECT id, program, status, submitted_date, expected_days, current_stage
            FROM application_statuses
            WHERE id = ?1
            "#,
        )
        .bind(normalize_application_id(id))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stage: String = row.get("status");
        let status = StatusStage::parse(&stage)
            .with_context(|| format!("unknown application status {stage}"))?;

        Ok(Some(ApplicationStatus {
            id: row.get("id"),
            program: row.get("program"),
            status,
            submitted_date: row.get("submitted_date"),
            expected_days: u32::try_from(row.get::<i64, _>("expected_days"))?,
            current_stage: row.get("current_stage"),
        }))
    }

    async fn upsert_status(&self, status: ApplicationStatus) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO application_statuses (id, program, status, submitted_date, expected_days, current_stage)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
              program=excluded.program,
              status=excluded.status,
              submitted_date=excluded.submitted_date,
              expected_days=excluded.expected_days,
              current_stage=excluded.current_stage
            "#,
        )
        .bind(normalize_application_id(&status.id))
        .bind(&status.program)
        .bind(status.status.as_str())
        .bind(&status.submitted_date)
        .bind(i64::from(status.expected_days))
        .bind(&status.current_stage)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    /// Loads programs and statuses into the store. Existing ids are
    /// overwritten; programs keep their first position.
    pub async fn seed(
        &self,
        programs: impl IntoIterator<Item = Program>,
        statuses: impl IntoIterator<Item = ApplicationStatus>,
    ) -> Result<()> {
        for program in programs {
            self.upsert_program(program).await?;
        }
        for status in statuses {
            self.upsert_status(status).await?;
        }
        Ok(())
    }
}

impl CatalogRepository for Store {
    async fn list_programs(&self) -> Result<Vec<Program>> {
        match self {
            Store::Memory(store) => store.list_programs().await,
            Store::Sqlite(store) => store.list_programs().await,
        }
    }

    async fn upsert_program(&self, program: Program) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_program(program).await,
            Store::Sqlite(store) => store.upsert_program(program).await,
        }
    }
}

impl StatusRepository for Store {
    async fn find_status(&self, id: &str) -> Result<Option<ApplicationStatus>> {
        match self {
            Store::Memory(store) => store.find_status(id).await,
            Store::Sqlite(store) => store.find_status(id).await,
        }
    }

    async fn upsert_status(&self, status: ApplicationStatus) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_status(status).await,
            Store::Sqlite(store) => store.upsert_status(status).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::ALL_INDIA;

    fn program(id: &str, income_max: u64) -> Program {
        Program {
            id: id.to_string(),
            name: format!("Program {id}"),
            description: "desc".to_string(),
            category: Category::SocialWelfare,
            jurisdiction: ALL_INDIA.to_string(),
            age_min: 60,
            age_max: 100,
            income_max,
            required_documents: vec!["Age Proof".to_string(), "BPL Card".to_string()],
            deadline: "Open all year".to_string(),
            benefits: "pension".to_string(),
        }
    }

    fn status(id: &str) -> ApplicationStatus {
        ApplicationStatus {
            id: id.to_string(),
            program: "Program a".to_string(),
            status: StatusStage::UnderVerification,
            submitted_date: "2026-02-20".to_string(),
            expected_days: 7,
            current_stage: "Eligibility Verification".to_string(),
        }
    }

    async fn exercise(store: Store) {
        store
            .seed(
                vec![program("a", 100_000), program("b", 200_000)],
                vec![status("civ1")],
            )
            .await
            .unwrap();
        store.upsert_program(program("a", 150_000)).await.unwrap();

        let programs = store.list_programs().await.unwrap();
        let ids = programs.iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(programs[0].income_max, 150_000);
        assert_eq!(programs[0].category, Category::SocialWelfare);
        assert_eq!(programs[0].required_documents.len(), 2);

        let found = store.find_status("CIV1").await.unwrap().unwrap();
        assert_eq!(found.current_stage, "Eligibility Verification");
        assert!(store.find_status("CIV404").await.unwrap().is_none());

        store
            .upsert_status(ApplicationStatus {
                current_stage: "Field Inspection".to_string(),
                ..status("CIV1")
            })
            .await
            .unwrap();
        let updated = store.find_status(" civ1 ").await.unwrap().unwrap();
        assert_eq!(updated.current_stage, "Field Inspection");
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        exercise(Store::memory()).await;
    }

    #[tokio::test]
    async fn sqlite_store_round_trip() {
        exercise(Store::sqlite("sqlite::memory:").await.unwrap()).await;
    }
}
