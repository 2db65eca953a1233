//! SQLite-backed [`TenantStore`].

use super::{
    CategoryCount, CategoryNode, LocationQuery, LocationStats, NewTenant, StoreError,
    TenantStore,
};
use crate::types::Location;
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    website TEXT,
    city TEXT,
    location_type TEXT NOT NULL,
    number_of_stores INTEGER,
    largest_category TEXT,
    largest_category_percent REAL,
    updated_at TEXT
);
CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    tier INTEGER NOT NULL,
    parent_id TEXT REFERENCES categories(id),
    UNIQUE (tier, name)
);
CREATE TABLE IF NOT EXISTS tenants (
    id TEXT PRIMARY KEY,
    location_id TEXT NOT NULL REFERENCES locations(id),
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT,
    category_id TEXT REFERENCES categories(id),
    is_anchor_tenant INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (location_id, name)
);
CREATE INDEX IF NOT EXISTS idx_tenants_location ON tenants(location_id);
";

const LOCATION_COLUMNS: &str = "
    l.id, l.name, l.website, l.city, l.location_type, l.number_of_stores,
    (SELECT COUNT(*) FROM tenants t WHERE t.location_id = l.id) AS tenant_count,
    l.largest_category, l.largest_category_percent";

/// Store backed by a single SQLite connection.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        Self::init(db)
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> anyhow::Result<Self> {
        db.execute_batch(SCHEMA)
            .context("failed to create schema")?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        website: row.get(2)?,
        city: row.get(3)?,
        location_type: row.get(4)?,
        number_of_stores: row.get(5)?,
        tenant_count: row.get::<_, i64>(6)? as usize,
        largest_category: row.get(7)?,
        largest_category_percent: row.get(8)?,
    })
}

#[async_trait]
impl TenantStore for SqliteStore {
    async fn find_locations(&self, query: &LocationQuery) -> Result<Vec<Location>, StoreError> {
        if query.location_types.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; query.location_types.len()].join(", ");
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM locations l
             WHERE l.website IS NOT NULL AND l.website != ''
               AND l.location_type IN ({placeholders})
               AND NOT EXISTS (SELECT 1 FROM tenants t WHERE t.location_id = l.id)
             ORDER BY l.location_type ASC,
                      l.number_of_stores IS NULL,
                      l.number_of_stores DESC,
                      l.id ASC"
        );

        let db = self.conn()?;
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(query.location_types.iter()), location_from_row)?;

        let mut locations = Vec::new();
        for row in rows {
            if locations.len() >= query.limit {
                break;
            }
            let location = row?;
            if !query.exclude_ids.contains(&location.id) {
                locations.push(location);
            }
        }
        Ok(locations)
    }

    async fn find_location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        let db = self.conn()?;
        let location = db
            .query_row(
                &format!("SELECT {LOCATION_COLUMNS} FROM locations l WHERE l.id = ?1"),
                params![id],
                location_from_row,
            )
            .optional()?;
        Ok(location)
    }

    async fn upsert_location(&self, location: &Location) -> Result<(), StoreError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO locations (id, name, website, city, location_type, number_of_stores)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                website = excluded.website,
                city = excluded.city,
                location_type = excluded.location_type,
                number_of_stores = excluded.number_of_stores",
            params![
                location.id,
                location.name,
                location.website,
                location.city,
                location.location_type,
                location.number_of_stores,
            ],
        )?;
        Ok(())
    }

    async fn delete_tenants(&self, location_id: &str) -> Result<usize, StoreError> {
        let db = self.conn()?;
        let removed = db.execute(
            "DELETE FROM tenants WHERE location_id = ?1",
            params![location_id],
        )?;
        Ok(removed)
    }

    async fn create_tenant(&self, tenant: &NewTenant) -> Result<(), StoreError> {
        let db = self.conn()?;
        let inserted = db.execute(
            "INSERT INTO tenants
                (id, location_id, name, category, subcategory, category_id, is_anchor_tenant)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uuid::Uuid::new_v4().to_string(),
                tenant.location_id,
                tenant.name,
                tenant.category,
                tenant.subcategory,
                tenant.category_id,
                tenant.is_anchor_tenant,
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                Err(StoreError::Duplicate {
                    location_id: tenant.location_id.clone(),
                    name: tenant.name.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn category_counts(&self, location_id: &str) -> Result<Vec<CategoryCount>, StoreError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT category, COUNT(*) FROM tenants
             WHERE location_id = ?1
             GROUP BY category
             ORDER BY COUNT(*) DESC, category ASC",
        )?;
        let counts = stmt
            .query_map(params![location_id], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    async fn update_location_stats(&self, stats: &LocationStats) -> Result<(), StoreError> {
        let db = self.conn()?;
        let updated = db.execute(
            "UPDATE locations SET
                number_of_stores = ?2,
                largest_category = COALESCE(?3, largest_category),
                largest_category_percent = COALESCE(?4, largest_category_percent),
                updated_at = ?5
             WHERE id = ?1",
            params![
                stats.location_id,
                stats.tenant_count as i64,
                stats.largest_category,
                stats.largest_category_percent,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(stats.location_id.clone()));
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryNode>, StoreError> {
        let db = self.conn()?;
        let mut stmt =
            db.prepare("SELECT id, name, tier, parent_id FROM categories ORDER BY tier, name")?;
        let nodes = stmt
            .query_map([], |row| {
                Ok(CategoryNode {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    tier: row.get(2)?,
                    parent_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    async fn upsert_category(
        &self,
        tier: u8,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StoreError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO categories (id, name, tier, parent_id) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(tier, name) DO UPDATE SET parent_id = excluded.parent_id",
            params![uuid::Uuid::new_v4().to_string(), name, tier, parent_id],
        )?;
        let id = db.query_row(
            "SELECT id FROM categories WHERE tier = ?1 AND name = ?2",
            params![tier, name],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}
