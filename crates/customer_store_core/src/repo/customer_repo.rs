//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide save/query/delete APIs over the `customers` collection.
//! - Stamp creation and modification metadata on every write.
//!
//! # Invariants
//! - Inserts start at `version = 0`; each update adds exactly one.
//! - Updates are conditional on the caller's version (optimistic locking);
//!   a record with an identity but no audit stamp is rejected, never applied.
//! - `created_by`/`created_at` are written once, on insert.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::customer::{AuditStamp, Customer, CustomerId, CustomerProbe};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    created_by,
    created_at,
    last_modified_by,
    last_modified_at,
    version
FROM customers";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "first_name",
    "last_name",
    "created_by",
    "created_at",
    "last_modified_by",
    "last_modified_at",
    "version",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for customer persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("customer not found: {0}")]
    NotFound(CustomerId),
    #[error("customer {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        id: CustomerId,
        expected: u64,
        actual: u64,
    },
    #[error("invalid persisted customer data: {0}")]
    InvalidData(String),
    #[error("connection schema version {actual_version} does not match expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the customer collection.
pub trait CustomerRepository {
    /// Inserts a new customer or updates an existing one, stamping `auditor`.
    ///
    /// Returns the stored record with identity and audit metadata filled in.
    fn save(&self, customer: &Customer, auditor: Option<&str>) -> RepoResult<Customer>;
    fn find_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>>;
    /// All records, no ordering guarantee.
    fn find_all(&self) -> RepoResult<Vec<Customer>>;
    fn find_by_first_name(&self, first_name: &str) -> RepoResult<Vec<Customer>>;
    fn find_by_last_name(&self, last_name: &str) -> RepoResult<Vec<Customer>>;
    /// Records that were never updated since creation (`version == 0`).
    fn find_unmodified_customers(&self) -> RepoResult<Vec<Customer>>;
    /// Records matching every populated probe field exactly.
    fn find_all_by_example(&self, probe: &CustomerProbe) -> RepoResult<Vec<Customer>>;
    fn count(&self) -> RepoResult<u64>;
    fn delete(&self, id: CustomerId) -> RepoResult<()>;
    /// Removes every record and returns how many were removed.
    fn delete_all(&self) -> RepoResult<u64>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections whose schema was never bootstrapped through
    /// `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert(&self, customer: &Customer, auditor: Option<&str>) -> RepoResult<Customer> {
        let id = Uuid::new_v4();
        let audit = AuditStamp::created(auditor, now_epoch_ms());

        self.conn.execute(
            "INSERT INTO customers (
                id,
                first_name,
                last_name,
                created_by,
                created_at,
                last_modified_by,
                last_modified_at,
                version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0);",
            params![
                id.to_string(),
                customer.first_name.as_str(),
                customer.last_name.as_str(),
                audit.created_by.as_deref(),
                audit.created_at,
                audit.last_modified_by.as_deref(),
                audit.last_modified_at,
            ],
        )?;

        Ok(Customer::persisted(
            id,
            customer.first_name.clone(),
            customer.last_name.clone(),
            audit,
        ))
    }

    fn update(
        &self,
        id: CustomerId,
        customer: &Customer,
        auditor: Option<&str>,
    ) -> RepoResult<Customer> {
        let expected = customer.version().ok_or_else(|| {
            RepoError::InvalidData(format!(
                "customer {id} has an identity but no audit stamp; reload it before saving"
            ))
        })?;

        let changed = self.conn.execute(
            "UPDATE customers
             SET
                first_name = ?2,
                last_name = ?3,
                last_modified_by = ?4,
                last_modified_at = ?5,
                version = version + 1
             WHERE id = ?1
               AND version = ?6;",
            params![
                id.to_string(),
                customer.first_name.as_str(),
                customer.last_name.as_str(),
                auditor,
                now_epoch_ms(),
                version_to_db(expected)?,
            ],
        )?;

        if changed == 0 {
            return Err(match self.find_by_id(id)? {
                None => RepoError::NotFound(id),
                Some(current) => RepoError::VersionConflict {
                    id,
                    expected,
                    actual: current.version().unwrap_or_default(),
                },
            });
        }

        self.find_by_id(id)?.ok_or(RepoError::NotFound(id))
    }

    fn query(&self, probe: &CustomerProbe) -> RepoResult<Vec<Customer>> {
        let mut sql = format!("{CUSTOMER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        let mut push_text = |column: &str, value: Option<&str>| {
            if let Some(value) = value {
                sql.push_str(&format!(" AND {column} = ?"));
                bind_values.push(Value::Text(value.to_string()));
            }
        };
        push_text("id", probe.id.map(|id| id.to_string()).as_deref());
        push_text("first_name", probe.first_name.as_deref());
        push_text("last_name", probe.last_name.as_deref());
        push_text("created_by", probe.created_by.as_deref());
        push_text("last_modified_by", probe.last_modified_by.as_deref());

        if let Some(version) = probe.version {
            sql.push_str(" AND version = ?");
            bind_values.push(Value::Integer(version_to_db(version)?));
        }

        sql.push_str(" ORDER BY rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut customers = Vec::new();

        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }

        Ok(customers)
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn save(&self, customer: &Customer, auditor: Option<&str>) -> RepoResult<Customer> {
        match customer.id() {
            None => self.insert(customer, auditor),
            Some(id) => self.update(id, customer, auditor),
        }
    }

    fn find_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_customer_row(row)?));
        }

        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Customer>> {
        self.query(&CustomerProbe::default())
    }

    fn find_by_first_name(&self, first_name: &str) -> RepoResult<Vec<Customer>> {
        self.query(&CustomerProbe::new().with_first_name(first_name))
    }

    fn find_by_last_name(&self, last_name: &str) -> RepoResult<Vec<Customer>> {
        self.query(&CustomerProbe::new().with_last_name(last_name))
    }

    fn find_unmodified_customers(&self) -> RepoResult<Vec<Customer>> {
        self.query(&CustomerProbe::new().with_version(0))
    }

    fn find_all_by_example(&self, probe: &CustomerProbe) -> RepoResult<Vec<Customer>> {
        self.query(probe)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM customers;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete(&self, id: CustomerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_all(&self) -> RepoResult<u64> {
        let removed = self.conn.execute("DELETE FROM customers;", [])?;
        Ok(removed as u64)
    }
}

fn parse_customer_row(row: &Row<'_>) -> RepoResult<Customer> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in customers.id"))
    })?;

    let raw_version: i64 = row.get("version")?;
    let version = u64::try_from(raw_version).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid version value `{raw_version}` in customers.version"
        ))
    })?;

    let audit = AuditStamp {
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        last_modified_by: row.get("last_modified_by")?,
        last_modified_at: row.get("last_modified_at")?,
        version,
    };

    Ok(Customer::persisted(
        id,
        row.get("first_name")?,
        row.get("last_name")?,
        audit,
    ))
}

fn version_to_db(version: u64) -> RepoResult<i64> {
    i64::try_from(version)
        .map_err(|_| RepoError::InvalidData(format!("version `{version}` exceeds storage range")))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "customers")? {
        return Err(RepoError::MissingRequiredTable("customers"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "customers", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "customers",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
