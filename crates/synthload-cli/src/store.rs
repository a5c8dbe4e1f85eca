use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use synthload_pipeline::{
    LoadRecord, ReferenceStore, ReferenceStoreError, RowSink, SinkError, SurrogateId,
    format_timestamp,
};
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::info;

use crate::survey::ReferenceSeed;

const CREATE_TABLES: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS customer(
        id INTEGER PRIMARY KEY,
        customer_name VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS device_type(
        id INTEGER PRIMARY KEY,
        device_type_name VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS customer_device(
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customer(id),
        type_id INTEGER NOT NULL REFERENCES device_type(id),
        device_name VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS service(
        id INTEGER PRIMARY KEY,
        service_name VARCHAR(64) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS customer_device_service(
        customer_device_id INTEGER REFERENCES customer_device(id),
        service_id INTEGER REFERENCES service(id),
        start DATETIME,
        latitude REAL,
        longitude REAL
    )",
];

/// Children before parents.
const CLEAR_TABLES: [&str; 5] = [
    "DELETE FROM customer_device_service",
    "DELETE FROM customer_device",
    "DELETE FROM service",
    "DELETE FROM device_type",
    "DELETE FROM customer",
];

const CUSTOMER_QUERY: &str = "SELECT id FROM customer WHERE customer_name = ?";
const SERVICE_QUERY: &str = "SELECT id FROM service WHERE service_name = ?";
const CUSTOMER_DEVICE_QUERY: &str = "SELECT customer_device.id
    FROM customer_device
    JOIN customer ON customer.id = customer_device.customer_id
    WHERE customer_device.device_name = ? AND customer.customer_name = ?";
const INSERT_ACTIVATION: &str = "INSERT INTO customer_device_service(
        customer_device_id, service_id, start, latitude, longitude
    ) VALUES (?, ?, ?, ?, ?)";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("customer_device_service references unknown service id {0}")]
    UnknownService(SurrogateId),
}

/// Row counts written by [`prepare_database`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    pub customers: u64,
    pub device_types: u64,
    pub customer_devices: u64,
    pub services: u64,
}

pub(crate) fn runtime() -> Result<Runtime, StoreError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Single-connection pool on an existing database.
pub(crate) async fn connect(path: &Path, read_only: bool) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(read_only)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// Create the reference tables in `path` and replace their contents with
/// `seed`. The database file is created when missing.
pub fn prepare_database(path: &Path, seed: &ReferenceSeed) -> Result<PrepareSummary, StoreError> {
    let runtime = runtime()?;
    runtime.block_on(async {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for statement in CREATE_TABLES {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!(event = "tables_created", path = %path.display());

        let mut tx = pool.begin().await?;
        for statement in CLEAR_TABLES {
            let cleared = sqlx::query(statement).execute(&mut *tx).await?;
            info!(event = "rows_deleted", statement, rows = cleared.rows_affected());
        }

        let mut summary = PrepareSummary::default();
        for name in &seed.customers {
            sqlx::query("INSERT INTO customer(customer_name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            summary.customers += 1;
        }
        for name in &seed.device_types {
            sqlx::query("INSERT INTO device_type(device_type_name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            summary.device_types += 1;
        }
        for (customer, device, device_type) in &seed.customer_devices {
            let inserted = sqlx::query(
                "INSERT INTO customer_device(customer_id, type_id, device_name)
                 SELECT customer.id, device_type.id, ?
                 FROM customer, device_type
                 WHERE customer.customer_name = ? AND device_type.device_type_name = ?",
            )
            .bind(device)
            .bind(customer)
            .bind(device_type)
            .execute(&mut *tx)
            .await?;
            summary.customer_devices += inserted.rows_affected();
        }
        for name in &seed.services {
            sqlx::query("INSERT INTO service(service_name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            summary.services += 1;
        }
        tx.commit().await?;
        pool.close().await;

        info!(
            event = "reference_data_loaded",
            customers = summary.customers,
            device_types = summary.device_types,
            customer_devices = summary.customer_devices,
            services = summary.services
        );
        Ok::<_, StoreError>(summary)
    })
}

/// Reference lookups against a prepared SQLite database.
///
/// The store owns a current-thread runtime and blocks on each query, so the
/// pipeline above it stays synchronous.
pub struct SqliteReferenceStore {
    pool: SqlitePool,
    runtime: Runtime,
}

impl SqliteReferenceStore {
    /// Open an existing database read-only.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let runtime = runtime()?;
        let pool = runtime.block_on(connect(path, true))?;
        Ok(Self { pool, runtime })
    }

    fn lookup(&self, sql: &str, keys: &[&str]) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        self.runtime
            .block_on(async {
                let mut query = sqlx::query_scalar::<_, i64>(sql);
                for key in keys {
                    query = query.bind(*key);
                }
                query.fetch_optional(&self.pool).await
            })
            .map_err(|err| match err {
                sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                    ReferenceStoreError::Unavailable(err.to_string())
                }
                other => ReferenceStoreError::Query(other.to_string()),
            })
    }
}

impl ReferenceStore for SqliteReferenceStore {
    fn resolve_customer(
        &self,
        customer_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        self.lookup(CUSTOMER_QUERY, &[customer_name])
    }

    fn resolve_service(
        &self,
        service_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        self.lookup(SERVICE_QUERY, &[service_name])
    }

    fn resolve_customer_device(
        &self,
        customer_name: &str,
        device_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        self.lookup(CUSTOMER_DEVICE_QUERY, &[device_name, customer_name])
    }
}

impl Drop for SqliteReferenceStore {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

/// Row sink over the `customer_device_service` table.
///
/// Saved records are buffered and written in one transaction on flush. The
/// first flush replaces whatever activations the table held before.
pub struct ActivationTableSink {
    pool: SqlitePool,
    runtime: Runtime,
    pending: Vec<LoadRecord>,
    rows: u64,
    replaced: bool,
}

impl ActivationTableSink {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let runtime = runtime()?;
        let pool = runtime.block_on(connect(path, false))?;
        Ok(Self {
            pool,
            runtime,
            pending: Vec::new(),
            rows: 0,
            replaced: false,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    async fn write(
        pool: &SqlitePool,
        records: &[LoadRecord],
        replace: bool,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if replace {
            let cleared = sqlx::query("DELETE FROM customer_device_service")
                .execute(&mut *tx)
                .await?;
            info!(event = "activations_cleared", rows = cleared.rows_affected());
        }
        let mut rows = 0;
        for record in records {
            let inserted = sqlx::query(INSERT_ACTIVATION)
                .bind(record.customer_device_id)
                .bind(record.service_id)
                .bind(format_timestamp(&record.start_date))
                .bind(record.latitude)
                .bind(record.longitude)
                .execute(&mut *tx)
                .await?;
            rows += inserted.rows_affected();
        }
        tx.commit().await?;
        Ok(rows)
    }
}

impl RowSink for ActivationTableSink {
    fn save(&mut self, record: &LoadRecord) -> Result<(), SinkError> {
        self.pending.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        let written = self
            .runtime
            .block_on(Self::write(&self.pool, &self.pending, !self.replaced))
            .map_err(|err| SinkError::Backend(err.to_string()))?;
        self.replaced = true;
        self.pending.clear();
        self.rows += written;
        info!(event = "activations_stored", rows = written);
        Ok(())
    }
}

impl Drop for ActivationTableSink {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}
