use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use sqlx::SqlitePool;
use synthload_pipeline::SurrogateId;
use tracing::info;

use crate::store::{StoreError, connect, runtime};

const SERVICE_COLUMNS: [&str; 2] = ["service_name", "count"];
const STORED_SERVICE_IDS: &str =
    "SELECT service_id FROM customer_device_service WHERE service_id IS NOT NULL ORDER BY rowid";
const SERVICE_NAME_QUERY: &str = "SELECT service_name FROM service WHERE id = ?";

/// Stored activations for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service_name: String,
    pub count: u64,
}

/// Service counts in first-seen order, plus name lookup statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCountReport {
    pub services: Vec<ServiceCount>,
    pub activations: u64,
    pub name_queries: u64,
    pub cache_hits: u64,
}

/// Service id to name, queried once per id.
struct ServiceNames<'a> {
    pool: &'a SqlitePool,
    cache: HashMap<SurrogateId, String>,
    queries: u64,
    hits: u64,
}

impl<'a> ServiceNames<'a> {
    fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            cache: HashMap::new(),
            queries: 0,
            hits: 0,
        }
    }

    async fn name(&mut self, service_id: SurrogateId) -> Result<String, StoreError> {
        if let Some(name) = self.cache.get(&service_id) {
            self.hits += 1;
            return Ok(name.clone());
        }
        self.queries += 1;
        let name = sqlx::query_scalar::<_, String>(SERVICE_NAME_QUERY)
            .bind(service_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StoreError::UnknownService(service_id))?;
        self.cache.insert(service_id, name.clone());
        Ok(name)
    }
}

/// Count stored activations per service name.
pub fn service_counts(path: &Path) -> Result<ServiceCountReport, StoreError> {
    let runtime = runtime()?;
    runtime.block_on(async {
        let pool = connect(path, true).await?;
        let service_ids = sqlx::query_scalar::<_, i64>(STORED_SERVICE_IDS)
            .fetch_all(&pool)
            .await?;

        let mut names = ServiceNames::new(&pool);
        let mut report = ServiceCountReport::default();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for service_id in service_ids {
            let name = names.name(service_id).await?;
            let slot = *slots.entry(name.clone()).or_insert_with(|| {
                report.services.push(ServiceCount {
                    service_name: name,
                    count: 0,
                });
                report.services.len() - 1
            });
            report.services[slot].count += 1;
            report.activations += 1;
        }
        report.name_queries = names.queries;
        report.cache_hits = names.hits;
        pool.close().await;

        info!(
            event = "services_counted",
            activations = report.activations,
            services = report.services.len(),
            name_queries = report.name_queries,
            cache_hits = report.cache_hits
        );
        Ok::<_, StoreError>(report)
    })
}

/// `service_name,count` CSV; the header is present even with no rows.
pub fn service_counts_csv(services: &[ServiceCount]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(SERVICE_COLUMNS)?;
    for service in services {
        writer.serialize(service)?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use synthload_pipeline::{LoadRecord, ReferenceStore, RowSink, parse_timestamp};

    use super::*;
    use crate::store::{ActivationTableSink, SqliteReferenceStore, prepare_database};
    use crate::survey::ReferenceSeed;

    fn prepared_db(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("synthload_extract_{label}_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("reference.db");
        let seed = ReferenceSeed {
            customers: vec!["Jones".to_string()],
            device_types: vec!["mobile".to_string()],
            customer_devices: vec![(
                "Jones".to_string(),
                "phone".to_string(),
                "mobile".to_string(),
            )],
            services: vec!["voice".to_string(), "data".to_string(), "fax".to_string()],
        };
        prepare_database(&path, &seed).expect("prepare");
        path
    }

    fn store_activations(path: &Path, services: &[&str]) {
        let store = SqliteReferenceStore::open(path).expect("open");
        let device = store
            .resolve_customer_device("Jones", "phone")
            .expect("query")
            .expect("device");
        let mut sink = ActivationTableSink::open(path).expect("sink");
        for service in services {
            sink.save(&LoadRecord {
                customer_device_id: device,
                service_id: store.resolve_service(service).expect("query").expect("service"),
                start_date: parse_timestamp("2022-07-10T11:12:13+00:00").expect("date"),
                latitude: 1.5,
                longitude: 2.5,
            })
            .expect("save");
        }
        sink.flush().expect("flush");
    }

    #[test]
    fn counts_services_in_first_seen_order() {
        let path = prepared_db("order");
        store_activations(&path, &["data", "voice", "data", "data", "voice"]);

        let report = service_counts(&path).expect("counts");
        assert_eq!(
            report.services,
            vec![
                ServiceCount {
                    service_name: "data".to_string(),
                    count: 3
                },
                ServiceCount {
                    service_name: "voice".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(report.activations, 5);
    }

    #[test]
    fn each_service_name_is_queried_once() {
        let path = prepared_db("memo");
        store_activations(&path, &["voice", "voice", "fax", "voice", "fax", "voice"]);

        let report = service_counts(&path).expect("counts");
        assert_eq!(report.name_queries, 2);
        assert_eq!(report.cache_hits, 4);
    }

    #[test]
    fn empty_table_yields_header_only() {
        let path = prepared_db("empty");
        let report = service_counts(&path).expect("counts");
        assert!(report.services.is_empty());

        let bytes = service_counts_csv(&report.services).expect("csv");
        assert_eq!(String::from_utf8(bytes).expect("utf8"), "service_name,count\n");
    }

    #[test]
    fn csv_lists_counts() {
        let bytes = service_counts_csv(&[ServiceCount {
            service_name: "voice".to_string(),
            count: 4,
        }])
        .expect("csv");
        assert_eq!(
            String::from_utf8(bytes).expect("utf8"),
            "service_name,count\nvoice,4\n"
        );
    }
}
