//! Embedded PostgreSQL databases for the Diesel adapter suites.
//!
//! One cluster is shared per test process. Every test receives its own
//! database cloned from a template that already carries the migrations, so
//! suites never see each other's rows. Set `SKIP_TEST_CLUSTER=1` on hosts
//! where the cluster cannot start.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use carerota::outbound::persistence::migrations::run_pending_migrations;
use carerota::outbound::persistence::{DbPool, PoolConfig};
use pg_embedded_setup_unpriv::test_support::{hash_directory, shared_cluster_handle};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Runtime and pool bound to a freshly cloned database.
pub struct PgContext {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

/// Provision a database, or `None` when the cluster is unavailable and
/// skipping was requested.
///
/// # Panics
///
/// When provisioning fails and `SKIP_TEST_CLUSTER` is not set, so broken
/// CI hosts fail loudly.
pub fn pg_context() -> Option<PgContext> {
    match PgContext::provision() {
        Ok(context) => Some(context),
        Err(reason) if skip_requested() => {
            eprintln!("SKIP-TEST-CLUSTER: {reason}");
            None
        }
        Err(reason) => {
            panic!("embedded PostgreSQL unavailable: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.")
        }
    }
}

impl PgContext {
    fn provision() -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        ensure_stable_password();
        let cluster = shared_cluster_handle().map_err(|err| format!("{err:?}"))?;
        let template = ensure_template(cluster)?;
        let database = cluster
            .temporary_database_from_template(
                format!("test_{}", Uuid::new_v4().simple()).as_str(),
                template.as_str(),
            )
            .map_err(|err| format!("clone template {template}: {err:?}"))?;

        let config = PoolConfig::new(database.url().to_string())
            .with_max_size(2)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;
        Ok(Self {
            runtime,
            pool,
            _database: database,
        })
    }
}

fn skip_requested() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .is_ok_and(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// The cluster keeps the password it was initialised with, so reruns
/// against the same data directory need the same one.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster spawns threads; the shared handle
        // serialises bootstrap.
        unsafe {
            std::env::set_var("PG_PASSWORD", "carerota_embedded_test");
        }
    }
}

/// Template name keyed on the migrations directory contents.
fn template_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    Ok(format!("carerota_template_{}", hash.get(..8).unwrap_or(&hash)))
}

fn ensure_template(cluster: &ClusterHandle) -> Result<String, String> {
    let name = template_name()?;
    let _guard = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&name);
        run_pending_migrations(&url).map_err(|err| err.to_string())?;
    }
    Ok(name)
}
