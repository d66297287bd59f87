//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared across the whole test run; each test
//! gets its own database inside it (created + migrated on setup), so tests
//! can run in parallel and still make exact-count assertions.

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use server_core::domains::auth::JwtService;
use server_core::domains::identity::models::User;
use server_core::kernel::BaseAI;
use server_core::server::build_app;

use super::TestClient;

const TEST_JWT_SECRET: &str = "test_secret";
const TEST_JWT_ISSUER: &str = "test_issuer";

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    host: String,
    port: u16,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG; try_init avoids panicking if already set up
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?.to_string();
        let port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            host,
            port,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgresql://postgres:postgres@{}:{}/{}",
            self.host, self.port, database
        )
    }
}

/// Per-test context: an isolated, migrated database plus the JWT service
/// the app is built with.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        // Database pool is automatically dropped
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        // Fresh database per test
        let db_name = format!("test_{}", Uuid::new_v4().simple());
        let admin_pool = PgPool::connect(&infra.url_for("postgres"))
            .await
            .context("Failed to connect to admin database")?;
        // CREATE DATABASE cannot go through the prepared-statement path
        sqlx::raw_sql(&format!(r#"CREATE DATABASE "{}""#, db_name))
            .execute(&admin_pool)
            .await
            .context("Failed to create test database")?;
        admin_pool.close().await;

        let db_pool = PgPool::connect(&infra.url_for(&db_name))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_pool,
            jwt_service: Arc::new(JwtService::new(
                TEST_JWT_SECRET,
                TEST_JWT_ISSUER.to_string(),
            )),
        })
    }

    /// The real router, without a classifier and without rate limiting.
    pub fn app(&self) -> Router {
        build_app(self.db_pool.clone(), self.jwt_service.clone(), None, false)
    }

    /// The real router with a scripted classifier.
    pub fn app_with_ai(&self, ai: Arc<dyn BaseAI>) -> Router {
        build_app(
            self.db_pool.clone(),
            self.jwt_service.clone(),
            Some(ai),
            false,
        )
    }

    /// HTTP client driving the router in-process.
    pub fn client(&self) -> TestClient {
        TestClient::new(self.app())
    }

    /// Mint a bearer token for a fixture user.
    pub fn token_for(&self, user: &User) -> String {
        self.jwt_service
            .create_token(user.id.into_uuid(), &user.role)
            .expect("Failed to mint test token")
    }
}
