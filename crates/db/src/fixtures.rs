use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_PRODUCT_IDS: &[&str] = &[
    "prod-earbuds-001",
    "prod-band-001",
    "prod-speaker-001",
    "prod-charger-001",
    "prod-keyboard-001",
    "prod-mouse-001",
];

const SEED_USER_ID: &str = "demo-user-001";

const SEED_ORDER_IDS: &[&str] = &["order-demo-001", "order-demo-002"];

/// Deterministic demo fixtures: a small ranked catalog, one returning-user
/// profile, and a short purchase history for that user.
pub struct DemoSeedDataset;

/// Outcome of one seed verification check, named so failures can be
/// reported individually by the CLI.
#[derive(Debug)]
pub struct SeedCheck {
    pub name: &'static str,
    pub passed: bool,
}

#[derive(Debug)]
pub struct SeedVerification {
    pub checks: Vec<SeedCheck>,
}

impl SeedVerification {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Loads the demo dataset inside a single transaction. Inserts ignore
    /// existing rows, so reseeding an already seeded database is a no-op.
    pub async fn load(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Checks that the seeded rows exist and match the fixture contract.
    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, RepositoryError> {
        let mut checks = Vec::new();

        let product_count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM products")
            .fetch_one(pool)
            .await?;
        checks.push(SeedCheck {
            name: "catalog-product-count",
            passed: product_count == SEED_PRODUCT_IDS.len() as i64,
        });

        let top_ranked: Option<String> = sqlx::query_scalar(
            "SELECT id FROM products ORDER BY ai_score DESC, rowid ASC LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        checks.push(SeedCheck {
            name: "catalog-top-ranked",
            passed: top_ranked.as_deref() == Some("prod-earbuds-001"),
        });

        let profile_exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE user_id = ?)",
        )
        .bind(SEED_USER_ID)
        .fetch_one(pool)
        .await?;
        checks.push(SeedCheck { name: "demo-profile", passed: profile_exists == 1 });

        for order_id in SEED_ORDER_IDS {
            let item_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM order_items WHERE order_id = ?",
            )
            .bind(order_id)
            .fetch_one(pool)
            .await?;
            checks.push(SeedCheck {
                name: if *order_id == "order-demo-001" {
                    "order-demo-001-items"
                } else {
                    "order-demo-002-items"
                },
                passed: item_count > 0,
            });
        }

        Ok(SeedVerification { checks })
    }
}
