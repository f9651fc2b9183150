use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use shopguide_core::domain::order::OrderSummary;
use shopguide_core::domain::product::Product;
use shopguide_core::domain::profile::{UserId, UserProfile};

use super::{CatalogRepository, OrderRepository, ProfileRepository, RepositoryError};

fn injected_failure(what: &str) -> RepositoryError {
    RepositoryError::Decode(format!("injected {what} failure"))
}

/// Catalog double backed by a plain Vec so insertion order is observable
/// in tie-break assertions.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    products: RwLock<Vec<Product>>,
    failing: AtomicBool,
}

impl InMemoryCatalogRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products), failing: AtomicBool::new(false) }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn insert(&self, product: Product) {
        self.products.write().await.push(product);
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_by_ai_score(&self) -> Result<Vec<Product>, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure("catalog read"));
        }
        let mut products = self.products.read().await.clone();
        products.sort_by(|a, b| b.ai_score.cmp(&a.ai_score));
        Ok(products)
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, UserProfile>>,
    failing_reads: AtomicBool,
    failing_writes: AtomicBool,
}

impl InMemoryProfileRepository {
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.user_id.0.clone(), profile);
    }
}

#[async_trait::async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(injected_failure("profile read"));
        }
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&user_id.0).cloned())
    }

    async fn upsert_tags(
        &self,
        user_id: &UserId,
        tags: &[String],
    ) -> Result<(), RepositoryError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(injected_failure("profile write"));
        }
        let mut profiles = self.profiles.write().await;
        profiles.insert(
            user_id.0.clone(),
            UserProfile { user_id: user_id.clone(), tags: tags.to_vec() },
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Vec<OrderSummary>>>,
    failing: AtomicBool,
}

impl InMemoryOrderRepository {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn insert(&self, user_id: &UserId, order: OrderSummary) {
        self.orders.write().await.entry(user_id.0.clone()).or_default().push(order);
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(injected_failure("order read"));
        }
        let orders = self.orders.read().await;
        let mut recent = orders.get(&user_id.0).cloned().unwrap_or_default();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit as usize);
        Ok(recent)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use shopguide_core::domain::order::{OrderItemSummary, OrderSummary};
    use shopguide_core::domain::product::{Product, ProductId};
    use shopguide_core::domain::profile::{UserId, UserProfile};

    use crate::repositories::{
        CatalogRepository, InMemoryCatalogRepository, InMemoryOrderRepository,
        InMemoryProfileRepository, OrderRepository, ProfileRepository,
    };

    fn product(id: &str, ai_score: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("商品{id}"),
            price: Decimal::new(9900, 2),
            category: "数码".to_string(),
            description: "测试商品".to_string(),
            ai_score,
            stock: 10,
            image_url: None,
            rating: 4.5,
            sales_count: 100,
        }
    }

    #[tokio::test]
    async fn catalog_orders_by_ai_score_with_stable_ties() {
        let repo = InMemoryCatalogRepository::with_products(vec![
            product("p1", 80),
            product("p2", 95),
            product("p3", 80),
        ]);

        let listed = repo.list_by_ai_score().await.expect("list catalog");
        let ids: Vec<&str> = listed.iter().map(|p| p.id.0.as_str()).collect();

        assert_eq!(ids, vec!["p2", "p1", "p3"]);
    }

    #[tokio::test]
    async fn profile_upsert_replaces_whole_tag_set() {
        let repo = InMemoryProfileRepository::default();
        let user = UserId("u1".to_string());

        repo.insert(UserProfile {
            user_id: user.clone(),
            tags: vec!["新用户".to_string()],
        })
        .await;
        repo.upsert_tags(&user, &["新用户".to_string(), "母婴".to_string()])
            .await
            .expect("upsert tags");

        let found = repo.find(&user).await.expect("find profile").expect("profile exists");
        assert_eq!(found.tags, vec!["新用户", "母婴"]);
    }

    #[tokio::test]
    async fn orders_limit_keeps_most_recent() {
        let repo = InMemoryOrderRepository::default();
        let user = UserId("u1".to_string());
        let now = Utc::now();

        for age_days in [5, 1, 3] {
            repo.insert(
                &user,
                OrderSummary {
                    order_id: format!("o-{age_days}"),
                    created_at: now - Duration::days(age_days),
                    items: vec![OrderItemSummary {
                        product_name: "蓝牙耳机".to_string(),
                        category: "数码".to_string(),
                    }],
                },
            )
            .await;
        }

        let recent = repo.list_recent(&user, 2).await.expect("list orders");
        let ids: Vec<&str> = recent.iter().map(|o| o.order_id.as_str()).collect();

        assert_eq!(ids, vec!["o-1", "o-3"]);
    }

    #[tokio::test]
    async fn failure_injection_surfaces_errors() {
        let catalog = InMemoryCatalogRepository::default();
        catalog.set_failing(true);
        assert!(catalog.list_by_ai_score().await.is_err());

        let profiles = InMemoryProfileRepository::default();
        profiles.set_failing_writes(true);
        assert!(profiles
            .upsert_tags(&UserId("u1".to_string()), &["新用户".to_string()])
            .await
            .is_err());
    }
}
