use std::sync::Arc;

use tracing::{info, warn};

use shopguide_core::domain::chat::{ChatMessage, GuideTurn, Role};
use shopguide_core::domain::order::OrderSummary;
use shopguide_core::domain::product::Product;
use shopguide_core::domain::profile::{UserId, UserProfile};
use shopguide_core::extraction::{MarkerExtractor, RecommendationParser};
use shopguide_core::prompt::build_system_prompt;
use shopguide_core::tagging::TagRules;
use shopguide_core::GuideError;
use shopguide_db::repositories::{CatalogRepository, OrderRepository, ProfileRepository};

use crate::llm::{ChatClient, ChatRequest};

/// How many of the user's most recent orders feed the prompt context.
const RECENT_ORDER_LIMIT: u32 = 5;

/// Drives one guide turn end to end: snapshot fetch, prompt assembly, model
/// call, marker extraction, and the best-effort tag write.
pub struct GuideOrchestrator {
    catalog: Arc<dyn CatalogRepository>,
    profiles: Arc<dyn ProfileRepository>,
    orders: Arc<dyn OrderRepository>,
    client: Arc<dyn ChatClient>,
    extractor: MarkerExtractor,
    tag_rules: TagRules,
}

impl GuideOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        profiles: Arc<dyn ProfileRepository>,
        orders: Arc<dyn OrderRepository>,
        client: Arc<dyn ChatClient>,
    ) -> Self {
        Self {
            catalog,
            profiles,
            orders,
            client,
            extractor: MarkerExtractor::new(),
            tag_rules: TagRules::new(),
        }
    }

    /// Runs one turn for the given transcript.
    ///
    /// Snapshot fetches degrade independently: a failed catalog, profile, or
    /// order read is logged and replaced by an empty (or default) context so
    /// the shopper still gets an answer. Only the model call itself can fail
    /// the turn. An anonymous turn (no user id) gets the default profile,
    /// no purchase history, and no tag write.
    pub async fn send_turn(
        &self,
        transcript: &[ChatMessage],
        session_id: &str,
        user_id: Option<&UserId>,
    ) -> Result<GuideTurn, GuideError> {
        info!(
            event_name = "guide.turn_started",
            session_id,
            user_id = user_id.map(|id| id.0.as_str()).unwrap_or("anonymous"),
            transcript_len = transcript.len(),
        );

        let (catalog, profile, purchase_history) = match user_id {
            Some(user_id) => self.fetch_user_context(user_id).await,
            None => {
                let catalog = self.fetch_catalog().await;
                let profile = UserProfile::default_for(UserId("anonymous".to_string()));
                (catalog, profile, Vec::new())
            }
        };

        let system_prompt = build_system_prompt(&profile, &purchase_history, &catalog);
        let raw_reply = self
            .client
            .complete(ChatRequest { system_prompt, transcript: transcript.to_vec() })
            .await?;

        let extraction = self.extractor.extract(&raw_reply, &catalog);

        if user_id.is_some() {
            self.update_profile_tags(transcript, &profile).await;
        }

        info!(
            event_name = "guide.turn_completed",
            session_id,
            user_id = user_id.map(|id| id.0.as_str()).unwrap_or("anonymous"),
            recommendation_count = extraction.recommendations.len(),
        );

        Ok(GuideTurn {
            display_text: extraction.display_text,
            recommendations: extraction.recommendations,
        })
    }

    async fn fetch_user_context(
        &self,
        user_id: &UserId,
    ) -> (Vec<Product>, UserProfile, Vec<OrderSummary>) {
        let (catalog_result, profile_result, orders_result) = tokio::join!(
            self.catalog.list_by_ai_score(),
            self.profiles.find(user_id),
            self.orders.list_recent(user_id, RECENT_ORDER_LIMIT),
        );

        let catalog = match catalog_result {
            Ok(products) => products,
            Err(error) => {
                warn!(
                    event_name = "guide.snapshot_failed",
                    snapshot = "catalog",
                    %error,
                    "continuing turn with empty catalog"
                );
                Vec::new()
            }
        };

        let profile = match profile_result {
            Ok(Some(profile)) => profile,
            Ok(None) => UserProfile::default_for(user_id.clone()),
            Err(error) => {
                warn!(
                    event_name = "guide.snapshot_failed",
                    snapshot = "profile",
                    %error,
                    "continuing turn with default profile"
                );
                UserProfile::default_for(user_id.clone())
            }
        };

        let purchase_history = match orders_result {
            Ok(orders) => orders,
            Err(error) => {
                warn!(
                    event_name = "guide.snapshot_failed",
                    snapshot = "orders",
                    %error,
                    "continuing turn with empty purchase history"
                );
                Vec::new()
            }
        };

        (catalog, profile, purchase_history)
    }

    async fn fetch_catalog(&self) -> Vec<Product> {
        match self.catalog.list_by_ai_score().await {
            Ok(products) => products,
            Err(error) => {
                warn!(
                    event_name = "guide.snapshot_failed",
                    snapshot = "catalog",
                    %error,
                    "continuing turn with empty catalog"
                );
                Vec::new()
            }
        }
    }

    /// Applies the tag rules to the latest user message and persists the
    /// result. Write failures are logged and swallowed; profile enrichment
    /// never costs the shopper their reply.
    async fn update_profile_tags(&self, transcript: &[ChatMessage], profile: &UserProfile) {
        let Some(latest_user_message) =
            transcript.iter().rev().find(|message| message.role == Role::User)
        else {
            return;
        };

        let update = self.tag_rules.apply(&latest_user_message.content, &profile.tags);
        if !update.changed {
            return;
        }

        if let Err(error) = self.profiles.upsert_tags(&profile.user_id, &update.tags).await {
            warn!(
                event_name = "guide.tag_write_failed",
                user_id = %profile.user_id,
                %error,
                "profile tag update dropped"
            );
        } else {
            info!(
                event_name = "guide.tags_updated",
                user_id = %profile.user_id,
                tags = ?update.tags,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use shopguide_core::domain::chat::ChatMessage;
    use shopguide_core::domain::order::{OrderItemSummary, OrderSummary};
    use shopguide_core::domain::product::{Product, ProductId};
    use shopguide_core::domain::profile::{UserId, UserProfile, NEW_USER_TAG};
    use shopguide_core::GuideError;
    use shopguide_db::repositories::{
        InMemoryCatalogRepository, InMemoryOrderRepository, InMemoryProfileRepository,
        ProfileRepository,
    };

    use crate::llm::{ChatClient, ChatRequest};

    use super::GuideOrchestrator;

    struct ScriptedChatClient {
        reply: Result<String, GuideError>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChatClient {
        fn replying(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) }
        }

        fn failing(error: GuideError) -> Self {
            Self { reply: Err(error), seen: Mutex::new(Vec::new()) }
        }

        async fn last_system_prompt(&self) -> String {
            let seen = self.seen.lock().await;
            seen.last().map(|request| request.system_prompt.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChatClient {
        async fn complete(&self, request: ChatRequest) -> Result<String, GuideError> {
            self.seen.lock().await.push(request);
            self.reply.clone()
        }
    }

    fn product(id: &str, name: &str, ai_score: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            price: Decimal::new(29_900, 2),
            category: "数码".to_string(),
            description: "测试商品".to_string(),
            ai_score,
            stock: 50,
            image_url: None,
            rating: 4.7,
            sales_count: 2000,
        }
    }

    struct Harness {
        catalog: Arc<InMemoryCatalogRepository>,
        profiles: Arc<InMemoryProfileRepository>,
        orders: Arc<InMemoryOrderRepository>,
        client: Arc<ScriptedChatClient>,
        orchestrator: GuideOrchestrator,
    }

    fn harness(client: ScriptedChatClient) -> Harness {
        let catalog = Arc::new(InMemoryCatalogRepository::with_products(vec![
            product("p1", "蓝牙耳机", 95),
            product("p2", "智能手环", 90),
            product("p3", "智能音箱", 85),
        ]));
        let profiles = Arc::new(InMemoryProfileRepository::default());
        let orders = Arc::new(InMemoryOrderRepository::default());
        let client = Arc::new(client);
        let orchestrator = GuideOrchestrator::new(
            catalog.clone(),
            profiles.clone(),
            orders.clone(),
            client.clone(),
        );
        Harness { catalog, profiles, orders, client, orchestrator }
    }

    fn user(id: &str) -> UserId {
        UserId(id.to_string())
    }

    #[tokio::test]
    async fn turn_strips_marker_and_resolves_recommendations_in_catalog_order() {
        let h = harness(ScriptedChatClient::replying(
            "推荐这两款。RECOMMENDED_PRODUCTS: [\"p2\", \"p1\"]",
        ));

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("有什么数码产品推荐")], "s1", Some(&user("u1")))
            .await
            .expect("turn succeeds");

        assert_eq!(turn.display_text, "推荐这两款。");
        let ids: Vec<&str> = turn.recommendations.iter().map(|r| r.id.0.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn reply_without_marker_yields_no_recommendations() {
        let h = harness(ScriptedChatClient::replying("这款手环续航很好"));

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("手环怎么样")], "s1", Some(&user("u1")))
            .await
            .expect("turn succeeds");

        assert_eq!(turn.display_text, "这款手环续航很好");
        assert!(turn.recommendations.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_gets_default_profile_in_prompt() {
        let h = harness(ScriptedChatClient::replying("好的"));

        h.orchestrator
            .send_turn(&[ChatMessage::user("你好")], "s1", Some(&user("nobody")))
            .await
            .expect("turn succeeds");

        let prompt = h.client.last_system_prompt().await;
        assert!(prompt.contains(&format!("用户画像标签: {NEW_USER_TAG}")));
        assert!(prompt.contains("无购买记录"));
    }

    #[tokio::test]
    async fn purchase_history_reaches_the_prompt() {
        let h = harness(ScriptedChatClient::replying("好的"));
        h.orders
            .insert(
                &user("u1"),
                OrderSummary {
                    order_id: "o1".to_string(),
                    created_at: Utc::now(),
                    items: vec![OrderItemSummary {
                        product_name: "快充充电器".to_string(),
                        category: "数码".to_string(),
                    }],
                },
            )
            .await;

        h.orchestrator
            .send_turn(&[ChatMessage::user("再来点配件")], "s1", Some(&user("u1")))
            .await
            .expect("turn succeeds");

        let prompt = h.client.last_system_prompt().await;
        assert!(prompt.contains("快充充电器 (数码)"));
    }

    #[tokio::test]
    async fn tag_earning_message_updates_the_stored_profile() {
        let h = harness(ScriptedChatClient::replying("好的"));
        h.profiles
            .insert(UserProfile {
                user_id: user("u1"),
                tags: vec![NEW_USER_TAG.to_string()],
            })
            .await;

        h.orchestrator
            .send_turn(&[ChatMessage::user("给宝宝买点什么好")], "s1", Some(&user("u1")))
            .await
            .expect("turn succeeds");

        let stored = h
            .profiles
            .find(&user("u1"))
            .await
            .expect("find profile")
            .expect("profile exists");
        assert_eq!(stored.tags, vec![NEW_USER_TAG.to_string(), "母婴".to_string()]);
    }

    #[tokio::test]
    async fn unchanged_tags_skip_the_profile_write() {
        let h = harness(ScriptedChatClient::replying("好的"));
        // A write would fail loudly; the point is that none is attempted.
        h.profiles.set_failing_writes(true);

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("今天天气怎么样")], "s1", Some(&user("u1")))
            .await;

        assert!(turn.is_ok());
    }

    #[tokio::test]
    async fn profile_write_failure_does_not_fail_the_turn() {
        let h = harness(ScriptedChatClient::replying(
            "推荐这款。RECOMMENDED_PRODUCTS: [\"p1\"]",
        ));
        h.profiles.set_failing_writes(true);

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("宝宝用的东西有吗")], "s1", Some(&user("u1")))
            .await
            .expect("turn still succeeds");

        assert_eq!(turn.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn failed_catalog_snapshot_degrades_to_no_recommendations() {
        let h = harness(ScriptedChatClient::replying(
            "推荐这款。RECOMMENDED_PRODUCTS: [\"p1\"]",
        ));
        h.catalog.set_failing(true);

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("推荐点什么")], "s1", Some(&user("u1")))
            .await
            .expect("turn still succeeds");

        // Listed ids cannot resolve against an empty catalog snapshot.
        assert_eq!(turn.display_text, "推荐这款。");
        assert!(turn.recommendations.is_empty());
    }

    #[tokio::test]
    async fn failed_profile_snapshot_degrades_to_default_profile() {
        let h = harness(ScriptedChatClient::replying("好的"));
        h.profiles.set_failing_reads(true);

        h.orchestrator
            .send_turn(&[ChatMessage::user("你好")], "s1", Some(&user("u1")))
            .await
            .expect("turn succeeds");

        let prompt = h.client.last_system_prompt().await;
        assert!(prompt.contains(NEW_USER_TAG));
    }

    #[tokio::test]
    async fn anonymous_turn_uses_default_profile_and_writes_nothing() {
        let h = harness(ScriptedChatClient::replying(
            "推荐这款。RECOMMENDED_PRODUCTS: [\"p1\"]",
        ));
        h.profiles.set_failing_writes(true);

        let turn = h
            .orchestrator
            .send_turn(&[ChatMessage::user("给宝宝买点什么")], "s1", None)
            .await
            .expect("turn succeeds");

        assert_eq!(turn.recommendations.len(), 1);
        let prompt = h.client.last_system_prompt().await;
        assert!(prompt.contains(NEW_USER_TAG));
        assert!(prompt.contains("无购买记录"));
    }

    #[tokio::test]
    async fn upstream_failure_aborts_the_turn() {
        let h = harness(ScriptedChatClient::failing(GuideError::Upstream(
            "gateway timeout".to_string(),
        )));

        let result = h
            .orchestrator
            .send_turn(&[ChatMessage::user("你好")], "s1", Some(&user("u1")))
            .await;

        assert!(matches!(result, Err(GuideError::Upstream(_))));
    }

    #[tokio::test]
    async fn assistant_only_transcript_skips_tagging() {
        let h = harness(ScriptedChatClient::replying("好的"));
        h.profiles.set_failing_writes(true);

        let result = h
            .orchestrator
            .send_turn(
                &[ChatMessage::assistant("婴儿用品这边请")],
                "s1",
                Some(&user("u1")),
            )
            .await;

        assert!(result.is_ok());
        assert!(h.profiles.find(&user("u1")).await.expect("find").is_none());
    }
}
