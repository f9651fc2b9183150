use crate::domain::order::OrderSummary;
use crate::domain::product::Product;
use crate::domain::profile::UserProfile;

/// Builds the per-turn system prompt: user context, one line per catalog
/// product, plain-text formatting rules, and the exact marker syntax the
/// model must emit to signal recommendations.
pub fn build_system_prompt(
    profile: &UserProfile,
    purchase_history: &[OrderSummary],
    catalog: &[Product],
) -> String {
    let user_context = build_user_context(profile, purchase_history);
    let products_context = catalog
        .iter()
        .map(product_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "你是一个专业的AI导购助手。你需要根据用户的需求、画像和购买历史推荐最合适的商品。\n\
         \n\
         {user_context}\n\
         \n\
         当前商品库存：\n\
         {products_context}\n\
         \n\
         请根据用户的需求分析并推荐商品。\n\
         \n\
         CRITICAL: 你的回复必须使用纯文本格式，绝对不要使用任何格式化符号。包括但不限于：\n\
         - 不要使用星号 * 或 **\n\
         - 不要使用井号 #\n\
         - 不要使用破折号 -\n\
         - 不要使用下划线 _\n\
         - 不要使用引号强调\n\
         使用换行和空格来组织内容。\n\
         \n\
         回复格式：\n\
         第一步，理解用户需求和意图（推荐、咨询、优惠等）\n\
         第二步，结合用户画像标签和购买历史，推荐2到3个最合适的商品\n\
         第三步，说明推荐理由，结合用户的历史偏好\n\
         第四步，在回复最后用JSON格式列出推荐的商品ID\n\
         格式：RECOMMENDED_PRODUCTS: [\"商品ID1\", \"商品ID2\"]\n\
         \n\
         意图识别规则：\n\
         如果用户询问推荐、买什么、挑选、选品，意图是推荐\n\
         如果用户询问价格、优惠、折扣、促销，意图是优惠\n\
         其他情况，意图是咨询\n\
         \n\
         注意：一定要基于上述商品库存进行推荐，不要推荐不存在的商品。\
         要考虑用户的画像标签和购买历史。输出时绝对不要使用任何符号标记。"
    )
}

fn product_line(product: &Product) -> String {
    format!(
        "商品: {name}, 价格: ¥{price}, 分类: {category}, 描述: {description}, AI评分: {score}, 库存: {stock}",
        name = product.name,
        price = product.price,
        category = product.category,
        description = product.description,
        score = product.ai_score,
        stock = product.stock,
    )
}

fn build_user_context(profile: &UserProfile, purchase_history: &[OrderSummary]) -> String {
    let history_summary = if purchase_history.is_empty() {
        "无购买记录".to_string()
    } else {
        purchase_history
            .iter()
            .map(|order| {
                order
                    .items
                    .iter()
                    .map(|item| format!("{} ({})", item.product_name, item.category))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>()
            .join("; ")
    };

    format!(
        "用户画像标签: {tags}\n用户购买历史: {history_summary}",
        tags = profile.tags.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::order::{OrderItemSummary, OrderSummary};
    use crate::domain::product::{Product, ProductId};
    use crate::domain::profile::{UserId, UserProfile};

    use super::build_system_prompt;

    fn profile_fixture() -> UserProfile {
        UserProfile {
            user_id: UserId("u-1".to_string()),
            tags: vec!["新用户".to_string(), "数码".to_string()],
        }
    }

    fn catalog_fixture() -> Vec<Product> {
        vec![Product {
            id: ProductId("p1".to_string()),
            name: "蓝牙耳机".to_string(),
            price: Decimal::new(19_900, 2),
            category: "数码配件".to_string(),
            description: "降噪入耳式".to_string(),
            ai_score: 90,
            stock: 25,
            image_url: None,
            rating: 4.8,
            sales_count: 1200,
        }]
    }

    #[test]
    fn prompt_embeds_tags_catalog_line_and_marker_syntax() {
        let prompt = build_system_prompt(&profile_fixture(), &[], &catalog_fixture());

        assert!(prompt.contains("用户画像标签: 新用户, 数码"));
        assert!(prompt.contains("无购买记录"));
        assert!(prompt.contains(
            "商品: 蓝牙耳机, 价格: ¥199.00, 分类: 数码配件, 描述: 降噪入耳式, AI评分: 90, 库存: 25"
        ));
        assert!(prompt.contains("RECOMMENDED_PRODUCTS: [\"商品ID1\", \"商品ID2\"]"));
    }

    #[test]
    fn purchase_history_is_summarized_per_order() {
        let history = vec![
            OrderSummary {
                order_id: "o-2".to_string(),
                created_at: Utc::now(),
                items: vec![
                    OrderItemSummary {
                        product_name: "机械键盘".to_string(),
                        category: "电脑外设".to_string(),
                    },
                    OrderItemSummary {
                        product_name: "无线鼠标".to_string(),
                        category: "电脑外设".to_string(),
                    },
                ],
            },
            OrderSummary {
                order_id: "o-1".to_string(),
                created_at: Utc::now(),
                items: vec![OrderItemSummary {
                    product_name: "智能音箱".to_string(),
                    category: "智能家居".to_string(),
                }],
            },
        ];

        let prompt = build_system_prompt(&profile_fixture(), &history, &catalog_fixture());

        assert!(prompt.contains(
            "用户购买历史: 机械键盘 (电脑外设), 无线鼠标 (电脑外设); 智能音箱 (智能家居)"
        ));
    }
}
