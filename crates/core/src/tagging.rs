use crate::domain::profile::UserProfile;

/// Keyword → tag rules applied to the latest user message. Each rule is
/// evaluated independently against the original message, so several can
/// fire in the same pass.
const TAG_RULES: &[(&[&str], &str)] = &[
    (&["婴儿", "宝宝"], "母婴"),
    (&["家居", "装修"], "家居"),
    (&["数码", "电子"], "数码"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagUpdate {
    pub tags: Vec<String>,
    pub changed: bool,
}

/// Coarse interest tagging over the latest user message.
///
/// Strictly additive and best-effort: tags are never removed, there is no
/// decay, and the result is a weak signal rather than an authoritative
/// preference model.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagRules;

impl TagRules {
    pub fn new() -> Self {
        Self
    }

    /// Returns the tag set after this message, preserving the existing tags'
    /// order and appending newly earned tags in rule order. `changed` is
    /// false when the message earned nothing new, which callers use to skip
    /// the profile write.
    pub fn apply(&self, message: &str, current_tags: &[String]) -> TagUpdate {
        // Lower-cased for matching only; recommendation logic never sees this.
        let normalized = message.to_lowercase();

        let mut tags = current_tags.to_vec();
        for (keywords, tag) in TAG_RULES {
            let mentioned = keywords.iter().any(|keyword| normalized.contains(keyword));
            if mentioned && !tags.iter().any(|existing| existing == tag) {
                tags.push((*tag).to_string());
            }
        }

        let changed = tags.len() != current_tags.len();
        TagUpdate { tags, changed }
    }

    pub fn apply_to_profile(&self, message: &str, profile: &UserProfile) -> TagUpdate {
        self.apply(message, &profile.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::TagRules;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn infant_keyword_adds_maternal_infant_tag() {
        let update = TagRules::new().apply("有适合宝宝用的东西吗", &tags(&["新用户"]));

        assert!(update.changed);
        assert_eq!(update.tags, tags(&["新用户", "母婴"]));
    }

    #[test]
    fn independent_rules_can_all_fire_in_one_pass() {
        let update =
            TagRules::new().apply("婴儿房装修需要买点什么", &tags(&["新用户"]));

        assert!(update.changed);
        assert_eq!(update.tags, tags(&["新用户", "母婴", "家居"]));
    }

    #[test]
    fn existing_tag_is_not_duplicated() {
        let update = TagRules::new().apply("再推荐点数码产品", &tags(&["数码"]));

        assert!(!update.changed);
        assert_eq!(update.tags, tags(&["数码"]));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let rules = TagRules::new();
        let message = "想给宝宝买个电子琴";

        let once = rules.apply(message, &tags(&["新用户"]));
        let twice = rules.apply(message, &once.tags);

        assert!(once.changed);
        assert!(!twice.changed);
        assert_eq!(once.tags, twice.tags);
    }

    #[test]
    fn unrelated_message_leaves_tags_unchanged() {
        let update = TagRules::new().apply("今天天气怎么样", &tags(&["新用户"]));

        assert!(!update.changed);
        assert_eq!(update.tags, tags(&["新用户"]));
    }
}
