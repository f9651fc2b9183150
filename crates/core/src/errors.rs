use thiserror::Error;

/// Failures that abort a visible guide turn.
///
/// Everything else in the turn degrades gracefully: a marker that fails to
/// parse yields an empty recommendation list, unmatched product ids are
/// dropped, and a profile-write failure is logged and swallowed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GuideError {
    #[error("model endpoint failure: {0}")]
    Upstream(String),
    #[error("model endpoint misconfigured: {0}")]
    Configuration(String),
}

impl GuideError {
    /// The single generic notification shown to the shopper. Raw upstream
    /// detail stays in logs; no partial or garbled reply reaches the UI.
    pub fn user_message(&self) -> &'static str {
        "抱歉，AI助手暂时无法响应，请稍后重试"
    }
}

#[cfg(test)]
mod tests {
    use super::GuideError;

    #[test]
    fn upstream_error_keeps_detail_out_of_user_message() {
        let error = GuideError::Upstream("status 503: gateway drained".to_string());
        assert!(error.to_string().contains("503"));
        assert!(!error.user_message().contains("503"));
    }
}
