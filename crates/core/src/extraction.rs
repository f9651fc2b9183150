use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::product::Product;
use crate::domain::recommendation::ResolvedRecommendation;

/// The label the system prompt instructs the model to emit ahead of the
/// JSON array of recommended product ids.
pub const MARKER_LABEL: &str = "RECOMMENDED_PRODUCTS:";

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"RECOMMENDED_PRODUCTS:\s*(\[.*?\])").expect("marker pattern compiles")
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub display_text: String,
    pub recommendations: Vec<ResolvedRecommendation>,
}

/// Seam for pulling structured recommendations out of free-text model
/// output, so the marker protocol can later be swapped for a
/// schema-constrained response without touching the orchestrator.
pub trait RecommendationParser: Send + Sync {
    fn extract(&self, raw_reply: &str, catalog: &[Product]) -> Extraction;
}

/// Recognizes the first `RECOMMENDED_PRODUCTS: [...]` occurrence in a reply.
///
/// Only the first occurrence is recognized and stripped; a reply carrying
/// more than one marker keeps the later ones visible. A recorded
/// limitation, not an invariant worth relying on.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerExtractor;

impl MarkerExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl RecommendationParser for MarkerExtractor {
    fn extract(&self, raw_reply: &str, catalog: &[Product]) -> Extraction {
        let Some(captures) = marker_pattern().captures(raw_reply) else {
            // A reply without a marker is a legitimate answer, not an error.
            return Extraction {
                display_text: raw_reply.to_string(),
                recommendations: Vec::new(),
            };
        };

        let marker = match captures.get(0) {
            Some(marker) => marker,
            None => {
                return Extraction {
                    display_text: raw_reply.to_string(),
                    recommendations: Vec::new(),
                }
            }
        };

        // Malformed bracket bodies are discarded silently; the marker is
        // still stripped so the label never leaks into the UI.
        let listed_ids: Vec<String> =
            serde_json::from_str(&captures[1]).unwrap_or_default();

        let wanted: HashSet<&str> = listed_ids.iter().map(String::as_str).collect();
        let recommendations = catalog
            .iter()
            .filter(|product| wanted.contains(product.id.0.as_str()))
            .map(ResolvedRecommendation::from)
            .collect();

        let mut cleaned = String::with_capacity(raw_reply.len());
        cleaned.push_str(&raw_reply[..marker.start()]);
        cleaned.push_str(&raw_reply[marker.end()..]);

        Extraction { display_text: cleaned.trim().to_string(), recommendations }
    }
}
