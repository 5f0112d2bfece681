//! Strategy dispatch: turns a request plus session state into a concrete
//! plan, runs it against a backend, and books the outcome.

use std::time::Instant;

use chrono::Utc;
use tracing::info;

use searchdeck_core::error::QueryError;
use searchdeck_core::traits::SearchBackend;
use searchdeck_core::types::{
    MetadataFlag, MetadataSelection, ResultRecord, SearchPlan, SearchRequest, SearchType,
    Strategy, LIMIT_MAX, LIMIT_MIN, WILDCARD_QUERY,
};

use crate::normalize::normalize;
use crate::session::{SearchHistoryEntry, SessionContext};

/// Run one search end to end: plan, dispatch, flatten, record. Results
/// replace wholesale; nothing is merged and nothing is re-sorted.
pub fn execute(
    backend: &dyn SearchBackend,
    session: &mut SessionContext,
    request: &SearchRequest,
) -> Result<Vec<ResultRecord>, QueryError> {
    if request.search_type.needs_vectorizer() && !backend.has_provider_credential() {
        return Err(QueryError::ProviderKeyMissing(
            request.search_type.label().to_string(),
        ));
    }
    let plan = build_plan(session, request);
    let started = Instant::now();
    let raw = backend.run_search(&plan)?;
    let elapsed = started.elapsed().as_secs_f64();
    let records = normalize(&raw, &plan.metadata, plan.include_id);
    info!(
        collection = %request.collection,
        results = records.len(),
        elapsed_seconds = elapsed,
        "search completed"
    );
    session.record_search(SearchHistoryEntry {
        timestamp: Utc::now(),
        query_text: request.query_text.clone(),
        collection: request.collection.clone(),
        result_count: records.len(),
        elapsed_seconds: elapsed,
    });
    Ok(records)
}

/// Resolve a request into the dispatch parameters for its strategy.
pub fn build_plan(session: &SessionContext, request: &SearchRequest) -> SearchPlan {
    let query = effective_query(&request.query_text);
    let strategy = match request.search_type {
        SearchType::Keyword => Strategy::Keyword { query },
        SearchType::Semantic => Strategy::Semantic { query },
        SearchType::Hybrid => Strategy::Hybrid {
            query,
            alpha: request.alpha.clamp(0.0, 1.0),
            fusion: request.fusion,
        },
    };
    let (metadata, include_id) = metadata_selection(&request.metadata);
    SearchPlan {
        collection: request.collection.clone(),
        strategy,
        limit: request.limit.clamp(LIMIT_MIN, LIMIT_MAX),
        properties: selected_properties(session, request),
        metadata,
        include_id,
    }
}

/// An empty query means "list everything up to the limit".
fn effective_query(text: &str) -> String {
    if text.trim().is_empty() {
        WILDCARD_QUERY.to_string()
    } else {
        text.to_string()
    }
}

/// Explicit selection, deduplicated in order; otherwise whatever was last
/// discovered for the collection. Never the whole schema implicitly.
fn selected_properties(session: &SessionContext, request: &SearchRequest) -> Vec<String> {
    if request.properties.is_empty() {
        return session
            .properties_for(&request.collection)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
    }
    let mut properties: Vec<String> = Vec::with_capacity(request.properties.len());
    for name in &request.properties {
        let name = name.trim();
        if name.is_empty() || properties.iter().any(|existing| existing == name) {
            continue;
        }
        properties.push(name.to_string());
    }
    properties
}

/// Translate the flag set into the store descriptor. Identifier retrieval is
/// structural and stays out of the descriptor.
fn metadata_selection(flags: &[MetadataFlag]) -> (MetadataSelection, bool) {
    let mut selection = MetadataSelection::default();
    let mut include_id = false;
    for flag in flags {
        match flag {
            MetadataFlag::Id => include_id = true,
            MetadataFlag::Distance => selection.distance = true,
            MetadataFlag::Certainty => selection.certainty = true,
            MetadataFlag::Score => selection.score = true,
            MetadataFlag::ExplainScore => selection.explain_score = true,
        }
    }
    (selection, include_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchdeck_core::types::FusionMode;

    fn request() -> SearchRequest {
        let mut request = SearchRequest::new("Articles");
        request.properties = vec!["title".to_string()];
        request.metadata = Vec::new();
        request
    }

    #[test]
    fn empty_query_becomes_the_wildcard_sentinel() {
        let session = SessionContext::new();
        let mut r = request();
        r.query_text = "   ".to_string();
        let plan = build_plan(&session, &r);
        assert_eq!(plan.strategy, Strategy::Keyword { query: "*".to_string() });
    }

    #[test]
    fn hybrid_plans_carry_alpha_and_fusion() {
        let session = SessionContext::new();
        let mut r = request();
        r.query_text = "fire".to_string();
        r.search_type = SearchType::Hybrid;
        r.alpha = 0.25;
        r.fusion = FusionMode::Relative;
        let plan = build_plan(&session, &r);
        assert_eq!(
            plan.strategy,
            Strategy::Hybrid {
                query: "fire".to_string(),
                alpha: 0.25,
                fusion: FusionMode::Relative,
            }
        );
    }

    #[test]
    fn keyword_plans_cannot_carry_hybrid_parameters() {
        let session = SessionContext::new();
        let mut r = request();
        r.query_text = "fire".to_string();
        r.alpha = 0.9;
        let plan = build_plan(&session, &r);
        // Alpha and fusion only exist on the hybrid variant.
        assert_eq!(plan.strategy, Strategy::Keyword { query: "fire".to_string() });
    }

    #[test]
    fn limit_is_clamped_to_the_allowed_range() {
        let session = SessionContext::new();
        let mut r = request();
        r.limit = 0;
        assert_eq!(build_plan(&session, &r).limit, 1);
        r.limit = 2_000_000;
        assert_eq!(build_plan(&session, &r).limit, 100_000);
    }

    #[test]
    fn explicit_properties_are_deduplicated_in_order() {
        let session = SessionContext::new();
        let mut r = request();
        r.properties = vec![
            "title".to_string(),
            " title ".to_string(),
            String::new(),
            "url".to_string(),
        ];
        let plan = build_plan(&session, &r);
        assert_eq!(plan.properties, ["title", "url"]);
    }

    #[test]
    fn empty_selection_falls_back_to_discovered_properties() {
        let mut session = SessionContext::new();
        session.remember_properties("Articles", vec!["title".to_string(), "url".to_string()]);
        let mut r = request();
        r.properties = Vec::new();
        let plan = build_plan(&session, &r);
        assert_eq!(plan.properties, ["title", "url"]);

        // Nothing discovered for another collection: no implicit widening.
        r.collection = "Recipes".to_string();
        let plan = build_plan(&session, &r);
        assert!(plan.properties.is_empty());
    }

    #[test]
    fn id_flag_is_structural_not_part_of_the_descriptor() {
        let (selection, include_id) = metadata_selection(&[MetadataFlag::Id, MetadataFlag::Score]);
        assert!(include_id);
        assert!(selection.score);
        assert_eq!(
            selection,
            MetadataSelection {
                score: true,
                ..MetadataSelection::default()
            }
        );
    }
}
