//! Textual rendering of the store's `Get` queries.

use searchdeck_core::types::{FusionMode, MetadataSelection, SearchPlan, Strategy};

/// JSON string quoting doubles as GraphQL string quoting.
fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn fusion_label(fusion: FusionMode) -> &'static str {
    match fusion {
        FusionMode::Relative => "relativeScoreFusion",
        FusionMode::Ranked => "rankedFusion",
    }
}

/// The search operator for one strategy. Alpha and fusion only ever appear
/// on the hybrid operator.
fn operator_clause(strategy: &Strategy) -> String {
    match strategy {
        Strategy::Keyword { query } => format!("bm25: {{query: {}}}", quote(query)),
        Strategy::Semantic { query } => format!("nearText: {{concepts: [{}]}}", quote(query)),
        Strategy::Hybrid { query, alpha, fusion } => format!(
            "hybrid: {{query: {}, alpha: {}, fusionType: {}}}",
            quote(query),
            alpha,
            fusion_label(*fusion)
        ),
    }
}

/// The `_additional` projection. The object identifier is structural and is
/// always fetched; the four diagnostic fields follow the selection.
fn additional_clause(metadata: &MetadataSelection) -> String {
    let mut fields = vec!["id"];
    if metadata.distance {
        fields.push("distance");
    }
    if metadata.certainty {
        fields.push("certainty");
    }
    if metadata.score {
        fields.push("score");
    }
    if metadata.explain_score {
        fields.push("explainScore");
    }
    format!("_additional {{ {} }}", fields.join(" "))
}

/// Render one planned search as a `Get` query document.
pub fn render_get_query(plan: &SearchPlan) -> String {
    let mut selection: Vec<String> = plan.properties.clone();
    selection.push(additional_clause(&plan.metadata));
    format!(
        "{{ Get {{ {}({}, limit: {}) {{ {} }} }} }}",
        plan.collection,
        operator_clause(&plan.strategy),
        plan.limit,
        selection.join(" ")
    )
}
