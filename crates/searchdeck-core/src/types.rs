//! Domain types shared by the store client and the query layer.

use serde::{Deserialize, Serialize};

/// Sentinel sent downstream when the user submits no query text: an empty
/// query means "list everything up to the limit", not an error.
pub const WILDCARD_QUERY: &str = "*";

pub const LIMIT_MIN: usize = 1;
pub const LIMIT_MAX: usize = 100_000;
pub const DEFAULT_LIMIT: usize = 50;
pub const DEFAULT_ALPHA: f64 = 0.6;

/// One flattened result row: field name -> JSON value, in production order.
pub type ResultRecord = serde_json::Map<String, serde_json::Value>;

/// Which ranking the store should run for a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Keyword,
    Semantic,
    Hybrid,
}

impl SearchType {
    /// Lenient parse at the string boundary. Unknown labels fall back to
    /// keyword search (logged, never an error).
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "keyword" | "bm25" => Self::Keyword,
            "semantic" | "neartext" | "near_text" => Self::Semantic,
            "hybrid" => Self::Hybrid,
            other => {
                tracing::warn!(search_type = other, "unknown search type, falling back to keyword");
                Self::Keyword
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }

    /// Semantic and hybrid rankings need the query vectorized by the same
    /// embedding provider that embedded the collection.
    pub fn needs_vectorizer(self) -> bool {
        !matches!(self, Self::Keyword)
    }
}

/// How two ranked lists are merged into one during hybrid search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FusionMode {
    Relative,
    Ranked,
}

impl FusionMode {
    pub fn parse(label: &str) -> Self {
        if label.eq_ignore_ascii_case("relative") {
            Self::Relative
        } else {
            Self::Ranked
        }
    }
}

/// Optional per-result diagnostic fields the caller can request alongside
/// substantive properties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFlag {
    Id,
    Distance,
    Certainty,
    Score,
    ExplainScore,
}

impl MetadataFlag {
    pub const ALL: [MetadataFlag; 5] = [
        MetadataFlag::Id,
        MetadataFlag::Distance,
        MetadataFlag::Certainty,
        MetadataFlag::Score,
        MetadataFlag::ExplainScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Distance => "distance",
            Self::Certainty => "certainty",
            Self::Score => "score",
            Self::ExplainScore => "explain_score",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str() == label.to_ascii_lowercase())
    }
}

/// A single search invocation, built fresh from caller state per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub collection: String,
    pub query_text: String,
    /// Ordered, unique, non-empty property names. Empty means "use whatever
    /// was last discovered for the collection".
    pub properties: Vec<String>,
    pub metadata: Vec<MetadataFlag>,
    pub search_type: SearchType,
    /// Keyword/vector balance, meaningful only for hybrid search.
    pub alpha: f64,
    /// Meaningful only for hybrid search.
    pub fusion: FusionMode,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            query_text: String::new(),
            properties: Vec::new(),
            metadata: vec![MetadataFlag::Score],
            search_type: SearchType::Keyword,
            alpha: DEFAULT_ALPHA,
            fusion: FusionMode::Ranked,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Dispatch parameters for one strategy. Alpha and fusion exist only on the
/// hybrid variant, so keyword and semantic calls cannot carry them.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Keyword { query: String },
    Semantic { query: String },
    Hybrid { query: String, alpha: f64, fusion: FusionMode },
}

/// Metadata-inclusion descriptor handed to the store. `id` is structural and
/// never part of this descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataSelection {
    pub distance: bool,
    pub certainty: bool,
    pub score: bool,
    pub explain_score: bool,
}

/// The fully resolved call the executor hands to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub collection: String,
    pub strategy: Strategy,
    pub limit: usize,
    pub properties: Vec<String>,
    pub metadata: MetadataSelection,
    pub include_id: bool,
}

/// Metadata bag of one raw hit. A fixed set of optional fields, iterated by
/// list rather than reflection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    pub id: Option<String>,
    pub distance: Option<f64>,
    pub certainty: Option<f64>,
    pub score: Option<f64>,
    pub explain_score: Option<String>,
}

/// One result object as produced by the transport, before flattening.
/// Hits missing either bag are malformed partial entries and get skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHit {
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    pub metadata: Option<RawMetadata>,
}
