//! Flattening of raw store objects into uniform table-ready records.

use serde_json::Value;

use searchdeck_core::types::{MetadataSelection, RawHit, RawMetadata, ResultRecord};

/// Flatten raw hits into records: `id` first when requested, then each
/// requested non-null metadata field, then every property verbatim. Hits
/// missing either bag are dropped silently. Order is the store's ranking
/// order and is never changed here.
pub fn normalize(raw: &[RawHit], metadata: &MetadataSelection, include_id: bool) -> Vec<ResultRecord> {
    raw.iter()
        .filter_map(|hit| flatten_hit(hit, metadata, include_id))
        .collect()
}

fn flatten_hit(hit: &RawHit, selection: &MetadataSelection, include_id: bool) -> Option<ResultRecord> {
    let properties = hit.properties.as_ref()?;
    let metadata = hit.metadata.as_ref()?;
    let mut record = ResultRecord::new();
    if include_id {
        if let Some(id) = &metadata.id {
            record.insert("id".to_string(), Value::String(id.clone()));
        }
    }
    insert_metadata(&mut record, metadata, selection);
    for (name, value) in properties {
        record.insert(name.clone(), value.clone());
    }
    Some(record)
}

/// Fixed field list; a flag without a returned value emits nothing.
fn insert_metadata(record: &mut ResultRecord, metadata: &RawMetadata, selection: &MetadataSelection) {
    if selection.distance {
        insert_number(record, "distance", metadata.distance);
    }
    if selection.certainty {
        insert_number(record, "certainty", metadata.certainty);
    }
    if selection.score {
        insert_number(record, "score", metadata.score);
    }
    if selection.explain_score {
        if let Some(text) = &metadata.explain_score {
            record.insert("explain_score".to_string(), Value::String(text.clone()));
        }
    }
}

fn insert_number(record: &mut ResultRecord, name: &str, value: Option<f64>) {
    if let Some(number) = value.and_then(serde_json::Number::from_f64) {
        record.insert(name.to_string(), Value::Number(number));
    }
}
