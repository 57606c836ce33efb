use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::{GraphData, NodeVector};

pub(super) fn parse_graph(raw: &str) -> Result<GraphData> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in graph file")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("graph file must contain a JSON object"))?;
    if !object.contains_key("nodes") {
        return Err(anyhow!("graph file has no \"nodes\" array"));
    }

    GraphData::deserialize(parsed).context("invalid node or edge record in graph file")
}

/// Accepts either a bare array of vectors or an object wrapping it under
/// `"vectors"`.
pub(super) fn parse_vectors(raw: &str) -> Result<Vec<NodeVector>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in vectors file")?;
    let list = match parsed {
        Value::Array(_) => parsed,
        Value::Object(mut object) => object
            .remove("vectors")
            .ok_or_else(|| anyhow!("vectors file has no \"vectors\" array"))?,
        _ => return Err(anyhow!("vectors file must contain a JSON array")),
    };

    Vec::<NodeVector>::deserialize(list).context("invalid vector record in vectors file")
}
