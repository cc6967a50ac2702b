use anyhow::{Context, Result};

use crate::timeline::Timeline;

/// Serializes the timeline for embedding in a page.
///
/// `<` is written as `\u003c`, which keeps the payload valid JSON while
/// making it inert inside a `<script type="application/json">` element.
pub fn write_timeline_json(t: &Timeline) -> Result<String> {
    let raw = serde_json::to_string(t).context("failed serializing timeline as JSON")?;
    Ok(raw.replace('<', "\\u003c"))
}

pub fn parse_timeline_json(input: &str) -> Result<Timeline> {
    let t: Timeline = serde_json::from_str(input).context("failed parsing timeline JSON")?;
    Ok(t)
}
