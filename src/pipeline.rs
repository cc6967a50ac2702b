use anyhow::{Context, Result};
use std::path::Path;

use crate::{
    config::Config,
    formats::srt::{parse_srt, plain_text, pretty_print_subtitle},
    text_file::{read_text_file, strip_non_ascii},
    timeline::Timeline,
};

/// Reads, decodes and parses a captions file. Any malformed block fails
/// the whole load.
pub fn load_timeline(path: &Path, cfg: &Config) -> Result<Timeline> {
    let span = tracing::info_span!("load_timeline", path = %path.display());
    let _g = span.enter();

    let file = read_text_file(path)?;
    tracing::info!(
        encoding = %file.encoding,
        bytes = file.content.len(),
        "read captions file"
    );

    let content = if cfg.input.strip_non_ascii {
        strip_non_ascii(&file.content)
    } else {
        file.content
    };

    let timeline = parse_srt(&content)
        .with_context(|| format!("failed parsing captions file: {}", path.display()))?;

    log_timeline_summary(&timeline, cfg);
    Ok(timeline)
}

/// Parses a captions file and prints every entry.
pub fn run_dump(path: &Path, cfg: &Config) -> Result<()> {
    let timeline = load_timeline(path, cfg)?;
    print!("{}", render_dump(&timeline));
    Ok(())
}

fn render_dump(t: &Timeline) -> String {
    let mut out = String::new();
    for entry in t.entries() {
        out.push_str(&pretty_print_subtitle(entry));
        out.push_str("\n\n");
    }
    out
}

fn log_timeline_summary(t: &Timeline, cfg: &Config) {
    tracing::info!(
        entries = t.len(),
        end = %t.end(),
        "timeline summary"
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_cue_samples.min(t.len());
        for entry in t.entries().iter().take(n) {
            tracing::debug!(
                index = entry.index,
                start_ms = entry.period.start.total_ms(),
                end_ms = entry.period.end.total_ms(),
                parts = entry.text.len(),
                chars = plain_text(&entry.text).chars().count(),
                "entry sample"
            );
        }
    }
}
