use crate::{
    formats::{srt::html_text, time::Timestamp},
    model::SubtitleEntry,
    protocol::ServerEvent,
    timeline::Timeline,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionView {
    pub time: Timestamp,
    pub position: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CaptionMirror {
    timeline: Timeline,
    view: Option<CaptionView>,
}

impl CaptionMirror {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            view: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn current_time(&self) -> Option<Timestamp> {
        self.view.map(|v| v.time)
    }

    pub fn apply(&mut self, event: ServerEvent) -> CaptionView {
        match event {
            ServerEvent::SetTime(ms) => self.set_time(Timestamp::from_millis(ms)),
        }
    }

    pub fn set_time(&mut self, time: Timestamp) -> CaptionView {
        let view = CaptionView {
            time,
            position: self.timeline.find_active_position(time),
        };
        self.view = Some(view);
        view
    }

    pub fn active_entry(&self) -> Option<&SubtitleEntry> {
        let position = self.view?.position?;
        self.timeline.entries().get(position)
    }

    /// Watch view markup: the pretty time, then the caption when one is
    /// active.
    pub fn render_html(&self) -> String {
        let Some(view) = self.view else {
            return String::new();
        };
        match self.active_entry() {
            Some(entry) => format!("{}<br/>{}", view.time, html_text(&entry.text)),
            None => view.time.to_string(),
        }
    }

    /// Control view markup: as [`CaptionMirror::render_html`], but the
    /// `<br/>` after the time is kept in gaps.
    pub fn render_control_html(&self) -> String {
        let Some(view) = self.view else {
            return String::new();
        };
        let caption = self
            .active_entry()
            .map(|entry| html_text(&entry.text))
            .unwrap_or_default();
        format!("{}<br/>{caption}", view.time)
    }
}

/// Vertical scale of the control view's seek strip.
pub const MS_TO_PX: f64 = 0.02;
pub const CURSOR_ELEMENT_ID: &str = "cursor";

const TIME_MARKER_PERIOD_MS: i64 = 10_000;
const MAX_TIME_MARKERS: usize = 100_000;

pub fn px_for_ms(ms: i64) -> i64 {
    (ms as f64 * MS_TO_PX).floor() as i64
}

pub fn cursor_top_px(time: Timestamp) -> i64 {
    px_for_ms(time.total_ms())
}

/// Marker times every ten seconds from zero, up to and including the first
/// one at or past `end`.
pub fn time_marker_times(end: Timestamp) -> Vec<Timestamp> {
    let mut times = vec![Timestamp::ZERO];
    let mut last = 0_i64;
    while last < end.total_ms() && times.len() < MAX_TIME_MARKERS {
        let Some(next) = last.checked_add(TIME_MARKER_PERIOD_MS) else {
            break;
        };
        times.push(Timestamp::from_millis(next));
        last = next;
    }
    times
}

fn entry_block_html(entry: &SubtitleEntry) -> String {
    let top = px_for_ms(entry.period.start.total_ms());
    let height = px_for_ms(entry.period.length_ms());
    format!(
        "<div class='subtitle' style='top: {top}px; height: {height}px'>\n  {}\n</div>",
        html_text(&entry.text)
    )
}

fn time_marker_html(time: Timestamp) -> String {
    format!(
        "<div class='time-marker' style='top: {}px'>\n  {time}\n</div>",
        px_for_ms(time.total_ms())
    )
}

/// Contents of the control view's seek strip: one block per entry sized by
/// its period, the ten-second markers, then the cursor.
pub fn seek_strip_html(timeline: &Timeline) -> String {
    let entries: Vec<String> = timeline.entries().iter().map(entry_block_html).collect();
    let markers: Vec<String> = time_marker_times(timeline.end())
        .into_iter()
        .map(time_marker_html)
        .collect();
    format!(
        "{}{}<div id='{CURSOR_ELEMENT_ID}'></div>",
        entries.join("\n"),
        markers.join("\n")
    )
}
