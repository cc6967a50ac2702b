use anyhow::Result;

use crate::{client::seek_strip_html, formats::json::write_timeline_json, timeline::Timeline};

pub const TIMELINE_ELEMENT_ID: &str = "subtitles-json";

/// Rendered once at startup; the timeline never changes afterwards.
#[derive(Debug, Clone)]
pub struct Pages {
    pub root: String,
    pub watch: String,
    pub control: String,
    pub timeline_json: String,
}

impl Pages {
    pub fn render(timeline: &Timeline) -> Result<Self> {
        let timeline_json = write_timeline_json(timeline)?;
        Ok(Self {
            root: root_page(),
            watch: watch_page(&timeline_json),
            control: control_page(&timeline_json, &seek_strip_html(timeline)),
            timeline_json,
        })
    }
}

fn payload(timeline_json: &str) -> String {
    format!(r#"<script type="application/json" id="{TIMELINE_ELEMENT_ID}">{timeline_json}</script>"#)
}

fn root_page() -> String {
    r#"<!DOCTYPE html>
<html>
  <body>
    <ul>
      <li><a href='/watch'>Watch</a></li>
      <li><a href='/control'>Control</a></li>
    </ul>
  </body>
</html>
"#
    .to_string()
}

fn watch_page(timeline_json: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    {payload}
    <div id='subtitles-display'></div>
    <script src='/watch.js'></script>
  </body>
</html>
"#,
        payload = payload(timeline_json)
    )
}

fn control_page(timeline_json: &str, seek_strip: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <style>
      #subtitles-display {{
        height: 8em;
      }}
      #subtitles-seek {{
        position: relative;
      }}
      #subtitles-seek .subtitle {{
        position: absolute;
        left: 8em;
        overflow: hidden;
      }}
      #subtitles-seek .time-marker {{
        position: absolute;
        left: 0;
      }}
      #cursor {{
        position: absolute;
        left: 0;
        right: 0;
        height: 1px;
        background: red;
      }}
    </style>
  </head>
  <body>
    {payload}
    <input type='button' value='Play' id='play'/>
    <input type='button' value='Pause' id='pause'/>
    <input type='button' value='Toggle' id='toggle'/>
    <input type='number' id='seek-ms'/>
    <input type='button' value='Seek' id='seek'/>
    <input type='number' step='0.001' value='1' id='speed-scale'/>
    <input type='button' value='Set speed' id='set-speed'/>
    <input type='button' value='Sync 1' id='sync1'/>
    <input type='button' value='Sync 2' id='sync2'/>
    <div id='calibration-stats'></div>
    <div id='subtitles-display'></div>
    <div id='subtitles-seek'>{seek_strip}</div>
    <script src='/control.js'></script>
  </body>
</html>
"#,
        payload = payload(timeline_json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{json::parse_timeline_json, srt::parse_srt};

    fn embedded_json(page: &str) -> &str {
        let open = format!(r#"id="{TIMELINE_ELEMENT_ID}">"#);
        let start = page.find(&open).unwrap() + open.len();
        let len = page[start..].find("</script>").unwrap();
        &page[start..start + len]
    }

    #[test]
    fn caption_pages_embed_the_timeline_verbatim() {
        let t = parse_srt("1\n00:00:01,000 --> 00:00:02,000\n</script> & <i>more</i>").unwrap();
        let pages = Pages::render(&t).unwrap();
        for page in [&pages.watch, &pages.control] {
            assert_eq!(parse_timeline_json(embedded_json(page)).unwrap(), t);
        }
        assert!(pages.watch.contains("/watch.js"));
        assert!(pages.control.contains("/control.js"));
        assert!(pages.control.contains("id='sync2'"));
    }

    #[test]
    fn control_page_carries_the_seek_strip() {
        let t = parse_srt("1\n00:00:01,000 --> 00:00:02,000\nOne").unwrap();
        let pages = Pages::render(&t).unwrap();
        let strip = seek_strip_html(&t);
        assert!(pages.control.contains(&format!("<div id='subtitles-seek'>{strip}</div>")));
        assert!(strip.contains("style='top: 20px; height: 20px'"));
        assert!(!pages.watch.contains("subtitles-seek"));
    }

    #[test]
    fn root_links_both_views() {
        let pages = Pages::render(&Timeline::default()).unwrap();
        assert!(pages.root.contains("href='/watch'"));
        assert!(pages.root.contains("href='/control'"));
        assert_eq!(pages.timeline_json, "[]");
    }
}
