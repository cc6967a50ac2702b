use serde::{Deserialize, Serialize};

/// Client → server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ClientCommand {
    Play,
    Pause,
    /// Target time in milliseconds; may be negative.
    Seek(i64),
    SetSpeedScale(f64),
    /// `Play` when paused, `Pause` otherwise.
    Toggle,
}

/// Server → client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum ServerEvent {
    SetTime(i64),
}

impl ClientCommand {
    pub fn from_json(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_command() {
        let cases = [
            (r#"{"event":"Play"}"#, ClientCommand::Play),
            (r#"{"event":"Pause"}"#, ClientCommand::Pause),
            (r#"{"event":"Toggle"}"#, ClientCommand::Toggle),
            (r#"{"event":"Seek","payload":-1500}"#, ClientCommand::Seek(-1500)),
            (r#"{"event":"SetSpeedScale","payload":1.25}"#, ClientCommand::SetSpeedScale(1.25)),
            (r#"{"event":"SetSpeedScale","payload":2}"#, ClientCommand::SetSpeedScale(2.0)),
        ];
        for (frame, expected) in cases {
            assert_eq!(ClientCommand::from_json(frame).unwrap(), expected, "{frame}");
        }
    }

    #[test]
    fn rejects_unknown_or_incomplete_frames() {
        for frame in [
            r#"{"event":"Rewind"}"#,
            r#"{"event":"Seek"}"#,
            r#"{"event":"Seek","payload":"soon"}"#,
            "Play",
        ] {
            assert!(ClientCommand::from_json(frame).is_err(), "{frame}");
        }
    }

    #[test]
    fn encodes_set_time() {
        let json = ServerEvent::SetTime(1_000_100).to_json().unwrap();
        assert_eq!(json, r#"{"event":"SetTime","payload":1000100}"#);
    }
}
