use serde::{Deserialize, Serialize};

/// Messages a page may post to the worker. Anything else is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Activate a freshly installed generation without waiting for open pages to close.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_skip_waiting() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(msg, ControlMessage::SkipWaiting);
    }

    #[test]
    fn rejects_unknown_messages() {
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type":"CLAIM"}"#).is_err());
        assert!(serde_json::from_str::<ControlMessage>(r#""SKIP_WAITING""#).is_err());
        assert!(serde_json::from_str::<ControlMessage>("null").is_err());
    }
}
