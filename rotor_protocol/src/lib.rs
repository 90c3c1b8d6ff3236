use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capacity of the favorites list on the controller.
pub const MAX_FAVORITES: usize = 10;

/// Message identifier, the tag in front of the `|` of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    Rotor,
    Settings,
    Calibration,
    Favorites,
    Lock,
    Ui,
}

impl Identifier {
    pub const ALL: [Identifier; 6] = [
        Identifier::Rotor,
        Identifier::Settings,
        Identifier::Calibration,
        Identifier::Favorites,
        Identifier::Lock,
        Identifier::Ui,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Identifier::Rotor => "ROTOR",
            Identifier::Settings => "SETTINGS",
            Identifier::Calibration => "CALIBRATION",
            Identifier::Favorites => "FAVORITES",
            Identifier::Lock => "LOCK",
            Identifier::Ui => "UI",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Identifier> {
        Identifier::ALL.into_iter().find(|id| id.tag() == tag)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame has no '|' separator")]
    MissingSeparator,
    #[error("frame identifier is empty")]
    EmptyIdentifier,
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Encode a frame as `IDENTIFIER|<json>`.
pub fn encode<T: Serialize + ?Sized>(
    identifier: Identifier,
    payload: &T,
) -> Result<String, FrameError> {
    Ok(format!("{}|{}", identifier.tag(), serde_json::to_string(payload)?))
}

/// Encode a frame from an already serialized payload.
pub fn encode_raw(identifier: Identifier, payload: &str) -> String {
    format!("{}|{}", identifier.tag(), payload)
}

/// Split a raw frame at the first `|` into (identifier, payload).
///
/// The identifier is returned as text; an unknown tag still splits fine
/// and is rejected later at dispatch. The payload stays unparsed so a
/// malformed payload for one identifier cannot affect others.
pub fn split(raw: &str) -> Result<(&str, &str), FrameError> {
    let (identifier, payload) = raw.split_once('|').ok_or(FrameError::MissingSeparator)?;
    if identifier.is_empty() {
        return Err(FrameError::EmptyIdentifier);
    }
    Ok((identifier, payload))
}

/// Rotation direction, on the wire as -1 (CCW), 0 (stop), 1 (CW).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Rotation {
    Ccw,
    #[default]
    Stop,
    Cw,
}

impl From<Rotation> for i8 {
    fn from(rotation: Rotation) -> i8 {
        match rotation {
            Rotation::Ccw => -1,
            Rotation::Stop => 0,
            Rotation::Cw => 1,
        }
    }
}

impl TryFrom<i8> for Rotation {
    type Error = String;

    fn try_from(value: i8) -> Result<Rotation, String> {
        match value {
            -1 => Ok(Rotation::Ccw),
            0 => Ok(Rotation::Stop),
            1 => Ok(Rotation::Cw),
            other => Err(format!("invalid rotation value: {other}")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RotationCmd {
    pub rotation: Rotation,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpeedCmd {
    pub speed: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TargetCmd {
    pub target: f64,
    pub use_overlap: bool,
    pub use_smooth_speed: bool,
}

/// Two-point calibration request. The controller derives the offset
/// itself, so outbound calibration carries only the measured points.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CalibrationCmd {
    pub a1: f64,
    pub u1: f64,
    pub a2: f64,
    pub u2: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScreenCmd {
    pub use_screen: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LockMsg {
    #[serde(rename = "isLocked")]
    pub is_locked: bool,
    pub by: String,
}

/// A saved target angle with a dense positional id (1..=N).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Favorite {
    pub id: u32,
    pub name: String,
    pub angle: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn roundtrip_every_identifier() {
        let payload = json!({ "speed": 42, "name": "Nord" });
        for id in Identifier::ALL {
            let frame = encode(id, &payload).unwrap();
            let (tag, raw) = split(&frame).unwrap();
            assert_eq!(Identifier::from_tag(tag), Some(id));
            let decoded: Value = serde_json::from_str(raw).unwrap();
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn split_at_first_pipe_only() {
        let (tag, payload) = split(r#"FAVORITES|[{"id":1,"name":"a|b","angle":0}]"#).unwrap();
        assert_eq!(tag, "FAVORITES");
        assert_eq!(payload, r#"[{"id":1,"name":"a|b","angle":0}]"#);
    }

    #[test]
    fn split_rejects_malformed_frames() {
        assert!(matches!(split("no separator"), Err(FrameError::MissingSeparator)));
        assert!(matches!(split("|{}"), Err(FrameError::EmptyIdentifier)));
    }

    #[test]
    fn unknown_tag_splits_but_does_not_resolve() {
        let (tag, _) = split("BOGUS|{}").unwrap();
        assert_eq!(Identifier::from_tag(tag), None);
    }

    #[test]
    fn rotation_wire_values() {
        assert_eq!(serde_json::to_string(&Rotation::Ccw).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Rotation::Stop).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Rotation::Cw).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Rotation>("1").unwrap(), Rotation::Cw);
        assert!(serde_json::from_str::<Rotation>("2").is_err());
    }

    #[test]
    fn lock_msg_wire_keys() {
        let msg = LockMsg { is_locked: true, by: "tablet-1".to_string() };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"isLocked":true,"by":"tablet-1"}"#
        );
    }

    #[test]
    fn target_cmd_wire_keys() {
        let cmd = TargetCmd { target: 180.0, use_overlap: true, use_smooth_speed: false };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["target"], json!(180.0));
        assert_eq!(value["useOverlap"], json!(true));
        assert_eq!(value["useSmoothSpeed"], json!(false));
    }
}
