//! Mission descriptors: the decrypted plaintext shape, the assembled
//! mission, and the record published on the mission channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use strum::EnumString;

/// Mission name used when the plaintext has none.
pub const DEFAULT_MISSION_NAME: &str = "Unknown";

/// Mission duration used when the plaintext has none.
pub const DEFAULT_MAX_DURATION_MINUTES: u32 = 30;

/// Waypoint altitude in metres used when the plaintext has none.
pub const DEFAULT_ALTITUDE: f64 = 50.0;

macro_rules! mission_tag {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
        pub enum $name {
            $($(#[$vmeta])* #[strum(serialize = $wire)] $variant,)+
            /// A tag this build does not know, carried through verbatim.
            #[strum(default)]
            Other(String),
        }

        impl $name {
            /// Wire spelling of the tag.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

mission_tag! {
    /// Kind of mission.
    MissionType, default = Recon, {
        /// Reconnaissance.
        Recon => "RECON",
        /// Strike.
        Strike => "STRIKE",
        /// Escort.
        Escort => "ESCORT",
        /// Training sortie.
        Training => "TRAINING",
    }
}

mission_tag! {
    /// Flight profile priority.
    MissionPriority, default = None, {
        /// Minimise emissions; planners disallow GPS for this profile.
        Stealth => "STEALTH",
        /// Minimise time.
        Speed => "SPEED",
        /// No preference.
        None => "NONE",
    }
}

mission_tag! {
    /// Action performed on reaching a waypoint.
    WaypointAction, default = Hover, {
        /// Hold position.
        Hover => "HOVER",
        /// Run a sensor sweep.
        Scan => "SCAN",
        /// Release payload.
        Drop => "DROP",
        /// Return to home.
        Rth => "RTH",
    }
}

/// Mission JSON as it appears inside the ciphertext.
///
/// Every field is optional; the assembler supplies defaults. Fields that are
/// present must have the right JSON type or decryption is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPlaintext {
    /// Mission name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mission type tag.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mission_type: Option<String>,
    /// Priority tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Ordered waypoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<WaypointPlaintext>>,
    /// Maximum mission duration in minutes. Non-positive values take the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<i64>,
    /// Whether GPS may be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_allowed: Option<bool>,
}

/// Waypoint as it appears inside the ciphertext.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointPlaintext {
    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Altitude in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,
    /// Action tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// One normalized waypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    /// Zero-based position in the mission.
    pub index: u32,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: f64,
    /// Action on arrival.
    pub action: WaypointAction,
}

/// An authenticated, normalized mission.
///
/// Only [`assemble`] creates one, from successfully decrypted plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedMission {
    name: String,
    mission_type: MissionType,
    priority: MissionPriority,
    waypoints: Vec<Waypoint>,
    max_duration_minutes: u32,
    gps_allowed: bool,
}

impl DecryptedMission {
    /// Mission name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mission type.
    #[must_use]
    pub const fn mission_type(&self) -> &MissionType {
        &self.mission_type
    }

    /// Priority.
    #[must_use]
    pub const fn priority(&self) -> &MissionPriority {
        &self.priority
    }

    /// Waypoints in flight order.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Maximum duration in minutes.
    #[must_use]
    pub const fn max_duration_minutes(&self) -> u32 {
        self.max_duration_minutes
    }

    /// Whether GPS may be used.
    #[must_use]
    pub const fn gps_allowed(&self) -> bool {
        self.gps_allowed
    }

    /// Converts into the mission-channel record, consuming the mission.
    #[must_use]
    pub fn into_record(self) -> MissionRecord {
        MissionRecord {
            name: self.name,
            mission_type: self.mission_type,
            priority: self.priority,
            gps_allowed: self.gps_allowed,
            max_duration_sec: u64::from(self.max_duration_minutes) * 60,
            waypoints: self.waypoints,
        }
    }
}

/// Record published on the mission channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRecord {
    /// Mission name.
    pub name: String,
    /// Mission type tag.
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    /// Priority tag.
    pub priority: MissionPriority,
    /// Whether GPS may be used.
    pub gps_allowed: bool,
    /// Maximum duration in seconds.
    pub max_duration_sec: u64,
    /// Waypoints in flight order.
    pub waypoints: Vec<Waypoint>,
}

fn parse_tag<T: FromStr + Default>(raw: Option<String>) -> T {
    raw.filter(|tag| !tag.is_empty())
        .and_then(|tag| tag.parse().ok())
        .unwrap_or_default()
}

/// Normalizes decrypted plaintext into a [`DecryptedMission`].
///
/// Never fails: absent fields take their defaults and waypoints keep their
/// input order.
#[must_use]
pub fn assemble(plaintext: MissionPlaintext) -> DecryptedMission {
    let waypoints = plaintext
        .waypoints
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(position, waypoint)| Waypoint {
            index: u32::try_from(position).unwrap_or(u32::MAX),
            latitude: waypoint.lat.unwrap_or(0.0),
            longitude: waypoint.lon.unwrap_or(0.0),
            altitude: waypoint.alt.unwrap_or(DEFAULT_ALTITUDE),
            action: parse_tag(waypoint.action),
        })
        .collect();

    DecryptedMission {
        name: plaintext
            .name
            .unwrap_or_else(|| DEFAULT_MISSION_NAME.to_string()),
        mission_type: parse_tag(plaintext.mission_type),
        priority: parse_tag(plaintext.priority),
        waypoints,
        max_duration_minutes: plaintext
            .max_duration
            .filter(|minutes| *minutes > 0)
            .map_or(DEFAULT_MAX_DURATION_MINUTES, |minutes| {
                u32::try_from(minutes).unwrap_or(u32::MAX)
            }),
        gps_allowed: plaintext.gps_allowed.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Some(-5), 30 ; "negative")]
    #[test_case(Some(0), 30 ; "zero")]
    #[test_case(Some(90), 90 ; "positive")]
    #[test_case(Some(i64::MAX), u32::MAX ; "saturates")]
    fn test_max_duration_normalization(raw: Option<i64>, expected: u32) {
        let mission = assemble(MissionPlaintext {
            max_duration: raw,
            ..MissionPlaintext::default()
        });
        assert_eq!(mission.max_duration_minutes(), expected);
    }

    #[test]
    fn test_negative_max_duration_deserializes() {
        let plaintext: MissionPlaintext =
            serde_json::from_str(r#"{"name":"Sweep","maxDuration":-5}"#).expect("parse");
        assert_eq!(plaintext.max_duration, Some(-5));
        assert_eq!(assemble(plaintext).max_duration_minutes(), 30);
    }

    #[test]
    fn test_defaults_for_empty_plaintext() {
        let mission = assemble(MissionPlaintext::default());
        assert_eq!(mission.name(), "Unknown");
        assert_eq!(mission.mission_type(), &MissionType::Recon);
        assert_eq!(mission.priority(), &MissionPriority::None);
        assert!(mission.waypoints().is_empty());
        assert_eq!(mission.max_duration_minutes(), 30);
        assert!(!mission.gps_allowed());
    }

    #[test]
    fn test_waypoints_keep_order_and_defaults() {
        let plaintext: MissionPlaintext = serde_json::from_str(
            r#"{
                "name": "Ridge Sweep",
                "type": "STRIKE",
                "priority": "STEALTH",
                "maxDuration": 45,
                "gpsAllowed": true,
                "waypoints": [
                    {"lat": 48.85, "lon": 2.35, "alt": 120, "action": "SCAN"},
                    {"lat": 48.86, "lon": 2.36},
                    {"lat": 48.87, "lon": 2.37, "action": "RTH"}
                ]
            }"#,
        )
        .expect("plaintext");
        let mission = assemble(plaintext);

        assert_eq!(mission.name(), "Ridge Sweep");
        assert_eq!(mission.mission_type(), &MissionType::Strike);
        assert_eq!(mission.priority(), &MissionPriority::Stealth);
        assert_eq!(mission.max_duration_minutes(), 45);
        assert!(mission.gps_allowed());

        let waypoints = mission.waypoints();
        assert_eq!(waypoints.len(), 3);
        assert_eq!(
            waypoints.iter().map(|wp| wp.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!((waypoints[0].latitude - 48.85).abs() < f64::EPSILON);
        assert!((waypoints[0].altitude - 120.0).abs() < f64::EPSILON);
        assert_eq!(waypoints[0].action, WaypointAction::Scan);
        assert!((waypoints[1].altitude - DEFAULT_ALTITUDE).abs() < f64::EPSILON);
        assert_eq!(waypoints[1].action, WaypointAction::Hover);
        assert_eq!(waypoints[2].action, WaypointAction::Rth);
    }

    #[test]
    fn test_unknown_tags_are_preserved() {
        let mission = assemble(MissionPlaintext {
            mission_type: Some("SURVEY".to_string()),
            priority: Some(String::new()),
            waypoints: Some(vec![WaypointPlaintext {
                action: Some("LOITER".to_string()),
                ..WaypointPlaintext::default()
            }]),
            ..MissionPlaintext::default()
        });
        assert_eq!(mission.mission_type(), &MissionType::Other("SURVEY".to_string()));
        assert_eq!(mission.mission_type().as_str(), "SURVEY");
        assert_eq!(mission.priority(), &MissionPriority::None);
        assert_eq!(mission.waypoints()[0].action.to_string(), "LOITER");
        assert!(mission.waypoints()[0].latitude.abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_wire_shape() {
        let mission = assemble(MissionPlaintext {
            name: Some("Alpha".to_string()),
            max_duration: Some(12),
            waypoints: Some(vec![WaypointPlaintext {
                lat: Some(1.5),
                lon: Some(-2.5),
                alt: Some(10.0),
                action: Some("DROP".to_string()),
            }]),
            ..MissionPlaintext::default()
        });
        let json = serde_json::to_value(mission.into_record()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Alpha",
                "type": "RECON",
                "priority": "NONE",
                "gpsAllowed": false,
                "maxDurationSec": 720,
                "waypoints": [
                    {"index": 0, "latitude": 1.5, "longitude": -2.5, "altitude": 10.0, "action": "DROP"}
                ]
            })
        );
    }

    #[test]
    fn test_plaintext_rejects_wrong_types() {
        assert!(serde_json::from_str::<MissionPlaintext>(r#"{"gpsAllowed":"yes"}"#).is_err());
        assert!(serde_json::from_str::<MissionPlaintext>(r#"{"waypoints":{}}"#).is_err());
        assert!(serde_json::from_str::<MissionPlaintext>(r#"{"waypoints":null}"#).is_ok());
    }
}
