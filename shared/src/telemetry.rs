//! Telemetry Snapshot
//!
//! An immutable, fully parsed set of status fields from one telemetry
//! datagram. Snapshots are built by [`crate::codec::parse_telemetry`] and
//! never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use crate::limits;

/// Fields documented for the device's status datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryField {
    Pitch,
    Roll,
    Yaw,
    Vgx,
    Vgy,
    Vgz,
    TempLow,
    TempHigh,
    Tof,
    Height,
    Battery,
    Barometer,
    MotorTime,
    Agx,
    Agy,
    Agz,
}

impl TelemetryField {
    /// All documented fields, in wire order
    pub const ALL: [TelemetryField; 16] = [
        Self::Pitch,
        Self::Roll,
        Self::Yaw,
        Self::Vgx,
        Self::Vgy,
        Self::Vgz,
        Self::TempLow,
        Self::TempHigh,
        Self::Tof,
        Self::Height,
        Self::Battery,
        Self::Barometer,
        Self::MotorTime,
        Self::Agx,
        Self::Agy,
        Self::Agz,
    ];

    /// Name of the field as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Roll => "roll",
            Self::Yaw => "yaw",
            Self::Vgx => "vgx",
            Self::Vgy => "vgy",
            Self::Vgz => "vgz",
            Self::TempLow => "templ",
            Self::TempHigh => "temph",
            Self::Tof => "tof",
            Self::Height => "h",
            Self::Battery => "bat",
            Self::Barometer => "baro",
            Self::MotorTime => "time",
            Self::Agx => "agx",
            Self::Agy => "agy",
            Self::Agz => "agz",
        }
    }

    /// Look up a field by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pitch, roll and yaw in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attitude {
    pub pitch: i64,
    pub roll: i64,
    pub yaw: i64,
}

/// A three-axis reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One complete telemetry datagram, parsed
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    fields: BTreeMap<String, String>,
    received_at_ms: u64,
}

impl TelemetrySnapshot {
    /// Build a snapshot from already-validated `name -> value` pairs
    pub fn new(fields: BTreeMap<String, String>, received_at_ms: u64) -> Self {
        Self {
            fields,
            received_at_ms,
        }
    }

    /// Raw textual value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Value of a documented field
    pub fn field(&self, field: TelemetryField) -> Option<&str> {
        self.get(field.as_str())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.parse().ok()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.parse().ok()
    }

    /// All fields in name order
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// When the datagram was parsed (ms since Unix epoch)
    pub fn received_at_ms(&self) -> u64 {
        self.received_at_ms
    }

    pub fn battery_percent(&self) -> Option<u8> {
        self.get_i64("bat").and_then(|v| u8::try_from(v).ok())
    }

    pub fn height_cm(&self) -> Option<i64> {
        self.get_i64("h")
    }

    pub fn tof_cm(&self) -> Option<i64> {
        self.get_i64("tof")
    }

    pub fn barometer_cm(&self) -> Option<f64> {
        self.get_f64("baro")
    }

    pub fn motor_time(&self) -> Option<i64> {
        self.get_i64("time")
    }

    /// Lowest and highest temperature, °C
    pub fn temperature_range(&self) -> Option<(i64, i64)> {
        Some((self.get_i64("templ")?, self.get_i64("temph")?))
    }

    pub fn attitude(&self) -> Option<Attitude> {
        Some(Attitude {
            pitch: self.get_i64("pitch")?,
            roll: self.get_i64("roll")?,
            yaw: self.get_i64("yaw")?,
        })
    }

    pub fn velocity(&self) -> Option<Vector3> {
        self.vector("vgx", "vgy", "vgz")
    }

    pub fn acceleration(&self) -> Option<Vector3> {
        self.vector("agx", "agy", "agz")
    }

    fn vector(&self, x: &str, y: &str, z: &str) -> Option<Vector3> {
        Some(Vector3 {
            x: self.get_f64(x)?,
            y: self.get_f64(y)?,
            z: self.get_f64(z)?,
        })
    }

    /// Check this snapshot against warning thresholds
    ///
    /// Fields that are missing or not numeric are not reported.
    pub fn alerts(&self, limits: &TelemetryLimits) -> Vec<TelemetryAlert> {
        let mut alerts = Vec::new();

        if let Some(percent) = self.battery_percent() {
            if percent < limits.min_battery_percent {
                alerts.push(TelemetryAlert::LowBattery { percent });
            }
        }

        if let Some(celsius) = self.get_i64("templ") {
            if celsius > limits.max_temperature_low {
                alerts.push(TelemetryAlert::HighTemperature {
                    field: TelemetryField::TempLow,
                    celsius,
                });
            }
        }

        if let Some(celsius) = self.get_i64("temph") {
            if celsius > limits.max_temperature_high {
                alerts.push(TelemetryAlert::HighTemperature {
                    field: TelemetryField::TempHigh,
                    celsius,
                });
            }
        }

        alerts
    }
}

/// Thresholds for [`TelemetrySnapshot::alerts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryLimits {
    pub min_battery_percent: u8,
    pub max_temperature_low: i64,
    pub max_temperature_high: i64,
}

impl Default for TelemetryLimits {
    fn default() -> Self {
        Self {
            min_battery_percent: limits::BATTERY_LOW_PERCENT,
            max_temperature_low: limits::TEMPERATURE_LOW_MAX,
            max_temperature_high: limits::TEMPERATURE_HIGH_MAX,
        }
    }
}

/// A telemetry value outside its threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryAlert {
    LowBattery { percent: u8 },
    HighTemperature { field: TelemetryField, celsius: i64 },
}

impl fmt::Display for TelemetryAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowBattery { percent } => write!(f, "battery low: {}%", percent),
            Self::HighTemperature { field, celsius } => {
                write!(f, "temperature high: {}={}°C", field, celsius)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> TelemetrySnapshot {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetrySnapshot::new(fields, 1)
    }

    #[test]
    fn test_field_names() {
        assert_eq!(TelemetryField::Battery.as_str(), "bat");
        assert_eq!(TelemetryField::Height.as_str(), "h");
        assert_eq!(TelemetryField::from_name("temph"), Some(TelemetryField::TempHigh));
        assert_eq!(TelemetryField::from_name("mid"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let snap = snapshot(&[
            ("pitch", "1"),
            ("roll", "-2"),
            ("yaw", "90"),
            ("bat", "87"),
            ("baro", "101.25"),
            ("agx", "0.00"),
            ("agy", "1.50"),
            ("agz", "-1000.00"),
        ]);

        assert_eq!(snap.battery_percent(), Some(87));
        assert_eq!(snap.barometer_cm(), Some(101.25));
        assert_eq!(
            snap.attitude(),
            Some(Attitude {
                pitch: 1,
                roll: -2,
                yaw: 90
            })
        );
        assert_eq!(snap.acceleration().map(|a| a.z), Some(-1000.0));
        assert!(snap.velocity().is_none());
        assert!(snap.height_cm().is_none());
    }

    #[test]
    fn test_non_numeric_value_is_kept_as_text() {
        let snap = snapshot(&[("bat", "n/a")]);
        assert_eq!(snap.get("bat"), Some("n/a"));
        assert_eq!(snap.battery_percent(), None);
    }

    #[test]
    fn test_alerts() {
        let limits = TelemetryLimits::default();

        let healthy = snapshot(&[("bat", "50"), ("templ", "60"), ("temph", "65")]);
        assert!(healthy.alerts(&limits).is_empty());

        let hot = snapshot(&[("bat", "10"), ("templ", "60"), ("temph", "85")]);
        let alerts = hot.alerts(&limits);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0], TelemetryAlert::LowBattery { percent: 10 });
        assert_eq!(
            alerts[1],
            TelemetryAlert::HighTemperature {
                field: TelemetryField::TempHigh,
                celsius: 85
            }
        );
    }
}
