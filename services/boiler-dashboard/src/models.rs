//! Dashboard value objects and their wire decoding
//!
//! The mobile API speaks snake_case JSON. Each field is decoded on its own and
//! falls back to a default when missing or mistyped, so one bad field never
//! rejects a whole payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current boiler readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerStatus {
    pub water_temp: f64,
    pub pressure: f64,
    pub modulation: f64,
    pub flame_on: bool,
    pub return_temp: Option<f64>,
    pub setpoint: Option<f64>,
    pub enabled: Option<bool>,
}

/// Indoor temperature and the requested target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStatus {
    pub current_temp: f64,
    pub target_temp: f64,
}

/// A window contact sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSensor {
    pub id: String,
    pub name: String,
    pub is_open: bool,
}

/// A heating schedule slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    /// Start time as "HH:MM"
    pub time: String,
    pub temperature: f64,
    pub active: bool,
}

/// Energy consumption figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyData {
    pub current_month: f64,
    pub previous_month: f64,
    pub daily: Vec<f64>,
}

/// The five resources fetched together by one refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    pub boiler: BoilerStatus,
    pub room: RoomStatus,
    pub windows: Vec<WindowSensor>,
    pub schedules: Vec<Schedule>,
    pub energy: EnergyData,
}

fn f64_field(value: &Value, key: &str, default: f64) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn opt_f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn is_true(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool) == Some(true)
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl BoilerStatus {
    /// Decode a `/boiler/status` payload
    pub fn from_wire(value: &Value) -> Self {
        Self {
            water_temp: f64_field(value, "water_temp", 0.0),
            pressure: f64_field(value, "pressure", 0.0),
            modulation: f64_field(value, "modulation", 0.0),
            flame_on: is_true(value, "flame_on"),
            return_temp: opt_f64_field(value, "return_temp"),
            setpoint: opt_f64_field(value, "setpoint"),
            enabled: value.get("enabled").and_then(Value::as_bool),
        }
    }
}

impl RoomStatus {
    /// Combine an `/environment` payload with the boiler setpoint
    pub fn from_wire(environment: &Value, setpoint: Option<f64>) -> Self {
        Self {
            current_temp: f64_field(environment, "indoor_temp", 20.0),
            target_temp: setpoint.unwrap_or(21.0),
        }
    }
}

impl WindowSensor {
    /// Decode the `windows` list of an `/environment` payload; ids are 1-based positions
    pub fn list_from_wire(environment: &Value) -> Vec<Self> {
        array_field(environment, "windows")
            .iter()
            .enumerate()
            .map(|(index, w)| Self {
                id: (index + 1).to_string(),
                name: string_field(w, "room_name"),
                is_open: is_true(w, "is_open"),
            })
            .collect()
    }
}

impl Schedule {
    /// Decode the `schedules` list of a `/schedules` payload
    pub fn list_from_wire(value: &Value) -> Vec<Self> {
        array_field(value, "schedules")
            .iter()
            .map(|s| Self {
                id: string_field(s, "id"),
                time: string_field(s, "time"),
                temperature: f64_field(s, "temperature", 0.0),
                active: is_true(s, "enabled") || is_true(s, "active"),
            })
            .collect()
    }
}

impl EnergyData {
    /// Figures reported after a successful `/history` call.
    ///
    /// The backend gives no derivation from the history series yet, so these
    /// are fixed placeholder figures.
    pub fn placeholder() -> Self {
        Self {
            current_month: 145.0,
            previous_month: 168.0,
            daily: Vec::new(),
        }
    }
}

/// Values shown before the first successful refresh
pub mod fallback {
    use super::*;

    pub fn boiler() -> BoilerStatus {
        BoilerStatus {
            water_temp: 45.0,
            pressure: 1.5,
            modulation: 0.0,
            flame_on: false,
            return_temp: None,
            setpoint: None,
            enabled: None,
        }
    }

    pub fn room() -> RoomStatus {
        RoomStatus {
            current_temp: 20.0,
            target_temp: 21.0,
        }
    }

    pub fn windows() -> Vec<WindowSensor> {
        ["Soggiorno", "Camera", "Cucina", "Bagno"]
            .iter()
            .enumerate()
            .map(|(index, name)| WindowSensor {
                id: (index + 1).to_string(),
                name: name.to_string(),
                is_open: false,
            })
            .collect()
    }

    pub fn schedules() -> Vec<Schedule> {
        [("06:00", 22.0), ("09:00", 19.0), ("17:00", 21.0), ("22:00", 18.0)]
            .iter()
            .enumerate()
            .map(|(index, (time, temperature))| Schedule {
                id: (index + 1).to_string(),
                time: time.to_string(),
                temperature: *temperature,
                active: true,
            })
            .collect()
    }

    pub fn energy() -> EnergyData {
        EnergyData::placeholder()
    }
}
