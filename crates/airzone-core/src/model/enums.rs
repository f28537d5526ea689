// ── Wire enumerations ──
//
// The webserver encodes every mode as a small integer. These enums give
// them names; the raw integer stays in the payload.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

/// HVAC operating mode (`mode`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum Mode {
    Stop = 1,
    Cooling = 2,
    Heating = 3,
    Ventilation = 4,
    Dehumidify = 5,
}

impl Mode {
    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// IAQ ventilation mode (`iaq_mode_vent`, `aq_mode`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, FromRepr,
)]
#[repr(u8)]
pub enum VentilationMode {
    Off = 0,
    On = 1,
    Auto = 2,
}

impl VentilationMode {
    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Zone air quality (`aq_quality`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromRepr)]
#[repr(u8)]
pub enum AirQuality {
    Good = 0,
    Medium = 1,
    Poor = 2,
}

impl AirQuality {
    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code).ok().and_then(Self::from_repr)
    }
}

/// Temperature units (`units`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Units {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Self::Fahrenheit,
            _ => Self::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Plausible setpoint range for a residential zone.
    pub fn setpoint_range(self) -> (f64, f64) {
        match self {
            Self::Celsius => (5.0, 35.0),
            Self::Fahrenheit => (41.0, 95.0),
        }
    }
}
