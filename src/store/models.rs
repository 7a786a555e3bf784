//! Event and run-metadata types, one per storage table (§3).
//!
//! Each kind enum round-trips through the same snake_case strings the
//! source's Python `Enum.value`s used, since those strings are the
//! natural-key material stored on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }
    };
}

string_enum!(AspectType {
    Conjunction => "conjunction",
    Opposition => "opposition",
    Trine => "trine",
    Square => "square",
    Sextile => "sextile",
    Semisextile => "semisextile",
    Quincunx => "quincunx",
    Sesquiquadrate => "sesquiquadrate",
    Semisquare => "semisquare",
    Quintile => "quintile",
    Biquintile => "biquintile",
});

impl AspectType {
    /// All eleven aspect types paired with their ideal angle in degrees.
    pub const ALL_WITH_ANGLE: [(AspectType, f64); 11] = [
        (AspectType::Conjunction, 0.0),
        (AspectType::Opposition, 180.0),
        (AspectType::Trine, 120.0),
        (AspectType::Square, 90.0),
        (AspectType::Sextile, 60.0),
        (AspectType::Semisextile, 30.0),
        (AspectType::Quincunx, 150.0),
        (AspectType::Sesquiquadrate, 135.0),
        (AspectType::Semisquare, 45.0),
        (AspectType::Quintile, 72.0),
        (AspectType::Biquintile, 144.0),
    ];

    /// The five aspects classified as major (6° orb vs. 2° for minor).
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            AspectType::Conjunction
                | AspectType::Opposition
                | AspectType::Trine
                | AspectType::Square
                | AspectType::Sextile
        )
    }

    pub fn max_orb_deg(&self) -> f64 {
        if self.is_major() {
            crate::angle::MAJOR_ASPECT_ORB_DEG
        } else {
            crate::angle::MINOR_ASPECT_ORB_DEG
        }
    }
}

string_enum!(LunarPhaseKind {
    NewMoon => "new_moon",
    FirstQuarter => "first_quarter",
    FullMoon => "full_moon",
    LastQuarter => "last_quarter",
});

impl LunarPhaseKind {
    /// Target moon-minus-sun longitude, degrees.
    pub fn target_angle(&self) -> f64 {
        match self {
            LunarPhaseKind::NewMoon => 0.0,
            LunarPhaseKind::FirstQuarter => 90.0,
            LunarPhaseKind::FullMoon => 180.0,
            LunarPhaseKind::LastQuarter => 270.0,
        }
    }

    pub const ALL: [LunarPhaseKind; 4] = [
        LunarPhaseKind::NewMoon,
        LunarPhaseKind::FirstQuarter,
        LunarPhaseKind::FullMoon,
        LunarPhaseKind::LastQuarter,
    ];
}

string_enum!(PlanetPhaseKind {
    SuperiorConjunction => "superior_conjunction",
    InferiorConjunction => "inferior_conjunction",
    GreatestEasternElongation => "greatest_eastern_elongation",
    GreatestWesternElongation => "greatest_western_elongation",
    StationaryDirect => "stationary_direct",
    StationaryRetrograde => "stationary_retrograde",
});

string_enum!(EclipseKind {
    SolarTotal => "solar_total",
    SolarAnnular => "solar_annular",
    SolarPartial => "solar_partial",
    LunarTotal => "lunar_total",
    LunarPartial => "lunar_partial",
    LunarPenumbral => "lunar_penumbral",
});

impl EclipseKind {
    /// Map the ephemeris's classification bitmask to a kind, defaulting
    /// to the partial variant on an unrecognized combination (§4.4).
    pub fn from_solar_bits(bits: u8) -> EclipseKind {
        if bits & 0b001 != 0 {
            EclipseKind::SolarTotal
        } else if bits & 0b010 != 0 {
            EclipseKind::SolarAnnular
        } else {
            EclipseKind::SolarPartial
        }
    }

    pub fn from_lunar_bits(bits: u8) -> EclipseKind {
        if bits & 0b001 != 0 {
            EclipseKind::LunarTotal
        } else if bits & 0b010 != 0 {
            EclipseKind::LunarPartial
        } else {
            EclipseKind::LunarPenumbral
        }
    }
}

string_enum!(SolarKind {
    SpringEquinox => "spring_equinox",
    SummerSolstice => "summer_solstice",
    FallEquinox => "fall_equinox",
    WinterSolstice => "winter_solstice",
});

impl SolarKind {
    pub fn target_angle(&self) -> f64 {
        match self {
            SolarKind::SpringEquinox => 0.0,
            SolarKind::SummerSolstice => 90.0,
            SolarKind::FallEquinox => 180.0,
            SolarKind::WinterSolstice => 270.0,
        }
    }

    pub const ALL: [SolarKind; 4] = [
        SolarKind::SpringEquinox,
        SolarKind::SummerSolstice,
        SolarKind::FallEquinox,
        SolarKind::WinterSolstice,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    InProgress,
    Complete,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::Complete => "complete",
            RunStatus::Failed => "failed",
        }
    }
}

impl FromStr for RunStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(RunStatus::InProgress),
            "complete" => Ok(RunStatus::Complete),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aspect {
    pub body1_id: i64,
    pub body2_id: i64,
    pub aspect_type: AspectType,
    pub is_major: bool,
    pub year: i32,
    pub applying_timestamp: Option<DateTime<Utc>>,
    pub exact_timestamp: DateTime<Utc>,
    pub separation_timestamp: Option<DateTime<Utc>>,
    pub applying_position1: Option<f64>,
    pub applying_position2: Option<f64>,
    pub exact_position1: f64,
    pub exact_position2: f64,
    pub separation_position1: Option<f64>,
    pub separation_position2: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunarPhase {
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub phase_kind: LunarPhaseKind,
    pub moon_position: f64,
    pub sun_position: f64,
    pub zodiac_sign: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetPhase {
    pub body_id: i64,
    pub phase_kind: PlanetPhaseKind,
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub elongation_degree: Option<f64>,
    pub zodiac_sign: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eclipse {
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub eclipse_kind: EclipseKind,
    pub sun_position: f64,
    pub moon_position: f64,
    pub sun_zodiac: String,
    pub moon_zodiac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarEvent {
    pub timestamp: DateTime<Utc>,
    pub year: i32,
    pub solar_kind: SolarKind,
    pub sun_position: f64,
    pub zodiac_sign: i64,
}

/// A uniform view over all five event kinds, for callers who want a
/// single mixed stream (§9 "tagged-union events vs. table-per-kind").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CalendarEvent {
    Aspect(Aspect),
    LunarPhase(LunarPhase),
    PlanetPhase(PlanetPhase),
    Eclipse(Eclipse),
    SolarEvent(SolarEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start_year: i32,
    pub end_year: i32,
    pub calculation_timestamp: DateTime<Utc>,
    pub status: RunStatus,
    pub events_count: i64,
}
