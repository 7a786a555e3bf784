//! The fixed celestial-body catalog.
//!
//! Ids are assigned once at startup and referenced by every event row.
//! The eleven bodies below are exactly the set the aspect, lunar-phase,
//! planet-phase, eclipse, and solar-event detectors draw on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A catalog body's broad classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Star,
    Satellite,
    Planet,
    DwarfPlanet,
    LunarNode,
    Asteroid,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Star => "star",
            BodyKind::Satellite => "satellite",
            BodyKind::Planet => "planet",
            BodyKind::DwarfPlanet => "dwarf_planet",
            BodyKind::LunarNode => "lunar_node",
            BodyKind::Asteroid => "asteroid",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the eleven bodies detectors compute positions for.
///
/// Distinct from the catalog's stored integer id: `Body` is the
/// compile-time identity the ephemeris adapter and detectors pass
/// around; `CelestialBody::id` is the store's foreign-key value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    NorthNode,
}

impl Body {
    /// All eleven bodies, in catalog order.
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::NorthNode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::NorthNode => "North Node",
        }
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            Body::Sun => BodyKind::Star,
            Body::Moon => BodyKind::Satellite,
            Body::Pluto => BodyKind::DwarfPlanet,
            Body::NorthNode => BodyKind::LunarNode,
            _ => BodyKind::Planet,
        }
    }

    /// The stable catalog id: `1..=11` in `Body::ALL` order.
    pub fn catalog_id(&self) -> i64 {
        Body::ALL.iter().position(|b| b == self).unwrap() as i64 + 1
    }

    pub fn from_catalog_id(id: i64) -> Option<Body> {
        let idx = usize::try_from(id - 1).ok()?;
        Body::ALL.get(idx).copied()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row in the `celestial_bodies` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: i64,
    pub name: String,
    pub kind: BodyKind,
}

impl From<Body> for CelestialBody {
    fn from(body: Body) -> Self {
        CelestialBody {
            id: body.catalog_id(),
            name: body.name().to_string(),
            kind: body.kind(),
        }
    }
}

/// All 55 unordered pairs of the eleven catalog bodies, canonicalized so
/// `pair.0 < pair.1` by `catalog_id` (see the pair-ordering convention
/// fix in DESIGN.md).
pub fn aspect_pairs() -> Vec<(Body, Body)> {
    let mut pairs = Vec::with_capacity(55);
    for i in 0..Body::ALL.len() {
        for j in (i + 1)..Body::ALL.len() {
            pairs.push((Body::ALL[i], Body::ALL[j]));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_stable_and_one_based() {
        assert_eq!(Body::Sun.catalog_id(), 1);
        assert_eq!(Body::NorthNode.catalog_id(), 11);
        assert_eq!(Body::from_catalog_id(1), Some(Body::Sun));
        assert_eq!(Body::from_catalog_id(11), Some(Body::NorthNode));
        assert_eq!(Body::from_catalog_id(12), None);
    }

    #[test]
    fn aspect_pairs_has_fifty_five_canonical_pairs() {
        let pairs = aspect_pairs();
        assert_eq!(pairs.len(), 55);
        for (a, b) in &pairs {
            assert!(a.catalog_id() < b.catalog_id());
        }
    }
}
