//! Static obstacles: the sun and planets

use serde::Serialize;

use super::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    Sun,
    Planet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Atmosphere {
    pub color: u32,
    pub opacity: f32,
    pub scale: f32,
}

/// A body ships crash into. Only position and radius matter to the
/// simulation; the rest is forwarded to clients for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CelestialBody {
    #[serde(rename = "type")]
    pub kind: BodyKind,
    /// Shown as the attacker when a ship crashes here
    pub name: &'static str,
    #[serde(flatten)]
    pub position: Vec3,
    pub radius: f32,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring: Option<Ring>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atmosphere: Option<Atmosphere>,
}

impl CelestialBody {
    fn planet(name: &'static str, position: Vec3, radius: f32, color: u32) -> Self {
        Self {
            kind: BodyKind::Planet,
            name,
            position,
            radius,
            color,
            emissive: None,
            ring: None,
            atmosphere: None,
        }
    }

    fn with_atmosphere(mut self, color: u32, opacity: f32, scale: f32) -> Self {
        self.atmosphere = Some(Atmosphere {
            color,
            opacity,
            scale,
        });
        self
    }
}

/// The fixed solar system every session uses
pub fn default_bodies() -> Vec<CelestialBody> {
    vec![
        CelestialBody {
            kind: BodyKind::Sun,
            name: "the Sun",
            position: Vec3::new(300.0, 80.0, -200.0),
            radius: 30.0,
            color: 0xffaa00,
            emissive: Some(0xffdd44),
            ring: None,
            atmosphere: None,
        },
        CelestialBody::planet("Cobalt", Vec3::new(-250.0, -30.0, 150.0), 12.0, 0x4477aa),
        CelestialBody {
            ring: Some(Ring {
                inner_radius: 24.0,
                outer_radius: 34.0,
                color: 0xddaa66,
            }),
            ..CelestialBody::planet("Saffron", Vec3::new(100.0, 50.0, -350.0), 18.0, 0xcc8844)
        },
        CelestialBody::planet("Cinder", Vec3::new(-80.0, 120.0, -500.0), 6.0, 0xbb4422),
        CelestialBody::planet("Verdance", Vec3::new(450.0, -60.0, 300.0), 25.0, 0x2a4a2a)
            .with_atmosphere(0x44aa55, 0.2, 1.12),
        CelestialBody::planet("Pale Moon", Vec3::new(-400.0, 10.0, -100.0), 4.0, 0xccccaa),
        CelestialBody::planet("Forge", Vec3::new(200.0, -120.0, 500.0), 10.0, 0x332211)
            .with_atmosphere(0xff4400, 0.12, 1.15),
        CelestialBody::planet("Dune", Vec3::new(-350.0, 90.0, -400.0), 15.0, 0xddaa33),
        CelestialBody::planet("Amethyst", Vec3::new(380.0, 140.0, -150.0), 8.0, 0x7733aa)
            .with_atmosphere(0xaa66dd, 0.15, 1.1),
    ]
}
