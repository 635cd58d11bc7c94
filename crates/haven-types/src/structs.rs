//! Small value types shared by several subsystems.

use serde::{Deserialize, Serialize};

/// An RGB colour with each channel in `[0, 1]`.
///
/// Used for the creature's body colour and for the influence vector a
/// recipe exerts on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

impl Color {
    /// Mid-grey starting colour.
    pub const NEUTRAL: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    /// Build a colour, clamping each channel into `[0, 1]`.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    /// Move `factor` of the way from `self` toward `target`.
    ///
    /// `factor` is clamped to `[0, 1]`; the result stays in range.
    #[must_use]
    pub fn blend_toward(self, target: Self, factor: f64) -> Self {
        let f = clamp_unit(factor);
        Self::new(
            self.r + (target.r - self.r) * f,
            self.g + (target.g - self.g) * f,
            self.b + (target.b - self.b) * f,
        )
    }

    /// Whether every channel is finite and inside `[0, 1]`.
    pub fn is_valid(self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Item or dish quality on a 1--5 star scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Lowest quality.
    pub const MIN: Self = Self(1);
    /// Ordinary quality.
    pub const STANDARD: Self = Self(3);
    /// Highest quality.
    pub const MAX: Self = Self(5);

    /// Build a quality, returning `None` outside `1..=5`.
    pub const fn new(stars: u8) -> Option<Self> {
        if stars >= 1 && stars <= 5 {
            Some(Self(stars))
        } else {
            None
        }
    }

    /// Build a quality from a possibly out-of-range score, clamping to `1..=5`.
    pub fn saturating(score: i32) -> Self {
        let clamped = score.clamp(1, 5);
        Self(u8::try_from(clamped).unwrap_or(3))
    }

    /// Number of stars.
    pub const fn stars(self) -> u8 {
        self.0
    }

    /// One tier lower, never below [`Quality::MIN`].
    #[must_use]
    pub const fn downgraded(self) -> Self {
        if self.0 > 1 { Self(self.0.saturating_sub(1)) } else { self }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TryFrom<u8> for Quality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("quality {value} outside 1..=5"))
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn color_channels_are_clamped() {
        let c = Color::new(1.5, -0.2, f64::NAN);
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));
        assert!(c.is_valid());
    }

    #[test]
    fn blend_moves_partway() {
        let c = Color::NEUTRAL.blend_toward(Color::new(1.0, 0.0, 0.5), 0.5);
        assert!((c.r - 0.75).abs() < 1e-9);
        assert!((c.g - 0.25).abs() < 1e-9);
        assert!((c.b - 0.5).abs() < 1e-9);
    }

    #[test]
    fn quality_saturates_and_downgrades() {
        assert_eq!(Quality::saturating(9), Quality::MAX);
        assert_eq!(Quality::saturating(-3), Quality::MIN);
        assert_eq!(Quality::MIN.downgraded(), Quality::MIN);
        assert_eq!(Quality::MAX.downgraded().stars(), 4);
    }

    #[test]
    fn quality_rejects_out_of_range_json() {
        assert!(serde_json::from_str::<Quality>("0").is_err());
        assert_eq!(serde_json::from_str::<Quality>("4").unwrap().stars(), 4);
    }
}
