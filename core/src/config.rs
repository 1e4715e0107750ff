//! Explorer configuration.

use serde::Deserialize;

/// Default Chebyshev radius, in cells, of the ring marked as known.
pub const DEFAULT_KNOWN_RADIUS: i32 = 7;

/// Default Chebyshev radius, in cells, of the square marked as seen.
pub const DEFAULT_SEEN_RADIUS: i32 = 5;

/// Smallest accepted radius; lower values are clamped up to it.
pub const MIN_RADIUS: i32 = 1;

/// Tunables that shape how the explorer scans and resets.
///
/// Radii below [`MIN_RADIUS`] are silently clamped, whether they arrive
/// through [`ExplorerConfig::new`], a setter, or deserialisation. The seen
/// radius is deliberately not checked against the known radius: a seen radius
/// at least as large as the known radius collapses the outer ring to nothing,
/// so no cell is ever promoted to known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "ConfigFields")]
pub struct ExplorerConfig {
    auto_reset_on_area_change: bool,
    known_radius: i32,
    seen_radius: i32,
}

impl ExplorerConfig {
    /// Creates a configuration, clamping both radii.
    #[must_use]
    pub fn new(auto_reset_on_area_change: bool, known_radius: i32, seen_radius: i32) -> Self {
        Self {
            auto_reset_on_area_change,
            known_radius: clamp_radius(known_radius),
            seen_radius: clamp_radius(seen_radius),
        }
    }

    /// Whether a changed area hash triggers a rebuild on the next tick.
    #[must_use]
    pub const fn auto_reset_on_area_change(&self) -> bool {
        self.auto_reset_on_area_change
    }

    /// Outer scan radius in cells.
    #[must_use]
    pub const fn known_radius(&self) -> i32 {
        self.known_radius
    }

    /// Inner scan radius in cells.
    #[must_use]
    pub const fn seen_radius(&self) -> i32 {
        self.seen_radius
    }

    /// Toggles automatic rebuilds on area change.
    pub fn set_auto_reset_on_area_change(&mut self, enabled: bool) {
        self.auto_reset_on_area_change = enabled;
    }

    /// Updates the outer scan radius and returns the effective value.
    pub fn set_known_radius(&mut self, radius: i32) -> i32 {
        self.known_radius = clamp_radius(radius);
        self.known_radius
    }

    /// Updates the inner scan radius and returns the effective value.
    pub fn set_seen_radius(&mut self, radius: i32) -> i32 {
        self.seen_radius = clamp_radius(radius);
        self.seen_radius
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::new(true, DEFAULT_KNOWN_RADIUS, DEFAULT_SEEN_RADIUS)
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFields {
    auto_reset_on_area_change: bool,
    known_radius: i32,
    seen_radius: i32,
}

impl Default for ConfigFields {
    fn default() -> Self {
        Self {
            auto_reset_on_area_change: true,
            known_radius: DEFAULT_KNOWN_RADIUS,
            seen_radius: DEFAULT_SEEN_RADIUS,
        }
    }
}

impl From<ConfigFields> for ExplorerConfig {
    fn from(fields: ConfigFields) -> Self {
        Self::new(
            fields.auto_reset_on_area_change,
            fields.known_radius,
            fields.seen_radius,
        )
    }
}

fn clamp_radius(radius: i32) -> i32 {
    radius.max(MIN_RADIUS)
}
