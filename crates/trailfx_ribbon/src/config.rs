//! # Ribbon Configuration
//!
//! Read-only parameters consumed by the engine, loadable from TOML.
//!
//! ```toml
//! history_len = 24
//! subdivisions = 2
//! texture_mode = "distance"
//! texture_length = 4.0
//! tail_alpha = 0.0
//! cross = true
//! ```
//!
//! Every config is validated before use; an invalid config refuses setup
//! instead of being truncated at runtime.

use serde::{Deserialize, Serialize};
use trailfx_core::BufferMode;
use trailfx_shared::constants::{
    DEFAULT_HISTORY_LEN, DEFAULT_MAX_HISTORY_LEN, DEFAULT_MAX_STRIPES,
    DEFAULT_MAX_VERTICES_PER_STRIPE, MAX_SUBDIVISIONS,
};

use crate::error::{RibbonError, RibbonResult};
use crate::vertex::StripeVertex;

/// How texture V advances along the ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMode {
    /// `V = k / (m - 1)` over the backbone points, spacing ignored.
    #[default]
    Uniform,
    /// V advances by travelled distance over `texture_length`.
    Distance,
}

/// How backbone points are produced from history samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneMode {
    /// One backbone point per history sample.
    Direct,
    /// Catmull-Rom points synthesized between consecutive samples.
    Subdivided(u32),
}

/// How the wing (expansion) vector is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripeKind {
    /// Faces the camera. The shader rebuilds the wing from the eye vector;
    /// the CPU wing is the emitter-matrix wing, used as a fallback.
    Billboard,
    /// Wing is `tangent x emitter_y`: the ribbon lies in the emitter's plane.
    #[default]
    EmitterMatrix,
    /// Wing is the emitter's Y axis: the ribbon stands upright.
    EmitterUpDown,
}

/// Which particle position is recorded into history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSpace {
    /// World-space positions; the ribbon stays behind when the emitter moves.
    #[default]
    World,
    /// Emitter-local positions; the whole ribbon follows the emitter.
    Emitter,
}

/// Where the emitter's particles are simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMode {
    /// CPU simulation; ribbons are built by this engine.
    #[default]
    Cpu,
    /// GPU simulation; the framework draws through another path.
    Gpu,
}

/// Static ribbon parameters of one emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonConfig {
    /// Visible history window in samples.
    pub history_len: usize,
    /// Synthesized points between samples, `0` = direct mode.
    pub subdivisions: u32,
    /// Texture V mapping.
    pub texture_mode: TextureMode,
    /// World distance covered by one texture repeat (distance mode).
    pub texture_length: f32,
    /// Alpha at the newest sample.
    pub head_alpha: f32,
    /// Alpha at the oldest sample.
    pub tail_alpha: f32,
    /// Width scale at the newest sample.
    pub head_scale: f32,
    /// Width scale at the oldest sample.
    pub tail_scale: f32,
    /// First blend color (RGBA).
    pub color0: [f32; 4],
    /// Second blend color (RGBA).
    pub color1: [f32; 4],
    /// Ribbon lifetime in ticks, independent of the particle. `None` = particle life.
    pub life: Option<f32>,
    /// Two intersecting planes instead of one.
    pub cross: bool,
    /// Wing derivation.
    pub kind: StripeKind,
    /// Recorded position space.
    pub space: SampleSpace,
    /// Full ribbon width at scale 1.
    pub width: f32,
    /// Ticks between two history samples.
    pub sample_interval: f32,
    /// Direction smoothing factor in `(0, 1]`, `1` = no smoothing.
    pub direction_interpolation: f32,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            subdivisions: 0,
            texture_mode: TextureMode::Uniform,
            texture_length: 1.0,
            head_alpha: 1.0,
            tail_alpha: 0.0,
            head_scale: 1.0,
            tail_scale: 1.0,
            color0: [1.0, 1.0, 1.0, 1.0],
            color1: [1.0, 1.0, 1.0, 1.0],
            life: None,
            cross: false,
            kind: StripeKind::EmitterMatrix,
            space: SampleSpace::World,
            width: 1.0,
            sample_interval: 1.0,
            direction_interpolation: 1.0,
        }
    }
}

impl RibbonConfig {
    /// Parses a ribbon config from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::ConfigParse`] on malformed TOML and any
    /// validation error of [`RibbonConfig::validate`].
    pub fn from_toml_str(source: &str) -> RibbonResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RibbonError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Backbone strategy selected by `subdivisions`.
    #[inline]
    #[must_use]
    pub const fn backbone_mode(&self) -> BackboneMode {
        if self.subdivisions == 0 {
            BackboneMode::Direct
        } else {
            BackboneMode::Subdivided(self.subdivisions)
        }
    }

    /// Strip planes per ribbon.
    #[inline]
    #[must_use]
    pub const fn plane_count(&self) -> usize {
        if self.cross {
            2
        } else {
            1
        }
    }

    /// Backbone points produced from `samples` history samples.
    #[inline]
    #[must_use]
    pub const fn backbone_point_count(&self, samples: usize) -> usize {
        if samples < 2 {
            return samples;
        }
        match self.backbone_mode() {
            BackboneMode::Direct => samples,
            BackboneMode::Subdivided(n) => (samples - 1) * (n as usize + 1) + 1,
        }
    }

    /// Vertices a full ribbon of this config writes.
    #[inline]
    #[must_use]
    pub const fn vertex_count_per_stripe(&self) -> usize {
        self.backbone_point_count(self.history_len) * 2 * self.plane_count()
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::ZeroHistoryLength`] for an empty window and
    /// [`RibbonError::InvalidConfig`] for out-of-range numbers.
    pub fn validate(&self) -> RibbonResult<()> {
        if self.history_len == 0 {
            return Err(RibbonError::ZeroHistoryLength);
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(RibbonError::InvalidConfig(format!(
                "subdivisions {} exceeds {MAX_SUBDIVISIONS}",
                self.subdivisions
            )));
        }
        if self.texture_mode == TextureMode::Distance
            && !(self.texture_length.is_finite() && self.texture_length > 0.0)
        {
            return Err(RibbonError::InvalidConfig(format!(
                "texture_length must be positive, got {}",
                self.texture_length
            )));
        }
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(RibbonError::InvalidConfig(format!(
                "sample_interval must be positive, got {}",
                self.sample_interval
            )));
        }
        if !(self.direction_interpolation > 0.0 && self.direction_interpolation <= 1.0) {
            return Err(RibbonError::InvalidConfig(format!(
                "direction_interpolation must be in (0, 1], got {}",
                self.direction_interpolation
            )));
        }
        if !(self.width.is_finite() && self.width >= 0.0) {
            return Err(RibbonError::InvalidConfig(format!(
                "width must be non-negative, got {}",
                self.width
            )));
        }
        if let Some(life) = self.life {
            if life.is_nan() || life <= 0.0 {
                return Err(RibbonError::InvalidConfig(format!(
                    "life must be positive, got {life}"
                )));
            }
        }
        Ok(())
    }
}

/// One key of a time-based animation: a multiplier at a normalized time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    /// Normalized emitter time in `[0, 1]`.
    pub time: f32,
    /// Multiplier applied to the base value.
    pub value: f32,
}

/// A value that may be animated over the emitter's lifetime.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatedValue {
    /// Unanimated value.
    pub base: f32,
    /// Multiplier keys; empty means constant.
    pub keys: Vec<AnimationKey>,
}

impl AnimatedValue {
    /// A constant value.
    #[must_use]
    pub fn constant(base: f32) -> Self {
        Self {
            base,
            keys: Vec::new(),
        }
    }

    /// Largest value the animation reaches.
    #[must_use]
    pub fn max_value(&self) -> f32 {
        self.keys
            .iter()
            .map(|key| key.value)
            .reduce(f32::max)
            .map_or(self.base, |multiplier| self.base * multiplier)
    }
}

/// Everything the engine reads from an emitter at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Ribbon parameters.
    pub ribbon: RibbonConfig,
    /// Particles emitted per tick.
    pub emit_rate: AnimatedValue,
    /// Particle lifetime in ticks.
    pub particle_life: AnimatedValue,
    /// CPU or GPU simulation.
    pub calc_mode: CalcMode,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            ribbon: RibbonConfig::default(),
            emit_rate: AnimatedValue::constant(1.0),
            particle_life: AnimatedValue::constant(60.0),
            calc_mode: CalcMode::Cpu,
        }
    }
}

impl EmitterConfig {
    /// Parses an emitter config from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::ConfigParse`] on malformed TOML and any
    /// validation error of [`EmitterConfig::validate`].
    pub fn from_toml_str(source: &str) -> RibbonResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RibbonError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the ribbon config and the emission bounds.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::InvalidConfig`] for negative or non-finite
    /// emission bounds.
    pub fn validate(&self) -> RibbonResult<()> {
        self.ribbon.validate()?;
        for (name, value) in [
            ("emit_rate", self.emit_rate.max_value()),
            ("particle_life", self.particle_life.max_value()),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RibbonError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Ribbons this emitter can have alive at once, active or draining.
    ///
    /// A ribbon outlives its particle by up to `history_len` ticks, so the
    /// bound is `ceil(rate_max * (life_max + history_len))`, at least one.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn max_stripe_count(&self) -> usize {
        let rate = self.emit_rate.max_value().max(0.0);
        let life = self.particle_life.max_value().max(0.0);
        let span = life + self.ribbon.history_len as f32;
        ((rate * span).ceil() as usize).max(1)
    }
}

/// System-wide sizing, fixed at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Ribbon slots shared by every emitter.
    pub max_stripes: usize,
    /// Physical history capacity of every slot.
    pub max_history_len: usize,
    /// Vertex slot per ribbon.
    pub max_vertices_per_stripe: usize,
    /// Buffering policy.
    pub buffer_mode: BufferMode,
    /// Explicit vertices per side; `None` derives it from the pool.
    pub vertex_capacity: Option<usize>,
    /// Seed for per-ribbon random vectors.
    pub seed: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_stripes: DEFAULT_MAX_STRIPES,
            max_history_len: DEFAULT_MAX_HISTORY_LEN,
            max_vertices_per_stripe: DEFAULT_MAX_VERTICES_PER_STRIPE,
            buffer_mode: BufferMode::Double,
            vertex_capacity: None,
            seed: 0x5EED_0F_7A11,
        }
    }
}

impl SystemConfig {
    /// Parses a system config from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::ConfigParse`] on malformed TOML and any
    /// validation error of [`SystemConfig::validate`].
    pub fn from_toml_str(source: &str) -> RibbonResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RibbonError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Vertices per side the pool can address, `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn required_vertices(&self) -> Option<usize> {
        self.max_stripes.checked_mul(self.max_vertices_per_stripe)
    }

    /// Checks sizing.
    ///
    /// # Errors
    ///
    /// Returns the matching zero-size error,
    /// [`RibbonError::StoreUndersized`] when an explicit vertex capacity
    /// cannot hold every slot, or [`RibbonError::InvalidConfig`] when the
    /// store size overflows.
    pub fn validate(&self) -> RibbonResult<()> {
        if self.max_stripes == 0 {
            return Err(RibbonError::ZeroStripeCapacity);
        }
        if self.max_history_len == 0 {
            return Err(RibbonError::ZeroHistoryLength);
        }
        if self.max_vertices_per_stripe == 0 {
            return Err(RibbonError::ZeroVertexCount);
        }
        if u32::try_from(self.max_stripes).is_err() {
            return Err(RibbonError::InvalidConfig(format!(
                "max_stripes {} does not fit a slot index",
                self.max_stripes
            )));
        }
        let Some(required) = self.required_vertices() else {
            return Err(RibbonError::InvalidConfig(format!(
                "{} stripes of {} vertices overflow the vertex store",
                self.max_stripes, self.max_vertices_per_stripe
            )));
        };
        let side_len = match self.vertex_capacity {
            Some(capacity) if capacity < required => {
                return Err(RibbonError::StoreUndersized { capacity, required });
            }
            Some(capacity) => capacity,
            None => required,
        };
        let fits = side_len
            .checked_mul(std::mem::size_of::<StripeVertex>())
            .is_some_and(|bytes| bytes <= isize::MAX.unsigned_abs());
        if !fits {
            return Err(RibbonError::InvalidConfig(format!(
                "{side_len} vertices per side exceed addressable memory"
            )));
        }
        Ok(())
    }

    /// Checks that an emitter's ribbon fits this system's slots.
    ///
    /// # Errors
    ///
    /// Returns [`RibbonError::HistoryTooLong`] or
    /// [`RibbonError::VertexCountTooLarge`].
    pub fn check_ribbon(&self, ribbon: &RibbonConfig) -> RibbonResult<()> {
        if ribbon.history_len > self.max_history_len {
            return Err(RibbonError::HistoryTooLong {
                requested: ribbon.history_len,
                capacity: self.max_history_len,
            });
        }
        let required = ribbon.vertex_count_per_stripe();
        if required > self.max_vertices_per_stripe {
            return Err(RibbonError::VertexCountTooLarge {
                required,
                slot: self.max_vertices_per_stripe,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_validate() {
        assert!(RibbonConfig::default().validate().is_ok());
        assert!(EmitterConfig::default().validate().is_ok());
        assert!(SystemConfig::default().validate().is_ok());
        assert!(SystemConfig::default()
            .check_ribbon(&RibbonConfig::default())
            .is_ok());
    }

    #[test]
    fn test_vertex_count_per_stripe() {
        let mut ribbon = RibbonConfig {
            history_len: 8,
            ..Default::default()
        };
        assert_eq!(ribbon.vertex_count_per_stripe(), 16);

        ribbon.cross = true;
        assert_eq!(ribbon.vertex_count_per_stripe(), 32);

        ribbon.cross = false;
        ribbon.subdivisions = 3;
        // 7 segments * 4 points + 1 closing point
        assert_eq!(ribbon.backbone_point_count(8), 29);
        assert_eq!(ribbon.vertex_count_per_stripe(), 58);
        assert_eq!(ribbon.backbone_mode(), BackboneMode::Subdivided(3));
    }

    #[test]
    fn test_zero_history_rejected() {
        let ribbon = RibbonConfig {
            history_len: 0,
            ..Default::default()
        };
        assert_eq!(ribbon.validate(), Err(RibbonError::ZeroHistoryLength));
    }

    #[test]
    fn test_distance_mode_needs_texture_length() {
        let ribbon = RibbonConfig {
            texture_mode: TextureMode::Distance,
            texture_length: 0.0,
            ..Default::default()
        };
        assert!(matches!(ribbon.validate(), Err(RibbonError::InvalidConfig(_))));
    }

    #[test]
    fn test_system_store_undersized() {
        let config = SystemConfig {
            max_stripes: 4,
            max_vertices_per_stripe: 32,
            vertex_capacity: Some(100),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(RibbonError::StoreUndersized {
                capacity: 100,
                required: 128
            })
        );
    }

    #[test]
    fn test_system_store_overflow_rejected() {
        let config = SystemConfig {
            max_stripes: 4,
            max_vertices_per_stripe: usize::MAX / 2,
            ..Default::default()
        };
        assert_eq!(config.required_vertices(), None);
        assert!(matches!(config.validate(), Err(RibbonError::InvalidConfig(_))));

        // Multiplies fine, but not as bytes
        let config = SystemConfig {
            max_stripes: 1,
            max_vertices_per_stripe: usize::MAX / 8,
            ..Default::default()
        };
        assert!(config.required_vertices().is_some());
        assert!(matches!(config.validate(), Err(RibbonError::InvalidConfig(_))));
    }

    #[test]
    fn test_check_ribbon_limits() {
        let system = SystemConfig {
            max_history_len: 8,
            max_vertices_per_stripe: 16,
            ..Default::default()
        };
        let long = RibbonConfig {
            history_len: 9,
            ..Default::default()
        };
        assert!(matches!(
            system.check_ribbon(&long),
            Err(RibbonError::HistoryTooLong { .. })
        ));

        let crossed = RibbonConfig {
            history_len: 8,
            cross: true,
            ..Default::default()
        };
        assert_eq!(
            system.check_ribbon(&crossed),
            Err(RibbonError::VertexCountTooLarge {
                required: 32,
                slot: 16
            })
        );
    }

    #[test]
    fn test_animated_max_and_stripe_budget() {
        let config = EmitterConfig {
            ribbon: RibbonConfig {
                history_len: 10,
                ..Default::default()
            },
            emit_rate: AnimatedValue {
                base: 0.5,
                keys: vec![
                    AnimationKey { time: 0.0, value: 1.0 },
                    AnimationKey { time: 0.5, value: 4.0 },
                    AnimationKey { time: 1.0, value: 0.0 },
                ],
            },
            particle_life: AnimatedValue::constant(20.0),
            calc_mode: CalcMode::Cpu,
        };
        assert_eq!(config.emit_rate.max_value(), 2.0);
        // 2.0 * (20 + 10)
        assert_eq!(config.max_stripe_count(), 60);
    }

    #[test]
    fn test_ribbon_from_toml() {
        let source = r#"
            history_len = 24
            subdivisions = 2
            texture_mode = "distance"
            texture_length = 4.0
            tail_alpha = 0.25
            cross = true
            kind = "emitter_up_down"
            life = 90.0
        "#;
        let ribbon = RibbonConfig::from_toml_str(source).unwrap();
        assert_eq!(ribbon.history_len, 24);
        assert_eq!(ribbon.texture_mode, TextureMode::Distance);
        assert_eq!(ribbon.kind, StripeKind::EmitterUpDown);
        assert_eq!(ribbon.life, Some(90.0));
        assert_eq!(ribbon.head_alpha, 1.0);
    }

    #[test]
    fn test_system_from_toml() {
        let source = r#"
            max_stripes = 4
            max_history_len = 8
            max_vertices_per_stripe = 64
            buffer_mode = "triple"
        "#;
        let system = SystemConfig::from_toml_str(source).unwrap();
        assert_eq!(system.buffer_mode, BufferMode::Triple);
        assert_eq!(system.required_vertices(), Some(256));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = RibbonConfig::from_toml_str("history_len = \"long\"").unwrap_err();
        assert!(matches!(err, RibbonError::ConfigParse(_)));
    }
}
