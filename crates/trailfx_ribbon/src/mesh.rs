//! # Strip Mesh Builder
//!
//! Turns a history ring into a triangle strip:
//!
//! ```text
//!   tail                                        head
//!    0 ──── 2 ──── 4 ──── 6 ─ ... ─ 2m-2        (side -1, U = 0)
//!    │ ╲    │ ╲    │ ╲    │           │
//!    1 ──── 3 ──── 5 ──── 7 ─ ... ─ 2m-1        (side +1, U = 1)
//! ```
//!
//! `m` backbone points come straight from the samples (direct) or from a
//! Catmull-Rom curve through them (subdivided). A cross ribbon writes a
//! second plane of `2m` vertices right after the first, rotated 90 degrees
//! around the tangent.
//!
//! The builder writes into a caller-owned slice and never allocates.

use trailfx_core::HistoryRing;
use trailfx_shared::Vec3;

use crate::config::{BackboneMode, RibbonConfig, StripeKind, TextureMode};
use crate::instance::{HistorySample, StripeInstance};
use crate::vertex::{MeshType, StripeConstants, StripeVertex};

/// One evaluated backbone point.
#[derive(Debug, Clone, Copy)]
struct BackbonePoint {
    position: Vec3,
    direction: Vec3,
    wing: Vec3,
    emitter_y: Vec3,
    scale: f32,
    journey: f32,
}

impl BackbonePoint {
    fn from_sample(s: &HistorySample) -> Self {
        Self {
            position: s.position,
            direction: s.direction,
            wing: s.wing,
            emitter_y: s.emitter_y,
            scale: s.scale,
            journey: s.journey,
        }
    }
}

/// Unit wing for a tangent, per ribbon kind.
///
/// Falls back to `fallback` (then to any perpendicular) when the tangent is
/// degenerate or parallel to the emitter Y axis.
#[must_use]
pub fn wing_direction(kind: StripeKind, tangent: Vec3, emitter_y: Vec3, fallback: Vec3) -> Vec3 {
    match kind {
        StripeKind::EmitterUpDown => emitter_y.normalize_or(Vec3::Y),
        StripeKind::EmitterMatrix | StripeKind::Billboard => tangent
            .cross(emitter_y)
            .try_normalize()
            .or_else(|| fallback.try_normalize())
            .unwrap_or_else(|| perpendicular(tangent)),
    }
}

fn perpendicular(v: Vec3) -> Vec3 {
    v.cross(Vec3::X)
        .try_normalize()
        .or_else(|| v.cross(Vec3::Z).try_normalize())
        .unwrap_or(Vec3::Y)
}

/// Evaluates backbone point `k` of `m`.
#[allow(clippy::cast_precision_loss)]
fn backbone_point(ring: &HistoryRing<HistorySample>, mode: BackboneMode, k: usize) -> Option<BackbonePoint> {
    match mode {
        BackboneMode::Direct => ring.get(k).map(BackbonePoint::from_sample),
        BackboneMode::Subdivided(n) => {
            let step = n as usize + 1;
            let segment = k / step;
            let sub = k % step;
            let p1 = ring.get(segment)?;
            let Some(p2) = ring.get(segment + 1) else {
                return Some(BackbonePoint::from_sample(p1));
            };
            if sub == 0 {
                return Some(BackbonePoint::from_sample(p1));
            }
            let p0 = segment.checked_sub(1).and_then(|i| ring.get(i)).unwrap_or(p1);
            let p3 = ring.get(segment + 2).unwrap_or(p2);
            let t = sub as f32 / step as f32;

            Some(BackbonePoint {
                position: Vec3::catmull_rom(p0.position, p1.position, p2.position, p3.position, t),
                direction: p1.direction.lerp(p2.direction, t).normalize_or(p2.direction),
                wing: p1.wing.lerp(p2.wing, t).normalize_or(p2.wing),
                emitter_y: p1.emitter_y.lerp(p2.emitter_y, t).normalize_or(p2.emitter_y),
                scale: p1.scale + (p2.scale - p1.scale) * t,
                journey: p1.journey + (p2.journey - p1.journey) * t,
            })
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Writes the strip for `ring` into `dst`.
///
/// Returns the number of vertices written. Fewer than two samples cannot
/// form a strip and write nothing.
///
/// # Panics
///
/// In debug builds, panics when `dst` is too small for the mesh. Setup
/// validation sizes vertex slots so this cannot happen with a checked
/// config; release builds write nothing instead.
#[allow(clippy::cast_precision_loss)]
pub fn build_strip(ring: &HistoryRing<HistorySample>, config: &RibbonConfig, dst: &mut [StripeVertex]) -> usize {
    let samples = ring.len();
    if samples < 2 {
        return 0;
    }

    let mode = config.backbone_mode();
    let m = config.backbone_point_count(samples);
    let planes = config.plane_count();
    let needed = m * 2 * planes;
    debug_assert!(
        needed <= dst.len(),
        "Strip needs {needed} vertices, slot holds {}",
        dst.len()
    );
    if needed > dst.len() {
        return 0;
    }

    let last = (m - 1) as f32;
    let half_width = config.width * 0.5;

    let mut prev: Option<BackbonePoint> = None;
    let Some(mut current) = backbone_point(ring, mode, 0) else {
        return 0;
    };

    for k in 0..m {
        let next = if k + 1 < m {
            backbone_point(ring, mode, k + 1)
        } else {
            None
        };

        let before = prev.map_or(current.position, |p| p.position);
        let after = next.map_or(current.position, |p| p.position);
        let tangent = (after - before)
            .try_normalize()
            .unwrap_or_else(|| current.direction.normalize_or(Vec3::Z));

        let t = k as f32 / last;
        // V follows the recorded journey
        let tex_v = match config.texture_mode {
            TextureMode::Uniform => t,
            TextureMode::Distance => current.journey / config.texture_length,
        };

        let alpha = lerp(config.tail_alpha, config.head_alpha, t);
        let scale = lerp(config.tail_scale, config.head_scale, t) * current.scale;
        let wing = wing_direction(config.kind, tangent, current.emitter_y, current.wing);
        let extent = half_width * scale;

        for plane in 0..planes {
            let unit = if plane == 0 {
                wing
            } else {
                tangent
                    .cross(wing)
                    .try_normalize()
                    .unwrap_or_else(|| perpendicular(tangent))
            };
            let base = plane * m * 2 + k * 2;
            for (offset, side) in [(0, -1.0f32), (1, 1.0)] {
                dst[base + offset] = StripeVertex {
                    position: current.position.extend(scale),
                    tangent: tangent.extend(alpha),
                    wing: (unit * extent).extend(side),
                    emitter_y: current.emitter_y.extend(plane as f32),
                    tex: [if side < 0.0 { 0.0 } else { 1.0 }, tex_v, t, 0.0],
                };
            }
        }

        prev = Some(current);
        match next {
            Some(n) => current = n,
            None => break,
        }
    }

    needed
}

/// Mesh topology tag for a config.
#[must_use]
pub const fn mesh_type(config: &RibbonConfig) -> MeshType {
    match (config.cross, config.subdivisions) {
        (false, 0) => MeshType::Direct,
        (false, _) => MeshType::Subdivided,
        (true, 0) => MeshType::CrossDirect,
        (true, _) => MeshType::CrossSubdivided,
    }
}

/// Constant block for one ribbon after a rebuild of `vertex_count` vertices.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_constants(instance: &StripeInstance, config: &RibbonConfig, vertex_count: usize) -> StripeConstants {
    let (color0, color1) = instance.colors();
    StripeConstants {
        color0,
        color1,
        random: instance.random(),
        fade: [config.head_alpha, config.tail_alpha, config.head_scale, config.tail_scale],
        params: [
            instance.time(),
            vertex_count as f32,
            mesh_type(config) as u32 as f32,
            instance.life().unwrap_or(0.0),
        ],
        head_position: instance
            .head_position()
            .extend(instance.history_count() as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_along_x(count: usize, spacing: f32) -> HistoryRing<HistorySample> {
        let mut ring = HistoryRing::new(64);
        let mut journey = 0.0;
        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * spacing;
            if i > 0 {
                journey += spacing;
            }
            ring.push(HistorySample {
                position: Vec3::new(x, 0.0, 0.0),
                direction: Vec3::X,
                wing: Vec3::Z,
                emitter_y: Vec3::Y,
                scale: 1.0,
                journey,
            });
        }
        ring
    }

    fn ring_through(points: &[Vec3]) -> HistoryRing<HistorySample> {
        let mut ring = HistoryRing::new(64);
        let mut journey = 0.0;
        for (i, &position) in points.iter().enumerate() {
            if i > 0 {
                journey += position.distance(points[i - 1]);
            }
            ring.push(HistorySample {
                position,
                direction: Vec3::X,
                wing: Vec3::Z,
                emitter_y: Vec3::Y,
                scale: 1.0,
                journey,
            });
        }
        ring
    }

    fn scratch() -> Vec<StripeVertex> {
        vec![StripeVertex::default(); 512]
    }

    #[test]
    fn test_direct_vertex_count() {
        let ring = ring_along_x(5, 1.0);
        let mut dst = scratch();
        let written = build_strip(&ring, &RibbonConfig::default(), &mut dst);
        assert_eq!(written, 10);
    }

    #[test]
    fn test_single_sample_writes_nothing() {
        let ring = ring_along_x(1, 1.0);
        let mut dst = scratch();
        assert_eq!(build_strip(&ring, &RibbonConfig::default(), &mut dst), 0);
    }

    #[test]
    fn test_uniform_v_spacing() {
        let ring = ring_through(&[
            Vec3::ZERO,
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(5.2, 0.0, 0.0),
            Vec3::new(40.0, 0.0, 0.0),
        ]);
        let mut dst = scratch();
        let written = build_strip(&ring, &RibbonConfig::default(), &mut dst);
        for k in 0..written / 2 {
            #[allow(clippy::cast_precision_loss)]
            let expected = k as f32 / 4.0;
            assert!((dst[2 * k].tex_v() - expected).abs() < 1e-6);
            assert_eq!(dst[2 * k].tex_v(), dst[2 * k + 1].tex_v());
        }
    }

    #[test]
    fn test_distance_v_monotonic_and_proportional() {
        let config = RibbonConfig {
            texture_mode: TextureMode::Distance,
            texture_length: 2.0,
            subdivisions: 2,
            ..Default::default()
        };
        let ring = ring_along_x(4, 1.0);
        let mut dst = scratch();
        let written = build_strip(&ring, &config, &mut dst);
        assert_eq!(written, 20);

        let vs: Vec<f32> = (0..written / 2).map(|k| dst[2 * k].tex_v()).collect();
        assert!(vs.windows(2).all(|w| w[1] >= w[0]));
        // 3 units of travel over a 2-unit texture
        assert!((vs[vs.len() - 1] - vs[0] - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_distance_v_anchored_to_journey() {
        let config = RibbonConfig {
            texture_mode: TextureMode::Distance,
            ..Default::default()
        };
        let mut ring = ring_along_x(4, 1.0);
        let mut dst = scratch();
        build_strip(&ring, &config, &mut dst);
        let head_before = dst[6].tex_v();

        // Dropping the tail keeps every surviving point's V
        ring.pop_oldest();
        build_strip(&ring, &config, &mut dst);
        assert!((dst[0].tex_v() - 1.0).abs() < 1e-6);
        assert!((dst[4].tex_v() - head_before).abs() < 1e-6);
    }

    #[test]
    fn test_subdivided_distance_v_survives_tail_drain() {
        let config = RibbonConfig {
            texture_mode: TextureMode::Distance,
            subdivisions: 4,
            ..Default::default()
        };
        let mut ring = ring_through(&[
            Vec3::ZERO,
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(4.0, -1.0, 0.0),
            Vec3::new(6.0, 1.0, 0.0),
            Vec3::new(8.0, -1.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
        ]);
        let head_journey = ring.newest().unwrap().journey;
        let mut dst = scratch();

        let written = build_strip(&ring, &config, &mut dst);
        let before: Vec<f32> = (0..written / 2).map(|k| dst[2 * k].tex_v()).collect();
        assert!((before[before.len() - 1] - head_journey).abs() < 1e-4);
        assert!(before.windows(2).all(|w| w[1] >= w[0]));

        // One segment of 5 points leaves the tail; the rest keep their V
        ring.pop_oldest();
        let written = build_strip(&ring, &config, &mut dst);
        let after: Vec<f32> = (0..written / 2).map(|k| dst[2 * k].tex_v()).collect();
        assert_eq!(after.len(), before.len() - 5);
        for (k, v) in after.iter().enumerate() {
            assert!((v - before[k + 5]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fade_tail_to_head() {
        let config = RibbonConfig {
            head_alpha: 1.0,
            tail_alpha: 0.0,
            head_scale: 2.0,
            tail_scale: 0.5,
            ..Default::default()
        };
        let ring = ring_along_x(3, 1.0);
        let mut dst = scratch();
        build_strip(&ring, &config, &mut dst);

        assert_eq!(dst[0].tangent[3], 0.0);
        assert_eq!(dst[4].tangent[3], 1.0);
        assert_eq!(dst[0].position[3], 0.5);
        assert_eq!(dst[4].position[3], 2.0);
    }

    #[test]
    fn test_wing_perpendicular_and_sided() {
        let ring = ring_along_x(3, 1.0);
        let mut dst = scratch();
        build_strip(&ring, &RibbonConfig::default(), &mut dst);

        let left = dst[2];
        let right = dst[3];
        assert_eq!(left.wing[3], -1.0);
        assert_eq!(right.wing[3], 1.0);
        assert_eq!(left.tex[0], 0.0);
        assert_eq!(right.tex[0], 1.0);

        let wing = Vec3::new(left.wing[0], left.wing[1], left.wing[2]);
        assert!(wing.dot(Vec3::X).abs() < 1e-6);
        // Width 1 at scale 1 → half width 0.5
        assert!((wing.length() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_up_down_wing_follows_emitter_y() {
        let config = RibbonConfig {
            kind: StripeKind::EmitterUpDown,
            ..Default::default()
        };
        let ring = ring_along_x(2, 1.0);
        let mut dst = scratch();
        build_strip(&ring, &config, &mut dst);
        assert_eq!(&dst[0].wing[..3], &[0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_cross_writes_second_plane() {
        let config = RibbonConfig {
            cross: true,
            ..Default::default()
        };
        let ring = ring_along_x(3, 1.0);
        let mut dst = scratch();
        let written = build_strip(&ring, &config, &mut dst);
        assert_eq!(written, 12);

        let first = Vec3::new(dst[0].wing[0], dst[0].wing[1], dst[0].wing[2]);
        let second = Vec3::new(dst[6].wing[0], dst[6].wing[1], dst[6].wing[2]);
        assert!(first.dot(second).abs() < 1e-6);
        assert_eq!(dst[6].emitter_y[3], 1.0);
    }

    #[test]
    fn test_subdivided_passes_through_samples() {
        let config = RibbonConfig {
            subdivisions: 3,
            ..Default::default()
        };
        let ring = ring_along_x(3, 2.0);
        let mut dst = scratch();
        let written = build_strip(&ring, &config, &mut dst);
        // (3 - 1) * 4 + 1 points
        assert_eq!(written, 18);
        assert_eq!(dst[8].position[0], 2.0);
        assert_eq!(dst[16].position[0], 4.0);
        let xs: Vec<f32> = (0..written / 2).map(|k| dst[2 * k].position[0]).collect();
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_undersized_destination_writes_nothing() {
        let ring = ring_along_x(4, 1.0);
        let mut dst = vec![StripeVertex::default(); 4];
        let result = std::panic::catch_unwind(move || build_strip(&ring, &RibbonConfig::default(), &mut dst));
        if cfg!(debug_assertions) {
            assert!(result.is_err());
        } else {
            assert_eq!(result.ok(), Some(0));
        }
    }

    #[test]
    fn test_mesh_type_tags() {
        let mut config = RibbonConfig::default();
        assert_eq!(mesh_type(&config), MeshType::Direct);
        config.cross = true;
        config.subdivisions = 2;
        assert_eq!(mesh_type(&config), MeshType::CrossSubdivided);
    }
}
