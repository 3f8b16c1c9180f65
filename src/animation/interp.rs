use std::f64::consts::PI;

use crate::foundation::core::{ArcPosition, LngLat};

/// Peak height of the arc bump at `t = 0.5`.
pub const ARC_HEIGHT_SCALE: f64 = 20.0;

/// Positional progress: values past 1 belong to the fade-out phase and do not move the point.
pub fn positional_t(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// Sample the arc from `source` to `target` up to `progress`, with the default bump.
///
/// - `steps == 0`: empty.
/// - `steps == 1`: the single position at `t = clamp(progress, 0, 1)`.
/// - `steps > 1`: up to `steps` positions at evenly spaced `t` in `[0, clamp(progress, 0, 1)]`.
pub fn interpolate(source: LngLat, target: LngLat, progress: f64, steps: usize) -> Vec<ArcPosition> {
    interpolate_with_height(source, target, progress, steps, ARC_HEIGHT_SCALE)
}

/// [`interpolate`] with an explicit bump scale.
pub fn interpolate_with_height(
    source: LngLat,
    target: LngLat,
    progress: f64,
    steps: usize,
    arc_height: f64,
) -> Vec<ArcPosition> {
    let end = positional_t(progress);
    match steps {
        0 => Vec::new(),
        1 => vec![position_at(source, target, end, arc_height)],
        _ => {
            let segment = end / (steps - 1) as f64;
            // `min` keeps rounding in `i * segment` from sampling past the current progress; the
            // last sample sits exactly on it.
            (0..steps)
                .map(|i| {
                    let t = if i + 1 == steps {
                        end
                    } else {
                        (i as f64 * segment).min(end)
                    };
                    position_at(source, target, t, arc_height)
                })
                .collect()
        }
    }
}

/// Position at parameter `t` (clamped to `[0, 1]`).
///
/// Endpoints are exact: `t = 0` yields `source` and `t = 1` yields `target`, both at height 0.
pub fn position_at(source: LngLat, target: LngLat, t: f64, arc_height: f64) -> ArcPosition {
    let t = positional_t(t);
    ArcPosition::new(
        lerp(source.lng, target.lng, t),
        lerp(source.lat, target.lat, t),
        bump(t, arc_height),
    )
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

fn bump(t: f64, scale: f64) -> f64 {
    if t <= 0.0 || t >= 1.0 {
        return 0.0;
    }
    (PI * t).sin() * scale
}
