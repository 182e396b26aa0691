//! Small easing-function table, in the same match-on-enum shape as the
//! teacher's animation-keyframe interpolation.

const ELASTIC_PERIOD: f32 = 0.3;

/// Standard elastic-ease-out: overshoots past 1.0 before settling, used for
/// the selectable-entity entry animation in `PickN` (§4.6).
pub fn elastic_ease_out(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let s = ELASTIC_PERIOD / 4.0;
    2f32.powf(-10.0 * t) * ((t - s) * (2.0 * std::f32::consts::PI) / ELASTIC_PERIOD).sin() + 1.0
}
