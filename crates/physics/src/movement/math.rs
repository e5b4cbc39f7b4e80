//! Small vector helpers shared by the movement code.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Add `add` to `velocity`, but never push the component of the result
/// along `add`'s direction past `max_length`.
///
/// If `velocity` already moves faster than `max_length` in that direction
/// nothing is added; nothing is ever taken away either.
pub fn add_clamped(velocity: Vec3, add: Vec3, max_length: f32) -> Vec3 {
    let length = add.length();
    if length <= f32::EPSILON {
        return velocity;
    }

    let dir = add / length;
    let room = max_length - velocity.dot(dir);
    if room <= 0.0 {
        return velocity;
    }

    velocity + dir * length.min(room)
}

/// Remove the component of `v` along `direction` (normalized inside).
pub fn subtract_direction(v: Vec3, direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    v - dir * v.dot(dir)
}

/// Scale `v` down so its length doesn't exceed `max_length`.
pub fn clamp_length(v: Vec3, max_length: f32) -> Vec3 {
    v.clamp_length_max(max_length.max(0.0))
}

/// Closest point to `point` on the infinite line through `origin` along `direction`.
pub fn closest_point_on_line(origin: Vec3, direction: Vec3, point: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    origin + dir * (point - origin).dot(dir)
}

/// `true` if every component of `v` is within `tolerance` of zero.
#[inline]
pub fn is_nearly_zero(v: Vec3, tolerance: f32) -> bool {
    v.abs().max_element() <= tolerance
}

/// A critically damped spring that eases `current` towards `target`.
///
/// A smooth time of zero snaps straight to the target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SmoothDamped {
    pub current: Vec3,
    pub target: Vec3,
    pub velocity: Vec3,
    /// Approximate time to reach the target (seconds).
    pub smooth_time: f32,
}

impl SmoothDamped {
    pub fn new(current: Vec3, target: Vec3, smooth_time: f32) -> Self {
        Self {
            current,
            target,
            velocity: Vec3::ZERO,
            smooth_time,
        }
    }

    /// Advance the spring by `delta_time` seconds and return the new value.
    pub fn update(&mut self, delta_time: f32) -> Vec3 {
        if self.smooth_time <= 0.0 || delta_time <= 0.0 {
            if self.smooth_time <= 0.0 {
                self.current = self.target;
                self.velocity = Vec3::ZERO;
            }
            return self.current;
        }

        let omega = 2.0 / self.smooth_time;
        let x = omega * delta_time;
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

        let change = self.current - self.target;
        let temp = (self.velocity + change * omega) * delta_time;
        self.velocity = (self.velocity - temp * omega) * decay;
        let mut next = self.target + (change + temp) * decay;

        // Never overshoot
        if (self.target - self.current).dot(next - self.target) > 0.0 {
            next = self.target;
            self.velocity = Vec3::ZERO;
        }

        self.current = next;
        next
    }
}
