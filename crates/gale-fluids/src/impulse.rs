use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;
use tracing::warn;

use crate::FluidError;

/// A one-shot external force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    /// Center of the impulse, in normalized field coordinates.
    pub position: Vec2,
    /// Unit direction of the force, or zero for no force.
    pub direction: Vec2,
    /// Velocity added at the center.
    pub magnitude: f32,
    /// Distance from the center at which the force has fallen off to zero.
    pub radius: f32,
}

impl Impulse {
    /// An impulse with no effect. Used on ticks where nothing was requested.
    pub const NONE: Impulse = Impulse {
        position: Vec2::ZERO,
        direction: Vec2::ZERO,
        magnitude: 0.0,
        radius: 0.0,
    };

    /// Validates a wind request. A zero-length direction is accepted and yields a no-op force.
    pub fn new(position: Vec2, direction: Vec2, magnitude: f32, radius: f32) -> Result<Self, FluidError> {
        if !position.is_finite() || !direction.is_finite() {
            return Err(FluidError::InvalidImpulse("position and direction must be finite"));
        }

        if !(magnitude.is_finite() && magnitude > 0.0) {
            return Err(FluidError::InvalidImpulse("magnitude must be finite and strictly positive"));
        }

        if !(radius.is_finite() && radius > 0.0) {
            return Err(FluidError::InvalidImpulse("radius must be finite and strictly positive"));
        }

        Ok(Self {
            position,
            direction: direction.normalize_or_zero(),
            magnitude,
            radius,
        })
    }

    #[inline]
    pub fn is_noop(&self) -> bool {
        self.magnitude == 0.0 || self.radius <= 0.0 || self.direction == Vec2::ZERO
    }

    /// Velocity added at normalized position `p`.
    #[inline]
    pub fn force_at(&self, p: Vec2) -> Vec2 {
        if self.is_noop() {
            return Vec2::ZERO;
        }

        self.direction * self.magnitude * falloff(p.distance(self.position), self.radius)
    }
}

/// `1 - smoothstep(0, radius, d)`: one at the center, zero at and beyond `radius`.
#[inline]
pub fn falloff(d: f32, radius: f32) -> f32 {
    if d >= radius {
        return 0.0;
    }

    let t = d / radius;
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Single pending-impulse slot shared between the simulator and any [`WindHandle`]s.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImpulseSlot(Arc<Mutex<Option<Impulse>>>);

impl ImpulseSlot {
    /// Stores an impulse. Only the most recent request before a step survives.
    pub fn store(&self, impulse: Impulse) {
        if self.0.lock().replace(impulse).is_some() {
            warn!("wind impulse overwritten before it was consumed");
        }
    }

    /// Takes the pending impulse, leaving the slot empty.
    pub fn take(&self) -> Option<Impulse> {
        self.0.lock().take()
    }

    pub fn peek(&self) -> Option<Impulse> {
        *self.0.lock()
    }

    pub fn clear(&self) {
        self.0.lock().take();
    }
}

/// Cloneable, thread-safe endpoint for requesting wind on a simulator.
#[derive(Debug, Clone)]
pub struct WindHandle {
    slot: ImpulseSlot,
}

impl WindHandle {
    pub(crate) fn new(slot: ImpulseSlot) -> Self {
        Self { slot }
    }

    /// Records a one-shot impulse for the next step. See [`crate::FluidSimulator::add_wind`].
    pub fn add_wind(&self, position: Vec2, direction: Vec2, magnitude: f32, radius: f32) -> Result<(), FluidError> {
        self.slot.store(Impulse::new(position, direction, magnitude, radius)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falloff_limits() {
        assert_eq!(falloff(0.0, 0.2), 1.0);
        assert_eq!(falloff(0.2, 0.2), 0.0);
        assert_eq!(falloff(0.5, 0.2), 0.0);
        assert!((falloff(0.1, 0.2) - 0.5).abs() < 1e-6);

        let near_edge = falloff(0.199, 0.2);
        assert!(near_edge > 0.0 && near_edge < 1e-4);
    }

    #[test]
    fn full_magnitude_at_center() {
        let impulse = Impulse::new(Vec2::new(0.5, 0.5), Vec2::new(0.0, -2.0), 3.0, 0.2).unwrap();

        assert_eq!(impulse.direction, Vec2::new(0.0, -1.0));
        assert_eq!(impulse.force_at(Vec2::new(0.5, 0.5)), Vec2::new(0.0, -3.0));
        assert_eq!(impulse.force_at(Vec2::new(0.9, 0.5)), Vec2::ZERO);
    }

    #[test]
    fn zero_direction_is_a_noop() {
        let impulse = Impulse::new(Vec2::new(0.5, 0.5), Vec2::ZERO, 3.0, 0.2).unwrap();

        assert!(impulse.is_noop());
        let f = impulse.force_at(Vec2::new(0.5, 0.5));
        assert_eq!(f, Vec2::ZERO);
        assert!(!f.is_nan());
    }

    #[test]
    fn rejects_degenerate_requests() {
        assert!(Impulse::new(Vec2::ZERO, Vec2::X, 0.0, 0.2).is_err());
        assert!(Impulse::new(Vec2::ZERO, Vec2::X, 1.0, -0.2).is_err());
        assert!(Impulse::new(Vec2::splat(f32::NAN), Vec2::X, 1.0, 0.2).is_err());
    }

    #[test]
    fn slot_is_last_writer_wins_and_consumed_once() {
        let slot = ImpulseSlot::default();
        let handle = WindHandle::new(slot.clone());

        handle.add_wind(Vec2::ZERO, Vec2::X, 1.0, 0.1).unwrap();
        handle.add_wind(Vec2::ONE, Vec2::Y, 2.0, 0.3).unwrap();

        let taken = slot.take().unwrap();
        assert_eq!(taken.magnitude, 2.0);
        assert_eq!(taken.direction, Vec2::Y);
        assert!(slot.take().is_none());
    }
}
