use anyhow::{bail, Result};
use glam::Vec3;
use rand::Rng;
use smallvec::SmallVec;

/// Hand-tuned d6 impulses, indexed by outcome - 1. Each one is chosen so the matching face tends
/// to come to rest facing up; none of them are derived from the physics.
pub const D6_IMPULSES: [Vec3; 6] = [
    Vec3::new(23.0, 0.0, 0.0),
    Vec3::new(10.0, 0.0, 0.0),
    Vec3::new(0.0, 23.0, 0.0),
    Vec3::new(0.0, -23.0, 0.0),
    Vec3::new(0.0, 37.0, 0.0),
    Vec3::new(0.0, 20.0, 0.0),
];

/// The d4 only ever gets this straight hop.
pub const D4_IMPULSE: Vec3 = Vec3::new(0.0, 40.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseVector {
    pub direction: Vec3,
    /// Body-local point the impulse is applied at.
    pub application_point: Vec3,
}

impl ImpulseVector {
    pub fn at_origin(direction: Vec3) -> Self {
        Self { direction, application_point: Vec3::ZERO }
    }
}

/// Anything an impulse can be applied to: a physics body handle, or a recorder in tests.
pub trait ImpulseTarget {
    fn apply_impulse(&mut self, impulse: ImpulseVector) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseRoller {
    table: SmallVec<[ImpulseVector; 6]>,
}

impl ImpulseRoller {
    pub fn new(impulses: impl IntoIterator<Item = ImpulseVector>) -> Result<Self> {
        let table: SmallVec<[ImpulseVector; 6]> = impulses.into_iter().collect();
        if table.is_empty() {
            bail!("Impulse table needs at least one outcome");
        }
        if table.iter().any(|i| !i.direction.is_finite() || !i.application_point.is_finite()) {
            bail!("Impulse table contains non-finite vectors");
        }
        Ok(Self { table })
    }

    pub fn d6() -> Self {
        Self { table: D6_IMPULSES.iter().copied().map(ImpulseVector::at_origin).collect() }
    }

    pub fn d4() -> Self {
        Self::single(ImpulseVector::at_origin(D4_IMPULSE))
    }

    pub fn single(impulse: ImpulseVector) -> Self {
        let mut table = SmallVec::new();
        table.push(impulse);
        Self { table }
    }

    pub fn outcome_count(&self) -> u32 {
        self.table.len() as u32
    }

    pub fn impulse_for(&self, outcome: u32) -> Option<ImpulseVector> {
        let index = outcome.checked_sub(1)?;
        self.table.get(index as usize).copied()
    }

    /// Uniform pick in `1..=outcome_count()`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.outcome_count())
    }

    /// Rolls and applies exactly one impulse. Does not wait for the body to settle.
    pub fn roll_and_apply<R, T>(&self, rng: &mut R, target: &mut T) -> Result<u32>
    where
        R: Rng + ?Sized,
        T: ImpulseTarget + ?Sized,
    {
        let outcome = self.roll(rng);
        let impulse = self.table[(outcome - 1) as usize];
        target.apply_impulse(impulse)?;
        tracing::debug!(outcome, direction = ?impulse.direction, "applied roll impulse");
        Ok(outcome)
    }
}
