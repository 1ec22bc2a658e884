use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Body axis of the control cascade.
///
/// The discriminant is the component index used for every per-axis vector
/// (`Vector3` rates, errors and the virtual thrust vector).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Roll = 0,
    Pitch = 1,
    Yaw = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Roll, Axis::Pitch, Axis::Yaw];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// What the outer loop does with an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// The attitude loop computes the target rate for this axis.
    #[default]
    Angle,
    /// The externally commanded target rate passes through untouched.
    Rate,
}

/// Per-axis mode table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisModes(pub [AxisMode; 3]);

impl AxisModes {
    pub const fn uniform(mode: AxisMode) -> Self {
        AxisModes([mode; 3])
    }
}

impl Index<Axis> for AxisModes {
    type Output = AxisMode;

    fn index(&self, axis: Axis) -> &AxisMode {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for AxisModes {
    fn index_mut(&mut self, axis: Axis) -> &mut AxisMode {
        &mut self.0[axis.index()]
    }
}

/// Rotor position on an X-quad, in actuator channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotor {
    FrontRight = 0,
    BackLeft = 1,
    FrontLeft = 2,
    BackRight = 3,
}

impl Rotor {
    pub const ALL: [Rotor; 4] = [
        Rotor::FrontRight,
        Rotor::BackLeft,
        Rotor::FrontLeft,
        Rotor::BackRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One value per rotor, indexed by [`Rotor`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotorPowers(pub [f32; 4]);

impl RotorPowers {
    pub fn min(&self) -> f32 {
        self.0.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.0.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Difference between the most and least loaded rotor.
    pub fn span(&self) -> f32 {
        self.max() - self.min()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rotor, f32)> + '_ {
        Rotor::ALL.iter().map(move |&rotor| (rotor, self[rotor]))
    }
}

impl Index<Rotor> for RotorPowers {
    type Output = f32;

    fn index(&self, rotor: Rotor) -> &f32 {
        &self.0[rotor.index()]
    }
}

impl IndexMut<Rotor> for RotorPowers {
    fn index_mut(&mut self, rotor: Rotor) -> &mut f32 {
        &mut self.0[rotor.index()]
    }
}
