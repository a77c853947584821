//! Attitude kinematics `q̇ = ½ q ⊗ (0, ω)` and its time integration.

use crate::{error::Quantity, EulerAngles, Error, Float, Matrix3, Quaternion, Result, UnitQuaternion, Vector3};

/// Time derivative of the orientation `q` under body-frame angular rate `w` (rad/s).
pub fn attitude_kinematics(q: UnitQuaternion, w: Vector3) -> Quaternion {
    0.5 * (q * Quaternion::pure(w))
}

/// Integration scheme used to advance an orientation by one timestep.
///
/// Every scheme renormalizes its result, since none of them stays on the unit sphere exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegrationMethod {
    /// Forward Euler, one kinematics evaluation per step.
    #[default]
    Euler,
    /// Second-order Runge-Kutta (midpoint rule), two evaluations per step.
    Midpoint,
    /// Classical fourth-order Runge-Kutta, four evaluations per step.
    RungeKutta4,
}

impl IntegrationMethod {
    /// Advances `q` by `dt` seconds at constant angular rate `w`.
    ///
    /// Intermediate states are normalized before the kinematics are evaluated at them.
    pub fn step(self, q: UnitQuaternion, w: Vector3, dt: Float) -> Result<UnitQuaternion> {
        let p = q.quaternion();
        match self {
            IntegrationMethod::Euler => (p + attitude_kinematics(q, w) * dt).normalize(),
            IntegrationMethod::Midpoint => {
                let f1 = attitude_kinematics(q, w);
                let k1 = (p + f1 * (dt / 2.0)).normalize()?;
                let f2 = attitude_kinematics(k1, w);
                (p + f2 * dt).normalize()
            }
            IntegrationMethod::RungeKutta4 => {
                let f1 = attitude_kinematics(q, w);
                let k1 = (p + f1 * (dt / 2.0)).normalize()?;
                let f2 = attitude_kinematics(k1, w);
                let k2 = (p + f2 * (dt / 2.0)).normalize()?;
                let f3 = attitude_kinematics(k2, w);
                let k3 = (p + f3 * dt).normalize()?;
                let f4 = attitude_kinematics(k3, w);
                (p + (f1 + f4) * (dt / 6.0) + (f2 + f3) * (dt / 3.0)).normalize()
            }
        }
    }
}

pub(crate) fn check_timestep(dt: Float) -> Result<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTimestep)
    }
}

/// An orientation propagated from angular rate measurements alone.
///
/// Both filters keep their orientation estimate in one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attitude {
    q: UnitQuaternion,
    method: IntegrationMethod,
}

impl Attitude {
    /// Starts at the identity orientation with forward Euler integration.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_method(method: IntegrationMethod) -> Self {
        Self {
            q: UnitQuaternion::IDENTITY,
            method,
        }
    }

    pub fn from_quaternion(q: UnitQuaternion) -> Self {
        Self {
            q,
            method: Default::default(),
        }
    }

    /// Integrates body-frame angular rate `w` (rad/s) over `dt` seconds.
    ///
    /// On error the orientation is left unchanged.
    pub fn update(&mut self, w: Vector3, dt: Float) -> Result<()> {
        check_timestep(dt)?;
        w.check_finite(Quantity::AngularRate)?;
        self.q = self.method.step(self.q, w, dt)?;
        Ok(())
    }

    pub fn quaternion(&self) -> UnitQuaternion {
        self.q
    }

    pub fn euler_angles(&self) -> EulerAngles {
        self.q.euler_angles()
    }

    pub fn dcm(&self) -> Matrix3 {
        self.q.to_dcm()
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn set_method(&mut self, method: IntegrationMethod) {
        self.method = method;
    }

    pub fn set_quaternion(&mut self, q: UnitQuaternion) {
        self.q = q;
    }

    pub fn set_axis_angle(&mut self, angle: Float, axis: Vector3) -> Result<()> {
        self.q = UnitQuaternion::from_axis_angle(angle, axis)?;
        Ok(())
    }

    pub fn set_euler(&mut self, angles: EulerAngles) -> Result<()> {
        self.q = UnitQuaternion::from_euler(angles)?;
        Ok(())
    }

    pub fn set_dcm(&mut self, dcm: Matrix3) -> Result<()> {
        self.q = UnitQuaternion::from_dcm(dcm)?;
        Ok(())
    }

    /// Returns to the identity orientation, keeping the integration method.
    pub fn reset(&mut self) {
        self.q = UnitQuaternion::IDENTITY;
    }
}
