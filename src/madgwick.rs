use log::{debug, warn};

use crate::{
    attitude_kinematics, error::Quantity, kinematics::check_timestep, sqrt, square, Attitude, EulerAngles, Error,
    Float, IntegrationMethod, Matrix3, Quaternion, Result, UnitQuaternion, Vector3,
};

/// Gains of the gradient-descent filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MadgwickGains {
    /// Scales the gradient-descent step size relative to the rate of change of the orientation.
    ///
    /// Default value: 2.0
    pub alpha: Float,

    /// Blend between the gradient-descent estimate and the gyroscope prediction. Large values trust the
    /// accelerometer and magnetometer, small values trust the gyroscope. Must be strictly positive.
    ///
    /// Default value: 2.0
    pub beta: Float,

    /// Gyroscope bias learning rate.
    ///
    /// Default value: 2.0
    pub zeta: Float,
}

impl Default for MadgwickGains {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            beta: 2.0,
            zeta: 2.0,
        }
    }
}

impl MadgwickGains {
    fn validate(&self) -> Result<()> {
        let valid = |g: Float| g.is_finite() && g >= 0.0;
        if valid(self.alpha) && valid(self.zeta) && valid(self.beta) && self.beta > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidGain)
        }
    }
}

/// Gradient-descent attitude filter for accelerometer + magnetometer input.
///
/// Gravity is expected along `+z` of the inertial frame. The magnetic reference is rebuilt on every step from the
/// current orientation and the measured field as `(bx, 0, bz)`, so only the horizontal heading of the field is
/// used and its inclination does not need to be known.
///
/// Each step combines a gradient-descent correction of the orientation, whose step length adapts to the rate of
/// change of the orientation, with a gyroscope prediction that has the estimated bias removed.
#[derive(Clone, Debug)]
pub struct Madgwick {
    gains: MadgwickGains,
    attitude: Attitude,
    bias: Vector3,
}

impl Default for Madgwick {
    fn default() -> Self {
        Self {
            gains: Default::default(),
            attitude: Attitude::new(),
            bias: Vector3::ZERO,
        }
    }
}

impl Madgwick {
    /// Creates a filter at the identity orientation with zero bias.
    ///
    /// ```rust
    /// # use attitude_observers::{Madgwick, MadgwickGains, Vector3};
    /// let mut filter = Madgwick::new(Some(MadgwickGains { alpha: 2.0, beta: 1.0, zeta: 0.2 })).unwrap();
    /// let acc = Vector3::new(0.0, 0.0, 9.81);
    /// let mag = Vector3::new(22.0, 0.0, 40.0);
    /// filter.update(Vector3::ZERO, 0.01, acc, mag).unwrap();
    /// ```
    pub fn new(gains: Option<MadgwickGains>) -> Result<Self> {
        let gains = gains.unwrap_or_default();
        gains.validate()?;
        Ok(Self {
            gains,
            ..Default::default()
        })
    }

    pub fn set_gains(&mut self, alpha: Float, beta: Float, zeta: Float) -> Result<()> {
        let gains = MadgwickGains { alpha, beta, zeta };
        gains.validate()?;
        debug!("madgwick gains set: alpha={alpha} beta={beta} zeta={zeta}");
        self.gains = gains;
        Ok(())
    }

    pub fn gains(&self) -> &MadgwickGains {
        &self.gains
    }

    pub fn integration_method(&self) -> IntegrationMethod {
        self.attitude.method()
    }

    /// Selects how the gyroscope prediction is integrated.
    pub fn set_integration_method(&mut self, method: IntegrationMethod) {
        self.attitude.set_method(method);
    }

    /// Performs one filter step.
    ///
    /// `w` is the measured angular rate in rad/s and `dt` the time since the previous step in seconds. `acc` and
    /// `mag` may be in any unit, only their directions are used; a zero-length measurement is rejected with
    /// [`Error::DegenerateVector`].
    ///
    /// On error nothing is updated.
    pub fn update(&mut self, w: Vector3, dt: Float, acc: Vector3, mag: Vector3) -> Result<()> {
        self.step(w, dt, acc, mag)
            .inspect_err(|e| warn!("madgwick update rejected: {e}"))
    }

    fn step(&mut self, w: Vector3, dt: Float, acc: Vector3, mag: Vector3) -> Result<()> {
        check_timestep(dt)?;
        w.check_finite(Quantity::AngularRate)?;
        let a = acc.try_normalize(Quantity::Accelerometer)?;
        let m = mag.try_normalize(Quantity::Magnetometer)?;

        let q = self.attitude.quaternion();
        let to_body = q.conjugate();
        let gradient = Self::gradient(q, a, m);

        // bias
        let w_err = 2.0 * (to_body * gradient).vector();
        let bias = self.bias + self.gains.zeta * dt * w_err;

        // gyroscope prediction
        let w_corrected = w - bias;
        let q_dot = attitude_kinematics(q, w_corrected);
        let q_w = self.attitude.method().step(q, w_corrected, dt)?;

        // gradient descent step and fusion
        let mu = self.gains.alpha * q_dot.norm() * dt;
        let q_g = q.quaternion() - gradient * mu;
        let y = self.gains.beta / (mu / dt + self.gains.beta);
        let fused = (q_g * y + q_w.quaternion() * (1.0 - y)).normalize()?;

        self.attitude.set_quaternion(fused);
        self.bias = bias;
        Ok(())
    }

    /// Normalized gradient of the squared alignment error between predicted and measured directions, for
    /// normalized measurements `a` and `m`. Zero if the measurements match the prediction exactly.
    fn gradient(q: UnitQuaternion, a: Vector3, m: Vector3) -> Quaternion {
        let (q0, q1, q2, q3) = (q.w(), q.x(), q.y(), q.z());
        let to_body = q.conjugate();

        // reference direction of earth's magnetic field, horizontal component along x
        let h = q.rotate(m);
        let bx = sqrt(square(h.x) + square(h.y));
        let bz = h.z;

        let f_a = to_body.rotate(Vector3::new(0.0, 0.0, 1.0)) - a;
        let f_m = to_body.rotate(Vector3::new(bx, 0.0, bz)) - m;

        // Jᵀ f, one Jacobian column per quaternion component
        let g0 = Vector3::new(-2.0 * q2, 2.0 * q1, 0.0).dot(&f_a)
            + Vector3::new(
                -2.0 * bz * q2,
                -2.0 * bx * q3 + 2.0 * bz * q1,
                2.0 * bx * q2,
            )
            .dot(&f_m);
        let g1 = Vector3::new(2.0 * q3, 2.0 * q0, -4.0 * q1).dot(&f_a)
            + Vector3::new(
                2.0 * bz * q3,
                2.0 * bx * q2 + 2.0 * bz * q0,
                2.0 * bx * q3 - 4.0 * bz * q1,
            )
            .dot(&f_m);
        let g2 = Vector3::new(-2.0 * q0, 2.0 * q3, -4.0 * q2).dot(&f_a)
            + Vector3::new(
                -4.0 * bx * q2 - 2.0 * bz * q0,
                2.0 * bx * q1 + 2.0 * bz * q3,
                2.0 * bx * q0 - 4.0 * bz * q2,
            )
            .dot(&f_m);
        let g3 = Vector3::new(2.0 * q1, 2.0 * q2, 0.0).dot(&f_a)
            + Vector3::new(
                -4.0 * bx * q3 + 2.0 * bz * q1,
                -2.0 * bx * q0 + 2.0 * bz * q2,
                2.0 * bx * q1,
            )
            .dot(&f_m);

        let g = Quaternion::new(g0, g1, g2, g3);
        let n = g.norm();
        if n < Float::EPSILON {
            return Quaternion::default();
        }
        g / n
    }

    /// Returns to the identity orientation and zero bias. Gains are kept.
    pub fn reset(&mut self) {
        debug!("madgwick reset");
        self.attitude.reset();
        self.bias = Vector3::ZERO;
    }

    /// Current orientation estimate, rotating body-frame vectors into the inertial frame.
    pub fn attitude(&self) -> UnitQuaternion {
        self.attitude.quaternion()
    }

    /// Current orientation estimate as a direction cosine matrix.
    pub fn attitude_dcm(&self) -> Matrix3 {
        self.attitude.dcm()
    }

    pub fn euler_angles(&self) -> EulerAngles {
        self.attitude.euler_angles()
    }

    /// Current gyroscope bias estimate in rad/s.
    pub fn bias(&self) -> Vector3 {
        self.bias
    }
}
