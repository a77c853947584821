use log::{debug, warn};

use crate::{
    error::Quantity, kinematics::check_timestep, Attitude, EulerAngles, Error, Float, IntegrationMethod, Matrix3,
    Result, UnitQuaternion, Vector3,
};

/// Gains of the explicit complementary filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EcfGains<const N: usize> {
    /// Proportional gain on the attitude error signal.
    ///
    /// Default value: 1.0
    pub kp: Float,

    /// Integral gain driving the gyroscope bias estimate.
    ///
    /// Default value: 0.1
    pub ki: Float,

    /// Relative weight of each reference vector in the error signal, in reference vector order.
    ///
    /// Default value: 1/N for every vector
    pub weights: [Float; N],
}

impl<const N: usize> Default for EcfGains<N> {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            weights: [1.0 / N as Float; N],
        }
    }
}

impl<const N: usize> EcfGains<N> {
    fn validate(&self) -> Result<()> {
        let valid = |g: Float| g.is_finite() && g >= 0.0;
        if valid(self.kp) && valid(self.ki) && self.weights.iter().all(|&k| valid(k)) {
            Ok(())
        } else {
            Err(Error::InvalidGain)
        }
    }
}

/// Copies `values` into an `[T; N]`, failing if the length is not exactly `N`.
fn exact<T: Copy + Default, const N: usize>(values: &[T], what: Quantity) -> Result<[T; N]> {
    if values.len() != N {
        return Err(Error::CountMismatch {
            what,
            expected: N,
            found: values.len(),
        });
    }
    let mut out = [T::default(); N];
    out.copy_from_slice(values);
    Ok(out)
}

/// Explicit complementary filter over `N` reference directions.
///
/// Each reference vector `V[n]` is a direction known in the inertial frame (gravity, magnetic field, ...). On every
/// update the filter receives the body-frame observations `U[n]` of those directions in the same order and forms
/// the error signal
///
/// `mes = Σ K[n] (U[n] × q⁻¹ V[n] q)`
///
/// which corrects the gyroscope rate (`w - b + kp mes`) and drives the bias estimate (`ḃ = -ki mes`). With
/// consistent observations of at least two non-parallel directions, the orientation and bias estimates converge
/// to the true values.
#[derive(Clone, Debug)]
pub struct Ecf<const N: usize> {
    gains: EcfGains<N>,
    attitude: Attitude,
    bias: Vector3,
    references: Option<[Vector3; N]>,
}

impl<const N: usize> Ecf<N> {
    /// Creates a filter at the identity orientation with zero bias.
    ///
    /// The reference vectors must be set with [`set_reference_vectors()`](Self::set_reference_vectors()) before
    /// the first update:
    /// ```rust
    /// # use attitude_observers::{Ecf, EcfGains, Vector3};
    /// let mut ecf = Ecf::<2>::new(Some(EcfGains { kp: 2.5, ki: 0.2, weights: [0.5, 0.5] })).unwrap();
    /// ecf.set_reference_vectors(&[Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.2)]).unwrap();
    /// ecf.update(Vector3::ZERO, 0.01, &[Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.2)]).unwrap();
    /// ```
    pub fn new(gains: Option<EcfGains<N>>) -> Result<Self> {
        let gains = gains.unwrap_or_default();
        gains.validate()?;
        Ok(Self {
            gains,
            attitude: Attitude::new(),
            bias: Vector3::ZERO,
            references: None,
        })
    }

    /// Sets `kp`, `ki` and the per-vector weights (exactly `N` of them).
    pub fn set_gains(&mut self, kp: Float, ki: Float, weights: &[Float]) -> Result<()> {
        let gains = EcfGains {
            kp,
            ki,
            weights: exact(weights, Quantity::GainWeight)?,
        };
        gains.validate()?;
        debug!("ecf gains set: kp={kp} ki={ki}");
        self.gains = gains;
        Ok(())
    }

    pub fn gains(&self) -> &EcfGains<N> {
        &self.gains
    }

    /// Sets the inertial-frame reference directions. Exactly `N` vectors are required, and their order is the
    /// order in which observations must be passed to [`update()`](Self::update()).
    pub fn set_reference_vectors(&mut self, references: &[Vector3]) -> Result<()> {
        let references: [Vector3; N] = exact(references, Quantity::ReferenceVector)?;
        for v in &references {
            v.check_finite(Quantity::ReferenceVector)?;
        }
        self.references = Some(references);
        Ok(())
    }

    pub fn reference_vectors(&self) -> Option<&[Vector3; N]> {
        self.references.as_ref()
    }

    pub fn integration_method(&self) -> IntegrationMethod {
        self.attitude.method()
    }

    pub fn set_integration_method(&mut self, method: IntegrationMethod) {
        self.attitude.set_method(method);
    }

    /// Performs one filter step.
    ///
    /// `w` is the measured angular rate in rad/s, `dt` the time since the previous step in seconds, and
    /// `observations` the body-frame measurements of the reference directions, in reference vector order.
    ///
    /// On error nothing is updated.
    pub fn update(&mut self, w: Vector3, dt: Float, observations: &[Vector3]) -> Result<()> {
        self.step(w, dt, observations).inspect_err(|e| warn!("ecf update rejected: {e}"))
    }

    fn step(&mut self, w: Vector3, dt: Float, observations: &[Vector3]) -> Result<()> {
        check_timestep(dt)?;
        w.check_finite(Quantity::AngularRate)?;
        let references = self.references.as_ref().ok_or(Error::MissingReferenceVectors)?;
        if observations.len() != N {
            return Err(Error::CountMismatch {
                what: Quantity::ObservationVector,
                expected: N,
                found: observations.len(),
            });
        }

        let to_body = self.attitude.quaternion().conjugate();
        let mut mes = Vector3::ZERO;
        for ((u, v), k) in observations.iter().zip(references).zip(self.gains.weights) {
            u.check_finite(Quantity::ObservationVector)?;
            mes += k * u.cross(&to_body.rotate(*v));
        }

        self.attitude.update(w - self.bias + self.gains.kp * mes, dt)?;
        self.bias += dt * (-self.gains.ki * mes);
        Ok(())
    }

    /// Returns to the identity orientation and zero bias. Gains and reference vectors are kept.
    pub fn reset(&mut self) {
        debug!("ecf reset");
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

#[cfg(test)]
mod tests {
    use super::*;

    const V: [Vector3; 2] = [Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.2)];

    fn filter() -> Ecf<2> {
        let mut ecf = Ecf::new(Some(EcfGains {
            kp: 2.5,
            ki: 0.2,
            weights: [0.5, 0.5],
        }))
        .unwrap();
        ecf.set_reference_vectors(&V).unwrap();
        ecf
    }

    #[test]
    fn defaults() {
        let ecf = Ecf::<4>::new(None).unwrap();
        assert_eq!(ecf.gains().weights, [0.25; 4]);
        assert_eq!(ecf.attitude(), UnitQuaternion::IDENTITY);
        assert_eq!(ecf.bias(), Vector3::ZERO);
        assert!(ecf.reference_vectors().is_none());
    }

    #[test]
    fn matching_observations_give_no_correction() {
        let mut ecf = filter();
        for _ in 0..100 {
            ecf.update(Vector3::ZERO, 0.01, &V).unwrap();
        }
        assert_eq!(ecf.attitude(), UnitQuaternion::IDENTITY);
        assert_eq!(ecf.bias(), Vector3::ZERO);
    }

    #[test]
    fn gyro_only_when_gains_are_zero() {
        let mut ecf = filter();
        ecf.set_gains(0.0, 0.0, &[0.0, 0.0]).unwrap();
        let mut reference = Attitude::new();
        let w = Vector3::new(0.2, -0.1, 0.4);
        let skewed = [Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];
        for _ in 0..50 {
            ecf.update(w, 0.02, &skewed).unwrap();
            reference.update(w, 0.02).unwrap();
        }
        assert_eq!(ecf.attitude(), reference.quaternion());
        assert_eq!(ecf.bias(), Vector3::ZERO);
    }

    #[test]
    fn wrong_observation_count_is_rejected() {
        let mut ecf = filter();
        ecf.update(Vector3::new(0.1, 0.0, 0.0), 0.01, &[V[0], Vector3::new(0.9, 0.1, 0.2)])
            .unwrap();
        let (q, b) = (ecf.attitude(), ecf.bias());

        assert_eq!(
            ecf.update(Vector3::ZERO, 0.01, &V[..1]),
            Err(Error::CountMismatch {
                what: Quantity::ObservationVector,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            ecf.update(Vector3::ZERO, 0.01, &[V[0], V[1], V[0]]),
            Err(Error::CountMismatch {
                what: Quantity::ObservationVector,
                expected: 2,
                found: 3
            })
        );
        assert_eq!(ecf.attitude(), q);
        assert_eq!(ecf.bias(), b);
    }

    #[test]
    fn invalid_inputs_leave_state_unchanged() {
        let mut ecf = filter();
        ecf.update(Vector3::new(0.1, 0.2, 0.0), 0.01, &[V[1], V[0]]).unwrap();
        let (q, b) = (ecf.attitude(), ecf.bias());

        assert_eq!(ecf.update(Vector3::ZERO, 0.0, &V), Err(Error::InvalidTimestep));
        assert_eq!(
            ecf.update(Vector3::ZERO, 0.01, &[V[0], Vector3::new(Float::INFINITY, 0.0, 0.0)]),
            Err(Error::NonFinite(Quantity::ObservationVector))
        );
        assert_eq!(
            ecf.update(Vector3::new(0.0, Float::NAN, 0.0), 0.01, &V),
            Err(Error::NonFinite(Quantity::AngularRate))
        );
        assert_eq!(ecf.attitude(), q);
        assert_eq!(ecf.bias(), b);
    }

    #[test]
    fn configuration_errors() {
        let mut ecf = Ecf::<2>::new(None).unwrap();
        assert_eq!(
            ecf.update(Vector3::ZERO, 0.01, &V),
            Err(Error::MissingReferenceVectors)
        );
        assert_eq!(
            ecf.set_reference_vectors(&V[..1]),
            Err(Error::CountMismatch {
                what: Quantity::ReferenceVector,
                expected: 2,
                found: 1
            })
        );
        assert!(ecf.reference_vectors().is_none());
        assert_eq!(
            ecf.set_gains(1.0, 0.1, &[1.0]),
            Err(Error::CountMismatch {
                what: Quantity::GainWeight,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(ecf.set_gains(-1.0, 0.1, &[0.5, 0.5]), Err(Error::InvalidGain));
        assert_eq!(ecf.set_gains(1.0, 0.1, &[0.5, Float::NAN]), Err(Error::InvalidGain));
        assert_eq!(ecf.gains(), &EcfGains::default());
        assert!(Ecf::<2>::new(Some(EcfGains {
            kp: 1.0,
            ki: -0.5,
            weights: [1.0; 2]
        }))
        .is_err());
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut ecf = filter();
        for _ in 0..20 {
            ecf.update(Vector3::new(0.3, 0.1, -0.2), 0.05, &[V[1], V[0]]).unwrap();
        }
        assert_ne!(ecf.attitude(), UnitQuaternion::IDENTITY);
        ecf.reset();
        assert_eq!(ecf.attitude(), UnitQuaternion::IDENTITY);
        assert_eq!(ecf.bias(), Vector3::ZERO);
        assert_eq!(ecf.reference_vectors(), Some(&V));
        assert_eq!(ecf.gains().kp, 2.5);
    }
}
