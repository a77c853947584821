use core::fmt;

/// The input a failed check was about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    /// Angular rate measurement.
    AngularRate,
    /// Accelerometer measurement.
    Accelerometer,
    /// Magnetometer measurement.
    Magnetometer,
    /// Inertial-frame reference direction.
    ReferenceVector,
    /// Body-frame observation of a reference direction.
    ObservationVector,
    /// Per-vector gain weight.
    GainWeight,
    /// Rotation axis.
    Axis,
    /// Quaternion components.
    Quaternion,
    /// Direction cosine matrix.
    Matrix,
    /// Euler angles.
    EulerAngles,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::AngularRate => "angular rate",
            Quantity::Accelerometer => "accelerometer vector",
            Quantity::Magnetometer => "magnetometer vector",
            Quantity::ReferenceVector => "reference vector",
            Quantity::ObservationVector => "observation vector",
            Quantity::GainWeight => "gain weight",
            Quantity::Axis => "rotation axis",
            Quantity::Quaternion => "quaternion",
            Quantity::Matrix => "direction cosine matrix",
            Quantity::EulerAngles => "euler angles",
        };
        f.write_str(name)
    }
}

/// Errors reported by constructors, configuration and update calls.
///
/// A call that returns an error leaves the filter state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A sequence did not have the length fixed at construction.
    CountMismatch {
        what: Quantity,
        expected: usize,
        found: usize,
    },
    /// A vector (or quaternion) with zero magnitude was given where a direction is required.
    DegenerateVector(Quantity),
    /// An input contained NaN or infinity.
    NonFinite(Quantity),
    /// The timestep was not a finite, strictly positive number.
    InvalidTimestep,
    /// A gain was negative, non-finite, or (for `beta`) zero.
    InvalidGain,
    /// The filter was updated before its reference vectors were configured.
    MissingReferenceVectors,
    /// A component index was out of range.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CountMismatch {
                what,
                expected,
                found,
            } => write!(f, "expected {expected} {what}s, got {found}"),
            Error::DegenerateVector(what) => write!(f, "{what} has zero magnitude"),
            Error::NonFinite(what) => write!(f, "{what} is not finite"),
            Error::InvalidTimestep => f.write_str("timestep must be finite and positive"),
            Error::InvalidGain => f.write_str("gains must be finite and non-negative"),
            Error::MissingReferenceVectors => f.write_str("reference vectors have not been set"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Shorthand for results carrying an [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        extern crate std;
        use std::string::ToString;

        let err = Error::CountMismatch {
            what: Quantity::ObservationVector,
            expected: 2,
            found: 3,
        };
        assert_eq!(err.to_string(), "expected 2 observation vectors, got 3");
        assert_eq!(
            Error::DegenerateVector(Quantity::Magnetometer).to_string(),
            "magnetometer vector has zero magnitude"
        );
        assert_eq!(
            Error::IndexOutOfRange { index: 4, len: 4 }.to_string(),
            "index 4 out of range for length 4"
        );
    }
}
