//! Numeric helpers shared by the update rules.
use crate::error::ClassifierError;
use crate::math::FeatureVector;

/// `max(0, 1 - label * margin)`
#[inline]
pub fn hinge_loss(margin: f64, label: i32) -> f64 {
    (1.0 - f64::from(label) * margin).max(0.0)
}

/// Map a raw margin to a binary decision. Exactly zero goes to `+1`.
#[inline]
pub fn sign_label(margin: f64) -> i32 {
    if margin >= 0.0 {
        1
    } else {
        -1
    }
}

/// `Σ_i covariance_i * x_i²`
pub fn confidence(covariances: &FeatureVector, feature: &FeatureVector) -> f64 {
    assert_eq!(
        covariances.len(),
        feature.len(),
        "Confidence requires equal length vectors"
    );
    covariances
        .iter()
        .zip(feature.iter())
        .map(|(s, x)| s * x * x)
        .sum()
}

/// Accept only `-1` / `+1` binary labels.
pub fn check_binary_label(label: i64) -> Result<i32, ClassifierError> {
    match label {
        1 => Ok(1),
        -1 => Ok(-1),
        other => Err(ClassifierError::InvalidLabel(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinge_loss_is_zero_beyond_unit_margin() {
        assert_eq!(hinge_loss(1.0, 1), 0.0);
        assert_eq!(hinge_loss(2.5, 1), 0.0);
        assert_eq!(hinge_loss(-2.5, -1), 0.0);
        assert_eq!(hinge_loss(0.25, 1), 0.75);
        assert_eq!(hinge_loss(0.25, -1), 1.25);
    }

    #[test]
    fn zero_margin_predicts_positive() {
        assert_eq!(sign_label(0.0), 1);
        assert_eq!(sign_label(-0.0), 1);
        assert_eq!(sign_label(-1e-12), -1);
    }

    #[test]
    fn binary_labels_are_checked() {
        assert_eq!(check_binary_label(1), Ok(1));
        assert_eq!(check_binary_label(-1), Ok(-1));
        assert_eq!(check_binary_label(0), Err(ClassifierError::InvalidLabel(0)));
    }
}
