//! Behavioural properties of the update rules.

use mochimochi_classifiers::models::{
    AdagradRda, Arow, Nherd, OnlineClassifier, PaMode, PassiveAggressive, Scw,
};
use mochimochi_classifiers::{FeatureVector, MulticlassPA};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_vector(rng: &mut StdRng, dim: usize) -> FeatureVector {
    (0..dim)
        .map(|_| {
            if rng.gen_bool(0.3) {
                0.0
            } else {
                rng.gen_range(-3.0..3.0)
            }
        })
        .collect()
}

fn random_label(rng: &mut StdRng) -> i32 {
    if rng.gen_bool(0.5) {
        1
    } else {
        -1
    }
}

// ---------------------------------------------------------------------------
// Passive-Aggressive
// ---------------------------------------------------------------------------

#[test]
fn pa_step_is_monotone_in_loss() {
    for mode in [PaMode::PaI, PaMode::PaII] {
        for &sq_norm in &[0.0, 0.25, 1.0, 9.0] {
            let satisfied = mode.tau(0.0, sq_norm, 0.5);
            let violated = mode.tau(3.0, sq_norm, 0.5);
            assert!(satisfied >= 0.0);
            assert!(satisfied <= violated, "{:?} tau not monotone", mode);
        }
    }
}

#[test]
fn plain_pa_always_reports_a_correction() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut pa = PassiveAggressive::new(4, 1.0, 0).unwrap();
    for _ in 0..50 {
        let x = random_vector(&mut rng, 4);
        assert!(pa.update(&x, random_label(&mut rng)));
    }
    assert!(pa.update(&FeatureVector::zeros(4), 1));
    assert!(pa.weight().is_finite());
}

// ---------------------------------------------------------------------------
// Confidence-weighted family
// ---------------------------------------------------------------------------

fn assert_covariance_never_grows<M, F>(mut model: M, covariances: F, name: &str)
where
    M: OnlineClassifier,
    F: Fn(&M) -> FeatureVector,
{
    let mut rng = StdRng::seed_from_u64(42);
    let dim = model.dim();
    let mut applied = 0;
    for _ in 0..300 {
        let x = random_vector(&mut rng, dim);
        let before = covariances(&model);
        if model.update(&x, random_label(&mut rng)) {
            applied += 1;
            for (new, old) in covariances(&model).iter().zip(before.iter()) {
                assert!(new <= old, "{} covariance grew {} -> {}", name, old, new);
                assert!(*new > 0.0, "{} covariance left the positive range", name);
            }
        } else {
            assert_eq!(covariances(&model), before);
        }
    }
    assert!(applied > 0, "{} never updated", name);
}

#[test]
fn arow_covariance_is_non_increasing() {
    assert_covariance_never_grows(Arow::new(5, 0.5).unwrap(), |m| m.covariances().clone(), "AROW");
}

#[test]
fn nherd_covariance_is_non_increasing_in_every_mode() {
    for diagonal in 0..4 {
        assert_covariance_never_grows(
            Nherd::new(5, 0.2, diagonal).unwrap(),
            |m| m.covariances().clone(),
            "NHERD",
        );
    }
}

#[test]
fn scw_covariance_is_non_increasing() {
    for select in [1, 2] {
        assert_covariance_never_grows(
            Scw::new(5, 1.0, 0.8, select).unwrap(),
            |m| m.covariances().clone(),
            "SCW",
        );
    }
}

#[test]
fn nherd_gate_skips_confident_examples() {
    let mut nherd = Nherd::new(2, 1.0, 1).unwrap();
    assert!(nherd.update(&FeatureVector::from_vec(vec![1.0, 0.0]), 1));
    // the same direction scaled up clears the unit margin
    let far = FeatureVector::from_vec(vec![100.0, 0.0]);
    assert!(nherd.margin(&far) >= 1.0);
    let snapshot = nherd.clone();
    assert!(!nherd.update(&far, 1));
    assert_eq!(nherd, snapshot);
}

// ---------------------------------------------------------------------------
// AdaGrad-RDA
// ---------------------------------------------------------------------------

#[test]
fn adagrad_rda_truncates_small_averages_to_zero() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut rda = AdagradRda::new(8, 0.1, 0.5).unwrap();
    for _ in 0..200 {
        let x = random_vector(&mut rng, 8);
        let label = random_label(&mut rng);
        let before_t = rda.timestep();
        let updated = rda.update(&x, label);
        assert_eq!(rda.timestep(), before_t + u64::from(updated));
        if updated {
            let t = rda.timestep() as f64;
            for i in 0..8 {
                if rda.gradients()[i].abs() / t <= rda.lambda() {
                    assert_eq!(rda.weight()[i], 0.0);
                } else {
                    assert_ne!(rda.weight()[i], 0.0);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Multiclass composer
// ---------------------------------------------------------------------------

#[test]
fn multiclass_prediction_is_always_a_valid_class() {
    let mut rng = StdRng::seed_from_u64(21);
    let n_class = 5;
    let mut mpa = MulticlassPA::new(4, n_class, 0.5, 2).unwrap();
    for _ in 0..300 {
        let x = random_vector(&mut rng, 4);
        assert!(mpa.predict(&x) < n_class);
        mpa.update(&x, rng.gen_range(0..n_class)).unwrap();
    }
}

#[test]
fn multiclass_leader_update_changes_nothing() {
    let mut rng = StdRng::seed_from_u64(2);
    let n_class = 3;
    let truth = [
        FeatureVector::from_vec(vec![1.0, 0.0, 0.0]),
        FeatureVector::from_vec(vec![0.0, 1.0, 0.0]),
        FeatureVector::from_vec(vec![0.0, 0.0, 1.0]),
    ];
    let mut mpa = MulticlassPA::new(3, n_class, 1.0, 1).unwrap();
    let mut skipped = 0;
    for _ in 0..500 {
        let x = random_vector(&mut rng, 3);
        let label = truth
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (k, w)| {
                let score = w.dot(&x);
                if score > best.1 {
                    (k, score)
                } else {
                    best
                }
            })
            .0;

        let scores = mpa.scores(&x);
        let leads = (0..n_class)
            .filter(|&k| k != label)
            .all(|k| scores[label] - scores[k] >= 1.0);
        let snapshot = mpa.weights().to_vec();
        let updated = mpa.update(&x, label).unwrap();
        if leads {
            skipped += 1;
            assert!(!updated);
            assert_eq!(mpa.weights(), snapshot.as_slice());
        } else {
            assert!(updated);
        }
    }
    assert!(skipped > 0);
}
