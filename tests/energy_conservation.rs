use logmfd::core::geometry::{CvDomain, Periodic, Real};
use logmfd::core::solve::ThermostatKind;
use logmfd::investigation::record::MemorySink;
use logmfd::platform::comm::SingleReplica;
use logmfd::{LogMfd, LogMfdConfig, LogMfdError, Units};

fn one_cv(domain: Box<dyn CvDomain>) -> Vec<(String, Box<dyn CvDomain>)> {
    vec![("phi".to_string(), domain)]
}

fn build(config: &LogMfdConfig, domain: Box<dyn CvDomain>) -> LogMfd {
    LogMfd::from_config(
        config,
        one_cv(domain),
        &Units::default(),
        Box::new(SingleReplica),
        Box::new(MemorySink::new()),
    )
    .unwrap()
}

#[test]
fn test_resting_variable_keeps_initial_free_energy() {
    // X sits exactly on the CV: no restraint force, no motion, F stays at FLOG.
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.5),
        thermostat: Some("NVE".into()),
        alpha: Some(4.0),
        kappa: Some(vec![50.0]),
        fict_max: Some(vec![3.1]),
        fict_min: Some(vec![-3.1]),
        fict: Some(vec![0.8]),
        vfict: Some(vec![0.0]),
        mfict: Some(vec![6000.0]),
        flog: Some(10.0),
        ..Default::default()
    };
    let mut run = build(&config, Box::new(Periodic::angle()));

    for step in 0..20 {
        let out = run.calculate(&[0.8]).unwrap();
        assert!(out.forces[0].abs() < 1e-9);
        assert!(run.update(step).unwrap());

        assert!((run.fict(0) - 0.8).abs() < 1e-12);
        assert!(run.vfict(0).abs() < 1e-12);
        assert!((run.flog() - 10.0).abs() < 1e-6, "flog drifted to {}", run.flog());
    }
}

/// Runs X against a CV pinned at 0. The free energy along X is then the
/// restraint itself, F(X) = kappa X^2 / 2, and the reconstruction must follow it.
fn pinned_cv_drift(alpha: Option<f64>, flog0: f64) -> f64 {
    let kappa = 1.0;
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.01),
        thermostat: Some("NVE".into()),
        alpha,
        kappa: Some(vec![kappa]),
        fict_max: Some(vec![10.0]),
        fict_min: Some(vec![-10.0]),
        fict: Some(vec![1.0]),
        mfict: Some(vec![1.0]),
        flog: Some(flog0),
        ..Default::default()
    };
    let mut run = build(&config, Box::new(Real));

    let mut worst: f64 = 0.0;
    for step in 0..1000 {
        run.calculate(&[0.0]).unwrap();
        run.update(step).unwrap();

        let x = run.fict(0);
        let expected = flog0 + 0.5 * kappa * (x * x - 1.0);
        worst = worst.max((run.flog() - expected).abs());
    }
    worst
}

#[test]
fn test_free_energy_follows_harmonic_profile() {
    let drift = pinned_cv_drift(None, 0.0);
    println!("TAMD reconstruction error: {:.6}", drift);
    assert!(drift < 2e-2, "TAMD reconstruction off by {drift}");
}

#[test]
fn test_logarithmic_flattening_reconstructs_same_profile() {
    let drift = pinned_cv_drift(Some(1.0), 10.0);
    println!("LogMFD reconstruction error: {:.6}", drift);
    assert!(drift < 2e-2, "LogMFD reconstruction off by {drift}");
}

#[test]
fn test_nose_hoover_bath_conserves_hlog() {
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.05),
        thermostat: Some("NVT".into()),
        kappa: Some(vec![10.0]),
        fict_max: Some(vec![100.0]),
        fict_min: Some(vec![-100.0]),
        fict: Some(vec![0.0]),
        vfict: Some(vec![0.3]),
        mfict: Some(vec![100.0]),
        flog: Some(5.0),
        ..Default::default()
    };
    let mut run = build(&config, Box::new(Real));
    assert_eq!(run.thermostat().kind(), ThermostatKind::Nvt);

    for step in 0..100 {
        // CV glued to X: the bath is the only thing acting on the velocities
        let x = run.fict(0);
        run.calculate(&[x]).unwrap();
        run.update(step).unwrap();
    }

    let drift = (run.flog() - 5.0).abs();
    println!("NVT drift: {:.8}, veta: {:.8}", drift, run.thermostat().veta());
    assert!(drift < 1e-2);
    // 2 E_kin = 9 exceeds N k_B T ~ 2.49, so the bath starts braking.
    assert!(run.thermostat().veta() > 0.0);
    assert!(run.vfict(0) < 0.3);
}

#[test]
fn test_velocity_scaling_holds_temperature() {
    let units = Units::default();
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.5),
        thermostat: Some("VS".into()),
        alpha: Some(2.0),
        kappa: Some(vec![20.0, 20.0]),
        fict_max: Some(vec![5.0, 5.0]),
        fict_min: Some(vec![-5.0, -5.0]),
        fict: Some(vec![0.0, 0.5]),
        mfict: Some(vec![500.0, 800.0]),
        flog: Some(3.0),
        ..Default::default()
    };
    let cvs: Vec<(String, Box<dyn CvDomain>)> = vec![
        ("a".to_string(), Box::new(Real)),
        ("b".to_string(), Box::new(Real)),
    ];
    let mut run = LogMfd::from_config(
        &config,
        cvs,
        &units,
        Box::new(SingleReplica),
        Box::new(MemorySink::new()),
    )
    .unwrap();

    for step in 0..50 {
        run.calculate(&[1.0, -1.0]).unwrap();
        run.update(step).unwrap();

        let t = run.state().temperature(units.kboltzmann);
        assert!((t - 300.0).abs() < 1e-6, "temperature {t} at step {step}");
        assert!(run.flog().is_finite());
    }
    assert_eq!(run.hlog(), Some(0.0));
}

#[test]
fn test_velocity_scaling_without_force_keeps_flog() {
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.5),
        thermostat: Some("VS".into()),
        kappa: Some(vec![20.0]),
        fict_max: Some(vec![50.0]),
        fict_min: Some(vec![-50.0]),
        fict: Some(vec![0.0]),
        mfict: Some(vec![1000.0]),
        flog: Some(-2.0),
        ..Default::default()
    };
    let mut run = build(&config, Box::new(Real));

    for step in 0..10 {
        let x = run.fict(0);
        run.calculate(&[x]).unwrap();
        run.update(step).unwrap();
    }
    assert!((run.flog() + 2.0).abs() < 1e-9);
    assert!(run.vfict(0) > 0.0);
}

#[test]
fn test_overflowing_free_energy_stops_the_run() {
    // gamma = 1e-3: one strong kick puts |Psi| / gamma far past exp's range
    let config = LogMfdConfig {
        interval: Some(1),
        delta_t: Some(0.1),
        thermostat: Some("NVE".into()),
        gamma: Some(1e-3),
        kappa: Some(vec![1e4]),
        fict_max: Some(vec![1e9]),
        fict_min: Some(vec![-1e9]),
        fict: Some(vec![0.0]),
        mfict: Some(vec![1.0]),
        flog: Some(0.0),
        ..Default::default()
    };
    let mut run = build(&config, Box::new(Real));

    run.calculate(&[1.0]).unwrap();
    let err = run.update(0).unwrap_err();
    println!("{err}");
    assert!(matches!(
        err,
        LogMfdError::NonFinite { quantity: "free energy", iteration: 0 }
    ));
}
