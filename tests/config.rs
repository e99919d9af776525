use logmfd::config::{Parameters, DEFAULT_MASS, KB_KJ_PER_MOL};
use logmfd::core::geometry::{CvDomain, Real};
use logmfd::core::solve::ThermostatKind;
use logmfd::investigation::record::MemorySink;
use logmfd::laws::Flattening;
use logmfd::platform::comm::SingleReplica;
use logmfd::{LogMfd, LogMfdConfig, LogMfdError, Units};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("cv{i}")).collect()
}

fn minimal() -> LogMfdConfig {
    LogMfdConfig {
        interval: Some(10),
        delta_t: Some(0.5),
        thermostat: Some("NVT".into()),
        kappa: Some(vec![50.0, 50.0]),
        fict_max: Some(vec![3.1, 3.1]),
        fict_min: Some(vec![-3.1, -3.1]),
        flog: Some(10.0),
        ..Default::default()
    }
}

#[test]
fn test_defaults_are_filled_in() {
    let units = Units::new(KB_KJ_PER_MOL, 300.0);
    let p = minimal().validate(&names(2), &units, 0, 1).unwrap();

    assert_eq!(p.thermostat, ThermostatKind::Nvt);
    assert_eq!(p.flattening, Flattening::Tamd);
    assert_eq!(p.kbt, units.kbt);
    assert_eq!(p.mfict, vec![DEFAULT_MASS; 2]);
    assert_eq!(p.vfict, vec![0.0; 2]);
    assert_eq!(p.fict, None);
    assert_eq!(p.xeta, 0.0);
    assert_eq!(p.veta, 0.0);
    assert!((p.meta - 2.0 * units.kbt * 1e4).abs() < 1e-9);
    assert_eq!(p.work, 0.0);
}

#[test]
fn test_missing_compulsory_keyword_is_named() {
    let mut config = minimal();
    config.kappa = None;
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::MissingParameter("KAPPA")));
    assert!(err.is_configuration());

    let mut config = minimal();
    config.flog = None;
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::MissingParameter("FLOG")));

    let err = minimal().validate(&[], &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::MissingParameter("ARG")));
}

#[test]
fn test_per_cv_lists_must_match_arg_count() {
    let mut config = minimal();
    config.fict_max = Some(vec![3.1]);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(
        err,
        LogMfdError::WrongLength {
            name: "FICT_MAX",
            expected: 2,
            found: 1
        }
    ));
}

#[test]
fn test_unknown_thermostat_is_rejected() {
    let mut config = minimal();
    config.thermostat = Some("NPT".into());
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::UnknownThermostat(ref s) if s == "NPT"));
    assert!(err.to_string().contains("NPT"));
}

#[test]
fn test_alpha_and_gamma_are_exclusive() {
    let mut config = minimal();
    config.alpha = Some(4.0);
    config.gamma = Some(0.25);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::ConflictingFlattening { .. }));

    config.alpha = None;
    let p = config.validate(&names(2), &Units::default(), 0, 1).unwrap();
    assert_eq!(p.flattening, Flattening::Logarithmic { alpha: 4.0, gamma: 0.25 });
}

#[test]
fn test_temperature_handling() {
    let units = Units::new(KB_KJ_PER_MOL, 300.0);

    let mut config = minimal();
    config.temp = Some(600.0);
    let p = config.validate(&names(2), &units, 0, 1).unwrap();
    assert!((p.kbt - 600.0 * KB_KJ_PER_MOL).abs() < 1e-12);

    config.temp = Some(0.0);
    config.thermostat = Some("NVE".into());
    let p = config.validate(&names(2), &units, 0, 1).unwrap();
    assert_eq!(p.kbt, 0.0);

    config.thermostat = Some("VS".into());
    let err = config.validate(&names(2), &units, 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "TEMP", .. }));
}

#[test]
fn test_bounds_and_interval_are_checked() {
    let mut config = minimal();
    config.fict_min = Some(vec![0.0, 4.0]);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "FICT_MIN", .. }));

    let mut config = minimal();
    config.interval = Some(0);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "INTERVAL", .. }));
}

#[test]
fn test_work_is_taken_per_replica() {
    let mut config = minimal();
    config.work = Some(vec![0.5, 1.5, 2.5]);

    let p = config.validate(&names(2), &Units::default(), 2, 3).unwrap();
    assert_eq!(p.work, 2.5);

    // ignored without replicas
    let p = config.validate(&names(2), &Units::default(), 0, 1).unwrap();
    assert_eq!(p.work, 0.0);

    let err = config.validate(&names(2), &Units::default(), 0, 2).unwrap_err();
    assert!(matches!(err, LogMfdError::WrongLength { name: "WORK", .. }));
}

#[test]
fn test_parses_ron_with_bare_options() {
    let text = r#"(
        interval: 1,
        delta_t: 0.5,
        thermostat: "NVE",
        flog: 10.0,
        alpha: 4.0,
        kappa: [50.0],
        mfict: [6000.0],
        fict: [0.8],
        fict_max: [3.1],
        fict_min: [-3.1],
    )"#;
    let config = LogMfdConfig::from_ron(text).unwrap();
    assert_eq!(config.interval, Some(1));
    assert_eq!(config.alpha, Some(4.0));
    assert_eq!(config.gamma, None);

    let p = config.validate(&names(1), &Units::default(), 0, 1).unwrap();
    assert_eq!(p.flattening, Flattening::Logarithmic { alpha: 4.0, gamma: 0.25 });
    assert_eq!(p.fict, Some(vec![0.8]));
}

#[test]
fn test_unknown_keyword_fails_to_parse() {
    let err = LogMfdConfig::from_ron("(kapa: [1.0])").unwrap_err();
    assert!(matches!(err, LogMfdError::Parse(_)));
    assert!(err.is_configuration());
}

#[test]
fn test_zero_temperature_leaves_nose_hoover_without_bath_mass() {
    let mut config = minimal();
    config.temp = Some(0.0);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "META", .. }));

    config.meta = Some(100.0);
    assert!(config.validate(&names(2), &Units::default(), 0, 1).is_ok());
}

#[test]
fn test_non_finite_inputs_are_rejected() {
    let mut config = minimal();
    config.flog = Some(f64::INFINITY);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "FLOG", .. }));

    let mut config = minimal();
    config.kappa = Some(vec![50.0, f64::NAN]);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "KAPPA", .. }));

    let mut config = minimal();
    config.veta = Some(f64::NEG_INFINITY);
    let err = config.validate(&names(2), &Units::default(), 0, 1).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "VETA", .. }));

    let mut config = minimal();
    config.work = Some(vec![0.0, f64::NAN]);
    let err = config.validate(&names(2), &Units::default(), 1, 2).unwrap_err();
    assert!(matches!(err, LogMfdError::InvalidParameter { name: "WORK", .. }));
}

fn start(params: Parameters) -> Result<LogMfd, LogMfdError> {
    let domains: Vec<Box<dyn CvDomain>> = params.names.iter().map(|_| Box::new(Real) as Box<dyn CvDomain>).collect();
    LogMfd::new(params, domains, Box::new(SingleReplica), Box::new(MemorySink::new()))
}

#[test]
fn test_hand_built_parameters_are_checked() {
    let good = minimal().validate(&names(2), &Units::default(), 0, 1).unwrap();
    assert!(start(good.clone()).is_ok());

    let mut p = good.clone();
    p.vfict = vec![];
    assert!(matches!(
        start(p),
        Err(LogMfdError::WrongLength { name: "VFICT", expected: 2, found: 0 })
    ));

    let mut p = good.clone();
    p.kappa.push(1.0);
    assert!(matches!(start(p), Err(LogMfdError::WrongLength { name: "KAPPA", .. })));

    let mut p = good.clone();
    p.fict = Some(vec![0.0]);
    assert!(matches!(start(p), Err(LogMfdError::WrongLength { name: "FICT", .. })));

    let mut p = good.clone();
    p.interval = 0;
    assert!(matches!(start(p), Err(LogMfdError::InvalidParameter { name: "INTERVAL", .. })));

    let mut p = good.clone();
    p.mfict = vec![1.0, 0.0];
    assert!(matches!(start(p), Err(LogMfdError::InvalidParameter { name: "MFICT", .. })));

    let mut p = good;
    p.flog = f64::NAN;
    assert!(matches!(start(p), Err(LogMfdError::InvalidParameter { name: "FLOG", .. })));
}
