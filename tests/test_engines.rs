#[cfg(test)]
mod test_engines {
    use approx::assert_relative_eq;
    use fmu_explore::prelude::*;

    const STATES: [&str; 4] = [
        "bioreactor.V",
        "bioreactor.m[1]",
        "bioreactor.m[2]",
        "bioreactor.m[3]",
    ];

    fn run(engine: &mut dyn SimulationEngine, marker: InitialValueMarker) -> RunResult {
        let m = marker.as_str();
        engine.reset();
        engine
            .set(&format!("bioreactor.m{m}[2]"), Value::Real(15.0))
            .unwrap();
        engine
            .set("bioreactor.culture.qGr", Value::Real(0.4))
            .unwrap();
        engine.simulate(0.0, 10.0, &SimulateOptions::fast()).unwrap()
    }

    /// Both backends integrate the same unit, so for equal start values they must agree
    /// on every recorded state regardless of their naming convention.
    #[test]
    fn test_backends_agree() {
        // ARRANGE
        let mut instance = engine_for(
            Backend::Instance,
            yeast_batch_unit(InitialValueMarker::Zero),
        );
        let mut oneshot = engine_for(
            Backend::OneShot,
            yeast_batch_unit(InitialValueMarker::Start),
        );

        // ACT
        let a = run(instance.as_mut(), InitialValueMarker::Zero);
        let b = run(oneshot.as_mut(), InitialValueMarker::Start);

        // ASSERT
        assert_eq!(a.time, b.time);
        for state in STATES {
            assert_relative_eq!(
                a.final_value(state).unwrap(),
                b.final_value(state).unwrap(),
                epsilon = 1e-12
            );
            assert_eq!(
                instance.get(state).unwrap().as_f64(),
                oneshot.get(state).unwrap().as_f64()
            );
        }
        assert_eq!(instance.time(), Some(10.0));
        assert_eq!(oneshot.time(), Some(10.0));
    }

    #[test]
    fn test_batch_consumes_glucose_and_produces_ethanol() {
        let mut engine = engine_for(
            Backend::OneShot,
            yeast_batch_unit(InitialValueMarker::Start),
        );
        let result = engine
            .simulate(0.0, 12.0, &SimulateOptions::standard())
            .unwrap();

        let glucose = result.get("bioreactor.c[2]").unwrap();
        let cells = result.get("bioreactor.c[1]").unwrap();
        assert!(glucose.last().unwrap() < glucose.first().unwrap());
        assert!(cells.last().unwrap() > cells.first().unwrap());
        assert!(result.final_value("bioreactor.c[3]").unwrap() > 0.0);
        assert_relative_eq!(result.final_value("bioreactor.V").unwrap(), 4.5);
    }

    #[test]
    fn test_invalid_horizon_is_rejected() {
        for backend in [Backend::Instance, Backend::OneShot] {
            let marker = SessionConfig::for_backend(backend).marker;
            let mut engine = engine_for(backend, yeast_batch_unit(marker));
            let err = engine
                .simulate(5.0, 5.0, &SimulateOptions::fast())
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidHorizon { .. }));
        }
    }

    #[test]
    fn test_session_on_exported_package() {
        // ARRANGE
        let dir = tempfile::tempdir().unwrap();
        yeast_batch_unit(InitialValueMarker::Zero)
            .export(dir.path())
            .unwrap();

        // ACT
        let unit = Unit::load(dir.path()).unwrap();
        let config = SessionConfig::for_backend(Backend::Instance);
        assert_eq!(marker_of(unit.description()), config.marker);
        let application = yeast_batch(config.marker);
        let mut session = Session::for_unit(unit, config, application);
        let outcome = session.simu().options(SimulateOptions::fast()).call();

        // ASSERT
        assert!(outcome.is_completed());
        assert_eq!(session.engine().unit().package(), Some(&dir.path().to_path_buf()));
        let text = describe(&session, "V_0", 1).unwrap();
        assert_eq!(text, "Initial broth volume : 4.5 [ L ]");
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"horizon": 6.0, "backend": "Instance", "marker": "Zero", "clamp": "NonNegative"}"#,
        )
        .unwrap();

        let config = SessionConfig::from_json(&path).unwrap();
        let application = yeast_batch(config.marker);
        let mut session = Session::for_unit(
            yeast_batch_unit(config.marker),
            config,
            application,
        );
        session.simu().options(SimulateOptions::fast()).call();

        assert_eq!(session.engine().backend(), Backend::Instance);
        assert_eq!(session.last_final_time(), 6.0);
    }
}
