use defi_forecast::application::ml::synthetic::SyntheticDataGenerator;
use defi_forecast::application::ml::{
    ForestParams, PredictionMode, Predictor, RiskPredictor, TrendPredictor,
};
use defi_forecast::domain::ml::{PositionFeatures, PredictorKind};
use defi_forecast::domain::ports::ModelStore;
use defi_forecast::infrastructure::persistence::FileModelStore;

fn params() -> ForestParams {
    ForestParams {
        n_trees: 12,
        max_depth: 6,
        min_samples_split: 2,
    }
}

#[test]
fn test_risk_model_save_load_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path());

    let mut trained = RiskPredictor::new(params());
    let (x, y) = SyntheticDataGenerator::new(42).risk_dataset(300);
    trained.train(&x, &y).unwrap();
    assert!(trained.save(&store).unwrap());

    let mut restored = RiskPredictor::new(params());
    assert!(restored.load(&store).unwrap());
    assert!(restored.is_trained());

    let probes = [
        (0.85, 0.4, 0.6, 3.0),
        (1.2, 0.7, 0.3, 8.0),
        (1.6, 0.66, 0.33, 5.0),
        (2.9, 0.9, 0.1, 14.0),
    ];
    for (h, c, d, a) in probes {
        let features = PositionFeatures {
            health_factor: Some(h),
            collateral_ratio: Some(c),
            debt_ratio: Some(d),
            apy: Some(a),
        };
        let (before, _) = trained.predict_with_mode(&features);
        let (after, mode) = restored.predict_with_mode(&features);
        assert_eq!(mode, PredictionMode::Model);
        assert_eq!(before.to_bits(), after.to_bits());
    }
}

#[test]
fn test_trend_model_save_load_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path());

    let mut trained = TrendPredictor::new(params());
    let (x, y) = SyntheticDataGenerator::new(42).apy_dataset(200, 30);
    trained.train(&x, &y).unwrap();
    trained.save(&store).unwrap();

    let mut restored = TrendPredictor::new(params());
    restored.load(&store).unwrap();

    let history = [4.0, 4.2, 4.1, 4.4, 4.3, 4.6, 4.5, 4.8];
    assert_eq!(
        trained.predict(&history).to_bits(),
        restored.predict(&history).to_bits()
    );
    assert_eq!(
        trained.predict_trend(&history),
        restored.predict_trend(&history)
    );
}

#[test]
fn test_missing_artifacts_leave_predictors_untrained() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path().join("does-not-exist"));

    let mut risk = RiskPredictor::default();
    let mut trend = TrendPredictor::default();
    assert!(!risk.load(&store).unwrap());
    assert!(!trend.load(&store).unwrap());
    assert!(!risk.is_trained());
    assert!(!trend.is_trained());
}

#[test]
fn test_untrained_predictor_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path());

    assert!(!RiskPredictor::default().save(&store).unwrap());
    assert!(store.load(PredictorKind::RiskForecaster).unwrap().is_none());
}

#[test]
fn test_artifact_of_wrong_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileModelStore::new(dir.path());

    let mut trend = TrendPredictor::new(params());
    let (x, y) = SyntheticDataGenerator::new(3).apy_dataset(80, 30);
    trend.train(&x, &y).unwrap();
    trend.save(&store).unwrap();

    // Put the trend artifact where the risk artifact belongs
    std::fs::copy(
        store.path_for(PredictorKind::ApyTrend),
        store.path_for(PredictorKind::RiskForecaster),
    )
    .unwrap();

    let mut risk = RiskPredictor::default();
    assert!(risk.load(&store).is_err());
    assert!(!risk.is_trained());
}
