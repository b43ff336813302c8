mod common;

use stepwright::{
    parser, Config, DetectionMode, Detector, Module, ModuleRequirement, Status,
    StepLoading, WorkerPool,
};

use self::common::{steps, FEATURES};

const DB: ModuleRequirement = ModuleRequirement::only(Module::Database);
const UI: ModuleRequirement = ModuleRequirement::only(Module::Ui);
const API: ModuleRequirement = ModuleRequirement::only(Module::Api);

fn detected(detector: Detector) -> Vec<(String, ModuleRequirement)> {
    parser::parse_path(FEATURES)
        .unwrap()
        .iter()
        .map(|s| (s.name.clone(), detector.detect(&s.descriptor())))
        .collect()
}

fn named(pairs: &[(&str, ModuleRequirement)]) -> Vec<(String, ModuleRequirement)> {
    pairs.iter().map(|(n, m)| ((*n).to_owned(), *m)).collect()
}

#[test]
fn hybrid_prefers_tags() {
    assert_eq!(
        detected(Detector::new(DetectionMode::Hybrid)),
        named(&[
            ("order persisted", DB),
            ("clicking without a browser", DB),
            ("querying the api", API),
            ("querying the api", API),
            ("buying through the promo banner", UI),
            ("buying on the redesigned page", UI),
            ("buying past a pinned banner", UI),
            ("checking out below the fold", UI),
            ("stalled page", UI),
        ]),
    );
}

#[test]
fn explicit_falls_back_to_browser() {
    let modules = detected(Detector::new(DetectionMode::Tags));
    assert_eq!(modules[1].1, DB);
    assert_eq!(modules[2].1, UI);

    let strict = detected(Detector::new(DetectionMode::Tags).default_browser(false));
    assert_eq!(strict[2].1, ModuleRequirement::none());
    assert_eq!(strict[4].1, UI);
}

#[test]
fn auto_reads_steps_only() {
    let modules = detected(Detector::new(DetectionMode::Patterns));
    assert_eq!(modules[0].1, DB);
    assert_eq!(modules[1].1, UI);
    assert_eq!(modules[3].1, API);
}

#[test]
fn forced_browser_and_disabled_detection() {
    let forced = detected(Detector::default().force_browser(true));
    assert_eq!(forced[0].1, DB.with(Module::Ui));

    let disabled = Detector {
        enabled: false,
        ..Detector::default()
    };
    assert!(detected(disabled)
        .iter()
        .all(|(_, m)| *m == ModuleRequirement::all()));
}

#[test]
fn explicit_database_scenario_starts_only_the_database() {
    let mut config = Config::default();
    config.detection.mode = DetectionMode::Tags;

    let scenarios = parser::parse_path(FEATURES).unwrap();
    let order = scenarios
        .into_iter()
        .find(|s| s.name == "order persisted")
        .unwrap();

    let result = WorkerPool::new(steps(), config).run(vec![order]).pop().unwrap();

    assert_eq!(result.modules, DB);
    assert!(result.passed(), "{result:#?}");
}

#[test]
fn whole_suite_in_parallel() {
    let config = Config {
        concurrency: 3,
        step_loading: StepLoading::Selective,
        ..Config::default()
    };
    let scenarios = parser::parse_path(FEATURES).unwrap();

    let results = WorkerPool::new(steps(), config).run(scenarios);

    let summary = results
        .iter()
        .map(|r| (r.name.as_str(), r.passed()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        [
            ("order persisted", true),
            ("clicking without a browser", false),
            ("querying the api", true),
            ("querying the api", true),
            ("buying through the promo banner", true),
            ("buying on the redesigned page", true),
            ("buying past a pinned banner", true),
            ("checking out below the fold", true),
            ("stalled page", false),
        ],
    );
    assert_eq!(results[8].steps[1].status, Status::TimedOut);
    assert_eq!(results[8].steps[2].status, Status::Skipped);
    assert_eq!(
        results.iter().filter(|r| r.steps.iter().any(|s| s.healed)).count(),
        4,
    );
}
