mod common;

use common::{fails, panics, passes, requirement, runner, runner_with_forced_price, Exploding};
use pretty_assertions::assert_eq;
use scenario_context::{Context, PriceOracle, PRICE_SCALE};
use scenario_requirement::{Requirement, ResolveError, Spec};
use scenario_runner::{
    Conflict, Outcome, RunnerConfig, ScenarioError, ScenarioOptions, ScenarioRegistry, Stage,
};
use scenario_test_utils::SimContext;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn only_after_upgrade(ctx: SimContext) -> anyhow::Result<bool> {
    Ok(ctx.deployment() > 0)
}

async fn broken_filter(_: SimContext) -> anyhow::Result<bool> {
    anyhow::bail!("filter could not read the market")
}

async fn expect_base_price_two(ctx: SimContext) -> anyhow::Result<()> {
    anyhow::ensure!(ctx.price("USDC").await? == 2 * PRICE_SCALE, "base price not forced");
    Ok(())
}

fn setup_error(outcome: &Outcome) -> &ScenarioError {
    match outcome {
        Outcome::SetupFailure(error) => error,
        other => panic!("expected setup failure, got {other:?}"),
    }
}

#[tokio::test]
async fn skipped_scenarios_never_touch_the_world() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.skip("later", requirement(json!({"prices": {"$base": 1}})), passes);

    let report = runner.run(&registry).await;
    let execution = report.execution("later").unwrap();
    assert!(execution.outcome.is_skipped());
    assert_eq!(execution.stages, vec![Stage::Built, Stage::Skipped]);
    assert_eq!(runner.world().contexts_issued(), 0);
}

#[tokio::test]
async fn only_focuses_the_run() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario("unfocused", Requirement::empty(), ScenarioOptions::new(), fails)
        .only("focused", Requirement::empty(), passes);

    let report = runner.run(&registry).await;
    assert_eq!(report.executions.len(), 1);
    assert!(report.execution("focused").unwrap().outcome.is_passed());
    assert!(report.is_success());
}

#[tokio::test]
async fn rejected_admission_filter_skips() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "needs upgrade",
        requirement(json!({"prices": {"$base": 1}})),
        ScenarioOptions::new().with_filter(only_after_upgrade),
        fails,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("needs upgrade").unwrap();
    assert!(execution.outcome.is_skipped());
    assert_eq!(
        execution.stages,
        vec![Stage::Built, Stage::Filtering, Stage::Skipped]
    );
    assert_eq!(runner.world().contexts_issued(), 1);
    assert_eq!(runner.world().restores(), 1);
}

#[tokio::test]
async fn failing_filter_is_a_setup_failure() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "broken filter",
        Requirement::empty(),
        ScenarioOptions::new().with_filter(broken_filter),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("broken filter").unwrap();
    assert!(matches!(setup_error(&execution.outcome), ScenarioError::Filter(_)));
    assert_eq!(
        execution.stages,
        vec![Stage::Built, Stage::Filtering, Stage::TornDown]
    );
}

#[tokio::test]
async fn unknown_alias_fails_while_solving() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "bad alias",
        requirement(json!({"prices": {"$asset9": 1}})),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("bad alias").unwrap();
    assert!(matches!(
        setup_error(&execution.outcome),
        ScenarioError::Solve { constraint: "prices", .. }
    ));
    assert_eq!(
        execution.stages,
        vec![Stage::Built, Stage::Filtering, Stage::Solving, Stage::TornDown]
    );
}

#[tokio::test]
async fn failing_resolver_is_a_resolution_failure() {
    let runner = runner();
    let requirement = Requirement::builder()
        .with_dynamic("prices", |_: &SimContext| {
            Err(ResolveError::missing("oracle feed"))
        })
        .build()
        .unwrap();
    let mut registry = ScenarioRegistry::new();
    registry.scenario("no feed", requirement, ScenarioOptions::new(), passes);

    let report = runner.run(&registry).await;
    let error = setup_error(&report.execution("no feed").unwrap().outcome);
    assert!(matches!(error, ScenarioError::Resolution { constraint: "prices", .. }));
    assert!(error.to_string().contains("oracle feed"), "{error}");
}

#[tokio::test]
async fn dynamic_requirement_reads_the_context() {
    let runner = runner();
    let requirement = Requirement::builder()
        .with_dynamic("prices", |ctx: &SimContext| {
            let configuration = ctx.configuration();
            let base = configuration
                .base_token()
                .ok_or_else(|| ResolveError::missing("base token"))?;
            Ok(Spec::object([(base, Spec::literal(2))]))
        })
        .build()
        .unwrap();
    let mut registry = ScenarioRegistry::new();
    registry.scenario("dynamic", requirement, ScenarioOptions::new(), expect_base_price_two);

    let report = runner.run(&registry).await;
    assert!(report.is_success(), "{:#}", report.to_json());
    assert_eq!(
        report.execution("dynamic").unwrap().requirement.to_json(),
        json!({"prices": {"USDC": 2}})
    );
}

#[tokio::test]
async fn apply_failure_stops_later_solutions() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "unsatisfiable balance",
        requirement(json!({
            "prices": {"$base": 2},
            "tokenBalances": {"albert": {"$base": "< 0"}},
            "pause": {"supplyPaused": true},
        })),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("unsatisfiable balance").unwrap();
    assert!(matches!(
        setup_error(&execution.outcome),
        ScenarioError::Apply { step: 1, .. }
    ));
    assert_eq!(execution.solutions_applied, 1);
    assert_eq!(
        execution.stages,
        vec![
            Stage::Built,
            Stage::Filtering,
            Stage::Solving,
            Stage::Applying,
            Stage::TornDown,
        ]
    );
}

#[tokio::test]
async fn body_errors_and_panics_are_body_failures() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario("errors", Requirement::empty(), ScenarioOptions::new(), fails)
        .scenario("panics", Requirement::empty(), ScenarioOptions::new(), panics);

    let report = runner.run(&registry).await;
    assert_eq!(report.summary().failed, 2);

    match &report.execution("errors").unwrap().outcome {
        Outcome::Failed(ScenarioError::Body(error)) => {
            assert_eq!(error.to_string(), "assertion failed");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    match &report.execution("panics").unwrap().outcome {
        Outcome::Failed(ScenarioError::BodyPanicked(message)) => {
            assert_eq!(message, "unexpected state");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        report.execution("panics").unwrap().stages.last(),
        Some(&Stage::TornDown)
    );
    assert_eq!(runner.world().restores(), runner.world().contexts_issued());
}

#[tokio::test]
async fn variants_are_suffixed_in_product_order() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "grid",
        requirement(json!({
            "upgrade": {"governor": ["a", "b"]},
            "prices": {"$asset0": [1000, 2000]},
        })),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    assert!(report.is_success(), "{:#}", report.to_json());

    let ids: Vec<String> = report.executions.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, ["grid#0", "grid#1", "grid#2", "grid#3"]);

    let second = report.execution("grid#1").unwrap();
    assert_eq!(
        second.requirement.to_json(),
        json!({
            "prices": {"$asset0": 2000},
            "upgrade": {"governor": "a"},
        })
    );
    let third = report.execution("grid#2").unwrap();
    assert_eq!(
        third.requirement.to_json(),
        json!({
            "prices": {"$asset0": 1000},
            "upgrade": {"governor": "b"},
        })
    );
}

#[tokio::test]
async fn variant_cap_is_a_setup_failure() {
    let runner = runner().with_config(RunnerConfig::default().with_max_variants(3));
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "grid",
        requirement(json!({
            "upgrade": {"governor": ["a", "b"]},
            "prices": {"$asset0": [1000, 2000]},
        })),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    assert_eq!(report.executions.len(), 1);
    assert!(matches!(
        setup_error(&report.execution("grid").unwrap().outcome),
        ScenarioError::VariantLimit { count: 4, limit: 3 }
    ));
}

#[tokio::test]
async fn empty_alternatives_veto_the_scenario() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "vetoed",
        requirement(json!({"prices": {"$base": []}})),
        ScenarioOptions::new(),
        fails,
    );

    let report = runner.run(&registry).await;
    assert!(report.executions.is_empty());
    assert!(report.is_success());
    assert_eq!(runner.world().contexts_issued(), 1);
}

#[tokio::test]
async fn overlapping_constraints_are_reported() {
    let runner = runner_with_forced_price();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "overlap",
        requirement(json!({"prices": {"$base": 1}, "forcePrice": 1})),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("overlap").unwrap();
    assert!(execution.outcome.is_passed());
    assert_eq!(
        execution.conflicts,
        vec![Conflict {
            key: "price.USDC".to_string(),
            constraints: vec!["prices", "force_price"],
        }]
    );
}

#[tokio::test]
async fn denied_conflicts_fail_before_applying() {
    let runner =
        runner_with_forced_price().with_config(RunnerConfig::default().with_deny_conflicts(true));
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "overlap",
        requirement(json!({"prices": {"$base": 1}, "forcePrice": 1})),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("overlap").unwrap();
    assert!(matches!(
        setup_error(&execution.outcome),
        ScenarioError::Conflict { key, .. } if key == "price.USDC"
    ));
    assert_eq!(execution.solutions_applied, 0);
    assert_eq!(
        execution.stages,
        vec![Stage::Built, Stage::Filtering, Stage::Solving, Stage::TornDown]
    );
    // planning only
    assert_eq!(runner.world().contexts_issued(), 1);
}

#[tokio::test]
async fn later_constraint_breaks_earlier_check() {
    let runner = runner_with_forced_price();
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "overridden",
        requirement(json!({"prices": {"$base": 1}, "forcePrice": 2})),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("overridden").unwrap();
    assert!(matches!(
        setup_error(&execution.outcome),
        ScenarioError::Check { constraint: "prices", .. }
    ));
    assert_eq!(execution.solutions_applied, 2);
    assert_eq!(
        execution.stages,
        vec![
            Stage::Built,
            Stage::Filtering,
            Stage::Solving,
            Stage::Applying,
            Stage::Verifying,
            Stage::TornDown,
        ]
    );
}

#[tokio::test]
async fn unverified_runs_see_last_writer() {
    let runner = runner_with_forced_price()
        .with_config(RunnerConfig::default().with_verify_constraints(false));
    let mut registry = ScenarioRegistry::new();
    registry.scenario(
        "overridden",
        requirement(json!({"prices": {"$base": 1}, "forcePrice": 2})),
        ScenarioOptions::new(),
        expect_base_price_two,
    );

    let report = runner.run(&registry).await;
    let execution = report.execution("overridden").unwrap();
    assert!(execution.outcome.is_passed(), "{:#}", execution.to_json());
    assert!(!execution.stages.contains(&Stage::Verifying));
}

async fn sleep_then_pass(ms: u64) -> anyhow::Result<()> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Ok(())
}

#[tokio::test]
async fn reports_keep_registration_order() {
    let runner = runner().with_config(RunnerConfig::default().with_max_concurrency(3));
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario("slow", Requirement::empty(), ScenarioOptions::new(), |_: SimContext| {
            sleep_then_pass(40)
        })
        .scenario("medium", Requirement::empty(), ScenarioOptions::new(), |_: SimContext| {
            sleep_then_pass(20)
        })
        .scenario("fast", Requirement::empty(), ScenarioOptions::new(), |_: SimContext| {
            sleep_then_pass(0)
        });

    let report = runner.run(&registry).await;
    let ids: Vec<String> = report.executions.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, ["slow", "medium", "fast"]);
}

#[tokio::test]
async fn json_report() {
    let runner = runner();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario("passes", requirement(json!({"prices": {"$base": 1}})), ScenarioOptions::new(), passes)
        .skip("skipped", Requirement::empty(), passes);

    let json = runner.run(&registry).await.to_json();
    assert_eq!(
        json["summary"],
        json!({"total": 2, "passed": 1, "skipped": 1, "setup_failures": 0, "failed": 0})
    );
    assert_eq!(json["executions"][0]["id"], "passes");
    assert_eq!(json["executions"][0]["status"], "passed");
    assert_eq!(json["executions"][0]["solutions_applied"], 1);
    assert_eq!(json["executions"][1]["stages"], json!(["built", "skipped"]));
    assert!(json["run_id"].as_str().is_some_and(|id| id.len() == 26));
}

#[tokio::test]
async fn huge_range_hits_the_cap_before_enumeration() {
    let runner = runner();
    let wide = Requirement::builder()
        .with("upgrade", Spec::object([("governor", Spec::range(0, i64::MAX))]))
        .build()
        .unwrap();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario("wide", wide, ScenarioOptions::new(), passes)
        .scenario("narrow", requirement(json!({"prices": {"$base": 1}})), ScenarioOptions::new(), passes);

    let report = runner.run(&registry).await;
    assert!(matches!(
        setup_error(&report.execution("wide").unwrap().outcome),
        ScenarioError::VariantLimit { limit: 256, count } if *count == usize::try_from(i64::MAX).unwrap()
    ));
    assert!(report.execution("narrow").unwrap().outcome.is_passed());
}

#[tokio::test]
async fn oversized_constraint_fails_even_when_vetoed() {
    let runner = runner();
    let requirement = Requirement::builder()
        .with("upgrade", Spec::object([("governor", Spec::range(0, i64::MAX))]))
        .with("prices", Spec::object([("$base", Spec::OneOf(Vec::new()))]))
        .build()
        .unwrap();
    let mut registry = ScenarioRegistry::new();
    registry.scenario("vetoed but wide", requirement, ScenarioOptions::new(), passes);

    let report = runner.run(&registry).await;
    assert!(matches!(
        setup_error(&report.execution("vetoed but wide").unwrap().outcome),
        ScenarioError::VariantLimit { limit: 256, .. }
    ));
}

#[tokio::test]
async fn constraint_panics_stay_with_their_execution() {
    let runner = runner().with_constraint(Arc::new(Exploding));
    let mut registry = ScenarioRegistry::new();
    for phase in ["solve", "apply", "check"] {
        registry.scenario(
            phase,
            requirement(json!({"explode": phase})),
            ScenarioOptions::new(),
            passes,
        );
    }
    registry.scenario(
        "unaffected",
        requirement(json!({"explode": "never", "prices": {"$base": 1}})),
        ScenarioOptions::new(),
        passes,
    );

    let report = runner.run(&registry).await;
    assert_eq!(report.executions.len(), 4);
    for (phase, expected) in [
        ("solve", "exploded while solving"),
        ("apply", "exploded while applying"),
        ("check", "exploded while checking"),
    ] {
        let execution = report.execution(phase).unwrap();
        match setup_error(&execution.outcome) {
            ScenarioError::SetupPanicked(message) => assert_eq!(message, expected),
            other => panic!("{phase}: unexpected error {other}"),
        }
        assert_eq!(execution.stages.last(), Some(&Stage::TornDown));
    }
    assert!(report.execution("unaffected").unwrap().outcome.is_passed());
    assert_eq!(runner.world().restores(), runner.world().contexts_issued());
}
