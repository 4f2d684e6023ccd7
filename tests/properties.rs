// tests/properties.rs

use proptest::prelude::*;

use ci_orchestrator::context::ContextInfo;
use ci_orchestrator::report::Report;
use ci_orchestrator::step::StepResult;
use ci_orchestrator::types::{ScopeKind, StepStatus};

fn status_strategy() -> impl Strategy<Value = StepStatus> {
    prop_oneof![
        Just(StepStatus::Success),
        Just(StepStatus::Failure),
        Just(StepStatus::Skipped),
    ]
}

fn report_strategy(max_results: usize) -> impl Strategy<Value = Report> {
    proptest::collection::vec(status_strategy(), 0..max_results).prop_map(|statuses| {
        let results = statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| StepResult::new(format!("step {i}"), format!("Step{i}"), status, None, None))
            .collect();
        let info = ContextInfo::new(false, "main", "abc123", "org/repo");
        Report::new(ScopeKind::Global, &info, results)
    })
}

fn titles(results: Vec<&StepResult>) -> Vec<String> {
    results.into_iter().map(|r| r.title.clone()).collect()
}

/// Is `sub` a subsequence of `full`?
fn preserves_order(sub: &[String], full: &[String]) -> bool {
    let mut it = full.iter();
    sub.iter().all(|s| it.any(|f| f == s))
}

proptest! {
    #[test]
    fn exit_code_mapping_is_total_over_known_codes(code in any::<i32>()) {
        match StepStatus::from_exit_code(code) {
            Ok(StepStatus::Success) => { prop_assert_eq!(code, 0); }
            Ok(StepStatus::Failure) => { prop_assert_eq!(code, 1); }
            Ok(StepStatus::Skipped) => { prop_assert_eq!(code, 5); }
            Err(_) => { prop_assert!(code != 0 && code != 1 && code != 5); }
        }
    }

    #[test]
    fn partitions_cover_results_disjointly_and_in_order(report in report_strategy(20)) {
        let all = titles(report.results.iter().collect());
        let successful = titles(report.successful());
        let failed = titles(report.failed());
        let skipped = titles(report.skipped());

        prop_assert_eq!(successful.len() + failed.len() + skipped.len(), all.len());

        let mut union: Vec<String> = successful.iter().chain(&failed).chain(&skipped).cloned().collect();
        union.sort();
        let mut sorted_all = all.clone();
        sorted_all.sort();
        prop_assert_eq!(union, sorted_all);

        prop_assert!(preserves_order(&successful, &all));
        prop_assert!(preserves_order(&failed, &all));
        prop_assert!(preserves_order(&skipped, &all));

        prop_assert_eq!(report.success(), failed.is_empty() && !all.is_empty());
    }

    #[test]
    fn serialization_is_stable(report in report_strategy(10)) {
        prop_assert_eq!(report.to_json().unwrap(), report.to_json().unwrap());
    }
}

#[test]
fn empty_report_is_not_successful() {
    let info = ContextInfo::new(true, "main", "abc123", "org/repo");
    let report = Report::new(ScopeKind::Global, &info, Vec::new());
    assert!(report.failed().is_empty());
    assert!(!report.success());
}
