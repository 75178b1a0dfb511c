//! Work package types and validation
//!
//! The planner returns a work package as free text. `WorkPackageReport::parse`
//! turns that text into a typed package, recomputes the total and flags
//! structural problems without rejecting the package.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors from interpreting planner output
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Malformed work package: {0}")]
    MalformedWorkPackage(String),
}

/// One task in a work package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub estimated_minutes: i64,
    #[serde(default)]
    pub required_ratings: Vec<String>,
    #[serde(default)]
    pub required_tools: Vec<String>,
    #[serde(default)]
    pub required_parts: Vec<String>,
    /// Ids of steps that must finish first
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Structured maintenance task breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackage {
    #[serde(default)]
    pub work_package_id: String,
    #[serde(default)]
    pub aircraft_type: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub fault_description: String,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub total_estimated_minutes: i64,
}

impl WorkPackage {
    /// Sum of step estimates, `None` when it does not fit in an i64
    pub fn computed_total(&self) -> Option<i64> {
        self.steps.iter().try_fold(0i64, |acc, s| acc.checked_add(s.estimated_minutes))
    }
}

/// A structural problem found in a work package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanIssue {
    TotalMismatch { declared: i64, computed: i64 },
    TotalOverflow,
    NonPositiveEstimate { step: String },
    UnknownDependency { step: String, dependency: String },
    DependencyCycle { steps: Vec<String> },
    DuplicateStepId { step: String },
}

impl std::fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalMismatch { declared, computed } => {
                write!(f, "declared total {} min differs from step sum {} min", declared, computed)
            }
            Self::TotalOverflow => write!(f, "step estimates overflow the total"),
            Self::NonPositiveEstimate { step } => write!(f, "step {} has a non-positive estimate", step),
            Self::UnknownDependency { step, dependency } => {
                write!(f, "step {} depends on unknown step {}", step, dependency)
            }
            Self::DependencyCycle { steps } => write!(f, "dependency cycle: {}", steps.join(" -> ")),
            Self::DuplicateStepId { step } => write!(f, "duplicate step id {}", step),
        }
    }
}

/// A parsed work package with its total recomputed and issues flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackageReport {
    pub work_package: WorkPackage,
    pub issues: Vec<PlanIssue>,
}

impl WorkPackageReport {
    /// Parse planner output, tolerating Markdown code fences
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        debug!(len = text.len(), "WorkPackageReport::parse: called");
        let body = strip_code_fences(text);
        if body.is_empty() {
            return Err(PlanError::MalformedWorkPackage("empty response".to_string()));
        }

        let work_package: WorkPackage =
            serde_json::from_str(body).map_err(|e| PlanError::MalformedWorkPackage(e.to_string()))?;
        Ok(Self::validate(work_package))
    }

    /// Recompute the total and collect issues
    pub fn validate(mut work_package: WorkPackage) -> Self {
        let mut issues = Vec::new();

        let computed = match work_package.computed_total() {
            Some(total) => total,
            None => {
                debug!("validate: step sum overflows");
                issues.push(PlanIssue::TotalOverflow);
                work_package
                    .steps
                    .iter()
                    .fold(0i64, |acc, s| acc.saturating_add(s.estimated_minutes))
            }
        };
        if computed != work_package.total_estimated_minutes {
            debug!(declared = work_package.total_estimated_minutes, computed, "validate: total mismatch");
            issues.push(PlanIssue::TotalMismatch {
                declared: work_package.total_estimated_minutes,
                computed,
            });
            work_package.total_estimated_minutes = computed;
        }

        let mut seen = HashSet::new();
        for step in &work_package.steps {
            if !seen.insert(step.id.as_str()) {
                issues.push(PlanIssue::DuplicateStepId { step: step.id.clone() });
            }
            if step.estimated_minutes <= 0 {
                issues.push(PlanIssue::NonPositiveEstimate { step: step.id.clone() });
            }
        }

        for step in &work_package.steps {
            for dep in &step.dependencies {
                if !seen.contains(dep.as_str()) {
                    issues.push(PlanIssue::UnknownDependency {
                        step: step.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        issues.extend(find_cycles(&work_package.steps).into_iter().map(|steps| PlanIssue::DependencyCycle { steps }));

        debug!(issue_count = issues.len(), "validate: done");
        Self { work_package, issues }
    }

    /// True when no issue was flagged
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Remove a surrounding Markdown code fence, if any
///
/// Handles "```json\n...\n```" as well as leading prose before the fence.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[start + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Every elementary dependency cycle, each reported once
///
/// Cycles are returned starting from their smallest step id so the same
/// loop reached from different entry points dedupes.
fn find_cycles(steps: &[Step]) -> Vec<Vec<String>> {
    let graph: HashMap<&str, Vec<&str>> = steps
        .iter()
        .map(|s| (s.id.as_str(), s.dependencies.iter().map(String::as_str).collect()))
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        graph: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        marks.insert(node, Mark::InProgress);
        stack.push(node);

        for &next in graph.get(node).into_iter().flatten() {
            if !graph.contains_key(next) {
                continue;
            }
            match marks.get(next).copied().unwrap_or(Mark::Unvisited) {
                Mark::Unvisited => visit(next, graph, marks, stack, cycles),
                Mark::InProgress => {
                    if let Some(pos) = stack.iter().position(|&n| n == next) {
                        let mut cycle: Vec<String> = stack[pos..].iter().map(|s| s.to_string()).collect();
                        if let Some(min) = cycle.iter().enumerate().min_by(|a, b| a.1.cmp(b.1)).map(|(i, _)| i) {
                            cycle.rotate_left(min);
                        }
                        if !cycles.contains(&cycle) {
                            cycles.push(cycle);
                        }
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks.insert(node, Mark::Done);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut cycles = Vec::new();
    for step in steps {
        if marks.get(step.id.as_str()).copied().unwrap_or(Mark::Unvisited) == Mark::Unvisited {
            let mut stack = Vec::new();
            visit(step.id.as_str(), &graph, &mut marks, &mut stack, &mut cycles);
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_json(id: &str, minutes: i64, deps: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("Step {}", id),
            "description": "",
            "estimated_minutes": minutes,
            "required_ratings": ["B1"],
            "required_tools": [],
            "required_parts": [],
            "dependencies": deps,
        })
    }

    fn package_json(steps: Vec<serde_json::Value>, total: i64) -> String {
        serde_json::json!({
            "work_package_id": "WP-001",
            "aircraft_type": "A320",
            "component": "Aileron actuator",
            "fault_description": "hydraulic leak on aileron actuator",
            "steps": steps,
            "risks": ["Hydraulic pressure release"],
            "total_estimated_minutes": total,
        })
        .to_string()
    }

    #[test]
    fn test_parse_clean_package() {
        let text = package_json(vec![step_json("1", 30, &[]), step_json("2", 45, &["1"])], 75);
        let report = WorkPackageReport::parse(&text).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.work_package.total_estimated_minutes, 75);
        assert_eq!(report.work_package.steps.len(), 2);
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let text = format!("```json\n{}\n```", package_json(vec![step_json("1", 30, &[])], 30));
        assert!(WorkPackageReport::parse(&text).is_ok());

        let with_prose = format!("Here is the plan:\n```\n{}\n```\n", package_json(vec![step_json("1", 30, &[])], 30));
        assert!(WorkPackageReport::parse(&with_prose).is_ok());
    }

    #[test]
    fn test_total_recomputed_and_flagged() {
        let text = package_json(vec![step_json("1", 30, &[]), step_json("2", 45, &["1"])], 60);
        let report = WorkPackageReport::parse(&text).unwrap();

        assert_eq!(report.work_package.total_estimated_minutes, 75);
        assert_eq!(
            report.issues,
            vec![PlanIssue::TotalMismatch {
                declared: 60,
                computed: 75
            }]
        );
    }

    #[test]
    fn test_overflowing_total_flagged() {
        let text = r#"{"steps":[{"id":"1","title":"a","estimated_minutes":9223372036854775807},{"id":"2","title":"b","estimated_minutes":10}],"total_estimated_minutes":0}"#;
        let report = WorkPackageReport::parse(text).unwrap();

        assert_eq!(report.work_package.total_estimated_minutes, i64::MAX);
        assert_eq!(report.issues[0], PlanIssue::TotalOverflow);
        assert!(report.issues.contains(&PlanIssue::TotalMismatch {
            declared: 0,
            computed: i64::MAX
        }));
        assert_eq!(report.work_package.computed_total(), None);
    }

    #[test]
    fn test_unknown_dependency_and_cycle_flagged() {
        let text = package_json(
            vec![
                step_json("1", 10, &["3"]),
                step_json("2", 10, &["1"]),
                step_json("3", 10, &["2", "9"]),
            ],
            30,
        );
        let report = WorkPackageReport::parse(&text).unwrap();

        assert!(report.issues.contains(&PlanIssue::UnknownDependency {
            step: "3".to_string(),
            dependency: "9".to_string()
        }));
        assert!(report.issues.contains(&PlanIssue::DependencyCycle {
            steps: vec!["1".to_string(), "3".to_string(), "2".to_string()]
        }));
        assert_eq!(report.work_package.steps.len(), 3);
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let text = package_json(vec![step_json("1", 10, &["1"])], 10);
        let report = WorkPackageReport::parse(&text).unwrap();
        assert_eq!(
            report.issues,
            vec![PlanIssue::DependencyCycle {
                steps: vec!["1".to_string()]
            }]
        );
    }

    #[test]
    fn test_non_positive_and_duplicate_flagged() {
        let text = package_json(vec![step_json("1", 0, &[]), step_json("1", 20, &[])], 20);
        let report = WorkPackageReport::parse(&text).unwrap();
        assert!(report.issues.contains(&PlanIssue::NonPositiveEstimate { step: "1".to_string() }));
        assert!(report.issues.contains(&PlanIssue::DuplicateStepId { step: "1".to_string() }));
    }

    #[test]
    fn test_malformed_inputs() {
        for text in ["", "I cannot help with that", "[1, 2, 3]", "{\"component\": \"aileron\"}"] {
            assert!(
                matches!(WorkPackageReport::parse(text), Err(PlanError::MalformedWorkPackage(_))),
                "expected malformed for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_issue_display() {
        let issue = PlanIssue::DependencyCycle {
            steps: vec!["1".to_string(), "2".to_string()],
        };
        assert_eq!(issue.to_string(), "dependency cycle: 1 -> 2");
    }

    fn chain(minutes: &[i64]) -> WorkPackage {
        let steps = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| Step {
                id: format!("S{}", i),
                title: format!("Step {}", i),
                description: String::new(),
                estimated_minutes: *m,
                required_ratings: vec![],
                required_tools: vec![],
                required_parts: vec![],
                dependencies: if i == 0 { vec![] } else { vec![format!("S{}", i - 1)] },
            })
            .collect();
        WorkPackage {
            work_package_id: "WP".to_string(),
            aircraft_type: String::new(),
            component: String::new(),
            fault_description: String::new(),
            steps,
            risks: vec![],
            total_estimated_minutes: 0,
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_total_is_recomputed(minutes in proptest::collection::vec(1i64..600, 1..12)) {
            let report = WorkPackageReport::validate(chain(&minutes));
            proptest::prop_assert_eq!(report.work_package.total_estimated_minutes, minutes.iter().sum::<i64>());
            let has_cycle = report.issues.iter().any(|i| matches!(i, PlanIssue::DependencyCycle { .. }));
            proptest::prop_assert!(!has_cycle);
        }

        #[test]
        fn prop_huge_estimates_saturate_the_total(minutes in proptest::collection::vec(i64::MAX / 4..=i64::MAX, 1..8)) {
            let report = WorkPackageReport::validate(chain(&minutes));
            let exact = minutes.iter().try_fold(0i64, |acc, m| acc.checked_add(*m));
            let flagged = report.issues.contains(&PlanIssue::TotalOverflow);
            proptest::prop_assert_eq!(flagged, exact.is_none());
            proptest::prop_assert_eq!(report.work_package.total_estimated_minutes, exact.unwrap_or(i64::MAX));
        }

        #[test]
        fn prop_closing_the_chain_reports_one_cycle(minutes in proptest::collection::vec(1i64..600, 2..12)) {
            let mut wp = chain(&minutes);
            let last = format!("S{}", minutes.len() - 1);
            wp.steps[0].dependencies.push(last);
            let report = WorkPackageReport::validate(wp);
            let cycles: Vec<_> = report
                .issues
                .iter()
                .filter_map(|i| match i {
                    PlanIssue::DependencyCycle { steps } => Some(steps.len()),
                    _ => None,
                })
                .collect();
            proptest::prop_assert_eq!(cycles, vec![minutes.len()]);
        }
    }
}
