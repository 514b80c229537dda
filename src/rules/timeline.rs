//! Timeline checks over task blocks: due dates that precede a dependency's
//! due date, and dependency cycles.

use std::collections::{BTreeSet, HashMap};

use crate::block::{SpecBlock, SpecType};
use crate::issue::{Severity, ValidationIssue};

use super::{RuleContext, RuleEvaluationError, RuleKind};

const RULE: RuleKind = RuleKind::Timeline;

pub(crate) fn evaluate(
    ctx: &RuleContext<'_>,
) -> Result<Vec<ValidationIssue>, RuleEvaluationError> {
    let severity = ctx.severity_for(RULE, Severity::Error);
    let tasks: Vec<&SpecBlock> = ctx
        .blocks
        .iter()
        .filter(|b| b.block_type == SpecType::Task)
        .collect();
    let by_id: HashMap<&str, &SpecBlock> = tasks.iter().map(|t| (t.id.as_str(), *t)).collect();

    let mut issues = Vec::new();

    // A task cannot be due before anything it depends on.
    for task in &tasks {
        let Some(due) = task.due_date else { continue };
        for dep_id in task.dependency_ids() {
            let Some(dep) = by_id.get(dep_id.as_str()) else {
                continue; // unknown deps are the structure rule's concern
            };
            let Some(dep_due) = dep.due_date else { continue };
            if due < dep_due {
                issues.push(ValidationIssue::new(
                    RULE.id(),
                    severity,
                    format!(
                        "task '{}' is due {} but depends on '{}' due {}",
                        task.id, due, dep.id, dep_due
                    ),
                    vec![task.id.clone(), dep.id.clone()],
                ));
            }
        }
    }

    // Each dependency cycle is reported exactly once, not once per member.
    for cycle in find_cycles(&tasks, &by_id) {
        issues.push(ValidationIssue::new(
            RULE.id(),
            severity,
            format!("dependency cycle among tasks: {}", cycle.join(" -> ")),
            cycle,
        ));
    }

    Ok(issues)
}

/// Depth-first search over the task dependency graph. Returned cycles are
/// canonicalized (rotated to start at their smallest member) and
/// deduplicated by member set.
fn find_cycles(tasks: &[&SpecBlock], by_id: &HashMap<&str, &SpecBlock>) -> Vec<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut seen_sets: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut cycles = Vec::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a SpecBlock>,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        seen_sets: &mut BTreeSet<Vec<String>>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        marks.insert(id, Mark::InProgress);
        path.push(id);

        let deps: &'a [String] = by_id.get(id).map(|t| t.dependency_ids()).unwrap_or(&[]);
        for dep in deps {
            let dep_id: &'a str = dep.as_str();
            if !by_id.contains_key(dep_id) {
                continue;
            }
            match marks.get(dep_id) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => {
                    if let Some(start) = path.iter().position(|p| *p == dep_id) {
                        let cycle = canonicalize(&path[start..]);
                        let mut key: Vec<String> = cycle.clone();
                        key.sort();
                        if seen_sets.insert(key) {
                            cycles.push(cycle);
                        }
                    }
                }
                None => visit(dep_id, by_id, marks, path, seen_sets, cycles),
            }
        }

        path.pop();
        marks.insert(id, Mark::Done);
    }

    for task in tasks {
        if !marks.contains_key(task.id.as_str()) {
            let mut path = Vec::new();
            visit(
                task.id.as_str(),
                by_id,
                &mut marks,
                &mut path,
                &mut seen_sets,
                &mut cycles,
            );
        }
    }

    cycles
}

/// Rotate a cycle so it starts at its lexicographically smallest member,
/// preserving edge order.
fn canonicalize(cycle: &[&str]) -> Vec<String> {
    let smallest = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[smallest..]
        .iter()
        .chain(cycle[..smallest].iter())
        .map(|s| s.to_string())
        .collect()
}
