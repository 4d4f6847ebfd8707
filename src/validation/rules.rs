//! Validation rules for chart drafts using `Validation`.

use crate::builder::draft::Draft;
use crate::builder::DeclaredKind;
use crate::validation::violations::ChartViolation;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome of a single rule.
pub(crate) type Check = Validation<(), NonEmptyVec<ChartViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> ChartViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

fn kind_label(kind: DeclaredKind) -> &'static str {
    match kind {
        DeclaredKind::Plain => "Atomic",
        DeclaredKind::Parallel => "Parallel",
        DeclaredKind::Final => "Final",
        DeclaredKind::History(_) => "History",
    }
}

/// Validate a whole draft, accumulating ALL violations.
pub(crate) fn validate(draft: &Draft) -> Check {
    let index = draft.index();
    let mut checks = Vec::new();

    checks.push(check(!draft.states[0].children.is_empty(), || {
        ChartViolation::EmptyChart {
            chart: draft.states[0].name.clone(),
        }
    }));
    checks.extend(unique_names(draft));
    checks.extend(state_structure(draft));
    checks.extend(initial_targets(draft, &index));
    checks.extend(transitions(draft, &index));

    Validation::all_vec(checks).map(|_| ())
}

fn unique_names(draft: &Draft) -> Vec<Check> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut checks = Vec::new();
    for state in &draft.states {
        let name = state.name.as_str();
        if !seen.insert(name) && reported.insert(name) {
            checks.push(Validation::fail(ChartViolation::DuplicateState {
                name: name.to_string(),
            }));
        }
    }
    checks
}

fn state_structure(draft: &Draft) -> Vec<Check> {
    let mut checks = Vec::new();
    for (i, state) in draft.states.iter().enumerate() {
        let leaf_only = matches!(state.kind, DeclaredKind::Final | DeclaredKind::History(_));

        checks.push(check(!leaf_only || state.children.is_empty(), || {
            ChartViolation::ChildrenNotAllowed {
                state: state.name.clone(),
                kind: kind_label(state.kind),
            }
        }));

        checks.push(check(!leaf_only || state.transitions.is_empty(), || {
            ChartViolation::TransitionsNotAllowed {
                state: state.name.clone(),
                kind: kind_label(state.kind),
            }
        }));

        let regular = state
            .children
            .iter()
            .any(|&c| !matches!(draft.states[c].kind, DeclaredKind::History(_)));
        if state.kind == DeclaredKind::Parallel {
            checks.push(check(regular, || ChartViolation::EmptyParallel {
                state: state.name.clone(),
            }));
        }
        if draft.is_compound(i) {
            checks.push(check(regular, || ChartViolation::NoRegularChildren {
                state: state.name.clone(),
            }));
        }

        let declares_initial = !state.initial.is_empty() || !state.initial_actions.is_empty();
        let may_declare =
            draft.is_compound(i) || matches!(state.kind, DeclaredKind::History(_));
        checks.push(check(!declares_initial || may_declare, || {
            ChartViolation::InitialNotAllowed {
                state: state.name.clone(),
            }
        }));
    }
    checks
}

fn initial_targets(draft: &Draft, index: &HashMap<&str, usize>) -> Vec<Check> {
    let mut checks = Vec::new();
    for (i, state) in draft.states.iter().enumerate() {
        // Initial targets must lie inside the region they initialize: the
        // compound itself, or the parent of a history pseudostate.
        let region = match state.kind {
            DeclaredKind::History(_) => state.parent,
            _ => Some(i),
        };
        let mut resolved = Vec::new();
        for target in &state.initial {
            match index.get(target.as_str()) {
                None => checks.push(Validation::fail(ChartViolation::UnknownInitial {
                    state: state.name.clone(),
                    target: target.clone(),
                })),
                Some(&t) => {
                    let inside = region.is_some_and(|r| draft.is_descendant(t, r));
                    checks.push(check(inside, || ChartViolation::InitialOutsideRegion {
                        state: state.name.clone(),
                        target: target.clone(),
                    }));
                    resolved.push(t);
                }
            }
        }
        checks.push(check(distinct_regions(draft, &resolved), || {
            ChartViolation::ConflictingTargets {
                state: state.name.clone(),
            }
        }));
    }
    checks
}

fn transitions(draft: &Draft, index: &HashMap<&str, usize>) -> Vec<Check> {
    let mut checks = Vec::new();
    for transition in &draft.transitions {
        let source = &draft.states[transition.source].name;

        let eventless = transition.triggers.iter().filter(|t| t.0.is_none()).count();
        checks.push(check(
            eventless == 0 || eventless == transition.triggers.len(),
            || ChartViolation::MixedTriggers {
                state: source.clone(),
            },
        ));

        let empty_descriptor = transition
            .triggers
            .iter()
            .any(|(event, _)| event.as_deref().is_some_and(|e| e.trim().is_empty()));
        checks.push(check(!empty_descriptor, || {
            ChartViolation::EmptyEventDescriptor {
                state: source.clone(),
            }
        }));

        let mut resolved = Vec::new();
        for target in &transition.targets {
            match index.get(target.as_str()) {
                None => checks.push(Validation::fail(ChartViolation::UnknownTarget {
                    state: source.clone(),
                    target: target.clone(),
                })),
                Some(0) => checks.push(Validation::fail(ChartViolation::RootTarget {
                    state: source.clone(),
                })),
                Some(&t) => resolved.push(t),
            }
        }
        checks.push(check(distinct_regions(draft, &resolved), || {
            ChartViolation::ConflictingTargets {
                state: source.clone(),
            }
        }));
    }
    checks
}

/// Every pair of targets must be unrelated and meet at a parallel state.
fn distinct_regions(draft: &Draft, targets: &[usize]) -> bool {
    for (i, &a) in targets.iter().enumerate() {
        for &b in &targets[i + 1..] {
            if a == b || draft.is_descendant(a, b) || draft.is_descendant(b, a) {
                return false;
            }
            let meets_in_parallel = draft
                .lowest_common_ancestor(a, b)
                .is_some_and(|lca| draft.states[lca].kind == DeclaredKind::Parallel);
            if !meets_in_parallel {
                return false;
            }
        }
    }
    true
}
