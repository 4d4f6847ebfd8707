//! Flattened, name-based form of a chart between building and resolution.

use super::state::{DeclaredKind, StateBuilder};
use crate::core::{ActionId, TransitionKind};
use std::collections::HashMap;

pub(crate) struct DraftState {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub kind: DeclaredKind,
    pub initial: Vec<String>,
    pub initial_actions: Vec<ActionId>,
    pub on_entry: Vec<ActionId>,
    pub on_exit: Vec<ActionId>,
    pub transitions: Vec<usize>,
    pub depth: usize,
}

pub(crate) struct DraftTransition {
    pub source: usize,
    pub triggers: Vec<(Option<String>, Option<String>)>,
    pub targets: Vec<String>,
    pub actions: Vec<ActionId>,
    pub kind: TransitionKind,
}

/// States in pre-order (document order) and transitions ranked by source
/// position, then declaration.
pub(crate) struct Draft {
    pub states: Vec<DraftState>,
    pub transitions: Vec<DraftTransition>,
}

impl Draft {
    pub fn flatten(root: StateBuilder) -> Self {
        let mut draft = Draft {
            states: Vec::new(),
            transitions: Vec::new(),
        };
        draft.push(root, None, 0);
        draft
    }

    fn push(&mut self, builder: StateBuilder, parent: Option<usize>, depth: usize) -> usize {
        let StateBuilder {
            name,
            kind,
            initial,
            initial_actions,
            on_entry,
            on_exit,
            children,
            transitions,
        } = builder;

        let idx = self.states.len();
        self.states.push(DraftState {
            name,
            parent,
            children: Vec::new(),
            kind,
            initial,
            initial_actions,
            on_entry,
            on_exit,
            transitions: Vec::new(),
            depth,
        });

        for t in transitions {
            let tid = self.transitions.len();
            self.transitions.push(DraftTransition {
                source: idx,
                triggers: t.triggers,
                targets: t.targets,
                actions: t.actions,
                kind: t.kind,
            });
            self.states[idx].transitions.push(tid);
        }

        for child in children {
            let child_idx = self.push(child, Some(idx), depth + 1);
            self.states[idx].children.push(child_idx);
        }

        idx
    }

    /// Name lookup; on duplicates the first declaration wins.
    pub fn index(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.states.len());
        for (i, state) in self.states.iter().enumerate() {
            index.entry(state.name.as_str()).or_insert(i);
        }
        index
    }

    pub fn is_descendant(&self, state: usize, ancestor: usize) -> bool {
        let mut current = self.states[state].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.states[parent].parent;
        }
        false
    }

    pub fn is_compound(&self, state: usize) -> bool {
        let s = &self.states[state];
        s.kind == DeclaredKind::Plain && !s.children.is_empty()
    }

    /// Lowest common ancestor of two distinct, unrelated states.
    pub fn lowest_common_ancestor(&self, a: usize, b: usize) -> Option<usize> {
        let mut current = self.states[a].parent;
        while let Some(candidate) = current {
            if self.is_descendant(b, candidate) {
                return Some(candidate);
            }
            current = self.states[candidate].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TransitionBuilder;

    fn draft() -> Draft {
        Draft::flatten(
            StateBuilder::new("root")
                .state(
                    StateBuilder::new("S")
                        .transition(TransitionBuilder::on("e").to("T"))
                        .state(StateBuilder::new("a").transition(TransitionBuilder::on("x")))
                        .state(StateBuilder::new("b")),
                )
                .state(StateBuilder::new("T")),
        )
    }

    #[test]
    fn flatten_assigns_preorder_indices() {
        let d = draft();
        let names: Vec<&str> = d.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["root", "S", "a", "b", "T"]);
        assert_eq!(d.states[1].children, vec![2, 3]);
        assert_eq!(d.states[2].depth, 2);
    }

    #[test]
    fn transitions_are_ranked_by_source_order() {
        let d = draft();
        assert_eq!(d.transitions[0].source, 1);
        assert_eq!(d.transitions[1].source, 2);
    }

    #[test]
    fn lowest_common_ancestor_finds_shared_parent() {
        let d = draft();
        assert_eq!(d.lowest_common_ancestor(2, 3), Some(1));
        assert_eq!(d.lowest_common_ancestor(2, 4), Some(0));
    }

    #[test]
    fn compound_requires_children() {
        let d = draft();
        assert!(d.is_compound(1));
        assert!(!d.is_compound(2));
    }
}
