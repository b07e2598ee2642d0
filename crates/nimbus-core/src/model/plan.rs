//! Plan — the root phase plus global metadata (§3). Immutable once
//! emitted by the builder.

use super::phase::{Phase, PhaseId};
use super::server::Server;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Indexed arena of phases. Phases reference each other (children,
/// dependencies) by index, never by re-resolving a string id, so lookups
/// are O(1) and the graph can be serialised flat (§9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanArena {
    phases: Vec<Phase>,
    #[serde(skip)]
    index_by_id: HashMap<PhaseId, usize>,
}

impl PlanArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a phase, return its arena index. Rebuilds the id index
    /// lazily via `reindex` after deserialisation, or incrementally here
    /// during construction.
    pub fn insert(&mut self, phase: Phase) -> Result<usize> {
        if self.index_by_id.contains_key(&phase.id) {
            return Err(CoreError::PermanentOperational(format!(
                "duplicate phase id: {}",
                phase.id
            )));
        }
        let idx = self.phases.len();
        self.index_by_id.insert(phase.id.clone(), idx);
        self.phases.push(phase);
        Ok(idx)
    }

    pub fn reindex(&mut self) {
        self.index_by_id = self
            .phases
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
    }

    pub fn get(&self, idx: usize) -> &Phase {
        &self.phases[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Phase {
        &mut self.phases[idx]
    }

    pub fn index_of(&self, id: &PhaseId) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Phase)> {
        self.phases.iter().enumerate()
    }

    /// Parent index of every phase, computed from `children` links.
    /// Every non-root phase has exactly one parent (§3 invariant); this
    /// returns `None` for an index with no parent found, which should
    /// only ever be the root.
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.phases
            .iter()
            .enumerate()
            .find(|(_, p)| p.children.contains(&idx))
            .map(|(i, _)| i)
    }

    /// Validate that the combined dependency + parent/child graph is a
    /// DAG (§3 invariant), and that every non-root phase has exactly one
    /// parent.
    pub fn validate_dag(&self, root: usize) -> Result<()> {
        let mut parent_counts = vec![0usize; self.phases.len()];
        for (_, p) in self.iter() {
            for &c in &p.children {
                parent_counts[c] += 1;
            }
        }
        for (i, count) in parent_counts.iter().enumerate() {
            if i == root {
                continue;
            }
            if *count != 1 {
                return Err(CoreError::PermanentOperational(format!(
                    "phase {} has {} parents, expected exactly 1",
                    self.phases[i].id, count
                )));
            }
        }

        // Cycle check over children + depends_on edges via DFS coloring.
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }
        let mut color = vec![Color::White; self.phases.len()];

        fn visit(
            arena: &PlanArena,
            idx: usize,
            color: &mut Vec<Color>,
        ) -> Result<()> {
            color[idx] = Color::Gray;
            let phase = arena.get(idx);
            for &next in phase.children.iter().chain(phase.depends_on.iter()) {
                match color[next] {
                    Color::White => visit(arena, next, color)?,
                    Color::Gray => {
                        return Err(CoreError::PermanentOperational(format!(
                            "cycle detected through phase {}",
                            arena.get(next).id
                        )))
                    }
                    Color::Black => {}
                }
            }
            color[idx] = Color::Black;
            Ok(())
        }

        for i in 0..self.phases.len() {
            if color[i] == Color::White {
                visit(self, i, &mut color)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub operation_id: String,
    pub cluster_name: String,
    pub inventory: Vec<Server>,
    pub installed_app: String,
    pub update_app: String,
    pub arena: PlanArena,
    pub root: usize,
}

impl Plan {
    pub fn root_phase(&self) -> &Phase {
        self.arena.get(self.root)
    }

    pub fn phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.arena.index_of(id).map(|i| self.arena.get(i))
    }
}
