//! Typed variable registry.
//!
//! Every decision variable is keyed by the tuple it decides, and solver
//! valuations are indexed by opaque handles. Decoding a solution is a direct
//! lookup; no identifier string is ever parsed back apart.

use crate::domain::{Block, ProfessorId, SectionId, StudentId};
use std::collections::HashMap;
use std::fmt;

/// Opaque handle to a registered decision variable. Also the index of the
/// variable's value in a [`Solution`](crate::domain::Solution) valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Tuple key identifying what a decision variable decides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VarKey {
    /// 1 iff the student is enrolled in the section meeting in the block.
    Enroll {
        student: StudentId,
        section: SectionId,
        block: Block,
    },
    /// 1 iff the professor teaches the section meeting in the block.
    Teach {
        professor: ProfessorId,
        section: SectionId,
        block: Block,
    },
    /// 1 iff the section is actually scheduled in the block.
    Used { section: SectionId, block: Block },
    /// Non-negative enrollment gap between two same-course sections sharing
    /// a block; penalized, never forbidden.
    Imbalance {
        first: SectionId,
        second: SectionId,
        block: Block,
    },
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    NonNegative,
}

impl VarKey {
    pub fn kind(&self) -> VarKind {
        match self {
            VarKey::Imbalance { .. } => VarKind::NonNegative,
            _ => VarKind::Binary,
        }
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::Enroll {
                student,
                section,
                block,
            } => write!(f, "enroll[{student}, {section}, {block}]"),
            VarKey::Teach {
                professor,
                section,
                block,
            } => write!(f, "teach[{professor}, {section}, {block}]"),
            VarKey::Used { section, block } => write!(f, "used[{section}, {block}]"),
            VarKey::Imbalance {
                first,
                second,
                block,
            } => write!(f, "imbalance[{first}, {second}, {block}]"),
        }
    }
}

/// Registry of all decision variables of one assignment model.
///
/// Handles are dense indices in insertion order, so a valuation is a plain
/// `Vec<f64>` aligned with the registry.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    keys: Vec<VarKey>,
    index: HashMap<VarKey, VarId>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a key, returning its handle. Re-registering an existing key
    /// returns the original handle, so construction order cannot duplicate
    /// variables.
    pub fn intern(&mut self, key: VarKey) -> VarId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = VarId(self.keys.len());
        self.index.insert(key.clone(), id);
        self.keys.push(key);
        id
    }

    /// Handle for a key, if the combination was feasible enough to exist.
    /// Absent combinations are structurally fixed at 0, never an error.
    pub fn get(&self, key: &VarKey) -> Option<VarId> {
        self.index.get(key).copied()
    }

    pub fn key(&self, id: VarId) -> &VarKey {
        &self.keys[id.0]
    }

    pub fn kind(&self, id: VarId) -> VarKind {
        self.keys[id.0].kind()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarKey)> {
        self.keys.iter().enumerate().map(|(i, k)| (VarId(i), k))
    }

    pub fn num_binary(&self) -> usize {
        self.keys.iter().filter(|k| k.kind() == VarKind::Binary).count()
    }

    pub fn num_continuous(&self) -> usize {
        self.len() - self.num_binary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CourseCode;

    fn enroll_key(student: &str, block: &str) -> VarKey {
        VarKey::Enroll {
            student: StudentId::new(student),
            section: SectionId::new(CourseCode::canonical("math101"), 1),
            block: Block::new(block),
        }
    }

    #[test]
    fn intern_is_idempotent() {
        let mut reg = VariableRegistry::new();
        let a = reg.intern(enroll_key("s1", "A"));
        let b = reg.intern(enroll_key("s1", "B"));
        let a2 = reg.intern(enroll_key("s1", "A"));
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn lookup_of_absent_combination_is_none() {
        let mut reg = VariableRegistry::new();
        reg.intern(enroll_key("s1", "A"));
        assert_eq!(reg.get(&enroll_key("s2", "A")), None);
    }

    #[test]
    fn handles_index_the_valuation_densely() {
        let mut reg = VariableRegistry::new();
        let a = reg.intern(enroll_key("s1", "A"));
        let b = reg.intern(enroll_key("s1", "B"));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn imbalance_variables_are_continuous() {
        let section = SectionId::new(CourseCode::canonical("bio2"), 1);
        let other = SectionId::new(CourseCode::canonical("bio2"), 2);
        let key = VarKey::Imbalance {
            first: section,
            second: other,
            block: Block::new("A"),
        };
        assert_eq!(key.kind(), VarKind::NonNegative);
        assert_eq!(enroll_key("s1", "A").kind(), VarKind::Binary);
    }
}
