//! Block schedule projector.
//!
//! Reshapes per-entity schedules into a dense entity × block grid for
//! reporting: every row has exactly one cell per known block, with an
//! explicit placeholder for free slots, so downstream tables never have a
//! missing column.

use crate::domain::{Block, SectionId};
use crate::extract::{ProfessorSchedules, StudentSchedules};
use serde::Serialize;
use std::collections::BTreeSet;

/// Cell content for a block with no assignment.
pub const FREE_BLOCK: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockGridRow {
    pub entity: String,
    /// One cell per grid block, in the same order as [`BlockGrid::blocks`].
    pub cells: Vec<String>,
}

/// Dense entity × block table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockGrid {
    /// Column headers: the full block universe, lexically ordered.
    pub blocks: Vec<Block>,
    pub rows: Vec<BlockGridRow>,
}

pub struct BlockProjector;

impl BlockProjector {
    pub fn project_students(schedules: &StudentSchedules, blocks: &BTreeSet<Block>) -> BlockGrid {
        Self::project(blocks, schedules.iter().map(|(id, entries)| {
            (
                id.to_string(),
                entries
                    .iter()
                    .map(|e| (e.block.clone(), SectionId::new(e.course.clone(), e.section)))
                    .collect(),
            )
        }))
    }

    pub fn project_professors(
        schedules: &ProfessorSchedules,
        blocks: &BTreeSet<Block>,
    ) -> BlockGrid {
        Self::project(blocks, schedules.iter().map(|(id, entries)| {
            (
                id.to_string(),
                entries
                    .iter()
                    .map(|e| (e.block.clone(), SectionId::new(e.course.clone(), e.section)))
                    .collect(),
            )
        }))
    }

    fn project(
        blocks: &BTreeSet<Block>,
        entities: impl Iterator<Item = (String, Vec<(Block, SectionId)>)>,
    ) -> BlockGrid {
        let blocks: Vec<Block> = blocks.iter().cloned().collect();
        let rows = entities
            .map(|(entity, assignments)| {
                let cells = blocks
                    .iter()
                    .map(|block| {
                        assignments
                            .iter()
                            .find(|(b, _)| b == block)
                            .map(|(_, section)| section.to_string())
                            .unwrap_or_else(|| FREE_BLOCK.to_string())
                    })
                    .collect();
                BlockGridRow { entity, cells }
            })
            .collect();
        BlockGrid { blocks, rows }
    }
}
