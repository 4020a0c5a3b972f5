//! Pure block-sequence operations.

use crate::model::block::{AttributeMap, BlockId, BlockType, ContentBlock};
use log::warn;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Returns `blocks` with a new default block of `kind` appended last.
pub fn append(blocks: &[ContentBlock], kind: BlockType) -> Vec<ContentBlock> {
    let mut next = blocks.to_vec();
    next.push(ContentBlock::new(kind, blocks.len()));
    reindex(next)
}

/// Returns `blocks` with a new default block of `kind` at index `at`.
///
/// `at` is clamped to `0..=len`; blocks from `at` onward shift down by one.
pub fn insert(blocks: &[ContentBlock], kind: BlockType, at: usize) -> Vec<ContentBlock> {
    let mut ordered = reindex(blocks.to_vec());
    let at = at.min(ordered.len());
    ordered.insert(at, ContentBlock::new(kind, at));
    renumber_in_array_order(&mut ordered);
    reindex(ordered)
}

/// Returns `blocks` without the block `id`, renumbered `0..len-1`.
pub fn remove(blocks: &[ContentBlock], id: &BlockId) -> Vec<ContentBlock> {
    if find(blocks, id).is_none() {
        return blocks.to_vec();
    }
    let next = blocks
        .iter()
        .filter(|block| block.id() != id)
        .cloned()
        .collect::<Vec<_>>();
    reindex(next)
}

/// Swaps block `id` with its predecessor in position order.
///
/// No-op for the first block and for unknown ids.
pub fn move_up(blocks: &[ContentBlock], id: &BlockId) -> Vec<ContentBlock> {
    swap_with_neighbor(blocks, id, Direction::Up)
}

/// Swaps block `id` with its successor in position order.
///
/// No-op for the last block and for unknown ids.
pub fn move_down(blocks: &[ContentBlock], id: &BlockId) -> Vec<ContentBlock> {
    swap_with_neighbor(blocks, id, Direction::Down)
}

/// Relocates block `id` to index `target` (clamped to `0..len-1`).
///
/// Used by drag-and-drop reordering; blocks between the old and new index
/// shift by one.
pub fn move_to(blocks: &[ContentBlock], id: &BlockId, target: usize) -> Vec<ContentBlock> {
    let mut ordered = reindex(blocks.to_vec());
    let Some(from) = ordered.iter().position(|block| block.id() == id) else {
        return blocks.to_vec();
    };
    let target = target.min(ordered.len() - 1);
    if from != target {
        let block = ordered.remove(from);
        ordered.insert(target, block);
        renumber_in_array_order(&mut ordered);
    }
    reindex(ordered)
}

/// Replaces the content of block `id`; every other block is untouched.
pub fn update_content(
    blocks: &[ContentBlock],
    id: &BlockId,
    content: impl Into<String>,
) -> Vec<ContentBlock> {
    let content = content.into();
    blocks
        .iter()
        .map(|block| {
            let mut block = block.clone();
            if block.id() == id {
                block.set_content(content.clone());
            }
            block
        })
        .collect()
}

/// Shallow-merges `patch` into the attributes of block `id`.
///
/// Keys absent from `patch` keep their current values. The block type
/// never changes.
pub fn update_attributes(
    blocks: &[ContentBlock],
    id: &BlockId,
    patch: &AttributeMap,
) -> Vec<ContentBlock> {
    blocks
        .iter()
        .map(|block| {
            let mut block = block.clone();
            if block.id() == id {
                block.merge_attributes(patch);
            }
            block
        })
        .collect()
}

/// Sorts by position (stable) and renumbers to `0..len-1`.
///
/// Blocks sharing a position keep their array order.
pub fn reindex(mut blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    blocks.sort_by_key(ContentBlock::position);
    renumber_in_array_order(&mut blocks);
    blocks
}

/// Repairs a sequence read from external storage.
///
/// Duplicate ids are replaced with fresh ones (first occurrence keeps its
/// id), then positions are renumbered with [`reindex`].
pub fn normalize_loaded(mut blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    let mut seen = HashSet::with_capacity(blocks.len());
    let mut duplicate_ids = 0usize;
    for block in &mut blocks {
        if !seen.insert(block.id().clone()) {
            block.replace_id(BlockId::generate());
            seen.insert(block.id().clone());
            duplicate_ids += 1;
        }
    }

    let contiguous = has_contiguous_positions(&blocks);
    if duplicate_ids > 0 || !contiguous {
        warn!(
            "event=blocks_normalize module=engine status=repaired block_count={} duplicate_ids={} contiguous_positions={}",
            blocks.len(),
            duplicate_ids,
            contiguous
        );
    }
    reindex(blocks)
}

/// Looks up one block by id.
pub fn find<'a>(blocks: &'a [ContentBlock], id: &BlockId) -> Option<&'a ContentBlock> {
    blocks.iter().find(|block| block.id() == id)
}

/// Whether `blocks` satisfies the sequence invariants.
///
/// Checks contiguous positions in array order and unique ids.
pub fn is_well_formed(blocks: &[ContentBlock]) -> bool {
    let mut seen = HashSet::with_capacity(blocks.len());
    blocks
        .iter()
        .enumerate()
        .all(|(index, block)| block.position() == index && seen.insert(block.id()))
}

fn swap_with_neighbor(
    blocks: &[ContentBlock],
    id: &BlockId,
    direction: Direction,
) -> Vec<ContentBlock> {
    let Some(target_index) = blocks.iter().position(|block| block.id() == id) else {
        return blocks.to_vec();
    };
    let position = blocks[target_index].position();
    let neighbor_position = match direction {
        Direction::Up => position.checked_sub(1),
        Direction::Down => position.checked_add(1),
    };
    let Some(neighbor_position) = neighbor_position else {
        return blocks.to_vec();
    };
    let Some(neighbor_index) = blocks
        .iter()
        .position(|block| block.position() == neighbor_position)
    else {
        return blocks.to_vec();
    };

    let mut next = blocks.to_vec();
    next[target_index].set_position(neighbor_position);
    next[neighbor_index].set_position(position);
    reindex(next)
}

fn renumber_in_array_order(blocks: &mut [ContentBlock]) {
    for (index, block) in blocks.iter_mut().enumerate() {
        block.set_position(index);
    }
}

fn has_contiguous_positions(blocks: &[ContentBlock]) -> bool {
    let mut positions = blocks.iter().map(ContentBlock::position).collect::<Vec<_>>();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index)
}

#[cfg(test)]
mod tests {
    use super::{has_contiguous_positions, renumber_in_array_order};
    use crate::model::block::{AttributeMap, ContentBlock};

    fn block(id: &str, position: usize) -> ContentBlock {
        ContentBlock::from_parts(id, "text", "", AttributeMap::new(), position)
    }

    #[test]
    fn contiguity_check_ignores_array_order() {
        assert!(has_contiguous_positions(&[block("a", 1), block("b", 0)]));
        assert!(!has_contiguous_positions(&[block("a", 0), block("b", 2)]));
        assert!(!has_contiguous_positions(&[block("a", 0), block("b", 0)]));
        assert!(has_contiguous_positions(&[]));
    }

    #[test]
    fn renumber_follows_array_index() {
        let mut blocks = vec![block("a", 7), block("b", 3)];
        renumber_in_array_order(&mut blocks);
        assert_eq!(blocks[0].position(), 0);
        assert_eq!(blocks[1].position(), 1);
    }
}
