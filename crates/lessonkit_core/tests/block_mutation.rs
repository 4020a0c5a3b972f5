use lessonkit_core::engine::{
    append, insert, is_well_formed, move_down, move_to, move_up, reindex, remove,
    update_attributes, update_content,
};
use lessonkit_core::{AttributeMap, BlockAttributes, BlockId, BlockType, ContentBlock};
use serde_json::json;
use std::collections::HashSet;

fn ids(blocks: &[ContentBlock]) -> Vec<BlockId> {
    blocks.iter().map(|block| block.id().clone()).collect()
}

fn positions(blocks: &[ContentBlock]) -> Vec<usize> {
    blocks.iter().map(ContentBlock::position).collect()
}

fn types(blocks: &[ContentBlock]) -> Vec<&str> {
    blocks.iter().map(ContentBlock::type_name).collect()
}

fn attrs(value: serde_json::Value) -> AttributeMap {
    value.as_object().cloned().unwrap()
}

fn text_image_code() -> Vec<ContentBlock> {
    let blocks = append(&[], BlockType::Text);
    let blocks = append(&blocks, BlockType::Image);
    append(&blocks, BlockType::Code)
}

#[test]
fn appending_three_blocks_yields_contiguous_positions_and_unique_ids() {
    let blocks = text_image_code();

    assert_eq!(positions(&blocks), vec![0, 1, 2]);
    assert_eq!(types(&blocks), vec!["text", "image", "code"]);
    let unique = ids(&blocks).into_iter().collect::<HashSet<_>>();
    assert_eq!(unique.len(), 3);
}

#[test]
fn removing_middle_block_renumbers_and_keeps_other_ids() {
    let blocks = text_image_code();
    let original = ids(&blocks);

    let next = remove(&blocks, &original[1]);

    assert_eq!(positions(&next), vec![0, 1]);
    assert_eq!(ids(&next), vec![original[0].clone(), original[2].clone()]);
}

#[test]
fn moving_text_down_swaps_only_positions() {
    let blocks = {
        let full = text_image_code();
        remove(&full, full[1].id())
    };
    let text_id = blocks[0].id().clone();
    let code_id = blocks[1].id().clone();

    let next = move_down(&blocks, &text_id);

    assert_eq!(ids(&next), vec![code_id, text_id]);
    assert_eq!(positions(&next), vec![0, 1]);
    assert_eq!(types(&next), vec!["code", "text"]);
}

#[test]
fn moves_at_the_boundaries_are_noops() {
    let blocks = text_image_code();

    assert_eq!(move_up(&blocks, blocks[0].id()), blocks);
    assert_eq!(move_down(&blocks, blocks[2].id()), blocks);
}

#[test]
fn unknown_ids_leave_the_sequence_unchanged() {
    let blocks = text_image_code();
    let missing = BlockId::from("missing");

    assert_eq!(remove(&blocks, &missing), blocks);
    assert_eq!(move_up(&blocks, &missing), blocks);
    assert_eq!(move_down(&blocks, &missing), blocks);
    assert_eq!(move_to(&blocks, &missing, 0), blocks);
    assert_eq!(update_content(&blocks, &missing, "x"), blocks);
    assert_eq!(
        update_attributes(&blocks, &missing, &attrs(json!({"alt": "x"}))),
        blocks
    );
}

#[test]
fn attribute_updates_merge_instead_of_replacing() {
    let blocks = append(&[], BlockType::Image);
    let id = blocks[0].id().clone();

    let blocks = update_attributes(&blocks, &id, &attrs(json!({"alt": "y"})));
    let blocks = update_attributes(&blocks, &id, &attrs(json!({"caption": "x"})));

    assert_eq!(
        serde_json::Value::Object(blocks[0].attributes().to_map()),
        json!({"alt": "y", "caption": "x"})
    );
    assert_eq!(blocks[0].block_type(), Some(BlockType::Image));
}

#[test]
fn attribute_updates_never_change_the_block_type() {
    let blocks = append(&[], BlockType::Heading);
    let id = blocks[0].id().clone();

    let next = update_attributes(&blocks, &id, &attrs(json!({"type": "code", "level": 3})));

    match next[0].attributes() {
        BlockAttributes::Heading(heading) => assert_eq!(heading.level, 3),
        other => panic!("expected heading attributes, got {other:?}"),
    }
}

#[test]
fn content_updates_touch_only_the_target_block() {
    let blocks = text_image_code();

    let next = update_content(&blocks, blocks[2].id(), "fn main() {}");

    assert_eq!(next[2].content(), "fn main() {}");
    assert_eq!(next[0], blocks[0]);
    assert_eq!(next[1], blocks[1]);
}

#[test]
fn insert_shifts_later_blocks_down() {
    let blocks = text_image_code();

    let next = insert(&blocks, BlockType::Heading, 1);

    assert_eq!(types(&next), vec!["text", "heading", "image", "code"]);
    assert_eq!(positions(&next), vec![0, 1, 2, 3]);

    let clamped = insert(&blocks, BlockType::Video, 99);
    assert_eq!(clamped.last().map(ContentBlock::type_name), Some("video"));
}

#[test]
fn move_to_relocates_a_dragged_block() {
    let blocks = text_image_code();
    let code_id = blocks[2].id().clone();

    let next = move_to(&blocks, &code_id, 0);

    assert_eq!(types(&next), vec!["code", "text", "image"]);
    assert!(is_well_formed(&next));
}

#[test]
fn reindex_sorts_by_position_and_keeps_ties_in_array_order() {
    let blocks = vec![
        ContentBlock::from_parts("c", "text", "c", AttributeMap::new(), 9),
        ContentBlock::from_parts("a", "text", "a", AttributeMap::new(), 2),
        ContentBlock::from_parts("b", "text", "b", AttributeMap::new(), 2),
    ];

    let next = reindex(blocks);

    let order = next.iter().map(|block| block.id().as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(positions(&next), vec![0, 1, 2]);
}

#[test]
fn mixed_operation_sequence_stays_well_formed() {
    let mut blocks = Vec::new();
    for kind in BlockType::ALL.iter().copied().cycle().take(12) {
        blocks = append(&blocks, kind);
        assert!(is_well_formed(&blocks));
    }

    let targets = ids(&blocks);
    for (step, id) in targets.iter().enumerate() {
        blocks = match step % 4 {
            0 => move_down(&blocks, id),
            1 => move_up(&blocks, id),
            2 => move_to(&blocks, id, step / 2),
            _ => remove(&blocks, id),
        };
        assert!(is_well_formed(&blocks), "step {step} broke the invariants");
    }
    assert_eq!(blocks.len(), 9);
}
