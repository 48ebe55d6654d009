use crate::genome::Alignment;
use crate::segment::{BottomSegment, TopSegment, NULL_INDEX};

//-----------------------------------------------------------------------------

// Root with four bottom segments of length 10 over both a forward and a reversed
// child. Child segments 2 and 4 are unaligned; root segment 2 is unaligned to the
// forward child.
//
// root bottom:   0          1          2          3
// fwd top:       0          1          -          3          (4 unaligned)
// rev top:       3'         2'         1          0'         (' = reversed)
fn two_children() -> Alignment {
    let mut alignment = Alignment::new();
    let root = alignment.add_genome("root", vec![b'A'; 40], None).unwrap();
    let fwd = alignment.add_genome("fwd", vec![b'C'; 50], Some(root)).unwrap();
    let rev = alignment.add_genome("rev", vec![b'G'; 40], Some(root)).unwrap();

    alignment.genome_mut(root).set_bottom_segments(vec![
        BottomSegment::new(0, 10, 2).with_child(0, 0, false).with_child(1, 3, true),
        BottomSegment::new(10, 10, 2).with_child(0, 1, false).with_child(1, 2, true),
        BottomSegment::new(20, 10, 2).with_child(1, 1, false),
        BottomSegment::new(30, 10, 2).with_child(0, 3, false).with_child(1, 0, true),
    ]);
    alignment.genome_mut(fwd).set_top_segments(vec![
        TopSegment::new(0, 10).with_parent(0, false),
        TopSegment::new(10, 10).with_parent(1, false),
        TopSegment::new(20, 10),
        TopSegment::new(30, 10).with_parent(3, false),
        TopSegment::new(40, 10),
    ]);
    alignment.genome_mut(rev).set_top_segments(vec![
        TopSegment::new(0, 10).with_parent(3, true),
        TopSegment::new(10, 10).with_parent(2, false),
        TopSegment::new(20, 10).with_parent(1, true),
        TopSegment::new(30, 10).with_parent(0, true),
    ]);

    alignment.validate().unwrap();
    alignment
}

// A single genome whose top segmentation (length 10) is finer than its bottom
// segmentation (length 20), with parse links in both directions.
fn two_granularities() -> Alignment {
    let mut alignment = Alignment::new();
    let root = alignment.add_genome("root", vec![b'T'; 40], None).unwrap();
    let child = alignment.add_genome("child", vec![b'T'; 40], Some(root)).unwrap();

    alignment.genome_mut(root).set_bottom_segments(vec![
        BottomSegment::new(0, 40, 1).with_child(0, 0, false),
    ]);
    alignment.genome_mut(child).set_top_segments(vec![
        TopSegment::new(0, 40).with_parent(0, false).with_parse(0),
    ]);

    let grandchild = alignment.add_genome("grandchild", vec![b'T'; 40], Some(child)).unwrap();
    alignment.genome_mut(child).set_bottom_segments(vec![
        BottomSegment::new(0, 20, 1).with_child(0, 0, false).with_parse(0),
        BottomSegment::new(20, 20, 1).with_child(0, 1, false).with_parse(0),
    ]);
    alignment.genome_mut(grandchild).set_top_segments(vec![
        TopSegment::new(0, 20).with_parent(0, false),
        TopSegment::new(20, 20).with_parent(1, false),
    ]);

    alignment.validate().unwrap();
    alignment
}

// A parent with one bottom segment shared by two paralogous child segments, the
// second of them reversed.
fn paralogy() -> Alignment {
    let mut alignment = Alignment::new();
    let root = alignment.add_genome("root", vec![b'A'; 10], None).unwrap();
    let child = alignment.add_genome("child", vec![b'A'; 20], Some(root)).unwrap();

    alignment.genome_mut(root).set_bottom_segments(vec![
        BottomSegment::new(0, 10, 1).with_child(0, 0, false),
    ]);
    alignment.genome_mut(child).set_top_segments(vec![
        TopSegment::new(0, 10).with_parent(0, false).with_paralogy(1, true),
        TopSegment::new(10, 10).with_parent(0, true).with_paralogy(0, true),
    ]);

    alignment.validate().unwrap();
    alignment
}

//-----------------------------------------------------------------------------

#[test]
fn positions_and_slicing() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();

    let mut iter = alignment.top_iter(fwd, 1);
    assert_eq!(iter.start_position(), 10, "Wrong start position");
    assert_eq!(iter.end_position(), 19, "Wrong end position");
    assert_eq!(iter.len(), 10, "Wrong length");

    iter.slice(2, 3);
    assert_eq!(iter.start_position(), 12, "Wrong start position after slicing");
    assert_eq!(iter.end_position(), 16, "Wrong end position after slicing");
    assert_eq!(iter.len(), 5, "Wrong length after slicing");

    iter.reverse();
    assert!(iter.is_reversed(), "The iterator did not reverse");
    assert_eq!(iter.start_position(), 16, "Wrong reversed start position");
    assert_eq!(iter.end_position(), 12, "Wrong reversed end position");
    assert_eq!(iter.len(), 5, "Wrong reversed length");

    iter.reverse();
    assert!(!iter.is_reversed(), "Two reversals did not cancel out");
    assert_eq!(iter.start_position(), 12, "Two reversals changed the start position");
    assert_eq!(iter.start_offset(), 2, "Two reversals changed the start offset");
    assert_eq!(iter.end_offset(), 3, "Two reversals changed the end offset");
}

#[test]
fn positional_trichotomy() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();

    for reversed in [false, true] {
        let mut iter = alignment.top_iter(fwd, 1);
        iter.slice(2, 3);
        if reversed {
            iter.reverse();
        }
        for position in 0..50 {
            let name = if reversed { "reversed" } else { "forward" };
            let covered = (12..17).contains(&position);
            assert_eq!(iter.overlaps(position), covered, "Wrong overlap at {} ({})", position, name);
            assert_eq!(iter.left_of(position), position > 16, "Wrong left_of at {} ({})", position, name);
            assert_eq!(iter.right_of(position), position < 12, "Wrong right_of at {} ({})", position, name);
            let hits = usize::from(iter.left_of(position))
                + usize::from(iter.right_of(position))
                + usize::from(iter.overlaps(position));
            assert_eq!(hits, 1, "The trichotomy is not exclusive at {} ({})", position, name);
        }
    }
}

#[test]
fn copies_are_independent() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();

    let original = alignment.top_iter(fwd, 1);
    let mut copy = original;
    copy.to_right(None);
    copy.reverse();
    assert_eq!(original.array_index(), 1, "Moving the copy moved the original");
    assert!(!original.is_reversed(), "Reversing the copy reversed the original");
    assert!(!copy.same_segment(&original), "The moved copy still compares equal");

    let mut other = alignment.top_iter(fwd, 1);
    other.slice(4, 4);
    other.reverse();
    assert!(other.same_segment(&original), "Offsets and orientation affect segment identity");
}

#[test]
fn seek_covers_every_position() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();
    let mut iter = alignment.top_iter(fwd, 0);

    for position in 0..50 {
        iter.seek(position, true);
        assert!(iter.in_range(), "Seek left the iterator out of range at {}", position);
        assert_eq!(iter.array_index(), position / 10, "Wrong segment at {}", position);
        assert_eq!(iter.start_position(), position, "Wrong start position at {}", position);
        assert_eq!(iter.len(), 1, "Wrong slice length at {}", position);
    }

    iter.seek(17, false);
    assert_eq!(iter.array_index(), 1, "Wrong segment without slicing");
    assert_eq!(iter.start_position(), 10, "Unsliced seek did not reset the offsets");
    assert_eq!(iter.len(), 10, "Unsliced seek did not reset the offsets");

    iter.seek(-1, false);
    assert!(!iter.in_range(), "Seek before the genome did not park the iterator");
    assert!(iter.array_index() < 0, "Wrong sentinel before the genome");
    iter.seek(50, false);
    assert!(!iter.in_range(), "Seek past the genome did not park the iterator");
    assert_eq!(iter.array_index(), 5, "Wrong sentinel past the genome");
}

#[test]
fn stepping_and_boundaries() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();

    let mut iter = alignment.top_iter(fwd, 0);
    assert!(iter.is_first(), "The first segment is not first");
    assert!(!iter.is_last(), "The first segment is last");
    iter.to_left(None);
    assert!(!iter.in_range(), "Stepping over the left end did not park the iterator");

    iter.reposition(fwd, 4);
    assert!(iter.is_last(), "The last segment is not last");
    iter.to_right(None);
    assert!(!iter.in_range(), "Stepping over the right end did not park the iterator");

    // A reversed iterator runs towards lower positions, so the boundaries swap.
    iter.reposition(fwd, 0);
    iter.reverse();
    assert!(iter.is_last(), "Segment 0 is not last in reverse orientation");
    iter.to_right(None);
    assert!(!iter.in_range(), "A reversed step right did not park the iterator");

    // Stepping away from the boundaries round-trips.
    let mut iter = alignment.top_iter(fwd, 2);
    iter.to_left(None);
    iter.to_right(None);
    assert_eq!(iter.array_index(), 2, "A left-right round trip moved the iterator");
    assert_eq!(iter.len(), 10, "A left-right round trip kept an offset");

    let mut iter = alignment.top_iter(fwd, 2);
    iter.slice(4, 0);
    iter.to_left(None);
    assert_eq!(iter.array_index(), 2, "A sliced step left moved off the segment");
    assert_eq!(iter.start_position(), 20, "Wrong start after expanding left");
    assert_eq!(iter.len(), 4, "Wrong length after expanding left");
    iter.to_left(None);
    assert_eq!(iter.array_index(), 1, "The expanded iterator did not move left");
    assert_eq!(iter.len(), 10, "Moving left kept an offset");
}

#[test]
fn stepping_with_a_cutoff() {
    let alignment = two_children();
    let fwd = alignment.find_genome("fwd").unwrap();

    let mut iter = alignment.top_iter(fwd, 2);
    iter.to_left(Some(13));
    assert_eq!(iter.array_index(), 1, "Wrong segment after a clipped step left");
    assert_eq!(iter.start_position(), 13, "The cutoff did not clip the start");
    assert_eq!(iter.len(), 7, "Wrong length after clipping");

    let mut iter = alignment.top_iter(fwd, 2);
    iter.to_right(Some(36));
    assert_eq!(iter.array_index(), 3, "Wrong segment after a clipped step right");
    assert_eq!(iter.start_position(), 30, "A clipped step right moved the start");
    assert_eq!(iter.len(), 7, "The cutoff did not clip the end");

    let mut iter = alignment.top_iter(fwd, 2);
    iter.reverse();
    iter.to_right(Some(16));
    assert_eq!(iter.array_index(), 1, "Wrong segment after a reversed clipped step");
    assert_eq!(iter.start_position(), 19, "A reversed clipped step moved the start");
    assert_eq!(iter.len(), 4, "The cutoff did not clip the reversed end");
}

#[test]
fn sequence_extraction() {
    let mut alignment = Alignment::new();
    let root = alignment.add_genome("root", b"ACGTACGTAC".to_vec(), None).unwrap();
    let child = alignment.add_genome("child", b"GATTACAGGC".to_vec(), Some(root)).unwrap();
    alignment.genome_mut(root).set_bottom_segments(vec![
        BottomSegment::new(0, 10, 1).with_child(0, 0, false),
    ]);
    alignment.genome_mut(child).set_top_segments(vec![
        TopSegment::new(0, 10).with_parent(0, false),
    ]);
    alignment.validate().unwrap();

    let mut iter = alignment.top_iter(child, 0);
    assert_eq!(iter.sequence(), b"GATTACAGGC", "Wrong forward sequence");
    iter.slice(2, 3);
    assert_eq!(iter.sequence(), b"TTACA", "Wrong sliced sequence");
    iter.reverse();
    assert_eq!(iter.sequence(), b"TGTAA", "Wrong reversed sliced sequence");
}

//-----------------------------------------------------------------------------

#[test]
fn parent_and_child_links() {
    let alignment = two_children();
    let root = alignment.find_genome("root").unwrap();
    let fwd = alignment.find_genome("fwd").unwrap();

    let top = alignment.top_iter(fwd, 1);
    assert!(top.has_parent(), "Segment 1 has no parent");
    assert_eq!(top.parent_index(), 1, "Wrong parent index");
    assert!(!top.parent_reversed(), "Wrong parent orientation");
    let top = alignment.top_iter(fwd, 2);
    assert!(!top.has_parent(), "The unaligned segment has a parent");
    assert_eq!(top.parent_index(), NULL_INDEX, "Wrong null parent index");

    let bottom = alignment.bottom_iter(root, 2);
    assert!(!bottom.has_child(0), "Root segment 2 is aligned to the forward child");
    assert!(bottom.has_child(1), "Root segment 2 is not aligned to the reversed child");
    assert_eq!(bottom.child_index(1), 1, "Wrong child index");
    assert!(!bottom.child_reversed(1), "Wrong child orientation");
}

#[test]
fn tree_edge_crossing() {
    let alignment = two_children();
    let root = alignment.find_genome("root").unwrap();
    let fwd = alignment.find_genome("fwd").unwrap();
    let rev = alignment.find_genome("rev").unwrap();

    // Forward child: the link preserves orientation and offsets.
    let mut top = alignment.top_iter(fwd, 1);
    top.slice(2, 3);
    let mut bottom = alignment.bottom_iter(root, 0);
    bottom.to_parent(&top);
    assert_eq!(bottom.genome_id(), root, "to_parent left the wrong genome");
    assert_eq!(bottom.array_index(), 1, "Wrong parent segment");
    assert!(!bottom.is_reversed(), "A forward link reversed the iterator");
    assert_eq!(bottom.start_position(), 12, "Wrong parent start position");
    assert_eq!(bottom.len(), 5, "Wrong parent length");

    // Reversed child: the composed orientation flips and the offsets swap sides.
    let mut top = alignment.top_iter(rev, 2);
    top.slice(2, 3);
    bottom.to_parent(&top);
    assert_eq!(bottom.array_index(), 1, "Wrong parent segment for the reversed child");
    assert!(bottom.is_reversed(), "A reversing link kept the orientation");
    assert_eq!(bottom.start_position(), 16, "Wrong reversed parent start position");
    assert_eq!(bottom.len(), 5, "Wrong reversed parent length");

    // Descending again restores the original state.
    let mut back = alignment.top_iter(rev, 0);
    back.to_child(&bottom, 1);
    assert_eq!(back.genome_id(), rev, "to_child left the wrong genome");
    assert!(back.same_segment(&top), "Descending did not restore the segment");
    assert!(!back.is_reversed(), "Descending did not restore the orientation");
    assert_eq!(back.start_position(), 22, "Descending did not restore the position");
    assert_eq!(back.len(), 5, "Descending did not restore the slice");

    // The same move by genome identifier.
    let mut by_genome = alignment.top_iter(rev, 0);
    by_genome.to_child_genome(&bottom, rev);
    assert!(by_genome.same_segment(&back), "to_child_genome disagrees with to_child");
}

#[test]
#[should_panic]
fn to_child_genome_rejects_non_children() {
    let alignment = two_children();
    let root = alignment.find_genome("root").unwrap();
    let bottom = alignment.bottom_iter(root, 0);
    let mut top = alignment.top_iter(alignment.find_genome("fwd").unwrap(), 0);
    top.to_child_genome(&bottom, root);
}

#[test]
fn parse_links_across_granularities() {
    let alignment = two_granularities();
    let child = alignment.find_genome("child").unwrap();

    // Bottom segment 1 starts at 20 inside the single top segment of length 40.
    let bottom = alignment.bottom_iter(child, 1);
    assert!(bottom.has_parse(), "Bottom segment 1 has no parse link");
    assert_eq!(bottom.parse_index(), 0, "Wrong parse link for bottom segment 1");
    let grandchild = alignment.find_genome("grandchild").unwrap();
    assert!(!alignment.top_iter(grandchild, 0).has_parse(),
        "A segment without a parse link claims to have one");
    let mut top = alignment.top_iter(child, 0);
    top.to_parse(&bottom);
    assert_eq!(top.array_index(), 0, "Wrong top segment from the parse link");
    assert_eq!(top.start_position(), 20, "Wrong parse start position");
    assert_eq!(top.len(), 20, "Wrong parse length");

    // The other way: the top segment spans both bottom segments, and the parse
    // result is clipped to the covering one.
    let mut top = alignment.top_iter(child, 0);
    top.slice(25, 5);
    let mut bottom = alignment.bottom_iter(child, 0);
    bottom.to_parse(&top);
    assert_eq!(bottom.array_index(), 1, "Parse did not scan to the covering segment");
    assert_eq!(bottom.start_position(), 25, "Wrong clipped parse start");
    assert_eq!(bottom.len(), 10, "Wrong clipped parse length");

    // Reversed source: the scan uses the highest position of the slice.
    let mut top = alignment.top_iter(child, 0);
    top.slice(25, 5);
    top.reverse();
    bottom.to_parse(&top);
    assert_eq!(bottom.array_index(), 1, "Wrong reversed parse segment");
    assert!(bottom.is_reversed(), "Parse dropped the orientation");
    assert_eq!(bottom.start_position(), 34, "Wrong reversed parse start");
    assert_eq!(bottom.len(), 10, "Wrong reversed parse length");
}

#[test]
fn paralogy_cycle() {
    let alignment = paralogy();
    let child = alignment.find_genome("child").unwrap();

    let mut iter = alignment.top_iter(child, 0);
    assert!(iter.has_next_paralogy(), "Segment 0 has no paralogs");
    assert!(iter.next_paralogy_reversed(), "Wrong paralogy orientation for segment 0");

    // The second paralog aligns to the ancestor in the opposite orientation, so the
    // iterator flips to keep tracking the same ancestral strand.
    iter.to_next_paralogy();
    assert_eq!(iter.array_index(), 1, "Wrong next paralog");
    assert!(iter.is_reversed(), "The orientation did not flip at the paralog");
    assert!(iter.next_paralogy_reversed(), "Wrong paralogy orientation for segment 1");

    iter.to_next_paralogy();
    assert_eq!(iter.array_index(), 0, "The paralogy list is not circular");
    assert!(!iter.is_reversed(), "A full cycle did not restore the orientation");
}

//-----------------------------------------------------------------------------
