//! Gap-tolerant blocks of segments.

use crate::iterator::SegmentIter;
use crate::segment::{Bottom, Segmentation, Top, NULL_INDEX};

use std::mem;


//-----------------------------------------------------------------------------

/// A maximal run of segments presented as one aligned block.
///
/// Small unaligned insertions fragment the segmentation of a genome even when the
/// surrounding segments align to consecutive intervals of the neighboring genome.
/// A gapped iterator bridges such fragmentation: it holds a left and a right boundary
/// iterator and maintains the invariant that every interior segment is either a gap
/// (unaligned and at most `gap_threshold` bases long) or compatible with its nearest
/// aligned neighbor.
/// Two aligned segments are compatible when their linked segments are consecutive in
/// the neighboring genome (up to gaps on that side), carry the same orientation, and
/// agree about paralogy.
///
/// A freshly constructed block extends itself to its maximal span, and every
/// navigation call re-extends in the vacated direction.
/// Block-level operations (crossing a tree edge, following paralogy, comparing
/// blocks) resolve each boundary to its nearest aligned segment first, so blocks
/// whose raw boundaries differ only by gaps behave as equal.
///
/// Exact positioning and base extraction are not supported at the block level;
/// consumers needing them should work with the boundary iterators returned by
/// [`Self::left`] and [`Self::right`].
///
/// # Examples
///
/// ```
/// use aligntree::{Alignment, BottomSegment, GappedSegmentIter, TopSegment};
///
/// let mut alignment = Alignment::new();
/// let root = alignment.add_genome("root", vec![b'A'; 20], None).unwrap();
/// let child = alignment.add_genome("child", vec![b'A'; 25], Some(root)).unwrap();
/// alignment.genome_mut(root).set_bottom_segments(vec![
///     BottomSegment::new(0, 10, 1).with_child(0, 0, false),
///     BottomSegment::new(10, 10, 1).with_child(0, 2, false),
/// ]);
/// alignment.genome_mut(child).set_top_segments(vec![
///     TopSegment::new(0, 10).with_parent(0, false),
///     TopSegment::new(10, 5),
///     TopSegment::new(15, 10).with_parent(1, false),
/// ]);
/// alignment.validate().unwrap();
///
/// // A five-base insertion in the child does not break the block.
/// let block = GappedSegmentIter::top(alignment.top_iter(child, 0), 5).unwrap();
/// assert_eq!(block.left().array_index(), 0);
/// assert_eq!(block.right().array_index(), 2);
/// assert_eq!(block.num_gaps(), 1);
/// assert_eq!(block.num_gap_bases(), 5);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GappedSegmentIter<'a, S: Segmentation> {
    left: SegmentIter<'a, S>,
    right: SegmentIter<'a, S>,
    edge: usize,
    gap_threshold: usize,
}

//-----------------------------------------------------------------------------

// Advances the iterator across a run of sub-threshold unaligned segments.
// Stops at the first segment that is aligned across `edge` or longer than the
// threshold, or at the end of the array.
fn to_right_next_ungapped<S: Segmentation>(iter: &mut SegmentIter<'_, S>, edge: usize, threshold: usize) {
    while !iter.aligned(edge) && iter.len() <= threshold {
        if iter.is_last() {
            break;
        }
        iter.to_right(None);
    }
}

// The mirror image of `to_right_next_ungapped`.
fn to_left_next_ungapped<S: Segmentation>(iter: &mut SegmentIter<'_, S>, edge: usize, threshold: usize) {
    while !iter.aligned(edge) && iter.len() <= threshold {
        if iter.is_first() {
            break;
        }
        iter.to_left(None);
    }
}

//-----------------------------------------------------------------------------

impl<'a> GappedSegmentIter<'a, Top> {
    /// Creates a gapped block over the top segmentation of a genome, anchored at the
    /// position of `iter`, and extends it to its maximal span.
    ///
    /// Returns an error if the genome has no parent or if `iter` is sliced.
    pub fn top(iter: SegmentIter<'a, Top>, gap_threshold: usize) -> Result<Self, String> {
        let parent = iter.genome().parent_genome();
        if parent == NULL_INDEX {
            return Err(format!("Genome {} has no parent to align gapped blocks to", iter.genome_id()));
        }
        let edge = iter.alignment().genome(parent).child_offset(iter.genome_id())
            .ok_or(format!("Genome {} is not registered as a child of genome {}", iter.genome_id(), parent))?;
        Self::init(iter, edge, gap_threshold)
    }

    /// Repositions the block onto the child genome aligned to the block `other` in
    /// the parent genome.
    ///
    /// The boundaries of `other` are first trimmed inward to their nearest aligned
    /// segments and then mapped across the tree edge.
    pub fn to_child(&mut self, other: &GappedSegmentIter<'a, Bottom>) {
        self.to_linked_block(other);
    }
}

impl<'a> GappedSegmentIter<'a, Bottom> {
    /// Creates a gapped block over the bottom segmentation of a genome with respect
    /// to the child on the given edge, anchored at the position of `iter`, and
    /// extends it to its maximal span.
    ///
    /// Returns an error if the edge does not exist or if `iter` is sliced.
    pub fn bottom(iter: SegmentIter<'a, Bottom>, edge: usize, gap_threshold: usize) -> Result<Self, String> {
        if edge >= iter.genome().child_count() {
            return Err(format!("Genome {} has no child edge {}", iter.genome_id(), edge));
        }
        Self::init(iter, edge, gap_threshold)
    }

    /// Repositions the block onto the parent genome aligned to the block `other` in
    /// the child genome.
    ///
    /// The boundaries of `other` are first trimmed inward to their nearest aligned
    /// segments and then mapped across the tree edge.
    pub fn to_parent(&mut self, other: &GappedSegmentIter<'a, Top>) {
        self.to_linked_block(other);
    }
}

//-----------------------------------------------------------------------------

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    fn init(iter: SegmentIter<'a, S>, edge: usize, gap_threshold: usize) -> Result<Self, String> {
        if iter.start_offset() != 0 || iter.end_offset() != 0 {
            return Err(String::from("Gapped iterators do not support sliced boundaries"));
        }
        debug_assert!(iter.in_range(), "init: the anchor iterator is out of range");
        let mut result = GappedSegmentIter { left: iter, right: iter, edge, gap_threshold };
        result.extend_right();
        Ok(result)
    }

    /// Returns the left boundary iterator.
    #[inline]
    pub fn left(&self) -> SegmentIter<'a, S> {
        self.left
    }

    /// Returns the right boundary iterator.
    #[inline]
    pub fn right(&self) -> SegmentIter<'a, S> {
        self.right
    }

    /// Returns the gap threshold of the block.
    #[inline]
    pub fn gap_threshold(&self) -> usize {
        self.gap_threshold
    }

    /// Returns the tree edge the block aligns across.
    ///
    /// For a bottom block this is the child edge; for a top block it is the edge
    /// leading back from the parent genome.
    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    /// Returns `true` if the block runs towards lower genome positions.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        debug_assert!(self.left.is_reversed() == self.right.is_reversed());
        self.left.is_reversed()
    }

    // Boundary invariant: the boundaries are whole segments sharing an orientation,
    // and the left one does not follow the right one in iteration direction.
    fn check_boundaries(&self) {
        debug_assert!(self.left.start_offset() == 0 && self.left.end_offset() == 0);
        debug_assert!(self.right.start_offset() == 0 && self.right.end_offset() == 0);
        debug_assert!(self.left.is_reversed() == self.right.is_reversed());
        debug_assert!(self.left.same_segment(&self.right)
            || (!self.left.is_reversed() && self.left.left_of(self.right.start_position()))
            || (self.left.is_reversed() && self.left.right_of(self.right.start_position())));
    }

    // Both boundaries trimmed inward to their nearest aligned segments.
    fn trimmed_inward(&self) -> (SegmentIter<'a, S>, SegmentIter<'a, S>) {
        let mut left = self.left;
        let mut right = self.right;
        to_right_next_ungapped(&mut left, self.edge, self.gap_threshold);
        to_left_next_ungapped(&mut right, self.edge, self.gap_threshold);
        (left, right)
    }
}

//-----------------------------------------------------------------------------

// Extension and the compatibility test.

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    // Pushes the right boundary as far right as the block invariant allows.
    fn extend_right(&mut self) {
        self.right = self.left;
        if self.right.is_last() {
            return;
        }
        to_right_next_ungapped(&mut self.right, self.edge, self.gap_threshold);

        // `accepted` tracks the last position the block is known to reach.
        let mut accepted = self.right;
        while !self.right.is_last() {
            self.right.to_right(None);
            to_right_next_ungapped(&mut self.right, self.edge, self.gap_threshold);
            let blocked =
                (!self.right.aligned(self.edge) && self.right.len() > self.gap_threshold)
                || (!accepted.aligned(self.edge) && accepted.len() > self.gap_threshold)
                || (self.right.aligned(self.edge) && accepted.aligned(self.edge)
                    && !self.compatible(&accepted, &self.right));
            if blocked {
                self.right.to_left(None);
                break;
            }
            accepted.to_right(None);
            to_right_next_ungapped(&mut accepted, self.edge, self.gap_threshold);
        }
    }

    // Pushes the left boundary as far left as the block invariant allows.
    fn extend_left(&mut self) {
        self.left = self.right;
        if self.left.is_first() {
            return;
        }
        to_left_next_ungapped(&mut self.left, self.edge, self.gap_threshold);

        let mut accepted = self.left;
        while !self.left.is_first() {
            self.left.to_left(None);
            to_left_next_ungapped(&mut self.left, self.edge, self.gap_threshold);
            let blocked =
                (!self.left.aligned(self.edge) && self.left.len() > self.gap_threshold)
                || (!accepted.aligned(self.edge) && accepted.len() > self.gap_threshold)
                || (self.left.aligned(self.edge) && accepted.aligned(self.edge)
                    && !self.compatible(&self.left, &accepted));
            if blocked {
                self.left.to_right(None);
                break;
            }
            accepted.to_left(None);
            to_left_next_ungapped(&mut accepted, self.edge, self.gap_threshold);
        }
    }

    // True if `left` and `right` can belong to the same block.
    //
    // `left` must precede `right` in iteration direction and both must be aligned.
    // The test requires that the linked segments have the same orientation, that the
    // two segments agree about paralogy, and that walking from `left`'s linked
    // segment towards `right`'s, the first segment that is aligned on this edge or
    // too long to be a gap is exactly `right`'s.
    // When the segments have paralogs, the same adjacency requirement is applied one
    // level into the paralogy chain.
    fn compatible(&self, left: &SegmentIter<'a, S>, right: &SegmentIter<'a, S>) -> bool {
        debug_assert!(left.aligned(self.edge) && right.aligned(self.edge));
        debug_assert!(!left.same_segment(right));
        let mut left_linked = SegmentIter::<S::Opposite>::from_linked(left, self.edge);
        let right_linked = SegmentIter::<S::Opposite>::from_linked(right, self.edge);

        if left_linked.is_reversed() != right_linked.is_reversed() {
            return false;
        }
        if left.has_next_paralogy() != right.has_next_paralogy() {
            return false;
        }
        if left.has_next_paralogy() && left.next_paralogy_reversed() != right.next_paralogy_reversed() {
            return false;
        }

        // The linked interval of `left` must strictly precede that of `right` in
        // iteration direction.
        if !left_linked.is_reversed() {
            if !left_linked.left_of(right_linked.start_position()) {
                return false;
            }
        } else if !left_linked.right_of(right_linked.start_position()) {
            return false;
        }

        loop {
            debug_assert!(!left_linked.is_last(), "compatible: ran past the end of the linked genome");
            left_linked.to_right(None);
            if left_linked.aligned(self.edge) || left_linked.len() >= self.gap_threshold {
                if left_linked.same_segment(&right_linked) {
                    break;
                }
                return false;
            }
        }

        if left.has_next_paralogy() {
            let mut next_left = *left;
            next_left.to_next_paralogy();
            let mut next_right = *right;
            next_right.to_next_paralogy();

            if !next_left.left_of(next_right.start_position()) {
                return false;
            }
            loop {
                debug_assert!(!next_left.is_last(), "compatible: ran past the end of the paralogy walk");
                next_left.to_right(None);
                if next_left.aligned(self.edge) || next_left.len() >= self.gap_threshold {
                    if next_left.same_segment(&next_right) {
                        break;
                    }
                    return false;
                }
            }
        }

        true
    }
}

//-----------------------------------------------------------------------------

// Navigation.

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    /// Moves the block one step towards lower genome positions.
    ///
    /// The left boundary steps left, becomes the new right boundary, and the block
    /// then re-extends to the left.
    /// The cutoff is accepted for symmetry with [`SegmentIter::to_left`] but has no
    /// effect: the boundaries of a block are always whole segments, and clipping one
    /// would leave the extension step with a sliced boundary it cannot handle.
    /// Callers that need window-bounded iteration should step the boundary iterators
    /// instead.
    /// Stepping over the edge of the genome parks both boundaries out of range.
    pub fn to_left(&mut self, _cutoff: Option<i64>) {
        self.check_boundaries();
        self.right = self.left;
        self.right.to_left(None);
        self.left = self.right;
        if self.right.in_range() {
            self.extend_left();
        }
    }

    /// Moves the block one step towards higher genome positions.
    ///
    /// The mirror image of [`Self::to_left`]; the cutoff is ignored in the same way.
    pub fn to_right(&mut self, _cutoff: Option<i64>) {
        self.check_boundaries();
        self.left = self.right;
        self.left.to_right(None);
        self.right = self.left;
        if self.left.in_range() {
            self.extend_right();
        }
    }

    /// Flips the iteration direction of the block.
    ///
    /// Both boundaries reverse and trade roles, so the left boundary keeps coming
    /// first in iteration direction.
    pub fn reverse(&mut self) {
        self.check_boundaries();
        self.left.reverse();
        self.right.reverse();
        mem::swap(&mut self.left, &mut self.right);
    }

    // Repositions the block across the tree edge recorded in `other`.
    fn to_linked_block(&mut self, other: &GappedSegmentIter<'a, S::Opposite>) {
        let mut left_linked = other.left;
        let mut right_linked = other.right;
        to_right_next_ungapped(&mut left_linked, self.edge, self.gap_threshold);
        to_left_next_ungapped(&mut right_linked, self.edge, self.gap_threshold);
        self.left.to_linked(&left_linked, self.edge);
        self.right.to_linked(&right_linked, self.edge);
    }

    /// Follows the paralogy chain on both boundaries.
    ///
    /// The boundaries are first trimmed inward to their nearest aligned segments,
    /// which must agree about paralogy presence.
    pub fn to_next_paralogy(&mut self) {
        to_right_next_ungapped(&mut self.left, self.edge, self.gap_threshold);
        to_left_next_ungapped(&mut self.right, self.edge, self.gap_threshold);
        self.left.to_next_paralogy();
        self.right.to_next_paralogy();
    }
}

//-----------------------------------------------------------------------------

// Block-level queries.

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    /// Returns `true` if the block is aligned across its tree edge.
    ///
    /// The boundaries, trimmed inward to their nearest aligned segments, must agree;
    /// disagreement means the alignment data is inconsistent.
    pub fn is_aligned(&self) -> bool {
        let (left, right) = self.trimmed_inward();
        assert_eq!(left.aligned(self.edge), right.aligned(self.edge),
            "The boundaries of a gapped block disagree about alignment");
        left.aligned(self.edge)
    }

    /// Returns `true` if the block aligns across its tree edge in reverse
    /// orientation.
    pub fn linked_reversed(&self) -> bool {
        if !self.is_aligned() {
            return false;
        }
        let (left, right) = self.trimmed_inward();
        assert_eq!(left.link_reversed(self.edge), right.link_reversed(self.edge),
            "The boundaries of a gapped block disagree about orientation");
        left.link_reversed(self.edge)
    }

    /// Returns `true` if the block has further paralogs.
    pub fn has_next_paralogy(&self) -> bool {
        let (left, right) = self.trimmed_inward();
        assert_eq!(left.has_next_paralogy(), right.has_next_paralogy(),
            "The boundaries of a gapped block disagree about paralogy");
        left.has_next_paralogy()
    }

    /// Returns `true` if `other` is the same block.
    ///
    /// The boundaries are compared after trimming inward to their nearest aligned
    /// segments, so blocks differing only by raw gap boundaries compare equal.
    pub fn same_block(&self, other: &Self) -> bool {
        let mut this_left = self.left;
        to_right_next_ungapped(&mut this_left, self.edge, self.gap_threshold);
        let mut other_left = other.left;
        to_right_next_ungapped(&mut other_left, self.edge, self.gap_threshold);
        if !this_left.same_segment(&other_left) {
            return false;
        }
        let mut this_right = self.right;
        to_left_next_ungapped(&mut this_right, self.edge, self.gap_threshold);
        let mut other_right = other.right;
        to_left_next_ungapped(&mut other_right, self.edge, self.gap_threshold);
        this_right.same_segment(&other_right)
    }

    /// Returns `true` if `other` is a contiguous but unmerged neighbor of this block.
    ///
    /// The blocks are adjacent when one of this block's outward-trimmed boundaries is
    /// the nearest aligned segment directly past one of `other`'s boundaries.
    pub fn adjacent_to(&self, other: &Self) -> bool {
        let mut boundary = self.left;
        to_left_next_ungapped(&mut boundary, self.edge, self.gap_threshold);
        if !boundary.is_first() {
            let mut candidate = other.left;
            if !candidate.is_first() {
                candidate.to_left(None);
                to_left_next_ungapped(&mut candidate, self.edge, self.gap_threshold);
                if boundary.same_segment(&candidate) {
                    return true;
                }
            }
            let mut candidate = other.right;
            if !candidate.is_last() {
                candidate.to_right(None);
                to_right_next_ungapped(&mut candidate, self.edge, self.gap_threshold);
                if boundary.same_segment(&candidate) {
                    return true;
                }
            }
        }

        let mut boundary = self.right;
        to_right_next_ungapped(&mut boundary, self.edge, self.gap_threshold);
        if !boundary.is_last() {
            let mut candidate = other.left;
            if !candidate.is_first() {
                candidate.to_left(None);
                to_left_next_ungapped(&mut candidate, self.edge, self.gap_threshold);
                if boundary.same_segment(&candidate) {
                    return true;
                }
            }
            let mut candidate = other.right;
            if !candidate.is_last() {
                candidate.to_right(None);
                to_right_next_ungapped(&mut candidate, self.edge, self.gap_threshold);
                if boundary.same_segment(&candidate) {
                    return true;
                }
            }
        }

        false
    }
}

//-----------------------------------------------------------------------------

// Positions and statistics.

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    /// Returns the first position of the block in iteration direction.
    pub fn start_position(&self) -> i64 {
        self.left.start_position()
    }

    /// Returns the total length of the block in bases, gaps included.
    pub fn len(&self) -> usize {
        if !self.is_reversed() {
            (self.right.start_position() + self.right.len() as i64 - self.left.start_position()) as usize
        } else {
            (self.left.start_position() - self.right.start_position() + self.right.len() as i64) as usize
        }
    }

    /// Returns `true` if the block lies entirely before genome position `position`
    /// on the forward strand.
    pub fn left_of(&self, position: i64) -> bool {
        if !self.is_reversed() {
            self.right.left_of(position)
        } else {
            self.left.left_of(position)
        }
    }

    /// Returns `true` if the block lies entirely after genome position `position` on
    /// the forward strand.
    pub fn right_of(&self, position: i64) -> bool {
        if !self.is_reversed() {
            self.left.right_of(position)
        } else {
            self.right.right_of(position)
        }
    }

    /// Returns `true` if the block covers genome position `position`.
    pub fn overlaps(&self, position: i64) -> bool {
        !self.left_of(position) && !self.right_of(position)
    }

    /// Returns `true` if no segment precedes the block in iteration direction.
    pub fn is_first(&self) -> bool {
        self.left.is_first()
    }

    /// Returns `true` if no segment follows the block in iteration direction.
    pub fn is_last(&self) -> bool {
        self.right.is_last()
    }

    /// Returns the number of segments in the block, gaps included.
    pub fn num_segments(&self) -> usize {
        (self.right.array_index() - self.left.array_index()).unsigned_abs() as usize + 1
    }

    /// Returns the number of gap segments in the block.
    ///
    /// The right boundary is aligned by construction and is not counted.
    pub fn num_gaps(&self) -> usize {
        let mut count = 0;
        let mut iter = self.left;
        while !iter.same_segment(&self.right) {
            if !iter.aligned(self.edge) {
                count += 1;
            }
            iter.to_right(None);
        }
        count
    }

    /// Returns the total length of the gap segments in the block.
    pub fn num_gap_bases(&self) -> usize {
        let mut count = 0;
        let mut iter = self.left;
        while !iter.same_segment(&self.right) {
            if !iter.aligned(self.edge) {
                count += iter.len();
            }
            iter.to_right(None);
        }
        count
    }
}

//-----------------------------------------------------------------------------

// Operations that are not meaningful at the block level.

impl<'a, S: Segmentation> GappedSegmentIter<'a, S> {
    /// Exact positioning is not supported at the block level.
    ///
    /// Always returns an error; seek with a boundary iterator instead.
    pub fn seek(&mut self, _position: i64, _slice: bool) -> Result<(), String> {
        Err(String::from("Gapped iterators do not support seeking to a position"))
    }

    /// Slicing is not supported at the block level.
    ///
    /// Always returns an error.
    pub fn slice(&mut self, _start_offset: usize, _end_offset: usize) -> Result<(), String> {
        Err(String::from("Gapped iterators do not support slicing"))
    }

    /// Base extraction is not supported at the block level.
    ///
    /// Always returns an error; extract bases with the boundary iterators instead.
    pub fn sequence(&self) -> Result<Vec<u8>, String> {
        Err(String::from("Gapped iterators do not support sequence extraction"))
    }
}

//-----------------------------------------------------------------------------
