//! A repositionable, sliceable, reversible cursor over one segment array.

use crate::genome::{Alignment, Genome};
use crate::segment::{Bottom, Segmentation, Top, NULL_INDEX};
use crate::utils;

use std::marker::PhantomData;
use std::mem;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A cursor over the segment array of one segmentation kind of one genome.
///
/// The iterator refers to a segment by array index and narrows it to a sub-interval
/// with a start offset and an end offset.
/// The offsets are measured in iteration direction: when the iterator is reversed,
/// the start offset trims the physical right end of the segment and iteration
/// proceeds towards lower genome positions.
/// The sum of the offsets never exceeds the segment length.
///
/// The array index may be out of range, which represents a position before the first
/// or after the last segment.
/// Navigation calls park the iterator out of range when they cross the ends of the
/// array; all other accessors require an in-range position, and violating that is a
/// contract violation caught by debug assertions.
///
/// The iterator is `Copy`.
/// A copy owns its navigation state completely, so moving it never affects the
/// iterator it was copied from.
///
/// # Examples
///
/// ```
/// use aligntree::{Alignment, BottomSegment, TopSegment};
///
/// let mut alignment = Alignment::new();
/// let root = alignment.add_genome("root", b"ACGTACGTACGTACGTACGT".to_vec(), None).unwrap();
/// let child = alignment.add_genome("child", b"ACGTACGTACGTACGTACGT".to_vec(), Some(root)).unwrap();
/// alignment.genome_mut(root).set_bottom_segments(vec![
///     BottomSegment::new(0, 10, 1).with_child(0, 0, false),
///     BottomSegment::new(10, 10, 1).with_child(0, 1, true),
/// ]);
/// alignment.genome_mut(child).set_top_segments(vec![
///     TopSegment::new(0, 10).with_parent(0, false),
///     TopSegment::new(10, 10).with_parent(1, true),
/// ]);
///
/// // Find the segment covering position 13 and slice it down to that base.
/// let mut iter = alignment.top_iter(child, 0);
/// iter.seek(13, true);
/// assert_eq!(iter.array_index(), 1);
/// assert_eq!(iter.start_position(), 13);
/// assert_eq!(iter.len(), 1);
///
/// // Cross the tree edge to the parent genome.
/// let mut parent = alignment.bottom_iter(root, 0);
/// parent.to_parent(&iter);
/// assert_eq!(parent.array_index(), 1);
/// assert!(parent.is_reversed());
/// assert_eq!(parent.len(), 1);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SegmentIter<'a, S: Segmentation> {
    alignment: &'a Alignment,
    genome: usize,
    index: i64,
    start_offset: usize,
    end_offset: usize,
    reversed: bool,
    _kind: PhantomData<S>,
}

//-----------------------------------------------------------------------------

impl<'a, S: Segmentation> SegmentIter<'a, S> {
    pub(crate) fn new(alignment: &'a Alignment, genome: usize, index: i64) -> Self {
        SegmentIter {
            alignment, genome, index,
            start_offset: 0,
            end_offset: 0,
            reversed: false,
            _kind: PhantomData,
        }
    }

    // Creates an iterator positioned across the tree edge from `other`.
    pub(crate) fn from_linked(other: &SegmentIter<'a, S::Opposite>, edge: usize) -> Self {
        let mut result = SegmentIter::new(other.alignment, other.genome, 0);
        result.to_linked(other, edge);
        result
    }

    /// Returns the alignment the iterator navigates.
    #[inline]
    pub fn alignment(&self) -> &'a Alignment {
        self.alignment
    }

    /// Returns the identifier of the genome the iterator is in.
    #[inline]
    pub fn genome_id(&self) -> usize {
        self.genome
    }

    /// Returns the genome the iterator is in.
    #[inline]
    pub fn genome(&self) -> &'a Genome {
        self.alignment.genome(self.genome)
    }

    /// Returns the array index of the current segment.
    ///
    /// Values below `0` or at or above the segment count are out-of-range sentinels.
    #[inline]
    pub fn array_index(&self) -> i64 {
        self.index
    }

    /// Returns `true` if the iterator is positioned at a segment.
    #[inline]
    pub fn in_range(&self) -> bool {
        self.index >= 0 && (self.index as usize) < S::count(self.genome())
    }

    /// Repositions the iterator without resetting the offsets or the orientation.
    ///
    /// The index may be an out-of-range sentinel.
    #[inline]
    pub fn reposition(&mut self, genome: usize, index: i64) {
        self.genome = genome;
        self.index = index;
    }

    /// Returns the start offset of the slice, in iteration direction.
    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Returns the end offset of the slice, in iteration direction.
    #[inline]
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    /// Returns `true` if the iterator runs towards lower genome positions.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    // Start position of the current segment on the forward strand.
    #[inline]
    fn segment_start(&self) -> i64 {
        S::start(self.genome(), self.index as usize)
    }

    // Length of the current segment without slicing.
    #[inline]
    fn segment_length(&self) -> usize {
        S::length(self.genome(), self.index as usize)
    }

    /// Narrows the iterator to the given offsets.
    ///
    /// The offsets are measured in iteration direction and their sum must not exceed
    /// the segment length (a contract violation otherwise).
    pub fn slice(&mut self, start_offset: usize, end_offset: usize) {
        debug_assert!(self.in_range(), "slice: the iterator is out of range");
        debug_assert!(start_offset + end_offset <= self.segment_length(), "slice: offsets exceed the segment length");
        self.start_offset = start_offset;
        self.end_offset = end_offset;
    }

    /// Returns the first position of the sliced interval in iteration direction.
    ///
    /// For a reversed iterator this is the highest genome position of the interval.
    pub fn start_position(&self) -> i64 {
        debug_assert!(self.in_range(), "start_position: the iterator is out of range");
        if !self.reversed {
            self.segment_start() + self.start_offset as i64
        } else {
            self.segment_start() + self.segment_length() as i64 - self.start_offset as i64 - 1
        }
    }

    /// Returns the last position of the sliced interval in iteration direction.
    pub fn end_position(&self) -> i64 {
        debug_assert!(self.in_range(), "end_position: the iterator is out of range");
        if !self.reversed {
            self.start_position() + self.len() as i64 - 1
        } else {
            self.start_position() - self.len() as i64 + 1
        }
    }

    /// Returns the length of the sliced interval in bases.
    pub fn len(&self) -> usize {
        debug_assert!(self.in_range(), "len: the iterator is out of range");
        self.segment_length() - self.start_offset - self.end_offset
    }

    /// Returns the bases of the sliced interval, reverse-complemented if the iterator
    /// is reversed.
    pub fn sequence(&self) -> Vec<u8> {
        debug_assert!(self.in_range(), "sequence: the iterator is out of range");
        let start = self.segment_start() as usize;
        let bases = &self.genome().sequence()[start..start + self.segment_length()];
        let bases = if self.reversed { utils::reverse_complement(bases) } else { bases.to_vec() };
        bases[self.start_offset..self.start_offset + self.len()].to_vec()
    }

    /// Returns `true` if the sliced interval lies entirely before genome position
    /// `position` on the forward strand.
    ///
    /// For every in-range iterator and position, exactly one of [`Self::left_of`],
    /// [`Self::right_of`], and [`Self::overlaps`] holds.
    pub fn left_of(&self, position: i64) -> bool {
        if !self.reversed {
            self.start_position() + self.len() as i64 <= position
        } else {
            self.start_position() < position
        }
    }

    /// Returns `true` if the sliced interval lies entirely after genome position
    /// `position` on the forward strand.
    pub fn right_of(&self, position: i64) -> bool {
        if !self.reversed {
            self.start_position() > position
        } else {
            self.start_position() - self.len() as i64 >= position
        }
    }

    /// Returns `true` if the sliced interval covers genome position `position`.
    pub fn overlaps(&self, position: i64) -> bool {
        !self.left_of(position) && !self.right_of(position)
    }

    /// Returns `true` if no segment precedes the current one in iteration direction.
    pub fn is_first(&self) -> bool {
        debug_assert!(self.in_range(), "is_first: the iterator is out of range");
        if !self.reversed {
            self.index == 0
        } else {
            self.index as usize == S::count(self.genome()) - 1
        }
    }

    /// Returns `true` if no segment follows the current one in iteration direction.
    pub fn is_last(&self) -> bool {
        debug_assert!(self.in_range(), "is_last: the iterator is out of range");
        if !self.reversed {
            self.index as usize == S::count(self.genome()) - 1
        } else {
            self.index == 0
        }
    }

    /// Returns `true` if `other` refers to the same segment.
    ///
    /// Offsets and orientation are not compared.
    /// Comparing iterators from different genomes is a contract violation.
    pub fn same_segment(&self, other: &Self) -> bool {
        debug_assert!(self.genome == other.genome, "same_segment: the iterators are in different genomes");
        self.index == other.index
    }
}

//-----------------------------------------------------------------------------

// Navigation.

impl<'a, S: Segmentation> SegmentIter<'a, S> {
    /// Moves the iterator one step towards lower genome positions.
    ///
    /// If the slice has a nonzero start offset, the iterator first expands to the
    /// vacated part of the current segment instead of moving.
    /// If a cutoff is given and the move would cross it, the start offset is clipped
    /// at the cutoff so that the iterator never exposes positions before it.
    /// Moving across the first segment parks the iterator at an out-of-range sentinel.
    pub fn to_left(&mut self, cutoff: Option<i64>) {
        debug_assert!(self.in_range(), "to_left: the iterator is out of range");
        if !self.reversed {
            if self.start_offset == 0 {
                self.index -= 1;
                self.end_offset = 0;
            } else {
                self.end_offset = self.segment_length() - self.start_offset;
                self.start_offset = 0;
            }
            if let Some(cutoff) = cutoff {
                if self.in_range() && self.overlaps(cutoff) {
                    debug_assert!(self.segment_start() <= cutoff, "to_left: the cutoff precedes the segment");
                    self.start_offset = (cutoff - self.segment_start()) as usize;
                }
            }
        } else {
            if self.start_offset == 0 {
                self.index += 1;
                self.end_offset = 0;
            } else {
                self.end_offset = self.segment_length() - self.start_offset;
                self.start_offset = 0;
            }
            if let Some(cutoff) = cutoff {
                if self.in_range() && self.overlaps(cutoff) {
                    self.start_offset =
                        (self.segment_start() + self.segment_length() as i64 - 1 - cutoff) as usize;
                }
            }
        }
        debug_assert!(!self.in_range() || self.start_offset + self.end_offset <= self.segment_length());
    }

    /// Moves the iterator one step towards higher genome positions.
    ///
    /// The mirror image of [`Self::to_left`]: a nonzero end offset expands in place,
    /// a cutoff clips the end offset, and crossing the last segment parks the
    /// iterator out of range.
    pub fn to_right(&mut self, cutoff: Option<i64>) {
        debug_assert!(self.in_range(), "to_right: the iterator is out of range");
        if !self.reversed {
            if self.end_offset == 0 {
                self.index += 1;
                self.start_offset = 0;
            } else {
                self.start_offset = self.segment_length() - self.end_offset;
                self.end_offset = 0;
            }
            if let Some(cutoff) = cutoff {
                if self.in_range() && self.overlaps(cutoff) {
                    self.end_offset =
                        (self.segment_start() + self.segment_length() as i64 - cutoff - 1) as usize;
                }
            }
        } else {
            if self.end_offset == 0 {
                self.index -= 1;
                self.start_offset = 0;
            } else {
                self.start_offset = self.segment_length() - self.end_offset;
                self.end_offset = 0;
            }
            if let Some(cutoff) = cutoff {
                if self.in_range() && self.overlaps(cutoff) {
                    debug_assert!(self.segment_start() <= cutoff, "to_right: the cutoff precedes the segment");
                    self.end_offset = (cutoff - self.segment_start()) as usize;
                }
            }
        }
        debug_assert!(!self.in_range() || self.start_offset + self.end_offset <= self.segment_length());
    }

    /// Flips the iteration direction in place.
    ///
    /// The offsets are direction-relative, so they trade places.
    /// Applying this twice restores the original state.
    pub fn reverse(&mut self) {
        debug_assert!(self.in_range(), "reverse: the iterator is out of range");
        self.reversed = !self.reversed;
        mem::swap(&mut self.start_offset, &mut self.end_offset);
    }

    /// Relocates the iterator to the segment whose forward interval covers genome
    /// position `position` and resets the offsets.
    ///
    /// The initial guess is computed by linear interpolation and then refined by
    /// bisection using the positional trichotomy, so the cost is logarithmic in the
    /// segment count.
    /// Positions outside the genome park the iterator at an out-of-range sentinel.
    /// If `slice` is set, the iterator is additionally narrowed to the single base
    /// at `position`.
    pub fn seek(&mut self, position: i64, slice: bool) {
        let genome = self.genome();
        let seq_len = genome.sequence_len() as i64;
        let count = S::count(genome) as i64;
        debug_assert!(seq_len > 0, "seek: the genome is empty");
        debug_assert!(count > 0, "seek: the genome has no {} segments", S::NAME);

        self.start_offset = 0;
        self.end_offset = 0;
        if position < 0 {
            self.index = -1;
            return;
        }
        if position >= seq_len {
            self.index = count;
            return;
        }

        let average = seq_len as f64 / count as f64;
        self.index = f64::min(count as f64 - 1.0, average * (position as f64 / seq_len as f64)) as i64;

        let mut left = 0;
        let mut right = count - 1;
        while !self.overlaps(position) {
            debug_assert!(left != right, "seek: no segment covers position {}", position);
            if self.right_of(position) {
                right = self.index;
                let delta = ((self.index - left) / 2).max(1);
                self.index -= delta;
            } else {
                debug_assert!(self.left_of(position));
                left = self.index;
                let delta = ((right - self.index) / 2).max(1);
                self.index += delta;
            }
            debug_assert!(self.index >= 0 && self.index < count);
        }

        if slice {
            let segment_start = self.segment_start();
            let segment_length = self.segment_length() as i64;
            self.start_offset = (position - segment_start) as usize;
            self.end_offset = (segment_start + segment_length - position - 1) as usize;
            if self.reversed {
                mem::swap(&mut self.start_offset, &mut self.end_offset);
            }
        }
    }

    // Repositions the iterator across the tree edge recorded in `other`.
    //
    // The target is the segment `other` links to across edge `edge`, in the genome on
    // the far end of that edge.
    // Offsets and orientation are copied from `other` and composed with the recorded
    // relative orientation of the link.
    pub(crate) fn to_linked(&mut self, other: &SegmentIter<'a, S::Opposite>, edge: usize) {
        debug_assert!(other.in_range(), "to_linked: the source iterator is out of range");
        let source = other.genome();
        let source_index = other.index as usize;
        let target = <S::Opposite as Segmentation>::linked_genome(other.alignment, other.genome, edge);
        debug_assert!(target != NULL_INDEX, "to_linked: the source genome has no edge {}", edge);
        let link = <S::Opposite as Segmentation>::link(source, source_index, edge);
        debug_assert!(link != NULL_INDEX, "to_linked: the source segment is unaligned on edge {}", edge);

        self.genome = target;
        self.index = if link == NULL_INDEX { -1 } else { link as i64 };
        self.start_offset = other.start_offset;
        self.end_offset = other.end_offset;
        self.reversed = other.reversed;
        if link != NULL_INDEX && <S::Opposite as Segmentation>::link_reversed(source, source_index, edge) {
            self.reverse();
        }
    }

    /// Repositions the iterator to the segment of the opposite segmentation of the
    /// same genome that covers the position range of `other`.
    ///
    /// The parse link names the starting candidate; because the target segmentation
    /// may be coarser, the iterator then scans forward past candidates that end at or
    /// before the source start.
    /// The offsets are computed so that the sliced result covers exactly the source
    /// range, clipped to the target segment.
    pub fn to_parse(&mut self, other: &SegmentIter<'a, S::Opposite>) {
        debug_assert!(other.in_range(), "to_parse: the source iterator is out of range");
        let genome = other.genome();
        let mut index = <S::Opposite as Segmentation>::parse_index(genome, other.index as usize);
        debug_assert!(index != NULL_INDEX, "to_parse: the source segment has no parse link");

        self.genome = other.genome;
        self.reversed = other.reversed;
        let source_start = other.start_position();
        while source_start >= S::start(genome, index) + S::length(genome, index) as i64 {
            index += 1;
            debug_assert!(index < S::count(genome), "to_parse: ran past the end of the {} segments", S::NAME);
        }
        self.index = index as i64;

        let segment_start = S::start(genome, index);
        let segment_length = S::length(genome, index) as i64;
        if !self.reversed {
            self.start_offset = (source_start - segment_start) as usize;
            let this_end = segment_start + segment_length;
            let source_end = source_start + other.len() as i64;
            self.end_offset = (this_end - source_end).max(0) as usize;
        } else {
            self.start_offset = (segment_start + segment_length - 1 - source_start) as usize;
            let this_end = segment_start;
            let source_end = source_start - other.len() as i64 + 1;
            self.end_offset = (source_end - this_end).max(0) as usize;
        }
        debug_assert!(self.start_offset + self.end_offset <= segment_length as usize);
    }
}

//-----------------------------------------------------------------------------

// Alignment links and paralogy.

impl<'a, S: Segmentation> SegmentIter<'a, S> {
    // True if the current segment is aligned across the given tree edge.
    pub(crate) fn aligned(&self, edge: usize) -> bool {
        debug_assert!(self.in_range(), "aligned: the iterator is out of range");
        S::aligned(self.genome(), self.index as usize, edge)
    }

    // True if the current segment aligns across the given tree edge in reverse
    // orientation.
    pub(crate) fn link_reversed(&self, edge: usize) -> bool {
        debug_assert!(self.in_range(), "link_reversed: the iterator is out of range");
        S::link_reversed(self.genome(), self.index as usize, edge)
    }

    /// Returns `true` if the current segment has a parse link into the opposite
    /// segmentation, so that [`Self::to_parse`] can be followed from it.
    pub fn has_parse(&self) -> bool {
        debug_assert!(self.in_range(), "has_parse: the iterator is out of range");
        S::parse_index(self.genome(), self.index as usize) != NULL_INDEX
    }

    /// Returns the parse link into the opposite segmentation, or [`NULL_INDEX`].
    #[inline]
    pub fn parse_index(&self) -> usize {
        debug_assert!(self.in_range(), "parse_index: the iterator is out of range");
        S::parse_index(self.genome(), self.index as usize)
    }

    /// Returns `true` if the current segment has further paralogs.
    pub fn has_next_paralogy(&self) -> bool {
        debug_assert!(self.in_range(), "has_next_paralogy: the iterator is out of range");
        S::paralogy(self.genome(), self.index as usize) != NULL_INDEX
    }

    /// Returns `true` if the current segment and its next paralog have opposite
    /// orientations relative to the shared ancestral segment.
    pub fn next_paralogy_reversed(&self) -> bool {
        debug_assert!(self.in_range(), "next_paralogy_reversed: the iterator is out of range");
        S::paralogy_reversed(self.genome(), self.index as usize)
    }

    /// Follows the circular paralogy list to the next segment descended from the same
    /// ancestral segment.
    ///
    /// The iteration direction flips when the two paralogs align to the ancestor in
    /// opposite orientations, so that the iterator keeps tracking the same ancestral
    /// strand.
    /// Calling this on a segment without paralogs is a contract violation.
    pub fn to_next_paralogy(&mut self) {
        debug_assert!(self.in_range(), "to_next_paralogy: the iterator is out of range");
        let genome = self.genome();
        let index = self.index as usize;
        let next = S::paralogy(genome, index);
        debug_assert!(next != NULL_INDEX, "to_next_paralogy: the segment has no paralogs");
        let reversed = S::paralogy_parent_reversed(genome, index);
        self.index = next as i64;
        if S::paralogy_parent_reversed(genome, next) != reversed {
            self.reverse();
        }
    }
}

//-----------------------------------------------------------------------------

impl<'a> SegmentIter<'a, Top> {
    /// Returns `true` if the current segment is aligned to the parent genome.
    #[inline]
    pub fn has_parent(&self) -> bool {
        self.aligned(0)
    }

    /// Returns the index of the aligned bottom segment in the parent genome, or
    /// [`NULL_INDEX`].
    #[inline]
    pub fn parent_index(&self) -> usize {
        debug_assert!(self.in_range(), "parent_index: the iterator is out of range");
        self.genome().top(self.index as usize).parent_index()
    }

    /// Returns `true` if the current segment aligns to the parent in reverse
    /// orientation.
    #[inline]
    pub fn parent_reversed(&self) -> bool {
        debug_assert!(self.in_range(), "parent_reversed: the iterator is out of range");
        self.genome().top(self.index as usize).parent_reversed()
    }

    /// Repositions the iterator onto the child genome on edge `edge` of the genome
    /// `other` is in, at the segment recorded in `other`'s child link.
    ///
    /// Offsets and orientation are copied from `other` and composed with the recorded
    /// relative orientation.
    /// Calling this when `other` is unaligned on the edge is a contract violation.
    pub fn to_child(&mut self, other: &SegmentIter<'a, Bottom>, edge: usize) {
        self.to_linked(other, edge);
    }

    /// As [`Self::to_child`], but resolves the edge number from a genome identifier.
    ///
    /// # Panics
    ///
    /// Will panic if `genome` is not a child of the genome `other` is in.
    pub fn to_child_genome(&mut self, other: &SegmentIter<'a, Bottom>, genome: usize) {
        match other.genome().child_offset(genome) {
            Some(edge) => self.to_linked(other, edge),
            None => panic!("Genome {} is not a child of genome {}", genome, other.genome_id()),
        }
    }
}

impl<'a> SegmentIter<'a, Bottom> {
    /// Returns `true` if the current segment is aligned to the child genome on edge
    /// `edge`.
    #[inline]
    pub fn has_child(&self, edge: usize) -> bool {
        self.aligned(edge)
    }

    /// Returns the index of the aligned top segment in the child genome on edge
    /// `edge`, or [`NULL_INDEX`].
    #[inline]
    pub fn child_index(&self, edge: usize) -> usize {
        debug_assert!(self.in_range(), "child_index: the iterator is out of range");
        self.genome().bottom(self.index as usize).child_index(edge)
    }

    /// Returns `true` if the current segment aligns to the child on edge `edge` in
    /// reverse orientation.
    #[inline]
    pub fn child_reversed(&self, edge: usize) -> bool {
        debug_assert!(self.in_range(), "child_reversed: the iterator is out of range");
        self.genome().bottom(self.index as usize).child_reversed(edge)
    }

    /// Repositions the iterator onto the parent genome of the genome `other` is in,
    /// at the segment recorded in `other`'s parent link.
    ///
    /// Offsets and orientation are copied from `other` and composed with the recorded
    /// relative orientation.
    /// Calling this when `other` is unaligned is a contract violation.
    pub fn to_parent(&mut self, other: &SegmentIter<'a, Top>) {
        self.to_linked(other, 0);
    }
}

//-----------------------------------------------------------------------------
