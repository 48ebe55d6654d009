//! Segment records and the segmentation kind discriminator.
//!
//! A genome in the alignment tree carries two parallel segmentations of its sequence.
//! Top segments describe how the genome aligns to its parent, bottom segments describe
//! how it aligns to each of its children.
//! Both kinds are passive records stored in flat arrays owned by the genome.
//! All links between segments are stored as plain array indices, with [`NULL_INDEX`]
//! marking an absent link, so that the whole structure forms an arena without any
//! reference cycles.

use crate::genome::{Alignment, Genome};

//-----------------------------------------------------------------------------

/// Marks the absence of a stored link.
pub const NULL_INDEX: usize = usize::MAX;

//-----------------------------------------------------------------------------

/// An alignment unit between a genome and its parent.
///
/// A top segment covers the half-open interval `start..start + length` of the forward
/// strand of its genome.
/// If the segment is aligned, the parent link names the bottom segment of the parent
/// genome it aligns to, together with a relative orientation.
/// The parse link names the bottom segment of the same genome that starts at or before
/// this segment.
/// Paralogous copies of the same ancestral segment form a circular list through the
/// next-paralogy links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopSegment {
    start: usize,
    length: usize,
    parent: usize,
    parent_reversed: bool,
    parse_index: usize,
    next_paralogy: usize,
    paralogy_reversed: bool,
}

impl TopSegment {
    /// Creates an unaligned top segment covering `start..start + length`.
    pub fn new(start: usize, length: usize) -> Self {
        TopSegment {
            start, length,
            parent: NULL_INDEX,
            parent_reversed: false,
            parse_index: NULL_INDEX,
            next_paralogy: NULL_INDEX,
            paralogy_reversed: false,
        }
    }

    /// Aligns the segment to the given bottom segment of the parent genome.
    pub fn with_parent(mut self, parent: usize, reversed: bool) -> Self {
        self.parent = parent;
        self.parent_reversed = reversed;
        self
    }

    /// Sets the parse link to the given bottom segment of the same genome.
    pub fn with_parse(mut self, parse_index: usize) -> Self {
        self.parse_index = parse_index;
        self
    }

    /// Sets the next-paralogy link.
    ///
    /// The reversed flag states whether this segment and the next paralog map to the
    /// shared ancestral segment in opposite orientations.
    pub fn with_paralogy(mut self, next: usize, reversed: bool) -> Self {
        self.next_paralogy = next;
        self.paralogy_reversed = reversed;
        self
    }

    /// Returns the start position of the segment on the forward strand.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the length of the segment in bases.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns `true` if the segment is aligned to the parent genome.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.parent != NULL_INDEX
    }

    /// Returns the index of the aligned bottom segment in the parent genome, or
    /// [`NULL_INDEX`] if the segment is unaligned.
    #[inline]
    pub fn parent_index(&self) -> usize {
        self.parent
    }

    /// Returns `true` if the segment aligns to the parent in reverse orientation.
    ///
    /// Only meaningful when the segment is aligned.
    #[inline]
    pub fn parent_reversed(&self) -> bool {
        self.parent_reversed
    }

    /// Returns the parse link into the bottom segmentation, or [`NULL_INDEX`].
    #[inline]
    pub fn parse_index(&self) -> usize {
        self.parse_index
    }

    /// Returns the next-paralogy link, or [`NULL_INDEX`].
    ///
    /// A unique segment may either store [`NULL_INDEX`] or its own index (a self-loop).
    #[inline]
    pub fn next_paralogy(&self) -> usize {
        self.next_paralogy
    }

    /// Returns `true` if this segment and the next paralog have opposite orientations
    /// relative to the shared ancestral segment.
    #[inline]
    pub fn paralogy_reversed(&self) -> bool {
        self.paralogy_reversed
    }
}

//-----------------------------------------------------------------------------

/// An alignment unit between a genome and its children.
///
/// A bottom segment covers the half-open interval `start..start + length` of the
/// forward strand of its genome and stores one child link per child edge of the genome.
/// The parse link names the top segment of the same genome that starts at or before
/// this segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BottomSegment {
    start: usize,
    length: usize,
    children: Vec<usize>,
    children_reversed: Vec<bool>,
    parse_index: usize,
}

impl BottomSegment {
    /// Creates a bottom segment covering `start..start + length` with no child links.
    ///
    /// `child_count` must match the number of child genomes of the owning genome.
    pub fn new(start: usize, length: usize, child_count: usize) -> Self {
        BottomSegment {
            start, length,
            children: vec![NULL_INDEX; child_count],
            children_reversed: vec![false; child_count],
            parse_index: NULL_INDEX,
        }
    }

    /// Aligns the segment to the given top segment of the child genome on edge `edge`.
    ///
    /// # Panics
    ///
    /// Will panic if `edge` is not a valid child edge.
    pub fn with_child(mut self, edge: usize, child: usize, reversed: bool) -> Self {
        self.children[edge] = child;
        self.children_reversed[edge] = reversed;
        self
    }

    /// Sets the parse link to the given top segment of the same genome.
    pub fn with_parse(mut self, parse_index: usize) -> Self {
        self.parse_index = parse_index;
        self
    }

    /// Returns the start position of the segment on the forward strand.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the length of the segment in bases.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the number of child edges the segment stores links for.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if the segment is aligned to the child genome on edge `edge`.
    #[inline]
    pub fn has_child(&self, edge: usize) -> bool {
        self.children[edge] != NULL_INDEX
    }

    /// Returns the index of the aligned top segment in the child genome on edge `edge`,
    /// or [`NULL_INDEX`] if the segment is unaligned on that edge.
    #[inline]
    pub fn child_index(&self, edge: usize) -> usize {
        self.children[edge]
    }

    /// Returns `true` if the segment aligns to the child on edge `edge` in reverse
    /// orientation.
    ///
    /// Only meaningful when the segment is aligned on that edge.
    #[inline]
    pub fn child_reversed(&self, edge: usize) -> bool {
        self.children_reversed[edge]
    }

    /// Returns the parse link into the top segmentation, or [`NULL_INDEX`].
    #[inline]
    pub fn parse_index(&self) -> usize {
        self.parse_index
    }
}

//-----------------------------------------------------------------------------

/// Uniform field access for one segmentation kind.
///
/// The top and bottom segmentations of a genome are mirror images of each other:
/// where a top segment links to the parent genome, a bottom segment links to an
/// indexed child genome.
/// This trait lets [`crate::SegmentIter`] and [`crate::GappedSegmentIter`] be written
/// once for both kinds.
/// The `edge` argument selects the child edge for the bottom kind and is ignored by
/// the top kind, whose only tree edge is the one to the parent.
pub trait Segmentation: Copy + std::fmt::Debug + PartialEq + Eq {
    /// The other segmentation kind of the same genome.
    type Opposite: Segmentation<Opposite = Self>;

    /// Name of the segmentation kind, used in messages.
    const NAME: &'static str;

    /// Returns the number of segments of this kind in the genome.
    fn count(genome: &Genome) -> usize;

    /// Returns the start position of the segment on the forward strand.
    fn start(genome: &Genome, index: usize) -> i64;

    /// Returns the length of the segment in bases.
    fn length(genome: &Genome, index: usize) -> usize;

    /// Returns `true` if the segment is aligned across the given tree edge.
    fn aligned(genome: &Genome, index: usize, edge: usize) -> bool;

    /// Returns the index of the linked segment across the given tree edge.
    fn link(genome: &Genome, index: usize, edge: usize) -> usize;

    /// Returns `true` if the link across the given tree edge is reversed.
    fn link_reversed(genome: &Genome, index: usize, edge: usize) -> bool;

    /// Returns the identifier of the genome on the other end of the given tree edge,
    /// or [`NULL_INDEX`] if there is none.
    fn linked_genome(alignment: &Alignment, genome: usize, edge: usize) -> usize;

    /// Returns the parse link into the opposite segmentation, or [`NULL_INDEX`].
    fn parse_index(genome: &Genome, index: usize) -> usize;

    /// Returns the next-paralogy link, or [`NULL_INDEX`] if the segment is unique.
    ///
    /// Self-loops are normalized to [`NULL_INDEX`].
    fn paralogy(genome: &Genome, index: usize) -> usize;

    /// Returns `true` if the segment and its next paralog have opposite orientations.
    fn paralogy_reversed(genome: &Genome, index: usize) -> bool;

    /// Returns the orientation of the segment relative to the ancestral copy shared
    /// with its paralogs.
    fn paralogy_parent_reversed(genome: &Genome, index: usize) -> bool;
}

/// The segmentation aligning a genome to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Top;

/// The segmentation aligning a genome to its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bottom;

impl Segmentation for Top {
    type Opposite = Bottom;

    const NAME: &'static str = "top";

    #[inline]
    fn count(genome: &Genome) -> usize {
        genome.top_count()
    }

    #[inline]
    fn start(genome: &Genome, index: usize) -> i64 {
        genome.top(index).start() as i64
    }

    #[inline]
    fn length(genome: &Genome, index: usize) -> usize {
        genome.top(index).length()
    }

    #[inline]
    fn aligned(genome: &Genome, index: usize, _edge: usize) -> bool {
        genome.top(index).is_aligned()
    }

    #[inline]
    fn link(genome: &Genome, index: usize, _edge: usize) -> usize {
        genome.top(index).parent_index()
    }

    #[inline]
    fn link_reversed(genome: &Genome, index: usize, _edge: usize) -> bool {
        genome.top(index).parent_reversed()
    }

    #[inline]
    fn linked_genome(alignment: &Alignment, genome: usize, _edge: usize) -> usize {
        alignment.genome(genome).parent_genome()
    }

    #[inline]
    fn parse_index(genome: &Genome, index: usize) -> usize {
        genome.top(index).parse_index()
    }

    #[inline]
    fn paralogy(genome: &Genome, index: usize) -> usize {
        let next = genome.top(index).next_paralogy();
        if next == index { NULL_INDEX } else { next }
    }

    #[inline]
    fn paralogy_reversed(genome: &Genome, index: usize) -> bool {
        genome.top(index).paralogy_reversed()
    }

    #[inline]
    fn paralogy_parent_reversed(genome: &Genome, index: usize) -> bool {
        genome.top(index).parent_reversed()
    }
}

impl Segmentation for Bottom {
    type Opposite = Top;

    const NAME: &'static str = "bottom";

    #[inline]
    fn count(genome: &Genome) -> usize {
        genome.bottom_count()
    }

    #[inline]
    fn start(genome: &Genome, index: usize) -> i64 {
        genome.bottom(index).start() as i64
    }

    #[inline]
    fn length(genome: &Genome, index: usize) -> usize {
        genome.bottom(index).length()
    }

    #[inline]
    fn aligned(genome: &Genome, index: usize, edge: usize) -> bool {
        genome.bottom(index).has_child(edge)
    }

    #[inline]
    fn link(genome: &Genome, index: usize, edge: usize) -> usize {
        genome.bottom(index).child_index(edge)
    }

    #[inline]
    fn link_reversed(genome: &Genome, index: usize, edge: usize) -> bool {
        genome.bottom(index).child_reversed(edge)
    }

    #[inline]
    fn linked_genome(alignment: &Alignment, genome: usize, edge: usize) -> usize {
        alignment.genome(genome).child_genome(edge)
    }

    #[inline]
    fn parse_index(genome: &Genome, index: usize) -> usize {
        genome.bottom(index).parse_index()
    }

    // Duplications are expressed on the child side of a tree edge, so bottom
    // segments carry no paralogy links.
    #[inline]
    fn paralogy(_genome: &Genome, _index: usize) -> usize {
        NULL_INDEX
    }

    #[inline]
    fn paralogy_reversed(_genome: &Genome, _index: usize) -> bool {
        false
    }

    #[inline]
    fn paralogy_parent_reversed(_genome: &Genome, _index: usize) -> bool {
        false
    }
}

//-----------------------------------------------------------------------------
