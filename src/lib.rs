//! # aligntree: segment-level navigation for hierarchical whole-genome alignments.
//!
//! A hierarchical alignment arranges genomes in a phylogenetic tree and aligns each
//! genome to its neighbors in the tree.
//! Every genome partitions its sequence into segments twice: top segments describe
//! how the genome aligns to its parent, and bottom segments describe how it aligns to
//! each of its children.
//! Aligned segments on the two sides of a tree edge have equal lengths, so projecting
//! an interval from one genome to another is index arithmetic instead of sequence
//! comparison.
//!
//! The crate provides the navigation layer over such a structure.
//!
//! ### Basic concepts
//!
//! An [`Alignment`] owns the genomes and their segment arrays; see
//! [`Alignment::validate`] for the structural invariants.
//! A [`SegmentIter`] is a cursor over one segment array of one genome.
//! It can seek to a genome position in logarithmic time, slice a segment down to a
//! sub-interval, iterate in either orientation, and follow the stored links: to the
//! parent or a child genome, to the other segmentation of the same genome, or around
//! a paralogy chain.
//!
//! A [`GappedSegmentIter`] presents a maximal run of segments as one aligned block by
//! swallowing unaligned gaps up to a caller-chosen threshold, so small indels do not
//! fragment coordinate projection between genomes.
//!
//! Random alignments for testing and benchmarking can be generated with
//! [`random_alignment`].

pub mod gapped;
pub mod genome;
pub mod iterator;
pub mod random;
pub mod segment;
pub mod utils;

pub use gapped::GappedSegmentIter;
pub use genome::{Alignment, Genome};
pub use iterator::SegmentIter;
pub use random::{random_alignment, RandomAlignmentParams};
pub use segment::{Bottom, BottomSegment, Segmentation, Top, TopSegment, NULL_INDEX};
