//! Genomes and the alignment tree that owns them.
//!
//! An [`Alignment`] is a tree of genomes.
//! Each genome owns a base sequence and two flat segment arrays: top segments
//! aligning it to its parent and bottom segments aligning it to its children.
//! Genomes are identified by their offsets in the alignment arena, and all tree
//! links are stored as such identifiers.
//!
//! The structures here are read-mostly: they are filled in when the alignment is
//! built and then only navigated.
//! [`Alignment::validate`] checks the structural invariants once, so that navigation
//! can trust them and guard with debug assertions only.

use crate::iterator::SegmentIter;
use crate::segment::{Bottom, BottomSegment, Top, TopSegment, NULL_INDEX};

use std::collections::HashMap;

//-----------------------------------------------------------------------------

/// One node of the alignment tree.
///
/// A genome owns its base sequence and its top/bottom segment arrays.
/// The arrays are sorted by start position, non-overlapping, and tile the sequence
/// exactly; a genome has top segments only if it has a parent and bottom segments
/// only if it has children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genome {
    name: String,
    sequence: Vec<u8>,
    top: Vec<TopSegment>,
    bottom: Vec<BottomSegment>,
    parent: usize,
    children: Vec<usize>,
}

impl Genome {
    fn new(name: String, sequence: Vec<u8>, parent: usize) -> Self {
        Genome {
            name, sequence, parent,
            top: Vec::new(),
            bottom: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the name of the genome.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base sequence of the genome.
    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns the length of the base sequence.
    #[inline]
    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns the number of top segments.
    #[inline]
    pub fn top_count(&self) -> usize {
        self.top.len()
    }

    /// Returns the number of bottom segments.
    #[inline]
    pub fn bottom_count(&self) -> usize {
        self.bottom.len()
    }

    /// Returns the top segment at the given index.
    ///
    /// # Panics
    ///
    /// Will panic if the index is out of range.
    #[inline]
    pub fn top(&self, index: usize) -> &TopSegment {
        &self.top[index]
    }

    /// Returns the bottom segment at the given index.
    ///
    /// # Panics
    ///
    /// Will panic if the index is out of range.
    #[inline]
    pub fn bottom(&self, index: usize) -> &BottomSegment {
        &self.bottom[index]
    }

    /// Returns the identifier of the parent genome, or [`NULL_INDEX`] at the root.
    #[inline]
    pub fn parent_genome(&self) -> usize {
        self.parent
    }

    /// Returns the identifiers of the child genomes in edge order.
    #[inline]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Returns the number of child genomes.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the identifier of the child genome on the given edge, or
    /// [`NULL_INDEX`] if the edge does not exist.
    #[inline]
    pub fn child_genome(&self, edge: usize) -> usize {
        self.children.get(edge).cloned().unwrap_or(NULL_INDEX)
    }

    /// Returns the edge number leading to the given child genome.
    pub fn child_offset(&self, genome: usize) -> Option<usize> {
        self.children.iter().position(|&child| child == genome)
    }

    /// Replaces the top segment array.
    pub fn set_top_segments(&mut self, segments: Vec<TopSegment>) {
        self.top = segments;
    }

    /// Replaces the bottom segment array.
    pub fn set_bottom_segments(&mut self, segments: Vec<BottomSegment>) {
        self.bottom = segments;
    }
}

//-----------------------------------------------------------------------------

/// A tree of genomes with pairwise alignments along the edges.
///
/// Genomes are stored in a flat arena and identified by their offsets in it.
/// The first genome added is the root of the tree.
///
/// # Examples
///
/// ```
/// use aligntree::{Alignment, BottomSegment, TopSegment};
///
/// let mut alignment = Alignment::new();
/// let root = alignment.add_genome("root", b"ACGTACGTAC".to_vec(), None).unwrap();
/// let child = alignment.add_genome("child", b"ACGTACGTAC".to_vec(), Some(root)).unwrap();
///
/// alignment.genome_mut(root).set_bottom_segments(vec![
///     BottomSegment::new(0, 10, 1).with_child(0, 0, false),
/// ]);
/// alignment.genome_mut(child).set_top_segments(vec![
///     TopSegment::new(0, 10).with_parent(0, false),
/// ]);
/// assert!(alignment.validate().is_ok());
///
/// let iter = alignment.top_iter(child, 0);
/// assert_eq!(iter.start_position(), 0);
/// assert_eq!(iter.len(), 10);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Alignment {
    genomes: Vec<Genome>,
    names: HashMap<String, usize>,
}

impl Alignment {
    /// Creates an empty alignment.
    pub fn new() -> Self {
        Alignment::default()
    }

    /// Returns the number of genomes in the alignment.
    #[inline]
    pub fn genome_count(&self) -> usize {
        self.genomes.len()
    }

    /// Returns the genome with the given identifier.
    ///
    /// # Panics
    ///
    /// Will panic if the identifier is not valid.
    #[inline]
    pub fn genome(&self, genome: usize) -> &Genome {
        &self.genomes[genome]
    }

    /// Returns a mutable reference to the genome with the given identifier.
    ///
    /// # Panics
    ///
    /// Will panic if the identifier is not valid.
    #[inline]
    pub fn genome_mut(&mut self, genome: usize) -> &mut Genome {
        &mut self.genomes[genome]
    }

    /// Returns the identifier of the genome with the given name.
    #[inline]
    pub fn find_genome(&self, name: &str) -> Option<usize> {
        self.names.get(name).cloned()
    }

    /// Returns the identifier of the root genome, or [`NULL_INDEX`] if the alignment
    /// is empty.
    #[inline]
    pub fn root(&self) -> usize {
        if self.genomes.is_empty() { NULL_INDEX } else { 0 }
    }

    /// Adds a genome to the alignment and returns its identifier.
    ///
    /// The first genome must be added without a parent and becomes the root.
    /// Every later genome is attached as the last child of its parent.
    ///
    /// Returns an error if the name is already in use, if the parent identifier is
    /// not valid, or if a second root is added.
    pub fn add_genome(&mut self, name: &str, sequence: Vec<u8>, parent: Option<usize>) -> Result<usize, String> {
        if self.names.contains_key(name) {
            return Err(format!("Duplicate genome name: {}", name));
        }
        let id = self.genomes.len();
        match parent {
            Some(parent) => {
                if parent >= self.genomes.len() {
                    return Err(format!("Invalid parent genome identifier: {}", parent));
                }
                self.genomes[parent].children.push(id);
                self.genomes.push(Genome::new(String::from(name), sequence, parent));
            },
            None => {
                if !self.genomes.is_empty() {
                    return Err(String::from("The alignment already has a root genome"));
                }
                self.genomes.push(Genome::new(String::from(name), sequence, NULL_INDEX));
            },
        }
        self.names.insert(String::from(name), id);
        Ok(id)
    }

    /// Returns a top segment iterator positioned at the given array index.
    ///
    /// The index may be out of range; see [`SegmentIter`].
    pub fn top_iter(&self, genome: usize, index: i64) -> SegmentIter<'_, Top> {
        SegmentIter::new(self, genome, index)
    }

    /// Returns a bottom segment iterator positioned at the given array index.
    ///
    /// The index may be out of range; see [`SegmentIter`].
    pub fn bottom_iter(&self, genome: usize, index: i64) -> SegmentIter<'_, Bottom> {
        SegmentIter::new(self, genome, index)
    }
}

//-----------------------------------------------------------------------------

// Validation.

impl Alignment {
    /// Checks the structural invariants of the alignment.
    ///
    /// This includes, for every genome: the segment arrays are sorted, non-overlapping,
    /// and tile the base sequence exactly; a genome has top segments if and only if it
    /// has a parent and bottom segments if and only if it has children; all stored
    /// links are in range; parent/child links are mutually consistent and connect
    /// segments of equal length with matching orientations; parse links land on
    /// overlapping intervals; paralogy chains are circular, consist of aligned
    /// segments, and store consistent orientation flags.
    ///
    /// Navigation assumes these invariants and only guards them with debug assertions,
    /// so a freshly built alignment should be validated once before use.
    pub fn validate(&self) -> Result<(), String> {
        for (id, genome) in self.genomes.iter().enumerate() {
            self.validate_tiling(id, genome)?;
            self.validate_top(id, genome)?;
            self.validate_bottom(id, genome)?;
        }
        Ok(())
    }

    fn validate_tiling(&self, id: usize, genome: &Genome) -> Result<(), String> {
        let has_parent = genome.parent != NULL_INDEX;
        if genome.sequence_len() > 0 && has_parent == genome.top.is_empty() {
            return Err(format!("Genome {}: top segmentation does not match the presence of a parent", id));
        }
        if genome.children.is_empty() && !genome.bottom.is_empty() {
            return Err(format!("Genome {}: bottom segments without child genomes", id));
        }

        let mut expected = 0;
        for (i, segment) in genome.top.iter().enumerate() {
            if segment.length() == 0 {
                return Err(format!("Genome {}: top segment {} is empty", id, i));
            }
            if segment.start() != expected {
                return Err(format!("Genome {}: top segment {} does not start at offset {}", id, i, expected));
            }
            expected = segment.start() + segment.length();
        }
        if !genome.top.is_empty() && expected != genome.sequence_len() {
            return Err(format!("Genome {}: top segments do not tile the sequence", id));
        }

        let mut expected = 0;
        for (i, segment) in genome.bottom.iter().enumerate() {
            if segment.length() == 0 {
                return Err(format!("Genome {}: bottom segment {} is empty", id, i));
            }
            if segment.start() != expected {
                return Err(format!("Genome {}: bottom segment {} does not start at offset {}", id, i, expected));
            }
            expected = segment.start() + segment.length();
        }
        if !genome.bottom.is_empty() && expected != genome.sequence_len() {
            return Err(format!("Genome {}: bottom segments do not tile the sequence", id));
        }

        Ok(())
    }

    fn validate_top(&self, id: usize, genome: &Genome) -> Result<(), String> {
        if !genome.top.is_empty() && genome.parent == NULL_INDEX {
            return Err(format!("Genome {}: top segments without a parent genome", id));
        }
        for (i, segment) in genome.top.iter().enumerate() {
            if segment.is_aligned() {
                let parent = &self.genomes[genome.parent];
                let parent_index = segment.parent_index();
                if parent_index >= parent.bottom_count() {
                    return Err(format!("Genome {}: top segment {} has an invalid parent link", id, i));
                }
                let linked = parent.bottom(parent_index);
                if linked.length() != segment.length() {
                    return Err(format!("Genome {}: top segment {} and its parent differ in length", id, i));
                }
                let edge = parent.child_offset(id)
                    .ok_or(format!("Genome {}: not registered as a child of genome {}", id, genome.parent))?;
                if linked.child_count() > edge && linked.has_child(edge) {
                    // The child link names one paralog; the others reach the same
                    // bottom segment through the paralogy chain.
                    let canonical = linked.child_index(edge);
                    if canonical == i {
                        if linked.child_reversed(edge) != segment.parent_reversed() {
                            return Err(format!("Genome {}: top segment {} disagrees with its parent about orientation", id, i));
                        }
                    } else if !self.paralogy_chain_contains(genome, canonical, i) {
                        return Err(format!("Genome {}: top segment {} is not the reciprocal of its parent link", id, i));
                    }
                }
            }
            if segment.parse_index() != NULL_INDEX {
                let parse = segment.parse_index();
                if parse >= genome.bottom_count() {
                    return Err(format!("Genome {}: top segment {} has an invalid parse link", id, i));
                }
                let linked = genome.bottom(parse);
                if linked.start() > segment.start() || linked.start() + linked.length() <= segment.start() {
                    return Err(format!("Genome {}: top segment {} has a parse link outside its interval", id, i));
                }
            }
            self.validate_paralogy(id, genome, i)?;
        }
        Ok(())
    }

    // True if top segment `target` is on the paralogy chain through `start`.
    fn paralogy_chain_contains(&self, genome: &Genome, start: usize, target: usize) -> bool {
        if start >= genome.top_count() {
            return false;
        }
        let mut index = start;
        for _ in 0..genome.top_count() {
            if index == target {
                return true;
            }
            let next = genome.top(index).next_paralogy();
            if next == NULL_INDEX || next >= genome.top_count() || next == start {
                return false;
            }
            index = next;
        }
        false
    }

    fn validate_paralogy(&self, id: usize, genome: &Genome, start: usize) -> Result<(), String> {
        let first = genome.top(start);
        if first.next_paralogy() == NULL_INDEX || first.next_paralogy() == start {
            return Ok(());
        }
        let mut index = start;
        for _ in 0..genome.top_count() {
            let segment = genome.top(index);
            let next = segment.next_paralogy();
            if next == NULL_INDEX || next >= genome.top_count() {
                return Err(format!("Genome {}: broken paralogy chain through top segment {}", id, start));
            }
            if !segment.is_aligned() || !genome.top(next).is_aligned() {
                return Err(format!("Genome {}: unaligned segment in the paralogy chain through top segment {}", id, start));
            }
            let flips = segment.parent_reversed() != genome.top(next).parent_reversed();
            if segment.paralogy_reversed() != flips {
                return Err(format!("Genome {}: inconsistent paralogy orientation at top segment {}", id, index));
            }
            index = next;
            if index == start {
                return Ok(());
            }
        }
        Err(format!("Genome {}: paralogy chain through top segment {} is not circular", id, start))
    }

    fn validate_bottom(&self, id: usize, genome: &Genome) -> Result<(), String> {
        for (i, segment) in genome.bottom.iter().enumerate() {
            if segment.child_count() != genome.child_count() {
                return Err(format!("Genome {}: bottom segment {} has {} child links for {} children",
                    id, i, segment.child_count(), genome.child_count()));
            }
            for edge in 0..segment.child_count() {
                if !segment.has_child(edge) {
                    continue;
                }
                let child = &self.genomes[genome.children[edge]];
                let child_index = segment.child_index(edge);
                if child_index >= child.top_count() {
                    return Err(format!("Genome {}: bottom segment {} has an invalid child link on edge {}", id, i, edge));
                }
                let linked = child.top(child_index);
                if linked.length() != segment.length() {
                    return Err(format!("Genome {}: bottom segment {} and its child on edge {} differ in length", id, i, edge));
                }
                if linked.parent_index() != i {
                    return Err(format!("Genome {}: bottom segment {} is not the reciprocal of its child link on edge {}", id, i, edge));
                }
                if linked.parent_reversed() != segment.child_reversed(edge) {
                    return Err(format!("Genome {}: bottom segment {} disagrees with its child on edge {} about orientation", id, i, edge));
                }
            }
            if segment.parse_index() != NULL_INDEX {
                let parse = segment.parse_index();
                if parse >= genome.top_count() {
                    return Err(format!("Genome {}: bottom segment {} has an invalid parse link", id, i));
                }
                let linked = genome.top(parse);
                if linked.start() > segment.start() || linked.start() + linked.length() <= segment.start() {
                    return Err(format!("Genome {}: bottom segment {} has a parse link outside its interval", id, i));
                }
            }
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn two_genome_alignment() -> Alignment {
        let mut alignment = Alignment::new();
        let root = alignment.add_genome("root", vec![b'A'; 20], None).unwrap();
        let child = alignment.add_genome("child", vec![b'A'; 20], Some(root)).unwrap();
        alignment.genome_mut(root).set_bottom_segments(vec![
            BottomSegment::new(0, 10, 1).with_child(0, 0, false),
            BottomSegment::new(10, 10, 1).with_child(0, 1, true),
        ]);
        alignment.genome_mut(child).set_top_segments(vec![
            TopSegment::new(0, 10).with_parent(0, false),
            TopSegment::new(10, 10).with_parent(1, true),
        ]);
        alignment
    }

    #[test]
    fn build_and_validate() {
        let alignment = two_genome_alignment();
        assert_eq!(alignment.genome_count(), 2, "Wrong number of genomes");
        assert_eq!(alignment.root(), 0, "Wrong root genome");
        assert_eq!(alignment.find_genome("child"), Some(1), "Wrong genome for name child");
        assert_eq!(alignment.genome(0).child_offset(1), Some(0), "Wrong child edge");
        assert_eq!(alignment.genome(1).parent_genome(), 0, "Wrong parent genome");
        let result = alignment.validate();
        assert!(result.is_ok(), "Validation failed: {}", result.unwrap_err());
    }

    #[test]
    fn duplicate_name() {
        let mut alignment = Alignment::new();
        let root = alignment.add_genome("root", Vec::new(), None).unwrap();
        assert!(alignment.add_genome("root", Vec::new(), Some(root)).is_err(), "Added a duplicate genome name");
    }

    #[test]
    fn second_root() {
        let mut alignment = Alignment::new();
        let _ = alignment.add_genome("root", Vec::new(), None).unwrap();
        assert!(alignment.add_genome("other", Vec::new(), None).is_err(), "Added a second root genome");
    }

    #[test]
    fn validate_rejects_overlap() {
        let mut alignment = two_genome_alignment();
        alignment.genome_mut(1).set_top_segments(vec![
            TopSegment::new(0, 12).with_parent(0, false),
            TopSegment::new(10, 10).with_parent(1, true),
        ]);
        assert!(alignment.validate().is_err(), "Validation accepted overlapping segments");
    }

    #[test]
    fn validate_rejects_orientation_mismatch() {
        let mut alignment = two_genome_alignment();
        alignment.genome_mut(1).set_top_segments(vec![
            TopSegment::new(0, 10).with_parent(0, false),
            TopSegment::new(10, 10).with_parent(1, false),
        ]);
        assert!(alignment.validate().is_err(), "Validation accepted an orientation mismatch");
    }

    #[test]
    fn validate_rejects_broken_paralogy() {
        let mut alignment = two_genome_alignment();
        alignment.genome_mut(1).set_top_segments(vec![
            TopSegment::new(0, 10).with_parent(0, false).with_paralogy(1, true),
            TopSegment::new(10, 10).with_parent(1, true),
        ]);
        assert!(alignment.validate().is_err(), "Validation accepted a non-circular paralogy chain");
    }
}

//-----------------------------------------------------------------------------
