//! Random alignment generation for testing and benchmarking.

use crate::genome::Alignment;
use crate::segment::{BottomSegment, TopSegment};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

//-----------------------------------------------------------------------------

/// Parameters for [`random_alignment`].
///
/// The generated alignment is a star: one root genome with `children` leaf genomes.
/// Every root segment is aligned to each child independently with probability
/// `1.0 - gap_probability`, each child inserts unaligned segments of its own with the
/// same probability, and each aligned pair is inverted with probability
/// `inversion_probability`.
#[derive(Clone, Debug)]
pub struct RandomAlignmentParams {
    /// Seed for the random number generator.
    pub seed: u64,
    /// Number of child genomes.
    pub children: usize,
    /// Number of segments in the root genome.
    pub segments: usize,
    /// Mean segment length in the root genome.
    pub mean_segment_len: usize,
    /// Probability of a deletion in a child and of an insertion before a segment.
    pub gap_probability: f64,
    /// Maximum length of an inserted segment.
    pub max_gap_len: usize,
    /// Probability that an aligned pair of segments is inverted.
    pub inversion_probability: f64,
}

impl Default for RandomAlignmentParams {
    fn default() -> Self {
        RandomAlignmentParams {
            seed: 0x4A4C_5453,
            children: 2,
            segments: 100,
            mean_segment_len: 10,
            gap_probability: 0.1,
            max_gap_len: 20,
            inversion_probability: 0.05,
        }
    }
}

impl RandomAlignmentParams {
    fn validate(&self) -> Result<(), String> {
        if self.children == 0 {
            return Err(String::from("A random alignment needs at least one child genome"));
        }
        if self.segments == 0 {
            return Err(String::from("A random alignment needs at least one segment"));
        }
        if self.mean_segment_len == 0 {
            return Err(String::from("The mean segment length must be nonzero"));
        }
        if !(0.0..=1.0).contains(&self.gap_probability) {
            return Err(format!("Invalid gap probability: {}", self.gap_probability));
        }
        if !(0.0..=1.0).contains(&self.inversion_probability) {
            return Err(format!("Invalid inversion probability: {}", self.inversion_probability));
        }
        if self.gap_probability > 0.0 && self.max_gap_len == 0 {
            return Err(String::from("The maximum gap length must be nonzero when gaps are possible"));
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

fn random_sequence(rng: &mut StdRng, len: usize) -> Vec<u8> {
    const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}

/// Generates a random alignment with the given parameters.
///
/// The result is deterministic in the parameters and passes
/// [`Alignment::validate`].
/// The first root segment is always aligned to every child, so every child genome
/// has at least one aligned segment.
pub fn random_alignment(params: &RandomAlignmentParams) -> Result<Alignment, String> {
    params.validate()?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let lengths: Vec<usize> = (0..params.segments)
        .map(|_| rng.gen_range(1..=2 * params.mean_segment_len - 1))
        .collect();
    let root_len = lengths.iter().sum();

    let mut alignment = Alignment::new();
    let root_sequence = random_sequence(&mut rng, root_len);
    let root = alignment.add_genome("root", root_sequence, None)?;

    // links[c][i] is the top segment of child c aligned to root segment i.
    let mut links: Vec<Vec<Option<(usize, bool)>>> = Vec::with_capacity(params.children);
    for c in 0..params.children {
        let mut tops: Vec<TopSegment> = Vec::new();
        let mut child_links = vec![None; params.segments];
        let mut pos = 0;
        for (i, len) in lengths.iter().enumerate() {
            if params.gap_probability > 0.0 && rng.gen_bool(params.gap_probability) {
                let gap = rng.gen_range(1..=params.max_gap_len);
                tops.push(TopSegment::new(pos, gap));
                pos += gap;
            }
            if i == 0 || params.gap_probability == 0.0 || !rng.gen_bool(params.gap_probability) {
                let reversed = params.inversion_probability > 0.0
                    && rng.gen_bool(params.inversion_probability);
                child_links[i] = Some((tops.len(), reversed));
                tops.push(TopSegment::new(pos, *len).with_parent(i, reversed));
                pos += len;
            }
        }
        links.push(child_links);

        let sequence = random_sequence(&mut rng, pos);
        let child = alignment.add_genome(&format!("child_{}", c), sequence, Some(root))?;
        alignment.genome_mut(child).set_top_segments(tops);
    }

    let mut bottoms = Vec::with_capacity(params.segments);
    let mut start = 0;
    for (i, len) in lengths.iter().enumerate() {
        let mut segment = BottomSegment::new(start, *len, params.children);
        for (c, child_links) in links.iter().enumerate() {
            if let Some((top, reversed)) = child_links[i] {
                segment = segment.with_child(c, top, reversed);
            }
        }
        bottoms.push(segment);
        start += len;
    }
    alignment.genome_mut(root).set_bottom_segments(bottoms);

    alignment.validate()?;
    Ok(alignment)
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let params = RandomAlignmentParams::default();
        let first = random_alignment(&params).unwrap();
        let second = random_alignment(&params).unwrap();
        assert_eq!(first.genome_count(), second.genome_count(), "Different numbers of genomes");
        for id in 0..first.genome_count() {
            assert_eq!(first.genome(id), second.genome(id), "Different genome {}", id);
        }
    }

    #[test]
    fn generated_alignment_is_valid() {
        let params = RandomAlignmentParams {
            seed: 0xDEAD,
            children: 3,
            segments: 200,
            mean_segment_len: 5,
            gap_probability: 0.3,
            max_gap_len: 15,
            inversion_probability: 0.2,
        };
        let alignment = random_alignment(&params).unwrap();
        assert_eq!(alignment.genome_count(), 4, "Wrong number of genomes");
        assert_eq!(alignment.genome(alignment.root()).bottom_count(), 200, "Wrong number of root segments");
        for &child in alignment.genome(alignment.root()).children() {
            assert!(alignment.genome(child).top_count() > 0, "Child genome {} has no segments", child);
            assert!(alignment.genome(child).top(0).is_aligned() || alignment.genome(child).top(1).is_aligned(),
                "Child genome {} does not start with an aligned prefix", child);
        }
    }

    #[test]
    fn invalid_parameters() {
        let no_children = RandomAlignmentParams { children: 0, ..Default::default() };
        assert!(random_alignment(&no_children).is_err(), "Accepted zero children");
        let no_segments = RandomAlignmentParams { segments: 0, ..Default::default() };
        assert!(random_alignment(&no_segments).is_err(), "Accepted zero segments");
        let bad_probability = RandomAlignmentParams { gap_probability: 1.5, ..Default::default() };
        assert!(random_alignment(&bad_probability).is_err(), "Accepted an invalid probability");
    }
}

//-----------------------------------------------------------------------------
