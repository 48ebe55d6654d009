//! Utility functions for working with DNA sequences.

//-----------------------------------------------------------------------------

const fn generate_complement() -> [u8; 256] {
    let mut result = [b'N'; 256];
    result[b'a' as usize] = b'T'; result[b'A' as usize] = b'T';
    result[b'c' as usize] = b'G'; result[b'C' as usize] = b'G';
    result[b'g' as usize] = b'C'; result[b'G' as usize] = b'C';
    result[b't' as usize] = b'A'; result[b'T' as usize] = b'A';
    result
}

const COMPLEMENT: [u8; 256] = generate_complement();

/// Returns the complement of the given base.
///
/// Values outside `acgtACGT` are complemented to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

/// Returns the reverse complement of the given sequence.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&base| complement(base)).collect()
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
