use bio::alignment::distance::levenshtein;

// --------------------------------------------------
/// Edit distance between two sequences normalized by the length of the
/// longer one, giving a dissimilarity fraction in [0, 1].
///
/// Sequences of unequal length are compared in full; the length difference
/// is paid for as insertions. Two empty sequences are identical.
pub fn distance(seq_a: &[u8], seq_b: &[u8]) -> f64 {
    let longest = seq_a.len().max(seq_b.len());
    if longest == 0 {
        return 0.;
    }

    levenshtein(seq_a, seq_b) as f64 / longest as f64
}

// --------------------------------------------------
#[cfg(test)]
mod tests {
    use super::distance;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical() {
        assert_eq!(distance(b"ACGTACGT", b"ACGTACGT"), 0.);
        assert_eq!(distance(b"", b""), 0.);
    }

    #[test]
    fn test_substitution() {
        assert_eq!(distance(b"ACGTACGTAC", b"ACGTACGTAA"), 0.1);
    }

    #[test]
    fn test_unequal_length() {
        // One trailing base missing
        assert_eq!(distance(b"ACGTA", b"ACGT"), 0.2);
        assert_eq!(distance(b"", b"ACGT"), 1.);
    }

    #[test]
    fn test_symmetric() {
        let pairs: [(&[u8], &[u8]); 4] = [
            (b"ACGTTGCA", b"ACGTGCA"),
            (b"AAAA", b"TTTTTT"),
            (b"GATTACA", b"GCATGCT"),
            (b"A", b""),
        ];
        for (a, b) in pairs {
            assert_eq!(distance(a, b), distance(b, a));
            assert_eq!(distance(a, a), 0.);
            assert!((0. ..=1.).contains(&distance(a, b)));
        }
    }
}
