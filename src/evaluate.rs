use crate::{
    distance::distance, merge::MergeCluster, otu::OtuObservation,
    stats::distribution_test,
};

/// Merge thresholds, all of which must hold for a merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Largest sequence distance allowed
    pub distance: f64,

    /// Smallest cluster:candidate abundance ratio allowed
    pub abundance_ratio: f64,

    /// Largest distribution-test p-value allowed
    pub pvalue: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            distance: 0.1,
            abundance_ratio: 10.,
            pvalue: 0.0005,
        }
    }
}

/// Outcome of testing one OTU against one existing cluster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateResult {
    /// Position of the cluster in creation order
    pub cluster: usize,
    pub distance: f64,
    pub abundance_ratio: f64,
    pub p_value: f64,
    pub admissible: bool,
}

// --------------------------------------------------
/// Score `candidate` against `cluster`, whose seed sequence is
/// `seed_sequence`. The three thresholds form a conjunctive gate.
///
/// Note the p-value gate keeps the "maximum p value for merging" reading:
/// a candidate is admissible only when `p_value <= thresholds.pvalue`.
pub fn evaluate(
    candidate: &OtuObservation,
    cluster_id: usize,
    cluster: &MergeCluster,
    seed_sequence: &[u8],
    thresholds: &Thresholds,
) -> CandidateResult {
    let distance = distance(&candidate.sequence, seed_sequence);
    let abundance_ratio = if candidate.abundance > 0. {
        cluster.aggregate_abundance / candidate.abundance
    } else {
        f64::INFINITY
    };
    let p_value = distribution_test(&cluster.aggregate_counts, &candidate.counts);

    CandidateResult {
        cluster: cluster_id,
        distance,
        abundance_ratio,
        p_value,
        admissible: distance <= thresholds.distance
            && abundance_ratio >= thresholds.abundance_ratio
            && p_value <= thresholds.pvalue,
    }
}
