use crate::{
    evaluate::{CandidateResult, Thresholds},
    otu::OtuObservation,
    pool::EvaluationPool,
};
use anyhow::{bail, Result};
use log::{debug, info, trace};
use std::cmp::Ordering;

/// A group of OTUs merged into the most abundant one (the seed)
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCluster {
    /// Row position of the seed OTU
    pub seed_index: usize,
    /// Seed OTU name
    pub name: String,
    /// Row positions of all members, seed first then in merge order
    pub members: Vec<usize>,
    pub aggregate_counts: Vec<f64>,
    pub aggregate_abundance: f64,
}

impl MergeCluster {
    /// Start a singleton cluster from `seed`
    pub fn found(seed: &OtuObservation) -> MergeCluster {
        MergeCluster {
            seed_index: seed.index,
            name: seed.name.clone(),
            members: vec![seed.index],
            aggregate_counts: seed.counts.clone(),
            aggregate_abundance: seed.abundance,
        }
    }

    /// Add `otu` to the cluster, updating the aggregates in place
    pub fn absorb(&mut self, otu: &OtuObservation) {
        self.members.push(otu.index);
        for (total, count) in self.aggregate_counts.iter_mut().zip(&otu.counts) {
            *total += count;
        }
        self.aggregate_abundance = self.aggregate_counts.iter().sum();
    }

    // --------------------------------------------------
    /// Check the aggregates against a fresh sum over `members`
    pub fn verify(&self, observations: &[OtuObservation]) -> Result<()> {
        let mut expected = vec![0.; self.aggregate_counts.len()];
        for &member in &self.members {
            for (total, count) in expected.iter_mut().zip(&observations[member].counts)
            {
                *total += count;
            }
        }

        for (sample, (&actual, &wanted)) in
            self.aggregate_counts.iter().zip(&expected).enumerate()
        {
            let tolerance = 1e-9 * wanted.abs().max(1.);
            if (actual - wanted).abs() > tolerance {
                bail!(
                    "Internal error: cluster {} has {actual} reads in sample {sample}, \
                    members sum to {wanted}",
                    self.name
                );
            }
        }

        let seed = &observations[self.seed_index];
        if let Some(&heavier) = self.members[1..]
            .iter()
            .find(|&&i| observations[i].abundance > seed.abundance)
        {
            bail!(
                "Internal error: {} merged into less abundant seed {}",
                observations[heavier].name,
                self.name
            );
        }

        Ok(())
    }
}

// --------------------------------------------------
/// Row positions sorted by abundance descending, then name ascending
pub fn abundance_order(observations: &[OtuObservation]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..observations.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&observations[a], &observations[b]);
        b.abundance
            .total_cmp(&a.abundance)
            .then_with(|| a.name.cmp(&b.name))
    });
    order
}

// --------------------------------------------------
/// Pick the merge target among the admissible results: closest first, then
/// the most abundant cluster, then the cluster name.
pub fn select_target(
    results: &[CandidateResult],
    clusters: &[MergeCluster],
) -> Option<usize> {
    results
        .iter()
        .filter(|res| res.admissible)
        .min_by(|a, b| compare_candidates(a, b, clusters))
        .map(|res| res.cluster)
}

fn compare_candidates(
    a: &CandidateResult,
    b: &CandidateResult,
    clusters: &[MergeCluster],
) -> Ordering {
    let (ca, cb) = (&clusters[a.cluster], &clusters[b.cluster]);
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| cb.aggregate_abundance.total_cmp(&ca.aggregate_abundance))
        .then_with(|| ca.name.cmp(&cb.name))
}

// --------------------------------------------------
/// Greedily merge OTUs in abundance order. Each OTU either joins the best
/// admissible existing cluster or founds a new one. Clusters are returned
/// in creation order.
pub fn merge_otus(
    observations: &[OtuObservation],
    thresholds: &Thresholds,
    pool: &EvaluationPool,
) -> Result<Vec<MergeCluster>> {
    let mut clusters: Vec<MergeCluster> = vec![];

    for index in abundance_order(observations) {
        let otu = &observations[index];
        if clusters.is_empty() {
            debug!("{} seeds the first cluster", otu.name);
            clusters.push(MergeCluster::found(otu));
            continue;
        }

        let results = pool.evaluate_all(otu, &clusters, observations, thresholds);
        for res in &results {
            trace!("{} vs {}: {res:?}", otu.name, clusters[res.cluster].name);
        }

        match select_target(&results, &clusters) {
            Some(target) => {
                debug!("Merging {} into {}", otu.name, clusters[target].name);
                clusters[target].absorb(otu);
            }
            None => {
                debug!("{} seeds a new cluster", otu.name);
                clusters.push(MergeCluster::found(otu));
            }
        }
    }

    verify_partition(&clusters, observations)?;
    info!(
        "Merged {} OTUs into {} clusters",
        observations.len(),
        clusters.len()
    );

    Ok(clusters)
}

// --------------------------------------------------
fn verify_partition(
    clusters: &[MergeCluster],
    observations: &[OtuObservation],
) -> Result<()> {
    let mut seen = vec![false; observations.len()];
    for cluster in clusters {
        cluster.verify(observations)?;
        for &member in &cluster.members {
            if seen[member] {
                bail!(
                    "Internal error: {} is in more than one cluster",
                    observations[member].name
                );
            }
            seen[member] = true;
        }
    }

    if let Some(missing) = seen.iter().position(|&v| !v) {
        bail!(
            "Internal error: {} was not assigned to a cluster",
            observations[missing].name
        );
    }

    Ok(())
}
