use crate::{
    evaluate::{evaluate, CandidateResult, Thresholds},
    merge::MergeCluster,
    otu::OtuObservation,
};
use anyhow::{anyhow, Result};
use rayon::prelude::*;

/// Worker threads that score one candidate against every existing cluster.
/// Workers only read the cluster snapshot they are handed.
pub struct EvaluationPool {
    pool: rayon::ThreadPool,
}

impl EvaluationPool {
    pub fn new(num_threads: usize) -> Result<EvaluationPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("dbotu-eval-{i}"))
            .build()
            .map_err(|e| anyhow!("Cannot start {num_threads} threads: {e}"))?;
        Ok(EvaluationPool { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    // --------------------------------------------------
    /// Evaluate `candidate` against each cluster in `clusters`. One result
    /// per cluster, tagged with the cluster's position in the slice.
    /// Callers must not rely on the order of the returned results.
    pub fn evaluate_all(
        &self,
        candidate: &OtuObservation,
        clusters: &[MergeCluster],
        observations: &[OtuObservation],
        thresholds: &Thresholds,
    ) -> Vec<CandidateResult> {
        self.pool.install(|| {
            clusters
                .par_iter()
                .enumerate()
                .map(|(cluster_id, cluster)| {
                    evaluate(
                        candidate,
                        cluster_id,
                        cluster,
                        &observations[cluster.seed_index].sequence,
                        thresholds,
                    )
                })
                .collect()
        })
    }
}

// --------------------------------------------------
#[cfg(test)]
mod tests {
    use super::EvaluationPool;
    use crate::{
        evaluate::Thresholds, merge::MergeCluster, otu::OtuObservation,
    };
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_evaluate_all() -> Result<()> {
        let observations = vec![
            OtuObservation::new(0, "a", b"AAAAAAAAAA", &[500., 100.]),
            OtuObservation::new(1, "b", b"CCCCCCCCCC", &[300., 300.]),
            OtuObservation::new(2, "c", b"AAAAAAAAAC", &[5., 1.]),
        ];
        let clusters: Vec<_> =
            observations[..2].iter().map(MergeCluster::found).collect();
        let thresholds = Thresholds {
            pvalue: 1.,
            ..Thresholds::default()
        };

        let single = EvaluationPool::new(1)?;
        let many = EvaluationPool::new(4)?;
        assert_eq!(single.num_threads(), 1);
        assert_eq!(many.num_threads(), 4);

        let res1 =
            single.evaluate_all(&observations[2], &clusters, &observations, &thresholds);
        let res4 =
            many.evaluate_all(&observations[2], &clusters, &observations, &thresholds);
        assert_eq!(res1, res4);

        let mut ids: Vec<_> = res1.iter().map(|r| r.cluster).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1]);

        let admissible: Vec<_> = res1
            .iter()
            .filter(|r| r.admissible)
            .map(|r| r.cluster)
            .collect();
        assert_eq!(admissible, vec![0]);

        Ok(())
    }

    #[test]
    fn test_no_clusters() -> Result<()> {
        let pool = EvaluationPool::new(2)?;
        let cand = OtuObservation::new(0, "a", b"ACGT", &[1.]);
        let res = pool.evaluate_all(&cand, &[], &[], &Thresholds::default());
        assert!(res.is_empty());
        Ok(())
    }
}
