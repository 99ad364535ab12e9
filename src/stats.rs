use statrs::distribution::{ChiSquared, ContinuousCDF};

// --------------------------------------------------
/// Chi-squared goodness-of-fit test of whether `candidate_counts` follows
/// the same per-sample proportions as `seed_counts`.
///
/// The two profiles form a 2 x n contingency table. Expected counts come
/// from the pooled proportions (row total * column total / grand total).
/// Samples empty in both profiles carry no information and are left out of
/// the degrees of freedom. Returns the upper-tail p-value, or 1 when there
/// is nothing to test (no reads at all, or fewer than two informative
/// samples).
pub fn distribution_test(seed_counts: &[f64], candidate_counts: &[f64]) -> f64 {
    debug_assert_eq!(
        seed_counts.len(),
        candidate_counts.len(),
        "count profiles must cover the same samples"
    );

    let seed_total: f64 = seed_counts.iter().sum();
    let candidate_total: f64 = candidate_counts.iter().sum();
    let grand_total = seed_total + candidate_total;
    if grand_total <= 0. {
        return 1.;
    }

    let mut statistic = 0.;
    let mut informative = 0;
    for (&seed, &candidate) in seed_counts.iter().zip(candidate_counts) {
        let column_total = seed + candidate;
        if column_total <= 0. {
            continue;
        }
        informative += 1;

        for (observed, row_total) in
            [(seed, seed_total), (candidate, candidate_total)]
        {
            let expected = row_total * column_total / grand_total;
            if expected > 0. {
                statistic += (observed - expected).powi(2) / expected;
            }
        }
    }

    if informative < 2 {
        return 1.;
    }

    match ChiSquared::new((informative - 1) as f64) {
        Ok(dist) => dist.sf(statistic).clamp(0., 1.),
        Err(_) => 1.,
    }
}

// --------------------------------------------------
#[cfg(test)]
mod tests {
    use super::distribution_test;
    use pretty_assertions::assert_eq;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_proportional_profiles() {
        assert_eq!(distribution_test(&[100., 100.], &[1., 1.]), 1.);
        assert!(close(distribution_test(&[90., 30., 60.], &[3., 1., 2.]), 1.));
    }

    #[test]
    fn test_one_degree_of_freedom() {
        // Statistic 20/3 on 1 df
        let p = distribution_test(&[10., 20.], &[20., 10.]);
        assert!(close(p, 0.009823274507519245), "p = {p}");
    }

    #[test]
    fn test_two_degrees_of_freedom() {
        // Statistic 7/0.9 on 2 df, where the tail is exp(-x/2)
        let p = distribution_test(&[30., 10., 20.], &[5., 5., 0.]);
        assert!(close(p, 0.020468075714350477), "p = {p}");
    }

    #[test]
    fn test_disjoint_profiles() {
        let p = distribution_test(&[100., 0.], &[0., 100.]);
        assert!(p < 1e-40, "p = {p}");
    }

    #[test]
    fn test_degenerate() {
        // No reads anywhere
        assert_eq!(distribution_test(&[0., 0., 0.], &[0., 0., 0.]), 1.);

        // A single informative sample leaves no degrees of freedom
        assert_eq!(distribution_test(&[0., 50., 0.], &[0., 3., 0.]), 1.);

        // Empty samples are skipped rather than dividing by zero
        let with_empty = distribution_test(&[10., 0., 20.], &[20., 0., 10.]);
        let without = distribution_test(&[10., 20.], &[20., 10.]);
        assert!(close(with_empty, without));
    }

    #[test]
    fn test_empty_candidate() {
        assert_eq!(distribution_test(&[10., 20., 30.], &[0., 0., 0.]), 1.);
    }

    #[test]
    fn test_fractional_counts() {
        let p = distribution_test(&[10.5, 20.25], &[1.5, 2.75]);
        assert!((0. ..=1.).contains(&p));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "count profiles must cover the same samples")]
    fn test_mismatched_profiles() {
        distribution_test(&[10., 20.], &[1., 2., 3.]);
    }
}
