use crate::table::OtuTable;
use anyhow::{bail, Result};
use itertools::Itertools;
use std::collections::HashMap;

/// One row of the input table joined with its representative sequence
#[derive(Debug, Clone, PartialEq)]
pub struct OtuObservation {
    /// Row position in the input table
    pub index: usize,
    pub name: String,
    pub sequence: Vec<u8>,
    /// Per-sample counts, in the table's sample order
    pub counts: Vec<f64>,
    /// Sum of `counts`
    pub abundance: f64,
}

impl OtuObservation {
    pub fn new(
        index: usize,
        name: &str,
        sequence: &[u8],
        counts: &[f64],
    ) -> OtuObservation {
        OtuObservation {
            index,
            name: name.to_string(),
            sequence: sequence.to_vec(),
            counts: counts.to_vec(),
            abundance: counts.iter().sum(),
        }
    }
}

// --------------------------------------------------
/// Join every table row with its sequence. OTUs missing from `sequences`
/// are reported together.
pub fn build_observations(
    table: &OtuTable,
    sequences: &HashMap<String, Vec<u8>>,
) -> Result<Vec<OtuObservation>> {
    if table.otu_names.is_empty() {
        bail!("The OTU table contains no OTUs");
    }

    let missing: Vec<_> = table
        .otu_names
        .iter()
        .filter(|name| !sequences.contains_key(*name))
        .sorted()
        .collect();
    if !missing.is_empty() {
        bail!(
            "No sequence found for the following OTUs: {}",
            missing.iter().join(", ")
        );
    }

    let num_samples = table.sample_names.len();
    let mut observations = Vec::with_capacity(table.otu_names.len());
    for (index, (name, counts)) in
        table.otu_names.iter().zip(&table.counts).enumerate()
    {
        if counts.len() != num_samples {
            bail!(
                "OTU {name} has {} counts but there are {num_samples} samples",
                counts.len()
            );
        }
        observations.push(OtuObservation::new(
            index,
            name,
            &sequences[name],
            counts,
        ));
    }

    Ok(observations)
}

// --------------------------------------------------
#[cfg(test)]
mod tests {
    use super::{build_observations, OtuObservation};
    use crate::table::OtuTable;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn table() -> OtuTable {
        OtuTable {
            sample_names: vec!["s1".to_string(), "s2".to_string()],
            otu_names: vec!["otu1".to_string(), "otu2".to_string()],
            counts: vec![vec![1., 2.5], vec![0., 4.]],
        }
    }

    #[test]
    fn test_build_observations() -> Result<()> {
        let sequences = HashMap::from([
            ("otu1".to_string(), b"ACGT".to_vec()),
            ("otu2".to_string(), b"ACGA".to_vec()),
            ("unused".to_string(), b"TTTT".to_vec()),
        ]);
        let observations = build_observations(&table(), &sequences)?;
        assert_eq!(
            observations,
            vec![
                OtuObservation {
                    index: 0,
                    name: "otu1".to_string(),
                    sequence: b"ACGT".to_vec(),
                    counts: vec![1., 2.5],
                    abundance: 3.5,
                },
                OtuObservation {
                    index: 1,
                    name: "otu2".to_string(),
                    sequence: b"ACGA".to_vec(),
                    counts: vec![0., 4.],
                    abundance: 4.,
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_sequences() {
        let sequences = HashMap::new();
        let res = build_observations(&table(), &sequences);
        assert!(res.is_err());
        assert_eq!(
            res.unwrap_err().to_string(),
            "No sequence found for the following OTUs: otu1, otu2"
        );
    }

    #[test]
    fn test_count_mismatch() {
        let mut bad = table();
        bad.counts[1].push(7.);
        let sequences = HashMap::from([
            ("otu1".to_string(), b"ACGT".to_vec()),
            ("otu2".to_string(), b"ACGA".to_vec()),
        ]);
        let res = build_observations(&bad, &sequences);
        assert!(res.is_err());
        assert_eq!(
            res.unwrap_err().to_string(),
            "OTU otu2 has 3 counts but there are 2 samples"
        );
    }

    #[test]
    fn test_empty_table() {
        let empty = OtuTable {
            sample_names: vec!["s1".to_string()],
            otu_names: vec![],
            counts: vec![],
        };
        let res = build_observations(&empty, &HashMap::new());
        assert!(res.is_err());
        assert_eq!(
            res.unwrap_err().to_string(),
            "The OTU table contains no OTUs"
        );
    }
}
