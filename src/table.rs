use crate::merge::MergeCluster;
use anyhow::{anyhow, bail, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use itertools::Itertools;
use std::{
    collections::HashMap,
    io::Write,
    path::Path,
};
use tempfile::NamedTempFile;

/// Sample-by-OTU read counts
#[derive(Debug, Clone, PartialEq)]
pub struct OtuTable {
    pub sample_names: Vec<String>,
    pub otu_names: Vec<String>,
    /// One row per OTU, one column per sample
    pub counts: Vec<Vec<f64>>,
}

// --------------------------------------------------
/// Read a tab-separated count table in BIOM TSV layout. Leading "#" comment
/// lines other than "#OTU ID" are skipped, the next line is the header
/// ("#OTU ID" then the sample names) and every other line is an OTU name
/// followed by its counts.
pub fn read_otu_table(path: &Path) -> Result<OtuTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)
        .map_err(|e| anyhow!("Cannot read {}: {e}", path.display()))?;

    let mut header: Option<StringRecord> = None;
    let mut otu_names = vec![];
    let mut counts = vec![];
    for res in reader.records() {
        let rec = res.map_err(|e| anyhow!("{}: {e}", path.display()))?;
        let first = rec.get(0).unwrap_or_default();
        if header.is_none() {
            if first.starts_with('#') && !first.starts_with("#OTU ID") {
                continue;
            }
            header = Some(rec);
            continue;
        }

        // Blank lines
        if rec.len() == 1 && first.trim().is_empty() {
            continue;
        }

        let mut row = Vec::with_capacity(rec.len().saturating_sub(1));
        for val in rec.iter().skip(1) {
            row.push(parse_count(first, val)?);
        }
        otu_names.push(first.to_string());
        counts.push(row);
    }

    let header = header
        .ok_or_else(|| anyhow!("{}: missing header line", path.display()))?;
    let sample_names: Vec<String> =
        header.iter().skip(1).map(|s| s.to_string()).collect();
    if sample_names.is_empty() {
        bail!("{}: header has no sample columns", path.display());
    }
    if otu_names.is_empty() {
        bail!("{}: the OTU table contains no OTUs", path.display());
    }

    for (name, row) in otu_names.iter().zip(&counts) {
        if row.len() != sample_names.len() {
            bail!(
                "OTU {name} has {} counts but there are {} samples",
                row.len(),
                sample_names.len()
            );
        }
    }

    let mut seen: HashMap<&str, u32> = HashMap::new();
    for name in &otu_names {
        seen.entry(name.as_str()).and_modify(|v| *v += 1).or_insert(1);
    }
    let dups: Vec<_> = seen
        .iter()
        .filter_map(|(name, &count)| (count > 1).then_some(name))
        .sorted()
        .collect();
    if !dups.is_empty() {
        bail!(
            "The following OTU IDs are duplicated: {}",
            dups.iter().join(", ")
        );
    }

    Ok(OtuTable {
        sample_names,
        otu_names,
        counts,
    })
}

// --------------------------------------------------
fn parse_count(otu: &str, val: &str) -> Result<f64> {
    let count: f64 = val
        .trim()
        .parse()
        .map_err(|_| anyhow!(r#"OTU {otu} has an invalid count "{val}""#))?;
    if !count.is_finite() || count < 0. {
        bail!(r#"OTU {otu} has an invalid count "{val}""#);
    }
    Ok(count)
}

// --------------------------------------------------
/// Write one row per cluster, named by its seed, holding the aggregate counts
pub fn write_otu_table(
    output: impl Write,
    table: &OtuTable,
    clusters: &[MergeCluster],
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(output);

    let mut header = vec!["#OTU ID".to_string()];
    header.extend(table.sample_names.iter().cloned());
    wtr.write_record(&header)?;

    for cluster in clusters {
        let mut row = vec![table.otu_names[cluster.seed_index].clone()];
        row.extend(cluster.aggregate_counts.iter().map(|c| format!("{c:.6}")));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

// --------------------------------------------------
/// Write one line per cluster: the seed name followed by the names of the
/// OTUs merged into it, in merge order
pub fn write_membership(
    output: impl Write,
    table: &OtuTable,
    clusters: &[MergeCluster],
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(output);

    for cluster in clusters {
        let row: Vec<&str> = cluster
            .members
            .iter()
            .map(|&i| table.otu_names[i].as_str())
            .collect();
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

// --------------------------------------------------
/// Write the merged table and the membership report. Both are written to
/// temporary files beside their targets and only moved into place once
/// both are complete, so a failure leaves neither output behind.
pub fn write_outputs(
    table_path: &Path,
    membership_path: &Path,
    table: &OtuTable,
    clusters: &[MergeCluster],
) -> Result<()> {
    let mut table_tmp = temp_beside(table_path)?;
    let mut membership_tmp = temp_beside(membership_path)?;

    write_otu_table(&mut table_tmp, table, clusters)
        .map_err(|e| anyhow!("Cannot write {}: {e}", table_path.display()))?;
    write_membership(&mut membership_tmp, table, clusters)
        .map_err(|e| {
            anyhow!("Cannot write {}: {e}", membership_path.display())
        })?;

    table_tmp
        .persist(table_path)
        .map_err(|e| anyhow!("Cannot write {}: {e}", table_path.display()))?;
    membership_tmp.persist(membership_path).map_err(|e| {
        anyhow!("Cannot write {}: {e}", membership_path.display())
    })?;

    Ok(())
}

fn temp_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
        .map_err(|e| anyhow!("Cannot write {}: {e}", path.display()))
}
