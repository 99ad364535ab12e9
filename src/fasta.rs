use anyhow::{anyhow, bail, Result};
use itertools::Itertools;
use kseq::parse_reader;
use log::info;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

// --------------------------------------------------
/// Read representative sequences keyed by record ID (the header up to the
/// first whitespace). Each sequence is also reachable by its full header
/// line so that table names containing spaces still resolve; an ID always
/// wins over a full header with the same text. Sequences are upper-cased.
pub fn read_fasta(path: &Path) -> Result<HashMap<String, Vec<u8>>> {
    let mut reader = parse_reader(open(path)?)
        .map_err(|e| anyhow!("{}: {e}", path.display()))?;

    let mut sequences: HashMap<String, Vec<u8>> = HashMap::new();
    let mut full_headers: Vec<(String, Vec<u8>)> = vec![];
    let mut dups: Vec<String> = vec![];
    while let Some(rec) = reader
        .iter_record()
        .map_err(|e| anyhow!("{}: {e}", path.display()))?
    {
        let id = rec.head().to_string();
        let seq = rec.seq().trim().to_ascii_uppercase().into_bytes();
        let desc = rec.des().trim();
        if !desc.is_empty() {
            full_headers.push((format!("{id} {desc}"), seq.clone()));
        }
        if sequences.insert(id.clone(), seq).is_some() {
            dups.push(id);
        }
    }

    if !dups.is_empty() {
        bail!(
            "The following sequence IDs are duplicated: {}",
            dups.iter().sorted().dedup().join(", ")
        );
    }

    if sequences.is_empty() {
        bail!("{}: no sequences found", path.display());
    }
    info!(
        r#"Read {} sequences from "{}""#,
        sequences.len(),
        path.display()
    );

    for (header, seq) in full_headers {
        sequences.entry(header).or_insert(seq);
    }

    Ok(sequences)
}

// --------------------------------------------------
fn open(filename: &Path) -> Result<Box<dyn BufRead>> {
    Ok(Box::new(BufReader::new(File::open(filename).map_err(
        |e| anyhow!("Cannot read {}: {e}", filename.display()),
    )?)))
}
