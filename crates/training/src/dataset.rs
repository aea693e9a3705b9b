use emgmm_core::*;
use emgmm_mixture::*;
use std::path::Path;

/// An ordered collection of feature vectors, all of length `dim`.
///
/// Order never affects the trained statistics, but it does fix which
/// records a given seed picks during data-driven initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    dim: usize,
    records: Vec<Vec<Feature>>,
}

impl Dataset {
    /// Wraps in-memory records, checking every length against `dim`.
    pub fn new(dim: usize, records: Vec<Vec<Feature>>) -> Result<Self> {
        if let Some((t, x)) = records.iter().enumerate().find(|(_, x)| x.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: x.len(),
                record: Some(t),
            });
        }
        Ok(Self { dim, records })
    }

    /// Parses one record per line, fields separated by whitespace or commas.
    ///
    /// Blank lines are skipped. With `skip_id`, the first field of each line
    /// is a record identifier and is discarded before the `dim` features.
    pub fn parse(text: &str, dim: usize, skip_id: bool) -> Result<Self> {
        let mut records = Vec::new();
        for (n, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let mut fields = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .peekable();
            if fields.peek().is_none() {
                continue;
            }
            if skip_id {
                fields.next();
            }
            let x = fields
                .map(|token| match token.parse::<Feature>() {
                    Ok(x) if x.is_finite() => Ok(x),
                    _ => Err(Error::MalformedDataRecord {
                        line: n,
                        reason: format!("not a finite real: {:?}", token),
                    }),
                })
                .collect::<Result<Vec<Feature>>>()?;
            if x.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    found: x.len(),
                    record: Some(records.len()),
                });
            }
            records.push(x);
        }
        Ok(Self { dim, records })
    }

    /// Reads and parses a dataset file.
    pub fn load(path: &Path, dim: usize, skip_id: bool) -> Result<Self> {
        log::info!("{:<32}{:<32}", "loading dataset", path.display());
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::parse(&text, dim, skip_id)?;
        log::info!("{:<32}{:<32}", "loaded records", dataset.len());
        Ok(dataset)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn records(&self) -> &[Vec<Feature>] {
        &self.records
    }

    /// Splits into at most `n` contiguous partitions of near-equal size,
    /// each paired with the index of its first record.
    pub fn partitions(&self, n: usize) -> Vec<(usize, &[Vec<Feature>])> {
        let size = self.records.len().div_ceil(n.max(1)).max(1);
        self.records
            .chunks(size)
            .enumerate()
            .map(|(c, chunk)| (c * size, chunk))
            .collect()
    }
}

impl AsRef<[Vec<Feature>]> for Dataset {
    fn as_ref(&self) -> &[Vec<Feature>] {
        &self.records
    }
}
