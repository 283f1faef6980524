//! Sparse `label idx:value ...` example reader.
//!
//! Indices are 1-based and densified into a vector of a caller-declared
//! dimension. Blank lines and `#` comments are skipped. Labels are returned
//! as raw integers; binary (`±1`) or class-index checks belong to the caller.
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

use crate::math::FeatureVector;

/// One parsed example.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub label: i64,
    pub feature: FeatureVector,
}

/// Parse a single record into `(label, dense feature)`.
pub fn parse_line(line: &str, dim: usize) -> Result<(i64, FeatureVector)> {
    let content = strip_comment(line);
    let mut tokens = content.split_whitespace();

    let label_token = tokens
        .next()
        .ok_or_else(|| anyhow!("Missing label in record '{}'", line.trim()))?;
    let label = label_token
        .parse::<i64>()
        .with_context(|| format!("Invalid label '{}'", label_token))?;

    let mut feature = FeatureVector::zeros(dim);
    for token in tokens {
        let (index, value) = token
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected 'index:value', found '{}'", token))?;
        let index = index
            .parse::<usize>()
            .with_context(|| format!("Invalid feature index in '{}'", token))?;
        let value = value
            .parse::<f64>()
            .with_context(|| format!("Invalid feature value in '{}'", token))?;
        if !value.is_finite() {
            bail!("Non-finite feature value in '{}'", token);
        }
        if index == 0 || index > dim {
            bail!(
                "Feature index {} out of range 1..={} in '{}'",
                index,
                dim,
                token
            );
        }
        feature[index - 1] = value;
    }

    Ok((label, feature))
}

/// Streaming reader over an example file.
pub struct ExampleReader<R: BufRead> {
    lines: Lines<R>,
    dim: usize,
    line_no: usize,
}

impl<R: BufRead> ExampleReader<R> {
    pub fn new(reader: R, dim: usize) -> Self {
        Self {
            lines: reader.lines(),
            dim,
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for ExampleReader<R> {
    type Item = Result<LabeledExample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("Failed to read line {}", self.line_no + 1)),
                    )
                }
            };
            self.line_no += 1;
            if strip_comment(&line).trim().is_empty() {
                continue;
            }
            let line_no = self.line_no;
            return Some(
                parse_line(&line, self.dim)
                    .map(|(label, feature)| LabeledExample { label, feature })
                    .with_context(|| format!("Invalid record at line {}", line_no)),
            );
        }
    }
}

/// Open `path` for streaming.
pub fn open_examples<P: AsRef<Path>>(path: P, dim: usize) -> Result<ExampleReader<BufReader<File>>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open example file: {}", path.as_ref().display()))?;
    Ok(ExampleReader::new(BufReader::new(file), dim))
}

/// Read every example in `path`.
pub fn read_examples<P: AsRef<Path>>(path: P, dim: usize) -> Result<Vec<LabeledExample>> {
    let display = path.as_ref().display().to_string();
    open_examples(&path, dim)?
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to read examples from {}", display))
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}
