// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Chip-Firing Laplacian Solver - Problem Files

//! Plain-text problem and solution files.
//!
//! Problem file:
//!
//! ```text
//! n
//! a[0][0] a[0][1] ... a[0][n-1]
//! ...
//! a[n-1][0] ...        a[n-1][n-1]
//! b[0] b[1] ... b[n-1]
//! ```
//!
//! The matrix is the dense weighted adjacency matrix; the last vertex is the
//! sink. A solution file holds `x` on one whitespace-separated line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SolverError};
use crate::graph::WeightedGraph;

/// A graph plus its right-hand side, as read from a problem file.
#[derive(Debug, Clone)]
pub struct Problem {
    pub adjacency: Vec<Vec<f64>>,
    pub b: Vec<f64>,
}

impl Problem {
    pub fn vertex_count(&self) -> usize {
        self.b.len()
    }

    pub fn graph(&self) -> WeightedGraph {
        WeightedGraph::from_dense(&self.adjacency)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        read_problem(BufReader::new(File::open(path)?))
    }
}

/// Parse a problem from any buffered reader. Blank lines are skipped.
pub fn read_problem<R: BufRead>(reader: R) -> Result<Problem> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, l)| l.map(|s| (i + 1, s)))
        .filter(|r| !matches!(r, Ok((_, s)) if s.trim().is_empty()));

    let mut next = |what: &str| -> Result<(usize, String)> {
        match lines.next() {
            Some(r) => Ok(r?),
            None => Err(SolverError::Parse {
                line: 0,
                detail: format!("unexpected end of file, expected {}", what),
            }),
        }
    };

    let (line, header) = next("vertex count")?;
    let n: usize = header.trim().parse().map_err(|_| SolverError::Parse {
        line,
        detail: format!("invalid vertex count {:?}", header.trim()),
    })?;

    // The header is untrusted: rows are only allocated as they are read.
    let mut adjacency = Vec::new();
    for _ in 0..n {
        let (line, text) = next("adjacency row")?;
        adjacency.push(parse_row(line, &text, n)?);
    }
    let (line, text) = next("right-hand side")?;
    let b = parse_row(line, &text, n)?;

    Ok(Problem { adjacency, b })
}

fn parse_row(line: usize, text: &str, n: usize) -> Result<Vec<f64>> {
    let row = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| SolverError::Parse {
                line,
                detail: format!("invalid number {:?}", tok),
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if row.len() != n {
        return Err(SolverError::Parse {
            line,
            detail: format!("expected {} values, found {}", n, row.len()),
        });
    }
    Ok(row)
}

/// Write `x` as a single line.
pub fn write_solution<W: Write>(mut writer: W, x: &[f64]) -> Result<()> {
    let line = x.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    Ok(())
}

pub fn write_solution_to(path: impl AsRef<Path>, x: &[f64]) -> Result<()> {
    write_solution(BufWriter::new(File::create(path)?), x)
}

/// Parse a solution line written by [`write_solution`].
pub fn read_solution<R: BufRead>(reader: R) -> Result<Vec<f64>> {
    let first = reader.lines().next().transpose()?.unwrap_or_default();
    first
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|_| SolverError::Parse {
                line: 1,
                detail: format!("invalid number {:?}", tok),
            })
        })
        .collect()
}
