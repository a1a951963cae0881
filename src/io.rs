/*!
# IO

Persistence for computed matchings.

A matching is written as a small edge-list document: a header line with
the number of matched edges and the total weight, followed by one line
per edge. Reading it back restores the same edge set and weight, so a
solve can be archived and compared across runs.

```
use wmatching::blossom::PerfectMatching;
use wmatching::io::{MatchingRead, MatchingWrite};
# use wmatching::edge::Edge;

# let matching = PerfectMatching { edges: vec![Edge(0, 1)], weight: 2.5, stats: Default::default() };
let mut buffer = Vec::new();
matching.try_write_matching(&mut buffer).unwrap();

let restored = PerfectMatching::try_read_matching(buffer.as_slice()).unwrap();
assert_eq!(restored.edges, matching.edges);
assert_eq!(restored.weight, matching.weight);
```
*/

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, ErrorKind, Result, Write},
    path::Path,
};

use crate::blossom::{MatchingStats, PerfectMatching};
use crate::edge::Edge;

/// Shorthand for creating a new IO-error
macro_rules! io_error {
    ($kind: expr, $info: expr) => {
        std::io::Error::new($kind, $info)
    };
}

/// Shorthand for returning `Err(std::io::Error)` early when a condition fails
macro_rules! raise_error_unless {
    ($cond : expr, $kind : expr, $info : expr) => {
        if !($cond) {
            return Err(io_error!($kind, $info));
        }
    };
}

/// Tries to parse the next value in an iterator and returns early if it fails
macro_rules! parse_next_value {
    ($iterator : expr, $name : expr) => {{
        let next = $iterator.next();
        raise_error_unless!(
            next.is_some(),
            ErrorKind::InvalidData,
            format!("Premature end of line when parsing {}.", $name)
        );

        let parsed = next.unwrap().parse();
        raise_error_unless!(
            parsed.is_ok(),
            ErrorKind::InvalidData,
            format!("Invalid value found. Cannot parse {}.", $name)
        );

        parsed.unwrap()
    }};
}

/// Writing matchings to writers and files.
pub trait MatchingWrite {
    /// Writes the matching to the given writer.
    ///
    /// # Errors
    /// Returns an error if writing fails (e.g., IO errors).
    fn try_write_matching<W>(&self, writer: W) -> Result<()>
    where
        W: Write;

    /// Writes the matching to a file.
    ///
    /// Internally wraps the file in a buffered writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or if writing fails.
    fn try_write_matching_file<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        self.try_write_matching(BufWriter::new(File::create(path)?))
    }
}

/// Reading matchings from readers and files.
pub trait MatchingRead: Sized {
    /// Reads a matching from the given reader.
    ///
    /// # Errors
    /// Returns an error if the input is not a valid matching document.
    fn try_read_matching<R>(reader: R) -> Result<Self>
    where
        R: BufRead;

    /// Reads a matching from a file.
    ///
    /// Internally wraps the file in a buffered reader.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its contents are
    /// not a valid matching document.
    fn try_read_matching_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::try_read_matching(BufReader::new(File::open(path)?))
    }
}

impl MatchingWrite for PerfectMatching {
    fn try_write_matching<W>(&self, mut writer: W) -> Result<()>
    where
        W: Write,
    {
        writeln!(writer, "{} {}", self.edges.len(), self.weight)?;
        for &Edge(u, v) in &self.edges {
            writeln!(writer, "{u} {v}")?;
        }
        Ok(())
    }
}

impl MatchingRead for PerfectMatching {
    fn try_read_matching<R>(reader: R) -> Result<Self>
    where
        R: BufRead,
    {
        let mut lines = reader.lines();

        let header = lines.next();
        raise_error_unless!(
            header.is_some(),
            ErrorKind::InvalidData,
            "Empty matching document."
        );
        let header = header.unwrap()?;
        let mut parts = header.split_whitespace();
        let num_edges: usize = parse_next_value!(parts, "number of edges");
        let weight: f64 = parse_next_value!(parts, "matching weight");

        let mut edges = Vec::with_capacity(num_edges);
        for line in lines.take(num_edges) {
            let line = line?;
            let mut parts = line.split_whitespace();
            let u = parse_next_value!(parts, "edge source");
            let v = parse_next_value!(parts, "edge target");
            edges.push(Edge(u, v));
        }

        raise_error_unless!(
            edges.len() == num_edges,
            ErrorKind::InvalidData,
            format!("Expected {num_edges} edges, found {}.", edges.len())
        );

        Ok(PerfectMatching {
            edges,
            weight,
            stats: MatchingStats::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_edges_and_weight() {
        let matching = PerfectMatching {
            edges: vec![Edge(1, 4), Edge(2, 3)],
            weight: 10.0,
            stats: MatchingStats::default(),
        };

        let mut buffer = Vec::new();
        matching.try_write_matching(&mut buffer).unwrap();
        let restored = PerfectMatching::try_read_matching(buffer.as_slice()).unwrap();

        assert_eq!(restored.edges, matching.edges);
        assert_eq!(restored.weight, matching.weight);
    }

    #[test]
    fn truncated_document_is_rejected() {
        let document = b"2 5.0\n0 1\n";
        assert!(PerfectMatching::try_read_matching(&document[..]).is_err());
    }

    #[test]
    fn garbage_header_is_rejected() {
        let document = b"two 5.0\n";
        assert!(PerfectMatching::try_read_matching(&document[..]).is_err());
    }
}
