//! Append-only tabular log writer.
//!
//! Backs the per-participant iteration and convergence logs. The header
//! is written on construction; each row is flushed immediately so the
//! files stay readable while the simulation runs.

use std::io::{self, Write};

/// Value type of a table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Int,
    Double,
}

/// One cell of a table row.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Cell {
    Int(i64),
    Double(f64),
}

/// Writes whitespace-separated rows to any `Write` sink.
///
/// Generic sinks keep tests on in-memory buffers while production code
/// writes files.
pub(crate) struct TableWriter {
    sink: Box<dyn Write + Send>,
    columns: Vec<(String, ColumnKind)>,
}

impl TableWriter {
    /// Create a writer and emit the header row.
    pub(crate) fn new(
        mut sink: Box<dyn Write + Send>,
        columns: Vec<(String, ColumnKind)>,
    ) -> io::Result<Self> {
        debug_assert!(!columns.is_empty());
        for (i, (name, _)) in columns.iter().enumerate() {
            if i > 0 {
                write!(sink, "  ")?;
            }
            write!(sink, "{name}")?;
        }
        writeln!(sink)?;
        sink.flush()?;
        Ok(Self { sink, columns })
    }

    /// Append one row. Cell count and kinds must match the header.
    pub(crate) fn write_row(&mut self, cells: &[Cell]) -> io::Result<()> {
        debug_assert_eq!(cells.len(), self.columns.len(), "row width mismatch");
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                write!(self.sink, "  ")?;
            }
            match (cell, self.columns[i].1) {
                (Cell::Int(v), ColumnKind::Int) => write!(self.sink, "{v}")?,
                (Cell::Double(v), ColumnKind::Double) => write!(self.sink, "{v:.8e}")?,
                (cell, kind) => {
                    debug_assert!(false, "cell {cell:?} does not match column kind {kind:?}");
                    match cell {
                        Cell::Int(v) => write!(self.sink, "{v}")?,
                        Cell::Double(v) => write!(self.sink, "{v:.8e}")?,
                    }
                }
            }
        }
        writeln!(self.sink)?;
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_test_utils::SharedSink;

    fn columns() -> Vec<(String, ColumnKind)> {
        vec![
            ("TimeWindow".into(), ColumnKind::Int),
            ("Residual".into(), ColumnKind::Double),
        ]
    }

    #[test]
    fn header_is_written_on_construction() {
        let sink = SharedSink::new();
        TableWriter::new(Box::new(sink.clone()), columns()).unwrap();
        assert_eq!(sink.contents(), "TimeWindow  Residual\n");
    }

    #[test]
    fn rows_follow_the_header() {
        let sink = SharedSink::new();
        let mut writer = TableWriter::new(Box::new(sink.clone()), columns()).unwrap();
        writer.write_row(&[Cell::Int(1), Cell::Double(0.5)]).unwrap();
        writer.write_row(&[Cell::Int(2), Cell::Double(0.25)]).unwrap();
        let contents = sink.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1  5.00000000e-1");
    }
}
