//! Report output.
//!
//! The solve workflow emits its report one line at a time through a [`LineSink`].
//! Lines arrive in call order and a sink must deliver each of them; where they end
//! up (stdout, a file, memory) is up to the sink.
//!
//! [`render_table`] is an alternative presentation of a finished run for humans.

use std::io::{self, Write};

use prettytable::*;

use crate::diet::{RunSummary, SolveOutcome};

/// Destination for report lines
pub trait LineSink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

/// Collects lines in memory
impl LineSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line followed by a newline to a [`Write`] implementation
pub struct WriteSink<W: Write> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }
}

/// Render every solve of a run as a table
pub fn render_table<W: Write + ?Sized>(summary: &RunSummary, out: &mut W) -> io::Result<()> {
    writeln!(out, "Solver backend: {}", summary.backend)?;

    for (i, outcome) in summary.outcomes.iter().enumerate() {
        writeln!(out, "\nSolve {}: {}", i + 1, outcome.label)?;

        let Some(cost) = outcome.cost else {
            writeln!(out, "No solution ({:?})", outcome.status)?;
            continue;
        };
        writeln!(out, "Cost: {:.4}", cost)?;

        solve_table(outcome).print(out)?;
    }

    Ok(())
}

fn solve_table(outcome: &SolveOutcome) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["Group", "Name", "Amount"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let groups = [("Buy", &outcome.buy), ("Nutrition", &outcome.nutrition)];
    for (group, values) in groups {
        for (name, value) in values.iter() {
            table.add_row(row![group, name, format!("{:.4}", value)]);
        }
    }

    table
}
