//! Parse command - decode raw records into JSON lines
//!
//! Each input line is one raw record. Lines are read as bytes, so invalid
//! UTF-8 is replaced rather than rejected, the same as records from the bus.
//! Well-formed records are written to stdout as JSON; malformed ones are
//! counted and optionally reported on stderr with their line number.
//!
//! # Usage
//!
//! ```bash
//! logship parse records.log
//! logship parse records.log --show-malformed
//! cat records.log | logship parse > parsed.jsonl
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use logship_protocol::parse;

/// Parse command arguments
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Input file (reads stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Report malformed lines on stderr
    #[arg(long)]
    show_malformed: bool,
}

/// Counts for one parse run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub parsed: u64,
    pub malformed: u64,
}

/// Run the parse command
pub async fn run(args: ParseArgs) -> Result<()> {
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let mut out = BufWriter::new(io::stdout().lock());
    let mut errors = args.show_malformed.then(io::stderr);

    let summary = parse_lines(
        reader,
        &mut out,
        errors.as_mut().map(|e| e as &mut dyn Write),
    )?;
    out.flush()?;

    eprintln!("{} parsed, {} malformed", summary.parsed, summary.malformed);
    Ok(())
}

/// Parse every non-blank line of `reader`
///
/// Writes one JSON object per parsed record to `out`. Malformed lines go to
/// `errors` when given.
pub fn parse_lines(
    reader: impl BufRead,
    out: &mut impl Write,
    mut errors: Option<&mut dyn Write>,
) -> Result<ParseSummary> {
    let mut summary = ParseSummary::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.context("failed to read input")?;
        let line = trim_line_end(&line);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match parse(line) {
            Ok(record) => {
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
                summary.parsed += 1;
            }
            Err(e) => {
                summary.malformed += 1;
                if let Some(errors) = errors.as_mut() {
                    writeln!(errors, "line {}: {}", index + 1, e)?;
                }
            }
        }
    }

    Ok(summary)
}

/// Drop the `\r` of a CRLF line ending
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;
