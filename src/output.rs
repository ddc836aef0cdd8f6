use std::io::{self, Write};

use serde::Serialize;

use crate::app::{LookupOutcome, LookupResult, UpdateResult};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_update(result: &UpdateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_lookup(result: &LookupResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn print_update_text(result: &UpdateResult) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "updated {} sources, {} records",
        result.sources, result.records
    )
}

pub fn print_lookup_text(result: &LookupResult) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for item in &result.items {
        match &item.outcome {
            LookupOutcome::Matches { records } => {
                for record in records {
                    writeln!(
                        stdout,
                        "{}\t{}\t{}\t{}",
                        item.input, record.registry, record.assignment, record.org_name
                    )?;
                }
            }
            LookupOutcome::NoMatch => {
                writeln!(stdout, "{}\tno match", item.input)?;
            }
            LookupOutcome::Invalid { error } => {
                writeln!(stdout, "{}\tat position {}: {}", item.input, item.position, error)?;
            }
        }
    }
    Ok(())
}
