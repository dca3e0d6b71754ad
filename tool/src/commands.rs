// Licensed under the Apache-2.0 license

use crate::table::{BoardIdSpec, RamdiskTable};
use anyhow::{anyhow, bail, Result};
use ramdisk_table::{RamdiskType, VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE};
use std::path::Path;

/// One fully-validated batch command. Parsing never touches the table and
/// execution never re-parses, so a rejected command leaves no partial edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RmName(String),
    RmEntry(usize),
    Add {
        name: String,
        ramdisk_type: RamdiskType,
        board_id: BoardIdSpec,
    },
    Print,
}

struct OptSpec {
    name: &'static str,
    arity: usize,
}

const RM_OPTS: &[OptSpec] = &[
    OptSpec {
        name: "--name",
        arity: 1,
    },
    OptSpec {
        name: "--entry",
        arity: 1,
    },
];

const ADD_OPTS: &[OptSpec] = &[
    OptSpec {
        name: "--type",
        arity: 1,
    },
    OptSpec {
        name: "--name",
        arity: 1,
    },
    OptSpec {
        name: "--copy-id",
        arity: 1,
    },
    OptSpec {
        name: "--id",
        arity: 2,
    },
];

/// Splits one batch string into tokens. A leading `#` token turns the whole
/// string into a comment.
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first().is_some_and(|t| t.starts_with('#')) {
        tokens.clear();
    }
    tokens
}

/// Walks `tokens` against a command's option table, yielding `(option,
/// values)` pairs in order of appearance. A trailing arity-1 option may omit
/// its value, which then defaults to the empty string (`rm --name` addresses
/// an entry whose stored name buffer is all NULs).
fn collect_options<'a>(
    tokens: &[&'a str],
    specs: &[OptSpec],
) -> Result<Vec<(&'static str, Vec<&'a str>)>> {
    let mut out = Vec::new();
    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        let spec = specs
            .iter()
            .find(|s| s.name == token)
            .ok_or_else(|| anyhow!("Unknown token '{}'", token))?;
        let mut values = Vec::with_capacity(spec.arity);
        for _ in 0..spec.arity {
            match iter.next() {
                Some(&value) => values.push(value),
                None if spec.arity == 1 => values.push(""),
                None => bail!("Option '{}' expects {} values", spec.name, spec.arity),
            }
        }
        out.push((spec.name, values));
    }
    Ok(out)
}

fn parse_index(value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|_| anyhow!("'{}' is not a valid index", value))
}

fn parse_hex32(value: &str) -> Result<u32> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).map_err(|_| anyhow!("'{}' is not a 32-bit hex word", value))
}

/// Parses one batch string into a validated command. Comments and blank
/// strings parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let tokens = tokenize(line);
    let Some((&command, opts)) = tokens.split_first() else {
        return Ok(None);
    };
    match command {
        "print" => {
            if !opts.is_empty() {
                bail!("'print' takes no options");
            }
            Ok(Some(Command::Print))
        }
        "rm" => parse_rm(opts).map(Some),
        "add" => parse_add(opts).map(Some),
        _ => bail!("Unknown command '{}'", command),
    }
}

fn parse_rm(tokens: &[&str]) -> Result<Command> {
    let mut target = None;
    for (opt, values) in collect_options(tokens, RM_OPTS)? {
        let parsed = match opt {
            "--name" => Command::RmName(values[0].to_string()),
            "--entry" => Command::RmEntry(parse_index(values[0])?),
            _ => unreachable!(),
        };
        if target.replace(parsed).is_some() {
            bail!("'rm' takes exactly one of '--name' or '--entry'");
        }
    }
    target.ok_or_else(|| anyhow!("'rm' requires '--name' or '--entry'"))
}

fn parse_add(tokens: &[&str]) -> Result<Command> {
    let mut name = None;
    let mut ramdisk_type = None;
    let mut board_id = BoardIdSpec::default();
    for (opt, values) in collect_options(tokens, ADD_OPTS)? {
        match opt {
            "--type" => {
                let parsed = values[0].parse::<RamdiskType>().map_err(|_| {
                    anyhow!(
                        "Unknown ramdisk type '{}'. Available options are 'none', 'dlkm', 'platform', 'recovery'.",
                        values[0]
                    )
                })?;
                if ramdisk_type.replace(parsed).is_some() {
                    bail!("Duplicate '--type' option");
                }
            }
            "--name" => {
                if name.replace(values[0].to_string()).is_some() {
                    bail!("Duplicate '--name' option");
                }
            }
            "--copy-id" => {
                let index = parse_index(values[0])?;
                if board_id.copy_from.replace(index).is_some() {
                    bail!("Duplicate '--copy-id' option");
                }
            }
            "--id" => {
                let slot = parse_index(values[0])?;
                if slot >= VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE {
                    bail!(
                        "Board id slot {} is out of range (0..{}).",
                        slot,
                        VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE
                    );
                }
                board_id.words.push((slot, parse_hex32(values[1])?));
            }
            _ => unreachable!(),
        }
    }
    let name = name.ok_or_else(|| anyhow!("'add' requires '--name'"))?;
    let ramdisk_type = ramdisk_type.ok_or_else(|| anyhow!("'add' requires '--type'"))?;
    Ok(Command::Add {
        name,
        ramdisk_type,
        board_id,
    })
}

/// Applies a batch of edit commands to the table file. The table is loaded
/// once up front (an unreadable table aborts before any command runs); each
/// accepted mutation is flushed back to disk before the next command is
/// looked at, and `print` stops the batch.
pub fn run_batch(table_path: &Path, ramdisk_dir: &Path, batch: &[String]) -> Result<()> {
    let mut table = RamdiskTable::load(table_path)?;
    for line in batch {
        let Some(command) = parse(line)? else {
            continue;
        };
        match command {
            Command::RmName(name) => {
                table.rm(&name)?;
                table.dump(table_path)?;
            }
            Command::RmEntry(index) => {
                table.rm_at(index)?;
                table.dump(table_path)?;
            }
            Command::Add {
                name,
                ramdisk_type,
                board_id,
            } => {
                table.add(&name, ramdisk_type, &board_id, ramdisk_dir)?;
                table.dump(table_path)?;
            }
            Command::Print => {
                table.print(&mut std::io::stderr())?;
                break;
            }
        }
    }
    Ok(())
}
