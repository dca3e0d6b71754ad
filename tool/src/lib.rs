// Licensed under the Apache-2.0 license

pub mod commands;
pub mod table;

pub use commands::{parse, run_batch, Command};
pub use table::{payload_path, BoardIdSpec, RamdiskTable};
