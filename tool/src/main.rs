// Licensed under the Apache-2.0 license

use clap::Parser;
use ramdisk_table_tool::run_batch;
use std::path::PathBuf;

/// Edit the vendor ramdisk table of an unpacked boot image
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the vendor ramdisk table file
    table: PathBuf,

    /// Edit commands applied in order, e.g. "add --type dlkm --name vendor_dlkm"
    commands: Vec<String>,

    /// Directory the ramdisk payload blobs are resolved under
    #[arg(long, value_name = "DIR", default_value = "vendor_ramdisk")]
    ramdisk_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let result = run_batch(&cli.table, &cli.ramdisk_dir, &cli.commands);
    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
}
