//! CLI tool for gridfeed - transforms a feed document into grid rows
//!
//! Usage:
//!   gridfeed_cli <stocks.json>              # Output rows as JSON to stdout
//!   gridfeed_cli <stocks.json> -o out.json  # Output rows as JSON to file

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use gridfeed::{
    BufferSink, CancelToken, ColumnSchema, Generator, JsonRecordSource, TimesliceYield,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: gridfeed_cli <stocks.json> [-o output.json]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    // Load the feed document
    let source = match JsonRecordSource::from_path(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    // Run the pipeline
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = BufferSink::new();
    let summary = match generator
        .run(
            &source,
            &TimesliceYield::default(),
            &mut sink,
            &CancelToken::new(),
            || {},
        )
        .await
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error generating rows: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "{} rows, {} cells, {} partial publishes",
        summary.rows, summary.cells, summary.partial_publishes
    );

    // Serialize to JSON
    let json = match serde_json::to_string_pretty(sink.rows()) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = handle.write_all(json.as_bytes()) {
                eprintln!("Error writing to stdout: {}", e);
                std::process::exit(1);
            }
        }
    }
}
