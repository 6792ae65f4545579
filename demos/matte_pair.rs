//! Matte one white/black render pair into a transparent PNG.
//!
//! Usage:
//! ```sh
//! cargo run --example matte_pair -- logo_white.png logo_black.png logo.png
//! ```

use std::env;
use std::process;

use difference_matting::MatteEngine;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <white> <black> <output.png>", args[0]);
        process::exit(1);
    }

    let engine = MatteEngine::default();
    let result = engine.process_pair(args[1].as_ref(), args[2].as_ref(), args[3].as_ref());

    if result.success {
        println!(
            "Done: {} ({:.0}% transparent)",
            result.message,
            result.transparent_fraction * 100.0
        );
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
