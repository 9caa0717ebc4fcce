//! Binix Fetch
//!
//! Fetches one URL and prints it: rendered text by default, the full
//! response (status line, headers, raw body) with `--raw`.

use binix_fetch::{renderer, FetchEngine, NAME, VERSION};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let raw = args.iter().any(|a| a == "--raw");
    let Some(url) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("{} v{}", NAME, VERSION);
        eprintln!("usage: {} [--raw] <url>", NAME);
        std::process::exit(2);
    };

    let engine = FetchEngine::new();
    match engine.fetch(url) {
        Ok(response) if raw => println!("{}", response),
        Ok(response) => println!("{}", renderer::show(&response)),
        Err(e) => {
            eprintln!("❌ Failed to fetch {}: {}", url, e);
            std::process::exit(1);
        }
    }
}
