//! # Contentkit CLI
//!
//! The binary is thin: the CLI lives in `cli/`, while this file only invokes
//! `cli::run()` and handles process termination.
//!
//! ```text
//! contentkit [--config FILE] [-v] <command>
//!
//!   get <key>                     Show an item's content parts
//!   list                          List every item key
//!   render <key> <field> [--var k=v ...] [--data JSON]
//!   set <key> <field> <value>     Save an override for one part
//!   reset <key>                   Drop the override, back to source content
//!   meta <key>                    Show the item's meta-data
//! ```
//!
//! Configuration comes from `--config`, else `./contentkit.toml`, else
//! `contentkit.toml` in the OS config directory. Logging goes to stderr and
//! is filtered by `CONTENTKIT_LOG` (`-v` switches to debug).

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
