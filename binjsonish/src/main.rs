//! Command-line tool for validating and canonicalizing JSON-like manifests.
//!
//! Usage: jsonish [OPTIONS] [FILE]
//!
//! Options:
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   --permissive           Tolerate structural errors, keeping the parsable prefix
//!   -w, --write            Rewrite the input file in canonical form (prunes empty values)
//!   -o, --output <FILE>    Write canonical output to the specified file (prunes empty values)
//!   --force                Allow -w/-o to proceed even when a permissive parse recorded errors
//!   -h, --help             Print help
//!   -V, --version          Print version

use libjsonish::{
    parse_permissive_with_filename, parse_with_filename, prune, to_canonical_string, Mapping,
};
use std::fs;
use std::io::{self, Read, Write};
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut check_only = false;
    let mut permissive = false;
    let mut write_back = false;
    let mut force = false;
    let mut output_file: Option<&str> = None;
    let mut input_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-V" | "--version" => {
                println!("jsonish {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--check" => {
                check_only = true;
            }
            "--permissive" => {
                permissive = true;
            }
            "-w" | "--write" => {
                write_back = true;
            }
            "--force" => {
                force = true;
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires an argument");
                    process::exit(1);
                }
                output_file = Some(&args[i]);
            }
            "-" => {
                // Explicit stdin
                // input_path stays None, which means stdin
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                process::exit(1);
            }
            _ => {
                if input_path.is_some() {
                    eprintln!("Error: Multiple input paths not supported");
                    process::exit(1);
                }
                input_path = Some(&args[i]);
            }
        }
        i += 1;
    }

    if write_back && output_file.is_some() {
        eprintln!("Error: --write and --output are mutually exclusive");
        process::exit(1);
    }
    if write_back && input_path.is_none() {
        eprintln!("Error: --write requires an input file");
        process::exit(1);
    }

    let input = match input_path {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {}", path, e);
                process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    let filename = input_path;

    // Parse in the selected mode. A permissive parse never raises; its
    // recorded error is surfaced as a warning and gates -w/-o below.
    let (document, had_errors) = if permissive {
        let parsed = parse_permissive_with_filename(&input, filename);
        if let Some(e) = &parsed.error {
            eprintln!("Warning: {}", e);
        }
        let had_errors = parsed.has_errors();
        (parsed.document, had_errors)
    } else {
        match parse_with_filename(&input, filename) {
            Ok(document) => (document, false),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    };

    if check_only {
        if had_errors {
            process::exit(1);
        }
        println!("ok");
        return;
    }

    if write_back || output_file.is_some() {
        // Refuse to persist a document the parser could not fully
        // understand unless the user insists.
        if had_errors && !force {
            eprintln!("Error: input had structural errors; refusing to write (use --force to override)");
            process::exit(1);
        }
        let mut document = document;
        prune(&mut document);
        let text = to_canonical_string(&document);
        let target = match output_file.or(filename) {
            Some(path) => path,
            None => {
                eprintln!("Error: --write requires an input file");
                process::exit(1);
            }
        };
        if let Err(e) = fs::write(target, text) {
            eprintln!("Error writing {}: {}", target, e);
            process::exit(1);
        }
        return;
    }

    print_canonical(&document);
}

fn print_canonical(document: &Mapping) {
    let text = to_canonical_string(document);
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = handle.write_all(text.as_bytes()) {
        eprintln!("Error writing to stdout: {}", e);
        process::exit(1);
    }
}

fn print_help() {
    println!(
        "jsonish - manifest validation and canonicalization tool

USAGE:
    jsonish [OPTIONS] [FILE]

ARGS:
    [FILE]    Input manifest (reads from stdin if not provided; '-' also
              selects stdin)

OPTIONS:
    --check                Check if input is valid (exit 0 if valid, 1 if invalid)

    --permissive           Tolerate structural errors: the first error is
                           reported as a warning and the parsable prefix of the
                           document is used

    -w, --write            Rewrite the input file in canonical form: sorted
                           keys, 4-space indentation, empty and null values
                           pruned

    -o, --output <FILE>    Write canonical, pruned output to the specified file

    --force                Allow -w/-o to write even when a permissive parse
                           recorded errors

    -h, --help             Print help

    -V, --version          Print version

EXAMPLES:
    # Print the canonical form of a manifest
    jsonish package.json

    # Validate strictly, for use in scripts
    jsonish --check package.json

    # Salvage a manifest with a syntax error, keeping what parses
    jsonish --permissive package.json

    # Rewrite a manifest in place in canonical form
    jsonish -w package.json"
    );
}
