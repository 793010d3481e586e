//! Frugurt CLI
//!
//! Parse, check, and incrementally reparse Frugurt sources.

use std::error::Error;
use std::io::Write;

use fruc::commands::{
    check_files, check_table, dump_table, edit_file, parse_files, CommandError, EditRequest,
};

fn main() {
    fruc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let mut stdout = std::io::stdout().lock();

    let result = match command.as_str() {
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: fruc parse <file>...");
                std::process::exit(1);
            }
            parse_files(&args[2..], &mut stdout)
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: fruc check <file>...");
                std::process::exit(1);
            }
            // Diagnostics go to stderr, like a compiler's.
            let mut stderr = std::io::stderr().lock();
            match check_files(&args[2..], &mut stderr) {
                Ok(true) => {
                    let _ = stderr.flush();
                    std::process::exit(1);
                }
                Ok(false) => Ok(()),
                Err(err) => Err(err),
            }
        }
        "table" => match (args.get(2).map(String::as_str), args.get(3)) {
            (Some("dump"), Some(path)) => dump_table(path, &mut stdout),
            (Some("check"), Some(path)) => check_table(path, &mut stdout),
            _ => {
                eprintln!("Usage: fruc table <subcommand> <file>");
                eprintln!();
                eprintln!("Subcommands:");
                eprintln!("  dump <out>     Write the serialized Frugurt table");
                eprintln!("  check <file>   Load and validate a serialized table");
                std::process::exit(1);
            }
        },
        "edit" => {
            if args.len() < 6 {
                eprintln!("Usage: fruc edit <file> <start> <old_end> <text>");
                std::process::exit(1);
            }
            EditRequest::parse(&args[3], &args[4], &args[5])
                .and_then(|request| edit_file(&args[2], &request, &mut stdout))
                .map(|_| ())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("fruc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(err) = result {
        let _ = stdout.flush();
        report(&err);
        std::process::exit(2);
    }
}

fn report(err: &CommandError) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn print_usage() {
    println!("Frugurt parser CLI");
    println!();
    println!("Usage: fruc <command> [options]");
    println!();
    println!("Commands:");
    println!("  parse <file>...                      Print each file's tree as an S-expression");
    println!("  check <file>...                      Report syntax errors (exit 1 if any)");
    println!("  table dump <out>                     Write the serialized grammar table");
    println!("  table check <file>                   Load and validate a serialized table");
    println!("  edit <file> <start> <old_end> <text> Reparse after one edit, print reuse stats");
    println!("  help                                 Show this help message");
    println!("  version                              Show version information");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=fru_parse=debug) to trace the parser.");
    println!();
    println!("Examples:");
    println!("  fruc parse main.fru");
    println!("  fruc check src/*.fru");
    println!("  fruc table dump frugurt.table");
    println!("  fruc edit main.fru 10 11 \"42\"");
}
