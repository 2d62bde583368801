// stemtab-compile: Compile word/stem dictionaries into stemming tables.
//
// Each input file holds one entry per line: a stem followed by the
// words that reduce to it, whitespace-separated. The flag token picks
// the table shape and the reduction passes:
//   -    walk keys tail-to-head (suffix stemming)
//   0    also store each stem with an identity command
//   M    layered table (one trie per command segment)
// followed by pass letters applied in order:
//   1    merge structurally compatible rows
//   L    lift uniform commands, keeping skip accounting
//   E    lift uniform commands, clearing skips
//
// Each FILE produces FILE.out; a failing file is reported and the rest
// are still compiled.
//
// Usage:
//   stemtab-compile FLAGS FILE...

use std::process;

use stemtab_cli::CompileFlags;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if stemtab_cli::wants_help(&args) || args.len() < 2 {
        println!("stemtab-compile: Compile word/stem dictionaries into stemming tables.");
        println!();
        println!("Usage: stemtab-compile FLAGS FILE...");
        println!();
        println!("Each FILE line is `stem word word ...`; FILE.out gets the");
        println!("flag string and the serialized table.");
        println!();
        println!("FLAGS is, in order:");
        println!("  -    walk keys tail-to-head (suffix stemming)");
        println!("  0    also store each stem with an identity command");
        println!("  M    layered table");
        println!("then pass letters, applied in order:");
        println!("  1    merge structurally compatible rows");
        println!("  L    lift uniform commands, keeping skip accounting");
        println!("  E    lift uniform commands, clearing skips");
        if args.len() < 2 && !stemtab_cli::wants_help(&args) {
            process::exit(1);
        }
        return;
    }

    let flags = CompileFlags::parse(&args[0]);
    let mut failed = false;

    for path in &args[1..] {
        match stemtab_cli::compile_file(&flags, path) {
            Ok(report) => {
                eprintln!(
                    "{path}: {} lines, {} entries inserted, {} rejected",
                    report.lines, report.inserted, report.rejected
                );
            }
            Err(e) => {
                eprintln!("error: {e}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
