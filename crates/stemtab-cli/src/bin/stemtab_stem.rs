// stemtab-stem: Stem words against a compiled table.
//
// Loads a .out table produced by stemtab-compile and stems the words
// given on the command line, or read from stdin one per line. Prints
// `word TAB stem`, with `-` when the table yields no stem.
//
// Usage:
//   stemtab-stem TABLE [WORD...]

use std::io::{self, BufRead, Write};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if stemtab_cli::wants_help(&args) || args.is_empty() {
        println!("stemtab-stem: Stem words against a compiled table.");
        println!();
        println!("Usage: stemtab-stem TABLE [WORD...]");
        println!();
        println!("Stems WORDs, or stdin lines when none are given. Prints");
        println!("`word TAB stem`, with `-` when no stem is found.");
        if args.is_empty() && !stemtab_cli::wants_help(&args) {
            std::process::exit(1);
        }
        return;
    }

    let (_, lexicon) =
        stemtab_cli::load_table(&args[0]).unwrap_or_else(|e| stemtab_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if args.len() > 1 {
        for word in &args[1..] {
            let stem = stemtab_cli::stem_word(&lexicon, word);
            let _ = writeln!(out, "{word}\t{}", stem.as_deref().unwrap_or("-"));
        }
        return;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        let stem = stemtab_cli::stem_word(&lexicon, word);
        let _ = writeln!(out, "{word}\t{}", stem.as_deref().unwrap_or("-"));
    }
}
