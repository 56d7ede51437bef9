use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::sync::Arc;

use domain::adapters::static_probe::StaticProbe;
use domain::banned::BannedTermSet;
use domain::params::ParameterRegistry;
use domain::{CheckRequest, PromptCheckResult, PromptChecker, Rules};

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  domain check <prompt> [--allow-empty] [--skip-banned] [--banned <a,b,...>]\n  domain repl [--allow-empty] [--skip-banned] [--banned <a,b,...>]\n\nNotes:\n  - Uses the standard parameter registry; image reachability is never probed.\n  - In the repl, enter `quit` to exit.",
        domain::about()
    );
}

struct Options {
    allow_empty: bool,
    check_banned_words: bool,
    banned: Vec<String>,
}

fn parse_options(rest: &[String]) -> Result<(Options, Vec<String>), String> {
    let mut opts = Options {
        allow_empty: false,
        check_banned_words: true,
        banned: Vec::new(),
    };
    let mut positional = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--allow-empty" => opts.allow_empty = true,
            "--skip-banned" => opts.check_banned_words = false,
            "--banned" => {
                if i + 1 >= rest.len() {
                    return Err("--banned requires a comma separated list".into());
                }
                opts.banned
                    .extend(rest[i + 1].split(',').map(|s| s.trim().to_string()));
                i += 1;
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }
    Ok((opts, positional))
}

fn report(result: &PromptCheckResult) {
    if result.is_ok() {
        println!("prompt: {}\naspect ratio: {}", result.prompt, result.aspect_ratio);
    } else {
        println!("{}", result.error_message);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1); // skip program name

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();
    let (opts, positional) = parse_options(&rest)?;

    let rules = Rules::new(
        ParameterRegistry::standard(),
        BannedTermSet::new(&opts.banned),
    );
    let checker = PromptChecker::new(Arc::new(rules), StaticProbe::default());
    let request = |prompt: &str| {
        CheckRequest::new(prompt)
            .allow_empty(opts.allow_empty)
            .check_banned_words(opts.check_banned_words)
    };

    match cmd.as_str() {
        "check" => {
            if positional.is_empty() {
                return Err("missing <prompt> for check".into());
            }
            let result = checker.check(&request(&positional.join(" ")));
            report(&result);
            if result.is_ok() {
                Ok(())
            } else {
                Err("prompt rejected".into())
            }
        }
        "repl" => {
            println!("prompt checker started. input `quit` to exit");
            let stdin = io::stdin();
            let mut lines = stdin.lock().lines();
            loop {
                print!("> please input prompt: ");
                io::stdout().flush().map_err(|e| e.to_string())?;
                let Some(line) = lines.next() else {
                    return Ok(());
                };
                let line = line.map_err(|e| format!("read failed: {}", e))?;
                if line.trim() == "quit" {
                    return Ok(());
                }
                report(&checker.check(&request(&line)));
            }
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
