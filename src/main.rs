mod debug_report;

use soundlaw::{ChainPair, DirSource, apply_chain, apply_word};
use std::io::{self, IsTerminal, Read};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let result = match &config.mode {
        Mode::Rules(path) => {
            let lines = match load_rule_lines(path) {
                Ok(lines) => lines,
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            };
            apply_word(&config.word, &lines)
        }
        Mode::Chain(pairs) => {
            let source = DirSource::new(&config.files);
            apply_chain(&config.word, pairs, config.debug, &source)
        }
    };

    match result {
        Ok(applied) => debug_report::print_run(&config.word, &applied, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

enum Mode {
    /// Apply one rule file, read from an arbitrary path.
    Rules(String),
    /// Expand and apply chain pairs against the rule-file directory.
    Chain(Vec<ChainPair>),
}

struct CliConfig {
    word: String,
    mode: Mode,
    files: String,
    debug: u8,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut word: Option<String> = None;
    let mut rules: Option<String> = None;
    let mut pairs: Vec<ChainPair> = Vec::new();
    let mut files = "files".to_string();
    let mut debug = 1;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("soundlaw {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--rules" | "-r" => {
                let value = args.next().ok_or_else(|| "error: --rules expects a path".to_string())?;
                rules = Some(value);
            }
            "--chain" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --chain expects start:end".to_string())?;
                pairs.push(parse_pair(&value)?);
            }
            "--files" | "-f" => {
                files = args.next().ok_or_else(|| "error: --files expects a directory".to_string())?;
            }
            "--debug" | "-d" => {
                let value = args.next().ok_or_else(|| "error: --debug expects a level".to_string())?;
                debug = value.parse().map_err(|_| format!("error: invalid --debug level '{value}'"))?;
            }
            _ if arg.starts_with("--chain=") => {
                pairs.push(parse_pair(arg.trim_start_matches("--chain="))?);
            }
            _ if arg.starts_with("--rules=") => {
                rules = Some(arg.trim_start_matches("--rules=").to_string());
            }
            _ if arg.starts_with("--files=") => {
                files = arg.trim_start_matches("--files=").to_string();
            }
            _ if arg.starts_with("--debug=") => {
                let value = arg.trim_start_matches("--debug=");
                debug = value.parse().map_err(|_| format!("error: invalid --debug level '{value}'"))?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if word.is_some() {
                    return Err("error: word provided multiple times".to_string());
                }
                word = Some(arg);
            }
        }
    }

    let word = match word {
        Some(value) => value,
        None => read_stdin_word()?,
    };
    if word.trim().is_empty() {
        return Err(format!("error: no word provided\n\n{}", help_text()));
    }

    let mode = match (rules, pairs.is_empty()) {
        (Some(_), false) => return Err("error: --rules and --chain are mutually exclusive".to_string()),
        (Some(path), true) => Mode::Rules(path),
        (None, false) => Mode::Chain(pairs),
        (None, true) => return Err(format!("error: provide --rules or at least one --chain\n\n{}", help_text())),
    };

    Ok(CliConfig { word, mode, files, debug, color })
}

fn parse_pair(value: &str) -> Result<ChainPair, String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("error: invalid --chain '{value}' (expected start:end)"))?;
    Ok(ChainPair::new(start, end))
}

fn read_stdin_word() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer.trim().to_string())
}

fn load_rule_lines(path: &str) -> Result<Vec<String>, String> {
    let text = std::fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))?;
    Ok(text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty() && !line.starts_with("//"))
        .map(str::to_string)
        .collect())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "soundlaw {version}

Diachronic sound change applier CLI.

Usage:
  soundlaw [OPTIONS] <word>
  soundlaw [OPTIONS] --rules <file> <word>
  soundlaw [OPTIONS] --chain <start:end>... <word>

Options:
  -r, --rules <file>       Apply a single rule file to the word.
  -c, --chain <start:end>  Apply the rule files between two stages of the
                           language tree; may be given multiple times.
  -f, --files <dir>        Directory holding chain rule files (default: files).
  -d, --debug <level>      Trace detail: 0 none, 1 per file, 2 per rule.
                           Default: 1.
  --color                  Force ANSI color output.
  --no-color               Disable ANSI color output.
  -h, --help               Show this help message.
  -V, --version            Print version information.

Exit codes:
  0  Success.
  1  Rule, chain, or file error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
