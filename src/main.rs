// SPDX-License-Identifier: MIT
//
// n-modal: replay modal editing keystrokes against a text buffer.
//
// The binary is a thin host around n-interp: it owns the file I/O and the
// logging setup the interpreter never does.
//
//   file / stdin → Buffer → interpret(keys) → stdout
//                                           → state summary (stderr, --state)
//
// Keys use the interpreter's notation: printable characters are themselves,
// and `<esc>`, `<cr>`, `<bs>`, `<c-c>`, `<c-r>`, `<c-v>` name the rest. With
// `--names`, keys are instead whitespace-separated host key names
// (`esc`, `enter`, `ctrl-r`, ...).
//
// Logging goes to stderr through tracing-subscriber; the filter comes from
// `N_MODAL_LOG` (default `warn`).

use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use n_interp::search::SearchDirection;
use n_interp::{Buffer, Interpreter, Mode, Options, State, Token, parse_keys};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: n-modal [options] <keys> [file]

Reads the buffer from <file> (or stdin), runs <keys>, prints the result.

options:
  --set <directives>   apply set-style options, e.g. \"ic macrodepth=8\"
  --depth <n>          deepest nested macro playback (default 64)
  --budget <n>         replayed macro tokens per run (default 100000)
  --ignore-case        case-insensitive search
  --names              keys are whitespace-separated key names
  --state              print a state summary to stderr
  -h, --help           show this help";

// ─── Configuration ──────────────────────────────────────────────────────────

/// Everything the command line asked for.
#[derive(Debug, Default, PartialEq, Eq)]
struct Config {
    options: Options,
    keys: String,
    file: Option<PathBuf>,
    names: bool,
    show_state: bool,
}

/// Why the command line was rejected.
#[derive(Debug, PartialEq, Eq)]
enum ArgError {
    Help,
    Invalid(String),
}

fn invalid(message: impl Into<String>) -> ArgError {
    ArgError::Invalid(message.into())
}

fn parse_args(args: &[String]) -> Result<Config, ArgError> {
    let mut config = Config::default();
    let mut positional = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(ArgError::Help),
            "--ignore-case" => config.options.ignore_case = true,
            "--names" => config.names = true,
            "--state" => config.show_state = true,
            "--set" => {
                let directives = iter.next().ok_or_else(|| invalid("--set needs a value"))?;
                config
                    .options
                    .set(directives)
                    .map_err(|e| invalid(e.to_string()))?;
            }
            "--depth" => config.options.max_macro_depth = number(iter.next(), "--depth")?,
            "--budget" => config.options.macro_token_budget = number(iter.next(), "--budget")?,
            "--" => positional.extend(iter.by_ref().cloned()),
            flag if flag.starts_with("--") => return Err(invalid(format!("unknown option {flag}"))),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    config.keys = positional.next().ok_or_else(|| invalid("missing <keys>"))?;
    config.file = positional.next().map(PathBuf::from);
    if let Some(extra) = positional.next() {
        return Err(invalid(format!("unexpected argument {extra}")));
    }
    Ok(config)
}

fn number(value: Option<&String>, flag: &str) -> Result<usize, ArgError> {
    let value = value.ok_or_else(|| invalid(format!("{flag} needs a value")))?;
    value
        .parse()
        .map_err(|_| invalid(format!("{flag} expects a number, got {value}")))
}

/// Turn the key argument into tokens. Unknown key names are skipped with a
/// warning.
fn tokens(config: &Config) -> Vec<Token> {
    if !config.names {
        return parse_keys(&config.keys);
    }
    config
        .keys
        .split_whitespace()
        .filter_map(|name| {
            let token = Token::from_name(name);
            if token.is_none() {
                tracing::warn!(name, "unknown key name skipped");
            }
            token
        })
        .collect()
}

// ─── I/O ────────────────────────────────────────────────────────────────────

fn read_buffer(file: Option<&PathBuf>) -> io::Result<Buffer> {
    match file {
        Some(path) => Buffer::from_file(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(Buffer::from_text(&text))
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("N_MODAL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// One line per field a host would usually inspect, plus set registers and
/// marks.
fn summary(state: &State) -> String {
    let mut out = String::new();
    let cursor = state.cursor();
    out.push_str(&format!("mode: {}\n", state.mode()));
    out.push_str(&format!("cursor: {}:{}\n", cursor.row, cursor.col));
    if state.mode().is_line_input() {
        let (prefix, input) = if state.mode() == Mode::CommandLine {
            (':', state.command_query())
        } else {
            let direction = state.search_direction().unwrap_or(SearchDirection::Forward);
            (direction.prefix(), state.search_query())
        };
        out.push_str(&format!("input: {prefix}{}\n", input.text()));
    }
    if let Some(name) = state.recording_register() {
        out.push_str(&format!("recording: {name}\n"));
    }
    if let Some(pattern) = state.search_pattern() {
        let wrapped = if state.last_match_wrapped() { " (wrapped)" } else { "" };
        out.push_str(&format!(
            "search: {} found={}{wrapped}\n",
            pattern.source(),
            state.last_match_found()
        ));
    }
    if let Some(error) = state.search_error() {
        out.push_str(&format!("search error: {error}\n"));
    }
    if let Some(command) = state.last_command() {
        out.push_str(&format!("command: :{command}\n"));
    }
    for (name, content) in state.registers().iter() {
        out.push_str(&format!("register {name}: {content:?}\n"));
    }
    for (name, pos) in state.marks().iter() {
        out.push_str(&format!("mark {name}: {}:{}\n", pos.row, pos.col));
    }
    out.push_str(&format!(
        "history: {}/{}\n",
        state.history_index().map_or(0, |idx| idx + 1),
        state.history_len()
    ));
    out
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run(config: &Config) -> io::Result<()> {
    let buffer = read_buffer(config.file.as_ref())?;
    let tokens = tokens(config);
    tracing::debug!(tokens = tokens.len(), lines = buffer.line_count(), "replaying");

    let (buffer, state) =
        Interpreter::with_options(config.options).interpret(&buffer, None, &tokens);

    let mut stdout = io::stdout().lock();
    stdout.write_all(buffer.contents().as_bytes())?;
    stdout.flush()?;

    if config.show_state {
        eprint!("{}", summary(&state));
    }
    Ok(())
}

fn main() {
    init_logging();
    let args: Vec<String> = env::args().skip(1).collect();

    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(ArgError::Help) => {
            println!("{USAGE}");
            return;
        }
        Err(ArgError::Invalid(message)) => {
            eprintln!("n-modal: {message}\n\n{USAGE}");
            process::exit(2);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("n-modal: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
