use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use tarn::{AriadneSink, Bump, Catalog, Engine, EngineOptions, Sink, render_error};

const USAGE: &str = "usage: tarn [OPTIONS] <FILE>";

/// Tarn - run a Tarn program
#[derive(Parser, Debug)]
#[command(name = "tarn")]
#[command(about = "Run a Tarn program and print its final value", long_about = None)]
struct Args {
    /// Message templates, one `CODE = template` per line
    #[arg(long, value_name = "PATH")]
    messages: Option<PathBuf>,

    /// Severities, one `CODE = none|hint|suggestion|warning|error` per line
    #[arg(long, value_name = "PATH")]
    severities: Option<PathBuf>,

    /// Do not prepend the prelude
    #[arg(long)]
    no_prelude: bool,

    /// Parenthesize every operator application in printed output
    #[arg(long)]
    braced: bool,

    /// Print the parsed program before running it
    #[arg(long)]
    debug_parse: bool,

    /// Program to run; exactly one is expected
    files: Vec<PathBuf>,
}

impl Args {
    fn options(&self) -> EngineOptions {
        EngineOptions {
            prelude: !self.no_prelude,
            braced_output: self.braced,
            ..EngineOptions::default()
        }
    }

    fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        if let Some(path) = &self.messages {
            catalog
                .load_messages(&read(path)?)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid message file {}", path.display()))?;
        }
        if let Some(path) = &self.severities {
            catalog
                .load_severities(&read(path)?)
                .into_diagnostic()
                .wrap_err_with(|| format!("invalid severity file {}", path.display()))?;
        }
        Ok(catalog)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// Runs `source` and prints its final value to `out`.
///
/// Diagnostics go to `sink`. A run aborted by a diagnostic is not reported
/// again; other failures are rendered to `err`.
fn run_source(
    args: &Args,
    catalog: Catalog,
    name: &str,
    source: &str,
    sink: impl Sink + 'static,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<ExitCode> {
    let engine = Engine::new(args.options(), catalog);
    let arena = Bump::new();
    let mut diagnostics = engine.diagnostics().with_sink(sink);

    let program = match engine.parse(&arena, source, &mut diagnostics) {
        Ok(program) => program,
        Err(e) => return report(name, source, &e, err),
    };
    if args.debug_parse {
        writeln!(out, "=== Parsed program ===").into_diagnostic()?;
        writeln!(out, "{}", engine.render(&program)).into_diagnostic()?;
        writeln!(out).into_diagnostic()?;
    }

    match engine.run_program(&program, &mut diagnostics, out) {
        Ok(value) => {
            writeln!(out, "{}", engine.render_value(&value)).into_diagnostic()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report(name, source, &e, err),
    }
}

fn report(name: &str, source: &str, error: &tarn::Error, err: &mut dyn Write) -> Result<ExitCode> {
    if error.is_aborted() {
        tracing::debug!("run aborted by a diagnostic");
    } else {
        render_error(source, name, error, err, false).into_diagnostic()?;
    }
    Ok(ExitCode::FAILURE)
}

fn main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use TARN_LOG or RUST_LOG to control the log level, default to WARN
    let filter = EnvFilter::try_from_env("TARN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let [path] = args.files.as_slice() else {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    };

    let catalog = args.catalog()?;
    let source = read(path)?;
    let name = path.display().to_string();
    let color = std::io::stderr().is_terminal();
    let sink = AriadneSink::new(name.clone(), source.clone()).with_color(color);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut err = std::io::stderr();
    let code = run_source(&args, catalog, &name, &source, sink, &mut out, &mut err)?;
    out.flush().into_diagnostic()?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tarn::CollectSink;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tarn").chain(argv.iter().copied())).unwrap()
    }

    struct Run {
        code: ExitCode,
        out: String,
        err: String,
        codes: Vec<&'static str>,
    }

    fn run(argv: &[&str], source: &str) -> Run {
        let args = args(argv);
        let sink = CollectSink::default();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_source(
            &args,
            Catalog::default(),
            "test.tarn",
            source,
            sink.clone(),
            &mut out,
            &mut err,
        )
        .unwrap();
        Run {
            code,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
            codes: sink.take().iter().map(|d| d.code()).collect(),
        }
    }

    #[test]
    fn test_flags_are_parsed() {
        let args = args(&[
            "--messages",
            "m.txt",
            "--severities",
            "s.txt",
            "--no-prelude",
            "--braced",
            "--debug-parse",
            "main.tarn",
        ]);
        assert_eq!(args.messages, Some(PathBuf::from("m.txt")));
        assert_eq!(args.severities, Some(PathBuf::from("s.txt")));
        assert!(args.no_prelude && args.braced && args.debug_parse);
        assert_eq!(args.files, [PathBuf::from("main.tarn")]);
        assert!(!args.options().prelude);
    }

    #[test]
    fn test_file_count_is_not_checked_by_clap() {
        assert!(args(&[]).files.is_empty());
        assert_eq!(args(&["a", "b"]).files.len(), 2);
    }

    #[test]
    fn test_prints_output_then_final_value() {
        let run = run(&[], "print(1)\n1 + 2");
        assert_eq!(run.code, ExitCode::SUCCESS);
        assert_eq!(run.out, "1\n3\n");
        assert!(run.err.is_empty());
    }

    #[test]
    fn test_braced_output() {
        let run = run(&["--braced", "--debug-parse", "--no-prelude"], "a + b * c\n0");
        assert!(run.out.starts_with("=== Parsed program ===\n(a + (b * c))\n0\n"));
    }

    #[test]
    fn test_debug_parse_reports_parse_diagnostics_once() {
        let run = run(&["--debug-parse"], "1 /* open");
        assert_eq!(run.code, ExitCode::SUCCESS);
        assert_eq!(run.codes, ["P009"]);
        assert!(run.out.ends_with("\n1\n"));
    }

    #[test]
    fn test_fatal_error_is_reported_by_kind() {
        let run = run(&[], "var a = 1\nvar a = 2");
        assert_eq!(run.code, ExitCode::FAILURE);
        assert_eq!(
            run.err,
            "error[DuplicateDeclaration]: 'a' is already declared in this scope\n"
        );
    }

    #[test]
    fn test_aborted_run_is_quiet() {
        let run = run(&[], "assert false");
        assert_eq!(run.code, ExitCode::FAILURE);
        assert_eq!(run.codes, ["E010"]);
        assert!(run.err.is_empty());
        assert!(run.out.is_empty());
    }
}
