use clap::{ArgAction, Parser, Subcommand};
use hamlc_codegen::{compile, CompilerOutput, Options, TargetKind};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hamlc")]
#[command(about = "Compile HAML-style markup into template-engine HTML")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .haml file to HTML
    Build {
        /// Input .haml file
        path: PathBuf,

        /// Target template dialect
        #[arg(short, long, default_value_t = TargetKind::Default)]
        target: TargetKind,

        /// Output file; `-` writes to stdout. Defaults to the input with an
        /// .html extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a .haml file for errors without writing output
    Check {
        /// Input .haml file
        path: PathBuf,

        /// Target template dialect
        #[arg(short, long, default_value_t = TargetKind::Default)]
        target: TargetKind,
    },
}

/// Where `build` writes its result.
#[derive(Debug, PartialEq, Eq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            path,
            target,
            output,
        } => cmd_build(&path, target, output.as_deref()),
        Command::Check { path, target } => cmd_check(&path, target),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_source(path: &Path) -> String {
    if !path.exists() {
        eprintln!("Error: file not found: {}", path.display());
        std::process::exit(1);
    }
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn compile_source(path: &Path, target: TargetKind) -> CompilerOutput {
    let source = read_source(path);
    tracing::debug!(path = %path.display(), target_name = %target, bytes = source.len(), "read source");
    let options = Options {
        target,
        cache: false,
    };

    match compile(&source, &options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn destination(path: &Path, output: Option<&Path>) -> Destination {
    match output {
        Some(out) if out == Path::new("-") => Destination::Stdout,
        Some(out) => Destination::File(out.to_path_buf()),
        None => Destination::File(path.with_extension("html")),
    }
}

fn cmd_build(path: &Path, target: TargetKind, output: Option<&Path>) {
    let compiled = compile_source(path, target);

    let destination = destination(path, output);
    tracing::debug!(?destination, "writing output");

    match destination {
        Destination::Stdout => print!("{}", compiled.html),
        Destination::File(html_path) => {
            if let Err(e) = std::fs::write(&html_path, &compiled.html) {
                eprintln!("Error writing {}: {e}", html_path.display());
                std::process::exit(1);
            }
            eprintln!("Built: {}", html_path.display());
        }
    }
}

fn cmd_check(path: &Path, target: TargetKind) {
    let compiled = compile_source(path, target);

    tracing::debug!(warnings = compiled.warnings.len(), "checked");
    for warning in &compiled.warnings {
        eprintln!("warning: {}: {warning}", path.display());
    }
    eprintln!("OK: {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hamlc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let cli = parse(&["build", "page.haml"]);
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Command::Build {
                path,
                target,
                output,
            } => {
                assert_eq!(path, PathBuf::from("page.haml"));
                assert_eq!(target, TargetKind::Default);
                assert_eq!(output, None);
            }
            Command::Check { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn test_build_with_target_and_output() {
        let cli = parse(&["-vv", "build", "page.haml", "--target", "jinja", "-o", "-"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build { target, output, .. } => {
                assert_eq!(target, TargetKind::Jinja);
                assert_eq!(output, Some(PathBuf::from("-")));
            }
            Command::Check { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn test_unknown_target_rejected() {
        let result =
            Cli::try_parse_from(["hamlc", "check", "page.haml", "--target", "mustache"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_destination() {
        let source = Path::new("views/page.haml");
        assert_eq!(
            destination(source, None),
            Destination::File(PathBuf::from("views/page.html"))
        );
        assert_eq!(destination(source, Some(Path::new("-"))), Destination::Stdout);
        assert_eq!(
            destination(source, Some(Path::new("out/x.html"))),
            Destination::File(PathBuf::from("out/x.html"))
        );
    }
}
