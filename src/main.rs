//! vlcgen: generate Python (ctypes) and Java (JNA) bindings from the libvlc
//! C headers.
//!
//! ```text
//! vlcgen include/vlc/ -o vlc.py -T templates/
//! vlcgen -t java -o internal/ include/vlc/*.h
//! vlcgen --check include/vlc/
//! ```

mod classify;
mod diagnostics;
mod docs;
mod error;
mod model;
mod parser;
mod render;

use anyhow::{Context, Result};
use classify::{DirectionOverride, DirectionPolicy};
use clap::{CommandFactory, Parser};
use diagnostics::{DiagnosticKind, Diagnostics};
use parser::overrides::{self, Overrides};
use parser::HeaderSource;
use render::{Artifact, EmitConfig, Templates, STDOUT};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "vlcgen",
    about = "Parse the libvlc include files and generate Python or Java bindings"
)]
struct Cli {
    /// Header files, include directories or glob patterns
    files: Vec<String>,

    /// Target language: python (default) or java
    #[arg(short = 't', long, default_value = "python")]
    target: String,

    /// Output file (python, `-` for stdout) or directory (java)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Version string for the __version__ marker.
    /// Taken from a vlc-X.Y.Z path component when omitted.
    #[arg(short = 'v', long)]
    version: Option<String>,

    /// Directory holding the boilerplate templates and override.py
    #[arg(short = 'T', long)]
    templates: Option<PathBuf>,

    /// Hand-written class overrides (default: <templates>/override.py)
    #[arg(long = "override")]
    override_file: Option<PathBuf>,

    /// Extra C type passed by pointer as an output parameter (repeatable)
    #[arg(long = "out-type", value_name = "TYPE")]
    out_types: Vec<String>,

    /// Force a parameter direction: in, out, inout or inzero (repeatable)
    #[arg(long = "direction", value_name = "FUNCTION:PARAM=DIRECTION")]
    directions: Vec<DirectionOverride>,

    /// Check mode: report documentation defects, generate nothing
    #[arg(short = 'c', long)]
    check: bool,

    /// Debug mode: dump the parsed declarations, generate nothing
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::from(1));
    }

    run(&cli)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let paths = find_headers(&cli.files)?;
    let headers = read_headers(&paths)?;

    let mut diag = Diagnostics::new().with_trace(cli.debug);
    let version = cli.version.as_deref().unwrap_or_default();
    let model = parser::parse_headers(&headers, version, &mut diag)?;

    let overrides = load_overrides(cli)?;
    if cli.debug {
        eprintln!("\n==== overrides ==== {} class(es)", overrides.len());
    }
    let config = EmitConfig {
        output: cli.output.clone(),
        templates: Templates::new(cli.templates.clone()),
        overrides,
        build_date: build_date(),
        directions: direction_policy(cli),
    };

    let baseline = diag.count();
    let mut emitter = render::create_emitter(&cli.target, model, config, &mut diag)?;
    if let Some(status) = diag.checkpoint(baseline, "type conversion(s) missing") {
        return Ok(ExitCode::from(status));
    }

    if cli.check {
        parser::check(emitter.model(), &mut diag);
        for kind in [DiagnosticKind::MissingDocumentation, DiagnosticKind::ParamCountMismatch] {
            match diag.count_of(kind) {
                0 => {}
                n => eprintln!("{}: {}", kind, n),
            }
        }
    } else if cli.debug {
        parser::dump(emitter.model());
        emitter.dump_dicts();
    } else if diag.count() == 0 {
        let artifacts = emitter.save()?;
        write_artifacts(&artifacts)?;
    }

    Ok(diag
        .checkpoint(0, "error(s) reported")
        .map_or(ExitCode::SUCCESS, ExitCode::from))
}

/// Default direction table extended by `--out-type` and `--direction`.
fn direction_policy(cli: &Cli) -> DirectionPolicy {
    let policy = cli
        .out_types
        .iter()
        .fold(DirectionPolicy::default(), |policy, ty| policy.with_out_type(ty));
    cli.directions.iter().fold(policy, |policy, o| {
        policy.with_override(&o.function, &o.param, o.direction)
    })
}

/// Local time in `ctime` layout, e.g. `Tue Mar  5 14:02:11 2024`.
fn build_date() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Read every header, keeping its display path for locations.
fn read_headers(paths: &[PathBuf]) -> Result<Vec<HeaderSource>> {
    paths
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(HeaderSource {
                path: path.to_string_lossy().to_string(),
                text,
            })
        })
        .collect()
}

/// Override classes from `--override`, or `override.py` in the template
/// directory for the Python target.
fn load_overrides(cli: &Cli) -> Result<Overrides> {
    let path = match (&cli.override_file, &cli.templates) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) if cli.target.starts_with("py") => {
            let candidate = dir.join("override.py");
            candidate.is_file().then_some(candidate)
        }
        _ => None,
    };
    let Some(path) = path else {
        return Ok(Overrides::default());
    };
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read override file: {}", path.display()))?;
    Ok(overrides::parse(&text))
}

/// Write artifacts to stdout or to their files, creating directories.
fn write_artifacts(artifacts: &[Artifact]) -> Result<()> {
    for artifact in artifacts {
        if artifact.path == STDOUT {
            io::stdout()
                .write_all(artifact.text.as_bytes())
                .context("failed to write stdout")?;
            continue;
        }
        let path = Path::new(&artifact.path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
        }
        fs::write(path, &artifact.text)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Headers picked from an include directory.
const HEADER_GLOB: &str = "*.h";

/// Header paths named on the command line, sorted and deduplicated.
///
/// Files are taken as given, include directories contribute their `*.h`
/// entries and anything else is matched as a glob pattern.
fn find_headers(args: &[String]) -> Result<Vec<PathBuf>> {
    let mut headers = BTreeSet::new();
    for arg in args {
        let found = header_paths(arg)?;
        if found.is_empty() {
            eprintln!("warning: no headers found: {}", arg);
        }
        headers.extend(found);
    }
    Ok(headers.into_iter().collect())
}

fn header_paths(arg: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(arg);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let pattern = if path.is_dir() {
        let dir = glob::Pattern::escape(&path.to_string_lossy());
        format!("{}/{}", dir.trim_end_matches('/'), HEADER_GLOB)
    } else {
        arg.to_string()
    };
    let paths =
        glob::glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))?;
    Ok(paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
}
