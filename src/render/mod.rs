//! Emitters: trait-based target dispatch.
//!
//! Every target implements [`Emitter`]. Emitters write into an in-memory
//! [`Output`] which collects one [`Artifact`] per generated file; the caller
//! decides where artifacts end up.

pub mod java;
pub mod python;

use crate::classify::{DirectionPolicy, TypeRegistry};
use crate::diagnostics::Diagnostics;
use crate::error::GenerateError;
use crate::model::Model;
use crate::parser::overrides::Overrides;
use anyhow::{anyhow, Result};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Placeholder for missing documentation and versions.
pub const NA: &str = "N/A";

/// Template line replaced by the generated enum and callback classes.
const GENERATED_ENUMS: &str = "# GENERATED_ENUMS";

/// Template line replaced by the version and build date markers.
const BUILD_DATE: &str = "build_date  = ";

/// Path of the artifact that goes to standard output.
pub const STDOUT: &str = "-";

/// Settings shared by all emitters.
#[derive(Debug, Default)]
pub struct EmitConfig {
    /// Output file (single-file targets) or directory (multi-file targets).
    pub output: Option<String>,
    pub templates: Templates,
    pub overrides: Overrides,
    /// Timestamp written into the build date marker.
    pub build_date: String,
    pub directions: DirectionPolicy,
}

/// A code generator for one target language.
pub trait Emitter {
    /// Comment leader of the target language.
    fn comment_line(&self) -> &'static str;

    fn model(&self) -> &Model;

    fn registry(&self) -> &TypeRegistry;

    /// One class or type per enum.
    fn generate_enums(&mut self, out: &mut Output) -> Result<(), GenerateError>;

    /// One declaration per callback signature.
    fn generate_callbacks(&mut self, out: &mut Output);

    /// One standalone declaration per function.
    fn generate_functions(&mut self, out: &mut Output) -> Result<(), GenerateError>;

    /// Class methods grouped by the type of the first parameter.
    fn generate_wrappers(&mut self, out: &mut Output);

    /// Generate every artifact of the target.
    fn save(&mut self) -> Result<Vec<Artifact>, GenerateError>;

    /// Write the conversion dictionaries to stderr.
    fn dump_dicts(&self) {
        let version = &self.model().version;
        eprintln!("\n==== type2class ==== {}", version);
        for (ty, class) in self.registry().entries() {
            eprintln!("    {}: {}", ty, class);
        }
    }

    /// Audit comments: blacklisted functions present in the headers, with
    /// their declared type, and functions never folded into a class method.
    fn unwrapped(&self, out: &mut Output) {
        let c = self.comment_line();
        let model = self.model();
        let blacklisted: Vec<String> = model
            .blacklist
            .present()
            .map(|(name, ty)| format!("{} ({})", name, ty))
            .collect();
        let mut unwrapped: Vec<String> = model
            .functions
            .iter()
            .filter(|f| f.wrapped == 0)
            .map(|f| f.name.clone())
            .collect();
        unwrapped.sort_unstable();

        for (names, what) in [(blacklisted, "blacklisted"), (unwrapped, "not wrapped as methods")] {
            if names.is_empty() {
                continue;
            }
            out.write(&format!("\n{} {} function(s) {}:\n", c, names.len(), what));
            let lines: Vec<String> = names.iter().map(|n| format!("{}  {}", c, n)).collect();
            out.line(&lines.join("\n"));
        }
    }
}

/// Create an emitter for the given target name.
///
/// Construction registers the declared types, transforms documentation,
/// assigns parameter directions and reports unresolved types to `diag`.
pub fn create_emitter(
    target: &str,
    model: Model,
    config: EmitConfig,
    diag: &mut Diagnostics,
) -> Result<Box<dyn Emitter>> {
    match target {
        "python" | "py" => Ok(Box::new(python::PythonEmitter::new(model, config, diag))),
        "java" => Ok(Box::new(java::JavaEmitter::new(model, config, diag))),
        _ => Err(anyhow!("unknown target: {}. Use python or java", target)),
    }
}

// -- Output -------------------------------------------------------------------

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Relative path, or [`STDOUT`].
    pub path: String,
    pub text: String,
}

/// Sink for generated text; at most one artifact is open at a time.
#[derive(Debug, Default)]
pub struct Output {
    current: Option<Artifact>,
    artifacts: Vec<Artifact>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new artifact.
    pub fn open(&mut self, path: impl Into<String>) -> Result<(), GenerateError> {
        if let Some(open) = self.current.take() {
            return Err(GenerateError::FileLeftOpen { path: open.path });
        }
        self.current = Some(Artifact {
            path: path.into(),
            text: String::new(),
        });
        Ok(())
    }

    /// Append `text` to the open artifact.
    pub fn write(&mut self, text: &str) {
        if let Some(artifact) = self.current.as_mut() {
            artifact.text.push_str(text);
        }
    }

    /// Append `text` and a newline.
    pub fn line(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    pub fn close(&mut self) {
        if let Some(artifact) = self.current.take() {
            self.artifacts.push(artifact);
        }
    }

    /// All closed artifacts, in the order they were opened.
    pub fn finish(mut self) -> Result<Vec<Artifact>, GenerateError> {
        if let Some(open) = self.current.take() {
            return Err(GenerateError::FileLeftOpen { path: open.path });
        }
        Ok(self.artifacts)
    }
}

// -- Templates ----------------------------------------------------------------

/// Boilerplate files copied into the generated output.
#[derive(Debug, Default, Clone)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Templates { dir }
    }

    /// Contents of template `name`; a missing file reads as empty.
    pub fn read(&self, name: &str) -> Result<String, GenerateError> {
        let Some(dir) = &self.dir else {
            return Ok(String::new());
        };
        let path = dir.join(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(GenerateError::Template {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// The `__version__` and `build_date` marker lines.
pub fn version_markers(version: &str, build_date: &str) -> [String; 2] {
    let (v, suffix) = if version.is_empty() {
        (NA.to_string(), String::new())
    } else {
        (version.to_string(), format!(" {}", version))
    };
    [
        format!("__version__ = \"{}\"", v),
        format!("{}\"{}{}\"", BUILD_DATE, build_date, suffix),
    ]
}

/// Copy `template` into `out`, replacing the marker lines.
///
/// A `# GENERATED_ENUMS` line calls `on_enums`; a `build_date  = ` line is
/// replaced by the version markers. Returns whether `on_enums` was called.
pub fn insert_code<F>(
    out: &mut Output,
    template: &str,
    version: &str,
    build_date: &str,
    mut on_enums: F,
) -> Result<bool, GenerateError>
where
    F: FnMut(&mut Output) -> Result<(), GenerateError>,
{
    let mut generated = false;
    for line in template.split_inclusive('\n') {
        if line.starts_with(GENERATED_ENUMS) {
            on_enums(out)?;
            generated = true;
        } else if line.starts_with(BUILD_DATE) {
            for marker in version_markers(version, build_date) {
                out.line(&marker);
            }
        } else {
            out.write(line);
        }
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_collects_artifacts_in_order() {
        let mut out = Output::new();
        out.open("a.txt").unwrap();
        out.line("one");
        out.close();
        out.open("b.txt").unwrap();
        out.write("two");
        out.close();
        let artifacts = out.finish().unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].text, "one\n");
        assert_eq!(artifacts[1].path, "b.txt");
    }

    #[test]
    fn output_rejects_nested_open() {
        let mut out = Output::new();
        out.open("a.txt").unwrap();
        let err = out.open("b.txt").unwrap_err();
        assert_eq!(err.to_string(), "file left open: a.txt");
    }

    #[test]
    fn output_finish_with_open_artifact_fails() {
        let mut out = Output::new();
        out.open("a.txt").unwrap();
        assert!(matches!(out.finish(), Err(GenerateError::FileLeftOpen { .. })));
    }

    #[test]
    fn markers_with_and_without_version() {
        assert_eq!(
            version_markers("", "Mon Jan  1 00:00:00 2024"),
            [
                "__version__ = \"N/A\"".to_string(),
                "build_date  = \"Mon Jan  1 00:00:00 2024\"".to_string()
            ]
        );
        assert_eq!(
            version_markers("3.0.18", "NOW")[1],
            "build_date  = \"NOW 3.0.18\""
        );
    }

    #[test]
    fn insert_code_replaces_markers() {
        let template = "import ctypes\nbuild_date  = ''\n# GENERATED_ENUMS -- here\nrest\n";
        let mut out = Output::new();
        out.open(STDOUT).unwrap();
        let generated = insert_code(&mut out, template, "1.0", "NOW", |out| {
            out.line("ENUMS");
            Ok(())
        })
        .unwrap();
        out.close();
        assert!(generated);
        assert_eq!(
            out.finish().unwrap()[0].text,
            "import ctypes\n__version__ = \"1.0\"\nbuild_date  = \"NOW 1.0\"\nENUMS\nrest\n"
        );
    }

    #[test]
    fn missing_template_reads_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("header.py"), "# header\n").unwrap();
        let templates = Templates::new(Some(dir.path().to_path_buf()));
        assert_eq!(templates.read("header.py").unwrap(), "# header\n");
        assert_eq!(templates.read("footer.py").unwrap(), "");
        assert_eq!(Templates::default().read("header.py").unwrap(), "");
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut diag = Diagnostics::quiet();
        let err = create_emitter("cobol", Model::default(), EmitConfig::default(), &mut diag)
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown target: cobol"));
    }
}
