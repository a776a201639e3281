//! Parser: reads headers into the declaration [`Model`].

pub mod header;
pub mod overrides;
pub mod scanner;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::GenerateError;
use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vlc-\d+\.\d+\.\d+").unwrap());

/// One header to parse: display path and contents.
pub struct HeaderSource {
    pub path: String,
    pub text: String,
}

/// Parse all headers into one model.
///
/// Each header is scanned once per declaration form. When `version` is empty
/// it is taken from the first `vlc-X.Y.Z` path component found.
pub fn parse_headers(
    headers: &[HeaderSource],
    version: &str,
    diag: &mut Diagnostics,
) -> Result<Model, GenerateError> {
    let mut model = Model {
        version: version.to_string(),
        ..Default::default()
    };

    for header in headers {
        if model.version.is_empty() {
            if let Some(v) = find_version(&header.path) {
                model.version = v;
            }
        }
        let mut enums = header::parse_enums(&header.text, &header.path, diag)?;
        for e in &mut enums {
            e.docs = capitalize(&crate::docs::endot(&e.raw_docs));
        }
        model.enums.extend(enums);
        model
            .callbacks
            .extend(header::parse_callbacks(&header.text, &header.path, diag));
        model.functions.extend(header::parse_functions(
            &header.text,
            &header.path,
            &mut model.blacklist,
            diag,
        ));
    }

    Ok(model)
}

/// Find a `vlc-X.Y.Z...` component in a path.
fn find_version(path: &str) -> Option<String> {
    path.replace('\\', "/")
        .split('/')
        .find(|part| RE_VERSION.is_match(part))
        .map(str::to_string)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Consistency checks: documentation presence and documented parameter
/// counts. Must run after the documentation transform.
pub fn check(model: &Model, diag: &mut Diagnostics) {
    for e in &model.enums {
        if e.docs.is_empty() {
            diag.record(
                DiagnosticKind::MissingDocumentation,
                format!("no comment for typedef {} {}", e.kind, e.name),
            );
        }
    }
    for f in model.functions.iter().chain(&model.callbacks) {
        if f.raw_docs.is_empty() {
            diag.record(
                DiagnosticKind::MissingDocumentation,
                format!("no comment for function {}", f.name),
            );
            continue;
        }
        let documented = crate::docs::documented_params(f);
        if f.params.len() != documented {
            diag.record(
                DiagnosticKind::ParamCountMismatch,
                format!(
                    "doc parameters ({}) mismatch for function {} ({})",
                    documented,
                    f.name,
                    f.params.len()
                ),
            );
        }
    }
}

/// Write the parsed model to stderr.
pub fn dump(model: &Model) {
    eprintln!("\n==== enums ==== {}", model.version);
    for e in &model.enums {
        eprintln!("{} ({}): {}", e.name, e.kind, e.location);
        for v in &e.values {
            let value = v.number.map_or_else(|| v.literal.clone(), |n| n.to_string());
            eprintln!("    {} = {} ({})", v.name, value, v.enum_name);
        }
    }
    for (title, funcs) in [("funcs", &model.functions), ("callbacks", &model.callbacks)] {
        eprintln!("\n==== {} ==== {}", title, model.version);
        for f in funcs {
            eprintln!("{} ({}): {}", f.name, f.ty, f.location);
            for p in &f.params {
                let label = if f.docs.out.contains(&p.name) {
                    "[OUT]"
                } else {
                    p.direction.label()
                };
                eprintln!("    {} ({}) {}", p.name, p.ty, label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
/**
 * Media states
 */
typedef enum libvlc_state_t {
    libvlc_NothingSpecial = 0,
    libvlc_Opening,
    libvlc_Ended = 6
} libvlc_state_t;

/**
 * Release a media.
 * \\param p_md the media
 */
LIBVLC_API void libvlc_media_release( libvlc_media_t *p_md );

LIBVLC_API void libvlc_undocumented( int i );

typedef void (*libvlc_log_cb)(void *data, int level);
";

    fn source(path: &str) -> HeaderSource {
        HeaderSource {
            path: path.to_string(),
            text: HEADER.to_string(),
        }
    }

    #[test]
    fn parses_all_forms() {
        let mut diag = Diagnostics::quiet();
        let model = parse_headers(&[source("include/vlc/libvlc.h")], "", &mut diag).unwrap();
        assert_eq!(model.enums.len(), 1);
        assert_eq!(model.enums[0].docs, "Media states.");
        assert_eq!(model.functions.len(), 2);
        assert_eq!(model.callbacks.len(), 1);
        assert_eq!(model.callbacks[0].name, "libvlc_log_cb");
        assert_eq!(model.version, "");
    }

    #[test]
    fn version_from_path() {
        let mut diag = Diagnostics::quiet();
        let model =
            parse_headers(&[source("/src/vlc-3.0.18/include/vlc/libvlc.h")], "", &mut diag).unwrap();
        assert_eq!(model.version, "vlc-3.0.18");

        let model =
            parse_headers(&[source("/src/vlc-3.0.18/include/vlc/libvlc.h")], "9.9", &mut diag).unwrap();
        assert_eq!(model.version, "9.9");
    }

    #[test]
    fn version_windows_path() {
        assert_eq!(find_version(r"C:\vlc-2.2.1-win\include"), Some("vlc-2.2.1-win".to_string()));
        assert_eq!(find_version("include/vlc/libvlc.h"), None);
    }

    #[test]
    fn check_reports_missing_docs_and_counts() {
        let mut diag = Diagnostics::quiet();
        let model = parse_headers(&[source("libvlc.h")], "", &mut diag).unwrap();
        check(&model, &mut diag);
        let messages: Vec<&str> = diag.records().iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"no comment for function libvlc_undocumented"));
        assert!(!messages.contains(&"no comment for function libvlc_media_release"));
    }

    #[test]
    fn check_reports_count_mismatch() {
        let mut diag = Diagnostics::quiet();
        let headers = [HeaderSource {
            path: "x.h".into(),
            text: "/** Two.\n * \\param a first\n */\nLIBVLC_API void libvlc_two( int a, int b );\n".into(),
        }];
        let model = parse_headers(&headers, "", &mut diag).unwrap();
        check(&model, &mut diag);
        assert_eq!(
            diag.records()[0].message,
            "doc parameters (1) mismatch for function libvlc_two (2)"
        );
    }
}
