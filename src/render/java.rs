//! Java/JNA emitter.
//!
//! Writes one `<Enum>.java` per enum and a `LibVlc.java` interface holding a
//! `PointerType` class per opaque object, a `Callback` interface per callback
//! typedef and one method per function.

use super::{insert_code, Artifact, EmitConfig, Emitter, Output, STDOUT};
use crate::classify::{assign_directions, CallbackResult, TypeRegistry};
use crate::diagnostics::Diagnostics;
use crate::docs::{self, JAVADOC};
use crate::error::GenerateError;
use crate::model::{Model, Parameter};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"libvlc_(.+?)(_[te])?$").unwrap());

/// C type → Java/JNA type. Enum and callback classes are added per model.
const TYPE_TABLE: &[(&str, &str)] = &[
    ("libvlc_audio_output_t*", "LibVlcAudioOutput"),
    ("libvlc_callback_t", "LibVlcCallback"),
    ("libvlc_event_type_t", "LibvlcEventType"),
    ("libvlc_event_manager_t*", "LibVlcEventManager"),
    ("libvlc_instance_t*", "LibVlcInstance"),
    ("libvlc_log_t*", "LibVlcLog"),
    ("libvlc_log_iterator_t*", "LibVlcLogIterator"),
    ("libvlc_log_message_t*", "LibvlcLogMessage"),
    ("libvlc_media_t*", "LibVlcMedia"),
    ("libvlc_media_discoverer_t*", "LibVlcMediaDiscoverer"),
    ("libvlc_media_library_t*", "LibVlcMediaLibrary"),
    ("libvlc_media_list_t*", "LibVlcMediaList"),
    ("libvlc_media_list_player_t*", "LibVlcMediaListPlayer"),
    ("libvlc_media_list_view_t*", "LibVlcMediaListView"),
    ("libvlc_media_player_t*", "LibVlcMediaPlayer"),
    ("libvlc_media_stats_t*", "LibVlcMediaStats"),
    ("libvlc_media_track_info_t**", "LibVlcMediaTrackInfo"),
    ("libvlc_time_t", "long"),
    ("libvlc_track_description_t*", "LibVlcTrackDescription"),
    ("...", "FIXME_va_list"),
    ("bool", "boolean"),
    ("char*", "String"),
    ("char**", "String[]"),
    ("float", "float"),
    ("int", "int"),
    ("int*", "Pointer"),
    ("int64_t", "long"),
    ("short", "short"),
    ("uint32_t", "uint32"),
    ("unsigned", "int"),
    ("unsigned*", "Pointer"),
    ("void", "void"),
    ("void*", "Pointer"),
    ("void**", "PointerByReference"),
];

const PACKAGE: &str = "org.videolan.jvlc.internal";

/// Directory used when no output directory is given.
const DEFAULT_DIR: &str = "internal";

pub struct JavaEmitter {
    model: Model,
    registry: TypeRegistry,
    config: EmitConfig,
    dir: String,
}

impl JavaEmitter {
    pub fn new(mut model: Model, config: EmitConfig, diag: &mut Diagnostics) -> Self {
        let mut registry = TypeRegistry::seed(TYPE_TABLE);
        registry.register_declarations(&model, &RE_TYPE);

        docs::transform_all(&mut model.functions, &JAVADOC);
        docs::transform_all(&mut model.callbacks, &JAVADOC);
        assign_directions(&mut model.functions, &config.directions);
        registry.check(&model, Some(CallbackResult::Declared), diag);

        let dir = match config.output.as_deref() {
            None | Some(STDOUT) => DEFAULT_DIR.to_string(),
            Some(dir) => dir.to_string(),
        };
        JavaEmitter {
            model,
            registry,
            config,
            dir,
        }
    }

    /// `Type name, ...` with placeholder names for unnamed parameters.
    fn param_list(&self, params: &[Parameter]) -> String {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let name = if p.name.is_empty() {
                    format!("arg{}", i)
                } else {
                    p.name.clone()
                };
                format!("{} {}", self.registry.class_for(&p.ty), name)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn path(&self, name: &str) -> String {
        Path::new(&self.dir).join(name).display().to_string()
    }

    /// Copy a template without markers of its own.
    fn insert_template(&self, out: &mut Output, name: &str) -> Result<(), GenerateError> {
        let text = self.config.templates.read(name)?;
        insert_code(out, &text, &self.model.version, &self.config.build_date, |_| Ok(()))?;
        Ok(())
    }
}

/// `text` as a Javadoc block indented by `indent`.
fn javadoc(text: &str, indent: &str) -> String {
    let mut block = format!("{}/**\n", indent);
    for line in text.lines() {
        block.push_str(&format!("{} * {}\n", indent, line).replace(" * \n", " *\n"));
    }
    block.push_str(&format!("{} */\n", indent));
    block
}

impl Emitter for JavaEmitter {
    fn comment_line(&self) -> &'static str {
        "//"
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn generate_enums(&mut self, out: &mut Output) -> Result<(), GenerateError> {
        for e in &self.model.enums {
            let class = self.registry.class_for(&e.name);
            out.open(self.path(&format!("{}.java", class)))?;
            self.insert_template(out, "boilerplate.java")?;

            out.line(&format!("package {};\n", PACKAGE));
            if !e.docs.is_empty() {
                out.write(&javadoc(&e.docs, ""));
            }
            out.line(&format!("public enum {}\n{{", class));
            let constants: Vec<String> = e
                .values
                .iter()
                .map(|v| format!("        {} ({})", v.name, v.literal))
                .collect();
            out.write(&constants.join(",\n"));
            out.line(";");
            out.line(&format!(
                "\n        private final int _value;\n        {}(int value) {{ this._value = value; }}\n        public int value() {{ return this._value; }}\n}}",
                class
            ));
            out.close();
        }
        Ok(())
    }

    /// One JNA `Callback` interface per callback typedef.
    fn generate_callbacks(&mut self, out: &mut Output) {
        for f in &self.model.callbacks {
            out.write("\n");
            let docs = f.doc_text(0, 0);
            if !docs.is_empty() {
                out.write(&javadoc(&docs, "    "));
            }
            out.line(&format!(
                "    interface {} extends Callback\n    {{\n        {} callback({});\n    }}",
                self.registry.class_for(&f.name),
                self.registry.class_for(CallbackResult::Declared.token(&f.ty)),
                self.param_list(&f.params)
            ));
        }
    }

    fn generate_functions(&mut self, out: &mut Output) -> Result<(), GenerateError> {
        for f in &mut self.model.functions {
            f.wrapped = 1;
        }
        for f in &self.model.functions {
            let docs = f.doc_text(0, 0);
            if !docs.is_empty() {
                out.write(&javadoc(&docs, "    "));
            }
            out.line(&format!(
                "    {} {}({});\n",
                self.registry.class_for(&f.ty),
                f.name,
                self.param_list(&f.params)
            ));
        }
        Ok(())
    }

    /// One `PointerType` subclass per opaque libvlc object.
    fn generate_wrappers(&mut self, out: &mut Output) {
        for (ty, class) in self.registry.entries() {
            if ty.ends_with('*') && class.starts_with("LibVlc") {
                out.line(&format!("\n    public class {} extends PointerType\n    {{\n    }}", class));
            }
        }
    }

    fn save(&mut self) -> Result<Vec<Artifact>, GenerateError> {
        eprintln!("Generating Java code in {}...", self.path(""));
        let mut out = Output::new();
        self.generate_enums(&mut out)?;

        out.open(self.path("LibVlc.java"))?;
        self.insert_template(&mut out, "boilerplate.java")?;
        self.insert_template(&mut out, "LibVlc-header.java")?;
        self.generate_wrappers(&mut out);
        self.generate_callbacks(&mut out);
        self.generate_functions(&mut out)?;
        self.insert_template(&mut out, "LibVlc-footer.java")?;
        self.unwrapped(&mut out);
        out.close();

        out.finish()
    }
}
