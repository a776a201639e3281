//! Python ctypes emitter.
//!
//! Produces a single module: the header template with the enum and callback
//! classes inserted, one wrapper class per opaque libvlc object, one ctypes
//! prototype per function, the audit comments and the footer template.

use super::{insert_code, version_markers, Artifact, EmitConfig, Emitter, Output, NA, STDOUT};
use crate::classify::{assign_directions, CallbackResult, TypeRegistry};
use crate::diagnostics::Diagnostics;
use crate::docs::{self, EPYDOC};
use crate::error::GenerateError;
use crate::model::{Function, Model};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"libvlc_(.+?)(_t)?$").unwrap());

static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\slibvlc_[a-z_]+").unwrap());

// -- Tables -------------------------------------------------------------------

/// C type → ctypes expression. Enum and callback classes are added per model.
const TYPE_TABLE: &[(&str, &str)] = &[
    ("libvlc_audio_output_t*", "ctypes.POINTER(AudioOutput)"),
    ("libvlc_event_t*", "ctypes.c_void_p"),
    ("libvlc_drawable_t", "ctypes.c_uint"),
    ("libvlc_event_type_t", "ctypes.c_uint"),
    ("libvlc_event_manager_t*", "EventManager"),
    ("libvlc_instance_t*", "Instance"),
    ("libvlc_log_t*", "Log_ptr"),
    ("libvlc_log_iterator_t*", "LogIterator"),
    ("libvlc_log_subscriber_t*", "ctypes.c_void_p"),
    ("libvlc_log_message_t*", "ctypes.POINTER(LogMessage)"),
    ("libvlc_media_track_t**", "ctypes.POINTER(MediaTrack)"),
    ("libvlc_media_track_t***", "ctypes.POINTER(ctypes.POINTER(MediaTrack))"),
    ("libvlc_media_t*", "Media"),
    ("libvlc_media_discoverer_t*", "MediaDiscoverer"),
    ("libvlc_media_library_t*", "MediaLibrary"),
    ("libvlc_media_list_t*", "MediaList"),
    ("libvlc_media_list_player_t*", "MediaListPlayer"),
    ("libvlc_media_list_view_t*", "MediaListView"),
    ("libvlc_media_player_t*", "MediaPlayer"),
    ("libvlc_media_stats_t*", "ctypes.POINTER(MediaStats)"),
    ("libvlc_media_track_info_t**", "ctypes.POINTER(ctypes.c_void_p)"),
    ("libvlc_rectangle_t*", "ctypes.POINTER(Rectangle)"),
    ("libvlc_time_t", "ctypes.c_longlong"),
    ("libvlc_track_description_t*", "ctypes.POINTER(TrackDescription)"),
    ("libvlc_module_description_t*", "ctypes.POINTER(ModuleDescription)"),
    ("libvlc_audio_output_device_t*", "ctypes.POINTER(AudioOutputDevice)"),
    ("FILE*", "FILE_ptr"),
    ("...", "ctypes.c_void_p"),
    ("va_list", "ctypes.c_void_p"),
    ("char*", "ctypes.c_char_p"),
    ("bool", "ctypes.c_bool"),
    ("char**", "ListPOINTER(ctypes.c_char_p)"),
    ("float", "ctypes.c_float"),
    ("int", "ctypes.c_int"),
    ("int*", "ctypes.POINTER(ctypes.c_int)"),
    ("uintptr_t*", "ctypes.POINTER(ctypes.c_uint)"),
    ("int64_t", "ctypes.c_int64"),
    ("short", "ctypes.c_short"),
    ("uint32_t", "ctypes.c_uint32"),
    ("unsigned", "ctypes.c_uint"),
    ("unsigned*", "ctypes.POINTER(ctypes.c_uint)"),
    ("void", "None"),
    ("void*", "ctypes.c_void_p"),
    ("void**", "ListPOINTER(ctypes.c_void_p)"),
    ("WINDOWHANDLE", "ctypes.c_ulong"),
];

/// Classes that get generated methods.
const DEFINED_CLASSES: &[&str] = &[
    "EventManager",
    "Instance",
    "Log",
    "LogIterator",
    "Media",
    "MediaDiscoverer",
    "MediaLibrary",
    "MediaList",
    "MediaListPlayer",
    "MediaListView",
    "MediaPlayer",
];

/// Functions returning a string the caller must free.
const FREE_STRING_FUNCS: &[&str] = &[
    "libvlc_media_discoverer_localized_name",
    "libvlc_media_get_mrl",
    "libvlc_media_get_meta",
    "libvlc_video_get_aspect_ratio",
    "libvlc_video_get_crop_geometry",
    "libvlc_video_get_marquee_string",
    "libvlc_audio_output_device_longname",
    "libvlc_audio_output_device_id",
    "libvlc_vlm_show_media",
];

/// Enum with a hand-picked class name.
const EVENT_ENUM: (&str, &str) = ("libvlc_event_e", "EventType");

const ENUM_BASE: &str = "
class _Enum(ctypes.c_uint):
    '''(INTERNAL) Base class
    '''
    _enum_names_ = {}

    def __str__(self):
        n = self._enum_names_.get(self.value, '') or ('FIXME_(%r)' % (self.value,))
        return '.'.join((self.__class__.__name__, n))

    def __repr__(self):
        return '.'.join((self.__class__.__module__, self.__str__()))

    def __eq__(self, other):
        return ( (isinstance(other, _Enum) and self.value == other.value)
              or (isinstance(other, _Ints) and self.value == other) )

    def __ne__(self, other):
        return not self.__eq__(other)
";

const DEFAULT_CONSTRUCTOR: &str = "
    def __new__(cls, ptr=_internal_guard):
        '''(INTERNAL) ctypes wrapper constructor.
        '''
        return _Constructor(cls, ptr)";

fn is_defined_class(class: &str) -> bool {
    DEFINED_CLASSES.contains(&class)
}

pub struct PythonEmitter {
    model: Model,
    registry: TypeRegistry,
    /// Documentation link targets by C name.
    links: BTreeMap<String, String>,
    /// Method name prefix by wrapper class.
    prefixes: BTreeMap<String, String>,
    config: EmitConfig,
}

impl PythonEmitter {
    pub fn new(mut model: Model, config: EmitConfig, diag: &mut Diagnostics) -> Self {
        let mut registry = TypeRegistry::seed(TYPE_TABLE);
        registry.register_declarations(&model, &RE_TYPE);
        registry.register(EVENT_ENUM.0, EVENT_ENUM.1);

        let mut links = BTreeMap::from([(EVENT_ENUM.0.to_string(), EVENT_ENUM.1.to_string())]);
        let mut prefixes = BTreeMap::new();
        for (ty, class) in registry.entries() {
            let ty = ty.trim_end_matches('*');
            if is_defined_class(class) {
                links.insert(ty.to_string(), class.to_string());
                // libvlc_media_player_t → libvlc_media_player_
                let prefix = &ty[..ty.len().saturating_sub(1)];
                prefixes.insert(class.to_string(), prefix.to_string());
            } else if let Some(inner) = class.strip_prefix("ctypes.POINTER(") {
                let inner = inner.trim_end_matches(')');
                if inner.starts_with(|c: char| c.is_uppercase()) {
                    links.insert(ty.to_string(), inner.to_string());
                }
            }
        }

        docs::transform_all(&mut model.functions, &EPYDOC);
        assign_directions(&mut model.functions, &config.directions);
        for f in &model.functions {
            links.insert(f.name.clone(), f.name.clone());
        }
        registry.check(&model, Some(CallbackResult::Pointer), diag);

        PythonEmitter {
            model,
            registry,
            links,
            prefixes,
            config,
        }
    }

    /// Rewrite known `libvlc_` names in `docs` as `L{...}` links.
    fn epylink(&self, docs: &str, prefix: Option<&str>) -> String {
        if self.links.is_empty() {
            return docs.to_string();
        }
        RE_LINK
            .replace_all(docs, |caps: &Captures| {
                let text = &caps[0];
                let name = text.trim();
                match self.links.get(name) {
                    Some(target) => {
                        let target = match prefix {
                            Some(prefix) => strip_prefix(target, prefix),
                            None => target.clone(),
                        };
                        text.replace(name, &format!("L{{{}}}", target))
                    }
                    None => text.to_string(),
                }
            })
            .into_owned()
    }

    fn class_doc(&self, class: &str) -> String {
        self.config
            .overrides
            .get(class)
            .and_then(|o| o.doc.clone())
            .filter(|doc| !doc.is_empty())
            .unwrap_or_else(|| NA.to_string())
    }

    fn wrapper_class_header(&self, out: &mut Output, class: &str) {
        out.line(&format!("class {}(_Ctype):\n    '''{}\n    '''", class, self.class_doc(class)));
        let code = self
            .config
            .overrides
            .get(class)
            .map(|o| o.code.as_str())
            .unwrap_or_default();
        if !code.contains("def __new__") {
            out.line(DEFAULT_CONSTRUCTOR);
        }
        if !code.is_empty() {
            out.line(code);
        }
    }

    /// Emit one method wrapping `f`, plus the sequence protocol helpers
    /// implied by its name.
    fn wrapper_method(&self, out: &mut Output, f: &Function, meth: &str, prefix: &str) {
        let args = std::iter::once("self")
            .chain(f.args(1))
            .collect::<Vec<_>>()
            .join(", ");
        let wrapped_args = std::iter::once("self".to_string())
            .chain(f.in_params(1).map(|p| {
                if p.ty == "char*" {
                    format!("str_to_bytes({})", p.name)
                } else {
                    p.name.clone()
                }
            }))
            .collect::<Vec<_>>()
            .join(", ");
        let docs = self.epylink(&f.doc_text(1, 8), Some(prefix));

        out.line(&format!(
            "    def {meth}({args}):\n        '''{docs}\n        '''\n        return {name}({wrapped_args})\n",
            name = f.name
        ));

        if meth == "count" {
            out.line(&format!("    def __len__(self):\n        return {}(self)\n", f.name));
        } else if meth.ends_with("item_at_index") {
            out.line(&format!(
                "    def __getitem__(self, i):\n        return {}(self, i)\n\n    def __iter__(self):\n        for i in range(len(self)):\n            yield self[i]\n",
                f.name
            ));
        }
    }
}

/// Method name for `name` in a class whose functions start with `prefix`.
fn strip_prefix(name: &str, prefix: &str) -> String {
    name.replace(prefix, "").replace("libvlc_", "")
}

impl Emitter for PythonEmitter {
    fn comment_line(&self) -> &'static str {
        "#"
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn generate_enums(&mut self, out: &mut Output) -> Result<(), GenerateError> {
        out.line(ENUM_BASE);
        for e in &self.model.enums {
            let class = self.registry.class_for(&e.name);
            let docs = e.docs.replace("@see", "See").replace("\\see", "See");
            let docs = if docs.is_empty() { NA.to_string() } else { docs };
            out.line(&format!(
                "class {}(_Enum):\n    '''{}\n    '''\n    _enum_names_ = {{",
                class, docs
            ));
            for v in &e.values {
                out.line(&format!("        {}: '{}',", v.literal, v.name));
            }
            out.line("    }");

            let width = e.values.iter().map(|v| v.name.len()).max().unwrap_or(0);
            let mut assignments: Vec<String> = e
                .values
                .iter()
                .map(|v| format!("{}.{:<width$} = {}({})", class, v.name, class, v.literal))
                .collect();
            assignments.sort();
            out.write(&assignments.join("\n"));
            out.write("\n\n");
        }
        Ok(())
    }

    fn generate_callbacks(&mut self, out: &mut Output) {
        if self.model.callbacks.is_empty() {
            return;
        }
        for f in &self.model.callbacks {
            out.line(&format!(
                "class {}(ctypes.c_void_p):\n    \"\"\"{}\n    \"\"\"\n    pass",
                self.registry.class_for(&f.name),
                self.epylink(&f.raw_docs, None)
            ));
        }

        out.line("class CallbackDecorators(object):");
        out.line("    \"Class holding various method decorators for callback functions.\"");
        for f in &self.model.callbacks {
            let name = self.registry.class_for(&f.name);
            // CFUNCTYPE cannot return void**
            let result = CallbackResult::Pointer.token(&f.ty);
            let types = std::iter::once(self.registry.class_for(result))
                .chain(f.params.iter().map(|p| self.registry.class_for(&p.ty)))
                .collect::<Vec<_>>()
                .join(", ");
            out.line(&format!(
                "    {name} = ctypes.CFUNCTYPE({types})\n    {name}.__doc__ = '''{docs}\n    ''' ",
                docs = self.epylink(&f.raw_docs, None)
            ));
        }
        out.line("cb = CallbackDecorators");
    }

    fn generate_functions(&mut self, out: &mut Output) -> Result<(), GenerateError> {
        out.line("\n # LibVLC __version__ functions #\n");
        for f in &self.model.functions {
            let args = f.args(0).join(", ");
            let mut flags = f
                .params
                .iter()
                .map(|p| format!("({},)", p.direction.flag()))
                .collect::<Vec<_>>()
                .join(", ");
            if !flags.is_empty() {
                flags.push(',');
            }

            let mut types: Vec<String> = f.params.iter().map(|p| self.registry.class_for(&p.ty)).collect();
            let rtype = self.registry.class_for(&f.ty);
            let errcheck = if FREE_STRING_FUNCS.contains(&f.name.as_str()) {
                if rtype != "ctypes.c_char_p" {
                    return Err(GenerateError::ExpectedReturnMismatch {
                        name: f.name.clone(),
                        found: f.ty.clone(),
                    });
                }
                types.insert(0, "ctypes.c_void_p".to_string());
                "string_result".to_string()
            } else if is_defined_class(&rtype) {
                types.insert(0, "ctypes.c_void_p".to_string());
                format!("class_result({})", rtype)
            } else {
                types.insert(0, rtype);
                "None".to_string()
            };

            let docs = self.epylink(&f.doc_text(0, 4), None);
            out.line(&format!(
                "def {name}({args}):\n    '''{docs}\n    '''\n    f = _Cfunctions.get('{name}', None) or \\\n        _Cfunction('{name}', ({flags}), {errcheck},\n                    {types})\n    return f({args})\n",
                name = f.name,
                types = types.join(", ")
            ));
        }
        Ok(())
    }

    fn generate_wrappers(&mut self, out: &mut Output) {
        let mut grouped: Vec<(String, usize)> = self
            .model
            .functions
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let class = self.registry.class_for(&f.params.first()?.ty);
                is_defined_class(&class).then_some((class, i))
            })
            .collect();
        // stable: functions keep header order within a class
        grouped.sort_by(|a, b| a.0.cmp(&b.0));

        let mut current = String::new();
        let mut prefix = "libvlc_".to_string();
        for (class, i) in grouped {
            if class != current {
                self.wrapper_class_header(out, &class);
                prefix = self
                    .prefixes
                    .get(&class)
                    .cloned()
                    .unwrap_or_else(|| "libvlc_".to_string());
                current = class;
            }

            self.model.functions[i].wrapped += 1;
            let f = &self.model.functions[i];
            let meth = strip_prefix(&f.name, &prefix);
            let overridden = self
                .config
                .overrides
                .get(&current)
                .is_some_and(|o| o.defines(&meth));
            if overridden {
                continue;
            }
            self.wrapper_method(out, f, &meth, &prefix);
        }
    }

    fn save(&mut self) -> Result<Vec<Artifact>, GenerateError> {
        let mut out = Output::new();
        let path = self.config.output.clone().unwrap_or_else(|| STDOUT.to_string());
        out.open(path)?;

        let header = self.config.templates.read("header.py")?;
        let version = self.model.version.clone();
        let build_date = self.config.build_date.clone();
        if header.is_empty() {
            for marker in version_markers(&version, &build_date) {
                out.line(&marker);
            }
            self.generate_enums(&mut out)?;
            self.generate_callbacks(&mut out);
        } else {
            insert_code(&mut out, &header, &version, &build_date, |out| {
                self.generate_enums(out)?;
                self.generate_callbacks(out);
                Ok(())
            })?;
        }

        self.generate_wrappers(&mut out);
        self.generate_functions(&mut out)?;
        self.unwrapped(&mut out);

        let footer = self.config.templates.read("footer.py")?;
        insert_code(&mut out, &footer, &version, &build_date, |_| Ok(()))?;
        out.close();
        out.finish()
    }

    fn dump_dicts(&self) {
        let version = &self.model.version;
        let registry = self.registry.entries().map(|(t, c)| (t.to_string(), c.to_string()));
        let prefixes = self.prefixes.clone().into_iter();
        let links = self.links.clone().into_iter();
        for (title, entries) in [
            ("type2class", registry.collect::<Vec<_>>()),
            ("prefixes", prefixes.collect()),
            ("links", links.collect()),
        ] {
            eprintln!("\n==== {} ==== {}", title, version);
            for (key, value) in entries {
                eprintln!("    {}: {}", key, value);
            }
        }
    }
}
