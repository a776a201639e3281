use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_vlcgen")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn stdout_of(args: &[&str]) -> String {
    let assert = cmd().args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

// -- python --

#[test]
fn python_to_stdout_by_default() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.starts_with("__version__ = \"N/A\"\nbuild_date  = \""));
    assert!(out.contains("class _Enum(ctypes.c_uint):"));
    assert!(out.contains(
        "class State(_Enum):\n    '''Note the order of libvlc_state_t enum must match exactly the order of\nSee libvlc_media_player_get_state.\n    '''\n    _enum_names_ = {\n        0: 'NothingSpecial',\n        1: 'Opening',\n        2: 'Buffering',\n        3: 'Playing',\n"
    ));
    assert!(out.contains("        -1: 'Error',\n"));
    assert!(out.contains("class LogCb(ctypes.c_void_p):"));
    assert!(out.contains("    LogCb = ctypes.CFUNCTYPE(ctypes.c_void_p, ctypes.c_void_p, ctypes.c_int)"));
    assert!(out.contains("cb = CallbackDecorators"));
}

#[test]
fn python_enum_assignments_are_aligned() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.contains("State.Buffering      = State(2)\n"));
    assert!(out.contains("State.NothingSpecial = State(0)\n"));
    assert!(out.contains("AudioOutputChannel.Dolbys  = AudioOutputChannel(5)\n"));
}

#[test]
fn python_prototypes() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.contains(
        "def libvlc_media_player_play(p_mi):\n    '''Play.\n    @param p_mi: the Media Player.\n    @return: 0 if playback started (and was already started), or -1 on error.\n    '''\n    f = _Cfunctions.get('libvlc_media_player_play', None) or \\\n        _Cfunction('libvlc_media_player_play', ((1,),), None,\n                    ctypes.c_int, MediaPlayer)\n    return f(p_mi)\n"
    ));
    assert!(out.contains("_Cfunction('libvlc_new', ((1,), (1,),), class_result(Instance),\n                    ctypes.c_void_p, ctypes.c_int, ListPOINTER(ctypes.c_char_p))"));
    assert!(out.contains("_Cfunction('libvlc_media_get_mrl', ((1,),), string_result,\n                    ctypes.c_void_p, Media)"));
    assert!(out.contains("_Cfunction('libvlc_free', ((1,),), None,\n                    None, ctypes.c_void_p)"));
}

#[test]
fn python_output_parameters_leave_the_signature() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.contains("def libvlc_video_get_size(p_mi, num):"));
    assert!(out.contains("_Cfunction('libvlc_video_get_size', ((1,), (1,), (2,), (2,),), None,"));
    assert!(out.contains("    @return: px pixel width, py pixel height.\n"));
    assert!(!out.contains("@param px"));
    assert!(out.contains("    def video_get_size(self, num):\n"));
}

#[test]
fn python_direction_flags_override_the_table() {
    let fixture = fixture_path("libvlc_demo.h");
    let out = stdout_of(&[
        "--direction",
        "libvlc_video_get_size:num=inzero",
        "--direction",
        "libvlc_video_get_size:py=in",
        &fixture,
    ]);
    assert!(out.contains("def libvlc_video_get_size(p_mi, num, py):"));
    assert!(out.contains("_Cfunction('libvlc_video_get_size', ((1,), (4,), (2,), (1,),), None,"));
}

#[test]
fn malformed_direction_flag_fails() {
    cmd()
        .args(["--direction", "libvlc_video_get_size=out", fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected FUNCTION:PARAM=DIRECTION"));
}

#[test]
fn python_wrapper_classes() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.contains("class Instance(_Ctype):\n    '''N/A\n    '''"));
    assert!(out.contains("class Media(_Ctype):"));
    assert!(out.contains("class MediaPlayer(_Ctype):"));
    assert!(out.contains("    def media_new_location(self, psz_mrl):\n"));
    assert!(out.contains("return libvlc_media_new_location(self, str_to_bytes(psz_mrl))"));
    assert!(out.contains("    def get_mrl(self):\n"));
    assert!(out.contains("    def player_new_from_media(self):\n"));
    assert!(out.contains("    def play(self):\n"));
    assert!(out.contains("    def get_state(self):\n"));

    let instance = out.find("class Instance(_Ctype)").unwrap();
    let media = out.find("class Media(_Ctype)").unwrap();
    let player = out.find("class MediaPlayer(_Ctype)").unwrap();
    assert!(instance < media && media < player);
}

#[test]
fn python_audit_comments() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h")]);
    assert!(out.contains("\n# 1 function(s) blacklisted:\n#  libvlc_printerr (char*)\n"));
    assert!(out.contains("\n# 2 function(s) not wrapped as methods:\n#  libvlc_free\n#  libvlc_new\n"));
    assert!(!out.contains("def libvlc_printerr"));
}

#[test]
fn python_output_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("vlc.py");
    cmd()
        .args([fixture_path("libvlc_demo.h").as_str(), "-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("def libvlc_media_player_play(p_mi):"));
}

#[test]
fn python_templates_and_overrides() {
    let out = stdout_of(&[&fixture_path("libvlc_demo.h"), "-T", &fixture_path("templates"), "-v", "3.0.18"]);
    assert!(out.starts_with("#! /usr/bin/python\n"));
    assert!(out.contains("import ctypes\n\n__version__ = \"3.0.18\"\nbuild_date  = \""));
    assert!(!out.contains("# GENERATED_ENUMS"));
    let enums = out.find("class _Enum(ctypes.c_uint)").unwrap();
    let ctype = out.find("class _Ctype(object)").unwrap();
    assert!(ctype < enums);

    assert!(out.contains("class Instance(_Ctype):\n    '''Create a new Instance instance."));
    assert!(out.contains("    def __new__(cls, *args):"));
    assert!(!out.contains("    def media_new_location(self, psz_mrl):"));
    assert_eq!(out.matches("def __new__(cls, ptr=_internal_guard)").count(), 2);
    assert!(out.contains("class MediaPlayer(_Ctype):\n    '''Create a new MediaPlayer instance."));
    assert!(out.trim_end().ends_with("return 0"));
    assert!(out.contains("# Start of footer.py #"));
}

#[test]
fn explicit_override_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("extra.py");
    fs::write(&path, "class Media:\n    '''Hand-written media.'''\n    def get_mrl(self):\n        return 'x'\n").unwrap();
    let out = stdout_of(&[&fixture_path("libvlc_demo.h"), "--override", path.to_str().unwrap()]);
    assert!(out.contains("class Media(_Ctype):\n    '''Hand-written media.\n    '''"));
    assert_eq!(out.matches("    def get_mrl(self):").count(), 1);
}

#[test]
fn output_is_deterministic() {
    let strip = |text: String| -> String {
        text.lines()
            .filter(|l| !l.starts_with("build_date"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let first = strip(stdout_of(&[&fixture_path("libvlc_demo.h")]));
    let second = strip(stdout_of(&[&fixture_path("libvlc_demo.h")]));
    assert_eq!(first, second);
}

#[test]
fn version_from_path() {
    let dir = TempDir::new().unwrap();
    let include = dir.path().join("vlc-3.0.18").join("include");
    fs::create_dir_all(&include).unwrap();
    fs::copy(fixture_path("libvlc_demo.h"), include.join("libvlc_demo.h")).unwrap();
    let out = stdout_of(&[include.to_str().unwrap()]);
    assert!(out.starts_with("__version__ = \"vlc-3.0.18\"\n"));
    assert!(out.lines().nth(1).unwrap().ends_with(" vlc-3.0.18\""));
}

// -- java --

#[test]
fn java_writes_one_file_per_enum() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("internal");
    cmd()
        .args(["-t", "java", "-o", out.to_str().unwrap(), fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Generating Java code in"));

    let state = fs::read_to_string(out.join("State.java")).unwrap();
    assert!(state.starts_with("package org.videolan.jvlc.internal;\n"));
    assert!(state.contains("public enum State\n{\n        NothingSpecial (0),\n"));
    assert!(state.contains("        Error (7);\n"));

    let channel = fs::read_to_string(out.join("AudioOutputChannel.java")).unwrap();
    assert!(channel.contains("        Error (-1),\n        Stereo (1),\n"));

    let libvlc = fs::read_to_string(out.join("LibVlc.java")).unwrap();
    assert!(libvlc.contains("    public class LibVlcInstance extends PointerType\n"));
    assert!(libvlc.contains(
        "    interface LogCb extends Callback\n    {\n        void callback(Pointer data, int level);\n    }\n"
    ));
    let callbacks = libvlc.find("interface LogCb").unwrap();
    let functions = libvlc.find("libvlc_media_player_get_state(").unwrap();
    assert!(callbacks < functions);
    assert!(libvlc.contains("    State libvlc_media_player_get_state(LibVlcMediaPlayer p_mi);\n"));
    assert!(libvlc.contains(
        "    LibVlcInstance libvlc_new(int argc, String[] argv);\n"
    ));
    assert!(libvlc.contains(
        "    int libvlc_video_get_size(LibVlcMediaPlayer p_mi, int num, Pointer px, Pointer py);\n"
    ));
    assert!(libvlc.ends_with("\n// 1 function(s) blacklisted:\n//  libvlc_printerr (char*)\n"));
}

// -- diagnostics --

#[test]
fn unresolved_types_fail_before_generation() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("vlc.py");
    cmd()
        .args([fixture_path("libvlc_unresolved.h").as_str(), "-o", output.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Error: no type conversion for size_t size in libvlc_media_player_set_buffer",
        ))
        .stderr(predicate::str::contains(
            "Error: no type conversion for timeval libvlc_media_player_get_timeval",
        ))
        .stderr(predicate::str::contains("2 type conversion(s) missing... exit(2)"));
    assert!(!output.exists());
}

#[test]
fn check_mode_reports_defects() {
    cmd()
        .args(["--check", fixture_path("libvlc_undocumented.h").as_str()])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Error: no comment for typedef enum libvlc_meta_t"))
        .stderr(predicate::str::contains(
            "Error: doc parameters (2) mismatch for function libvlc_media_player_stop (1)",
        ))
        .stderr(predicate::str::contains("Error: no comment for function libvlc_media_player_is_playing"))
        .stderr(predicate::str::contains("missing-documentation: 2"))
        .stderr(predicate::str::contains("param-count-mismatch: 1"))
        .stderr(predicate::str::contains("3 error(s) reported... exit(3)"));
}

#[test]
fn check_mode_clean_header() {
    cmd()
        .args(["-c", fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn debug_mode_dumps_declarations() {
    cmd()
        .args(["-d", fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("==== enums ===="))
        .stderr(predicate::str::contains("    px (unsigned*) [OUT]"))
        .stderr(predicate::str::contains("==== type2class ===="))
        .stderr(predicate::str::contains("    libvlc_state_t: State"))
        .stderr(predicate::str::contains(format!(
            "\n==== source ==== {}:109\nLIBVLC_API int libvlc_media_player_play ( libvlc_media_player_t *p_mi );\n\"\"\"",
            fixture_path("libvlc_demo.h")
        )));
}

#[test]
fn source_trace_only_in_debug_mode() {
    cmd()
        .args(["-c", fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .success()
        .stderr(predicate::str::contains("==== source ====").not());
}

// -- command line --

#[test]
fn no_files_prints_help() {
    cmd()
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn unknown_target_fails() {
    cmd()
        .args(["-t", "cobol", fixture_path("libvlc_demo.h").as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target: cobol"));
}

#[test]
fn unmatched_glob_warns() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.h", dir.path().display());
    cmd()
        .arg(&pattern)
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("warning: no headers found: {}", pattern)));
}
