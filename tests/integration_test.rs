//! 統合テスト
//!
//! ドライバを通したファイル単位のコンパイル、成果物の出力、
//! バッチ処理時のエラー、リンクから実行までを検証する。
//! リンクを伴うテストは clang が利用できる環境でのみ実行する。

use octalang::driver::{Driver, DriverOptions, EmitKind, Mode};
use octalang::error::{LinkError, OctaError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const ENTRANCE: &str = "block entrance()\n  var a = 1\n  var b = 2\n  print(a)\n  print(b)\n";
const REASSIGN: &str = "block again()\n  var a = 5\n  a = 9\n  print(a)\n";

/// 一時ディレクトリにソースファイルを書き出すヘルパー関数
fn write_source(dir: &TempDir, name: &str, source: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path
}

fn compile_only(emit: EmitKind) -> DriverOptions {
    DriverOptions {
        mode: Mode::CompileOnly,
        emit,
        ..DriverOptions::default()
    }
}

/// clang が利用可能かどうか
fn linker_available() -> bool {
    Command::new("clang")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn run_executable(path: &Path) -> (i32, String) {
    let output = Command::new(path).output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

#[test]
fn test_emit_trace_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);

    let outcome = Driver::new(compile_only(EmitKind::Trace)).run(&[input]).unwrap();
    let artifact = dir.path().join("entrance.trace");
    assert_eq!(outcome.artifacts, vec![artifact.clone()]);
    assert_eq!(outcome.executable, None);

    let listing = fs::read_to_string(artifact).unwrap();
    assert!(listing.contains("define external i32 @entrance() {"));
    assert_eq!(listing.matches("call print_int").count(), 2);
}

#[test]
fn test_emit_llvm_ir_with_output_override() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "again.octa", REASSIGN);
    let output = dir.path().join("custom.ll");

    let options = DriverOptions {
        output: Some(output.clone()),
        ..compile_only(EmitKind::LlvmIr)
    };
    Driver::new(options).run(&[input]).unwrap();

    let ir = fs::read_to_string(&output).unwrap();
    assert!(ir.contains("define i32 @again()"));
    assert!(ir.contains("store i32 9"));
    assert!(!dir.path().join("again.ll").exists());
}

#[test]
fn test_emit_bitcode_and_object() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);

    Driver::new(compile_only(EmitKind::Bitcode)).run(&[input.clone()]).unwrap();
    let bitcode = fs::read(dir.path().join("entrance.bc")).unwrap();
    assert_eq!(&bitcode[..4], b"BC\xC0\xDE");

    Driver::new(compile_only(EmitKind::Obj)).run(&[input]).unwrap();
    let object = fs::metadata(dir.path().join("entrance.o")).unwrap();
    assert!(object.len() > 0);
}

#[test]
fn test_batch_attempts_every_file() {
    let dir = TempDir::new().unwrap();
    let good = write_source(&dir, "good.octa", ENTRANCE);
    let bad = write_source(&dir, "bad.octa", "block bad()\nprint(x)\n");
    let also_good = write_source(&dir, "also.octa", REASSIGN);

    let err = Driver::new(compile_only(EmitKind::Trace))
        .run(&[good, bad, also_good])
        .unwrap_err();
    assert!(matches!(err, OctaError::Failed { failed: 1, total: 3 }));

    assert!(dir.path().join("good.trace").exists());
    assert!(dir.path().join("also.trace").exists());
    assert!(!dir.path().join("bad.trace").exists());
}

#[test]
fn test_failed_file_leaves_no_artifact() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "dup.octa", "block dup()\nvar a = 1\nvar a = 2\n");
    let stale = dir.path().join("dup.ll");
    fs::write(&stale, "stale").unwrap();

    let err = Driver::new(compile_only(EmitKind::LlvmIr)).run(&[input]).unwrap_err();
    assert!(matches!(err, OctaError::Failed { failed: 1, total: 1 }));
    assert!(!stale.exists());
}

#[test]
fn test_missing_input_counts_as_failure() {
    let dir = TempDir::new().unwrap();
    let err = Driver::new(compile_only(EmitKind::Trace))
        .run(&[dir.path().join("missing.octa")])
        .unwrap_err();
    assert!(matches!(err, OctaError::Failed { failed: 1, total: 1 }));
}

#[test]
fn test_nothing_is_linked_when_a_file_fails() {
    let dir = TempDir::new().unwrap();
    let bad = write_source(&dir, "bad.octa", "block bad()\nx = 1\n");
    let options = DriverOptions {
        linker: "octa-no-such-linker".to_string(),
        ..DriverOptions::default()
    };
    // a link attempt would surface as ToolUnavailable
    let err = Driver::new(options).run(&[bad]).unwrap_err();
    assert!(matches!(err, OctaError::Failed { failed: 1, total: 1 }));
    assert!(!dir.path().join("bad").exists());
}

#[test]
fn test_missing_linker() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    let options = DriverOptions {
        linker: "octa-no-such-linker".to_string(),
        ..DriverOptions::default()
    };
    let err = Driver::new(options).run(&[input]).unwrap_err();
    assert!(matches!(err, OctaError::Link(LinkError::ToolUnavailable { .. })));
}

#[test]
fn test_keep_temps() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    let root = dir.path().join("scratch");
    fs::create_dir(&root).unwrap();
    let options = DriverOptions {
        linker: "octa-no-such-linker".to_string(),
        keep_temps: true,
        scratch_root: Some(root.clone()),
        ..DriverOptions::default()
    };
    assert!(Driver::new(options).run(&[input]).is_err());
    // the scratch directory is kept even though linking failed
    let kept: Vec<_> = fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(kept.len(), 1);
    let scratch = &kept[0];
    assert!(scratch.file_name().unwrap().to_string_lossy().starts_with("octa-"));
    assert!(scratch.join("0-entrance.o").exists());
    assert!(scratch.join("main_wrapper.c").exists());
}

#[test]
fn test_scratch_is_removed_without_keep_temps() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    let root = dir.path().join("scratch");
    fs::create_dir(&root).unwrap();
    let options = DriverOptions {
        linker: "octa-no-such-linker".to_string(),
        scratch_root: Some(root.clone()),
        ..DriverOptions::default()
    };
    assert!(Driver::new(options).run(&[input]).is_err());
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn test_executable_without_extension_would_replace_input() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "prog", ENTRANCE);

    let err = Driver::new(DriverOptions::default()).run(&[input.clone()]).unwrap_err();
    assert!(matches!(err, OctaError::Usage(_)), "{:?}", err);
    assert_eq!(fs::read_to_string(&input).unwrap(), ENTRANCE);
}

#[test]
fn test_compile_only_output_equal_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    let options = DriverOptions {
        output: Some(input.clone()),
        ..compile_only(EmitKind::Obj)
    };

    let err = Driver::new(options).run(&[input.clone()]).unwrap_err();
    assert!(matches!(err, OctaError::Usage(_)), "{:?}", err);
    assert_eq!(fs::read_to_string(&input).unwrap(), ENTRANCE);
}

#[test]
fn test_artifact_extension_matching_input_is_refused() {
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.trace", ENTRANCE);
    let other = write_source(&dir, "again.octa", REASSIGN);

    // nothing in the batch is compiled
    let err = Driver::new(compile_only(EmitKind::Trace))
        .run(&[other, input.clone()])
        .unwrap_err();
    assert!(matches!(err, OctaError::Usage(_)), "{:?}", err);
    assert_eq!(fs::read_to_string(&input).unwrap(), ENTRANCE);
    assert!(!dir.path().join("again.trace").exists());
}

#[test]
fn test_link_only_output_equal_to_object() {
    let dir = TempDir::new().unwrap();
    let object = dir.path().join("entrance.o");
    fs::write(&object, b"object").unwrap();
    let options = DriverOptions {
        mode: Mode::LinkOnly,
        output: Some(object.clone()),
        ..DriverOptions::default()
    };

    let err = Driver::new(options).run(&[object.clone()]).unwrap_err();
    assert!(matches!(err, OctaError::Usage(_)), "{:?}", err);
    assert_eq!(fs::read(&object).unwrap(), b"object");
}

#[test]
fn test_compile_and_run() {
    if !linker_available() {
        eprintln!("skipping: clang not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);

    let outcome = Driver::new(DriverOptions::default()).run(&[input]).unwrap();
    let executable = outcome.executable.unwrap();
    assert_eq!(executable, dir.path().join("entrance"));
    assert_eq!(run_executable(&executable), (0, "1\n2\n".to_string()));
}

#[test]
fn test_separate_compile_then_link() {
    if !linker_available() {
        eprintln!("skipping: clang not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let first = write_source(&dir, "entrance.octa", ENTRANCE);
    let second = write_source(&dir, "again.octa", REASSIGN);
    Driver::new(compile_only(EmitKind::Obj))
        .run(&[first, second])
        .unwrap();

    let output = dir.path().join("prog");
    let options = DriverOptions {
        mode: Mode::LinkOnly,
        output: Some(output.clone()),
        entry: Some("again".to_string()),
        ..DriverOptions::default()
    };
    Driver::new(options)
        .run(&[dir.path().join("entrance.o"), dir.path().join("again.o")])
        .unwrap();
    assert_eq!(run_executable(&output), (0, "9\n".to_string()));
}

#[test]
fn test_link_only_defaults_to_entrance() {
    if !linker_available() {
        eprintln!("skipping: clang not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    Driver::new(compile_only(EmitKind::Obj)).run(&[input]).unwrap();

    let options = DriverOptions {
        mode: Mode::LinkOnly,
        ..DriverOptions::default()
    };
    let outcome = Driver::new(options)
        .run(&[dir.path().join("entrance.o")])
        .unwrap();
    let executable = outcome.executable.unwrap();
    assert_eq!(run_executable(&executable), (0, "1\n2\n".to_string()));
}

#[test]
fn test_undefined_entry_fails_to_link() {
    if !linker_available() {
        eprintln!("skipping: clang not available");
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = write_source(&dir, "entrance.octa", ENTRANCE);
    let options = DriverOptions {
        entry: Some("nowhere".to_string()),
        ..DriverOptions::default()
    };
    let err = Driver::new(options).run(&[input]).unwrap_err();
    match err {
        OctaError::Link(LinkError::ToolFailed { tool, stderr, .. }) => {
            assert_eq!(tool, "clang");
            assert!(stderr.contains("nowhere"), "{}", stderr);
        }
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}
