//! Runs the real process-spawning [`DolphinTool`] invoker against a shell
//! script that mimics DolphinTool's command line and output.
//!
//! Unix only: the stand-in is a `/bin/sh` script.

#![cfg(unix)]

use iso2rvz::{
    run_batch, AssumeYes, BatchConfig, BatchError, BlockSize, CompressionFormat, DolphinTool,
    JobStatus, RunContext, ToolInvoker, TrashDirectory,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

// Images whose name contains "bad" fail to convert; "corrupt" fail to verify.
const FAKE_TOOL: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.log"
cmd="$1"; shift
input=""; output=""
for arg in "$@"; do
  case "$arg" in
    --input=*) input="${arg#--input=}" ;;
    --output=*) output="${arg#--output=}" ;;
  esac
done
case "$cmd" in
  convert)
    case "$input" in
      *bad*) printf 'partial' > "$output"; echo "Error: Failed to read from the input file" >&2; exit 1 ;;
    esac
    cp "$input" "$output"
    echo "Conversion complete"
    ;;
  verify)
    case "$input" in
      *corrupt*) echo "Problems Found: Yes" ;;
      *) echo "Problems Found: No" ;;
    esac
    echo "SHA-1: 0000"
    ;;
  *) echo "unknown command $cmd" >&2; exit 2 ;;
esac
"#;

fn install_fake_tool(dir: &Path) -> PathBuf {
    let path = dir.join("DolphinTool");
    fs::write(&path, FAKE_TOOL).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn converts_verifies_and_trashes_through_a_real_process() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("bin");
    let games = tmp.path().join("games");
    fs::create_dir_all(&bin).unwrap();
    fs::create_dir_all(&games).unwrap();
    let tool_path = install_fake_tool(&bin);

    fs::write(games.join("good.iso"), b"disc one").unwrap();
    fs::write(games.join("bad.iso"), b"disc two").unwrap();
    fs::write(games.join("corrupt.iso"), b"disc three").unwrap();

    let config = BatchConfig::builder(&games, &tool_path)
        .trash_on_success(true)
        .compression(CompressionFormat::Lzma2)
        .level(9)
        .block_size(BlockSize::from_kib(2048))
        .build()
        .unwrap();
    let tool = DolphinTool::from_config(&config);
    let trash = TrashDirectory::new(tmp.path().join("trash"));

    let report = run_batch(&RunContext::new(&config, &tool, &AssumeYes, &trash)).unwrap();

    let by_name = |name: &str| {
        report
            .jobs
            .iter()
            .find(|j| j.source.file_name().unwrap() == name)
            .unwrap()
    };
    assert_eq!(by_name("good.iso").status, JobStatus::Converted);
    assert_eq!(by_name("bad.iso").status, JobStatus::ConversionFailed);
    assert_eq!(by_name("corrupt.iso").status, JobStatus::VerificationFailed);

    // Verified: source trashed, output kept with the converted bytes.
    assert!(!games.join("good.iso").exists());
    assert_eq!(fs::read(games.join("good.rvz")).unwrap(), b"disc one");
    assert!(trash.dir().join("good.iso").exists());

    // Failed: sources kept, outputs discarded.
    assert!(games.join("bad.iso").exists());
    assert!(games.join("corrupt.iso").exists());
    assert!(!games.join("bad.rvz").exists());
    assert!(!games.join("corrupt.rvz").exists());

    let bad_error = by_name("bad.iso").errors[0].to_string();
    assert!(bad_error.contains("Failed to read from the input file"), "got: {bad_error}");

    let calls = fs::read_to_string(bin.join("calls.log")).unwrap();
    let good_convert = format!(
        "convert --format=rvz --input={} --output={} --block_size=2097152 --compression=lzma2 --compression_level=9",
        games.join("good.iso").display(),
        games.join("good.rvz").display(),
    );
    assert!(calls.lines().any(|l| l == good_convert), "calls:\n{calls}");
    assert!(!calls.contains(&format!("verify --input={}", games.join("bad.rvz").display())));
}

#[test]
fn non_executable_tool_is_a_spawn_error() {
    let tmp = tempfile::tempdir().unwrap();
    let tool_path = tmp.path().join("DolphinTool");
    fs::write(&tool_path, FAKE_TOOL).unwrap();
    fs::set_permissions(&tool_path, fs::Permissions::from_mode(0o644)).unwrap();

    let err = DolphinTool::new(&tool_path)
        .verify(&tmp.path().join("x.rvz"))
        .unwrap_err();
    assert!(matches!(err, BatchError::Spawn { .. }), "got: {err:?}");
}

#[test]
fn missing_tool_is_reported_by_path() {
    let tmp = tempfile::tempdir().unwrap();
    let tool_path = tmp.path().join("DolphinTool");

    let err = DolphinTool::new(&tool_path).ensure_available().unwrap_err();
    match err {
        BatchError::ToolNotFound { path } => assert_eq!(path, tool_path),
        other => panic!("expected ToolNotFound, got {other:?}"),
    }
}
