//! Behaviour-driven tests for the package lifecycle.
//!
//! These scenarios drive [`ezsetup::app::run_cli`] in-process with an
//! in-memory fetcher and the real tar extractor and shell, so lifecycle
//! scripts genuinely run. Tests use the rstest-bdd v0.5.0 mutable world
//! pattern.
#![cfg(unix)]

use ezsetup::app::{Collaborators, run_cli};
use ezsetup::script::ShellScriptRunner;
use ezsetup::test_utils::{
    ArchiveFormat, CountingExtractor, StubFetcher, TarballBuilder, exit_script, sha256_hex,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const URL: &str = "https://packages.test/tool.tar.gz";
const MARKER: &str = "ran-in";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct PackageWorld {
    archive: Vec<u8>,
    descriptor: Option<String>,
    fetcher: Option<StubFetcher>,
    extractor: CountingExtractor,
    scratch: TempDir,
    output: TempDir,
    exit_code: Option<i32>,
    stderr: String,
}

#[fixture]
fn world() -> PackageWorld {
    PackageWorld {
        archive: Vec::new(),
        descriptor: None,
        fetcher: None,
        extractor: CountingExtractor::default(),
        scratch: tempfile::tempdir().expect("scratch dir"),
        output: tempfile::tempdir().expect("output dir"),
        exit_code: None,
        stderr: String::new(),
    }
}

impl PackageWorld {
    fn set_archive(&mut self, archive: Vec<u8>) {
        self.fetcher = Some(StubFetcher::serving(archive.clone()));
        self.archive = archive;
    }

    fn fetcher(&self) -> &StubFetcher {
        self.fetcher.as_ref().expect("package configured")
    }

    fn exit_code(&self) -> i32 {
        self.exit_code.expect("command run")
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a package whose install script exits {install} and uninstall script exits {uninstall}")]
fn given_package_with_exit_codes(world: &mut PackageWorld, install: i32, uninstall: i32) {
    let archive = TarballBuilder::new()
        .lifecycle_scripts("", install, uninstall)
        .build(ArchiveFormat::TarGz);
    world.set_archive(archive);
}

#[given("a package nested under \"{dir}\" whose scripts exit 0")]
fn given_nested_package(world: &mut PackageWorld, dir: String) {
    let marker = world.output.path().join(MARKER);
    let install = format!(
        "#!/bin/sh\nbasename \"$PWD\" > '{}'\n",
        marker.display()
    );
    let archive = TarballBuilder::new()
        .dir(&dir)
        .script(&format!("{dir}/install.sh"), &install)
        .script(&format!("{dir}/uninstall.sh"), &exit_script(0))
        .file(&format!("{dir}/README"), b"tool")
        .build(ArchiveFormat::TarZst);
    world.set_archive(archive);
}

#[given("a package containing only a README")]
fn given_package_without_scripts(world: &mut PackageWorld) {
    let archive = TarballBuilder::new()
        .file("tool/README", b"no scripts here")
        .build(ArchiveFormat::TarGz);
    world.set_archive(archive);
}

#[given("an empty package")]
fn given_empty_package(world: &mut PackageWorld) {
    world.set_archive(TarballBuilder::new().build(ArchiveFormat::Tar));
}

#[given("the package is described with its sha256 digest")]
fn given_sha256_descriptor(world: &mut PackageWorld) {
    world.descriptor = Some(format!("sha256={}={URL}", sha256_hex(&world.archive)));
}

#[given("the package is described with a corrupted sha256 digest")]
fn given_corrupted_descriptor(world: &mut PackageWorld) {
    let mut digest = sha256_hex(&world.archive);
    let last = if digest.ends_with('0') { "1" } else { "0" };
    digest.replace_range(digest.len() - 1.., last);
    world.descriptor = Some(format!("sha256={digest}={URL}"));
}

#[given("the package is described with algorithm \"{algorithm}\"")]
fn given_algorithm_descriptor(world: &mut PackageWorld, algorithm: String) {
    world.descriptor = Some(format!("{algorithm}=d41d8cd98f00b204e9800998ecf8427e={URL}"));
}

#[given("the package is described without verification")]
fn given_unverified_descriptor(world: &mut PackageWorld) {
    world.descriptor = Some(format!("none=={URL}"));
}

#[when("the \"{verb}\" command is run")]
fn when_command_run(world: &mut PackageWorld, verb: String) {
    let scratch = world.scratch.path().display().to_string();
    let descriptor = world.descriptor.clone().expect("descriptor configured");
    let args = [
        "ezsetup",
        "--scratch-dir",
        scratch.as_str(),
        verb.as_str(),
        descriptor.as_str(),
    ];

    let runner = ShellScriptRunner;
    let collaborators = Collaborators {
        fetcher: world.fetcher(),
        extractor: &world.extractor,
        runner: &runner,
    };
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_cli(args, &collaborators, &mut stdout, &mut stderr);

    world.exit_code = Some(code);
    world.stderr = String::from_utf8_lossy(&stderr).into_owned();
}

#[then("the command exits with code {code}")]
fn then_exit_code(world: &mut PackageWorld, code: i32) {
    assert_eq!(world.exit_code(), code, "stderr: {}", world.stderr);
}

#[then("the command fails")]
fn then_command_fails(world: &mut PackageWorld) {
    assert_ne!(world.exit_code(), 0, "stderr: {}", world.stderr);
}

#[then("stderr mentions \"{text}\"")]
fn then_stderr_mentions(world: &mut PackageWorld, text: String) {
    assert!(
        world.stderr.contains(&text),
        "expected {text:?} in stderr: {}",
        world.stderr
    );
}

#[then("the install script ran inside \"{dir}\"")]
fn then_install_ran_inside(world: &mut PackageWorld, dir: String) {
    let marker = std::fs::read_to_string(world.output.path().join(MARKER)).expect("marker");
    assert_eq!(marker.trim(), dir);
}

#[then("the archive was fetched once and never extracted")]
fn then_fetched_not_extracted(world: &mut PackageWorld) {
    assert_eq!(world.fetcher().requested(), vec![URL.to_owned()]);
    assert_eq!(world.extractor.calls(), 0);
}

#[then("no scratch files remain")]
fn then_no_scratch_remains(world: &mut PackageWorld) {
    let leftovers: Vec<_> = std::fs::read_dir(world.scratch.path())
        .expect("read scratch parent")
        .collect();
    assert!(leftovers.is_empty(), "leftovers: {leftovers:?}");
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "Install and uninstall scripts report their own status"
)]
fn scenario_scripts_report_status(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "Scripts nested in a top-level directory are found"
)]
fn scenario_nested_scripts(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "A tampered archive is never extracted"
)]
fn scenario_tampered_archive(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "An unknown checksum algorithm is rejected after fetching"
)]
fn scenario_unknown_algorithm(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "Unverified packages install with a warning"
)]
fn scenario_unverified_package(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "An archive without lifecycle scripts is rejected"
)]
fn scenario_missing_scripts(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "An empty archive is rejected"
)]
fn scenario_empty_archive(world: PackageWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/package_lifecycle.feature",
    name = "Scratch storage is removed after a run"
)]
fn scenario_scratch_removed(world: PackageWorld) {
    let _ = world;
}
