//! CLI contract tests for snapdist argument validation and error mapping.

use snapdist::Error;
use tempfile::tempdir;

fn expect_error(args: &[&str], expected: Error) {
    let err = snapdist::run(args.iter().copied()).expect_err("command should fail");
    let actual = err
        .downcast_ref::<Error>()
        .unwrap_or_else(|| panic!("unexpected error type: {err:?}"));
    match expected {
        Error::Cli(ref expected_msg) => {
            assert!(matches!(actual, Error::Cli(msg) if msg == expected_msg));
        }
        _ => {
            assert_eq!(
                std::mem::discriminant(actual),
                std::mem::discriminant(&expected)
            );
        }
    }
}

#[test]
fn commands_require_their_paths() {
    expect_error(&["snapdist", "init"], Error::Cli("dist_dir is required".into()));
    expect_error(&["snapdist", "commit"], Error::Cli("dist_dir is required".into()));
    expect_error(
        &["snapdist", "commit", "/tmp/dist"],
        Error::Cli("source_dir is required".into()),
    );
    expect_error(&["snapdist", "reset"], Error::Cli("dist_dir is required".into()));
    expect_error(&["snapdist", "up"], Error::Cli("dist_dir is required".into()));
    expect_error(
        &["snapdist", "up", "/tmp/dist"],
        Error::Cli("target_dir is required".into()),
    );
    expect_error(&["snapdist", "version"], Error::Cli("dist_dir is required".into()));
    expect_error(&["snapdist", "status"], Error::Cli("target_dir is required".into()));
}

#[test]
fn commit_splits_diff_options_from_source() {
    let cli = snapdist::cli::parse_args([
        "snapdist",
        "commit",
        "--archive-opt",
        "--numeric-owner",
        "/srv/dist",
        "--checksum",
        "-v",
        "/srv/source",
    ])
    .unwrap();

    let snapdist::cli::Command::Commit(args) = cli.command else {
        panic!("expected commit command");
    };
    assert_eq!(vec!["--numeric-owner"], args.archive_opts);
    let (opts, source) = args.split_rest().expect("source present");
    assert_eq!(&["--checksum".to_string(), "-v".to_string()], opts);
    assert_eq!(std::path::PathBuf::from("/srv/source"), source);
}

#[test]
fn init_twice_is_rejected() -> snapdist::Result<()> {
    let root = tempdir()?;
    let dist = root.path().join("dist");
    let dist_arg = dist.to_str().unwrap();

    snapdist::run(["snapdist", "init", dist_arg])?;
    assert!(dist.join("image").is_dir());
    expect_error(&["snapdist", "init", dist_arg], Error::Config(String::new()));

    snapdist::run(["snapdist", "version", dist_arg])?;
    Ok(())
}

#[test]
fn commit_into_uninitialized_directory_fails() {
    let root = tempdir().unwrap();
    let source = tempdir().unwrap();
    expect_error(
        &[
            "snapdist",
            "commit",
            root.path().to_str().unwrap(),
            source.path().to_str().unwrap(),
        ],
        Error::Config(String::new()),
    );
}

#[test]
fn reset_without_interrupted_operation_needs_force() -> snapdist::Result<()> {
    let root = tempdir()?;
    let dist = root.path().join("dist");
    let dist_arg = dist.to_str().unwrap();
    snapdist::run(["snapdist", "init", dist_arg])?;

    expect_error(
        &["snapdist", "reset", dist_arg],
        Error::NotLocked(Default::default()),
    );
    // Nothing committed yet, so a forced reset only recreates the empty image.
    snapdist::run(["snapdist", "reset", dist_arg, "--force"])?;
    assert!(!dist.join(".lock").exists());
    Ok(())
}

#[test]
fn reset_recreates_missing_working_image() -> snapdist::Result<()> {
    let root = tempdir()?;
    let dist = root.path().join("dist");
    let dist_arg = dist.to_str().unwrap();
    snapdist::run(["snapdist", "init", dist_arg])?;

    // Interrupted rebuild: lock held, image/ gone.
    std::fs::write(dist.join(".lock"), b"")?;
    std::fs::remove_dir_all(dist.join("image"))?;
    expect_error(&["snapdist", "init", dist_arg], Error::Config(String::new()));

    snapdist::run(["snapdist", "reset", dist_arg])?;
    assert!(dist.join("image").is_dir());
    assert!(!dist.join(".lock").exists());
    Ok(())
}

#[test]
fn up_and_status_reject_missing_directories() -> snapdist::Result<()> {
    let root = tempdir()?;
    let dist = root.path().join("dist");
    snapdist::run(["snapdist", "init", dist.to_str().unwrap()])?;

    expect_error(
        &[
            "snapdist",
            "up",
            dist.to_str().unwrap(),
            "/no/such/target",
        ],
        Error::Config(String::new()),
    );
    expect_error(
        &["snapdist", "status", "/no/such/target"],
        Error::Config(String::new()),
    );

    let target = tempdir()?;
    snapdist::run(["snapdist", "status", target.path().to_str().unwrap()])?;
    let status = snapdist::cli::status::inspect(target.path())?;
    assert_eq!(None, status.version);
    assert!(!status.locked);
    Ok(())
}

#[test]
fn help_lists_every_command() {
    let help = snapdist::cli::clap_command().render_long_help().to_string();
    for name in ["init", "commit", "reset", "up", "version", "status"] {
        assert!(help.contains(name), "help should mention {name}");
    }
}
