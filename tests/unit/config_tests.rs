use parking_lot::ReentrantMutexGuard;
use snapdist::config::{
    DistConfig, DEFAULT_FULL_INTERVAL, FULL_INTERVAL_ENV, RSYNC_ENV, TAR_OPTS_ENV,
};
use snapdist::Error;

/// RAII env guard serialized by snapdist::env_lock to avoid cross-test races.
struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
    _lock: ReentrantMutexGuard<'static, ()>,
}

impl EnvGuard {
    fn new(key: &'static str, value: Option<&str>) -> Self {
        let lock = snapdist::env_lock().lock();
        let prev = std::env::var(key).ok();
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
        Self {
            key,
            prev,
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn defaults_without_environment() -> snapdist::Result<()> {
    let _interval = EnvGuard::new(FULL_INTERVAL_ENV, None);
    let _rsync = EnvGuard::new(RSYNC_ENV, None);
    let _opts = EnvGuard::new(TAR_OPTS_ENV, None);

    let cfg = DistConfig::from_env()?;
    assert_eq!(DEFAULT_FULL_INTERVAL, cfg.full_interval);
    assert_eq!("rsync", cfg.programs.rsync);
    assert!(cfg.archive_opts.is_empty());
    Ok(())
}

#[test]
fn environment_overrides_interval_programs_and_options() -> snapdist::Result<()> {
    let _interval = EnvGuard::new(FULL_INTERVAL_ENV, Some(" 7 "));
    let _rsync = EnvGuard::new(RSYNC_ENV, Some("/opt/bin/rsync"));
    let _opts = EnvGuard::new(TAR_OPTS_ENV, Some("--numeric-owner  --sort=name"));

    let cfg = DistConfig::from_env()?.with_archive_opts(vec!["--mtime=@0".to_string()]);
    assert_eq!(7, cfg.full_interval);
    assert_eq!("/opt/bin/rsync", cfg.programs.rsync);
    assert_eq!(
        vec!["--numeric-owner", "--sort=name", "--mtime=@0"],
        cfg.archive_opts
    );
    Ok(())
}

#[test]
fn rejects_zero_and_garbage_intervals() {
    for raw in ["0", "ten", "-3", ""] {
        let _interval = EnvGuard::new(FULL_INTERVAL_ENV, Some(raw));
        let err = DistConfig::from_env().expect_err("invalid interval");
        assert!(
            matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))),
            "{raw:?} should be a configuration error"
        );
    }

    assert!(DistConfig::with_full_interval(0).is_err());
}
