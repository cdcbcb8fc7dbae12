#[cfg(test)]
#[allow(clippy::module_inception)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::error::RotationError;
    use crate::rotation::{OpenMode, RotationController, RotationPolicy, RotationState};
    use crate::sinks::FileSink;

    fn policy(dir: &TempDir, max_file_size: u64, max_generations: u32) -> RotationPolicy {
        RotationPolicy::new(dir.path(), "app")
            .with_max_file_size(max_file_size)
            .with_max_generations(max_generations)
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn threshold_is_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = RotationController::new(policy(&dir, 100, 2), 0);
        ctl.record(99);
        assert!(!ctl.should_rotate());
        ctl.record(1);
        assert!(ctl.should_rotate());
        assert_eq!(ctl.state(), RotationState::Active);
    }

    #[test]
    fn counter_starts_from_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = RotationController::new(policy(&dir, 100, 2), 120);
        assert_eq!(ctl.written(), 120);
        assert!(ctl.should_rotate());
    }

    #[test]
    fn shift_moves_every_generation_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let pol = policy(&dir, 100, 3);
        fs::write(pol.path_for(0), "live").unwrap();
        fs::write(pol.path_for(1), "one").unwrap();

        RotationController::new(pol.clone(), 0).shift_generations().unwrap();

        assert!(!pol.path_for(0).exists());
        assert_eq!(read(&pol.path_for(1)), "live");
        assert_eq!(read(&pol.path_for(2)), "one");
        assert!(!pol.path_for(3).exists());
    }

    #[test]
    fn shift_drops_the_oldest_generation() {
        let dir = tempfile::tempdir().unwrap();
        let pol = policy(&dir, 100, 2);
        fs::write(pol.path_for(0), "live").unwrap();
        fs::write(pol.path_for(1), "one").unwrap();
        fs::write(pol.path_for(2), "two").unwrap();

        RotationController::new(pol.clone(), 0).shift_generations().unwrap();

        assert_eq!(read(&pol.path_for(1)), "live");
        assert_eq!(read(&pol.path_for(2)), "one");
        assert!(!pol.path_for(3).exists(), "never renamed past the maximum");
    }

    #[test]
    fn rotate_swaps_in_fresh_live_file() {
        let dir = tempfile::tempdir().unwrap();
        let pol = policy(&dir, 10, 2);
        fs::write(pol.live_path(), "0123456789").unwrap();
        let mut file = FileSink::open(pol.live_path(), OpenMode::Append).unwrap();
        let mut ctl = RotationController::new(pol.clone(), file.file_size().unwrap());

        ctl.rotate(&mut file).unwrap();

        assert_eq!(ctl.written(), 0);
        assert_eq!(ctl.rotations(), 1);
        assert_eq!(file.file_size().unwrap(), 0);
        assert!(file.is_current().unwrap());
        assert_eq!(read(&pol.path_for(1)), "0123456789");
    }

    #[test]
    fn zero_generations_truncates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let pol = policy(&dir, 4, 0);
        fs::write(pol.live_path(), "stale").unwrap();
        let mut file = FileSink::open(pol.live_path(), OpenMode::Append).unwrap();
        let mut ctl = RotationController::new(pol.clone(), 5);

        ctl.rotate(&mut file).unwrap();

        assert_eq!(read(&pol.live_path()), "");
        assert!(!pol.path_for(1).exists());
        assert_eq!(ctl.written(), 0);
    }

    #[test]
    fn failed_rotation_keeps_handle_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let pol = policy(&dir, 4, 1);
        fs::write(pol.live_path(), "full").unwrap();
        // A non-empty directory where the retired file has to go.
        fs::create_dir(pol.path_for(1)).unwrap();
        fs::write(pol.path_for(1).join("blocker"), "x").unwrap();

        let mut file = FileSink::open(pol.live_path(), OpenMode::Append).unwrap();
        let mut ctl = RotationController::new(pol.clone(), 4);

        let err = ctl.rotate(&mut file).unwrap_err();
        assert!(matches!(err, RotationError::Remove { .. }), "got {err:?}");
        assert_eq!(ctl.written(), 4);
        assert_eq!(ctl.rotations(), 0);
        assert_eq!(ctl.state(), RotationState::Active);
        assert!(file.is_current().unwrap());
        assert_eq!(read(&pol.live_path()), "full");
    }

    /// Set in the re-executed test binary; holds the scratch directory.
    #[cfg(target_os = "linux")]
    const REOPEN_DIR_ENV: &str = "SINKLOG_REOPEN_FAILURE_DIR";

    /// Runs every rotation with file opens failing (`RLIMIT_NOFILE` of 0), in
    /// a child process so the limit does not leak into other tests.
    #[cfg(target_os = "linux")]
    #[test]
    fn failed_reopen_retries_without_shifting_history_again() {
        if let Ok(dir) = std::env::var(REOPEN_DIR_ENV) {
            reopen_failure_child(Path::new(&dir));
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let status = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "rotation::tests::tests::failed_reopen_retries_without_shifting_history_again",
                "--test-threads=1",
            ])
            .env(REOPEN_DIR_ENV, dir.path())
            .status()
            .unwrap();
        assert!(status.success());

        let pol = policy_in(dir.path());
        assert_eq!(read(&pol.path_for(1)), "live");
        assert_eq!(read(&pol.path_for(2)), "h1");
        assert_eq!(read(&pol.path_for(3)), "h2");
        assert_eq!(read(&pol.live_path()), "");
    }

    #[cfg(target_os = "linux")]
    fn policy_in(dir: &Path) -> RotationPolicy {
        RotationPolicy::new(dir, "hist")
            .with_max_file_size(1)
            .with_max_generations(3)
    }

    #[cfg(target_os = "linux")]
    fn set_open_file_limit(limit: libc::rlim_t) -> libc::rlimit {
        let mut current = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: plain getrlimit/setrlimit on a valid struct.
        unsafe {
            assert_eq!(libc::getrlimit(libc::RLIMIT_NOFILE, &mut current), 0);
            let wanted = libc::rlimit {
                rlim_cur: limit,
                rlim_max: current.rlim_max,
            };
            assert_eq!(libc::setrlimit(libc::RLIMIT_NOFILE, &wanted), 0);
        }
        current
    }

    #[cfg(target_os = "linux")]
    fn reopen_failure_child(dir: &Path) {
        let pol = policy_in(dir);
        fs::write(pol.live_path(), "live").unwrap();
        fs::write(pol.path_for(1), "h1").unwrap();
        fs::write(pol.path_for(2), "h2").unwrap();
        fs::write(pol.path_for(3), "h3").unwrap();

        let mut file = FileSink::open(pol.live_path(), OpenMode::Append).unwrap();
        let mut ctl = RotationController::new(pol.clone(), 4);

        let saved = set_open_file_limit(0);
        let attempts: Vec<bool> = (0..3)
            .map(|_| matches!(ctl.rotate(&mut file), Err(RotationError::Reopen { .. })))
            .collect();
        let pending = ctl.reopen_pending();
        set_open_file_limit(saved.rlim_cur);

        assert_eq!(attempts, [true, true, true]);
        assert!(pending);
        assert_eq!(ctl.written(), 4);
        // One shift only: the oldest entry went once, the rest stayed put.
        assert!(!pol.live_path().exists());
        assert_eq!(read(&pol.path_for(1)), "live");
        assert_eq!(read(&pol.path_for(2)), "h1");
        assert_eq!(read(&pol.path_for(3)), "h2");

        ctl.rotate(&mut file).unwrap();
        assert!(!ctl.reopen_pending());
        assert!(file.is_current().unwrap());
        assert_eq!(read(&pol.path_for(1)), "live");
        assert_eq!(read(&pol.path_for(2)), "h1");
        assert_eq!(read(&pol.path_for(3)), "h2");
    }
}
