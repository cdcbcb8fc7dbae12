use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use sinklog::config::{Config, LockKind, LoggerConfig};
use sinklog::error::{ConfigError, LoggerError};
use sinklog::log::{CONSOLE_SINK_NAME, FILE_SINK_NAME, LogLevel, Logger, LoggerHandle};
use sinklog::sinks::{TimeStyle, WriterSink};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn quiet_config(dir: &tempfile::TempDir, base: &str) -> LoggerConfig {
    LoggerConfig::new(base).output_directory(dir.path()).quiet(true)
}

#[test]
fn init_installs_console_then_file() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::init(&LoggerConfig::new("app").output_directory(dir.path())).unwrap();

    let names: Vec<String> = logger.sinks().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, [CONSOLE_SINK_NAME, FILE_SINK_NAME]);
    assert_eq!(logger.find_sink(FILE_SINK_NAME).unwrap().generation, Some(0));
    assert!(dir.path().join("app.log").exists());
}

#[test]
fn fatal_event_reaches_console_and_file_identically() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::init(&quiet_config(&dir, "scenario")).unwrap();
    let console = SharedBuf::default();
    logger
        .register_sink(
            CONSOLE_SINK_NAME,
            LogLevel::Trace,
            Box::new(WriterSink::new(console.clone(), TimeStyle::Time)),
        )
        .unwrap();

    sinklog::logger_fatal!(logger, "reactor {} lost coolant", 2);
    logger.shutdown();

    let console = console.text();
    let file = fs::read_to_string(dir.path().join("scenario.log")).unwrap();
    assert_eq!(console.lines().count(), 1);
    assert_eq!(file.lines().count(), 1);
    assert!(console.contains(" FATAL tests/logger.rs:"));
    assert!(console.ends_with(": reactor 2 lost coolant\n"));
    // The file line carries the date in front of the same time and text.
    assert!(file.ends_with(&console), "file {file:?} console {console:?}");
    assert_eq!(file.len(), console.len() + "YYYY-MM-DD ".len());
}

#[test]
fn rotation_scenario_keeps_two_generations() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::init(
        &quiet_config(&dir, "base")
            .max_file_size(100)
            .max_generations(2),
    )
    .unwrap();

    for i in 0..8 {
        sinklog::logger_info!(logger, "rotation payload {i}");
    }

    let live = fs::metadata(dir.path().join("base.log")).unwrap().len();
    assert!(live < 100);
    assert!(dir.path().join("base-1.log").exists());
    assert!(dir.path().join("base-2.log").exists());
    assert!(!dir.path().join("base-3.log").exists());
}

#[test]
fn concurrent_submitters_write_whole_lines() {
    const THREADS: usize = 6;
    const PER_THREAD: usize = 250;

    let dir = tempfile::tempdir().unwrap();
    let handle = LoggerHandle::init(&quiet_config(&dir, "threads").level(LogLevel::Info)).unwrap();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let h = handle.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    sinklog::logger_warn!(h, "worker {t} event {i} done");
                    sinklog::logger_debug!(h, "below threshold");
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    handle.flush().unwrap();

    let text = fs::read_to_string(dir.path().join("threads.log")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    assert!(lines.iter().all(|l| l.contains(" WARN  ") && l.ends_with(" done")));
}

#[test]
fn shutdown_twice_then_drop() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Logger::init(&quiet_config(&dir, "bye")).unwrap();
    logger.shutdown();
    logger.shutdown();
    assert!(logger.sinks().is_err());
    drop(logger);
}

#[test]
fn failed_init_reports_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing_dir = LoggerConfig::new("app").output_directory(dir.path().join("nope"));
    assert!(matches!(
        Logger::init(&missing_dir),
        Err(LoggerError::Config(ConfigError::NotADirectory(_)))
    ));

    let no_name = LoggerConfig::default().output_directory(dir.path());
    assert!(matches!(
        Logger::init(&no_name),
        Err(LoggerError::Config(ConfigError::MissingNamePattern))
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn init_rejects_capacity_below_default_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let cramped = LoggerConfig::new("app").output_directory(dir.path()).capacity(1);
    assert!(matches!(
        Logger::init(&cramped),
        Err(LoggerError::Config(ConfigError::CapacityTooSmall {
            capacity: 1,
            required: 2
        }))
    ));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0, "no file left behind");

    let logger = Logger::init(&cramped.quiet(true)).unwrap();
    let names: Vec<String> = logger.sinks().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, [FILE_SINK_NAME]);
}

#[test]
fn init_from_ini_file() {
    let dir = tempfile::tempdir().unwrap();
    let ini = dir.path().join("logging.ini");
    fs::write(
        &ini,
        format!(
            "[logging]\noutput_directory = {}\nbase_name = svc\nlevel = error\nquiet = true\n",
            dir.path().display()
        ),
    )
    .unwrap();

    let config = LoggerConfig::from_config(&Config::load(&ini).unwrap()).unwrap();
    assert_eq!(config.lock, LockKind::Local);
    let logger = Logger::init(&config).unwrap();
    assert_eq!(logger.level(), LogLevel::Error);

    sinklog::logger_warn!(logger, "dropped");
    sinklog::logger_error!(logger, "kept");
    logger.shutdown();

    let text = fs::read_to_string(dir.path().join("svc.log")).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.contains(" ERROR ") && text.contains("kept"));
}

#[cfg(unix)]
#[test]
fn two_loggers_on_one_shared_lock() {
    let dir = tempfile::tempdir().unwrap();
    let key = format!("sinklog-it-{}-pair", std::process::id());
    let config = quiet_config(&dir, "pair")
        .max_file_size(4096)
        .max_generations(20)
        .lock(LockKind::Shared { key });

    let first = LoggerHandle::init(&config).unwrap();
    let second = LoggerHandle::init(&config).unwrap();

    let workers: Vec<_> = [first.clone(), second.clone()]
        .into_iter()
        .enumerate()
        .map(|(n, h)| {
            thread::spawn(move || {
                for i in 0..150 {
                    sinklog::logger_info!(h, "logger {n} line {i} end");
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    first.shutdown();
    second.shutdown();

    let mut total = 0;
    for g in 0..=20 {
        let path = if g == 0 {
            dir.path().join("pair.log")
        } else {
            dir.path().join(format!("pair-{g}.log"))
        };
        if let Ok(text) = fs::read_to_string(path) {
            assert!(text.lines().all(|l| l.ends_with(" end")));
            total += text.lines().count();
        }
    }
    assert_eq!(total, 300);
}
