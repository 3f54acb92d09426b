use std::{fmt::Write as _, thread, time::Duration};

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, unbounded, Sender};
use once_cell::sync::Lazy;

use crate::logging::rotate::Rotate;

pub mod rotate;

/// 日誌檔放置的目錄
const LOG_DIR: &str = "log";
/// 累積到這個大小就寫入檔案
const BATCH_SIZE: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// A named file logger.
///
/// Messages are handed to a background thread over a channel; the thread
/// batches them and writes to `log/%Y-%m-%d-<name>.log` through [`Rotate`].
pub struct Logger {
    writer: Sender<Command>,
}

enum Command {
    Write(LogMessage),
    /// 寫完目前累積的內容後回報
    Flush(Sender<()>),
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        Self::with_pattern(format!("{}/%Y-%m-%d-{}.log", LOG_DIR, log_name))
    }

    /// `pattern` is a `chrono` format for the file path, e.g. `log/%Y-%m-%d-http.log`.
    pub fn with_pattern(pattern: String) -> Self {
        let (tx, rx) = unbounded::<Command>();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let mut rotate = Rotate::new(pattern);
            let mut batch = String::with_capacity(BATCH_SIZE);

            while let Ok(command) = rx.recv() {
                let received = match command {
                    Command::Write(received) => received,
                    Command::Flush(done) => {
                        write_batch(&mut rotate, &mut batch);
                        let _ = done.send(());
                        continue;
                    }
                };

                if writeln!(
                    &mut batch,
                    "{} {} {}",
                    received.created_at.format("%F %X%.6f"),
                    received.level,
                    received.msg
                )
                .is_err()
                {
                    continue;
                }

                if rx.is_empty() || batch.len() >= BATCH_SIZE {
                    write_batch(&mut rotate, &mut batch);
                }
            }
        });

        Logger { writer: tx }
    }

    pub fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(log::Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    /// Blocks until every line sent so far is on disk, or `timeout` passes.
    pub fn flush(&self, timeout: Duration) {
        let (done_tx, done_rx) = bounded::<()>(1);
        if self.writer.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv_timeout(timeout);
        }
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(Command::Write(LogMessage::new(level, msg))) {
            error_console(why.to_string());
        }
    }
}

fn write_batch(rotate: &mut Rotate, batch: &mut String) {
    if batch.is_empty() {
        return;
    }

    if let Err(why) = rotate.write_msg(Local::now(), batch.as_bytes()) {
        error_console(format!("Failed to write log file because {:?}", why));
        info_console(batch.clone());
    }

    rotate.flush();
    batch.clear();
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

/// Waits for the default logger to drain.
pub fn flush(timeout: Duration) {
    LOGGER.flush(timeout);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

/// 測試用的獨立日誌目錄，避免寫進專案目錄
#[cfg(test)]
pub(crate) fn temp_log_dir(tag: &str) -> std::path::PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!(
        "bonbast-log-{}-{}-{}",
        tag,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
