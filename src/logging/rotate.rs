use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeDelta};

use crate::logging;

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// A daily log file that also rolls over to a new generation once it grows
/// past `max_size`.
///
/// Generations only ever increase within a day, so earlier files are never
/// overwritten: `2025-02-03-http.log`, `2025-02-03-http.1.log`, ...
pub struct Rotate {
    /// 檔名模式，例如 "log/%Y-%m-%d-http.log"
    fn_pattern: String,
    /// 由日期決定的基礎檔名
    cur_base_fn: String,
    generation: u32,
    max_size: u64,
    current_size: u64,
    max_age: TimeDelta,
    out: Option<BufWriter<File>>,
}

impl Rotate {
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: i64) -> Self {
        Rotate {
            fn_pattern,
            cur_base_fn: String::new(),
            generation: 0,
            max_size,
            current_size: 0,
            max_age: TimeDelta::try_days(max_age_days).unwrap_or(TimeDelta::days(7)),
            out: None,
        }
    }

    /// Appends `msg` to the file for `now`, switching files on a date change
    /// or when the current one would exceed the size limit.
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = now.format(&self.fn_pattern).to_string();

        if base_fn != self.cur_base_fn || self.out.is_none() {
            self.generation = 0;
            self.cur_base_fn = base_fn;
            self.open_file()?;
            self.cleanup_old_files(now);
        }

        if self.current_size > 0 && self.current_size + msg.len() as u64 > self.max_size {
            self.generation += 1;
            self.open_file()?;
        }

        let out = self
            .out
            .as_mut()
            .ok_or_else(|| anyhow!("log file {} is not open", self.cur_base_fn))?;
        out.write_all(msg)?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    pub fn flush(&mut self) {
        if let Some(out) = self.out.as_mut() {
            let _ = out.flush();
        }
    }

    pub fn current_file(&self) -> String {
        self.generate_full_fn(&self.cur_base_fn, self.generation)
    }

    /// generation = 0: "log/2025-02-03-app.log"
    /// generation = 2: "log/2025-02-03-app.2.log"
    fn generate_full_fn(&self, base_fn: &str, generation: u32) -> String {
        if generation == 0 {
            return base_fn.to_string();
        }

        let path = Path::new(base_fn);
        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");

        parent
            .join(format!("{}.{}.{}", stem, generation, ext))
            .to_string_lossy()
            .to_string()
    }

    fn open_file(&mut self) -> Result<()> {
        self.flush();

        let filename = self.current_file();
        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out = Some(BufWriter::with_capacity(4096, file));

        Ok(())
    }

    /// 刪除超過保留天數的 .log 檔
    fn cleanup_old_files(&self, now: DateTime<Local>) {
        let current = PathBuf::from(self.current_file());
        let dir = match current.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let cut_off = (now - self.max_age).timestamp().max(0) as u64;

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(why) => {
                logging::error_console(format!(
                    "Failed to read log directory {} because {:?}",
                    dir.display(),
                    why
                ));
                return;
            }
        };

        for path in entries.flatten().map(|e| e.path()) {
            if path.extension().and_then(|s| s.to_str()) != Some("log") || path == current {
                continue;
            }

            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .is_some_and(|d| d.as_secs() <= cut_off);

            if expired {
                if let Err(why) = fs::remove_file(&path) {
                    logging::error_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        path.display(),
                        why
                    ));
                }
            }
        }
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        self.flush();
    }
}
