use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Maximum log file size before rotation (2 MB)
const MAX_LOG_SIZE: u64 = 2 * 1024 * 1024;
/// Size to keep after rotation (256 KB of most recent logs)
const KEEP_SIZE: u64 = 256 * 1024;

/// Rotate the log file if it exceeds the maximum size, keeping only the
/// most recent KEEP_SIZE bytes.
fn rotate_log_if_needed(log_path: &Path) -> std::io::Result<()> {
    let Ok(metadata) = fs::metadata(log_path) else {
        return Ok(());
    };
    if metadata.len() <= MAX_LOG_SIZE {
        return Ok(());
    }

    let mut file = File::open(log_path)?;
    let start_pos = metadata.len().saturating_sub(KEEP_SIZE);
    file.seek(SeekFrom::Start(start_pos))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    drop(file);

    // Skip to the first newline to avoid a partial leading line
    let skip = buffer
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut file = File::create(log_path)?;
    file.write_all(b"--- Log rotated (older entries removed) ---\n")?;
    file.write_all(&buffer[skip..])?;
    Ok(())
}

/// Initialize tracing with a rotating file writer in the data directory.
/// Logs never go to stdout; that belongs to the command output.
pub fn init_logging(data_dir: &Path, log_level: &str) -> std::io::Result<()> {
    fs::create_dir_all(data_dir)?;
    let log_path = data_dir.join("perktrack.log");
    rotate_log_if_needed(&log_path)?;

    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
    let filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();

    tracing::debug!(path = %log_path.display(), "logging initialized");
    Ok(())
}
