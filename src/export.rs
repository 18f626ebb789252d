use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::chat::Thread;

const RULE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
        }
    }
}

/// `chat-<id>.json` or `chat-<id>.txt`
pub fn file_name(thread: &Thread, format: ExportFormat) -> String {
    format!("chat-{}.{}", thread.id(), format.extension())
}

pub fn to_json(thread: &Thread) -> Result<String> {
    serde_json::to_string_pretty(thread).context("Failed to serialize thread")
}

/// Human-readable transcript: title, creation time, then each message
pub fn to_text(thread: &Thread) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "{}", thread.title());
    let _ = writeln!(
        out,
        "Created: {}",
        thread.created_at().with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "{}", heavy);

    for (i, message) in thread.messages().iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out, "{}", light);
        }
        let _ = writeln!(
            out,
            "\n[{}] {}",
            message.role().label(),
            message.timestamp().with_timezone(&Local).format("%H:%M:%S")
        );
        let _ = writeln!(out, "{}\n", message.content());
    }

    out
}

pub fn render(thread: &Thread, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(thread),
        ExportFormat::Text => Ok(to_text(thread)),
    }
}

/// Write the export into `dir`, returning the path of the new file
pub fn write_export(dir: &Path, thread: &Thread, format: ExportFormat) -> Result<PathBuf> {
    let contents = render(thread, format)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(file_name(thread, format));
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
