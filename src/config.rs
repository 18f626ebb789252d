use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Settings;

/// Runtime configuration resolved from flags, the environment and `.env`
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub toast_ttl: Duration,
}

impl From<Settings> for Config {
    fn from(settings: Settings) -> Self {
        Self {
            endpoint: settings.endpoint,
            export_dir: settings.export_dir,
            log_file: settings.log_file,
            toast_ttl: Duration::from_secs(settings.toast_secs.max(1)),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "endpoint:   {}", self.endpoint)?;
        writeln!(f, "export dir: {}", self.export_dir.display())?;
        writeln!(f, "log file:   {}", self.log_file.display())?;
        write!(f, "toast ttl:  {}s", self.toast_ttl.as_secs())
    }
}
