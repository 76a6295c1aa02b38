use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const LOGGER_NAME: &str = "os-inventory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    template: String,
}

impl LineFormat {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn render(&self, message: &str) -> String {
        self.render_at(Local::now(), message)
    }

    pub fn render_at(&self, at: DateTime<Local>, message: &str) -> String {
        let mut line = self.template.clone();
        if line.contains("%(asctime)s") {
            let stamp = at.format("%Y-%m-%d %H:%M:%S,%3f").to_string();
            line = line.replace("%(asctime)s", &stamp);
        }
        line.replace("%(levelname)s", "INFO")
            .replace("%(name)s", LOGGER_NAME)
            .replace("%(message)s", message)
    }
}

pub struct ReportLog {
    path: PathBuf,
    format: LineFormat,
    out: BufWriter<File>,
}

impl ReportLog {
    pub fn create(path: &Path, format: LineFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("cannot open log file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            format,
            out: BufWriter::new(file),
        })
    }

    pub fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.out, "{}", self.format.render(line))
                .with_context(|| format!("writing {}", self.path.display()))?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn template_placeholders() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let f = LineFormat::new("%(asctime)s %(name)s %(levelname)s: %(message)s");
        assert_eq!(
            f.render_at(at, "server:"),
            "2024-03-01 12:30:05,000 os-inventory INFO: server:"
        );
        assert_eq!(LineFormat::new("%(message)s").render("\tname: x"), "\tname: x");
    }

    #[test]
    fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.log");
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut log = ReportLog::create(&path, LineFormat::new("> %(message)s")).unwrap();
        log.write_lines(&["a".into(), "".into()]).unwrap();
        log.write_lines(&["b".into()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "> a\n> \n> b\n");
    }
}
