//! Severity levels of the logging front end's current-log symlinks.

use std::fmt;

/// Severity level with a "current log" symlink named `<prefix>.<SEVERITY>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Canonical upper-case name.
    pub const fn name(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Name of the symlink pointing at this severity's current log.
    pub fn symlink_name(self, prefix: &str) -> String {
        format!("{}.{}", prefix, self.name())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symlink_names() {
        let names: Vec<String> = Severity::ALL.iter().map(|s| s.symlink_name("app")).collect();
        assert_eq!(names, ["app.INFO", "app.WARNING", "app.ERROR", "app.FATAL"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}
