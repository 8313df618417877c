use std::io::Write;

use taskdeck_core::api::{Notice, NoticeLevel, Notifier};

/// Prints notices to stderr, one line each.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    color: bool,
}

impl ConsoleNotifier {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn render(&self, notice: &Notice) -> String {
        let (mark, ansi) = match notice.level {
            NoticeLevel::Success => ("✓", "\x1b[32m"),
            NoticeLevel::Error => ("✗", "\x1b[31m"),
        };
        if self.color {
            format!("{ansi}{mark}\x1b[0m {}", notice.message)
        } else {
            format!("{mark} {}", notice.message)
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        tracing::debug!(
            target: "taskdeck.notice",
            level = ?notice.level,
            message = %notice.message
        );
        let line = self.render(&notice);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }
}
