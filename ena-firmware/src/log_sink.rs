//! Text output over defmt
//!
//! Dump tables are produced through `core::fmt::Write`. defmt has no
//! streaming text sink, so output is collected into lines and each
//! complete line is logged on its own.

use core::fmt;

use defmt::info;
use heapless::String;

/// Longest line logged in one piece; longer lines are split
const LINE_CAPACITY: usize = 128;

/// `fmt::Write` adapter that logs one defmt message per line
#[derive(Default)]
pub struct LogLines {
    line: String<LINE_CAPACITY>,
}

impl LogLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log whatever is left of an unterminated line
    pub fn flush(&mut self) {
        if !self.line.is_empty() {
            info!("{=str}", self.line.as_str());
            self.line.clear();
        }
    }
}

impl fmt::Write for LogLines {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if c == '\n' {
                info!("{=str}", self.line.as_str());
                self.line.clear();
                continue;
            }
            if self.line.push(c).is_err() {
                self.flush();
                self.line.push(c).map_err(|_| fmt::Error)?;
            }
        }
        Ok(())
    }
}
