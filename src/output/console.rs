//! Human-readable console feed.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{DateTime, Local, TimeZone, Utc};
use stopmon_types::ArrivalVisit;

/// Writes one line per visit, or one line per empty poll, to a terminal.
///
/// Times are shown in the local time zone.
pub struct Console {
    out: Box<dyn Write + Send>,
}

impl Console {
    /// A console writing to stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// A console writing to an arbitrary sink.
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// Print one visit.
    pub fn visit(
        &mut self,
        polled_at: DateTime<Utc>,
        visit: &ArrivalVisit,
        minutes_away: i64,
    ) -> io::Result<()> {
        let line = format_visit_line(&polled_at.with_timezone(&Local), visit, minutes_away);
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    /// Print the marker for a poll that produced no visits.
    pub fn no_visits(&mut self, polled_at: DateTime<Utc>) -> io::Result<()> {
        let line = format_empty_line(&polled_at.with_timezone(&Local));
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

/// `[HH:MM:SS]    N to Ocean Beach               →   5 min`
pub fn format_visit_line<Tz>(at: &DateTime<Tz>, visit: &ArrivalVisit, minutes_away: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "[{}] {:>4} to {:<25} → {:>3} min",
        at.format("%H:%M:%S"),
        visit.line,
        visit.destination,
        minutes_away
    )
}

/// `[HH:MM:SS]  -- no visits --`
pub fn format_empty_line<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("[{}]  -- no visits --", at.format("%H:%M:%S"))
}
