//! Parser for remote `vmstat` output
//!
//! The AIX `vmstat` sample line ends with four CPU columns: `us sy id wa`.
//! The parser takes the last non-blank line of the command output
//! (defensive against headers even though the default command already
//! pipes through `tail -1`), extracts every whitespace-delimited token
//! that reads as a non-negative decimal number, and interprets the final
//! four as the CPU columns.

use serde::Serialize;

use crate::error::{WatchError, WatchResult};

/// One parsed CPU sample from a host
///
/// The four raw components are expected to sum to roughly 100. The
/// derived usage percent is recomputed on demand, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuReading {
    /// User CPU percent
    pub us: f64,
    /// System CPU percent
    pub sy: f64,
    /// Idle CPU percent
    pub id: f64,
    /// IO wait percent
    pub wa: f64,
}

impl CpuReading {
    /// Computed CPU usage percent.
    ///
    /// Defined as `us + sy + wa`. Numerically this equals `100 - id`
    /// when the four columns sum to 100, but the summation form is the
    /// one downstream consumers expect, including its rounding behavior.
    #[must_use]
    pub fn usage(&self) -> f64 {
        self.us + self.sy + self.wa
    }
}

/// Parses the last sample line of `vmstat` output into a [`CpuReading`].
///
/// # Errors
///
/// Returns [`WatchError::Parse`] when the output is blank or fewer than
/// four numeric tokens can be extracted from its last non-blank line.
pub fn parse_vmstat(output: &str) -> WatchResult<CpuReading> {
    let line = output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| WatchError::Parse("vmstat returned no data".into()))?;

    let nums: Vec<f64> = line
        .split_whitespace()
        .filter_map(parse_decimal)
        .collect();
    if nums.len() < 4 {
        return Err(WatchError::Parse(line.to_string()));
    }

    let tail = &nums[nums.len() - 4..];
    Ok(CpuReading {
        us: tail[0],
        sy: tail[1],
        id: tail[2],
        wa: tail[3],
    })
}

/// Parses a token as a plain non-negative decimal.
///
/// Only digits with at most one decimal point qualify; signs, exponents,
/// and words like `nan` are rejected so that `vmstat` column labels and
/// punctuation never count as numbers.
fn parse_decimal(token: &str) -> Option<f64> {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for c in token.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }
    token.parse().ok()
}
