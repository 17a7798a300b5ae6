//! Human-readable transfer statistics
//!
//! Sizes use binary units (`B`, `kiB`, `MiB`, `GiB`, `TiB`) with two decimals
//! and no separating space, durations use `mm:ss`.

const SIZE_SUFFIXES: [&str; 5] = ["B", "kiB", "MiB", "GiB", "TiB"];

/// Formats a byte count with the largest fitting binary unit
///
/// ```rust
/// use cosmic_connect_transfer::format::human_readable_size;
///
/// assert_eq!(human_readable_size(0), "0.00B");
/// assert_eq!(human_readable_size(1536), "1.50kiB");
/// ```
pub fn human_readable_size(bytes: u64) -> String {
    scale(bytes as f64)
}

/// Formats a throughput value as a size per second
pub fn human_readable_speed(bytes_per_sec: f64) -> String {
    format!("{}/s", scale(bytes_per_sec.max(0.0)))
}

fn scale(value: f64) -> String {
    let mut value = value;
    let mut exp = 0;
    while value >= 1024.0 && exp < SIZE_SUFFIXES.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    format!("{:.2}{}", value, SIZE_SUFFIXES[exp])
}

/// Formats a number of seconds as `mm:ss`
///
/// Minutes are not wrapped into hours, so long estimates read `75:00`.
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Instantaneous throughput between two progress notifications
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub bytes_per_sec: f64,
    /// The byte counter went backwards and the delta was clamped to zero
    pub clamped: bool,
}

impl Throughput {
    /// Throughput from `previous` to `current` bytes over `elapsed_secs`
    ///
    /// A zero interval yields zero throughput; callers skip such updates.
    pub fn between(previous: u64, current: u64, elapsed_secs: u64) -> Self {
        let clamped = current < previous;
        if elapsed_secs == 0 {
            return Self {
                bytes_per_sec: 0.0,
                clamped,
            };
        }

        let delta = current.saturating_sub(previous);
        Self {
            bytes_per_sec: delta as f64 / elapsed_secs as f64,
            clamped,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes_per_sec <= 0.0
    }

    /// Seconds left for the remaining bytes, `None` when nothing is moving
    pub fn eta_secs(&self, total_size: u64, bytes_transferred: u64) -> Option<u64> {
        if self.is_zero() {
            return None;
        }
        let remaining = total_size.saturating_sub(bytes_transferred);
        Some((remaining as f64 / self.bytes_per_sec) as u64)
    }
}
