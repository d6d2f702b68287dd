//! Plain-text building blocks: gauges, sparklines, times.

use std::time::Duration;

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Highest index into `SPARKS`.
const SPARK_STEPS: u8 = 7;

/// Horizontal bar for a percentage, e.g. `[#####-----]` for 50 at width 10.
pub fn gauge(percent: u8, width: usize) -> String {
    let percent = usize::from(percent.min(100));
    let filled = (percent * width + 50) / 100;
    let mut out = String::with_capacity(width + 2);
    out.push('[');
    out.extend(std::iter::repeat_n('#', filled));
    out.extend(std::iter::repeat_n('-', width - filled));
    out.push(']');
    out
}

/// Sparkline of the last `width` values, scaled between their min and max.
/// A flat series draws at mid height.
pub fn sparkline(values: &[f32], width: usize) -> String {
    let tail = &values[values.len().saturating_sub(width)..];
    let (lo, hi) = tail
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = hi - lo;
    tail.iter()
        .map(|v| {
            if span <= f32::EPSILON {
                SPARKS[SPARKS.len() / 2]
            } else {
                let level = ((v - lo) / span * f32::from(SPARK_STEPS)).round();
                let idx = (0..SPARK_STEPS)
                    .find(|&i| f32::from(i) >= level)
                    .unwrap_or(SPARK_STEPS);
                SPARKS[usize::from(idx)]
            }
        })
        .collect()
}

/// "0.4s ago", "12s ago", "3m 05s ago".
pub fn age(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 10_000 {
        format!("{:.1}s ago", d.as_secs_f32())
    } else if ms < 60_000 {
        format!("{}s ago", d.as_secs())
    } else {
        format!("{}m {:02}s ago", d.as_secs() / 60, d.as_secs() % 60)
    }
}

/// Time of day (UTC) of an epoch-millisecond timestamp.
pub fn clock_time(epoch_ms: u64) -> String {
    let secs = (epoch_ms / 1000) % 86_400;
    format!(
        "{:02}:{:02}:{:02} UTC",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}
