//! # Almanac Rendering
//!
//! Turns computed lunar data into terminal output: a text almanac (current
//! phase, upcoming phase events, a moonrise/moonset table) and an ASCII chart
//! of the illuminated fraction around "now".
//!
//! The [`Almanac`] value is also what the binary serializes for `--json`.

use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::LunarError;
use crate::phase::{illumination_with_precision, phase_angle};
use crate::phase_event::{next_event, MoonPhaseKind};
use crate::rise_set::{DayPattern, LunarTime};
use crate::time_scale::EphemerisInstant;
use crate::IlluminationSeries;

/// One upcoming principal phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseEventRow {
    pub kind: MoonPhaseKind,
    pub utc: DateTime<Utc>,
    /// Wall-clock time in the observer's zone
    pub local: String,
}

/// One civil day of the moonrise/moonset table.
#[derive(Debug, Clone, Serialize)]
pub struct AlmanacDay {
    pub date: NaiveDate,
    pub moonrise: Option<String>,
    pub moonset: Option<String>,
    pub visible_seconds: i64,
    pub pattern: DayPattern,
}

/// Everything the almanac shows for one observer and reference instant.
#[derive(Debug, Clone, Serialize)]
pub struct Almanac {
    pub observer: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zone: String,
    pub reference: DateTime<Utc>,
    pub phase_angle: f64,
    pub illumination: f64,
    pub next_events: Vec<PhaseEventRow>,
    pub days: Vec<AlmanacDay>,
}

impl Almanac {
    /// Compute the almanac for `days` civil days starting at `first_day`.
    pub fn compute<Tz>(
        observer: &str,
        lunar_time: &LunarTime<Tz>,
        reference: DateTime<Utc>,
        first_day: NaiveDate,
        days: u32,
        precision: u32,
    ) -> Result<Self, LunarError>
    where
        Tz: TimeZone + Display,
        Tz::Offset: Display,
    {
        let zone = lunar_time.zone();
        let instant = EphemerisInstant::from_utc(reference);

        let mut next_events = Vec::with_capacity(4);
        let mut cursor = instant;
        for _ in 0..4 {
            let (kind, event) = next_event(cursor)?;
            let utc = event.to_utc_seconds()?;
            next_events.push(PhaseEventRow {
                kind,
                utc,
                local: utc.with_timezone(zone).format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            });
            cursor = event.plus_days(1.0 / 86_400.0);
        }

        let mut table = Vec::with_capacity(days as usize);
        for date in first_day.iter_days().take(days as usize) {
            let moonlight = lunar_time.on(date)?;
            table.push(AlmanacDay {
                date,
                moonrise: moonlight.moonrise().map(|t| t.format("%H:%M:%S").to_string()),
                moonset: moonlight.moonset().map(|t| t.format("%H:%M:%S").to_string()),
                visible_seconds: moonlight.length(),
                pattern: moonlight.pattern(),
            });
        }

        Ok(Self {
            observer: observer.to_string(),
            latitude: lunar_time.location().latitude(),
            longitude: lunar_time.location().longitude(),
            zone: zone.to_string(),
            reference,
            phase_angle: phase_angle(instant),
            illumination: illumination_with_precision(instant, precision)?,
            next_events,
            days: table,
        })
    }
}

/// Name of the phase for an elongation in degrees.
pub fn phase_name(phase_angle: f64) -> &'static str {
    match phase_angle {
        a if !(7.5..352.5).contains(&a) => "New Moon",
        a if a < 82.5 => "Waxing Crescent",
        a if a < 97.5 => "First Quarter",
        a if a < 172.5 => "Waxing Gibbous",
        a if a < 187.5 => "Full Moon",
        a if a < 262.5 => "Waning Gibbous",
        a if a < 277.5 => "Last Quarter",
        _ => "Waning Crescent",
    }
}

/// Seconds as `HHhMMm`.
fn format_duration(seconds: i64) -> String {
    let d = Duration::seconds(seconds);
    format!("{:02}h{:02}m", d.num_hours(), d.num_minutes() % 60)
}

/// Multi-line text almanac.
pub fn render_almanac(almanac: &Almanac) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Moon over {} ({:.4}, {:.4}) [{}]\n",
        almanac.observer, almanac.latitude, almanac.longitude, almanac.zone
    ));
    out.push_str(&format!(
        "{}: {} ({:.1}°), {:.0}% illuminated\n\n",
        almanac.reference.format("%Y-%m-%d %H:%M UTC"),
        phase_name(almanac.phase_angle),
        almanac.phase_angle,
        almanac.illumination * 100.0
    ));

    out.push_str("Upcoming phases\n");
    for row in &almanac.next_events {
        out.push_str(&format!("  {:<14} {}\n", row.kind.to_string(), row.local));
    }

    out.push_str("\nDate        Moonrise  Moonset   Visible\n");
    for day in &almanac.days {
        let visible = match day.pattern {
            DayPattern::AlwaysUp => "all day".to_string(),
            DayPattern::AlwaysDown => "none".to_string(),
            _ => format_duration(day.visible_seconds),
        };
        out.push_str(&format!(
            "{}  {:<8}  {:<8}  {}\n",
            day.date,
            day.moonrise.as_deref().unwrap_or("--"),
            day.moonset.as_deref().unwrap_or("--"),
            visible
        ));
    }
    out
}

/// ASCII chart of the illuminated fraction, one column per sample.
pub fn render_chart(series: &IlluminationSeries) -> Vec<String> {
    const ROWS: usize = 11; // 0 %, 10 % ... 100 %
    const Y_AXIS_WIDTH: usize = 5; // Space for Y-axis labels
    let sample_count = series.samples.len();
    if sample_count == 0 {
        return Vec::new();
    }

    let fraction_to_row =
        |fraction: f32| ((1.0 - fraction.clamp(0.0, 1.0)) * (ROWS as f32 - 1.0)).round() as usize;

    let mut grid = vec![vec![' '; sample_count + Y_AXIS_WIDTH]; ROWS];

    for (row, line) in grid.iter_mut().enumerate() {
        if row % 5 == 0 {
            let label = format!("{:>3}%", 100 - row * 10);
            for (i, ch) in label.chars().enumerate() {
                line[i] = ch;
            }
        }
        line[Y_AXIS_WIDTH - 1] = '│';
    }

    // "now" sits at the centre of the window
    let center_index = sample_count / 2;
    for (column, sample) in series.samples.iter().enumerate() {
        let row = fraction_to_row(sample.fraction);
        grid[row][column + Y_AXIS_WIDTH] = if column == center_index { 'X' } else { '•' };
    }

    let mut lines: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();

    let padding = " ".repeat(Y_AXIS_WIDTH);
    let first = series.samples.first().map_or(0, |s| s.hours_rel);
    let last = series.samples.last().map_or(0, |s| s.hours_rel);
    let left_label = format!("{}d", first / 24);
    let right_label = format!("+{}d", last / 24);
    let now_text = "Now";
    let left_width = center_index.saturating_sub(now_text.len() / 2);
    let right_width = sample_count.saturating_sub(left_width + now_text.len());
    lines.push(format!(
        "{}{:<lw$}{}{:>rw$}",
        padding,
        left_label,
        now_text,
        right_label,
        lw = left_width,
        rw = right_width
    ));
    lines.push(format!(
        "{}{}",
        padding,
        if series.waxing { "waxing" } else { "waning" }
    ));
    lines
}

/// Print the illumination chart to stdout.
pub fn draw_ascii(series: &IlluminationSeries) {
    for line in render_chart(series) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IlluminationSample;
    use chrono_tz::Europe::Berlin;
    use std::collections::HashSet;

    fn test_series() -> IlluminationSeries {
        IlluminationSeries {
            samples: vec![
                IlluminationSample { hours_rel: -48, fraction: 0.0 },
                IlluminationSample { hours_rel: -24, fraction: 0.25 },
                IlluminationSample { hours_rel: 0, fraction: 0.5 },
                IlluminationSample { hours_rel: 24, fraction: 0.75 },
                IlluminationSample { hours_rel: 48, fraction: 1.0 },
            ],
            waxing: true,
        }
    }

    #[test]
    fn test_phase_name() {
        assert_eq!(phase_name(0.0), "New Moon");
        assert_eq!(phase_name(355.0), "New Moon");
        assert_eq!(phase_name(45.0), "Waxing Crescent");
        assert_eq!(phase_name(90.0), "First Quarter");
        assert_eq!(phase_name(180.0), "Full Moon");
        assert_eq!(phase_name(200.0), "Waning Gibbous");
        assert_eq!(phase_name(270.0), "Last Quarter");
        assert_eq!(phase_name(300.0), "Waning Crescent");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(41_010), "11h23m");
        assert_eq!(format_duration(0), "00h00m");
    }

    #[test]
    fn test_render_chart() {
        let lines = render_chart(&test_series());
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("100%│"));
        assert!(lines[10].starts_with("  0%│"));
        // full moon in the top row, last column
        assert_eq!(lines[0].chars().last(), Some('•'));
        // "now" marker halfway up
        assert_eq!(lines[5].chars().nth(5 + 2), Some('X'));
        assert!(lines[11].contains("Now"));
        assert_eq!(lines[12].trim(), "waxing");
    }

    #[test]
    fn test_empty_chart() {
        let empty = IlluminationSeries { samples: Vec::new(), waxing: false };
        assert!(render_chart(&empty).is_empty());
    }

    #[test]
    fn test_almanac_munich() {
        let lunar_time = LunarTime::new(Berlin, 48.1, 11.6).unwrap();
        let reference = Utc.with_ymd_and_hms(2000, 3, 25, 0, 0, 0).unwrap();
        let first_day = NaiveDate::from_ymd_opt(2000, 3, 25).unwrap();
        let almanac = Almanac::compute("Munich", &lunar_time, reference, first_day, 3, 2).unwrap();

        assert_eq!(almanac.days.len(), 3);
        assert_eq!(almanac.next_events.len(), 4);
        assert_eq!(almanac.zone, "Europe/Berlin");
        for pair in almanac.next_events.windows(2) {
            assert!(pair[0].utc < pair[1].utc);
        }
        // four consecutive events cover each kind once
        let kinds: HashSet<_> = almanac.next_events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds.len(), 4);

        let text = render_almanac(&almanac);
        assert!(text.starts_with("Moon over Munich"));
        assert!(text.contains("2000-03-25"));
        assert!(text.contains("Upcoming phases"));

        let json = serde_json::to_value(&almanac).unwrap();
        assert_eq!(json["days"][0]["date"], "2000-03-25");
    }
}
