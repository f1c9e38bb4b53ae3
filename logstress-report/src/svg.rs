use std::fmt::{self, Write};

use logstress_types::LabeledSeries;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 70.0;
const COLORS: [&str; 2] = ["#4bc0c0", "#ff6384"];
const GRID_LINES: u32 = 5;

/// Maps observation coordinates onto the plot area.
struct Scale {
    max_x: f64,
    max_y: f64,
}

impl Scale {
    fn x(&self, seconds: f64) -> f64 {
        MARGIN + seconds / self.max_x * (WIDTH - 2.0 * MARGIN)
    }

    fn y(&self, bytes: f64) -> f64 {
        HEIGHT - MARGIN - bytes / self.max_y * (HEIGHT - 2.0 * MARGIN)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn render(a: LabeledSeries<'_>, b: LabeledSeries<'_>) -> Result<String, fmt::Error> {
    let series = [a, b];

    // Avoid division by zero for empty or flat series.
    let scale = Scale {
        max_x: series
            .iter()
            .map(|s| s.series.duration())
            .fold(0.0, f64::max)
            .max(1.0),
        max_y: series
            .iter()
            .map(|s| s.series.max_size())
            .max()
            .unwrap_or(0)
            .max(1) as f64,
    };

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    )?;
    writeln!(out, r#"  <rect width="100%" height="100%" fill="white"/>"#)?;

    for i in 0..=GRID_LINES {
        let fraction = f64::from(i) / f64::from(GRID_LINES);
        let y = scale.y(fraction * scale.max_y);
        let x = scale.x(fraction * scale.max_x);
        writeln!(
            out,
            r##"  <line x1="{MARGIN}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e0e0"/>"##,
            WIDTH - MARGIN
        )?;
        writeln!(
            out,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end">{:.0}</text>"#,
            MARGIN - 6.0,
            y + 4.0,
            fraction * scale.max_y
        )?;
        writeln!(
            out,
            r#"  <text x="{x:.1}" y="{:.1}" text-anchor="middle">{:.1}</text>"#,
            HEIGHT - MARGIN + 18.0,
            fraction * scale.max_x
        )?;
    }

    writeln!(
        out,
        r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle">Time (seconds)</text>"#,
        WIDTH / 2.0,
        HEIGHT - 20.0
    )?;
    writeln!(
        out,
        r#"  <text x="16" y="{:.1}" text-anchor="middle" transform="rotate(-90 16 {:.1})">File size (bytes)</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    )?;

    for (index, (s, color)) in series.iter().zip(COLORS).enumerate() {
        let points = s
            .series
            .iter()
            .map(|o| {
                format!(
                    "{:.1},{:.1}",
                    scale.x(o.elapsed_seconds),
                    scale.y(o.size_bytes as f64)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            r#"  <polyline fill="none" stroke="{color}" stroke-width="2" points="{points}"/>"#
        )?;

        let legend_y = 20.0 + 18.0 * index as f64;
        writeln!(
            out,
            r#"  <rect x="{MARGIN}" y="{:.1}" width="12" height="12" fill="{color}"/>"#,
            legend_y - 10.0
        )?;
        writeln!(
            out,
            r#"  <text x="{:.1}" y="{legend_y:.1}">{} log file size (bytes)</text>"#,
            MARGIN + 18.0,
            escape(s.label)
        )?;
    }

    writeln!(out, "</svg>")?;
    Ok(out)
}
