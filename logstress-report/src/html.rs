use logstress_types::LabeledSeries;
use serde::Serialize;

const COLORS: [&str; 2] = ["rgba(75, 192, 192, 1)", "rgba(255, 99, 132, 1)"];

#[derive(Serialize)]
struct Point {
    x: f64,
    y: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dataset {
    label: String,
    data: Vec<Point>,
    border_color: &'static str,
    fill: bool,
    tension: f64,
}

fn dataset(series: LabeledSeries<'_>, color: &'static str) -> Dataset {
    Dataset {
        label: format!("{} log file size (bytes)", series.label),
        data: series
            .series
            .iter()
            .map(|o| Point {
                x: o.elapsed_seconds,
                y: o.size_bytes,
            })
            .collect(),
        border_color: color,
        fill: false,
        tension: 0.1,
    }
}

pub(crate) fn render(
    a: LabeledSeries<'_>,
    b: LabeledSeries<'_>,
) -> Result<String, serde_json::Error> {
    // The JSON sits inside a `<script>` element, where a literal `</script>` would end it.
    let datasets = serde_json::to_string(&[dataset(a, COLORS[0]), dataset(b, COLORS[1])])?
        .replace('<', "\\u003c");
    // Labels end up inside the `<title>`, so keep them free of markup.
    let title = format!("{} vs {}", a.label, b.label).replace(['<', '>', '&'], "");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Log file size: {title}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <style>
      body {{ margin: 0; }}
      canvas {{ display: block; }}
    </style>
  </head>
  <body>
    <canvas id="chart" width="800" height="600"></canvas>
    <script>
      new Chart(document.getElementById('chart').getContext('2d'), {{
        type: 'line',
        data: {{ datasets: {datasets} }},
        options: {{
          scales: {{
            x: {{ type: 'linear', title: {{ display: true, text: 'Time (seconds)' }} }},
            y: {{ title: {{ display: true, text: 'File size (bytes)' }} }}
          }}
        }}
      }});
    </script>
  </body>
</html>
"#
    ))
}

#[cfg(test)]
mod tests {
    use logstress_types::{Observation, TimeSeries};

    use super::*;

    #[test]
    fn embeds_points_as_json() {
        let a: TimeSeries = [Observation {
            elapsed_seconds: 1.5,
            size_bytes: 42,
        }]
        .into_iter()
        .collect();
        let b = TimeSeries::new();

        let html = render(LabeledSeries::new("a", &a), LabeledSeries::new("b", &b)).unwrap();
        assert!(html.contains(r#""data":[{"x":1.5,"y":42}]"#));
        assert!(html.contains(r#""data":[]"#));
        assert!(html.contains(r#""borderColor":"rgba(75, 192, 192, 1)""#));
    }

    #[test]
    fn labels_cannot_close_script_element() {
        let empty = TimeSeries::new();
        let html = render(
            LabeledSeries::new("</script><script>alert(1)//", &empty),
            LabeledSeries::new("b", &empty),
        )
        .unwrap();

        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains(r#"\u003c/script>\u003cscript>alert(1)//"#));
    }
}
