//! Renders the growth of two logging backends as a comparison chart.
//!
//! The output format is chosen from the extension of the output path:
//!
//! | Extension | Output                                                          |
//! |-----------|-----------------------------------------------------------------|
//! | `.html`   | A page drawing both series as a Chart.js line chart             |
//! | `.svg`    | A self-contained SVG line chart that needs no browser or network |
//! | `.json`   | The raw labeled series                                          |
//!
//! Both series may have a different number of observations. Charts plot each observation at its
//! own elapsed time rather than assuming shared sample points.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::Path;

use logstress_types::LabeledSeries;
use serde::Serialize;
use thiserror::Error;

mod html;
mod svg;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing the artifact failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The series could not be serialized.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Formatting the chart markup failed.
    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),

    /// The output path has an extension that no renderer handles.
    #[error("unsupported report format: {0:?}")]
    UnsupportedFormat(String),
}

/// Output formats understood by [`render`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Chart.js page.
    Html,
    /// Standalone SVG chart.
    Svg,
    /// Raw series as JSON.
    Json,
}

impl Format {
    /// Determines the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "html" | "htm" => Ok(Self::Html),
            "svg" => Ok(Self::Svg),
            "json" => Ok(Self::Json),
            _ => Err(RenderError::UnsupportedFormat(extension)),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    label: &'a str,
    observations: &'a logstress_types::TimeSeries,
}

/// Renders both series into a comparison artifact at `output`.
///
/// Parent directories of `output` are created as needed. An existing file is replaced.
pub async fn render(
    a: LabeledSeries<'_>,
    b: LabeledSeries<'_>,
    output: &Path,
) -> Result<(), RenderError> {
    let contents = match Format::from_path(output)? {
        Format::Html => html::render(a, b)?,
        Format::Svg => svg::render(a, b)?,
        Format::Json => {
            let report = [a, b].map(|s| JsonReport {
                label: s.label,
                observations: s.series,
            });
            serde_json::to_string_pretty(&report)?
        }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, contents).await?;

    Ok(())
}
