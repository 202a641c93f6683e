//! Output renderers for discovered topologies.

pub mod dot;
pub mod json;
pub mod svg;

use pgtopo::Snapshot;

/// Output format selected by the `r` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Dot,
    Svg,
}

impl Format {
    /// Parse the `r` parameter. Anything unrecognised falls back to JSON.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("dot") => Self::Dot,
            Some("svg") => Self::Svg,
            _ => Self::Json,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Dot => "text/vnd.graphviz",
            Self::Svg => "image/svg+xml",
        }
    }
}

/// Render a snapshot in the given format.
pub fn render(format: Format, snapshot: &Snapshot) -> String {
    match format {
        Format::Json => json::render(snapshot),
        Format::Dot => dot::render(snapshot),
        Format::Svg => svg::render(snapshot),
    }
}
