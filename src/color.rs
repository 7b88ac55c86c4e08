use crate::types::{ColorQuad, EnrichedRecord};

/// Fill-color scheme: channel layout, ramp direction, and the fixed alpha
/// applied to records that carry a value. Call sites differ in ramp
/// direction, so the scheme is explicit configuration rather than a
/// per-caller constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Black-to-red ramp: `[intensity, 0, 0, alpha]`.
    Red { alpha: u8 },
    /// White-to-blue ramp: `[255 - intensity, 255 - intensity, 255, alpha]`.
    Blue { alpha: u8 },
}

impl ColorScheme {
    /// Partial transparency used by both observed ramps.
    pub const DEFAULT_ALPHA: u8 = 140;

    pub fn quad(&self, intensity: u8) -> ColorQuad {
        match *self {
            ColorScheme::Red { alpha } => ColorQuad([intensity, 0, 0, alpha]),
            ColorScheme::Blue { alpha } => {
                let inverted = 255 - intensity;
                ColorQuad([inverted, inverted, 255, alpha])
            }
        }
    }
}

/// Map one numeric attribute of each record to a fill color.
///
/// Two passes: a global max over the attribute's finite numeric values, then
/// per record `intensity = round(value / max * 255)` clamped to [0, 255].
/// Records with no numeric value get [`ColorQuad::NO_DATA`] (alpha 0,
/// distinct from a value of zero). An undefined or non-positive max yields
/// intensity 0 for every valued record, without dividing.
pub fn colorize(records: &[EnrichedRecord], attribute: &str, scheme: ColorScheme) -> Vec<ColorQuad> {
    let max = records
        .iter()
        .filter_map(|record| record.numeric(attribute))
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(m) => Some(m.max(v)),
            None => Some(v),
        });

    records
        .iter()
        .map(|record| match record.numeric(attribute) {
            None => ColorQuad::NO_DATA,
            Some(value) => {
                let intensity = match max {
                    Some(m) if m > 0.0 => (value / m * 255.0).round().clamp(0.0, 255.0) as u8,
                    _ => 0,
                };
                scheme.quad(intensity)
            }
        })
        .collect()
}

/// Colorize and attach the result to each record's `fill_color`.
pub fn attach_colors(
    records: Vec<EnrichedRecord>,
    attribute: &str,
    scheme: ColorScheme,
) -> Vec<EnrichedRecord> {
    let colors = colorize(&records, attribute, scheme);
    records
        .into_iter()
        .zip(colors)
        .map(|(mut record, color)| {
            record.fill_color = Some(color);
            record
        })
        .collect()
}
