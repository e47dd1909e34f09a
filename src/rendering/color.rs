//! CSS colour parsing for effect and cursor colours.

use crate::config::EffectConfig;
use crate::events::{ClickEvent, ClickKind};

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha (0.0-1.0).
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same colour with alpha multiplied by `factor`.
    pub fn fade(self, factor: f32) -> Self {
        let factor = if factor.is_nan() { 0.0 } else { factor };
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Blend toward white by `amount` (0.0-1.0).
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
            a: self.a,
        }
    }
}

/// Parse a CSS colour string.
///
/// Supports:
/// - `#RRGGBB` (alpha 1.0)
/// - `#RRGGBBAA`
/// - `rgb(r, g, b)`
/// - `rgba(r, g, b, a)` with `a` in 0.0-1.0
pub fn parse_color(color: &str) -> Option<Rgba> {
    let color = color.trim();

    if let Some(hex) = color.strip_prefix('#') {
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
        };
        return match hex.len() {
            6 => Some(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Rgba {
                a: channel(6)? as f32 / 255.0,
                ..Rgba::rgb(channel(0)?, channel(2)?, channel(4)?)
            }),
            _ => None,
        };
    }

    if let Some(inner) = color
        .strip_prefix("rgba(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
        if parts.len() != 4 {
            return None;
        }
        let a: f32 = parts[3].parse().ok()?;
        if !a.is_finite() {
            return None;
        }
        return Some(Rgba {
            r: parts[0].parse().ok()?,
            g: parts[1].parse().ok()?,
            b: parts[2].parse().ok()?,
            a: a.clamp(0.0, 1.0),
        });
    }

    if let Some(inner) = color
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
        if parts.len() != 3 {
            return None;
        }
        return Some(Rgba::rgb(
            parts[0].parse().ok()?,
            parts[1].parse().ok()?,
            parts[2].parse().ok()?,
        ));
    }

    None
}

/// Parse with a fallback, logging unparseable strings.
pub fn parse_color_or(color: &str, fallback: Rgba) -> Rgba {
    parse_color(color).unwrap_or_else(|| {
        log::trace!("[COMPOSITOR] Unrecognised colour {:?}, using fallback", color);
        fallback
    })
}

const PRIMARY_FALLBACK: Rgba = Rgba::rgb(0x3B, 0x82, 0xF6);
const SECONDARY_FALLBACK: Rgba = Rgba::rgb(0xEF, 0x44, 0x44);

/// Colour for a click effect.
///
/// Resolution order: the click's own colour, then the configured override,
/// then the configured default for the click kind.
pub fn click_color(click: &ClickEvent, config: &EffectConfig) -> Rgba {
    let kind_default = match click.kind {
        ClickKind::Primary => parse_color(&config.primary_color).unwrap_or(PRIMARY_FALLBACK),
        ClickKind::Secondary => {
            parse_color(&config.secondary_color).unwrap_or(SECONDARY_FALLBACK)
        }
    };

    click
        .color
        .as_deref()
        .or(config.color.as_deref())
        .and_then(parse_color)
        .unwrap_or(kind_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_color("#FF8000"), Some(Rgba::rgb(255, 128, 0)));
        let c = parse_color("#00000080").unwrap();
        assert_eq!((c.r, c.g, c.b), (0, 0, 0));
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(parse_color("#FFF"), None);
        assert_eq!(parse_color("#GG0000"), None);
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(parse_color(" rgb(1, 2, 3) "), Some(Rgba::rgb(1, 2, 3)));
        let c = parse_color("rgba(10,20,30,0.25)").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (10, 20, 30, 0.25));
        assert_eq!(parse_color("rgba(10,20,30)"), None);
        assert_eq!(parse_color("rgb(300,0,0)"), None);
        assert_eq!(parse_color("blue"), None);
    }

    #[test]
    fn test_non_ascii_does_not_panic() {
        assert_eq!(parse_color("#ééé"), None);
    }

    #[test]
    fn test_click_color_resolution() {
        let mut config = EffectConfig::default();
        let mut click = ClickEvent::new(1.0, 0.5, 0.5, ClickKind::Secondary);
        assert_eq!(click_color(&click, &config), Rgba::rgb(0xEF, 0x44, 0x44));

        config.color = Some("#00FF00".to_string());
        assert_eq!(click_color(&click, &config), Rgba::rgb(0, 255, 0));

        click.color = Some("rgb(1,2,3)".to_string());
        assert_eq!(click_color(&click, &config), Rgba::rgb(1, 2, 3));

        // Unparseable override falls through to the kind default
        click.color = Some("nope".to_string());
        config.color = None;
        assert_eq!(click_color(&click, &config), Rgba::rgb(0xEF, 0x44, 0x44));
    }

    #[test]
    fn test_fade_and_lighten() {
        let c = Rgba::rgb(0, 100, 255).fade(0.5);
        assert_eq!(c.a, 0.5);
        assert_eq!(c.fade(f32::NAN).a, 0.0);
        let light = Rgba::rgb(0, 0, 0).lighten(1.0);
        assert_eq!((light.r, light.g, light.b), (255, 255, 255));
    }
}
