use std::fmt;

use crate::arena_dom::AttributeSnapshot;
use crate::css_parser::{parse_style_attribute, serialize_css_declarations, CssDeclaration};

/// Default pair applied when either dimension is unspecified: the
/// element becomes a 400px fixed-height block with automatic width.
pub const FALLBACK_HEIGHT: u32 = 400;
pub const FALLBACK_LAYOUT: Layout = Layout::FixedHeight;
pub const AUTO_WIDTH: &str = "auto";

/// The closed set of AMP sizing strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    Responsive,
    FixedHeight,
    Fill,
    Fixed,
    Intrinsic,
    FlexItem,
    NoDisplay,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Responsive => "responsive",
            Layout::FixedHeight => "fixed-height",
            Layout::Fill => "fill",
            Layout::Fixed => "fixed",
            Layout::Intrinsic => "intrinsic",
            Layout::FlexItem => "flex-item",
            Layout::NoDisplay => "nodisplay",
        }
    }

    pub fn parse(value: &str) -> Option<Layout> {
        match value {
            "responsive" => Some(Layout::Responsive),
            "fixed-height" => Some(Layout::FixedHeight),
            "fill" => Some(Layout::Fill),
            "fixed" => Some(Layout::Fixed),
            "intrinsic" => Some(Layout::Intrinsic),
            "flex-item" => Some(Layout::FlexItem),
            "nodisplay" => Some(Layout::NoDisplay),
            _ => None,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A width or height as written in markup. `Empty` covers the absent,
/// explicitly cleared, and unparseable cases alike.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dimension {
    Empty,
    Auto,
    Px(f64),
    Percent(f64),
}

impl Dimension {
    /// A trailing `px` is stripped before numeric coercion; decimals
    /// survive; negative and non-numeric input collapses to `Empty`.
    pub fn parse(raw: &str) -> Dimension {
        let value = raw.trim();
        if value.is_empty() {
            return Dimension::Empty;
        }
        if value.eq_ignore_ascii_case("auto") {
            return Dimension::Auto;
        }
        if let Some(percent) = value.strip_suffix('%') {
            return match parse_non_negative(percent) {
                Some(number) => Dimension::Percent(number),
                None => Dimension::Empty,
            };
        }
        let numeric = if value.len() >= 2 && value[value.len() - 2..].eq_ignore_ascii_case("px") {
            &value[..value.len() - 2]
        } else {
            value
        };
        match parse_non_negative(numeric) {
            Some(number) => Dimension::Px(number),
            None => Dimension::Empty,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Dimension::Empty
    }

    pub fn to_attr_value(self) -> Option<String> {
        match self {
            Dimension::Empty => None,
            Dimension::Auto => Some(AUTO_WIDTH.to_string()),
            Dimension::Px(number) => Some(format_number(number)),
            Dimension::Percent(number) => Some(format!("{}%", format_number(number))),
        }
    }
}

fn parse_non_negative(value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() && number >= 0.0 => Some(number),
        _ => None,
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

#[derive(Debug, Default)]
pub struct LayoutHints {
    pub explicit_layout: Option<Layout>,
    pub noloading: bool,
    pub content_max_width: Option<u32>,
}

/// Derives layout, width, height and style for an element from its
/// partial sizing hints. Pure: input attributes in, resolved
/// attributes out.
pub fn resolve_layout(attrs: &AttributeSnapshot, hints: &LayoutHints) -> AttributeSnapshot {
    let mut resolved = attrs.clone();
    let mut width = attrs
        .get("width")
        .map(|raw| Dimension::parse(raw))
        .unwrap_or(Dimension::Empty);
    let mut height = attrs
        .get("height")
        .map(|raw| Dimension::parse(raw))
        .unwrap_or(Dimension::Empty);
    let mut layout = hints.explicit_layout;

    let style_declarations = attrs
        .get("style")
        .map(|style| parse_style_attribute(style))
        .unwrap_or_default();

    if selects_fill(&style_declarations, width, height) {
        let remaining: Vec<CssDeclaration> = style_declarations
            .into_iter()
            .filter(|declaration| !consumed_by_fill(declaration))
            .collect();
        if remaining.is_empty() {
            resolved.remove("style");
        } else {
            resolved.insert("style".into(), serialize_css_declarations(&remaining));
        }
        resolved.remove("width");
        resolved.remove("height");
        resolved.insert("layout".into(), Layout::Fill.as_str().into());
        if hints.noloading {
            resolved.insert("noloading".into(), String::new());
        }
        return resolved;
    }

    if let Dimension::Percent(percent) = width {
        width = match hints.content_max_width {
            Some(max_width) => {
                Dimension::Px((percent * f64::from(max_width) / 100.0).round())
            }
            // A percentage is meaningless without a container width to
            // resolve against.
            None => Dimension::Empty,
        };
    }
    if let Dimension::Percent(_) = height {
        height = Dimension::Empty;
    }

    if width.is_empty() || height.is_empty() {
        height = Dimension::Px(f64::from(FALLBACK_HEIGHT));
        width = Dimension::Auto;
        layout = Some(FALLBACK_LAYOUT);
    }

    match width.to_attr_value() {
        Some(value) => {
            resolved.insert("width".into(), value);
        }
        None => {
            resolved.remove("width");
        }
    }
    match height.to_attr_value() {
        Some(value) => {
            resolved.insert("height".into(), value);
        }
        None => {
            resolved.remove("height");
        }
    }
    if let Some(layout) = layout {
        resolved.insert("layout".into(), layout.as_str().into());
    }
    if hints.noloading {
        resolved.insert("noloading".into(), String::new());
    }
    resolved
}

/// `position:absolute` pinned to all four edges or spanning 100% both
/// ways means the element fills its container; a bare 100%×100%
/// attribute pair says the same thing without any style.
fn selects_fill(declarations: &[CssDeclaration], width: Dimension, height: Dimension) -> bool {
    let attrs_full =
        width == Dimension::Percent(100.0) && height == Dimension::Percent(100.0);
    let absolute = declarations.iter().any(|declaration| {
        declaration.property.eq_ignore_ascii_case("position")
            && declaration.value.eq_ignore_ascii_case("absolute")
    });
    if !absolute {
        return attrs_full;
    }
    let edges_pinned = ["top", "left", "right", "bottom"].iter().all(|edge| {
        declarations.iter().any(|declaration| {
            declaration.property.eq_ignore_ascii_case(edge) && is_zero(&declaration.value)
        })
    });
    let style_full = is_full_declaration(declarations, "width")
        && is_full_declaration(declarations, "height");
    edges_pinned || style_full || attrs_full
}

fn consumed_by_fill(declaration: &CssDeclaration) -> bool {
    let property = declaration.property.to_ascii_lowercase();
    match property.as_str() {
        "position" => declaration.value.eq_ignore_ascii_case("absolute"),
        "top" | "left" | "right" | "bottom" => is_zero(&declaration.value),
        "width" | "height" => declaration.value.trim() == "100%",
        _ => false,
    }
}

fn is_zero(value: &str) -> bool {
    matches!(value.trim(), "0" | "0px")
}

fn is_full_declaration(declarations: &[CssDeclaration], property: &str) -> bool {
    declarations.iter().any(|declaration| {
        declaration.property.eq_ignore_ascii_case(property) && declaration.value.trim() == "100%"
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(entries: &[(&str, &str)]) -> AttributeSnapshot {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn missing_dimensions_default_to_fixed_height() {
        let resolved = resolve_layout(&snapshot(&[("src", "a")]), &LayoutHints::default());
        assert_eq!(resolved.get("height").unwrap(), "400");
        assert_eq!(resolved.get("layout").unwrap(), "fixed-height");
        assert_eq!(resolved.get("width").unwrap(), "auto");
    }

    #[test]
    fn empty_height_defaults_too() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "300"), ("height", "")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("height").unwrap(), "400");
        assert_eq!(resolved.get("layout").unwrap(), "fixed-height");
        assert_eq!(resolved.get("width").unwrap(), "auto");
    }

    #[test]
    fn both_dimensions_leave_layout_unset() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "300"), ("height", "200")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("width").unwrap(), "300");
        assert_eq!(resolved.get("height").unwrap(), "200");
        assert!(resolved.get("layout").is_none());
    }

    #[test]
    fn px_suffix_stripped_and_decimals_preserved() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "300px"), ("height", "187.5px")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("width").unwrap(), "300");
        assert_eq!(resolved.get("height").unwrap(), "187.5");
    }

    #[test]
    fn garbage_dimension_falls_back() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "wide"), ("height", "200")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("layout").unwrap(), "fixed-height");
        assert_eq!(resolved.get("width").unwrap(), "auto");
    }

    #[test]
    fn negative_dimension_is_empty() {
        assert_eq!(Dimension::parse("-5"), Dimension::Empty);
        assert_eq!(Dimension::parse("-5%"), Dimension::Empty);
    }

    #[test]
    fn percent_width_resolves_against_content_max_width() {
        let hints = LayoutHints {
            content_max_width: Some(600),
            ..Default::default()
        };
        let resolved = resolve_layout(&snapshot(&[("width", "50%"), ("height", "200")]), &hints);
        assert_eq!(resolved.get("width").unwrap(), "300");
        assert_eq!(resolved.get("height").unwrap(), "200");
        assert!(resolved.get("layout").is_none());
    }

    #[test]
    fn percent_width_without_container_falls_back() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "50%"), ("height", "200")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("layout").unwrap(), "fixed-height");
        assert_eq!(resolved.get("width").unwrap(), "auto");
    }

    #[test]
    fn percent_height_always_resolves_to_empty() {
        let hints = LayoutHints {
            content_max_width: Some(600),
            ..Default::default()
        };
        let resolved = resolve_layout(&snapshot(&[("width", "300"), ("height", "50%")]), &hints);
        assert_eq!(resolved.get("layout").unwrap(), "fixed-height");
        assert_eq!(resolved.get("height").unwrap(), "400");
    }

    #[test]
    fn full_size_attribute_pair_selects_fill() {
        let resolved = resolve_layout(
            &snapshot(&[("width", "100%"), ("height", "100%")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("layout").unwrap(), "fill");
        assert!(resolved.get("width").is_none());
        assert!(resolved.get("height").is_none());
    }

    #[test]
    fn absolute_position_pinned_edges_select_fill() {
        let resolved = resolve_layout(
            &snapshot(&[(
                "style",
                "position:absolute;top:0;left:0;right:0;bottom:0;color:red",
            )]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("layout").unwrap(), "fill");
        // Unrelated declarations survive, consumed ones do not.
        assert_eq!(resolved.get("style").unwrap(), "color:red");
    }

    #[test]
    fn fully_consumed_style_attribute_is_removed() {
        let resolved = resolve_layout(
            &snapshot(&[("style", "position:absolute;width:100%;height:100%")]),
            &LayoutHints::default(),
        );
        assert_eq!(resolved.get("layout").unwrap(), "fill");
        assert!(resolved.get("style").is_none());
    }

    #[test]
    fn absolute_without_fill_signal_is_not_fill() {
        let resolved = resolve_layout(
            &snapshot(&[("style", "position:absolute;top:10px"), ("width", "300"), ("height", "200")]),
            &LayoutHints::default(),
        );
        assert!(resolved.get("layout").is_none());
        assert_eq!(
            resolved.get("style").unwrap(),
            "position:absolute;top:10px"
        );
    }

    #[test]
    fn explicit_layout_hint_is_applied() {
        let hints = LayoutHints {
            explicit_layout: Some(Layout::Intrinsic),
            ..Default::default()
        };
        let resolved = resolve_layout(&snapshot(&[("width", "300"), ("height", "200")]), &hints);
        assert_eq!(resolved.get("layout").unwrap(), "intrinsic");
    }

    #[test]
    fn noloading_hint_adds_attribute() {
        let hints = LayoutHints {
            noloading: true,
            ..Default::default()
        };
        let resolved = resolve_layout(&snapshot(&[]), &hints);
        assert_eq!(resolved.get("noloading").unwrap(), "");
    }

    #[test]
    fn layout_spellings_round_trip() {
        for layout in [
            Layout::Responsive,
            Layout::FixedHeight,
            Layout::Fill,
            Layout::Fixed,
            Layout::Intrinsic,
            Layout::FlexItem,
            Layout::NoDisplay,
        ]
        .iter()
        {
            assert_eq!(Layout::parse(layout.as_str()), Some(*layout));
        }
        assert_eq!(Layout::parse("container"), None);
    }
}
