//! # Class Name Merging
//!
//! `cn` joins utility-class lists for presentation code. Later utilities win
//! over earlier ones from the same group under the same variant prefix.
//!
//! ```text
//!   cn(["px-2 py-1 text-sm", ("text-lg", is_large), "p-4"])
//!                                  │
//!        ┌─────────────────────────┼────────────────────────────┐
//!        ▼                         ▼                            ▼
//!   px-2, py-1 dropped      text-sm dropped (if is_large)   p-4 kept
//!   (p overrides px/py)     (same font-size group)
//! ```
//!
//! The grouping is a small, fixed subset of the common utility vocabulary.
//! Unknown classes only collapse with exact duplicates.

use std::collections::HashSet;

/// One `cn` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassValue<'a> {
    /// Whitespace-separated classes.
    Classes(&'a str),
    /// Classes included only when the flag is set.
    When(&'a str, bool),
    Skip,
}

impl<'a> From<&'a str> for ClassValue<'a> {
    fn from(classes: &'a str) -> Self {
        ClassValue::Classes(classes)
    }
}

impl<'a> From<&'a String> for ClassValue<'a> {
    fn from(classes: &'a String) -> Self {
        ClassValue::Classes(classes.as_str())
    }
}

impl<'a> From<(&'a str, bool)> for ClassValue<'a> {
    fn from((classes, enabled): (&'a str, bool)) -> Self {
        ClassValue::When(classes, enabled)
    }
}

impl<'a> From<Option<&'a str>> for ClassValue<'a> {
    fn from(classes: Option<&'a str>) -> Self {
        classes.map_or(ClassValue::Skip, ClassValue::Classes)
    }
}

impl<'a> ClassValue<'a> {
    fn classes(self) -> Option<&'a str> {
        match self {
            ClassValue::Classes(c) => Some(c),
            ClassValue::When(c, true) => Some(c),
            ClassValue::When(_, false) | ClassValue::Skip => None,
        }
    }
}

/// Merges class lists.
///
/// ## Example
/// ```rust
/// use scripters_core::class_names::{cn, ClassValue};
///
/// assert_eq!(cn(["px-2 py-1", "p-4"]), "p-4");
/// assert_eq!(cn(["text-sm text-gray-500", "text-lg"]), "text-gray-500 text-lg");
///
/// let active = false;
/// let classes: [ClassValue; 2] = ["btn".into(), ("btn-active", active).into()];
/// assert_eq!(cn(classes), "btn");
/// ```
pub fn cn<'a, I, C>(classes: I) -> String
where
    I: IntoIterator<Item = C>,
    C: Into<ClassValue<'a>>,
{
    let tokens: Vec<&str> = classes
        .into_iter()
        .filter_map(|c| Into::<ClassValue<'a>>::into(c).classes())
        .flat_map(str::split_whitespace)
        .collect();

    let mut claimed: HashSet<String> = HashSet::new();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());

    for &token in tokens.iter().rev() {
        let (variants, utility) = split_variants(token);
        let group = class_group(utility);
        let key = format!("{}{}", variants, group);
        if claimed.contains(&key) {
            continue;
        }
        for overridden in overrides(&group) {
            claimed.insert(format!("{}{}", variants, overridden));
        }
        claimed.insert(key);
        kept.push(token);
    }

    kept.reverse();
    kept.join(" ")
}

/// `hover:md:!bg-red-500` → (`hover:md:!`, `bg-red-500`).
fn split_variants(token: &str) -> (&str, &str) {
    let split = match token.rfind(':') {
        Some(i) if !token[..i].contains('[') => i + 1,
        _ => 0,
    };
    let (variants, mut utility) = token.split_at(split);
    let important = utility.starts_with('!');
    if important {
        utility = &utility[1..];
        return (&token[..split + 1], utility);
    }
    (variants, utility)
}

// =============================================================================
// Groups
// =============================================================================

const DISPLAY: &[&str] = &[
    "block", "inline-block", "inline", "flex", "inline-flex", "grid", "inline-grid", "hidden",
    "table", "contents", "flow-root", "list-item",
];

const POSITION: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];

const FONT_SIZES: &[&str] = &[
    "xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "8xl", "9xl",
];

const TEXT_ALIGN: &[&str] = &["left", "center", "right", "justify", "start", "end"];

const FONT_WEIGHTS: &[&str] = &[
    "thin", "extralight", "light", "normal", "medium", "semibold", "bold", "extrabold", "black",
];

const COLORS: &[&str] = &[
    "slate", "gray", "zinc", "neutral", "stone", "red", "orange", "amber", "yellow", "lime",
    "green", "emerald", "teal", "cyan", "sky", "blue", "indigo", "violet", "purple", "fuchsia",
    "pink", "rose", "primary", "secondary", "muted", "accent", "destructive", "foreground",
    "background",
];

const BARE_COLORS: &[&str] = &["black", "white", "transparent", "current", "inherit"];

const COLOR_PREFIXES: &[&str] = &[
    "bg", "text", "border", "ring", "from", "via", "to", "fill", "stroke", "outline",
    "decoration", "divide", "placeholder", "caret", "accent", "shadow",
];

/// Utilities whose value follows the last `-`.
const UTILITY_PREFIXES: &[&str] = &[
    "p", "px", "py", "pt", "pr", "pb", "pl", "ps", "pe", "m", "mx", "my", "mt", "mr", "mb", "ml",
    "ms", "me", "w", "h", "size", "min-w", "max-w", "min-h", "max-h", "gap", "gap-x", "gap-y",
    "space-x", "space-y", "inset", "inset-x", "inset-y", "top", "right", "bottom", "left", "z",
    "rounded", "shadow", "opacity", "ring", "ring-offset", "justify", "items", "self",
    "content", "place-items", "grid-cols", "grid-rows", "col-span", "row-span", "leading",
    "tracking", "order", "basis", "grow", "shrink", "flex", "overflow", "overflow-x",
    "overflow-y", "cursor", "duration", "ease", "delay", "transition", "translate-x",
    "translate-y", "rotate", "scale", "line-clamp", "aspect", "object", "whitespace",
];

const SPACING_SIDES: &[(&str, &[&str])] = &[
    ("p", &["px", "py", "pt", "pr", "pb", "pl", "ps", "pe"]),
    ("px", &["pr", "pl", "ps", "pe"]),
    ("py", &["pt", "pb"]),
    ("m", &["mx", "my", "mt", "mr", "mb", "ml", "ms", "me"]),
    ("mx", &["mr", "ml", "ms", "me"]),
    ("my", &["mt", "mb"]),
    ("inset", &["inset-x", "inset-y", "top", "right", "bottom", "left"]),
    ("inset-x", &["right", "left"]),
    ("inset-y", &["top", "bottom"]),
    ("size", &["w", "h"]),
    ("gap", &["gap-x", "gap-y"]),
];

fn is_color(value: &str) -> bool {
    if value.starts_with("[#") || value.starts_with("[rgb") || value.starts_with("[hsl") {
        return true;
    }
    let value = value.split('/').next().unwrap_or(value);
    if BARE_COLORS.contains(&value) {
        return true;
    }
    let name = value.split('-').next().unwrap_or(value);
    COLORS.contains(&name)
}

/// Conflict group of a utility (variants already stripped).
fn class_group(utility: &str) -> String {
    let utility = utility.strip_prefix('-').unwrap_or(utility);

    if DISPLAY.contains(&utility) {
        return "display".to_string();
    }
    if POSITION.contains(&utility) {
        return "position".to_string();
    }

    if let Some(value) = utility.strip_prefix("text-") {
        if FONT_SIZES.contains(&value) || value.starts_with("[length:") {
            return "font-size".to_string();
        }
        if TEXT_ALIGN.contains(&value) {
            return "text-align".to_string();
        }
    }
    if let Some(value) = utility.strip_prefix("font-") {
        return if FONT_WEIGHTS.contains(&value) {
            "font-weight".to_string()
        } else {
            "font-family".to_string()
        };
    }
    match utility {
        "flex-row" | "flex-row-reverse" | "flex-col" | "flex-col-reverse" => {
            return "flex-direction".to_string()
        }
        "flex-wrap" | "flex-wrap-reverse" | "flex-nowrap" => return "flex-wrap".to_string(),
        "border" => return "border-width".to_string(),
        _ => {}
    }

    if let Some((prefix, value)) = utility.split_once('-') {
        if COLOR_PREFIXES.contains(&prefix) && is_color(value) {
            return format!("{}-color", prefix);
        }
        if prefix == "border" && value.chars().all(|c| c.is_ascii_digit()) {
            return "border-width".to_string();
        }
    }

    // Arbitrary values: `w-[calc(100%-2rem)]` groups as `w`.
    let base = match utility.find("-[") {
        Some(i) => &utility[..i],
        None => match utility.rfind('-') {
            Some(i) => &utility[..i],
            None => utility,
        },
    };
    if UTILITY_PREFIXES.contains(&base) {
        base.to_string()
    } else {
        utility.to_string()
    }
}

fn overrides(group: &str) -> &'static [&'static str] {
    SPACING_SIDES
        .iter()
        .find(|(g, _)| *g == group)
        .map(|(_, sides)| *sides)
        .unwrap_or(&[])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_join() {
        assert_eq!(cn(["btn", "btn-primary  rounded"]), "btn btn-primary rounded");
        assert_eq!(cn(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_conditional_and_optional_entries() {
        let classes: Vec<ClassValue> = vec![
            "card".into(),
            ("card-active", true).into(),
            ("card-disabled", false).into(),
            None.into(),
            Some("shadow").into(),
        ];
        assert_eq!(cn(classes), "card card-active shadow");
    }

    #[test]
    fn test_duplicates_collapse_to_last() {
        assert_eq!(cn(["a b", "a"]), "b a");
    }

    #[test]
    fn test_later_utility_wins() {
        assert_eq!(cn(["p-2", "p-4"]), "p-4");
        assert_eq!(cn(["bg-red-500", "bg-blue-500"]), "bg-blue-500");
        assert_eq!(cn(["block", "hidden"]), "hidden");
        assert_eq!(cn(["relative", "absolute"]), "absolute");
        assert_eq!(cn(["font-bold", "font-medium"]), "font-medium");
        assert_eq!(cn(["w-4", "w-[10px]"]), "w-[10px]");
    }

    #[test]
    fn test_text_size_and_color_are_separate_groups() {
        assert_eq!(cn(["text-sm text-gray-500", "text-lg"]), "text-gray-500 text-lg");
        assert_eq!(cn(["text-white", "text-black"]), "text-black");
        assert_eq!(cn(["text-left", "text-center text-sm"]), "text-center text-sm");
    }

    #[test]
    fn test_side_overrides() {
        assert_eq!(cn(["px-2 py-1", "p-4"]), "p-4");
        assert_eq!(cn(["p-4", "px-2"]), "p-4 px-2");
        assert_eq!(cn(["mt-2 mb-2", "my-4"]), "my-4");
    }

    #[test]
    fn test_variants_are_scoped() {
        assert_eq!(cn(["hover:bg-red-500", "bg-blue-500"]), "hover:bg-red-500 bg-blue-500");
        assert_eq!(cn(["hover:bg-red-500", "hover:bg-blue-500"]), "hover:bg-blue-500");
        assert_eq!(cn(["md:p-2", "md:p-4 p-1"]), "md:p-4 p-1");
    }

    #[test]
    fn test_border_width_and_color() {
        assert_eq!(cn(["border", "border-2"]), "border-2");
        assert_eq!(cn(["border-2 border-red-500", "border-gray-200"]), "border-2 border-gray-200");
    }
}
