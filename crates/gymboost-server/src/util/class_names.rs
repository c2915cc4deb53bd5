//! Class-name merging for server-rendered markup.
//!
//! Joins utility classes and drops the ones a later class overrides, so
//! `cn(["px-2 py-1", "p-4"])` renders as `p-4`. Only a common subset of
//! utility groups is recognised; anything else is kept verbatim apart from
//! exact duplicates.

use std::collections::HashSet;

/// Merges class lists, last conflicting class wins.
pub fn cn<I, S>(classes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<String> = classes
        .into_iter()
        .flat_map(|c| {
            c.as_ref()
                .split_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::new();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());

    for token in tokens.iter().rev() {
        let parsed = ParsedClass::parse(token);
        let Some(group) = classify(parsed.base) else {
            if taken.insert(format!("raw:{token}")) {
                kept.push(token.as_str());
            }
            continue;
        };

        let scope = parsed.scope();
        if !taken.insert(format!("{scope}{group}")) {
            continue;
        }
        for overridden in overrides(group) {
            taken.insert(format!("{scope}{overridden}"));
        }
        kept.push(token.as_str());
    }

    kept.reverse();
    kept.join(" ")
}

/// Accumulates classes, some of them conditionally, before merging.
#[derive(Debug, Default, Clone)]
pub struct ClassList {
    classes: Vec<String>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn push_if(self, condition: bool, class: impl Into<String>) -> Self {
        if condition {
            self.push(class)
        } else {
            self
        }
    }

    pub fn build(&self) -> String {
        cn(&self.classes)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

struct ParsedClass<'a> {
    variants: Vec<&'a str>,
    important: bool,
    base: &'a str,
}

impl<'a> ParsedClass<'a> {
    fn parse(token: &'a str) -> Self {
        // Variant separators inside `[...]` belong to an arbitrary value.
        let mut depth = 0usize;
        let mut start = 0usize;
        let mut variants = Vec::new();
        for (i, ch) in token.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                ':' if depth == 0 => {
                    variants.push(&token[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }

        let mut base = &token[start..];
        let mut important = false;
        if let Some(rest) = base.strip_prefix('!') {
            base = rest;
            important = true;
        } else if let Some(rest) = base.strip_suffix('!') {
            base = rest;
            important = true;
        }
        let base = base.strip_prefix('-').unwrap_or(base);

        variants.sort_unstable();
        Self {
            variants,
            important,
            base,
        }
    }

    fn scope(&self) -> String {
        let mut scope = self.variants.join(":");
        if !scope.is_empty() {
            scope.push(':');
        }
        if self.important {
            scope.push('!');
        }
        scope
    }
}

// ── Groups ───────────────────────────────────────────────────────────────────

const DISPLAY: &[&str] = &[
    "block",
    "inline-block",
    "inline",
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
    "table",
    "contents",
    "hidden",
];

const POSITION: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];

const FONT_SIZES: &[&str] = &[
    "xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "8xl", "9xl",
];

const TEXT_ALIGN: &[&str] = &["left", "center", "right", "justify", "start", "end"];

const FONT_WEIGHTS: &[&str] = &[
    "thin",
    "extralight",
    "light",
    "normal",
    "medium",
    "semibold",
    "bold",
    "extrabold",
    "black",
];

const BORDER_STYLES: &[&str] = &["solid", "dashed", "dotted", "double", "hidden", "none"];

/// Prefixed utilities whose group is the prefix itself. Longer prefixes first.
const PREFIXED: &[(&str, &str)] = &[
    ("px-", "px"),
    ("py-", "py"),
    ("pt-", "pt"),
    ("pr-", "pr"),
    ("pb-", "pb"),
    ("pl-", "pl"),
    ("p-", "p"),
    ("mx-", "mx"),
    ("my-", "my"),
    ("mt-", "mt"),
    ("mr-", "mr"),
    ("mb-", "mb"),
    ("ml-", "ml"),
    ("m-", "m"),
    ("min-w-", "min-w"),
    ("min-h-", "min-h"),
    ("max-w-", "max-w"),
    ("max-h-", "max-h"),
    ("size-", "size"),
    ("w-", "w"),
    ("h-", "h"),
    ("gap-x-", "gap-x"),
    ("gap-y-", "gap-y"),
    ("gap-", "gap"),
    ("inset-x-", "inset-x"),
    ("inset-y-", "inset-y"),
    ("inset-", "inset"),
    ("top-", "top"),
    ("right-", "right"),
    ("bottom-", "bottom"),
    ("left-", "left"),
    ("z-", "z"),
    ("opacity-", "opacity"),
    ("overflow-x-", "overflow-x"),
    ("overflow-y-", "overflow-y"),
    ("overflow-", "overflow"),
    ("items-", "align-items"),
    ("justify-", "justify-content"),
    ("leading-", "leading"),
    ("tracking-", "tracking"),
    ("cursor-", "cursor"),
];

fn classify(base: &str) -> Option<&'static str> {
    if DISPLAY.contains(&base) {
        return Some("display");
    }
    if POSITION.contains(&base) {
        return Some("position");
    }
    if let Some(value) = base.strip_prefix("text-") {
        return Some(if FONT_SIZES.contains(&value) {
            "font-size"
        } else if TEXT_ALIGN.contains(&value) {
            "text-align"
        } else {
            "text-color"
        });
    }
    if let Some(value) = base.strip_prefix("font-") {
        return Some(if FONT_WEIGHTS.contains(&value) {
            "font-weight"
        } else {
            "font-family"
        });
    }
    if let Some(value) = base.strip_prefix("bg-") {
        return Some(match value {
            "auto" | "cover" | "contain" => "bg-size",
            _ => "bg-color",
        });
    }
    if base == "shadow" || base.starts_with("shadow-") {
        return Some("shadow");
    }
    if let Some(value) = base.strip_prefix("flex-") {
        return Some(match value {
            "row" | "row-reverse" | "col" | "col-reverse" => "flex-direction",
            "wrap" | "wrap-reverse" | "nowrap" => "flex-wrap",
            _ => "flex",
        });
    }
    if base == "rounded" {
        return Some("rounded");
    }
    if let Some(rest) = base.strip_prefix("rounded-") {
        return Some(match rest.split('-').next().unwrap_or_default() {
            "t" => "rounded-t",
            "r" => "rounded-r",
            "b" => "rounded-b",
            "l" => "rounded-l",
            "tl" => "rounded-tl",
            "tr" => "rounded-tr",
            "br" => "rounded-br",
            "bl" => "rounded-bl",
            _ => "rounded",
        });
    }
    if base == "border" {
        return Some("border-w");
    }
    if let Some(value) = base.strip_prefix("border-") {
        if BORDER_STYLES.contains(&value) {
            return Some("border-style");
        }
        if value.chars().all(|c| c.is_ascii_digit()) {
            return Some("border-w");
        }
        if value.len() <= 2 && value.chars().all(|c| "xytrbl".contains(c)) {
            // Per-side borders are left alone.
            return None;
        }
        return Some("border-color");
    }
    PREFIXED
        .iter()
        .find(|(prefix, _)| base.starts_with(prefix))
        .map(|(_, group)| *group)
}

/// Groups a shorthand class overrides when it appears later.
fn overrides(group: &str) -> &'static [&'static str] {
    match group {
        "p" => &["px", "py", "pt", "pr", "pb", "pl"],
        "px" => &["pr", "pl"],
        "py" => &["pt", "pb"],
        "m" => &["mx", "my", "mt", "mr", "mb", "ml"],
        "mx" => &["mr", "ml"],
        "my" => &["mt", "mb"],
        "size" => &["w", "h"],
        "gap" => &["gap-x", "gap-y"],
        "inset" => &["inset-x", "inset-y", "top", "right", "bottom", "left"],
        "inset-x" => &["right", "left"],
        "inset-y" => &["top", "bottom"],
        "overflow" => &["overflow-x", "overflow-y"],
        "rounded" => &[
            "rounded-t",
            "rounded-r",
            "rounded-b",
            "rounded-l",
            "rounded-tl",
            "rounded-tr",
            "rounded-br",
            "rounded-bl",
        ],
        "rounded-t" => &["rounded-tl", "rounded-tr"],
        "rounded-r" => &["rounded-tr", "rounded-br"],
        "rounded-b" => &["rounded-br", "rounded-bl"],
        "rounded-l" => &["rounded-tl", "rounded-bl"],
        _ => &[],
    }
}
