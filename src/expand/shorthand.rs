// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Parser and classifier for dynamic tag shorthand.
//!
//! A shorthand line is a tag name followed by `0`-separated attribute
//! segments, optionally followed by `>` and a nested child shorthand:
//!
//! ```text
//! Pressable0onPress(handlePress)0style>Text
//! ```
//!
//! `0` works as the separator because it can never start an identifier.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Separates the tag name and attribute segments.
pub const SEPARATOR: char = '0';

/// Separates a node from its nested child expression.
pub const NESTING: char = '>';

/// Most `>` levels a single expression may nest.
pub const MAX_NESTING: usize = 32;

#[allow(clippy::expect_used, reason = "Pattern is a compile-time literal")]
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

#[allow(clippy::expect_used, reason = "Pattern is a compile-time literal")]
static CALL_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\(([^)]+)\)$").expect("valid call attribute regex")
});

#[allow(clippy::expect_used, reason = "Pattern is a compile-time literal")]
static CALL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^()]*)\([^()]*\)$").expect("valid call suffix regex"));

#[allow(clippy::expect_used, reason = "Pattern is a compile-time literal")]
static DYNAMIC_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z_][a-zA-Z0-9_]*(?:\([^()]*\))?(?:0[a-zA-Z_][a-zA-Z0-9_]*(?:\([^()]*\))?)*0?$",
    )
    .expect("valid dynamic tag regex")
});

#[allow(clippy::expect_used, reason = "Pattern is a compile-time literal")]
static LEADING_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_]").expect("valid leading identifier regex"));

/// Reasons a shorthand line produces no expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShorthandError {
    /// Nothing but whitespace.
    #[error("shorthand is empty")]
    Empty,
    /// The first segment is not an identifier.
    #[error("invalid tag name: {0:?}")]
    InvalidTagName(String),
    /// More nesting levels than [`MAX_NESTING`].
    #[error("shorthand nests {depth} levels, at most {} allowed", MAX_NESTING)]
    TooDeep {
        /// Number of `>` markers in the line.
        depth: usize,
    },
}

/// One parsed node of a shorthand expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shorthand {
    /// Tag name, always a valid identifier.
    pub tag: String,
    /// Attributes in segment order.
    pub attributes: Vec<Attribute>,
    /// Whether the node had any separator after its tag name. A separated
    /// node renders its body as a block even if every segment was empty.
    pub separated: bool,
    /// Nested content after `>`.
    pub child: Option<Child>,
}

/// A single attribute segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `name(a, b)`: one placeholder per argument, empty arguments kept.
    Call {
        /// Attribute name.
        name: String,
        /// Trimmed argument texts.
        args: Vec<String>,
    },
    /// `name`: a single `value` placeholder.
    Bare {
        /// Attribute name (the trimmed segment).
        name: String,
    },
}

/// Content nested under a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// `>` with nothing after it.
    Empty,
    /// Another tag.
    Node(Box<Shorthand>),
}

/// Parse a shorthand line.
///
/// # Errors
///
/// Returns [`ShorthandError`] if the line, or any nested child expression
/// with text in it, does not start with a valid tag name, or if it nests
/// deeper than [`MAX_NESTING`].
pub fn parse(line: &str) -> Result<Shorthand, ShorthandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ShorthandError::Empty);
    }

    let depth = line.matches(NESTING).count();
    if depth > MAX_NESTING {
        return Err(ShorthandError::TooDeep { depth });
    }

    let mut levels: Vec<&str> = line.split(NESTING).collect();
    let mut child = match levels.last() {
        Some(last) if levels.len() > 1 && last.trim().is_empty() => {
            levels.pop();
            Some(Child::Empty)
        }
        _ => None,
    };

    let mut nodes = levels
        .into_iter()
        .map(parse_node)
        .collect::<Result<Vec<_>, _>>()?;

    // Link innermost first so each node owns the one after it.
    while let Some(mut node) = nodes.pop() {
        node.child = child;
        if nodes.is_empty() {
            return Ok(node);
        }
        child = Some(Child::Node(Box::new(node)));
    }
    Err(ShorthandError::Empty)
}

/// One `>`-level: tag name plus its attribute segments.
fn parse_node(text: &str) -> Result<Shorthand, ShorthandError> {
    let mut segments = text.split(SEPARATOR);
    let tag = tag_name(segments.next().unwrap_or_default())?;

    let mut separated = false;
    let mut attributes = Vec::new();
    for segment in segments {
        separated = true;
        if let Some(attribute) = parse_attribute(segment) {
            attributes.push(attribute);
        }
    }

    Ok(Shorthand {
        tag,
        attributes,
        separated,
        child: None,
    })
}

fn tag_name(segment: &str) -> Result<String, ShorthandError> {
    let segment = segment.trim();
    let name = CALL_SUFFIX
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map_or(segment, |m| m.as_str());

    if name.is_empty() {
        return Err(ShorthandError::Empty);
    }
    if !IDENTIFIER.is_match(name) {
        return Err(ShorthandError::InvalidTagName(name.to_string()));
    }
    Ok(name.to_string())
}

fn parse_attribute(segment: &str) -> Option<Attribute> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    if let Some(caps) = CALL_ATTRIBUTE.captures(segment) {
        let name = caps[1].to_string();
        let args = caps[2].split(',').map(|a| a.trim().to_string()).collect();
        return Some(Attribute::Call { name, args });
    }

    Some(Attribute::Bare {
        name: segment.to_string(),
    })
}

/// The individual signals behind the dynamic tag heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The whole line matches the strict shorthand grammar.
    pub structural_match: bool,
    /// The line contains the `0` separator anywhere.
    pub contains_separator: bool,
    /// The line starts with an identifier character.
    pub starts_with_identifier: bool,
    /// Final verdict: offer a dynamic tag item.
    pub is_dynamic: bool,
}

/// Decide whether a line should be offered as a dynamic tag.
///
/// Deliberately lenient: any line that starts with an identifier and either
/// contains a separator or matches the grammar counts, so plain words such
/// as `View` are dynamic too.
#[must_use]
pub fn classify(line: &str) -> Classification {
    let line = line.trim();

    let structural_match = DYNAMIC_TAG.is_match(line);
    let contains_separator = line.contains(SEPARATOR);
    let starts_with_identifier = LEADING_IDENTIFIER.is_match(line);
    let likely = starts_with_identifier && (contains_separator || structural_match);

    Classification {
        structural_match,
        contains_separator,
        starts_with_identifier,
        is_dynamic: structural_match || likely,
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;

    fn bare(name: &str) -> Attribute {
        Attribute::Bare {
            name: name.to_string(),
        }
    }

    fn depth(node: &Shorthand) -> usize {
        match &node.child {
            Some(Child::Node(child)) => 1 + depth(child),
            Some(Child::Empty) => 1,
            None => 0,
        }
    }

    fn call(name: &str, args: &[&str]) -> Attribute {
        Attribute::Call {
            name: name.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_plain_tag() {
        let node = parse("  View ").unwrap();
        assert_eq!(node.tag, "View");
        assert!(node.attributes.is_empty());
        assert!(!node.separated);
        assert!(node.child.is_none());
    }

    #[test]
    fn test_bare_and_call_attributes_keep_order() {
        let node = parse("Button0title0onPress(handlePress, id)").unwrap();
        assert_eq!(node.tag, "Button");
        assert_eq!(
            node.attributes,
            vec![bare("title"), call("onPress", &["handlePress", "id"])]
        );
    }

    #[test]
    fn test_blank_arguments_are_preserved() {
        let node = parse("Row0func(a,,b)").unwrap();
        assert_eq!(node.attributes, vec![call("func", &["a", "", "b"])]);
    }

    #[test]
    fn test_empty_call_is_bare() {
        let node = parse("Row0reset()").unwrap();
        assert_eq!(node.attributes, vec![bare("reset()")]);
    }

    #[test]
    fn test_trailing_separator_marks_block_body() {
        let node = parse("View0").unwrap();
        assert!(node.attributes.is_empty());
        assert!(node.separated);
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let node = parse("View00style0").unwrap();
        assert_eq!(node.attributes, vec![bare("style")]);
    }

    #[test]
    fn test_nested_children() {
        let node = parse("Outer0a>Middle>Inner0b").unwrap();
        assert_eq!(node.tag, "Outer");
        assert_eq!(depth(&node), 2);

        let Some(Child::Node(middle)) = &node.child else {
            unreachable!("expected nested node");
        };
        assert_eq!(middle.tag, "Middle");
        assert!(middle.attributes.is_empty());

        let Some(Child::Node(inner)) = &middle.child else {
            unreachable!("expected nested node");
        };
        assert_eq!(inner.tag, "Inner");
        assert_eq!(inner.attributes, vec![bare("b")]);
        assert!(inner.child.is_none());
    }

    #[test]
    fn test_dangling_nesting_marker() {
        let node = parse("View>").unwrap();
        assert_eq!(node.child, Some(Child::Empty));
    }

    #[test]
    fn test_tag_call_suffix_is_stripped() {
        let node = parse("View(x)0style").unwrap();
        assert_eq!(node.tag, "View");
        assert_eq!(node.attributes, vec![bare("style")]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse(""), Err(ShorthandError::Empty));
        assert_eq!(parse("   "), Err(ShorthandError::Empty));
        assert_eq!(parse("0style"), Err(ShorthandError::Empty));
        assert_eq!(
            parse("9View"),
            Err(ShorthandError::InvalidTagName("9View".to_string()))
        );
        assert_eq!(
            parse("<div>"),
            Err(ShorthandError::InvalidTagName("<div".to_string()))
        );
        assert!(parse("Outer>1nner").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let line = format!("a{}", ">a".repeat(MAX_NESTING));
        let node = parse(&line).unwrap();
        assert_eq!(depth(&node), MAX_NESTING);

        let line = format!("a{}0", ">".repeat(2_000));
        assert!(classify(&line).is_dynamic);
        assert_eq!(parse(&line), Err(ShorthandError::TooDeep { depth: 2_000 }));
    }

    #[test]
    fn test_empty_middle_level_is_invalid() {
        assert_eq!(parse("A>>B"), Err(ShorthandError::Empty));
        assert_eq!(parse(">B"), Err(ShorthandError::Empty));
    }

    #[test]
    fn test_classify_plain_identifier() {
        let c = classify("View");
        assert!(c.structural_match);
        assert!(!c.contains_separator);
        assert!(c.starts_with_identifier);
        assert!(c.is_dynamic);
    }

    #[test]
    fn test_classify_separator_without_grammar() {
        let c = classify("foo0 bar");
        assert!(!c.structural_match);
        assert!(c.contains_separator);
        assert!(c.starts_with_identifier);
        assert!(c.is_dynamic);
    }

    #[test]
    fn test_classify_full_shorthand() {
        let c = classify("  TouchableOpacity0onPress(handlePress)0style0 ");
        assert!(c.structural_match);
        assert!(c.is_dynamic);
    }

    #[test]
    fn test_classify_nested_shorthand_is_lenient() {
        let c = classify("Outer>Inner");
        assert!(!c.structural_match);
        assert!(!c.contains_separator);
        assert!(!c.is_dynamic);

        let c = classify("Outer0a>Inner");
        assert!(c.is_dynamic);
    }

    #[test]
    fn test_classify_static_lines() {
        for line in ["", "   ", "<div>", "0abc", "// comment", "{value}"] {
            let c = classify(line);
            assert!(!c.is_dynamic, "{line:?} should not be dynamic");
        }
    }
}
