// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Renders parsed shorthand as indented JSX with snippet placeholders.

use super::shorthand::{Attribute, Child, Shorthand};

const INDENT: &str = "  ";

/// Hands out ascending tab-stop numbers for one expansion.
///
/// Shared across the whole tree so that every placeholder in the output has
/// a unique index. `${0}` is the final cursor position and never consumes a
/// number.
#[derive(Debug)]
pub struct Placeholders {
    next: u32,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self::new()
    }
}

impl Placeholders {
    /// Start numbering at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    fn take(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// `${n:label}`
    fn labelled(&mut self, label: &str) -> String {
        format!("${{{}:{label}}}", self.take())
    }

    /// `${n}`
    fn empty(&mut self) -> String {
        format!("${{{}}}", self.take())
    }
}

/// Render one node at the given nesting depth.
pub fn render(node: &Shorthand, depth: usize, placeholders: &mut Placeholders) -> String {
    let indent = INDENT.repeat(depth);
    let tag = &node.tag;

    if node.child.is_none() && !node.separated {
        return format!("{indent}<{tag}>${{0}}</{tag}>");
    }

    let attributes = render_attributes(&node.attributes, placeholders);
    let open = if attributes.is_empty() {
        format!("<{tag}>")
    } else {
        format!("<{tag} {attributes}>")
    };

    let body = match &node.child {
        Some(Child::Node(child)) => render(child, depth + 1, placeholders),
        Some(Child::Empty) | None => format!("{indent}{INDENT}{}", placeholders.empty()),
    };

    format!("{indent}{open}\n{body}\n{indent}</{tag}>")
}

fn render_attributes(attributes: &[Attribute], placeholders: &mut Placeholders) -> String {
    attributes
        .iter()
        .map(|attribute| match attribute {
            Attribute::Call { name, args } => {
                let slots: Vec<String> = args.iter().map(|a| placeholders.labelled(a)).collect();
                format!("{name}={{{}}}", slots.join(", "))
            }
            Attribute::Bare { name } => format!("{name}={{{}}}", placeholders.labelled("value")),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use crate::expand::expand;
    use crate::expand::shorthand::MAX_NESTING;

    #[test]
    fn test_plain_tag_is_single_line() {
        assert_eq!(expand("View").unwrap(), "<View>${0}</View>");
    }

    #[test]
    fn test_call_attribute_with_body() {
        assert_eq!(
            expand("Greet0onPress(handlePress)").unwrap(),
            "<Greet onPress={${1:handlePress}}>\n  ${2}\n</Greet>"
        );
    }

    #[test]
    fn test_bare_attributes_use_value_label() {
        assert_eq!(
            expand("View0style0testID").unwrap(),
            "<View style={${1:value}} testID={${2:value}}>\n  ${3}\n</View>"
        );
    }

    #[test]
    fn test_multiple_arguments() {
        assert_eq!(
            expand("List0renderItem(item, index)0data").unwrap(),
            "<List renderItem={${1:item}, ${2:index}} data={${3:value}}>\n  ${4}\n</List>"
        );
    }

    #[test]
    fn test_blank_argument_keeps_its_slot() {
        assert_eq!(
            expand("Row0func(a,,b)").unwrap(),
            "<Row func={${1:a}, ${2:}, ${3:b}}>\n  ${4}\n</Row>"
        );
    }

    #[test]
    fn test_trailing_separator_opens_block() {
        assert_eq!(expand("View0").unwrap(), "<View>\n  ${1}\n</View>");
    }

    #[test]
    fn test_nested_without_attributes() {
        assert_eq!(
            expand("Outer>Inner").unwrap(),
            "<Outer>\n  <Inner>${0}</Inner>\n</Outer>"
        );
    }

    #[test]
    fn test_nested_indices_continue_from_parent() {
        assert_eq!(
            expand("A0x>B0y").unwrap(),
            "<A x={${1:value}}>\n  <B y={${2:value}}>\n    ${3}\n  </B>\n</A>"
        );
    }

    #[test]
    fn test_three_levels() {
        assert_eq!(
            expand("ScrollView>View0style>Text").unwrap(),
            "<ScrollView>\n  <View style={${1:value}}>\n    <Text>${0}</Text>\n  </View>\n</ScrollView>"
        );
    }

    #[test]
    fn test_dangling_nesting_marker_gets_body_slot() {
        assert_eq!(expand("View>").unwrap(), "<View>\n  ${1}\n</View>");
    }

    #[test]
    fn test_invalid_shorthand_has_no_expansion() {
        assert!(expand("").is_err());
        assert!(expand("1View").is_err());
        assert!(expand("View>2x").is_err());
    }

    #[test]
    fn test_deepest_allowed_nesting_renders() {
        let line = format!("A{}", ">B".repeat(MAX_NESTING));
        let out = expand(&line).unwrap();

        assert!(out.starts_with("<A>\n  <B>\n"));
        let innermost = format!("{}<B>${{0}}</B>", "  ".repeat(MAX_NESTING));
        assert!(out.contains(&innermost));
        assert!(expand(&format!("{line}>C")).is_err());
    }
}
