// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Indented JSX rendering with numbered placeholders.
pub mod markup;
/// Shorthand parsing and dynamic-tag classification.
pub mod shorthand;

pub use markup::{Placeholders, render};
pub use shorthand::{Attribute, Child, Classification, Shorthand, ShorthandError, classify, parse};

/// Expand one shorthand line into snippet text.
///
/// # Errors
///
/// Returns [`ShorthandError`] if the line is not valid shorthand.
pub fn expand(line: &str) -> Result<String, ShorthandError> {
    let node = parse(line)?;
    Ok(render(&node, 0, &mut Placeholders::new()))
}
