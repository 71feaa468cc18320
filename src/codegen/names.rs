//! Case folding and description reflow
//!
//! Identifiers are folded to lowercase. Stored descriptions are reflowed so
//! each list element lands on its own line.

/// ASCII lowercase; non-ASCII text is left as is
pub fn to_lower(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Body of a defined type declaration: lowercased, with a line break after
/// each comma and before each opening paren
pub fn reflow_description(desc: &str) -> String {
    let mut out = String::with_capacity(desc.len() + 8);
    for c in desc.chars() {
        match c {
            ',' => out.push_str(",\n  "),
            '(' => out.push_str("\n  ("),
            c => out.push(c.to_ascii_lowercase()),
        }
    }
    out
}

/// Literal list of an enumeration: the description after its opening paren,
/// lowercased, with a line break after each comma
pub fn reflow_enumeration(desc: &str) -> String {
    let literals = desc.find('(').map_or(desc, |open| &desc[open + 1..]);
    let mut out = String::with_capacity(literals.len() + 8);
    for c in literals.chars() {
        match c {
            ',' => out.push_str(",\n  "),
            c => out.push(c.to_ascii_lowercase()),
        }
    }
    out
}
