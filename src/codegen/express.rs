//! EXPRESS Text Emitter
//!
//! Renders descriptors into canonical EXPRESS source. The layout is
//! whitespace-significant and stable: regenerating an unchanged model gives
//! byte-identical text.
//!
//! Every collection is iterated while holding its own lock. Arena lookups
//! made from inside an iteration never take a registry lock, so the nesting
//! order is always registry then arena.

use std::sync::Arc;

use super::names::{reflow_description, reflow_enumeration, to_lower};
use crate::attribute::{AttrDescriptor, AttrKind};
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::rules::{RuleSet, RuleText};
use crate::schema::{InterfaceKind, Schema};
use crate::types::{DescriptorBody, TypeDescriptor};

// =============================================================================
// Schema
// =============================================================================

/// Emit the USE and REFERENCE clauses of `schema`
pub fn emit_interfaces(output: &mut String, schema: &Schema) {
    for kind in [InterfaceKind::Use, InterfaceKind::Reference] {
        schema.interfaces(kind).with_items(|interfaces| {
            for interface in interfaces {
                let foreign = to_lower(interface.foreign_schema());
                interface.explicit_items().with_items(|items| {
                    let items: Vec<String> = items
                        .map(|item| match item.new_name() {
                            Some(renamed) => format!("{} AS {}", to_lower(item.original()), to_lower(renamed)),
                            None => to_lower(item.original()),
                        })
                        .collect();
                    if !items.is_empty() {
                        output.push_str(&format!("\n    {} FROM {}\n", kind.keyword(), foreign));
                        output.push_str(&format!("       ({});\n", items.join(",\n\t")));
                    } else if interface.imports_all() {
                        output.push_str(&format!("\n    {} FROM {};\n", kind.keyword(), foreign));
                    }
                });
            }
        });
    }
}

/// Emit the raw text of global rules, functions and procedures.
/// Returns the number of global rules written.
pub fn emit_algorithms(output: &mut String, schema: &Schema) -> usize {
    let mut rule_count = 0;
    if let Some(rules) = schema.global_rules().get() {
        rules.with_items(|rules| {
            let rules: Vec<_> = rules.collect();
            if rules.is_empty() {
                return;
            }
            output.push_str("\n(* *************RULES************* *)\n");
            for rule in &rules {
                output.push_str(&format!("\n{}\n", rule.rule_text()));
            }
            rule_count = rules.len();
        });
    }

    let functions = schema.functions();
    if !functions.is_empty() {
        output.push_str("(* *************FUNCTIONS************* *)\n");
        for function in &functions {
            output.push_str(&format!("\n{}\n", function));
        }
    }

    let procedures = schema.procedures();
    if !procedures.is_empty() {
        output.push_str("(* *************PROCEDURES************* *)\n");
        for procedure in &procedures {
            output.push_str(&format!("\n{}\n", procedure));
        }
    }
    rule_count
}

// =============================================================================
// Types
// =============================================================================

/// Emit a TYPE ... END_TYPE declaration
pub fn emit_type(output: &mut String, td: &TypeDescriptor) {
    let name = to_lower(td.name());
    match td.body() {
        DescriptorBody::Enumeration(_) => {
            output.push_str(&format!(
                "TYPE {} = ENUMERATION OF \n  ({};\n",
                name,
                reflow_enumeration(td.description())
            ));
        }
        _ => {
            output.push_str(&format!("TYPE {} = {};\n", name, reflow_description(td.description())));
        }
    }
    emit_rule_block(output, "WHERE", td.where_rules());
    output.push_str("END_TYPE;\n");
}

// =============================================================================
// Entities
// =============================================================================

/// Emit an ENTITY ... END_ENTITY declaration.
///
/// Attribute domains are named as seen from `schema`.
pub fn emit_entity(output: &mut String, dict: &Dictionary, td: &TypeDescriptor, schema: Option<&str>) -> Result<()> {
    output.push_str("ENTITY ");
    output.push_str(&to_lower(td.name()));

    let Some(body) = td.as_entity() else {
        output.push_str(";\nEND_ENTITY;\n");
        return Ok(());
    };

    if let Some(statement) = body.supertype_statement().filter(|s| !s.is_empty()) {
        output.push_str("\n  ");
        output.push_str(statement);
    }

    body.supertypes().with_items(|supertypes| -> Result<()> {
        let mut names = Vec::new();
        for supertype in supertypes {
            names.push(to_lower(dict.require(supertype.as_type())?.name()));
        }
        if !names.is_empty() {
            output.push_str(&format!("\n  SUBTYPE OF ({})", names.join(",\n\t\t")));
        }
        Ok(())
    })?;
    output.push_str(";\n");

    body.explicit_attrs().with_items(|attrs| -> Result<()> {
        let attrs: Vec<&Arc<AttrDescriptor>> = attrs.collect();
        for attr in attrs.iter().filter(|a| !a.is_derived()) {
            output.push_str(&format!("    {};\n", attr_definition(dict, attr, schema)?));
        }
        let mut derived = attrs.iter().filter(|a| a.is_derived()).peekable();
        if derived.peek().is_some() {
            output.push_str("  DERIVE\n");
        }
        for attr in derived {
            output.push_str(&format!("    {};\n", attr_definition(dict, attr, schema)?));
        }
        Ok(())
    })?;

    body.inverse_attrs().with_items(|attrs| -> Result<()> {
        let mut attrs = attrs.peekable();
        if attrs.peek().is_some() {
            output.push_str("  INVERSE\n");
        }
        for attr in attrs {
            output.push_str(&format!("    {};\n", attr_definition(dict, attr, schema)?));
        }
        Ok(())
    })?;

    emit_rule_block(output, "UNIQUE", body.uniqueness_rules());
    emit_rule_block(output, "WHERE", td.where_rules());
    output.push_str("END_ENTITY;\n");
    Ok(())
}

/// Right-hand side of an attribute declaration, without the trailing `;`
pub fn attr_definition(dict: &Dictionary, attr: &AttrDescriptor, schema: Option<&str>) -> Result<String> {
    let domain = attr.attr_type_name(dict, schema)?;
    let optional = if attr.is_optional().is_true() { "OPTIONAL " } else { "" };
    Ok(match attr.kind() {
        AttrKind::Explicit => format!("{} : {}{}", attr.name(), optional, domain),
        AttrKind::Derived { initializer } => {
            let prefix = if attr.name().contains('.') { "SELF\\" } else { "" };
            let mut s = format!("{}{} : {}", prefix, attr.name(), domain);
            if let Some(initializer) = initializer {
                s.push_str(" \n\t\t:= ");
                s.push_str(initializer);
            }
            s
        }
        AttrKind::Inverse { inverted_attr } => {
            format!("{} : {}{} FOR {}", attr.name(), optional, domain, inverted_attr)
        }
    })
}

// =============================================================================
// Rule blocks
// =============================================================================

/// UNIQUE or WHERE block. The header turns into a comment when no rule
/// carries a label; empty sets emit nothing.
fn emit_rule_block<R: RuleText>(output: &mut String, keyword: &str, rules: &RuleSet<R>) {
    let Some(rules) = rules.get() else { return };
    rules.with_items(|rules| {
        let rules: Vec<_> = rules.collect();
        if rules.is_empty() {
            return;
        }
        if rules.iter().all(|rule| rule.label().is_empty()) {
            output.push_str(&format!("  (* {} *)\n", keyword));
        } else {
            output.push_str(&format!("  {}\n", keyword));
        }
        for rule in rules {
            if !rule.comment().is_empty() {
                output.push_str(&format!("    {}\n", rule.comment()));
            }
            if !rule.label().is_empty() {
                output.push_str(&format!("    {}\n", rule.label()));
            }
        }
    });
}
