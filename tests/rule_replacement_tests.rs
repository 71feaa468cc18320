//! Rule Replacement Tests
//!
//! Replacing a populated rule set installs the new contents, hands the old
//! set back intact and logs a warning.

use std::io;
use std::sync::{Arc, Mutex};

use express_dictionary::{
    Dictionary, EntityBody, GlobalRule, OwningRegistry, RefRegistry, RegistryConfig, RuleSet, RuleText,
    TypeDescriptor, WhereRule,
};
use tracing::Level;

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with WARN-level logs routed into the returned buffer
fn with_captured_logs(f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let sink = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.text()
}

fn where_rules(labels: &[&str]) -> OwningRegistry<WhereRule> {
    let rules = OwningRegistry::default();
    for label in labels {
        rules.append(WhereRule::new(*label));
    }
    rules
}

fn labels(rules: &[Arc<WhereRule>]) -> Vec<String> {
    rules.iter().map(|rule| rule.label().to_string()).collect()
}

// =============================================================================
// Global rules
// =============================================================================

#[test]
fn test_set_where_rules_replaces_and_keeps_old_set_alive() {
    let rule = GlobalRule::new("max_one", "RULE max_one FOR (a);\nEND_RULE;", RegistryConfig::default());
    rule.set_where_rules(where_rules(&["WR1: SIZEOF(a) <= 1;", "WR2: TRUE;"]));
    let held = rule.where_rules().get().unwrap();

    let mut previous = None;
    let logs = with_captured_logs(|| {
        previous = rule.set_where_rules(where_rules(&["WR3: FALSE;"]));
    });

    assert_eq!(labels(&rule.where_rules().snapshot()), vec!["WR3: FALSE;"]);
    let previous = previous.unwrap();
    assert!(Arc::ptr_eq(&previous, &held));
    assert_eq!(labels(&held.snapshot()), vec!["WR1: SIZEOF(a) <= 1;", "WR2: TRUE;"]);
    assert!(logs.contains("WARN"));
    assert!(logs.contains("overwriting non-empty rule set"));
}

#[test]
fn test_first_where_rules_install_is_silent() {
    let rule = GlobalRule::new("r", "RULE r FOR (a);\nEND_RULE;", RegistryConfig::default());
    let logs = with_captured_logs(|| {
        assert!(rule.set_where_rules(where_rules(&["WR1: TRUE;"])).is_none());
    });
    assert!(logs.is_empty());
    assert_eq!(rule.where_rules().count(), 1);
}

#[test]
fn test_set_entities_replaces_and_keeps_old_set_alive() {
    let dict = Dictionary::new();
    let schema = dict.add_schema("s");
    let a = dict.insert_entity(schema, TypeDescriptor::entity("a", EntityBody::new())).unwrap();
    let b = dict.insert_entity(schema, TypeDescriptor::entity("b", EntityBody::new())).unwrap();

    let rule = dict
        .add_global_rule(schema, GlobalRule::new("r", "RULE r FOR (a);\nEND_RULE;", RegistryConfig::default()))
        .unwrap();
    rule.entities().append(a);
    let held = rule.entities();

    let replacement = RefRegistry::default();
    replacement.append(b);
    let mut previous = None;
    let logs = with_captured_logs(|| {
        previous = Some(rule.set_entities(replacement));
    });

    assert_eq!(rule.entities().snapshot(), vec![b]);
    let previous = previous.unwrap();
    assert!(Arc::ptr_eq(&previous, &held));
    assert_eq!(held.snapshot(), vec![a]);
    assert!(logs.contains("overwriting non-empty entity set"));
    assert!(logs.contains("rule=r"));
}

// =============================================================================
// Rule sets
// =============================================================================

#[test]
fn test_rule_set_replace_warns_once_populated() {
    let rules: RuleSet<WhereRule> = RuleSet::new(RegistryConfig::default());
    let kept = rules.push(WhereRule::new("WR1: SELF > 0;").with_comment("(* positive *)"));
    let held = rules.get().unwrap();

    let logs = with_captured_logs(|| {
        let previous = rules.replace(where_rules(&["WR2: SELF < 10;"])).unwrap();
        assert!(Arc::ptr_eq(&previous, &held));
    });

    assert!(logs.contains("overwriting non-empty rule set"));
    assert_eq!(labels(&rules.snapshot()), vec!["WR2: SELF < 10;"]);
    // The discarded set and its rule are still whole for anyone holding them
    assert_eq!(held.count(), 1);
    assert!(Arc::ptr_eq(&held.get(0).unwrap(), &kept));
    assert_eq!(kept.comment(), "(* positive *)");
}
