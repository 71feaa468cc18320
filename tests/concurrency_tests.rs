//! Concurrency Tests
//!
//! Several threads build their own schemas while others serialize schemas
//! that are already complete.

use std::sync::{Arc, Barrier};
use std::thread;

use express_dictionary::{
    AttrDescriptor, Dictionary, EntityBody, GlobalRule, PrimitiveType, RegistryConfig, SchemaId, TypeDescriptor,
};

fn build_schema(dict: &Dictionary, name: &str, entities: usize) -> SchemaId {
    let schema = dict.add_schema(name);
    let integer = dict.builtin(PrimitiveType::Integer).unwrap();
    let count = dict
        .insert_type(schema, TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap().with_referent(integer))
        .unwrap();
    for i in 0..entities {
        let entity = dict
            .insert_entity(schema, TypeDescriptor::entity(format!("item_{}", i), EntityBody::new()))
            .unwrap();
        dict.add_attribute(entity, AttrDescriptor::explicit("n", count)).unwrap();
    }
    schema
}

#[test]
fn test_build_while_serializing_other_schemas() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dict = Arc::new(Dictionary::new());
    let finished = build_schema(&dict, "finished", 20);
    let expected = dict.generate_express(finished).unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for t in 0..4 {
        let dict = Arc::clone(&dict);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let schema = build_schema(&dict, &format!("builder_{}", t), 25);
            dict.schema(schema).unwrap().entities().count()
        }));
    }
    let mut readers = Vec::new();
    for _ in 0..4 {
        let dict = Arc::clone(&dict);
        let barrier = Arc::clone(&barrier);
        let expected = expected.clone();
        readers.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..20 {
                assert_eq!(dict.generate_express(finished).unwrap(), expected);
            }
        }));
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 25);
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(dict.schema_count(), 5);
    // 8 built-ins, plus one type and the entities per schema
    assert_eq!(dict.type_count(), 8 + 21 + 4 * 26);
}

#[test]
fn test_concurrent_first_global_rules() {
    let dict = Arc::new(Dictionary::new());
    let schema = dict.add_schema("rules");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dict = Arc::clone(&dict);
            thread::spawn(move || {
                let text = format!("RULE r{} FOR (a);\nEND_RULE;", i);
                dict.add_global_rule(schema, GlobalRule::new(format!("r{}", i), text, RegistryConfig::default()))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let generated = express_dictionary::generate_schema(&dict, schema).unwrap();
    assert_eq!(generated.rule_count, 8);
    assert_eq!(generated.text.matches("END_RULE;").count(), 8);
}
