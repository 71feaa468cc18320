//! Golden Tests for Canonical EXPRESS Text
//!
//! Builds a small schema through the public builder API and compares the
//! generated text against a checked-in fixture.

use express_dictionary::{
    generate_schema, AggrBody, AggregateKind, AttrDescriptor, Dictionary, EntityBody, EnumBody, ExplicitItem,
    GlobalRule, InterfaceKind, InterfaceSpec, PrimitiveType, RegistryConfig, SchemaId, SelectBody, TypeDescriptor,
    UniquenessRule, WhereRule,
};
use similar::{ChangeTag, TextDiff};

const GEOMETRY_GOLDEN: &str = include_str!("fixtures/geometry_schema.exp");

/// Panic with a line diff when `actual` differs from `expected`
fn assert_text_eq(expected: &str, actual: &str) {
    if expected == actual {
        return;
    }
    let diff = TextDiff::from_lines(expected, actual);
    let mut report = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        report.push_str(&format!("{}{:?}\n", sign, change.value()));
    }
    panic!("generated text differs from golden:\n{}", report);
}

fn build_geometry(dict: &Dictionary) -> SchemaId {
    let id = dict.add_schema("Geometry_Schema");
    let schema = dict.schema(id).unwrap();

    schema.add_interface(
        InterfaceKind::Use,
        InterfaceSpec::new("Geometry_Schema", "Support_Schema")
            .with_item(ExplicitItem::renamed("Length_Measure", "length"))
            .with_item(ExplicitItem::new("Label")),
    );
    schema.add_interface(
        InterfaceKind::Reference,
        InterfaceSpec::all_objects("Geometry_Schema", "Units_Schema"),
    );

    let integer = dict.builtin(PrimitiveType::Integer).unwrap();
    let count = dict
        .insert_type(id, TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap().with_referent(integer))
        .unwrap();
    dict.insert_type(
        id,
        TypeDescriptor::enumeration("Colour", "ENUMERATION OF (RED,GREEN,BLUE)", EnumBody::new()),
    )
    .unwrap();
    let positive = TypeDescriptor::defined("positive_count", PrimitiveType::Reference, "count").unwrap().with_referent(count);
    positive.where_rules().push(WhereRule::new("WR1: SELF > 0;"));
    dict.insert_type(id, positive).unwrap();
    let points = dict
        .insert_type(
            id,
            TypeDescriptor::aggregate("points", "LIST [1:?] OF Point", AggrBody::new(AggregateKind::List).with_bounds(1, -1)),
        )
        .unwrap();
    let choice = dict
        .insert_type(id, TypeDescriptor::select("shape_choice", "SELECT (Point,Curve)", SelectBody::new()))
        .unwrap();

    let point = dict.insert_entity(id, TypeDescriptor::entity("Point", EntityBody::new())).unwrap();
    dict.add_attribute(point, AttrDescriptor::explicit("x", count)).unwrap();
    dict.add_attribute(point, AttrDescriptor::explicit("y", count).optional(true)).unwrap();

    let curve = dict
        .insert_entity(
            id,
            TypeDescriptor::entity(
                "Curve",
                EntityBody::new()
                    .with_abstract(true)
                    .with_supertype_statement("ABSTRACT SUPERTYPE OF (ONEOF (polyline))"),
            ),
        )
        .unwrap();

    let body = EntityBody::new();
    body.add_supertype(curve);
    let polyline = dict.insert_entity(id, TypeDescriptor::entity("Polyline", body)).unwrap();
    dict.add_attribute(polyline, AttrDescriptor::explicit("vertices", points)).unwrap();
    dict.add_attribute(polyline, AttrDescriptor::derived("n", count, Some("SIZEOF(vertices)".to_string())))
        .unwrap();
    dict.add_uniqueness_rule(polyline, UniquenessRule::comment_only("(* vertices may repeat *)")).unwrap();
    dict.entity(polyline).unwrap().where_rules().push(WhereRule::new("WR1: n >= 2;"));

    // Wire links that point forward to entities
    dict.get(points).unwrap().set_referent(Some(point.as_type()));
    let select = dict.get(choice).unwrap();
    select.as_select().unwrap().add_choice(point.as_type());
    select.as_select().unwrap().add_choice(curve.as_type());

    dict.add_global_rule(
        id,
        GlobalRule::new(
            "single_origin",
            "RULE single_origin FOR (point);\nWHERE\n  WR1: SIZEOF(point) >= 1;\nEND_RULE;",
            RegistryConfig::default(),
        ),
    )
    .unwrap();
    schema.add_function("FUNCTION half(x : REAL) : REAL;\n  RETURN (x / 2);\nEND_FUNCTION;");

    id
}

// =============================================================================
// Golden Tests
// =============================================================================

#[test]
fn test_geometry_schema_matches_golden() {
    let dict = Dictionary::new();
    let schema = build_geometry(&dict);
    let generated = generate_schema(&dict, schema).unwrap();

    assert_text_eq(GEOMETRY_GOLDEN, &generated.text);
    assert_eq!(generated.type_count, 5);
    assert_eq!(generated.entity_count, 3);
    assert_eq!(generated.rule_count, 1);
}

#[test]
fn test_regeneration_is_byte_identical() {
    let dict = Dictionary::new();
    let schema = build_geometry(&dict);
    let first = dict.generate_express(schema).unwrap();
    let second = dict.generate_express(schema).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_single_optional_attribute_entity() {
    let dict = Dictionary::new();
    let schema = dict.add_schema("s");
    let integer = dict.builtin(PrimitiveType::Integer).unwrap();
    let count = dict
        .insert_type(schema, TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap().with_referent(integer))
        .unwrap();
    let entity = dict.insert_entity(schema, TypeDescriptor::entity("Sample_Entity", EntityBody::new())).unwrap();
    dict.add_attribute(entity, AttrDescriptor::explicit("x", count).optional(true)).unwrap();

    assert_text_eq(
        "ENTITY sample_entity;\n    x : OPTIONAL count;\nEND_ENTITY;\n",
        &dict.generate_entity(entity).unwrap(),
    );
}

#[test]
fn test_attribute_domain_uses_schema_rename() {
    let dict = Dictionary::new();
    let support = dict.add_schema("Support_Schema");
    let real = dict.builtin(PrimitiveType::Real).unwrap();
    dict.insert_type(
        support,
        TypeDescriptor::defined("Length_Measure", PrimitiveType::Real, "REAL").unwrap().with_referent(real),
    )
    .unwrap();

    let importer = dict.add_schema("Importer");
    dict.schema(importer).unwrap().add_interface(
        InterfaceKind::Use,
        InterfaceSpec::new("Importer", "Support_Schema").with_item(ExplicitItem::renamed("length_measure", "Length")),
    );
    assert_eq!(dict.register_interface_renames(importer).unwrap(), 1);

    let measure = dict.find_type(support, "length_measure").unwrap();
    let rod = dict.insert_entity(importer, TypeDescriptor::entity("Rod", EntityBody::new())).unwrap();
    dict.add_attribute(rod, AttrDescriptor::explicit("span", measure)).unwrap();

    assert_text_eq("ENTITY rod;\n    span : length;\nEND_ENTITY;\n", &dict.generate_entity(rod).unwrap());
}

#[test]
fn test_labelled_uniqueness_block() {
    let dict = Dictionary::new();
    let schema = dict.add_schema("s");
    let string = dict.builtin(PrimitiveType::String).unwrap();
    let person = dict.insert_entity(schema, TypeDescriptor::entity("person", EntityBody::new())).unwrap();
    dict.add_attribute(person, AttrDescriptor::explicit("id", string)).unwrap();
    dict.add_uniqueness_rule(person, UniquenessRule::new("UR1: id;").with_comment("(* ids are global *)"))
        .unwrap();

    assert_text_eq(
        "ENTITY person;\n    id : string;\n  UNIQUE\n    (* ids are global *)\n    UR1: id;\nEND_ENTITY;\n",
        &dict.generate_entity(person).unwrap(),
    );
}
