//! # Union Member Checks
//!
//! A union tries its members in order and keeps the first that accepts the
//! raw value. The definition checks here reject member lists where a later
//! member could never be selected, or where two members would accept the
//! same raw value and encode it indistinguishably.

use schemata_core::{Hint, SchemaError, SchemaResult};

use crate::schema::{Schema, SchemaKind};

/// What a union member can be recognised by.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Bool,
    Int,
    Float,
    Str,
    Pass,
    Seq,
    Map,
    Struct { tag_key: String, tag: Option<String> },
}

struct Member {
    index: usize,
    schema: Schema,
    shape: Shape,
}

fn shape(schema: &Schema) -> Shape {
    match schema.kind() {
        SchemaKind::Bool => Shape::Bool,
        SchemaKind::Int { .. } => Shape::Int,
        SchemaKind::Float { .. } => Shape::Float,
        SchemaKind::Str(_) => Shape::Str,
        SchemaKind::Pass | SchemaKind::Union(_) => Shape::Pass,
        SchemaKind::Seq(_) => Shape::Seq,
        SchemaKind::Map(_) => Shape::Map,
        SchemaKind::Struct(def) => Shape::Struct {
            tag_key: def.tag_key.clone(),
            tag: def.tag.clone(),
        },
        SchemaKind::Declared(d) => Shape::Struct {
            tag_key: d.tag_key().to_string(),
            tag: Some(d.tag().to_string()),
        },
    }
}

/// The non-mapping raws `schema` accepts, as plain members. A struct takes
/// those through its proxy field, a union through its members.
fn scalar_parts(schema: &Schema, seen: &mut Vec<Schema>, out: &mut Vec<Member>) {
    if seen.contains(schema) {
        return;
    }
    seen.push(schema.clone());
    match schema.kind() {
        SchemaKind::Union(members) => {
            for m in members {
                scalar_parts(m, seen, out);
            }
        }
        SchemaKind::Struct(def) => {
            if let Some(field) = def.proxy.as_deref().and_then(|p| def.field(p)) {
                scalar_parts(field, seen, out);
            }
        }
        SchemaKind::Map(_) | SchemaKind::Declared(_) => {}
        _ => out.push(Member {
            index: 0,
            schema: schema.clone(),
            shape: shape(schema),
        }),
    }
}

fn is_proxied(schema: &Schema) -> bool {
    matches!(schema.kind(), SchemaKind::Struct(def) if def.proxy.is_some())
}

/// Why a proxied struct and another member both accept some non-mapping
/// raw, if they do.
fn proxy_conflict(earlier: &Member, later: &Member) -> Option<String> {
    if !is_proxied(&earlier.schema) && !is_proxied(&later.schema) {
        return None;
    }
    let parts = |m: &Member| {
        let mut out = Vec::new();
        scalar_parts(&m.schema, &mut Vec::new(), &mut out);
        out
    };
    let (ea, lb) = (parts(earlier), parts(later));
    for a in &ea {
        for b in &lb {
            if a.shape == Shape::Pass || b.shape == Shape::Pass {
                return Some("a struct proxy accepts every non-mapping value".to_string());
            }
            if let Some(reason) = conflict(a, b) {
                return Some(format!("a struct proxy overlaps another member: {reason}"));
            }
        }
    }
    None
}

fn disjoint(a: &Schema, b: &Schema) -> bool {
    match (a.restricted(), b.restricted()) {
        (Some(ra), Some(rb)) => ra.iter().all(|v| !rb.contains(v)),
        _ => false,
    }
}

/// Why `later` can never be told apart from `earlier`, if it cannot.
fn conflict(earlier: &Member, later: &Member) -> Option<String> {
    use Shape::*;
    match (&earlier.shape, &later.shape) {
        (Bool, Bool) | (Int, Int) | (Float, Float) | (Str, Str) => {
            if disjoint(&earlier.schema, &later.schema) {
                None
            } else {
                Some("both accept the same scalar values".to_string())
            }
        }
        (Float, Int) if earlier.schema.restricted().is_none() => {
            Some("an earlier float member accepts every integer".to_string())
        }
        (Seq, Seq) => Some("both are sequences".to_string()),
        (Map, Map) => Some("both are mappings".to_string()),
        (Map, Struct { tag: None, .. }) | (Struct { tag: None, .. }, Map) => {
            Some("an untagged struct cannot be told apart from a mapping".to_string())
        }
        (Struct { tag: None, .. }, Struct { .. }) | (Struct { .. }, Struct { tag: None, .. }) => {
            Some("an untagged struct cannot share a union with another struct".to_string())
        }
        (
            Struct {
                tag_key: ka,
                tag: Some(ta),
            },
            Struct {
                tag_key: kb,
                tag: Some(tb),
            },
        ) if ka == kb && ta == tb => Some(format!("both are tagged `{ka}: {ta}`")),
        _ => None,
    }
}

pub(crate) fn check_members(members: &[Schema]) -> SchemaResult<()> {
    if members.is_empty() {
        return Err(SchemaError::definition("a union needs at least one member"));
    }
    let members: Vec<Member> = members
        .iter()
        .enumerate()
        .map(|(index, schema)| Member {
            index,
            schema: schema.clone(),
            shape: shape(schema),
        })
        .collect();

    let mut problems = Vec::new();
    for m in &members {
        if m.shape == Shape::Pass {
            problems.push(Hint::error(format!(
                "member {} accepts every value and cannot be part of a union",
                m.index
            )));
        }
    }
    for (i, later) in members.iter().enumerate() {
        for earlier in &members[..i] {
            if let Some(reason) =
                conflict(earlier, later).or_else(|| proxy_conflict(earlier, later))
            {
                problems.push(Hint::error(format!(
                    "members {} and {} are ambiguous: {reason}",
                    earlier.index, later.index
                )));
            }
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Definition(
            Hint::error("ambiguous union").with_children(problems),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::declared::Declared;
    use crate::prim::{BoolPrim, FloatPrim, IntPrim, MapPrim, PassPrim, SeqPrim, StrPrim, UnionPrim};
    use crate::structure::StructSchema;

    fn int() -> crate::Schema {
        IntPrim::new().build().unwrap()
    }

    #[test]
    fn distinct_families_are_fine() {
        let u = UnionPrim::new([
            BoolPrim::new().build().unwrap(),
            int(),
            FloatPrim::new().build().unwrap(),
            StrPrim::new().build().unwrap(),
            SeqPrim::new(int()).build().unwrap(),
            MapPrim::new(int()).build().unwrap(),
        ])
        .build();
        assert!(u.is_ok());
    }

    #[test]
    fn empty_union_is_rejected() {
        assert!(UnionPrim::new(Vec::<crate::Schema>::new()).build().unwrap_err().is_definition());
    }

    #[test]
    fn pass_member_is_rejected() {
        let err = UnionPrim::new([int(), PassPrim::new().build().unwrap()])
            .build()
            .unwrap_err();
        assert!(err.is_definition());
    }

    #[test]
    fn same_scalar_family_needs_disjoint_restrictions() {
        assert!(UnionPrim::new([int(), int()]).build().is_err());
        let a = IntPrim::new().restricted([1, 2]).build().unwrap();
        let b = IntPrim::new().restricted([3]).build().unwrap();
        assert!(UnionPrim::new([a.clone(), b]).build().is_ok());
        let c = IntPrim::new().restricted([2, 3]).build().unwrap();
        assert!(UnionPrim::new([a, c]).build().is_err());
    }

    #[test]
    fn float_before_int_shadows() {
        let f = FloatPrim::new().build().unwrap();
        assert!(UnionPrim::new([f.clone(), int()]).build().is_err());
        assert!(UnionPrim::new([int(), f]).build().is_ok());
    }

    #[test]
    fn structs_need_distinct_tags() {
        let a = StructSchema::builder("A").tag("a").build().unwrap();
        let b = StructSchema::builder("B").tag("b").build().unwrap();
        let a2 = StructSchema::builder("A2").tag("a").build().unwrap();
        let plain = StructSchema::builder("P").build().unwrap();
        assert!(UnionPrim::new([a.clone(), b.clone()]).build().is_ok());
        assert!(UnionPrim::new([a.clone(), a2]).build().is_err());
        assert!(UnionPrim::new([a, plain.clone()]).build().is_err());
        let plain2 = StructSchema::builder("P2").build().unwrap();
        assert!(UnionPrim::new([plain.clone(), plain2]).build().is_err());
        let map = MapPrim::new(int()).build().unwrap();
        assert!(UnionPrim::new([plain, map.clone()]).build().is_err());
        assert!(UnionPrim::new([b, map]).build().is_ok());
    }

    #[test]
    fn unbound_declaration_uses_declared_tag() {
        let d = Declared::new("a");
        let a2 = StructSchema::builder("A2").tag("a").build().unwrap();
        assert!(UnionPrim::new([d.schema(), a2]).build().is_err());
    }

    #[test]
    fn proxied_struct_overlapping_a_scalar_is_rejected() {
        let wrap = |name: &str, tag: &str, proxy| {
            StructSchema::builder(name)
                .tag(tag)
                .field("x", proxy)
                .struct_proxy("x")
                .build()
                .unwrap()
        };
        let err = UnionPrim::new([wrap("Wrap", "wrap", int()), int()])
            .build()
            .unwrap_err();
        assert!(err.is_definition());
        assert!(UnionPrim::new([int(), wrap("Wrap", "wrap", int())]).build().is_err());

        let text = StrPrim::new().build().unwrap();
        assert!(UnionPrim::new([wrap("Wrap", "wrap", int()), text.clone()]).build().is_ok());
        assert!(UnionPrim::new([
            wrap("A", "a", int()),
            wrap("B", "b", UnionPrim::new([text, SeqPrim::new(int()).build().unwrap()]).build().unwrap()),
        ])
        .build()
        .is_ok());
        assert!(UnionPrim::new([wrap("A", "a", int()), wrap("B", "b", int())])
            .build()
            .is_err());
        assert!(UnionPrim::new([wrap("P", "p", PassPrim::new().build().unwrap()), int()])
            .build()
            .is_err());
    }
}
