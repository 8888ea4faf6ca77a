//! Recursive descriptor walker.
//!
//! One scan loop ([`Scope::walk_into`]) serves every entity kind. Each kind
//! implements [`Entity`] to map the tag numbers it knows onto its attributes.
//! Everything else is skipped, its bytes having already been consumed by the
//! wire reader.
//!
//! Offsets are absolute throughout: every walk is told where its slice begins
//! in the top-level input, so errors never need translating on the way up.

use std::borrow::Cow;

use tracing::trace;

use super::{Field, File, FileSet, Message};
use crate::error::{DecodeError, DecodeErrorKind, Result};
use crate::wire::{self, WireField};

/// An entity the walker can populate field by field.
pub(crate) trait Entity<'a>: Default {
    /// Name used in logs
    const KIND: &'static str;

    /// Whether descending into this entity counts against the recursion limit
    const NESTS: bool = false;

    /// Applies one decoded field found at absolute offset `at`.
    ///
    /// Returns `Ok(false)` when the field was not recognized.
    fn apply(&mut self, scope: Scope, field: WireField<'a>, at: usize) -> Result<bool>;
}

/// Recursion state shared by one walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    limit: usize,
    depth: usize,
}

impl Scope {
    pub(crate) fn root(limit: usize) -> Self {
        Self { limit, depth: 0 }
    }

    /// Walks `data`, which starts at absolute offset `base`, into `entity`.
    ///
    /// On failure `entity` keeps whatever was applied before the bad field;
    /// it is up to the caller whether that prefix is worth anything.
    pub(crate) fn walk_into<'a, E: Entity<'a>>(
        self,
        entity: &mut E,
        data: &'a [u8],
        base: usize,
    ) -> Result<()> {
        for item in wire::fields(data) {
            let (offset, field) = item.map_err(|e| e.at(base))?;
            let at = base + offset;
            if !entity.apply(self, field, at)? {
                trace!(
                    entity = E::KIND,
                    tag = field.tag,
                    wire_type = ?field.value.wire_type(),
                    offset = at,
                    "skipping field"
                );
            }
        }
        Ok(())
    }

    /// Decodes the payload of `field`, found at absolute offset `at`, as a child entity.
    ///
    /// Returns `Ok(None)` if the field is not length-delimited. A child that
    /// fails is discarded whole.
    fn child<'a, E: Entity<'a>>(self, field: &WireField<'a>, at: usize) -> Result<Option<E>> {
        let Some(payload) = field.value.bytes() else {
            return Ok(None);
        };

        let depth = if E::NESTS { self.depth + 1 } else { self.depth };
        if depth > self.limit {
            return Err(DecodeError::new(
                at,
                DecodeErrorKind::RecursionLimit { limit: self.limit },
            ));
        }

        let mut entity = E::default();
        Scope { depth, ..self }.walk_into(&mut entity, payload, at + field.value_offset)?;
        Ok(Some(entity))
    }
}

fn string<'a>(field: &WireField<'a>) -> Option<Cow<'a, str>> {
    field.value.bytes().map(String::from_utf8_lossy)
}

fn set<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

fn push<T>(list: &mut Vec<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            list.push(v);
            true
        }
        None => false,
    }
}

impl<'a> Entity<'a> for Field<'a> {
    const KIND: &'static str = "field";

    fn apply(&mut self, _scope: Scope, field: WireField<'a>, _at: usize) -> Result<bool> {
        // Integer attributes narrow the same way protobuf's int32/uint32 do.
        let recognized = match (field.tag, field.value.scalar()) {
            (1, _) => set(&mut self.name, string(&field)),
            (3, Some(v)) => set(&mut self.tag, Some(v as u32)),
            (4, Some(v)) => set(&mut self.label, Some(v as u8)),
            (5, Some(v)) => set(&mut self.type_code, Some(v as u8)),
            (9, Some(v)) => set(&mut self.one_of_index, Some(Some(v as i32))),
            _ => false,
        };
        Ok(recognized)
    }
}

impl<'a> Entity<'a> for Message<'a> {
    const KIND: &'static str = "message";
    const NESTS: bool = true;

    fn apply(&mut self, scope: Scope, field: WireField<'a>, at: usize) -> Result<bool> {
        let recognized = match field.tag {
            1 => set(&mut self.name, string(&field)),
            2 => push(&mut self.fields, scope.child(&field, at)?),
            4 => push(&mut self.nested, scope.child(&field, at)?),
            _ => false,
        };
        Ok(recognized)
    }
}

impl<'a> Entity<'a> for File<'a> {
    const KIND: &'static str = "file";

    fn apply(&mut self, scope: Scope, field: WireField<'a>, at: usize) -> Result<bool> {
        let recognized = match field.tag {
            1 => set(&mut self.name, string(&field)),
            2 => set(&mut self.package, string(&field)),
            4 => push(&mut self.messages, scope.child(&field, at)?),
            12 => set(&mut self.format, string(&field)),
            _ => false,
        };
        Ok(recognized)
    }
}

impl<'a> Entity<'a> for FileSet<'a> {
    const KIND: &'static str = "file set";

    fn apply(&mut self, scope: Scope, field: WireField<'a>, at: usize) -> Result<bool> {
        let recognized = match field.tag {
            1 => push(&mut self.files, scope.child(&field, at)?),
            _ => false,
        };
        Ok(recognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixed32, fixed64, len, varint};
    use pretty_assertions::assert_eq;

    fn walk<'a, E: Entity<'a>>(data: &'a [u8]) -> Result<E> {
        let mut entity = E::default();
        Scope::root(100).walk_into(&mut entity, data, 0)?;
        Ok(entity)
    }

    #[test]
    fn test_field_attributes() {
        let data = [
            len(1, b"count"),
            varint(3, 7),
            varint(4, 3),
            varint(5, 5),
            varint(9, 0),
        ]
        .concat();
        let field: Field<'_> = walk(&data).unwrap();
        assert_eq!(
            field,
            Field {
                name: "count".into(),
                tag: 7,
                label: 3,
                type_code: 5,
                one_of_index: Some(0),
            }
        );
    }

    #[test]
    fn test_field_name_borrows_input() {
        let data = len(1, b"borrowed");
        let field: Field<'_> = walk(&data).unwrap();
        assert!(matches!(field.name, Cow::Borrowed("borrowed")));
    }

    #[test]
    fn test_invalid_utf8_name_is_copied_lossily() {
        let data = len(1, &[b'a', 0xFF, b'b']);
        let field: Field<'_> = walk(&data).unwrap();
        assert!(matches!(field.name, Cow::Owned(_)));
        assert_eq!(field.name, "a\u{FFFD}b");
    }

    #[test]
    fn test_field_integer_narrowing() {
        let data = [varint(3, (1 << 32) + 5), varint(9, u64::MAX)].concat();
        let field: Field<'_> = walk(&data).unwrap();
        assert_eq!(field.tag, 5);
        assert_eq!(field.one_of_index, Some(-1));
    }

    #[test]
    fn test_fixed_width_scalars_are_accepted() {
        let data = [fixed32(3, 12), fixed64(4, 2)].concat();
        let field: Field<'_> = walk(&data).unwrap();
        assert_eq!(field.tag, 12);
        assert_eq!(field.label, 2);
    }

    #[test]
    fn test_wire_type_mismatch_is_skipped() {
        // name as varint, tag number as bytes: neither can be applied
        let data = [varint(1, 4), len(3, b"xx"), varint(5, 9)].concat();
        let field: Field<'_> = walk(&data).unwrap();
        assert_eq!(field.name, "");
        assert_eq!(field.tag, 0);
        assert_eq!(field.type_code, 9);
    }

    #[test]
    fn test_message_children_in_order() {
        let data = [
            len(1, b"Outer"),
            len(2, &len(1, b"a")),
            len(4, &len(1, b"Inner")),
            len(2, &len(1, b"b")),
        ]
        .concat();
        let message: Message<'_> = walk(&data).unwrap();
        assert_eq!(message.name, "Outer");
        let names: Vec<&str> = message.fields.iter().map(|f| &*f.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(message.nested[0].name, "Inner");
    }

    #[test]
    fn test_file_attributes() {
        let data = [
            len(1, b"geo.proto"),
            len(2, b"geo"),
            len(3, b"dep.proto"),
            len(4, &len(1, b"Point")),
            len(12, b"proto3"),
        ]
        .concat();
        let file: File<'_> = walk(&data).unwrap();
        assert_eq!(file.name, "geo.proto");
        assert_eq!(file.package, "geo");
        assert_eq!(file.format, "proto3");
        assert_eq!(file.messages.len(), 1);
    }

    #[test]
    fn test_nested_error_offset_is_absolute() {
        // file set -> file -> message -> field, with a zero header inside the field
        let bad_field = [len(1, b"x"), vec![0x00]].concat();
        let message = [len(1, b"M"), len(2, &bad_field)].concat();
        let file = len(4, &message);
        let data = len(1, &file);

        let expected = data.len() - 1;
        let err = walk::<FileSet<'_>>(&data).unwrap_err();
        assert_eq!(
            err,
            DecodeError::new(expected, DecodeErrorKind::InvalidTag { wire_type: 0 })
        );
    }

    #[test]
    fn test_recursion_limit() {
        let mut message = len(1, b"Leaf");
        for _ in 0..4 {
            message = len(4, &message);
        }
        // `message` is now four nested wrappers deep; wrap once more as a file.
        let file = len(4, &message);

        let mut ok = File::default();
        Scope::root(5).walk_into(&mut ok, &file, 0).unwrap();
        assert_eq!(ok.message_count(), 5);

        let mut limited = File::default();
        let err = Scope::root(3).walk_into(&mut limited, &file, 0).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::RecursionLimit { limit: 3 });
    }
}
