//! Decoded descriptor tree.
//!
//! The entities here mirror the subset of `descriptor.proto` the walker
//! recognizes. They borrow their strings from the input buffer whenever the
//! bytes are valid UTF-8; call `into_owned()` to detach a tree from its
//! buffer.
//!
//! An absent string attribute and an explicit empty string are the same
//! thing in this model: both decode to `""`.

mod decoder;
mod walker;

use std::borrow::Cow;

use prost_types::field_descriptor_proto::{Label, Type};

pub use decoder::{Decoded, Decoder, DecoderConfig, DEFAULT_RECURSION_LIMIT};

/// One field of a message type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct Field<'a> {
    /// Field name (tag 1)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_empty_str"))]
    pub name: Cow<'a, str>,
    /// Field number (tag 3), 0 when absent
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_zero"))]
    pub tag: u32,
    /// Raw label code (tag 4), 0 when absent
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_zero"))]
    pub label: u8,
    /// Raw type code (tag 5), 0 when absent
    #[cfg_attr(feature = "serde", serde(rename = "Type", skip_serializing_if = "is_zero"))]
    pub type_code: u8,
    /// Index into the parent's one-of declarations (tag 9)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub one_of_index: Option<i32>,
}

impl<'a> Field<'a> {
    /// The label, if the code is one `descriptor.proto` defines
    pub fn label(&self) -> Option<Label> {
        Label::try_from(i32::from(self.label)).ok()
    }

    /// The field type, if the code is one `descriptor.proto` defines
    pub fn field_type(&self) -> Option<Type> {
        Type::try_from(i32::from(self.type_code)).ok()
    }

    /// Detaches this field from the input buffer
    pub fn into_owned(self) -> Field<'static> {
        Field {
            name: Cow::Owned(self.name.into_owned()),
            tag: self.tag,
            label: self.label,
            type_code: self.type_code,
            one_of_index: self.one_of_index,
        }
    }
}

/// A message type with its fields and nested message types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct Message<'a> {
    /// Message name (tag 1)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_empty_str"))]
    pub name: Cow<'a, str>,
    /// Fields in wire order (tag 2)
    #[cfg_attr(feature = "serde", serde(rename = "Field", skip_serializing_if = "Vec::is_empty"))]
    pub fields: Vec<Field<'a>>,
    /// Nested message types in wire order (tag 4)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub nested: Vec<Message<'a>>,
}

impl<'a> Message<'a> {
    /// Looks up a direct field by name
    pub fn field(&self, name: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a directly nested message by name
    pub fn nested_message(&self, name: &str) -> Option<&Message<'a>> {
        self.nested.iter().find(|m| m.name == name)
    }

    /// Number of message types in this subtree, this one included
    pub fn message_count(&self) -> usize {
        1 + self.nested.iter().map(Message::message_count).sum::<usize>()
    }

    /// Detaches this message from the input buffer
    pub fn into_owned(self) -> Message<'static> {
        Message {
            name: Cow::Owned(self.name.into_owned()),
            fields: self.fields.into_iter().map(Field::into_owned).collect(),
            nested: self.nested.into_iter().map(Message::into_owned).collect(),
        }
    }
}

/// One schema file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct File<'a> {
    /// File name (tag 1)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_empty_str"))]
    pub name: Cow<'a, str>,
    /// Package (tag 2)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_empty_str"))]
    pub package: Cow<'a, str>,
    /// Top-level message types in wire order (tag 4)
    #[cfg_attr(feature = "serde", serde(rename = "Message", skip_serializing_if = "Vec::is_empty"))]
    pub messages: Vec<Message<'a>>,
    /// Syntax string such as `proto3` (tag 12)
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_empty_str"))]
    pub format: Cow<'a, str>,
}

impl<'a> File<'a> {
    /// Decodes a single serialized `FileDescriptorProto` with the default config
    pub fn decode(data: &'a [u8]) -> crate::Result<Self> {
        Decoder::new().decode_file(data)
    }

    /// Looks up a top-level message by name
    pub fn message(&self, name: &str) -> Option<&Message<'a>> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Resolves a dotted path (`Outer.Inner`) relative to this file's package
    pub fn find_message(&self, path: &str) -> Option<&Message<'a>> {
        let mut segments = path.split('.');
        let mut current = self.message(segments.next()?)?;
        for segment in segments {
            current = current.nested_message(segment)?;
        }
        Some(current)
    }

    /// Number of message types declared in this file, nested ones included
    pub fn message_count(&self) -> usize {
        self.messages.iter().map(Message::message_count).sum()
    }

    /// Detaches this file from the input buffer
    pub fn into_owned(self) -> File<'static> {
        File {
            name: Cow::Owned(self.name.into_owned()),
            package: Cow::Owned(self.package.into_owned()),
            messages: self.messages.into_iter().map(Message::into_owned).collect(),
            format: Cow::Owned(self.format.into_owned()),
        }
    }
}

/// Top-level decode result: the files of a serialized `FileDescriptorSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FileSet<'a> {
    /// Files in wire order (tag 1)
    pub files: Vec<File<'a>>,
}

impl<'a> FileSet<'a> {
    /// Decodes a serialized `FileDescriptorSet`, failing on any malformed byte
    pub fn decode(data: &'a [u8]) -> crate::Result<Self> {
        Decoder::new().decode(data)
    }

    /// The decoded files
    pub fn files(&self) -> &[File<'a>] {
        &self.files
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file was decoded
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over the files
    pub fn iter(&self) -> std::slice::Iter<'_, File<'a>> {
        self.files.iter()
    }

    /// Number of message types across all files, nested ones included
    pub fn message_count(&self) -> usize {
        self.files.iter().map(File::message_count).sum()
    }

    /// Resolves a fully qualified name such as `geo.Shape.Point`.
    ///
    /// A leading dot is accepted. The first file whose package is a prefix of
    /// the name and that contains the remaining path wins.
    pub fn find_message(&self, full_name: &str) -> Option<&Message<'a>> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.files.iter().find_map(|file| {
            let path = if file.package.is_empty() {
                full_name
            } else {
                full_name
                    .strip_prefix(&*file.package)?
                    .strip_prefix('.')?
            };
            file.find_message(path)
        })
    }

    /// Detaches every file from the input buffer
    pub fn into_owned(self) -> FileSet<'static> {
        FileSet {
            files: self.files.into_iter().map(File::into_owned).collect(),
        }
    }
}

impl<'a> IntoIterator for FileSet<'a> {
    type Item = File<'a>;
    type IntoIter = std::vec::IntoIter<File<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'s, 'a> IntoIterator for &'s FileSet<'a> {
    type Item = &'s File<'a>;
    type IntoIter = std::slice::Iter<'s, File<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(feature = "serde")]
fn is_empty_str(s: &Cow<'_, str>) -> bool {
    s.is_empty()
}

#[cfg(feature = "serde")]
fn is_zero<T: Default + PartialEq>(v: &T) -> bool {
    *v == T::default()
}
