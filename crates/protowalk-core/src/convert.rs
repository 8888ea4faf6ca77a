//! Conversion of decoded trees into `prost-types` descriptors.
//!
//! Only the attributes the walker recognizes are carried over; everything
//! else in the resulting protos is left unset. Empty strings and zero codes
//! become `None`, matching how an absent field decodes.

use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};

use crate::descriptor::{Field, File, FileSet, Message};

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn non_zero<T: TryInto<i32>>(v: T) -> Option<i32> {
    v.try_into().ok().filter(|v| *v != 0)
}

impl From<&Field<'_>> for FieldDescriptorProto {
    fn from(field: &Field<'_>) -> Self {
        FieldDescriptorProto {
            name: non_empty(&field.name),
            number: non_zero(field.tag),
            label: non_zero(field.label),
            r#type: non_zero(field.type_code),
            oneof_index: field.one_of_index,
            ..Default::default()
        }
    }
}

impl From<&Message<'_>> for DescriptorProto {
    fn from(message: &Message<'_>) -> Self {
        DescriptorProto {
            name: non_empty(&message.name),
            field: message.fields.iter().map(Into::into).collect(),
            nested_type: message.nested.iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

impl From<&File<'_>> for FileDescriptorProto {
    fn from(file: &File<'_>) -> Self {
        FileDescriptorProto {
            name: non_empty(&file.name),
            package: non_empty(&file.package),
            message_type: file.messages.iter().map(Into::into).collect(),
            syntax: non_empty(&file.format),
            ..Default::default()
        }
    }
}

impl From<&FileSet<'_>> for FileDescriptorSet {
    fn from(set: &FileSet<'_>) -> Self {
        FileDescriptorSet {
            file: set.files.iter().map(Into::into).collect(),
        }
    }
}
