//! Human-readable rendering of decoded descriptor trees.
//!
//! Rendering is driven by [`visit_file_set`], which walks a tree depth-first
//! and reports each entity to a [`DescriptorVisitor`]. [`OutlineWriter`]
//! turns that into `.proto`-like text; [`Stats`] just counts.
//!
//! JSON rendering goes through `serde` instead (enable the `serde` feature).

use std::fmt::{Result, Write as FmtWrite};

use prost_types::field_descriptor_proto::{Label, Type};

use crate::descriptor::{Field, File, FileSet, Message};

/// Receives the entities of a tree in depth-first order.
///
/// Every method defaults to doing nothing, so implementors only override what
/// they care about.
pub trait DescriptorVisitor {
    /// Called before a file's messages
    fn enter_file(&mut self, file: &File<'_>) -> Result {
        let _ = file;
        Ok(())
    }

    /// Called after a file's messages
    fn exit_file(&mut self, file: &File<'_>) -> Result {
        let _ = file;
        Ok(())
    }

    /// Called before a message's fields and nested messages
    fn enter_message(&mut self, message: &Message<'_>) -> Result {
        let _ = message;
        Ok(())
    }

    /// Called after a message's fields and nested messages
    fn exit_message(&mut self, message: &Message<'_>) -> Result {
        let _ = message;
        Ok(())
    }

    /// Called for each field, in wire order
    fn visit_field(&mut self, field: &Field<'_>) -> Result {
        let _ = field;
        Ok(())
    }
}

/// Walks every file of `set` through `visitor`
pub fn visit_file_set<V: DescriptorVisitor + ?Sized>(set: &FileSet<'_>, visitor: &mut V) -> Result {
    for file in set {
        visit_file(file, visitor)?;
    }
    Ok(())
}

/// Walks one file through `visitor`
pub fn visit_file<V: DescriptorVisitor + ?Sized>(file: &File<'_>, visitor: &mut V) -> Result {
    visitor.enter_file(file)?;
    for message in &file.messages {
        visit_message(message, visitor)?;
    }
    visitor.exit_file(file)
}

fn visit_message<V: DescriptorVisitor + ?Sized>(message: &Message<'_>, visitor: &mut V) -> Result {
    visitor.enter_message(message)?;
    for field in &message.fields {
        visitor.visit_field(field)?;
    }
    for nested in &message.nested {
        visit_message(nested, visitor)?;
    }
    visitor.exit_message(message)
}

/// Counts the entities of a tree
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Number of files
    pub file_count: usize,
    /// Number of messages, nested ones included
    pub message_count: usize,
    /// Number of fields
    pub field_count: usize,
}

impl Stats {
    /// Counts the entities of `set`
    pub fn of(set: &FileSet<'_>) -> Self {
        let mut stats = Self::default();
        // Counting never fails.
        let _ = visit_file_set(set, &mut stats);
        stats
    }
}

impl DescriptorVisitor for Stats {
    fn enter_file(&mut self, _file: &File<'_>) -> Result {
        self.file_count += 1;
        Ok(())
    }

    fn enter_message(&mut self, _message: &Message<'_>) -> Result {
        self.message_count += 1;
        Ok(())
    }

    fn visit_field(&mut self, _field: &Field<'_>) -> Result {
        self.field_count += 1;
        Ok(())
    }
}

/// Writes a `.proto`-like outline of a tree.
///
/// Only what the decoder recognizes is shown, so message-typed fields appear
/// as `message` rather than by their type name.
pub struct OutlineWriter<'w, W: FmtWrite> {
    writer: &'w mut W,
    indent_str: String,
    indent_level: usize,
    proto3: bool,
}

impl<'w, W: FmtWrite> OutlineWriter<'w, W> {
    /// Creates a writer with two-space indentation
    pub fn new(writer: &'w mut W) -> Self {
        Self {
            writer,
            indent_str: "  ".to_string(),
            indent_level: 0,
            proto3: false,
        }
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    fn write_indent(&mut self) -> Result {
        for _ in 0..self.indent_level {
            self.writer.write_str(&self.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }
}

impl<W: FmtWrite> DescriptorVisitor for OutlineWriter<'_, W> {
    fn enter_file(&mut self, file: &File<'_>) -> Result {
        self.proto3 = file.format == "proto3";

        if !file.name.is_empty() {
            writeln!(self.writer, "// {}", file.name)?;
        }
        if !file.format.is_empty() {
            writeln!(self.writer, "syntax = \"{}\";", file.format)?;
        }
        if !file.package.is_empty() {
            writeln!(self.writer, "package {};", file.package)?;
        }
        writeln!(self.writer)
    }

    fn enter_message(&mut self, message: &Message<'_>) -> Result {
        self.write_indent()?;
        writeln!(self.writer, "message {} {{", message.name)?;
        self.indent_level += 1;
        Ok(())
    }

    fn exit_message(&mut self, _message: &Message<'_>) -> Result {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.writeln("}")?;
        if self.indent_level == 0 {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn visit_field(&mut self, field: &Field<'_>) -> Result {
        self.write_indent()?;

        match field.label() {
            Some(Label::Repeated) => write!(self.writer, "repeated ")?,
            Some(Label::Required) => write!(self.writer, "required ")?,
            Some(Label::Optional) => {
                if !self.proto3 {
                    write!(self.writer, "optional ")?;
                }
            }
            None if field.label != 0 => write!(self.writer, "label({}) ", field.label)?,
            None => {}
        }

        match field.field_type() {
            Some(ty) => write!(self.writer, "{}", type_name(ty))?,
            None => write!(self.writer, "type({})", field.type_code)?,
        }

        write!(self.writer, " {} = {};", field.name, field.tag)?;
        if let Some(index) = field.one_of_index {
            write!(self.writer, " // oneof {}", index)?;
        }
        writeln!(self.writer)
    }
}

fn type_name(ty: Type) -> &'static str {
    match ty {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Group => "group",
        Type::Message => "message",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Enum => "enum",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
    }
}

/// Renders `set` as an outline with default settings
pub fn outline(set: &FileSet<'_>) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = visit_file_set(set, &mut OutlineWriter::new(&mut output));
    output
}
