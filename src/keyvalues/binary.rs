//! Binary KeyValues, as embedded in `appinfo.vdf` entries.
//!
//! A document is a run of nodes closed by an end marker. Each node is a one byte type tag,
//! its key, and a payload whose layout depends on the tag. Objects nest the same structure.
//!
//! When a [`StringTable`] is supplied, keys are 4 byte indices into it instead of inline
//! null-terminated strings.
use log::{trace, warn};

use crate::appinfo_parser::ReadSeek;
use crate::err::{DeserializationError, DeserializationResult};
use crate::keyvalues::{KvNode, KvValue};
use crate::string_table::StringTable;
use crate::utils::ReadExt;

pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Object = 0x00,
    String = 0x01,
    Int32 = 0x02,
    Float32 = 0x03,
    Pointer = 0x04,
    WideString = 0x05,
    Color = 0x06,
    UInt64 = 0x07,
    End = 0x08,
    Int64 = 0x0A,
    AlternateEnd = 0x0B,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<NodeType> {
        match value {
            0x00 => Some(NodeType::Object),
            0x01 => Some(NodeType::String),
            0x02 => Some(NodeType::Int32),
            0x03 => Some(NodeType::Float32),
            0x04 => Some(NodeType::Pointer),
            0x05 => Some(NodeType::WideString),
            0x06 => Some(NodeType::Color),
            0x07 => Some(NodeType::UInt64),
            0x08 => Some(NodeType::End),
            0x0A => Some(NodeType::Int64),
            0x0B => Some(NodeType::AlternateEnd),
            _ => None,
        }
    }
}

/// Deserializes exactly one document from the current position of `stream`.
///
/// The stream is left just past the document's end marker. If the document holds more than one
/// top-level node, the first one is returned.
pub fn from_reader<T: ReadSeek>(
    stream: &mut T,
    string_table: Option<&StringTable>,
) -> DeserializationResult<KvNode> {
    let mut nodes = read_nodes(stream, string_table, 0)?;

    match nodes.len() {
        0 => Err(DeserializationError::EmptyDocument {
            offset: stream.tell()?.saturating_sub(1),
        }),
        1 => Ok(nodes.remove(0)),
        n => {
            warn!(
                "document has {} top-level nodes, keeping only `{}`",
                n, nodes[0].name
            );
            Ok(nodes.remove(0))
        }
    }
}

fn read_nodes<T: ReadSeek>(
    stream: &mut T,
    string_table: Option<&StringTable>,
    depth: usize,
) -> DeserializationResult<Vec<KvNode>> {
    if depth > MAX_DEPTH {
        return Err(DeserializationError::MaxDepthExceeded {
            max: MAX_DEPTH,
            offset: stream.tell()?,
        });
    }

    let mut nodes = Vec::new();

    loop {
        let tag = stream.try_u8_named("node type")?;
        let Some(node_type) = NodeType::from_u8(tag) else {
            return Err(DeserializationError::UnknownNodeType {
                value: tag,
                offset: stream.tell()?.saturating_sub(1),
            });
        };

        if matches!(node_type, NodeType::End | NodeType::AlternateEnd) {
            break;
        }

        let name = read_key(stream, string_table)?;
        trace!("{:?} node `{}`", node_type, name);

        let value = match node_type {
            NodeType::Object => KvValue::Object(read_nodes(stream, string_table, depth + 1)?),
            NodeType::String => {
                KvValue::String(stream.try_null_terminated_utf8_string_named("string value")?)
            }
            NodeType::Int32 => KvValue::Int32(stream.try_i32_named("int32 value")?),
            NodeType::Float32 => KvValue::Float32(stream.try_f32_named("float32 value")?),
            NodeType::Pointer => KvValue::Pointer(stream.try_i32_named("pointer value")?),
            NodeType::Color => KvValue::Color(stream.try_u32_named("color value")?),
            NodeType::UInt64 => KvValue::UInt64(stream.try_u64_named("uint64 value")?),
            NodeType::Int64 => KvValue::Int64(stream.try_i64_named("int64 value")?),
            NodeType::WideString => {
                return Err(DeserializationError::UnsupportedNodeType {
                    name: "WideString",
                    offset: stream.tell()?,
                });
            }
            NodeType::End | NodeType::AlternateEnd => break,
        };

        nodes.push(KvNode { name, value });
    }

    Ok(nodes)
}

fn read_key<T: ReadSeek>(
    stream: &mut T,
    string_table: Option<&StringTable>,
) -> DeserializationResult<String> {
    match string_table {
        None => stream.try_null_terminated_utf8_string_named("key"),
        Some(table) => {
            let index = stream.try_u32_named("string table index")?;

            match table.get(index) {
                Some(name) => Ok(name.to_owned()),
                None => Err(DeserializationError::StringTableIndexOutOfRange {
                    index,
                    len: table.len(),
                    offset: stream.tell()?.saturating_sub(4),
                }),
            }
        }
    }
}
