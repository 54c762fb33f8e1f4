//! The three tree walks: output sizing, serialization and lazy parsing.
//!
//! All walks skip nodes the host version does not support and expand an
//! array node into its elements when the caller has not selected one.
//! Serialization and parsing honor explicit `offset`/`offsetfrom`
//! positions, which may only move forward.

use bytes::{BufMut, Bytes, BytesMut};
use pcml_core::{
    CharWidth, CodecError, DataAttrs, DataType, Dimensions, IntAttr, NodeId, NodeKind,
    ScalarFormat, Usage, ValueError,
};
use tracing::{trace, warn};

use crate::{
    engine::Engine,
    error::LayoutError,
    resolve::Attribute,
    store::SlotValue,
};

/// Size reported for a data field whose primitive size computes to zero.
pub const FALLBACK_OUTPUT_SIZE: usize = 32;

/// Composites currently being laid out, with the parameter-relative position
/// each one starts at.
#[derive(Debug, Default)]
pub(crate) struct OffsetStack(Vec<(NodeId, usize)>);

impl OffsetStack {
    fn push(&mut self, id: NodeId, position: usize) {
        self.0.push((id, position));
    }

    fn pop(&mut self) {
        self.0.pop();
    }

    fn position_of(&self, id: NodeId) -> Option<usize> {
        self.0
            .iter()
            .rev()
            .find(|(open, _)| *open == id)
            .map(|(_, position)| *position)
    }
}

impl Engine<'_> {
    pub(crate) fn is_supported(&self, id: NodeId) -> bool {
        match self.options.host_vrm {
            Some(vrm) => self.tree.node(id).version.contains(vrm),
            None => true,
        }
    }

    /// `true` when `id` is an array whose own index is not part of `indices`.
    fn spans_all_elements(&self, id: NodeId, indices: &Dimensions) -> bool {
        self.tree.node(id).is_array() && indices.len() < self.tree.dimension_depth(id)
    }

    /// Format of one element of data field `id`, with length and ccsid
    /// resolved at `indices`.
    pub(crate) fn scalar_format(
        &mut self,
        id: NodeId,
        attrs: &DataAttrs,
        indices: &[usize],
    ) -> Result<ScalarFormat, LayoutError> {
        if attrs.data_type == DataType::Struct {
            return Err(LayoutError::BadDataType {
                field: self.field(id).to_string(),
                data_type: attrs.data_type,
            });
        }
        let length = self.resolve_size(id, Attribute::Length, indices)?;
        let ccsid = match self.resolve_size(id, Attribute::Ccsid, indices)? {
            0 => match attrs.char_width {
                CharWidth::OneByte => self.options.default_ccsid,
                CharWidth::TwoByte => self.options.default_two_byte_ccsid,
            },
            declared => u32::try_from(declared).map_err(|_| LayoutError::Conversion {
                field: self.field(id).to_string(),
                source: ValueError::OutOfRange {
                    value: declared.to_string(),
                    expected: "ccsid".to_string(),
                },
            })?,
        };
        Ok(ScalarFormat::new(attrs.data_type, length)
            .with_precision(attrs.precision)
            .with_ccsid(ccsid)
            .with_char_width(attrs.char_width)
            .with_trim(attrs.trim)
            .with_bidi_string_type(attrs.bidi_string_type))
    }

    /// Bytes `id` needs when returned by the host.
    pub(crate) fn output_size(
        &mut self,
        id: NodeId,
        indices: &mut Dimensions,
    ) -> Result<usize, LayoutError> {
        if !self.is_supported(id) {
            return Ok(0);
        }
        let declared = self.resolve(id, Attribute::OutputSize, indices)?;
        if declared > 0 {
            return Ok(declared as usize);
        }

        if self.spans_all_elements(id, indices) {
            // a count nobody has set yet contributes nothing
            let count = match self.count(id, indices) {
                Ok((count, _)) => count,
                Err(LayoutError::ValueNotSet { .. }) => 0,
                Err(e) => return Err(e),
            };
            let mut total = 0;
            for i in 0..count {
                indices.push(i);
                let size = self.element_output_size(id, indices);
                indices.pop();
                total += size?;
            }
            return Ok(total);
        }
        self.element_output_size(id, indices)
    }

    fn element_output_size(
        &mut self,
        id: NodeId,
        indices: &mut Dimensions,
    ) -> Result<usize, LayoutError> {
        let tree = self.tree;
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Struct => {
                let mut total = 0;
                for &child in node.children() {
                    total += self.output_size(child, indices)?;
                }
                Ok(total)
            }
            NodeKind::Data(attrs) => {
                let format = self.scalar_format(id, attrs, indices)?;
                match self.codec.size_of(&format) {
                    0 => {
                        warn!(
                            field = node.display_name(),
                            size = FALLBACK_OUTPUT_SIZE,
                            "primitive size is zero, using fallback output size"
                        );
                        Ok(FALLBACK_OUTPUT_SIZE)
                    }
                    size => Ok(size),
                }
            }
            other => Err(LayoutError::BadNodeType {
                field: node.display_name().to_string(),
                kind: other.kind_name(),
            }),
        }
    }

    /// Zero bytes to insert before `id` so it starts at its declared offset.
    fn gap(
        &mut self,
        id: NodeId,
        indices: &[usize],
        offsets: &OffsetStack,
        position: usize,
    ) -> Result<usize, LayoutError> {
        let offset = self.resolve_size(id, Attribute::Offset, indices)?;
        if offset == 0 {
            return Ok(0);
        }
        let node = self.tree.node(id);
        let base = match &node.offset_from {
            IntAttr::Reference(name) => {
                let from = self
                    .tree
                    .resolve_relative(id, name)
                    .and_then(|target| offsets.position_of(target));
                from.ok_or_else(|| LayoutError::OffsetFromNotFound {
                    field: node.display_name().to_string(),
                    offset_from: name.clone(),
                })?
            }
            IntAttr::Literal(base) => usize::try_from(*base).unwrap_or(0),
            IntAttr::Unset => node
                .parent()
                .and_then(|parent| offsets.position_of(parent))
                .unwrap_or(0),
        };
        Ok((base + offset).saturating_sub(position))
    }

    /// Append the encoding of `id` to `buf`, which starts at the parameter's
    /// first byte. Returns the number of bytes written.
    pub(crate) fn serialize(
        &mut self,
        id: NodeId,
        buf: &mut BytesMut,
        indices: &mut Dimensions,
        offsets: &mut OffsetStack,
    ) -> Result<usize, LayoutError> {
        if !self.is_supported(id) {
            return Ok(0);
        }
        if self.spans_all_elements(id, indices) {
            let (count, _) = self.count(id, indices)?;
            let mut written = 0;
            for i in 0..count {
                indices.push(i);
                let n = self.serialize(id, buf, indices, offsets);
                indices.pop();
                written += n?;
            }
            return Ok(written);
        }

        let start = buf.len();
        let gap = self.gap(id, indices, offsets, start)?;
        buf.put_bytes(0, gap);

        let tree = self.tree;
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Struct => {
                offsets.push(id, buf.len());
                for &child in node.children() {
                    self.serialize(child, buf, indices, offsets)?;
                }
                offsets.pop();
            }
            NodeKind::Data(attrs) => self.serialize_leaf(id, attrs, buf, indices)?,
            other => {
                return Err(LayoutError::BadNodeType {
                    field: node.display_name().to_string(),
                    kind: other.kind_name(),
                });
            }
        }
        Ok(buf.len() - start)
    }

    fn serialize_leaf(
        &mut self,
        id: NodeId,
        attrs: &DataAttrs,
        buf: &mut BytesMut,
        indices: &Dimensions,
    ) -> Result<(), LayoutError> {
        let field = self.field(id);
        let format = self.scalar_format(id, attrs, indices)?;
        let size = self.codec.size_of(&format);
        let offset = buf.len();

        match self.current(id, indices)? {
            Some((value, _)) => {
                self.codec
                    .encode(&format, &value, buf)
                    .map_err(|source| LayoutError::Codec {
                        field: field.to_string(),
                        source,
                    })?;
                let written = buf.len() - offset;
                if written != size {
                    return Err(LayoutError::Codec {
                        field: field.to_string(),
                        source: CodecError::Length {
                            expected: size,
                            actual: written,
                        },
                    });
                }
            }
            None if self.tree.effective_usage(id) == Usage::Output => buf.put_bytes(0, size),
            None => {
                return Err(LayoutError::ValueNotSet {
                    field: field.to_string(),
                    indices: indices.clone(),
                });
            }
        }
        trace!(field, offset, size, "serialized field");
        Ok(())
    }

    /// Capture the bytes of `id` starting at `cursor` (the parameter starts at
    /// 0) without decoding them. Returns the number of bytes consumed,
    /// including skipped gaps.
    pub(crate) fn parse(
        &mut self,
        id: NodeId,
        data: &Bytes,
        cursor: usize,
        indices: &mut Dimensions,
        offsets: &mut OffsetStack,
    ) -> Result<usize, LayoutError> {
        if !self.is_supported(id) {
            return Ok(0);
        }
        if self.spans_all_elements(id, indices) {
            let (count, _) = self.count(id, indices)?;
            let mut position = cursor;
            for i in 0..count {
                indices.push(i);
                let n = self.parse(id, data, position, indices, offsets);
                indices.pop();
                position += n?;
            }
            return Ok(position - cursor);
        }

        let mut position = cursor + self.gap(id, indices, offsets, cursor)?;
        let tree = self.tree;
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Struct => {
                offsets.push(id, position);
                for &child in node.children() {
                    position += self.parse(child, data, position, indices, offsets)?;
                }
                offsets.pop();
            }
            NodeKind::Data(attrs) => {
                let format = self.scalar_format(id, attrs, indices)?;
                let size = self.codec.size_of(&format);
                let end = position + size;
                if end > data.len() {
                    return Err(LayoutError::BufferTooShort {
                        field: node.display_name().to_string(),
                        offset: position,
                        needed: size,
                        available: data.len().saturating_sub(position),
                    });
                }
                trace!(field = node.display_name(), offset = position, size, "captured field");
                let raw = data.slice(position..end);
                self.locate(id, indices)?
                    .store(SlotValue::Encoded { raw, format });
                position = end;
            }
            other => {
                return Err(LayoutError::BadNodeType {
                    field: node.display_name().to_string(),
                    kind: other.kind_name(),
                });
            }
        }
        Ok(position - cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_stack_finds_innermost_entry() {
        let outer = NodeId::from_index(1);
        let inner = NodeId::from_index(2);
        let mut stack = OffsetStack::default();
        stack.push(outer, 0);
        stack.push(inner, 10);
        stack.push(outer, 40);
        assert_eq!(stack.position_of(outer), Some(40));
        assert_eq!(stack.position_of(inner), Some(10));
        stack.pop();
        assert_eq!(stack.position_of(outer), Some(0));
        assert_eq!(stack.position_of(NodeId::from_index(3)), None);
    }
}
