//! Attribute resolution: literal, unset, or the current value of another field.

use pcml_core::{DataType, Dimensions, FieldNode, IntAttr, NodeId, ValueError};

use crate::{
    clock::NEVER,
    engine::Engine,
    error::{LayoutError, ReferenceKind},
};

/// Integer attribute of a node that may refer to another field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Count,
    Offset,
    OffsetFrom,
    OutputSize,
    Length,
    Ccsid,
}

static UNSET: IntAttr = IntAttr::Unset;

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Count => "count",
            Attribute::Offset => "offset",
            Attribute::OffsetFrom => "offsetfrom",
            Attribute::OutputSize => "outputsize",
            Attribute::Length => "length",
            Attribute::Ccsid => "ccsid",
        }
    }

    /// Declared form on `node`; data-only attributes are unset elsewhere.
    pub fn of<'n>(&self, node: &'n FieldNode) -> &'n IntAttr {
        match self {
            Attribute::Count => &node.count,
            Attribute::Offset => &node.offset,
            Attribute::OffsetFrom => &node.offset_from,
            Attribute::OutputSize => &node.output_size,
            Attribute::Length => node.data().map_or(&UNSET, |d| &d.length),
            Attribute::Ccsid => node.data().map_or(&UNSET, |d| &d.ccsid),
        }
    }
}

impl Engine<'_> {
    /// Value of `attribute` on `id` at `indices`.
    pub(crate) fn resolve(
        &mut self,
        id: NodeId,
        attribute: Attribute,
        indices: &[usize],
    ) -> Result<i64, LayoutError> {
        self.resolve_stamped(id, attribute, indices).map(|(value, _)| value)
    }

    /// Value of `attribute` with the timestamp of the field it was read from
    /// (`i64::MIN` for literals, unset attributes and `init` values).
    pub(crate) fn resolve_stamped(
        &mut self,
        id: NodeId,
        attribute: Attribute,
        indices: &[usize],
    ) -> Result<(i64, i64), LayoutError> {
        let tree = self.tree;
        match attribute.of(tree.node(id)) {
            IntAttr::Unset => Ok((0, NEVER)),
            IntAttr::Literal(v) => Ok((*v, NEVER)),
            IntAttr::Reference(name) => self.follow(id, name, indices),
        }
    }

    /// Node `name` denotes when referenced from `from`, checked to be a
    /// numeric or character data field.
    pub(crate) fn referenced(&self, from: NodeId, name: &str) -> Result<NodeId, LayoutError> {
        let error = |kind| LayoutError::SchemaReference {
            kind,
            name: name.to_string(),
            referenced_by: self.field(from).to_string(),
        };
        let target = self
            .tree
            .resolve_relative(from, name)
            .ok_or_else(|| error(ReferenceKind::ElementNotFound))?;
        match self.tree.node(target).data() {
            None => Err(error(ReferenceKind::WrongElementType)),
            Some(attrs) if attrs.data_type.is_numeric() || attrs.data_type == DataType::Char => {
                Ok(target)
            }
            Some(_) => Err(error(ReferenceKind::WrongDataType)),
        }
    }

    fn follow(
        &mut self,
        from: NodeId,
        name: &str,
        indices: &[usize],
    ) -> Result<(i64, i64), LayoutError> {
        let target = self.referenced(from, name)?;
        let field = self.field(target);
        match self.current(target, indices)? {
            Some((value, timestamp)) => value
                .to_i64()
                .map(|v| (v, timestamp))
                .map_err(|source| LayoutError::Conversion {
                    field: field.to_string(),
                    source,
                }),
            None => {
                let depth = self.tree.dimension_depth(target).min(indices.len());
                Err(LayoutError::ValueNotSet {
                    field: field.to_string(),
                    indices: Dimensions::from(&indices[..depth]),
                })
            }
        }
    }

    /// Element count of array `id`, addressed by the indices of the arrays
    /// enclosing it, with the timestamp that governs its dimension vectors.
    pub(crate) fn count(&mut self, id: NodeId, outer: &[usize]) -> Result<(usize, i64), LayoutError> {
        let (count, governing) = self.resolve_stamped(id, Attribute::Count, outer)?;
        let count = self.non_negative(id, Attribute::Count, count)?;
        Ok((count, governing))
    }

    /// Resolved attribute that must be a size or position.
    pub(crate) fn resolve_size(
        &mut self,
        id: NodeId,
        attribute: Attribute,
        indices: &[usize],
    ) -> Result<usize, LayoutError> {
        let value = self.resolve(id, attribute, indices)?;
        self.non_negative(id, attribute, value)
    }

    fn non_negative(&self, id: NodeId, attribute: Attribute, value: i64) -> Result<usize, LayoutError> {
        usize::try_from(value).map_err(|_| LayoutError::Conversion {
            field: self.field(id).to_string(),
            source: ValueError::OutOfRange {
                value: value.to_string(),
                expected: format!("non-negative {}", attribute.name()),
            },
        })
    }
}
