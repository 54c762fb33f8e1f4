use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use pcml_core::{
    Decimal, Dimensions, NativeValue, NodeId, PrimitiveCodec, SchemaTree, ValueError,
};
use tracing::debug;

use crate::{
    engine::Engine,
    error::LayoutError,
    layout::OffsetStack,
    options::LayoutOptions,
    resolve::Attribute,
    store::ValueStore,
};

/// Names a node of the document's schema tree.
pub trait FieldRef {
    fn node_in(&self, tree: &SchemaTree) -> Result<NodeId, LayoutError>;
}

impl FieldRef for NodeId {
    fn node_in(&self, tree: &SchemaTree) -> Result<NodeId, LayoutError> {
        if self.index() < tree.len() {
            Ok(*self)
        } else {
            Err(LayoutError::UnknownField {
                field: format!("#{}", self.index()),
            })
        }
    }
}

impl FieldRef for &str {
    /// Looks the name up as an absolute qualified name.
    fn node_in(&self, tree: &SchemaTree) -> Result<NodeId, LayoutError> {
        tree.lookup(self).ok_or_else(|| LayoutError::UnknownField {
            field: self.to_string(),
        })
    }
}

impl FieldRef for String {
    fn node_in(&self, tree: &SchemaTree) -> Result<NodeId, LayoutError> {
        self.as_str().node_in(tree)
    }
}

/// Runtime values for one schema tree, plus the operations that lay them out.
///
/// The tree is shared; values are private to the document. Every operation
/// addresses array elements with an index tuple, outermost array first.
pub struct Document {
    tree: Arc<SchemaTree>,
    codec: Arc<dyn PrimitiveCodec>,
    options: LayoutOptions,
    store: ValueStore,
}

impl Document {
    pub fn new(tree: Arc<SchemaTree>, codec: Arc<dyn PrimitiveCodec>) -> Self {
        let store = ValueStore::new(tree.len());
        Self {
            tree,
            codec,
            options: LayoutOptions::default(),
            store,
        }
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tree(&self) -> &Arc<SchemaTree> {
        &self.tree
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LayoutOptions {
        &mut self.options
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Forget every value set or parsed so far.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    fn engine(&mut self) -> Engine<'_> {
        Engine {
            tree: &self.tree,
            store: &mut self.store,
            codec: self.codec.as_ref(),
            options: &self.options,
        }
    }

    pub fn node_id(&self, field: impl FieldRef) -> Result<NodeId, LayoutError> {
        field.node_in(&self.tree)
    }

    /// Store `value` for a data field, converted to the type the field holds.
    pub fn set_value(
        &mut self,
        field: impl FieldRef,
        indices: &[usize],
        value: impl Into<NativeValue>,
    ) -> Result<(), LayoutError> {
        let id = self.node_id(field)?;
        self.engine().set(id, indices, value.into())
    }

    /// Current value of a data field, its `init` value when nothing was set.
    ///
    /// Bytes captured by a parse are decoded here, on first read.
    pub fn value(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<NativeValue, LayoutError> {
        let id = self.node_id(field)?;
        match self.engine().current(id, indices)? {
            Some((value, _)) => Ok(value),
            None => Err(LayoutError::ValueNotSet {
                field: self.tree.node(id).display_name().to_string(),
                indices: Dimensions::from(indices),
            }),
        }
    }

    pub fn int_value(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<i64, LayoutError> {
        self.converted(field, indices, |v| v.to_i64())
    }

    pub fn float_value(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<f64, LayoutError> {
        self.converted(field, indices, |v| v.to_f64())
    }

    pub fn decimal_value(
        &mut self,
        field: impl FieldRef,
        indices: &[usize],
    ) -> Result<Decimal, LayoutError> {
        self.converted(field, indices, |v| v.to_decimal())
    }

    pub fn string_value(
        &mut self,
        field: impl FieldRef,
        indices: &[usize],
    ) -> Result<String, LayoutError> {
        self.converted(field, indices, |v| {
            Ok(match v {
                NativeValue::String(s) => s,
                other => other.to_string(),
            })
        })
    }

    fn converted<T>(
        &mut self,
        field: impl FieldRef,
        indices: &[usize],
        convert: impl FnOnce(NativeValue) -> Result<T, ValueError>,
    ) -> Result<T, LayoutError> {
        let id = self.node_id(field)?;
        let value = self.value(id, indices)?;
        convert(value).map_err(|source| LayoutError::Conversion {
            field: self.tree.node(id).display_name().to_string(),
            source,
        })
    }

    /// Resolve an integer attribute of `field` at `indices`.
    pub fn resolve(
        &mut self,
        field: impl FieldRef,
        attribute: Attribute,
        indices: &[usize],
    ) -> Result<i64, LayoutError> {
        let id = self.node_id(field)?;
        self.engine().resolve(id, attribute, indices)
    }

    /// Whether the host version admits `field`.
    pub fn is_supported(&mut self, field: impl FieldRef) -> Result<bool, LayoutError> {
        let id = self.node_id(field)?;
        Ok(self.engine().is_supported(id))
    }

    /// Bytes the host returns for `field`.
    pub fn output_size(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<usize, LayoutError> {
        let id = self.node_id(field)?;
        let mut dims = Dimensions::from(indices);
        self.engine().output_size(id, &mut dims)
    }

    /// Encode `field` (and everything below it) as the host expects it.
    pub fn serialize(&mut self, field: impl FieldRef, indices: &[usize]) -> Result<Bytes, LayoutError> {
        let id = self.node_id(field)?;
        let mut buf = BytesMut::new();
        let mut dims = Dimensions::from(indices);
        let written = self
            .engine()
            .serialize(id, &mut buf, &mut dims, &mut OffsetStack::default())?;
        debug!(field = self.tree.node(id).display_name(), bytes = written, "serialized");
        Ok(buf.freeze())
    }

    /// Capture `data` into `field` and its descendants without decoding it.
    /// Returns the number of bytes consumed.
    pub fn parse(
        &mut self,
        field: impl FieldRef,
        data: Bytes,
        indices: &[usize],
    ) -> Result<usize, LayoutError> {
        let id = self.node_id(field)?;
        let mut dims = Dimensions::from(indices);
        let consumed = self
            .engine()
            .parse(id, &data, 0, &mut dims, &mut OffsetStack::default())?;
        debug!(
            field = self.tree.node(id).display_name(),
            consumed,
            available = data.len(),
            "parsed"
        );
        Ok(consumed)
    }
}
