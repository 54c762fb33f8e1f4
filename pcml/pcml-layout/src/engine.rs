//! Borrowed view of a document used by the resolver and the layout walks.

use pcml_core::{DataAttrs, NativeValue, NodeId, PrimitiveCodec, SchemaTree};

use crate::{
    clock::NEVER,
    error::{LayoutError, ReferenceKind},
    options::LayoutOptions,
    store::{Level, ScalarSlot, SlotValue, ValueStore},
};

pub(crate) struct Engine<'a> {
    pub(crate) tree: &'a SchemaTree,
    pub(crate) store: &'a mut ValueStore,
    pub(crate) codec: &'a dyn PrimitiveCodec,
    pub(crate) options: &'a LayoutOptions,
}

impl<'a> Engine<'a> {
    pub(crate) fn field(&self, id: NodeId) -> &'a str {
        self.tree.node(id).display_name()
    }

    pub(crate) fn leaf(&self, id: NodeId) -> Result<&'a DataAttrs, LayoutError> {
        self.tree
            .node(id)
            .data()
            .ok_or_else(|| LayoutError::NotALeaf {
                field: self.field(id).to_string(),
            })
    }

    /// Slot holding the element of `id` at `indices`.
    ///
    /// Counts of every enclosing array are resolved first; `indices` may be
    /// longer than the number of levels.
    pub(crate) fn locate(
        &mut self,
        id: NodeId,
        indices: &[usize],
    ) -> Result<&mut ScalarSlot, LayoutError> {
        let tree = self.tree;
        let field = self.field(id);
        if !self.store.enter(id) {
            return Err(LayoutError::SchemaReference {
                kind: ReferenceKind::CircularReference,
                name: field.to_string(),
                referenced_by: field.to_string(),
            });
        }
        let path = tree.array_path(id);
        let levels = if indices.len() < path.len() {
            Err(LayoutError::TooFewIndices {
                field: field.to_string(),
                expected: path.len(),
                actual: indices.len(),
            })
        } else {
            self.levels(path, indices)
        };
        self.store.leave();

        self.store.slot_mut(id, field, &levels?, indices)
    }

    fn levels(&mut self, path: &[NodeId], indices: &[usize]) -> Result<Vec<Level>, LayoutError> {
        path.iter()
            .enumerate()
            .map(|(depth, &array)| {
                self.count(array, &indices[..depth])
                    .map(|(count, governing)| Level { count, governing })
            })
            .collect()
    }

    /// Value of a data field with the timestamp it was stored at, falling back
    /// to its `init` value. `None` when neither exists.
    pub(crate) fn current(
        &mut self,
        id: NodeId,
        indices: &[usize],
    ) -> Result<Option<(NativeValue, i64)>, LayoutError> {
        let attrs = self.leaf(id)?;
        let field = self.field(id);
        let codec = self.codec;

        let slot = self.locate(id, indices)?;
        let timestamp = slot.timestamp;
        let stored = slot
            .materialize(codec)
            .map_err(|source| LayoutError::Codec {
                field: field.to_string(),
                source,
            })?;
        if let Some(value) = stored {
            return Ok(Some((value.clone(), timestamp)));
        }

        match &attrs.init {
            Some(init) => Ok(Some((self.coerce(id, NativeValue::string(init.as_str()))?, NEVER))),
            None => Ok(None),
        }
    }

    /// Convert `value` to the variant field `id` stores.
    pub(crate) fn coerce(&self, id: NodeId, value: NativeValue) -> Result<NativeValue, LayoutError> {
        let attrs = self.leaf(id)?;
        let kind = attrs.native_kind().ok_or_else(|| LayoutError::BadDataType {
            field: self.field(id).to_string(),
            data_type: attrs.data_type,
        })?;
        value.coerce(kind).map_err(|source| LayoutError::Conversion {
            field: self.field(id).to_string(),
            source,
        })
    }

    pub(crate) fn set(
        &mut self,
        id: NodeId,
        indices: &[usize],
        value: NativeValue,
    ) -> Result<(), LayoutError> {
        let value = self.coerce(id, value)?;
        self.locate(id, indices)?.store(SlotValue::Decoded(value));
        Ok(())
    }
}
