//! Per-node runtime values.
//!
//! A node outside any array owns a single [`ScalarSlot`]. A node inside one
//! or more arrays owns nested [`DimensionVector`]s, one nesting level per
//! enclosing array, each sized to the count that was current when it was
//! built. A vector older than the value its count comes from is rebuilt on
//! the next access, discarding the elements it held.

use bytes::Bytes;
use pcml_core::{CodecError, NativeValue, NodeId, PrimitiveCodec, ScalarFormat};
use tracing::debug;

use crate::{
    clock::{self, NEVER},
    error::LayoutError,
};

/// Value held for one element of a data field.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Decoded(NativeValue),
    /// Bytes captured by a parse; decoded on first read.
    Encoded { raw: Bytes, format: ScalarFormat },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSlot {
    pub value: Option<SlotValue>,
    /// Clock reading of the last set or parse.
    pub timestamp: i64,
}

impl ScalarSlot {
    fn empty() -> Self {
        Self {
            value: None,
            timestamp: NEVER,
        }
    }

    pub(crate) fn store(&mut self, value: SlotValue) {
        self.value = Some(value);
        self.timestamp = clock::tick();
    }

    /// Decoded value, decoding and memoizing captured bytes first.
    pub(crate) fn materialize(
        &mut self,
        codec: &dyn PrimitiveCodec,
    ) -> Result<Option<&NativeValue>, CodecError> {
        if let Some(SlotValue::Encoded { raw, format }) = &self.value {
            let decoded = codec.decode(format, raw)?;
            self.value = Some(SlotValue::Decoded(decoded));
        }
        Ok(match &self.value {
            Some(SlotValue::Decoded(v)) => Some(v),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionVector {
    pub elements: Vec<Option<DimensionedValue>>,
    /// Clock reading when the vector was built.
    pub timestamp: i64,
}

impl DimensionVector {
    fn new(len: usize) -> Self {
        Self {
            elements: vec![None; len],
            timestamp: clock::tick(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionedValue {
    Scalar(ScalarSlot),
    Vector(DimensionVector),
}

/// Resolved count of one enclosing array level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Level {
    pub count: usize,
    /// Timestamp of the value the count came from.
    pub governing: i64,
}

/// Runtime values of every node in one document.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    slots: Vec<Option<DimensionedValue>>,
    /// Nodes whose enclosing counts are being resolved.
    locating: Vec<NodeId>,
}

impl ValueStore {
    pub fn new(node_count: usize) -> Self {
        Self {
            slots: vec![None; node_count],
            locating: Vec::new(),
        }
    }

    /// Drop every value.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Current (possibly not yet materialized) value storage for `id`.
    pub fn get(&self, id: NodeId) -> Option<&DimensionedValue> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn enter(&mut self, id: NodeId) -> bool {
        if self.locating.contains(&id) {
            return false;
        }
        self.locating.push(id);
        true
    }

    pub(crate) fn leave(&mut self) {
        self.locating.pop();
    }

    /// Walk `levels` with `indices`, rebuilding stale vectors, and return the
    /// innermost slot, creating it if needed.
    pub(crate) fn slot_mut(
        &mut self,
        id: NodeId,
        field: &str,
        levels: &[Level],
        indices: &[usize],
    ) -> Result<&mut ScalarSlot, LayoutError> {
        let mut cell = &mut self.slots[id.index()];
        for (dimension, level) in levels.iter().enumerate() {
            let vector = fresh_vector(cell, level, field, dimension);
            let index = indices[dimension];
            if index >= level.count {
                return Err(LayoutError::IndexOutOfBounds {
                    field: field.to_string(),
                    dimension,
                    index,
                    max_index: level.count as i64 - 1,
                });
            }
            cell = &mut vector.elements[index];
        }
        if !matches!(cell, Some(DimensionedValue::Scalar(_))) {
            *cell = Some(DimensionedValue::Scalar(ScalarSlot::empty()));
        }
        match cell {
            Some(DimensionedValue::Scalar(slot)) => Ok(slot),
            _ => unreachable!("scalar slot was just installed"),
        }
    }
}

fn fresh_vector<'s>(
    cell: &'s mut Option<DimensionedValue>,
    level: &Level,
    field: &str,
    dimension: usize,
) -> &'s mut DimensionVector {
    let stale = match cell {
        Some(DimensionedValue::Vector(v)) => {
            level.governing > v.timestamp || v.elements.len() != level.count
        }
        _ => true,
    };
    if stale {
        if cell.is_some() {
            debug!(field, dimension, count = level.count, "rebuilding stale dimension vector");
        }
        *cell = Some(DimensionedValue::Vector(DimensionVector::new(level.count)));
    }
    match cell {
        Some(DimensionedValue::Vector(v)) => v,
        _ => unreachable!("dimension vector was just installed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(count: usize, governing: i64) -> Level {
        Level { count, governing }
    }

    #[test]
    fn scalar_slot_is_created_on_demand() {
        let mut store = ValueStore::new(1);
        let slot = store.slot_mut(NodeId::from_index(0), "x", &[], &[]).expect("slot");
        assert!(slot.value.is_none());
        slot.store(SlotValue::Decoded(NativeValue::I32(1)));
        assert!(matches!(store.get(NodeId::from_index(0)), Some(DimensionedValue::Scalar(_))));
    }

    #[test]
    fn newer_count_discards_elements() {
        let id = NodeId::from_index(0);
        let mut store = ValueStore::new(1);
        store
            .slot_mut(id, "x", &[level(2, NEVER)], &[1])
            .expect("slot")
            .store(SlotValue::Decoded(NativeValue::I32(7)));

        // same count and no newer governing value: element survives
        let kept = store.slot_mut(id, "x", &[level(2, NEVER)], &[1]).expect("slot");
        assert!(kept.value.is_some());

        let later = clock::tick();
        let rebuilt = store.slot_mut(id, "x", &[level(2, later)], &[1]).expect("slot");
        assert!(rebuilt.value.is_none());
    }

    #[test]
    fn reports_max_index() {
        let mut store = ValueStore::new(1);
        let err = store
            .slot_mut(NodeId::from_index(0), "x", &[level(3, NEVER)], &[3])
            .expect_err("out of bounds");
        assert!(matches!(
            err,
            LayoutError::IndexOutOfBounds { index: 3, max_index: 2, dimension: 0, .. }
        ));
    }
}
