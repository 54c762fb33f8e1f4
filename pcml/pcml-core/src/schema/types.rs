use std::fmt;

use crate::{codec::ScalarFormat, value::NativeKind, version::VersionRange};

/// Stable index of a node inside a [`SchemaTree`](super::SchemaTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Id of the node at arena position `index`; only meaningful for the tree
    /// it was taken from.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Attribute that is either a literal integer or the name of another field
/// whose current value supplies the integer at run time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntAttr {
    #[default]
    Unset,
    Literal(i64),
    Reference(String),
}

impl IntAttr {
    /// Integer text becomes a literal; anything else is a field reference.
    pub fn parse(text: &str) -> Self {
        let t = text.trim();
        match t.parse::<i64>() {
            Ok(v) => IntAttr::Literal(v),
            Err(_) => IntAttr::Reference(t.to_string()),
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, IntAttr::Unset)
    }

    pub fn literal(&self) -> Option<i64> {
        match self {
            IntAttr::Literal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            IntAttr::Reference(name) => Some(name),
            _ => None,
        }
    }
}

/// Direction in which a node's bytes travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    Input,
    Output,
    InputOutput,
    #[default]
    Inherit,
}

impl Usage {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "input" => Some(Usage::Input),
            "output" => Some(Usage::Output),
            "inputoutput" => Some(Usage::InputOutput),
            "inherit" => Some(Usage::Inherit),
            _ => None,
        }
    }

    pub fn has_input(&self) -> bool {
        matches!(self, Usage::Input | Usage::InputOutput)
    }

    pub fn has_output(&self) -> bool {
        matches!(self, Usage::Output | Usage::InputOutput)
    }
}

/// Primitive type tag of a data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Char,
    Int,
    Packed,
    Zoned,
    Float,
    Byte,
    Struct,
}

impl DataType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "char" => Some(DataType::Char),
            "int" => Some(DataType::Int),
            "packed" => Some(DataType::Packed),
            "zoned" => Some(DataType::Zoned),
            "float" => Some(DataType::Float),
            "byte" => Some(DataType::Byte),
            "struct" => Some(DataType::Struct),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Char => "char",
            DataType::Int => "int",
            DataType::Packed => "packed",
            DataType::Zoned => "zoned",
            DataType::Float => "float",
            DataType::Byte => "byte",
            DataType::Struct => "struct",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::Packed | DataType::Zoned | DataType::Float
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Blank trimming applied to decoded character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    None,
    Start,
    #[default]
    End,
    Both,
}

impl TrimMode {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "none" => Some(TrimMode::None),
            "start" => Some(TrimMode::Start),
            "end" => Some(TrimMode::End),
            "both" => Some(TrimMode::Both),
            _ => None,
        }
    }

    pub fn apply<'a>(&self, s: &'a str) -> &'a str {
        match self {
            TrimMode::None => s,
            TrimMode::Start => s.trim_start_matches(' '),
            TrimMode::End => s.trim_end_matches(' '),
            TrimMode::Both => s.trim_matches(' '),
        }
    }
}

/// Width of one character in a char field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharWidth {
    #[default]
    OneByte,
    TwoByte,
}

impl CharWidth {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "onebyte" => Some(CharWidth::OneByte),
            "twobyte" => Some(CharWidth::TwoByte),
            _ => None,
        }
    }
}

/// Bidirectional string layout declared on a char field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BidiStringType {
    #[default]
    Default,
    St4,
    St5,
    St6,
    St7,
    St8,
    St9,
    St10,
    St11,
}

impl BidiStringType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "DEFAULT" => Some(BidiStringType::Default),
            "ST4" => Some(BidiStringType::St4),
            "ST5" => Some(BidiStringType::St5),
            "ST6" => Some(BidiStringType::St6),
            "ST7" => Some(BidiStringType::St7),
            "ST8" => Some(BidiStringType::St8),
            "ST9" => Some(BidiStringType::St9),
            "ST10" => Some(BidiStringType::St10),
            "ST11" => Some(BidiStringType::St11),
            _ => None,
        }
    }
}

/// Attributes only data (leaf) nodes carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAttrs {
    pub data_type: DataType,
    pub length: IntAttr,
    pub precision: i32,
    pub ccsid: IntAttr,
    pub init: Option<String>,
    pub bidi_string_type: BidiStringType,
    pub trim: TrimMode,
    pub char_width: CharWidth,
}

impl DataAttrs {
    /// Variant a value of this field is stored as.
    ///
    /// Int and float lengths are literals by the time a tree is loaded, so no
    /// run-time lookup is needed. Struct-typed data has no scalar kind.
    pub fn native_kind(&self) -> Option<NativeKind> {
        let length = self.length.literal().unwrap_or(0).max(0) as usize;
        ScalarFormat::new(self.data_type, length)
            .with_precision(self.precision)
            .native_kind()
    }
}

/// Integer result a service-program entry point returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnValue {
    #[default]
    Void,
    Integer,
}

/// Attributes of a `program` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramAttrs {
    pub path: String,
    pub entry_point: Option<String>,
    /// Parameter names parsed before the others, in this order.
    pub parse_order: Vec<String>,
    pub return_value: ReturnValue,
    pub thread_safe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Program(ProgramAttrs),
    Struct,
    Data(DataAttrs),
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Document => "pcml",
            NodeKind::Program(_) => "program",
            NodeKind::Struct => "struct",
            NodeKind::Data(_) => "data",
        }
    }
}

/// One element of a loaded schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Declared name; empty for anonymous nodes.
    pub name: String,
    /// Dot path from the document root.
    pub qualified_name: String,
    pub usage: Usage,
    pub count: IntAttr,
    pub offset: IntAttr,
    pub offset_from: IntAttr,
    pub output_size: IntAttr,
    pub version: VersionRange,
    pub kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl FieldNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_array(&self) -> bool {
        self.count.is_set()
    }

    pub fn data(&self) -> Option<&DataAttrs> {
        match &self.kind {
            NodeKind::Data(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn program(&self) -> Option<&ProgramAttrs> {
        match &self.kind {
            NodeKind::Program(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Name used in diagnostics: the qualified name, or the kind for anonymous nodes.
    pub fn display_name(&self) -> &str {
        if self.qualified_name.is_empty() {
            self.kind.kind_name()
        } else {
            &self.qualified_name
        }
    }
}
