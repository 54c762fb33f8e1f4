//! Declaration tree → [`SchemaTree`].
//!
//! Loading does three things in one depth-first pass:
//!
//! 1. interprets raw attribute strings (literal vs. reference integers,
//!    enumerations, version levels) and enforces per-type length rules;
//! 2. expands every `type="struct"` data element by cloning the children of
//!    the referenced document-level struct, tracking the chain of structs
//!    being expanded so that cycles are reported instead of recursing forever;
//! 3. assigns qualified names and builds the name index.

use std::collections::HashMap;

use tracing::debug;

use super::{
    decl::ElementDecl,
    tree::SchemaTree,
    types::{
        BidiStringType, CharWidth, DataAttrs, DataType, FieldNode, IntAttr, NodeId, NodeKind,
        ProgramAttrs, ReturnValue, TrimMode, Usage,
    },
};
use crate::{
    error::SchemaError,
    version::{VersionRange, Vrm},
};

/// Longest packed/zoned field the host supports, in digits.
pub const MAX_DECIMAL_LENGTH: i64 = 31;

const COMMON_ATTRS: &[&str] = &[
    "name",
    "usage",
    "count",
    "offset",
    "offsetfrom",
    "outputsize",
    "minvrm",
    "maxvrm",
];
const DATA_ATTRS: &[&str] = &[
    "type",
    "length",
    "precision",
    "ccsid",
    "init",
    "struct",
    "bidistringtype",
    "trim",
    "chartype",
    "passby",
];
const PROGRAM_ATTRS: &[&str] = &[
    "name",
    "path",
    "entrypoint",
    "parseorder",
    "returnvalue",
    "threadsafe",
    "epccsid",
];

impl SchemaTree {
    /// Build a tree from a `pcml` declaration root.
    pub fn from_declaration(root: &ElementDecl) -> Result<SchemaTree, SchemaError> {
        if root.tag != "pcml" {
            return Err(SchemaError::MissingRoot {
                found: root.tag.clone(),
            });
        }
        let templates = root
            .children
            .iter()
            .filter(|c| c.tag == "struct")
            .filter_map(|c| c.get("name").map(|name| (name, c)))
            .collect();

        let mut loader = Loader {
            templates,
            nodes: Vec::new(),
            index: HashMap::new(),
            expanding: Vec::new(),
        };
        let root_id = loader.push(
            FieldNode {
                name: String::new(),
                qualified_name: String::new(),
                usage: Usage::Inherit,
                count: IntAttr::Unset,
                offset: IntAttr::Unset,
                offset_from: IntAttr::Unset,
                output_size: IntAttr::Unset,
                version: VersionRange::UNBOUNDED,
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            },
            None,
        )?;

        for child in &root.children {
            match child.tag.as_str() {
                "program" => {
                    loader.program(child, root_id)?;
                }
                "struct" => {
                    if child.get("name").is_none() {
                        return Err(SchemaError::MissingAttribute {
                            element: "struct".to_string(),
                            attribute: "name".to_string(),
                        });
                    }
                    loader.member(child, root_id)?;
                }
                "data" => {
                    return Err(SchemaError::MisplacedElement {
                        tag: child.tag.clone(),
                        parent: "pcml".to_string(),
                    });
                }
                other => {
                    return Err(SchemaError::UnknownElement {
                        tag: other.to_string(),
                        parent: "pcml".to_string(),
                    });
                }
            }
        }

        let array_paths = loader.array_paths();
        debug!(nodes = loader.nodes.len(), "schema loaded");
        Ok(SchemaTree {
            nodes: loader.nodes,
            index: loader.index,
            array_paths,
        })
    }
}

struct Loader<'d> {
    templates: HashMap<&'d str, &'d ElementDecl>,
    nodes: Vec<FieldNode>,
    index: HashMap<String, NodeId>,
    /// Document-level structs whose children are currently being built.
    expanding: Vec<String>,
}

impl<'d> Loader<'d> {
    fn push(&mut self, mut node: FieldNode, parent: Option<NodeId>) -> Result<NodeId, SchemaError> {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        if let Some(p) = parent {
            let prefix = &self.nodes[p.0].qualified_name;
            node.qualified_name = match (prefix.is_empty(), node.name.is_empty()) {
                (_, true) => prefix.clone(),
                (true, false) => node.name.clone(),
                (false, false) => format!("{prefix}.{}", node.name),
            };
            self.nodes[p.0].children.push(id);
        }
        if !node.name.is_empty() {
            if self.index.contains_key(&node.qualified_name) {
                return Err(SchemaError::DuplicateName {
                    qualified_name: node.qualified_name,
                });
            }
            self.index.insert(node.qualified_name.clone(), id);
        }
        self.nodes.push(node);
        Ok(id)
    }

    fn program(&mut self, decl: &'d ElementDecl, parent: NodeId) -> Result<NodeId, SchemaError> {
        warn_unknown_attrs(decl, PROGRAM_ATTRS);
        let name = required(decl, "name")?;
        let attrs = ProgramAttrs {
            path: required(decl, "path")?.to_string(),
            entry_point: decl.get("entrypoint").map(str::to_string),
            parse_order: decl
                .get("parseorder")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            return_value: match decl.get("returnvalue") {
                None | Some("void") => ReturnValue::Void,
                Some("integer") => ReturnValue::Integer,
                Some(other) => return Err(invalid(decl, "returnvalue", other, "expected void or integer")),
            },
            thread_safe: match decl.get("threadsafe") {
                None | Some("false") => false,
                Some("true") => true,
                Some(other) => return Err(invalid(decl, "threadsafe", other, "expected true or false")),
            },
        };
        let id = self.push(
            FieldNode {
                name: name.to_string(),
                qualified_name: String::new(),
                usage: Usage::Inherit,
                count: IntAttr::Unset,
                offset: IntAttr::Unset,
                offset_from: IntAttr::Unset,
                output_size: IntAttr::Unset,
                version: VersionRange::UNBOUNDED,
                kind: NodeKind::Program(attrs),
                parent: None,
                children: Vec::new(),
            },
            Some(parent),
        )?;
        for child in &decl.children {
            self.member(child, id)?;
        }
        if let NodeKind::Program(attrs) = &self.nodes[id.0].kind {
            let children = &self.nodes[id.0].children;
            if let Some(unknown) = attrs
                .parse_order
                .iter()
                .find(|name| !children.iter().any(|c| self.nodes[c.0].name == **name))
            {
                return Err(invalid(decl, "parseorder", unknown, "not a parameter of this program"));
            }
        }
        Ok(id)
    }

    /// Build a `struct` or `data` element below `parent`.
    fn member(&mut self, decl: &'d ElementDecl, parent: NodeId) -> Result<NodeId, SchemaError> {
        match decl.tag.as_str() {
            "struct" => self.structure(decl, parent),
            "data" => self.data(decl, parent),
            "program" | "pcml" => Err(SchemaError::MisplacedElement {
                tag: decl.tag.clone(),
                parent: self.nodes[parent.0].kind.kind_name().to_string(),
            }),
            other => Err(SchemaError::UnknownElement {
                tag: other.to_string(),
                parent: self.nodes[parent.0].kind.kind_name().to_string(),
            }),
        }
    }

    fn structure(&mut self, decl: &'d ElementDecl, parent: NodeId) -> Result<NodeId, SchemaError> {
        warn_unknown_attrs(decl, &[]);
        let node = common_node(decl, NodeKind::Struct)?;
        let is_template = parent.0 == 0;
        let template_name = node.name.clone();
        let id = self.push(node, Some(parent))?;

        if is_template {
            self.expanding.push(template_name);
        }
        let built = decl
            .children
            .iter()
            .try_for_each(|child| self.member(child, id).map(|_| ()));
        if is_template {
            self.expanding.pop();
        }
        built.map(|_| id)
    }

    fn data(&mut self, decl: &'d ElementDecl, parent: NodeId) -> Result<NodeId, SchemaError> {
        warn_unknown_attrs(decl, DATA_ATTRS);
        if let Some(child) = decl.children.first() {
            return Err(SchemaError::MisplacedElement {
                tag: child.tag.clone(),
                parent: "data".to_string(),
            });
        }
        let type_text = required(decl, "type")?;
        let data_type = DataType::parse(type_text)
            .ok_or_else(|| invalid(decl, "type", type_text, "unknown data type"))?;

        if data_type == DataType::Struct {
            return self.struct_ref(decl, parent);
        }

        let attrs = data_attrs(decl, data_type)?;
        let node = common_node(decl, NodeKind::Data(attrs))?;
        self.push(node, Some(parent))
    }

    /// Expand `type="struct"` data into a composite carrying the referenced
    /// struct's children.
    fn struct_ref(&mut self, decl: &'d ElementDecl, parent: NodeId) -> Result<NodeId, SchemaError> {
        if decl.get("length").is_some() {
            return Err(invalid(
                decl,
                "length",
                decl.get("length").unwrap_or_default(),
                "not allowed on struct data",
            ));
        }
        let struct_name = required(decl, "struct")?;
        let template = *self
            .templates
            .get(struct_name)
            .ok_or_else(|| SchemaError::UnknownStruct {
                element: decl.get("name").unwrap_or_default().to_string(),
                struct_name: struct_name.to_string(),
            })?;
        if self.expanding.iter().any(|s| s == struct_name) {
            let mut chain = self.expanding.clone();
            chain.push(struct_name.to_string());
            return Err(SchemaError::CircularStructRef { chain });
        }

        let node = common_node(decl, NodeKind::Struct)?;
        let id = self.push(node, Some(parent))?;

        self.expanding.push(struct_name.to_string());
        let built = template
            .children
            .iter()
            .try_for_each(|child| self.member(child, id).map(|_| ()));
        self.expanding.pop();
        built.map(|_| id)
    }

    fn array_paths(&self) -> Vec<Vec<NodeId>> {
        // Parents are always pushed before their children.
        let mut paths: Vec<Vec<NodeId>> = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let mut path = node
                .parent
                .map(|p| paths[p.0].clone())
                .unwrap_or_default();
            if node.is_array() {
                path.push(NodeId(i));
            }
            paths.push(path);
        }
        paths
    }
}

fn common_node(decl: &ElementDecl, kind: NodeKind) -> Result<FieldNode, SchemaError> {
    let usage = match decl.get("usage") {
        Some(text) => Usage::parse(text)
            .ok_or_else(|| invalid(decl, "usage", text, "expected input, output, inputoutput or inherit"))?,
        None => Usage::Inherit,
    };
    let count = int_attr(decl, "count")?;
    if let Some(v) = count.literal()
        && v < 0
    {
        return Err(invalid(decl, "count", &v.to_string(), "must not be negative"));
    }
    let offset_from = match int_attr(decl, "offsetfrom")? {
        IntAttr::Literal(-1) => IntAttr::Unset,
        IntAttr::Literal(v) if v < 0 => {
            return Err(invalid(
                decl,
                "offsetfrom",
                &v.to_string(),
                "must be a field name or a non-negative offset",
            ));
        }
        other => other,
    };

    Ok(FieldNode {
        name: decl.get("name").unwrap_or_default().to_string(),
        qualified_name: String::new(),
        usage,
        count,
        offset: int_attr(decl, "offset")?,
        offset_from,
        output_size: int_attr(decl, "outputsize")?,
        version: VersionRange {
            min: vrm_attr(decl, "minvrm")?.unwrap_or(i64::MIN),
            max: vrm_attr(decl, "maxvrm")?.unwrap_or(i64::MAX),
        },
        kind,
        parent: None,
        children: Vec::new(),
    })
}

fn data_attrs(decl: &ElementDecl, data_type: DataType) -> Result<DataAttrs, SchemaError> {
    let length = int_attr(decl, "length")?;
    let precision = match decl.get("precision") {
        Some(text) => Some(
            text.trim()
                .parse::<i32>()
                .map_err(|_| invalid(decl, "precision", text, "expected an integer"))?,
        ),
        None => None,
    };
    let length_text = || decl.get("length").unwrap_or_default().to_string();

    let precision = match data_type {
        DataType::Int => {
            let len = match length.literal() {
                Some(len @ (2 | 4 | 8)) => len,
                _ if !length.is_set() => return Err(missing(decl, "length")),
                _ => return Err(invalid(decl, "length", &length_text(), "int length must be 2, 4 or 8")),
            };
            let bits = (len * 8) as i32;
            match precision {
                None => bits - 1,
                Some(p) if p == bits - 1 || p == bits => p,
                Some(p) => {
                    return Err(invalid(
                        decl,
                        "precision",
                        &p.to_string(),
                        &format!("int of length {len} needs precision {} or {bits}", bits - 1),
                    ));
                }
            }
        }
        DataType::Float => {
            match length.literal() {
                Some(4 | 8) => {}
                _ if !length.is_set() => return Err(missing(decl, "length")),
                _ => return Err(invalid(decl, "length", &length_text(), "float length must be 4 or 8")),
            }
            precision.unwrap_or(0)
        }
        DataType::Packed | DataType::Zoned => {
            if !length.is_set() {
                return Err(missing(decl, "length"));
            }
            let p = precision.unwrap_or(0);
            if p < 0 {
                return Err(invalid(decl, "precision", &p.to_string(), "must not be negative"));
            }
            if let Some(len) = length.literal() {
                if !(1..=MAX_DECIMAL_LENGTH).contains(&len) {
                    return Err(invalid(
                        decl,
                        "length",
                        &length_text(),
                        &format!("decimal length must be 1..={MAX_DECIMAL_LENGTH}"),
                    ));
                }
                if p as i64 > len {
                    return Err(invalid(decl, "precision", &p.to_string(), "exceeds the length"));
                }
            }
            p
        }
        DataType::Char | DataType::Byte => {
            if !length.is_set() {
                return Err(missing(decl, "length"));
            }
            if let Some(len) = length.literal()
                && len < 0
            {
                return Err(invalid(decl, "length", &length_text(), "must not be negative"));
            }
            precision.unwrap_or(0)
        }
        DataType::Struct => precision.unwrap_or(0),
    };

    Ok(DataAttrs {
        data_type,
        length,
        precision,
        ccsid: int_attr(decl, "ccsid")?,
        init: decl.get("init").map(str::to_string),
        bidi_string_type: enum_attr(decl, "bidistringtype", BidiStringType::parse)?.unwrap_or_default(),
        trim: enum_attr(decl, "trim", TrimMode::parse)?.unwrap_or_default(),
        char_width: enum_attr(decl, "chartype", CharWidth::parse)?.unwrap_or_default(),
    })
}

fn int_attr(decl: &ElementDecl, name: &str) -> Result<IntAttr, SchemaError> {
    match decl.get(name) {
        None => Ok(IntAttr::Unset),
        Some(text) if text.trim().is_empty() => Err(invalid(decl, name, text, "must not be empty")),
        Some(text) => Ok(IntAttr::parse(text)),
    }
}

fn vrm_attr(decl: &ElementDecl, name: &str) -> Result<Option<i64>, SchemaError> {
    match decl.get(name) {
        None => Ok(None),
        Some(text) => Vrm::parse(text)
            .map(|v| Some(v.packed()))
            .ok_or_else(|| invalid(decl, name, text, "expected VxRyMz")),
    }
}

fn enum_attr<T>(
    decl: &ElementDecl,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, SchemaError> {
    match decl.get(name) {
        None => Ok(None),
        Some(text) => parse(text)
            .map(Some)
            .ok_or_else(|| invalid(decl, name, text, "unrecognized value")),
    }
}

fn required<'a>(decl: &'a ElementDecl, name: &str) -> Result<&'a str, SchemaError> {
    decl.get(name).ok_or_else(|| missing(decl, name))
}

fn missing(decl: &ElementDecl, attribute: &str) -> SchemaError {
    SchemaError::MissingAttribute {
        element: element_label(decl),
        attribute: attribute.to_string(),
    }
}

fn invalid(decl: &ElementDecl, attribute: &str, value: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidAttribute {
        element: element_label(decl),
        attribute: attribute.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn element_label(decl: &ElementDecl) -> String {
    match decl.get("name") {
        Some(name) => format!("{} {name}", decl.tag),
        None => decl.tag.clone(),
    }
}

fn warn_unknown_attrs(decl: &ElementDecl, extra: &[&str]) {
    for (name, _) in &decl.attributes {
        let known = if decl.tag == "program" {
            extra.contains(&name.as_str())
        } else {
            COMMON_ATTRS.contains(&name.as_str()) || extra.contains(&name.as_str())
        };
        if !known {
            debug!(element = %element_label(decl), attribute = %name, "ignoring unknown attribute");
        }
    }
}
