use crate::{pdf_utils, FieldKind, FormField};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;

/// Upper bound when climbing `/Parent` chains of the field tree.
const MAX_FIELD_DEPTH: usize = 64;

/// A terminal field located from one of its widget annotations.
#[derive(Debug, Clone)]
pub(crate) struct FieldRef {
    /// The object carrying the field's `/V`: the widget itself when field and
    /// widget are merged, otherwise the widget's `/Parent`.
    pub(crate) id: ObjectId,
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
}

/// Attributes a field inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    name: Option<String>,
    field_type: Option<Vec<u8>>,
    flags: i64,
    value: Option<Object>,
}

/// Walks the interactive form's field tree of a document.
///
/// Two entry points:
/// 1. Top-down from `/AcroForm/Fields`, producing the list of fillable names.
/// 2. Bottom-up from a page's widget annotations, naming the field each
///    widget belongs to.
pub(crate) struct FieldDiscovery<'a> {
    document: &'a Document,
}

impl<'a> FieldDiscovery<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` when the catalog has a form dictionary.
    pub(crate) fn has_form(&self) -> bool {
        pdf_utils::acroform(self.document).is_some()
    }

    /// Every terminal field of the form, depth first in `/Fields` order.
    ///
    /// A document without a form yields an empty list. Objects reached twice
    /// (cyclic or shared `/Kids`) are visited once.
    pub(crate) fn collect_fields(&self) -> Vec<FormField> {
        let mut out = Vec::new();

        let form = match pdf_utils::acroform(self.document) {
            Some(form) => form,
            None => return out,
        };

        let roots = match form
            .get(b"Fields")
            .ok()
            .and_then(|v| pdf_utils::resolve_array(self.document, v))
        {
            Some(roots) => roots,
            None => return out,
        };

        let mut visited = BTreeSet::new();
        for root in roots {
            if let Ok(id) = root.as_reference() {
                self.walk(id, &Inherited::default(), &mut visited, &mut out);
            }
        }

        out
    }

    /// The widget annotations on a page, in `/Annots` order.
    pub(crate) fn widgets_on_page(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let annots = pdf_utils::dict_by_id(self.document, page_id)
            .and_then(|page| page.get(b"Annots").ok())
            .and_then(|v| pdf_utils::resolve_array(self.document, v));

        let annots = match annots {
            Some(annots) => annots,
            None => return Vec::new(),
        };

        annots
            .iter()
            .filter_map(|a| a.as_reference().ok())
            .filter(|id| {
                pdf_utils::dict_by_id(self.document, *id)
                    .and_then(|d| pdf_utils::name_of(d, b"Subtype"))
                    .map(|subtype| subtype == b"Widget")
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Name the terminal field a widget belongs to.
    pub(crate) fn field_of_widget(&self, widget_id: ObjectId) -> Option<FieldRef> {
        let widget = pdf_utils::dict_by_id(self.document, widget_id)?;

        let id = if widget.has(b"T") {
            widget_id
        } else {
            widget.get(b"Parent").ok()?.as_reference().ok()?
        };

        let chain = self.ancestry(id);
        let mut inherited = Inherited::default();
        for node in chain.iter().rev() {
            inherited = Self::inherit(node, &inherited);
        }

        Some(FieldRef {
            id,
            name: inherited.name?,
            kind: FieldKind::from_parts(inherited.field_type.as_deref(), inherited.flags),
        })
    }

    /// The root of the field tree containing `field_id`.
    pub(crate) fn root_of(&self, field_id: ObjectId) -> ObjectId {
        let mut current = field_id;
        for _ in 0..MAX_FIELD_DEPTH {
            let parent = pdf_utils::dict_by_id(self.document, current)
                .and_then(|d| d.get(b"Parent").ok())
                .and_then(|p| p.as_reference().ok());
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    // ── Private ──────────────────────────────────────────────────────────────

    fn walk(
        &self,
        node_id: ObjectId,
        parent: &Inherited,
        visited: &mut BTreeSet<ObjectId>,
        out: &mut Vec<FormField>,
    ) {
        if !visited.insert(node_id) {
            return;
        }

        let node = match pdf_utils::dict_by_id(self.document, node_id) {
            Some(node) => node,
            None => return,
        };

        let inherited = Self::inherit(node, parent);
        let named_kids = self.named_kids(node);

        if named_kids.is_empty() {
            // Terminal field; its kids, if any, are plain widgets.
            if let Some(name) = inherited.name.clone() {
                let kind =
                    FieldKind::from_parts(inherited.field_type.as_deref(), inherited.flags);
                out.push(FormField {
                    name,
                    kind,
                    value: inherited.value.as_ref().and_then(describe_value),
                });
            }
            return;
        }

        for kid in named_kids {
            self.walk(kid, &inherited, visited, out);
        }
    }

    /// Kids that carry a partial name and so are fields, not bare widgets.
    fn named_kids(&self, node: &Dictionary) -> Vec<ObjectId> {
        let kids = match node
            .get(b"Kids")
            .ok()
            .and_then(|v| pdf_utils::resolve_array(self.document, v))
        {
            Some(kids) => kids,
            None => return Vec::new(),
        };

        kids.iter()
            .filter_map(|k| k.as_reference().ok())
            .filter(|id| {
                pdf_utils::dict_by_id(self.document, *id)
                    .map(|d| d.has(b"T"))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// `field_id` and its ancestors, nearest first.
    fn ancestry(&self, field_id: ObjectId) -> Vec<&'a Dictionary> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = Some(field_id);

        while let Some(id) = current {
            if !seen.insert(id) || chain.len() >= MAX_FIELD_DEPTH {
                break;
            }
            let dict = match pdf_utils::dict_by_id(self.document, id) {
                Some(dict) => dict,
                None => break,
            };
            chain.push(dict);
            current = dict.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
        }

        chain
    }

    fn inherit(node: &Dictionary, parent: &Inherited) -> Inherited {
        let name = match pdf_utils::extract_string_from_dict(node, b"T") {
            Some(partial) => Some(match &parent.name {
                Some(prefix) => format!("{prefix}.{partial}"),
                None => partial,
            }),
            None => parent.name.clone(),
        };

        Inherited {
            name,
            field_type: pdf_utils::name_of(node, b"FT").or_else(|| parent.field_type.clone()),
            flags: node
                .get(b"Ff")
                .and_then(|f| f.as_i64())
                .unwrap_or(parent.flags),
            value: node.get(b"V").ok().cloned().or_else(|| parent.value.clone()),
        }
    }
}

/// Render a `/V` entry for display.
fn describe_value(value: &Object) -> Option<String> {
    match value {
        Object::String(bytes, _) => Some(pdf_utils::decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(describe_value).collect();
            Some(parts.join(", "))
        }
        _ => None,
    }
}
