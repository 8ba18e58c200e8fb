use crate::{pdf_utils, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, BTreeSet};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound when climbing `/Parent` chains, so a cyclic page tree cannot
/// loop forever.
const MAX_TREE_DEPTH: usize = 64;

/// What an indirect reference in the source turns into in the destination.
enum Link {
    /// Copied (or already copied) under this destination id.
    Copied(ObjectId),
    /// A page or page-tree node other than the one being imported.
    ForeignPage,
    /// An annotation that belongs to a different page. Annotations listed in
    /// the imported page's own `/Annots` never are, whatever their `/P` says.
    ForeignAnnotation,
    /// The reference points at nothing.
    Dangling,
}

/// Copies one page of a source document, together with every object it
/// reaches, into a destination document.
///
/// Objects are renumbered with ids allocated by the destination. Shared
/// objects are copied once: importing more objects later (e.g. the form's
/// default resources) reuses what the page import already brought over.
///
/// The walk never leaves the page: references to other pages become `null`
/// and annotations whose `/P` names another page are left out, so copying a
/// widget does not drag its siblings' pages along through the field tree.
/// The page's own `/Annots` are always copied, and their `/P` is pointed at
/// the new page.
pub(crate) struct PageImporter<'a> {
    source: &'a Document,
    source_page: ObjectId,
    own_annots: BTreeSet<ObjectId>,
    id_map: BTreeMap<ObjectId, ObjectId>,
}

impl<'a> PageImporter<'a> {
    pub(crate) fn new(source: &'a Document, source_page: ObjectId) -> Self {
        Self {
            source,
            source_page,
            own_annots: BTreeSet::new(),
            id_map: BTreeMap::new(),
        }
    }

    /// Copy the page into `dest` as a child of the page-tree node `pages_id`
    /// and return its new id. The caller links it into that node's `/Kids`.
    pub(crate) fn import_page(&mut self, dest: &mut Document, pages_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let original = source.get_dictionary(self.source_page)?;
        self.own_annots = original
            .get(b"Annots")
            .ok()
            .and_then(|annots| pdf_utils::resolve_array(source, annots))
            .map(|annots| annots.iter().filter_map(|a| a.as_reference().ok()).collect())
            .unwrap_or_default();

        let mut page = original.clone();
        page.remove(b"Parent");

        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = self.inherited(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }

        let new_page_id = dest.new_object_id();
        self.id_map.insert(self.source_page, new_page_id);

        let mut copied = self.import_dict(dest, &page);
        copied.set("Parent", Object::Reference(pages_id));
        dest.objects.insert(new_page_id, Object::Dictionary(copied));

        // A stale /P was cut off during the copy.
        for annot in &self.own_annots {
            let Some(new_id) = self.mapped(*annot) else {
                continue;
            };
            if let Ok(dict) = dest.get_object_mut(new_id).and_then(|o| o.as_dict_mut()) {
                dict.set("P", Object::Reference(new_page_id));
            }
        }

        Ok(new_page_id)
    }

    /// Copy an arbitrary source value into `dest`, following references.
    pub(crate) fn import_object(&mut self, dest: &mut Document, value: &Object) -> Object {
        self.import_value(dest, value).unwrap_or(Object::Null)
    }

    /// The destination id a source object was copied to, if it was.
    pub(crate) fn mapped(&self, source_id: ObjectId) -> Option<ObjectId> {
        self.id_map.get(&source_id).copied()
    }

    // ── Private: deep copy ───────────────────────────────────────────────────

    /// `None` means "leave this element out of the enclosing array".
    fn import_value(&mut self, dest: &mut Document, value: &Object) -> Option<Object> {
        match value {
            Object::Reference(id) => match self.import_reference(dest, *id) {
                Link::Copied(new_id) => Some(Object::Reference(new_id)),
                Link::ForeignAnnotation => None,
                Link::ForeignPage | Link::Dangling => Some(Object::Null),
            },
            Object::Array(items) => Some(Object::Array(
                items
                    .iter()
                    .filter_map(|item| self.import_value(dest, item))
                    .collect(),
            )),
            Object::Dictionary(dict) => Some(Object::Dictionary(self.import_dict(dest, dict))),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.import_dict(dest, &stream.dict);
                Some(Object::Stream(copy))
            }
            other => Some(other.clone()),
        }
    }

    fn import_dict(&mut self, dest: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            match self.import_value(dest, value) {
                Some(Object::Null) | None => {}
                Some(copied) => out.set(key.clone(), copied),
            }
        }
        out
    }

    fn import_reference(&mut self, dest: &mut Document, id: ObjectId) -> Link {
        if let Some(new_id) = self.id_map.get(&id) {
            return Link::Copied(*new_id);
        }

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(_) => return Link::Dangling,
        };

        if let Some(foreign) = self.foreign_kind(id, object) {
            return foreign;
        }

        // Register before recursing so cycles resolve to the same id.
        let new_id = dest.new_object_id();
        self.id_map.insert(id, new_id);
        let copied = self.import_object(dest, object);
        dest.objects.insert(new_id, copied);
        Link::Copied(new_id)
    }

    /// Classify objects that belong to some other page.
    fn foreign_kind(&self, id: ObjectId, object: &Object) -> Option<Link> {
        let dict = object.as_dict().ok()?;

        if let Some(kind) = pdf_utils::name_of(dict, b"Type") {
            if kind == b"Page" || kind == b"Pages" {
                return Some(Link::ForeignPage);
            }
        }

        if dict.has(b"Subtype") && !self.own_annots.contains(&id) {
            if let Ok(owner) = dict.get(b"P").and_then(|p| p.as_reference()) {
                if owner != self.source_page {
                    return Some(Link::ForeignAnnotation);
                }
            }
        }

        None
    }

    /// Look an inheritable attribute up in the page's ancestors.
    fn inherited(&self, key: &[u8]) -> Option<&'a Object> {
        let source = self.source;
        let mut node = pdf_utils::dict_by_id(source, self.source_page)?;
        for _ in 0..MAX_TREE_DEPTH {
            let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = pdf_utils::dict_by_id(source, parent_id)?;
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
        }
        None
    }
}
