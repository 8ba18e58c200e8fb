//! In-memory PDF fixtures for unit tests.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// A one-page document with a catalog and no form.
pub(crate) fn blank_document() -> Document {
    FixtureBuilder::new(1).build_without_form()
}

/// Builds small AcroForm documents: pages with widget annotations and a
/// field tree that references them.
pub(crate) struct FixtureBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    fields: Vec<ObjectId>,
    form_extras: Dictionary,
}

impl FixtureBuilder {
    pub(crate) fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([("Helv", Object::Reference(font_id))])),
        )]));

        let page_ids = (0..page_count)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
                doc.add_object(Dictionary::from_iter([
                    ("Type", Object::Name(b"Page".to_vec())),
                    ("Parent", Object::Reference(pages_id)),
                    ("Contents", Object::Reference(content_id)),
                    ("Annots", Object::Array(vec![])),
                ]))
            })
            .collect::<Vec<_>>();

        // MediaBox and Resources live on the tree node so importers must inherit them.
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                (
                    "Kids",
                    Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
                ),
                ("Count", Object::Integer(page_count as i64)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
                ("Resources", Object::Reference(resources_id)),
            ])),
        );

        let form_extras = Dictionary::from_iter([
            ("DA", Object::string_literal("/Helv 0 Tf 0 g")),
            (
                "DR",
                Object::Dictionary(Dictionary::from_iter([(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter([("Helv", Object::Reference(font_id))])),
                )])),
            ),
        ]);

        Self {
            doc,
            pages_id,
            page_ids,
            fields: Vec::new(),
            form_extras,
        }
    }

    pub(crate) fn text_field(&mut self, page: usize, name: &str) -> ObjectId {
        let widget = self.widget(page, name, b"Tx");
        self.fields.push(widget);
        widget
    }

    pub(crate) fn choice_field(&mut self, page: usize, name: &str, options: &[&str]) -> ObjectId {
        let widget = self.widget(page, name, b"Ch");
        let opts = options.iter().map(|o| Object::string_literal(*o)).collect();
        self.dict_mut(widget).set("Opt", Object::Array(opts));
        self.fields.push(widget);
        widget
    }

    pub(crate) fn checkbox(&mut self, page: usize, name: &str, on_state: &str) -> ObjectId {
        let widget = self.widget(page, name, b"Btn");
        let on = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"0 g".to_vec()));
        let off = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"".to_vec()));
        let normal = Dictionary::from_iter([
            (on_state, Object::Reference(on)),
            ("Off", Object::Reference(off)),
        ]);
        let dict = self.dict_mut(widget);
        dict.set(
            "AP",
            Object::Dictionary(Dictionary::from_iter([("N", Object::Dictionary(normal))])),
        );
        dict.set("AS", Object::Name(b"Off".to_vec()));
        dict.set("V", Object::Name(b"Off".to_vec()));
        self.fields.push(widget);
        widget
    }

    /// A non-terminal field named `parent` whose text kids sit on `page`.
    pub(crate) fn text_group(&mut self, page: usize, parent: &str, kids: &[&str]) -> ObjectId {
        let parent_id = self.doc.add_object(Dictionary::from_iter([
            ("T", Object::string_literal(parent)),
            ("FT", Object::Name(b"Tx".to_vec())),
        ]));
        let kid_ids: Vec<Object> = kids
            .iter()
            .map(|kid| {
                let widget = self.widget(page, kid, b"Tx");
                let dict = self.dict_mut(widget);
                dict.remove(b"FT");
                dict.set("Parent", Object::Reference(parent_id));
                Object::Reference(widget)
            })
            .collect();
        self.dict_mut(parent_id).set("Kids", Object::Array(kid_ids));
        self.fields.push(parent_id);
        parent_id
    }

    pub(crate) fn build(mut self) -> Document {
        let mut form = self.form_extras.clone();
        form.set(
            "Fields",
            Object::Array(self.fields.iter().map(|id| Object::Reference(*id)).collect()),
        );
        let form_id = self.doc.add_object(form);
        self.finish(Some(form_id))
    }

    pub(crate) fn build_without_form(self) -> Document {
        self.finish(None)
    }

    fn finish(mut self, form_id: Option<ObjectId>) -> Document {
        let mut catalog = Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]);
        if let Some(id) = form_id {
            catalog.set("AcroForm", Object::Reference(id));
        }
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc
    }

    fn widget(&mut self, page: usize, name: &str, field_type: &[u8]) -> ObjectId {
        let page_id = self.page_ids[page];
        let widget = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Annot".to_vec())),
            ("Subtype", Object::Name(b"Widget".to_vec())),
            ("FT", Object::Name(field_type.to_vec())),
            ("T", Object::string_literal(name)),
            (
                "Rect",
                Object::Array(vec![50.into(), 700.into(), 250.into(), 720.into()]),
            ),
            ("P", Object::Reference(page_id)),
        ]));
        self.dict_mut(page_id)
            .get_mut(b"Annots")
            .and_then(|o| o.as_array_mut())
            .unwrap()
            .push(Object::Reference(widget));
        widget
    }

    fn dict_mut(&mut self, id: ObjectId) -> &mut Dictionary {
        self.doc.get_object_mut(id).unwrap().as_dict_mut().unwrap()
    }
}

/// Serialize a fixture to bytes.
pub(crate) fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
