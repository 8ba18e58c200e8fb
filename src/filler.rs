use crate::appearance::{self, ensure_appearance_regeneration, flag_existing_form};
use crate::fields::FieldDiscovery;
use crate::filling::{FieldValueWriter, FillReport};
use crate::page_import::PageImporter;
use crate::validator::PdfValidator;
use crate::{pdf_utils, FillerConfig, FormError, FormField, Result, UnknownFieldPolicy};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Form-dictionary entries carried over from the source form.
const INHERITED_FORM_KEYS: [&[u8]; 3] = [b"DA", b"DR", b"Q"];

// ── FormFiller ────────────────────────────────────────────────────────────────

/// Entry point for listing and filling the fields of a PDF form.
///
/// # Creating a filler
///
/// ```no_run
/// use pdf_autofill::{FillerConfig, FormFiller, UnknownFieldPolicy};
///
/// // From a file path
/// let f = FormFiller::from_path("form.pdf").unwrap();
///
/// // From an in-memory buffer
/// let bytes = std::fs::read("form.pdf").unwrap();
/// let f = FormFiller::from_bytes(&bytes).unwrap();
///
/// // With custom configuration
/// let cfg = FillerConfig {
///     unknown_fields: UnknownFieldPolicy::Error,
///     ..Default::default()
/// };
/// let f = FormFiller::with_config("form.pdf", cfg).unwrap();
/// ```
pub struct FormFiller {
    document: Document,
    config: FillerConfig,
}

impl FormFiller {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, FillerConfig::default())
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_config(data, FillerConfig::default())
    }

    /// Load a PDF from the file system with a custom [`FillerConfig`].
    ///
    /// The file is read in full and closed before parsing, so a missing or
    /// unreadable file is an [`FormError::IoError`] and bad content a
    /// [`FormError::ParseError`].
    pub fn with_config<P: AsRef<Path>>(path: P, config: FillerConfig) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), len = bytes.len(), "read source PDF");
        Self::from_bytes_with_config(&bytes, config)
    }

    /// Load a PDF from an in-memory byte slice with a custom [`FillerConfig`].
    pub fn from_bytes_with_config(data: &[u8], config: FillerConfig) -> Result<Self> {
        let document = Document::load_mem(data)?;
        PdfValidator::new(&document).validate_structure()?;
        Ok(Self { document, config })
    }

    // ── Discovery ─────────────────────────────────────────────────────────────

    /// Returns `true` when the document has an interactive form dictionary.
    pub fn has_form(&self) -> bool {
        FieldDiscovery::new(&self.document).has_form()
    }

    /// Fully qualified names of the form's fields, in field-tree order.
    ///
    /// Empty when the document has no form. The order depends only on the
    /// document, so repeated calls agree.
    pub fn field_names(&self) -> Vec<String> {
        self.fields().into_iter().map(|f| f.name).collect()
    }

    /// The form's fields with their kind and current value.
    pub fn fields(&self) -> Vec<FormField> {
        FieldDiscovery::new(&self.document).collect_fields()
    }

    // ── Filling ───────────────────────────────────────────────────────────────

    /// Build a single-page PDF from the first page with `values` filled in and
    /// return its bytes.
    ///
    /// `NeedAppearances` is set on the loaded source form (in memory only) and
    /// on the new document's form. Failing to set it is logged, never fatal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pdf_autofill::FormFiller;
    ///
    /// let mut filler = FormFiller::from_path("form.pdf").unwrap();
    /// let (bytes, report) = filler.fill_to_bytes([("Name", "Alice")]).unwrap();
    /// println!("{} bytes, updated {:?}", bytes.len(), report.updated);
    /// ```
    pub fn fill_to_bytes<I, K, V>(&mut self, values: I) -> Result<(Vec<u8>, FillReport)>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let values: BTreeMap<String, String> = values
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
            .collect();

        if let Err(e) = flag_existing_form(&mut self.document) {
            warn!(error = %e, "could not set NeedAppearances on the source form");
        }

        let source_page = PdfValidator::new(&self.document).first_page()?;
        let (mut dest, pages_id) = empty_destination(&self.document.version);

        if let Err(e) = ensure_appearance_regeneration(&mut dest) {
            warn!(error = %e, "could not set NeedAppearances on the new form");
        }
        if let Err(e) = flag_existing_form(&mut dest) {
            warn!(error = %e, "could not set NeedAppearances on the new form");
        }

        let mut importer = PageImporter::new(&self.document, source_page);
        let page_id = importer.import_page(&mut dest, pages_id)?;
        dest.objects.insert(pages_id, page_tree(&[page_id]).into());
        link_form(&self.document, &mut importer, &mut dest, page_id);

        let report = FieldValueWriter::new(&mut dest).apply(page_id, &values);
        self.check_unknown(&report)?;

        if self.config.compress_output {
            dest.compress();
        }

        let mut bytes = Vec::new();
        dest.save_to(&mut bytes)
            .map_err(|e| FormError::WriteError(e.to_string()))?;

        info!(
            updated = report.updated.len(),
            unknown = report.unknown.len(),
            skipped = report.skipped.len(),
            "form filled"
        );
        Ok((bytes, report))
    }

    /// Like [`fill_to_bytes`](FormFiller::fill_to_bytes), writing the result
    /// to `destination`. An existing file is overwritten; nothing is written
    /// when filling fails.
    pub fn fill_to_path<P, I, K, V>(&mut self, destination: P, values: I) -> Result<FillReport>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (bytes, report) = self.fill_to_bytes(values)?;
        std::fs::write(destination.as_ref(), bytes)?;
        debug!(path = %destination.as_ref().display(), "wrote filled PDF");
        Ok(report)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Returns a reference to the underlying [`lopdf::Document`].
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Returns a reference to the active [`FillerConfig`].
    pub fn config(&self) -> &FillerConfig {
        &self.config
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn check_unknown(&self, report: &FillReport) -> Result<()> {
        if report.unknown.is_empty() {
            return Ok(());
        }

        match self.config.unknown_fields {
            UnknownFieldPolicy::Ignore => {}
            UnknownFieldPolicy::Warn => {
                for name in &report.unknown {
                    warn!(field = %name, "no field with this name on the first page");
                }
            }
            UnknownFieldPolicy::Error => {
                return Err(FormError::UnknownFields(report.unknown.clone()));
            }
        }

        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A document with a catalog and an empty page tree.
fn empty_destination(version: &str) -> (Document, ObjectId) {
    let mut dest = Document::with_version(version);
    let pages_id = dest.new_object_id();
    dest.objects.insert(pages_id, page_tree(&[]).into());

    let catalog_id = dest.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    dest.trailer.set("Root", Object::Reference(catalog_id));

    (dest, pages_id)
}

fn page_tree(kids: &[ObjectId]) -> Dictionary {
    Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        (
            "Kids",
            Object::Array(kids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
        ("Count", Object::Integer(kids.len() as i64)),
    ])
}

/// Point the destination form at the fields of the copied page and carry
/// over the source form's default appearance settings.
fn link_form(source: &Document, importer: &mut PageImporter, dest: &mut Document, page_id: ObjectId) {
    let roots: Vec<Object> = {
        let discovery = FieldDiscovery::new(dest);
        let mut roots: Vec<ObjectId> = Vec::new();
        for widget in discovery.widgets_on_page(page_id) {
            if let Some(field) = discovery.field_of_widget(widget) {
                let root = discovery.root_of(field.id);
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots.into_iter().map(Object::Reference).collect()
    };

    let extras: Vec<(&[u8], Object)> = match pdf_utils::acroform(source) {
        Some(form) => INHERITED_FORM_KEYS
            .iter()
            .filter_map(|key| form.get(key).ok().map(|v| (*key, v)))
            .map(|(key, value)| (key, importer.import_object(dest, value)))
            .collect(),
        None => Vec::new(),
    };

    match appearance::form_dict_mut(dest) {
        Ok(Some(form)) => {
            debug!(fields = roots.len(), "linked fields into the new form");
            form.set("Fields", Object::Array(roots));
            for (key, value) in extras {
                form.set(key.to_vec(), value);
            }
        }
        Ok(None) => debug!("new document has no form dictionary, fields not linked"),
        Err(e) => warn!(error = %e, "could not link fields into the new form"),
    }
}
