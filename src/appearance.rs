use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;
use tracing::debug;

// ── AppearanceError ───────────────────────────────────────────────────────────

/// Why `NeedAppearances` could not be set on a document.
///
/// Filling never fails because of this: [`crate::FormFiller`] logs the error
/// and writes the document anyway.
#[derive(Error, Debug)]
pub enum AppearanceError {
    /// The trailer has no `/Root`, or it does not resolve to a dictionary.
    #[error("document catalog is missing or malformed: {0}")]
    Catalog(String),

    /// `/AcroForm` is neither a dictionary nor a reference to one.
    #[error("/AcroForm is not a dictionary")]
    MalformedForm,
}

/// Where a form dictionary lives in the object table.
#[derive(Debug, Clone, Copy)]
enum FormLocation {
    /// Inline in the catalog stored under this id.
    Inline(ObjectId),
    /// An indirect object of its own.
    Indirect(ObjectId),
}

// ── Public operations ─────────────────────────────────────────────────────────

/// Make sure `document` has a form dictionary and that it asks viewers to
/// regenerate field appearances.
///
/// When the catalog has no `/AcroForm`, a new indirect object is allocated by
/// the document itself and referenced from the catalog. Calling this twice
/// leaves a single form dictionary with `NeedAppearances true`.
pub fn ensure_appearance_regeneration(document: &mut Document) -> Result<(), AppearanceError> {
    if locate_form(document)?.is_none() {
        let root = catalog_id(document)?;
        let form_id = document.add_object(Dictionary::new());
        document
            .get_object_mut(root)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| AppearanceError::Catalog(e.to_string()))?
            .set("AcroForm", Object::Reference(form_id));
        debug!(?form_id, "created /AcroForm");
    }

    flag_existing_form(document)?;
    Ok(())
}

/// Set `NeedAppearances true` on the document's form dictionary, if it has one.
///
/// Returns `Ok(false)` when there is no form to flag.
pub fn flag_existing_form(document: &mut Document) -> Result<bool, AppearanceError> {
    match form_dict_mut(document)? {
        Some(form) => {
            form.set("NeedAppearances", Object::Boolean(true));
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Mutable access to the form dictionary, wherever it is stored.
pub(crate) fn form_dict_mut(
    document: &mut Document,
) -> Result<Option<&mut Dictionary>, AppearanceError> {
    let location = match locate_form(document)? {
        Some(location) => location,
        None => return Ok(None),
    };

    let form = match location {
        FormLocation::Indirect(id) => document
            .get_object_mut(id)
            .and_then(|o| o.as_dict_mut()),
        FormLocation::Inline(root) => document
            .get_object_mut(root)
            .and_then(|o| o.as_dict_mut())
            .and_then(|catalog| catalog.get_mut(b"AcroForm"))
            .and_then(|o| o.as_dict_mut()),
    };

    form.map(Some).map_err(|_| AppearanceError::MalformedForm)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn catalog_id(document: &Document) -> Result<ObjectId, AppearanceError> {
    let root = document
        .trailer
        .get(b"Root")
        .and_then(|o| o.as_reference())
        .map_err(|e| AppearanceError::Catalog(e.to_string()))?;

    document
        .get_object(root)
        .and_then(|o| o.as_dict())
        .map_err(|e| AppearanceError::Catalog(e.to_string()))?;

    Ok(root)
}

/// Find the form dictionary. A `null` entry counts as absent.
fn locate_form(document: &Document) -> Result<Option<FormLocation>, AppearanceError> {
    let root = catalog_id(document)?;
    let catalog = document
        .get_object(root)
        .and_then(|o| o.as_dict())
        .map_err(|e| AppearanceError::Catalog(e.to_string()))?;

    match catalog.get(b"AcroForm") {
        Err(_) | Ok(Object::Null) => Ok(None),
        Ok(Object::Dictionary(_)) => Ok(Some(FormLocation::Inline(root))),
        Ok(Object::Reference(id)) => match document.get_object(*id) {
            Ok(Object::Dictionary(_)) => Ok(Some(FormLocation::Indirect(*id))),
            _ => Err(AppearanceError::MalformedForm),
        },
        Ok(_) => Err(AppearanceError::MalformedForm),
    }
}
