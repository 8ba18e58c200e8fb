use crate::{FormError, Result};
use lopdf::{Document, ObjectId};

// ── PdfValidator ──────────────────────────────────────────────────────────────
//
// This is an internal type.  Callers use FormFiller, which delegates here.

pub(crate) struct PdfValidator<'a> {
    document: &'a Document,
}

impl<'a> PdfValidator<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Reject documents filling cannot work with.
    ///
    /// lopdf has already parsed the cross-reference table and object graph;
    /// here we only check that it is not encrypted and has a catalog.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if self.document.trailer.has(b"Encrypt") {
            return Err(FormError::Encrypted);
        }

        self.document
            .catalog()
            .map_err(|e| FormError::InvalidPdf(format!("missing or invalid catalog: {e}")))?;

        Ok(())
    }

    /// The object id of page 1.
    pub(crate) fn first_page(&self) -> Result<ObjectId> {
        self.document
            .get_pages()
            .into_values()
            .next()
            .ok_or_else(|| FormError::InvalidPdf("document has no pages".into()))
    }
}
