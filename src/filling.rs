use crate::fields::{FieldDiscovery, FieldRef};
use crate::{pdf_utils, FieldKind};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::debug;

/// Values a checkbox accepts as "checked", besides its own on-state name.
const TRUTHY: [&str; 5] = ["true", "yes", "on", "1", "x"];

/// Values a checkbox or radio group accepts as "unchecked".
const FALSY: [&str; 5] = ["false", "no", "off", "0", ""];

const OFF: &[u8] = b"Off";

// ── FillReport ───────────────────────────────────────────────────────────────

/// What filling did with the caller's value mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Fields that received a value, in the order their widgets appear on the
    /// page.
    pub updated: Vec<String>,

    /// Keys of the mapping that matched no field on the page, sorted.
    pub unknown: Vec<String>,

    /// Fields that matched a key but were left unchanged: push buttons,
    /// signatures, and checkboxes or radio groups with no widget showing the
    /// requested state.
    pub skipped: Vec<String>,
}

impl FillReport {
    /// Returns `true` when every key of the mapping matched a field.
    pub fn all_matched(&self) -> bool {
        self.unknown.is_empty()
    }
}

/// A single change to the destination document.
enum Edit {
    /// Set `/V` on a field.
    Value(ObjectId, Object),
    /// Set `/AS` on a button widget.
    State(ObjectId, Vec<u8>),
}

/// One terminal field on the page together with its widgets.
struct PageField {
    field: FieldRef,
    widgets: Vec<ObjectId>,
}

// ── FieldValueWriter ─────────────────────────────────────────────────────────

/// Applies a value mapping to the fields whose widgets sit on one page of a
/// document.
///
/// Appearance streams are not regenerated here; the document's form is
/// expected to carry `NeedAppearances true` so viewers rebuild them.
pub(crate) struct FieldValueWriter<'a> {
    document: &'a mut Document,
}

impl<'a> FieldValueWriter<'a> {
    pub(crate) fn new(document: &'a mut Document) -> Self {
        Self { document }
    }

    /// Assign `values` to the fields on `page_id`. Keys naming no field on the
    /// page are reported in [`FillReport::unknown`] and otherwise ignored.
    pub(crate) fn apply(
        &mut self,
        page_id: ObjectId,
        values: &BTreeMap<String, String>,
    ) -> FillReport {
        let page_fields = self.page_fields(page_id);
        let mut report = FillReport::default();
        let mut edits = Vec::new();

        for page_field in &page_fields {
            let value = match values.get(&page_field.field.name) {
                Some(value) => value,
                None => continue,
            };

            let name = &page_field.field.name;
            let kind = page_field.field.kind;
            let assigned = if !kind.is_fillable() {
                debug!(field = %name, ?kind, "field kind is not fillable, skipped");
                None
            } else if kind.is_button() {
                self.button_edits(page_field, value)
            } else {
                Some(vec![Edit::Value(
                    page_field.field.id,
                    pdf_utils::encode_text_string(value),
                )])
            };

            match assigned {
                Some(field_edits) => {
                    debug!(field = %name, "value assigned");
                    edits.extend(field_edits);
                    report.updated.push(name.clone());
                }
                None => report.skipped.push(name.clone()),
            }
        }

        report.unknown = values
            .keys()
            .filter(|key| !page_fields.iter().any(|f| &f.field.name == *key))
            .cloned()
            .collect();

        for edit in edits {
            self.apply_edit(edit);
        }

        report
    }

    /// Group the page's widgets by the terminal field they belong to.
    fn page_fields(&self, page_id: ObjectId) -> Vec<PageField> {
        let discovery = FieldDiscovery::new(&*self.document);
        let mut grouped: Vec<PageField> = Vec::new();

        for widget in discovery.widgets_on_page(page_id) {
            let field = match discovery.field_of_widget(widget) {
                Some(field) => field,
                None => continue,
            };
            match grouped.iter_mut().find(|g| g.field.id == field.id) {
                Some(group) => group.widgets.push(widget),
                None => grouped.push(PageField {
                    field,
                    widgets: vec![widget],
                }),
            }
        }

        grouped
    }

    /// Pick the appearance state for every widget of a checkbox or radio
    /// group, and the matching `/V`. `None` when the value asks for a state no
    /// widget has; the field is then left as it is.
    fn button_edits(&self, page_field: &PageField, value: &str) -> Option<Vec<Edit>> {
        let requested = value.trim();
        let is_off = FALSY.iter().any(|f| requested.eq_ignore_ascii_case(f));
        let is_on = page_field.field.kind == FieldKind::Checkbox
            && TRUTHY.iter().any(|t| requested.eq_ignore_ascii_case(t));

        let mut edits = Vec::new();
        let mut selected: Option<Vec<u8>> = None;

        for widget in &page_field.widgets {
            let states = self.appearance_states(*widget);
            let state = if is_off {
                None
            } else if states.iter().any(|s| s.as_slice() == requested.as_bytes()) {
                Some(requested.as_bytes().to_vec())
            } else if is_on {
                states.into_iter().find(|s| s.as_slice() != OFF)
            } else {
                None
            };

            match state {
                Some(state) => {
                    edits.push(Edit::State(*widget, state.clone()));
                    selected.get_or_insert(state);
                }
                None => edits.push(Edit::State(*widget, OFF.to_vec())),
            }
        }

        if selected.is_none() && !is_off {
            debug!(field = %page_field.field.name, value, "no widget has this state, skipped");
            return None;
        }

        edits.push(Edit::Value(
            page_field.field.id,
            Object::Name(selected.unwrap_or_else(|| OFF.to_vec())),
        ));
        Some(edits)
    }

    /// Names of the normal appearances (`/AP /N`) a widget can show.
    fn appearance_states(&self, widget: ObjectId) -> Vec<Vec<u8>> {
        let document = &*self.document;
        pdf_utils::dict_by_id(document, widget)
            .and_then(|w| w.get(b"AP").ok())
            .and_then(|ap| pdf_utils::resolve_dict(document, ap))
            .and_then(|ap| ap.get(b"N").ok())
            .and_then(|n| pdf_utils::resolve_dict(document, n))
            .map(|normal| normal.iter().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default()
    }

    fn apply_edit(&mut self, edit: Edit) {
        let (id, key, value) = match edit {
            Edit::Value(id, value) => (id, "V", value),
            Edit::State(id, state) => (id, "AS", Object::Name(state)),
        };

        match self
            .document
            .get_object_mut(id)
            .and_then(|o| o.as_dict_mut())
        {
            Ok(dict) => dict.set(key, value),
            Err(e) => debug!(?id, error = %e, "field object is not a dictionary, skipped"),
        }
    }
}
