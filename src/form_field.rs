// ── FieldKind ────────────────────────────────────────────────────────────────

/// Field flag (`/Ff`) bit marking a button field as a radio group.
pub(crate) const FLAG_RADIO: i64 = 1 << 15;

/// Field flag (`/Ff`) bit marking a button field as a push button.
pub(crate) const FLAG_PUSH_BUTTON: i64 = 1 << 16;

/// The type of an interactive form field, from its (inherited) `/FT` and
/// `/Ff` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `/FT /Tx`
    Text,
    /// `/FT /Ch`: list or combo box.
    Choice,
    /// `/FT /Btn` without the radio or push-button flags.
    Checkbox,
    /// `/FT /Btn` with the radio flag.
    Radio,
    /// `/FT /Btn` with the push-button flag. Carries no value.
    PushButton,
    /// `/FT /Sig`
    Signature,
    /// No or unrecognised `/FT`.
    Unknown,
}

impl FieldKind {
    pub(crate) fn from_parts(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => FieldKind::Text,
            Some(b"Ch") => FieldKind::Choice,
            Some(b"Sig") => FieldKind::Signature,
            Some(b"Btn") if flags & FLAG_PUSH_BUTTON != 0 => FieldKind::PushButton,
            Some(b"Btn") if flags & FLAG_RADIO != 0 => FieldKind::Radio,
            Some(b"Btn") => FieldKind::Checkbox,
            _ => FieldKind::Unknown,
        }
    }

    /// Returns `true` for the kinds filling assigns values to. Fields without
    /// a recognised `/FT` take the value as text.
    pub fn is_fillable(&self) -> bool {
        !matches!(self, FieldKind::PushButton | FieldKind::Signature)
    }

    /// Returns `true` for checkboxes and radio groups, whose value is an
    /// appearance state name rather than text.
    pub fn is_button(&self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

// ── FormField ────────────────────────────────────────────────────────────────

/// A terminal field of a document's interactive form.
///
/// Returned by [`crate::FormFiller::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Fully qualified name: the partial names (`/T`) from the root of the
    /// field tree down to this field, joined by `.`. This is the key to use in
    /// a value mapping.
    pub name: String,

    /// The field type.
    pub kind: FieldKind,

    /// The current value (`/V`), decoded. Button states are reported by name
    /// (e.g. `"Off"`), multi-selection choices joined with `", "`.
    pub value: Option<String>,
}

impl FormField {
    /// The last component of the fully qualified name.
    ///
    /// ```
    /// # use pdf_autofill::{FieldKind, FormField};
    /// let field = FormField { name: "Address.Street".into(), kind: FieldKind::Text, value: None };
    /// assert_eq!(field.partial_name(), "Street");
    /// ```
    pub fn partial_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_flags_pick_kind() {
        assert_eq!(FieldKind::from_parts(Some(b"Btn"), 0), FieldKind::Checkbox);
        assert_eq!(FieldKind::from_parts(Some(b"Btn"), FLAG_RADIO), FieldKind::Radio);
        assert_eq!(
            FieldKind::from_parts(Some(b"Btn"), FLAG_PUSH_BUTTON | FLAG_RADIO),
            FieldKind::PushButton
        );
    }

    #[test]
    fn untyped_field_is_filled_as_text() {
        let kind = FieldKind::from_parts(None, 0);
        assert_eq!(kind, FieldKind::Unknown);
        assert!(kind.is_fillable());
        assert!(!kind.is_button());
        assert!(FieldKind::Choice.is_fillable());
        assert!(!FieldKind::Signature.is_fillable());
        assert!(!FieldKind::PushButton.is_fillable());
        assert!(FieldKind::Radio.is_button());
    }
}
