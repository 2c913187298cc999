//! Caption assembly from the upload form's text fields.
//!
//! The form carries seven free-text fields mapped to fixed labels. Each
//! populated field becomes one watermark line `"<label> <value><postfix>"`;
//! the seventh, blank-labelled field is always included even when empty.

/// Fixed labels for the seven form fields, in order.
const LABELS: [&str; 7] = [
    "Latitude:",
    "Longitude:",
    "Elevation:",
    "Accuracy:",
    "Time:",
    "Note:",
    "",
];

/// Per-field postfixes. The elevation entry is the literal mis-encoded
/// "Â±5 m" carried over from the deployed form (UTF-8 bytes of "±" read
/// back as Latin-1); preserved deliberately, do not "fix" silently.
const POSTFIXES: [&str; 7] = ["", "", "\u{c2}\u{b1}5 m", "", "", "", ""];

/// The seven raw form field values, in form order.
#[derive(Debug, Clone, Default)]
pub struct Caption {
    /// Values of `text1` through `text7`; `None` and `Some("")` are
    /// equivalent (both count as unpopulated).
    pub fields: [Option<String>; 7],
}

impl Caption {
    /// Build from already-extracted field values.
    #[must_use]
    pub fn new(fields: [Option<String>; 7]) -> Self {
        Self { fields }
    }

    /// Assemble the watermark lines.
    ///
    /// Fields 1-6 contribute a line only when non-empty; field 7 always
    /// contributes one, so the result is never empty.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(7);
        for (i, field) in self.fields.iter().enumerate() {
            let value = field.as_deref().unwrap_or("");
            let last = i == 6;
            if !value.is_empty() || last {
                lines.push(format!("{} {}{}", LABELS[i], value, POSTFIXES[i]));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(values: [&str; 7]) -> Caption {
        Caption::new(values.map(|v| (!v.is_empty()).then(|| v.to_string())))
    }

    #[test]
    fn populated_fields_become_labelled_lines() {
        let c = caption(["12.34", "56.78", "", "", "", "", ""]);
        assert_eq!(
            c.lines(),
            vec![
                "Latitude: 12.34".to_string(),
                "Longitude: 56.78".to_string(),
                " ".to_string(),
            ]
        );
    }

    #[test]
    fn last_field_is_always_included() {
        let c = Caption::default();
        assert_eq!(c.lines(), vec![" ".to_string()]);
    }

    #[test]
    fn elevation_carries_the_misencoded_postfix() {
        let c = caption(["", "", "120", "", "", "", ""]);
        let lines = c.lines();
        assert_eq!(lines[0], "Elevation: 120\u{c2}\u{b1}5 m");
        // The first byte really is the stray 0xC2 code point, not "±5 m".
        assert!(lines[0].contains('\u{c2}'));
    }

    #[test]
    fn all_fields_populated_yields_seven_lines() {
        let c = caption(["1", "2", "3", "4", "12:00", "note text", "extra"]);
        let lines = c.lines();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[4], "Time: 12:00");
        assert_eq!(lines[5], "Note: note text");
        assert_eq!(lines[6], " extra");
    }

    #[test]
    fn none_and_empty_are_equivalent() {
        let explicit = Caption::new([
            Some(String::new()),
            None,
            Some(String::new()),
            None,
            None,
            Some(String::new()),
            None,
        ]);
        assert_eq!(explicit.lines(), Caption::default().lines());
    }
}
