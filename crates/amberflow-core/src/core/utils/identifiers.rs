/// Turns a file name into a label usable as a structured identifier.
///
/// `.` and every other character outside `[A-Za-z0-9_]` become `_`. A leading digit
/// is prefixed with `_`, and an empty name maps to `_`.
pub fn format_link_label(file_name: &str) -> String {
    let mut label: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if label.is_empty() {
        return "_".to_string();
    }
    if label.starts_with(|c: char| c.is_ascii_digit()) {
        label.insert(0, '_');
    }
    label
}

pub fn is_valid_link_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
