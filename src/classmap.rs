use std::collections::BTreeMap;

/// Sheet-name token → (class, class-section).
const BUILTIN: &[(&str, &str, &str)] = &[
    ("1N", "FORM 1", "FORM 1 N"),
    ("1S", "FORM 1", "FORM 1 S"),
    ("2N", "FORM 2", "FORM 2 N"),
    ("2S", "FORM 2", "FORM 2 S"),
    ("3N", "FORM 3", "FORM 3 N"),
    ("3S", "FORM 3", "FORM 3 S"),
    ("4N", "FORM 4", "FORM 4 N"),
    ("4S", "FORM 4", "FORM 4 S"),
    ("5N", "FORM 5", "FORM 5 N"),
    ("5S", "FORM 5", "FORM 5 S"),
    ("L6A", "LOWER SIXTH", "LOWER SIXTH A"),
    ("L6S", "LOWER SIXTH", "LOWER SIXTH S"),
    ("U6A", "UPPER SIXTH", "UPPER SIXTH A"),
    ("U6S", "UPPER SIXTH", "UPPER SIXTH S"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTarget {
    pub sheet: String,
    pub class_name: String,
    pub section: String,
}

/// Ordered lookup from spreadsheet sheet names to canonical class-sections.
#[derive(Debug, Clone)]
pub struct ClassMap {
    entries: Vec<ClassTarget>,
}

impl Default for ClassMap {
    fn default() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(sheet, class_name, section)| ClassTarget {
                    sheet: sheet.to_string(),
                    class_name: class_name.to_string(),
                    section: section.to_string(),
                })
                .collect(),
        }
    }
}

impl ClassMap {
    /// Built-in table with `overrides` (token → section) replacing or
    /// extending it. The class name of an added section is the section
    /// minus its last word.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        for (sheet, section) in overrides {
            let target = ClassTarget {
                sheet: sheet.clone(),
                class_name: class_of_section(section),
                section: section.clone(),
            };
            match map.entries.iter_mut().find(|e| &e.sheet == sheet) {
                Some(existing) => *existing = target,
                None => map.entries.push(target),
            }
        }
        map
    }

    pub fn lookup(&self, sheet: &str) -> Option<&ClassTarget> {
        self.entries.iter().find(|e| e.sheet == sheet)
    }

    pub fn entries(&self) -> &[ClassTarget] {
        &self.entries
    }
}

fn class_of_section(section: &str) -> String {
    let trimmed = section.trim();
    match trimmed.rsplit_once(' ') {
        Some((class, _)) => class.trim().to_string(),
        None => trimmed.to_string(),
    }
}
