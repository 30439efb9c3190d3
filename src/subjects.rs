use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubjectInfo {
    pub name: &'static str,
    pub category: &'static str,
}

const fn subject(name: &'static str, category: &'static str) -> SubjectInfo {
    SubjectInfo { name, category }
}

/// Subjects offered by the desktop UI. Advisory: the store accepts any name.
pub const CATALOG: &[SubjectInfo] = &[
    subject("Mathematics", "Core"),
    subject("English Language", "Core"),
    subject("Kiswahili", "Core"),
    subject("Science", "Sciences"),
    subject("Biology", "Sciences"),
    subject("Chemistry", "Sciences"),
    subject("Physics", "Sciences"),
    subject("History", "Humanities"),
    subject("Geography", "Humanities"),
    subject("Religious Education", "Humanities"),
    subject("French", "Languages"),
    subject("German", "Languages"),
    subject("Spanish", "Languages"),
    subject("Arabic", "Languages"),
    subject("Chinese", "Languages"),
    subject("Latin", "Languages"),
    subject("Literature", "Arts & Culture"),
    subject("Music", "Arts & Culture"),
    subject("Drama", "Arts & Culture"),
    subject("Fine Art", "Arts & Culture"),
    subject("Dance", "Arts & Culture"),
    subject("Social Studies", "Social Sciences"),
    subject("Civic Education", "Social Sciences"),
    subject("Life Skills", "Life Skills"),
    subject("Home Science", "Life Skills"),
    subject("Personal Development", "Life Skills"),
    subject("Business Studies", "Business"),
    subject("Accounting", "Business"),
    subject("Agriculture", "Technical"),
    subject("Woodwork", "Technical"),
    subject("Metalwork", "Technical"),
    subject("Building & Construction", "Technical"),
    subject("Electrical Technology", "Technical"),
    subject("Computer Studies", "Technical"),
    subject("Physical Education", "PE & Health"),
    subject("Health Education", "PE & Health"),
    subject("Nutrition", "PE & Health"),
    subject("Sports Science", "PE & Health"),
];

pub fn lookup(name: &str) -> Option<&'static SubjectInfo> {
    let name = name.trim();
    CATALOG.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

pub fn category_of(name: &str) -> Option<&'static str> {
    lookup(name).map(|s| s.category)
}
