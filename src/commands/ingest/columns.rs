use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::values::Cell;

const FIELD_COUNT: usize = 7;

static HEADER_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("header separator pattern is valid"));

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CanonicalField {
    RegNo,
    SeatNo,
    Room,
    CourseCode,
    CourseTitle,
    Session,
    Date,
}

impl CanonicalField {
    pub const ALL: [Self; FIELD_COUNT] = [
        Self::RegNo,
        Self::SeatNo,
        Self::Room,
        Self::CourseCode,
        Self::CourseTitle,
        Self::Session,
        Self::Date,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RegNo => "reg_no",
            Self::SeatNo => "seat_no",
            Self::Room => "room",
            Self::CourseCode => "course_code",
            Self::CourseTitle => "course_title",
            Self::Session => "session",
            Self::Date => "date",
        }
    }

    // Priority order; the first alias is always the field's own name.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::RegNo => &[
                "reg_no",
                "regno",
                "registration_no",
                "registration number",
                "reg no",
                "register no",
            ],
            Self::SeatNo => &["seat_no", "seatno", "seat number", "seat no"],
            Self::Room => &["room", "hall", "room_no", "room no", "hall no"],
            Self::CourseCode => &["course_code", "coursecode", "course code", "subject code"],
            Self::CourseTitle => &[
                "course_title",
                "coursetitle",
                "course title",
                "subject",
                "subject name",
            ],
            Self::Session => &["session", "exam session", "exam_session"],
            Self::Date => &["date", "exam_date", "exam date"],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RegNo => "Registration Number",
            Self::SeatNo => "Seat Number",
            Self::Room => "Room/Hall",
            Self::CourseCode => "Course Code",
            Self::CourseTitle => "Course Title",
            Self::Session => "Session",
            Self::Date => "Exam Date",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Self::Date)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn normalize_header(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    HEADER_SEPARATORS.replace_all(&lowered, "_").into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub field: CanonicalField,
    pub column: usize,
    pub header: String,
}

impl ColumnBinding {
    pub fn is_rename(&self) -> bool {
        normalize_header(&self.header) != self.field.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub bindings: Vec<ColumnBinding>,
    pub missing: Vec<CanonicalField>,
}

impl Reconciliation {
    pub fn renames(&self) -> impl Iterator<Item = &ColumnBinding> {
        self.bindings.iter().filter(|binding| binding.is_rename())
    }

    pub fn missing_required(&self) -> Vec<CanonicalField> {
        self.missing
            .iter()
            .copied()
            .filter(|field| field.is_required())
            .collect()
    }

    pub fn into_mapping(self) -> Result<ColumnMapping, MissingColumns> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(MissingColumns { missing });
        }

        let mut columns = [None; FIELD_COUNT];
        for binding in &self.bindings {
            columns[binding.field.index()] = Some(binding.column);
        }
        Ok(ColumnMapping { columns })
    }
}

pub fn reconcile<S: AsRef<str>>(headers: &[S]) -> Reconciliation {
    let normalized: Vec<String> = headers
        .iter()
        .map(|header| normalize_header(header.as_ref()))
        .collect();

    let mut bindings = Vec::new();
    let mut missing = Vec::new();

    for field in CanonicalField::ALL {
        let found = field.aliases().iter().find_map(|alias| {
            let key = normalize_header(alias);
            normalized.iter().position(|candidate| *candidate == key)
        });

        match found {
            Some(column) => bindings.push(ColumnBinding {
                field,
                column,
                header: headers[column].as_ref().to_string(),
            }),
            None => missing.push(field),
        }
    }

    Reconciliation { bindings, missing }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: [Option<usize>; FIELD_COUNT],
}

impl ColumnMapping {
    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns[field.index()]
    }

    pub fn cell<'a>(&self, row: &'a [Option<Cell>], field: CanonicalField) -> Option<&'a Cell> {
        self.column(field)
            .and_then(|column| row.get(column))
            .and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns {
    pub missing: Vec<CanonicalField>,
}

impl fmt::Display for MissingColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = self
            .missing
            .iter()
            .map(|field| field.name())
            .collect::<Vec<_>>()
            .join(", ");
        let expected = CanonicalField::ALL
            .iter()
            .filter(|field| field.is_required())
            .map(|field| field.description())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Missing required columns: {missing}. Expected columns are: {expected}"
        )
    }
}

impl std::error::Error for MissingColumns {}
