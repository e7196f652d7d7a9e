#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct AcademicYear {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SubClass {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    pub student_count: i64,
}

/// Row values for a new `students` insert.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub matricule: String,
    pub name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub gender: String,
    pub residence: String,
    pub parent_contact: Option<String>,
    pub phone: String,
    pub first_enrollment_year_id: i64,
}

/// Intermediate representation of one spreadsheet row before DB insert.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStudentRecord {
    pub sequence: i64,
    pub name: String,
    pub status: Option<String>,
    pub total_expected: f64,
    pub total_paid: f64,
    pub debt: f64,
    pub parent_contact: Option<String>,
    pub phone: String,
}
