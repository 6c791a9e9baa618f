use serde::{Deserialize, Serialize};

pub type EmployeeId = i64;

/// Departments offered by the employee forms.
pub const DEPARTMENTS: &[&str] = &["Engineering", "HR", "Marketing", "Sales"];

/// Skills offered as checkboxes. Records may still carry others.
pub const SKILLS: &[&str] = &["HTML", "CSS", "JavaScript", "Python", "SQL"];

/// One roster entry, in its persisted shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub skills: Vec<String>,
    pub certified: bool,
}

impl Employee {
    pub fn from_fields(id: EmployeeId, fields: EmployeeFields) -> Self {
        let EmployeeFields {
            name,
            email,
            department,
            skills,
            certified,
        } = fields;
        Self {
            id,
            name,
            email,
            department,
            skills,
            certified,
        }
    }

    /// Replace every mutable field; `id` is kept.
    pub fn apply(&mut self, fields: EmployeeFields) {
        self.name = fields.name;
        self.email = fields.email;
        self.department = fields.department;
        self.skills = fields.skills;
        self.certified = fields.certified;
    }
}

/// Raw form values as submitted, before trimming or validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDraft {
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certified: bool,
}

impl EmployeeDraft {
    /// Raw value of a named form field, used by per-field validation.
    pub fn field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "department" => Some(&self.department),
            _ => None,
        }
    }
}

impl From<&Employee> for EmployeeDraft {
    fn from(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            email: employee.email.clone(),
            department: employee.department.clone(),
            skills: employee.skills.clone(),
            certified: employee.certified,
        }
    }
}

/// Validated, trimmed values ready to be written into a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeFields {
    pub name: String,
    pub email: String,
    pub department: String,
    pub skills: Vec<String>,
    pub certified: bool,
}

impl EmployeeFields {
    /// Trims text fields and drops blank or repeated skills, keeping the
    /// first occurrence of each. Does not validate.
    pub fn normalized(draft: &EmployeeDraft) -> Self {
        let mut skills: Vec<String> = Vec::with_capacity(draft.skills.len());
        for skill in &draft.skills {
            let skill = skill.trim();
            if !skill.is_empty() && !skills.iter().any(|s| s == skill) {
                skills.push(skill.to_string());
            }
        }
        Self {
            name: draft.name.trim().to_string(),
            email: draft.email.trim().to_string(),
            department: draft.department.trim().to_string(),
            skills,
            certified: draft.certified,
        }
    }
}

fn seed(
    id: EmployeeId,
    name: &str,
    email: &str,
    department: &str,
    skills: &[&str],
    certified: bool,
) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        email: email.to_string(),
        department: department.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        certified,
    }
}

/// Records installed when storage holds nothing yet.
pub fn seed_employees() -> Vec<Employee> {
    vec![
        seed(1, "Aisha Khan", "aisha@technova.com", "HR", &["HTML", "CSS"], true),
        seed(
            2,
            "Bob Smith",
            "bob@technova.com",
            "Engineering",
            &["JavaScript", "Python", "SQL"],
            false,
        ),
        seed(
            3,
            "Charlie Jain",
            "charlie@technova.com",
            "Sales",
            &["CSS", "JavaScript"],
            true,
        ),
    ]
}
