//! CSV report of the full roster.

use crate::model::Employee;

pub const EXPORT_FILE_NAME: &str = "employee_report.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: [&str; 6] = ["ID", "Name", "Email", "Department", "Skills", "Certified"];

/// One line per record after the header. Text columns are wrapped in double
/// quotes as-is; `id` and `certified` are bare. No trailing newline.
pub fn export_csv(records: &[Employee]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(HEADER.join(","));
    lines.extend(records.iter().map(row));
    lines.join("\n")
}

/// Byte stream handed to the download surface.
pub fn export_table(records: &[Employee]) -> Vec<u8> {
    export_csv(records).into_bytes()
}

fn row(employee: &Employee) -> String {
    format!(
        "{},\"{}\",\"{}\",\"{}\",\"{}\",{}",
        employee.id,
        employee.name,
        employee.email,
        employee.department,
        employee.skills.join("; "),
        employee.certified
    )
}
