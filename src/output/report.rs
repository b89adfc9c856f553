//! Notification text for newly found courses
//!
//! The layout targets Telegram's legacy Markdown mode: `*bold*` labels and
//! `[text](url)` links.

use crate::model::CourseRecord;

/// Opening line of every report
pub const REPORT_HEADER: &str = "¡Hay cursos nuevos!";

/// Renders the new courses as one message
///
/// Returns `None` for an empty slice: nothing new means nothing to send.
/// Courses are numbered from 1 in the given order. Empty fields are rendered
/// as empty values.
///
/// # Example
///
/// ```
/// use course_watch::model::CourseRecord;
/// use course_watch::output::format_report;
///
/// assert!(format_report(&[]).is_none());
///
/// let course = CourseRecord::new("https://example.com/c/1", "Poda");
/// let report = format_report(&[course]).unwrap();
/// assert!(report.starts_with("¡Hay cursos nuevos!\n\n*Curso 1:*\nTítulo: Poda\n"));
/// ```
pub fn format_report(courses: &[CourseRecord]) -> Option<String> {
    if courses.is_empty() {
        return None;
    }

    let mut report = format!("{}\n\n", REPORT_HEADER);
    for (index, course) in courses.iter().enumerate() {
        report.push_str(&format!(
            "*Curso {}:*\nTítulo: {}\nLugar: {}\nPeríodo: {}\nHorario: {}\nPlazas: {}\nCosto: {}\n[Ver más]({})\n\n",
            index + 1,
            course.title,
            course.location,
            course.period,
            course.schedule,
            course.available_slots,
            course.cost,
            course.address,
        ));
    }

    Some(report)
}
