//! Course field extraction from detail pages
//!
//! Detail pages render one labelled row per field:
//!
//! ```text
//! div.container.page-body
//!   span.convocatoria-titulo          -> title
//!   div.row
//!     label                           -> row label
//!     div.col-xs-6.col-sm-8.col-md-10
//!       span                          -> row value
//! ```

use crate::model::CourseRecord;
use scraper::{ElementRef, Html, Selector};

const CONTAINER_SELECTOR: &str = "div.container.page-body";
const TITLE_SELECTOR: &str = "span.convocatoria-titulo";
const ROW_SELECTOR: &str = "div.row";
const LABEL_SELECTOR: &str = "label";
const VALUE_SELECTOR: &str = "div.col-xs-6.col-sm-8.col-md-10 span";

/// The course field a labelled row fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CourseField {
    Location,
    Period,
    Schedule,
    AvailableSlots,
    Cost,
}

impl CourseField {
    /// Matches a trimmed row label, exactly, against the known labels
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "Lugar de impartición:" => Some(Self::Location),
            "Período de impartición:" => Some(Self::Period),
            "Horario de impartición:" => Some(Self::Schedule),
            "Plazas disponibles:" => Some(Self::AvailableSlots),
            "Importe:" => Some(Self::Cost),
            _ => None,
        }
    }

    fn slot<'a>(&self, course: &'a mut CourseRecord) -> &'a mut String {
        match self {
            Self::Location => &mut course.location,
            Self::Period => &mut course.period,
            Self::Schedule => &mut course.schedule,
            Self::AvailableSlots => &mut course.available_slots,
            Self::Cost => &mut course.cost,
        }
    }
}

/// Extracts a course record from a fetched page
///
/// Returns `None` when the page is not a course page: no page container, or
/// an empty title. Rows with unknown labels are ignored; a later row with a
/// known label overwrites an earlier one.
///
/// Only the first page container is read; any further containers on the
/// same page are ignored, so one page yields at most one course.
///
/// # Example
///
/// ```
/// use course_watch::crawler::extract_course;
/// use scraper::Html;
///
/// let html = r#"
///     <div class="container page-body">
///       <span class="convocatoria-titulo"> Poda del olivo </span>
///       <div class="row">
///         <label>Importe:</label>
///         <div class="col-xs-6 col-sm-8 col-md-10"><span>Gratuito</span></div>
///       </div>
///     </div>"#;
/// let doc = Html::parse_document(html);
///
/// let course = extract_course(&doc, "https://example.com/c/1").unwrap();
/// assert_eq!(course.title, "Poda del olivo");
/// assert_eq!(course.cost, "Gratuito");
/// assert_eq!(course.location, "");
/// ```
pub fn extract_course(document: &Html, address: &str) -> Option<CourseRecord> {
    let container_selector = Selector::parse(CONTAINER_SELECTOR).ok()?;
    let title_selector = Selector::parse(TITLE_SELECTOR).ok()?;
    let row_selector = Selector::parse(ROW_SELECTOR).ok()?;
    let label_selector = Selector::parse(LABEL_SELECTOR).ok()?;
    let value_selector = Selector::parse(VALUE_SELECTOR).ok()?;

    let container = document.select(&container_selector).next()?;

    let title = child_text(container, &title_selector);
    if title.is_empty() {
        return None;
    }

    let mut course = CourseRecord::new(address, title);

    for row in container.select(&row_selector) {
        let label = child_text(row, &label_selector);
        if let Some(field) = CourseField::from_label(&label) {
            *field.slot(&mut course) = child_text(row, &value_selector);
        }
    }

    Some(course)
}

/// Concatenated text of every descendant matching `selector`, trimmed
fn child_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .flat_map(|child| child.text())
        .collect::<String>()
        .trim()
        .to_string()
}
