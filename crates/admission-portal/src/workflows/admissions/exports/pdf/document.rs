use super::encode::PdfEncoder;
use super::fonts::{encode_win_ansi, text_width, Font};
use super::layout::{Color, DocumentLayout, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
use super::RenderError;
use crate::workflows::admissions::applications::domain::{
    ApplicationRecord, NewApplication, Participation, SubjectGrades,
};
use crate::workflows::admissions::exports::Institution;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN * 2.0;
const SMALL_LINE: f32 = 16.0;
const LINE: f32 = 20.0;
const HEADER_BAND: f32 = 24.0;
const COL1_X: f32 = MARGIN + 5.0;
const COL2_X: f32 = MARGIN + CONTENT_WIDTH / 2.0 + 5.0;
const INDICATOR_RADIUS: f32 = 3.0;
const BONUS_BREAK_BELOW: f32 = 350.0;
const CO_CURRICULAR_BREAK_BELOW: f32 = 200.0;
const SIGNATURE_Y: f32 = 90.0;
const FOOTER_Y: f32 = 40.0;
const TALLY_COLUMN: f32 = 150.0;
const DATE_FORMAT: &str = "%d/%m/%Y";

/// The print view of one application.
pub struct ApplicationDocument;

impl ApplicationDocument {
    pub fn render(
        record: &ApplicationRecord,
        institution: &Institution,
    ) -> Result<DocumentLayout, RenderError> {
        let application = &record.application;
        if application.applicant.applicant_name.trim().is_empty() {
            return Err(RenderError::IncompleteRecord {
                field: "applicant_name",
            });
        }
        if application.register_number().as_str().trim().is_empty() {
            return Err(RenderError::IncompleteRecord {
                field: "register_number",
            });
        }

        let mut canvas = Canvas::new();
        canvas.heading(record, institution);
        canvas.personal(application);
        canvas.address(application);
        canvas.academic(application);
        canvas.preferences(application);
        canvas.grades(&application.academic.subject_grades);

        if canvas.y < BONUS_BREAK_BELOW {
            canvas.new_page();
        }
        canvas.bonus_and_eligibility(application);
        canvas.participation("Sports Participation", &application.sports_participation);
        canvas.participation(
            "Kalolsavam Participation",
            &application.kalolsavam_participation,
        );

        if canvas.y < CO_CURRICULAR_BREAK_BELOW {
            canvas.new_page();
        }
        canvas.co_curricular(application);
        canvas.closing(record);

        let layout = canvas.layout;
        for text in layout.texts() {
            encode_win_ansi(text).map_err(|character| RenderError::UnsupportedText {
                character,
                text: text.to_string(),
            })?;
        }
        Ok(layout)
    }

    pub fn pdf(record: &ApplicationRecord, institution: &Institution) -> Result<Vec<u8>, RenderError> {
        let layout = Self::render(record, institution)?;
        PdfEncoder.encode(&layout)
    }
}

/// Field values as printed: control whitespace flattened, blanks as `-`.
fn printable(value: &str) -> String {
    let flattened: String = value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    let trimmed = flattened.trim();
    if trimmed.is_empty() {
        "-".to_string()
    } else {
        trimmed.to_string()
    }
}

struct Canvas {
    layout: DocumentLayout,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            layout: DocumentLayout::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.layout.add_page();
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn centered(&mut self, text: &str, size: f32) {
        self.layout.centered_text(text, self.y, size, Font::Bold);
        self.y -= LINE;
    }

    fn section(&mut self, title: &str) {
        self.layout.rect(
            MARGIN,
            self.y - HEADER_BAND + LINE,
            CONTENT_WIDTH,
            HEADER_BAND,
            Some(Color::LIGHT_GREY),
            Some((Color::DARK_GREY, 0.5)),
        );
        self.layout
            .text(title, MARGIN + 5.0, self.y + 5.0, 10.0, Font::Bold);
        self.y -= HEADER_BAND;
    }

    fn field(&mut self, label: &str, value: &str, x: f32, bold: bool) {
        self.layout.text(label, x, self.y, 9.0, Font::Bold);
        let font = if bold { Font::Bold } else { Font::Regular };
        self.layout
            .text(printable(value), x, self.y - SMALL_LINE, 9.0, font);
    }

    fn indicator(&mut self, checked: bool, label: &str, x: f32) {
        let fill = if checked {
            Color::GREEN
        } else {
            Color::LIGHT_GREY
        };
        self.layout.circle(
            x + INDICATOR_RADIUS,
            self.y - SMALL_LINE / 2.0,
            INDICATOR_RADIUS,
            fill,
            Some((Color::BLACK, 0.5)),
        );
        self.layout.text(
            label,
            x + INDICATOR_RADIUS * 2.0 + 4.0,
            self.y - SMALL_LINE / 2.0 - 4.0,
            8.0,
            Font::Regular,
        );
    }

    fn heading(&mut self, record: &ApplicationRecord, institution: &Institution) {
        self.centered(&printable(&institution.name), 14.0);
        self.centered(&printable(&institution.title), 12.0);
        self.layout.text(
            format!(
                "Submission Date: {}",
                record.created_at.format(DATE_FORMAT)
            ),
            PAGE_WIDTH - MARGIN - 150.0,
            self.y - 5.0,
            8.0,
            Font::Regular,
        );
        self.y -= 20.0;
    }

    fn personal(&mut self, application: &NewApplication) {
        let applicant = &application.applicant;
        let payment = &application.payment;
        self.section("Personal Information");

        self.field("Name:", &applicant.applicant_name, COL1_X, true);
        self.field("Mother's Name:", &applicant.mother_name, COL2_X, false);
        self.y -= LINE * 2.0;

        self.field("Gender:", applicant.gender.label(), COL1_X, false);
        self.field("Father's Name:", &applicant.father_name, COL2_X, false);
        self.y -= LINE * 2.0;

        let born = applicant.date_of_birth.format(DATE_FORMAT).to_string();
        self.field("Date of Birth:", &born, COL1_X, false);
        self.field("Mobile:", &applicant.mobile_number, COL2_X, false);
        self.y -= LINE * 2.0;

        self.field("Religion:", &applicant.religion, COL1_X, false);
        self.field("WhatsApp:", &applicant.whatsapp_number, COL2_X, false);
        self.y -= LINE * 2.0;

        self.field(
            "Single Window No:",
            &payment.single_window_appln_no,
            COL1_X,
            false,
        );
        self.field("Fee Paid:", &payment.fee_paid.to_string(), COL2_X, false);
        self.y -= LINE * 2.5;
    }

    fn address(&mut self, application: &NewApplication) {
        let address = &application.address;
        let quarter = CONTENT_WIDTH / 4.0;
        self.section("Address Information");

        self.field("House:", &address.house_name, COL1_X, false);
        self.field("Post Office:", &address.post_office, COL1_X + quarter, false);
        self.field(
            "Panchayath:",
            &address.panchayath_municipality,
            COL1_X + quarter * 2.0,
            false,
        );
        self.y -= LINE * 2.0;

        let paid_on = application
            .payment
            .payment_date
            .format(DATE_FORMAT)
            .to_string();
        self.field("Address:", &address.permanent_address, COL1_X, false);
        self.field("Taluk:", &address.taluk, COL2_X, false);
        self.field("Payment Date:", &paid_on, COL2_X + quarter, false);
        self.y -= LINE * 2.5;
    }

    fn academic(&mut self, application: &NewApplication) {
        let academic = &application.academic;
        let third = CONTENT_WIDTH / 3.0;
        self.section("Academic Information");

        self.field("Qualifying Exam:", &academic.qualifying_exam, COL1_X, false);
        self.field(
            "Register Number:",
            academic.register_number.as_str(),
            COL1_X + third,
            true,
        );
        self.y -= LINE * 2.0;

        self.field(
            "Exam Type:",
            academic.subject_grades.exam_type().label(),
            COL1_X,
            false,
        );
        self.field("School Name:", &academic.school_name, COL1_X + third, false);
        self.y -= LINE * 2.0;

        self.field("Exam Year:", &academic.exam_year.to_string(), COL1_X, false);
        self.y -= LINE * 2.5;
    }

    fn preferences(&mut self, application: &NewApplication) {
        self.section("Course Preferences");
        self.y += 15.0;

        let mut preferences: Vec<_> = application.course_preferences.iter().collect();
        preferences.sort_by_key(|preference| preference.preference);
        if preferences.is_empty() {
            self.y -= SMALL_LINE;
        }
        for (index, preference) in preferences.into_iter().enumerate() {
            self.layout.text(
                format!("{}. {}", index + 1, printable(&preference.display())),
                COL1_X,
                self.y - SMALL_LINE,
                9.0,
                Font::Regular,
            );
            self.y -= SMALL_LINE + 5.0;
        }
        self.y -= 20.0;
    }

    fn grade_row(&mut self, cells: &[(&str, String)]) {
        let column = CONTENT_WIDTH / 5.0;
        for (index, (label, _)) in cells.iter().enumerate() {
            self.layout
                .text(*label, COL1_X + column * index as f32, self.y, 9.0, Font::Bold);
        }
        self.y -= SMALL_LINE;
        for (index, (_, value)) in cells.iter().enumerate() {
            self.layout.text(
                printable(value),
                COL1_X + column * index as f32,
                self.y,
                9.0,
                Font::Regular,
            );
        }
    }

    fn grades(&mut self, grades: &SubjectGrades) {
        self.section("Academic Grades");
        match grades {
            SubjectGrades::Sslc(sslc) => {
                let cells: Vec<(&str, String)> = sslc
                    .subjects()
                    .iter()
                    .map(|(_, label, grade)| (*label, grade.to_string()))
                    .collect();
                let (first, second) = cells.split_at(5);
                self.grade_row(first);
                self.y -= LINE;
                self.grade_row(second);
            }
            SubjectGrades::Cbse(marks) => {
                let cells: Vec<(&str, String)> = marks
                    .subjects()
                    .iter()
                    .map(|(_, label, mark)| (*label, mark.to_string()))
                    .collect();
                self.grade_row(&cells);
            }
        }
        self.y -= LINE + 10.0;
    }

    fn bonus_and_eligibility(&mut self, application: &NewApplication) {
        let bonus = &application.bonus_points;
        let eligibility = &application.eligibility;
        self.section("Bonus Points & Eligibility");

        self.layout
            .text("NCC & Eligibility", COL1_X, self.y, 9.0, Font::Bold);
        self.indicator(bonus.ncc_type.ncc, "NCC", COL1_X);
        self.indicator(
            bonus.ncc_type.student_police_cadet,
            "Student Police Cadet",
            COL1_X + 100.0,
        );
        self.y -= SMALL_LINE + 5.0;

        self.indicator(bonus.ncc_type.scouts_guides, "Scouts & Guides", COL1_X);
        self.indicator(eligibility.little_kites, "Little Kites", COL1_X + 100.0);
        self.y -= SMALL_LINE + 5.0;

        self.indicator(eligibility.jrc, "JRC", COL1_X);
        self.indicator(eligibility.nss, "NSS", COL1_X + 100.0);
        self.y -= LINE + 5.0;

        self.y -= SMALL_LINE + 5.0;
        self.layout
            .text("Other Status", COL1_X, self.y, 9.0, Font::Bold);
        self.indicator(
            bonus.dependent_jawans_killed,
            "Dependent of Jawans killed in action",
            COL1_X,
        );
        self.y -= SMALL_LINE + 3.0;
        self.indicator(
            bonus.dependent_jawans_service,
            "Dependent of Jawans in Service",
            COL1_X,
        );
        self.y -= SMALL_LINE + 3.0;

        let answer = if application.national_state_test {
            "Yes"
        } else {
            "No"
        };
        self.layout.text(
            format!(
                "Whether qualified in the National/State Level Test for the National Talent Search Examination: {answer}"
            ),
            COL1_X,
            self.y - SMALL_LINE / 2.0 - 4.0,
            8.0,
            Font::Regular,
        );
        self.y -= SMALL_LINE + 6.0;

        self.layout.text(
            format!("Clubs: {}", eligibility.clubs_count),
            COL1_X,
            self.y,
            9.0,
            Font::Regular,
        );
        self.y -= LINE + 10.0;
    }

    fn tally(&mut self, label: &str, count: u32) {
        self.layout
            .text(label, COL1_X + 10.0, self.y, 8.0, Font::Regular);
        self.layout.text(
            count.to_string(),
            COL1_X + TALLY_COLUMN,
            self.y,
            8.0,
            Font::Regular,
        );
        self.y -= SMALL_LINE;
    }

    fn participation(&mut self, title: &str, participation: &Participation) {
        let district = participation.district_level;
        self.layout.text(title, COL1_X, self.y, 9.0, Font::Bold);
        self.y -= SMALL_LINE;

        self.layout.text("Level", COL1_X, self.y, 8.0, Font::Bold);
        self.layout
            .text("Total", COL1_X + TALLY_COLUMN, self.y, 8.0, Font::Bold);
        self.y -= SMALL_LINE;

        self.tally("State Level", participation.state_level);
        self.layout
            .text("District Level", COL1_X, self.y, 8.0, Font::Bold);
        self.y -= SMALL_LINE;
        self.tally("A Grade", district.a_grade);
        self.tally("B Grade", district.b_grade);
        self.tally("C Grade", district.c_grade);
        self.tally("Participation", district.participation);

        // The last tally already stepped one small line.
        self.y += SMALL_LINE;
        self.y -= LINE + 10.0;
    }

    fn co_curricular_header(&mut self, grade_column: f32) {
        self.layout.text("Activity", COL1_X, self.y, 9.0, Font::Bold);
        for (index, grade) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            self.layout.text(
                format!("{grade} Grade"),
                COL1_X + TALLY_COLUMN + grade_column * index as f32,
                self.y,
                9.0,
                Font::Bold,
            );
        }
        self.y -= LINE;
    }

    fn co_curricular(&mut self, application: &NewApplication) {
        let grade_column = (CONTENT_WIDTH - TALLY_COLUMN) / 5.0;
        self.section("Co-curricular Activities");
        self.y += 10.0;
        self.co_curricular_header(grade_column);

        for (activity, grades) in application.co_curricular_activities.activities() {
            if self.y < MARGIN + LINE {
                self.new_page();
                self.co_curricular_header(grade_column);
            }

            self.layout
                .text(activity, COL1_X, self.y, 8.0, Font::Regular);
            for (index, (_, count)) in grades.tallies().iter().enumerate() {
                let text = count.to_string();
                let width = text_width(Font::Regular, &text, 8.0);
                let column_x = COL1_X + TALLY_COLUMN + grade_column * index as f32;
                self.layout.text(
                    text,
                    column_x + (grade_column - width) / 2.0,
                    self.y,
                    8.0,
                    Font::Regular,
                );
            }
            self.y -= LINE;
        }
        self.y -= LINE;
    }

    fn closing(&mut self, record: &ApplicationRecord) {
        self.layout.line(
            (PAGE_WIDTH - MARGIN - 150.0, SIGNATURE_Y),
            (PAGE_WIDTH - MARGIN, SIGNATURE_Y),
            1.0,
            Color::BLACK,
        );
        self.layout.text(
            "Signature of Applicant",
            PAGE_WIDTH - MARGIN - 120.0,
            SIGNATURE_Y - 15.0,
            8.0,
            Font::Regular,
        );
        self.layout.colored_text(
            format!("Application ID: {}", record.id),
            MARGIN,
            FOOTER_Y,
            7.0,
            Font::Regular,
            Color::DARK_GREY,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::admissions::applications::tests::common::{
        cbse_submission, record, sslc_submission,
    };
    use crate::workflows::admissions::exports::pdf::DrawOp;

    fn institution() -> Institution {
        Institution::new("EMEAHSS, KONDOTTY", "APPLICATION FOR PLUS ONE ADMISSION")
    }

    #[test]
    fn sslc_document_prints_the_ten_subject_table_only() {
        let layout =
            ApplicationDocument::render(&record(sslc_submission()), &institution()).expect("renders");
        let texts: Vec<_> = layout.texts().collect();

        assert!(texts.contains(&"Language II"));
        assert!(texts.contains(&"IT"));
        assert!(!texts.contains(&"Science"));
        assert!(texts.contains(&"SK2025A01"));
        assert!(texts.contains(&"Signature of Applicant"));
    }

    #[test]
    fn cbse_document_prints_the_five_mark_table_only() {
        let layout =
            ApplicationDocument::render(&record(cbse_submission()), &institution()).expect("renders");
        let texts: Vec<_> = layout.texts().collect();

        assert!(texts.contains(&"Science"));
        assert!(texts.contains(&"95"));
        assert!(!texts.contains(&"Hindi"));
        assert!(!texts.contains(&"Language II"));
    }

    #[test]
    fn indicators_are_green_only_when_set() {
        let mut record = record(sslc_submission());
        record.application.eligibility.nss = true;
        let layout = ApplicationDocument::render(&record, &institution()).expect("renders");

        let circles: Vec<_> = layout
            .pages()
            .iter()
            .flat_map(|page| page.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Circle { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(circles.len(), 8);
        assert_eq!(circles.iter().filter(|fill| **fill == Color::GREEN).count(), 1);
    }

    #[test]
    fn long_documents_break_onto_new_pages() {
        let layout =
            ApplicationDocument::render(&record(sslc_submission()), &institution()).expect("renders");
        assert!(layout.pages().len() >= 2);
        let last = layout.pages().last().expect("last page");
        assert!(last.texts().any(|text| text.starts_with("Application ID: ")));
    }

    #[test]
    fn incomplete_or_unprintable_records_fail() {
        let mut blank_name = record(sslc_submission());
        blank_name.application.applicant.applicant_name = "  ".to_string();
        assert_eq!(
            ApplicationDocument::render(&blank_name, &institution()).expect_err("blank name"),
            RenderError::IncompleteRecord {
                field: "applicant_name"
            }
        );

        let mut malayalam = record(sslc_submission());
        malayalam.application.applicant.mother_name = "സൈനബ".to_string();
        assert!(matches!(
            ApplicationDocument::render(&malayalam, &institution()),
            Err(RenderError::UnsupportedText { .. })
        ));
    }

    #[test]
    fn pdf_bytes_carry_the_header() {
        let bytes =
            ApplicationDocument::pdf(&record(cbse_submission()), &institution()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-1.4"));
    }
}
