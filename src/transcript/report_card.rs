use chrono::NaiveDate;

use super::layout::{Align, Block, Column, LayoutDocument, Row, RowKind, Table, TextStyle};
use super::pdf::render_pdf;
use super::RenderError;
use crate::config::SchoolConfig;
use crate::database::models::{Course, UserIdentity};
use crate::grading::{AccumulatedReport, ClassStatistics};

const NO_DATA: &str = "-";

/// Everything printed on a student's report card. Values arrive computed;
/// building the layout only formats them.
#[derive(Debug, Clone)]
pub struct ReportCard {
    pub school: SchoolConfig,
    pub student: UserIdentity,
    pub course: Course,
    pub cycle: i32,
    pub passing_score: f64,
    pub points_per_period: f64,
    pub report: AccumulatedReport,
    pub statistics: ClassStatistics,
    pub generated_on: NaiveDate,
}

/// Whole numbers print bare, fractions with at most two decimals
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let fixed = format!("{:.2}", value);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(format_score).unwrap_or_else(|| NO_DATA.to_string())
}

impl ReportCard {
    pub fn filename(&self) -> String {
        let code = self
            .student
            .student_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.student.id.to_string());
        format!("boleta_{}_{}.pdf", code, self.cycle)
    }

    fn info_lines(&self) -> Vec<(String, String)> {
        let section = if self.course.section.is_empty() { "A" } else { &self.course.section };
        let shift = if self.course.shift.is_empty() { "MATUTINA" } else { &self.course.shift };
        let code = self
            .student
            .student_code
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "N/A".to_string());

        vec![
            ("Nombre".to_string(), self.student.full_name()),
            ("Código".to_string(), code),
            ("Grado".to_string(), format!("{} \"{}\"", self.course.grade_label(), section)),
            ("Jornada".to_string(), shift.to_string()),
            ("Ciclo Escolar".to_string(), self.cycle.to_string()),
        ]
    }

    fn grade_table(&self) -> Table {
        let mut rows = vec![Row::new(
            RowKind::Header,
            ["MATERIA", "B1", "B2", "B3", "B4", "ACUMULADO"],
        )];

        for subject in &self.report.subjects {
            let mut cells = vec![subject.subject.clone()];
            cells.extend(subject.totals.iter().map(|t| cell(*t)));
            cells.push(cell(subject.cumulative));
            rows.push(Row::new(RowKind::Body, cells));
        }

        let mut averages = vec!["PROMEDIOS".to_string()];
        averages.extend(self.statistics.periods.iter().map(|p| {
            p.average.map(|a| a.to_string()).unwrap_or_else(|| NO_DATA.to_string())
        }));
        averages.push(format_score(self.report.overall_cumulative));
        rows.push(Row::new(RowKind::Summary, averages));

        let mut failing = vec!["PERDIDAS".to_string()];
        failing.extend(self.statistics.periods.iter().map(|p| p.failing.to_string()));
        failing.push(String::new());
        rows.push(Row::new(RowKind::Summary, failing));

        let score = |width| Column { width, align: Align::Center };
        Table {
            columns: vec![
                Column { width: 180.0, align: Align::Left },
                score(55.0),
                score(55.0),
                score(55.0),
                score(55.0),
                score(70.0),
            ],
            row_height: 25.0,
            rows,
        }
    }

    pub fn layout(&self) -> LayoutDocument {
        let legend = TextStyle::regular(9.0);
        let mut doc = LayoutDocument::default();

        doc.push(Block::text(self.school.name.to_uppercase(), TextStyle::bold(20.0), Align::Center))
            .push(Block::text(&self.school.subtitle, TextStyle::regular(10.0), Align::Center))
            .push(Block::Spacer(6.0))
            .push(Block::text("BOLETA DE CALIFICACIONES", TextStyle::bold(16.0), Align::Center))
            .push(Block::Spacer(12.0))
            .push(Block::LabeledLines { lines: self.info_lines(), size: 11.0 })
            .push(Block::Spacer(12.0))
            .push(Block::Table(self.grade_table()))
            .push(Block::Spacer(30.0))
            .push(Block::text(
                format!("Nota mínima de aprobación: {} puntos", format_score(self.passing_score)),
                legend,
                Align::Left,
            ))
            .push(Block::text(
                format!(
                    "ACUMULADO = Suma de puntos por bimestre (cada uno vale {} pts, máx 100)",
                    format_score(self.points_per_period)
                ),
                legend,
                Align::Left,
            ))
            .push(Block::text("B1, B2, B3, B4 = Bimestres 1, 2, 3 y 4", legend, Align::Left))
            .push(Block::Signatures(vec!["Coordinación".to_string(), "Director(a)".to_string()]));

        doc.footer = Some(format!(
            "Generado el: {} - Sistema Educativo {}",
            self.generated_on.format("%-d/%-m/%Y"),
            self.school.name
        ));
        doc
    }

    pub fn render(&self) -> Result<Vec<u8>, RenderError> {
        render_pdf(&self.layout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{ClassStatistics, PeriodStatistics, SubjectAccumulation};
    use crate::types::{EducationStage, Period, Role};
    use uuid::Uuid;

    fn card(subjects: Vec<SubjectAccumulation>) -> ReportCard {
        let periods = Period::ALL.map(|period| PeriodStatistics {
            period,
            average: if period.number() == 1 { Some(60) } else { None },
            failing: if period.number() == 1 { 1 } else { 0 },
        });
        ReportCard {
            school: SchoolConfig::default(),
            student: UserIdentity {
                id: Uuid::new_v4(),
                name: "Ana".to_string(),
                surname: "López".to_string(),
                role: Role::Student,
                student_code: Some("EST-001".to_string()),
                active: true,
            },
            course: Course {
                id: Uuid::new_v4(),
                stage: EducationStage::Basico,
                grade_level: "primero_basico".to_string(),
                section: String::new(),
                shift: String::new(),
                cycle: 2024,
                active: true,
            },
            cycle: 2024,
            passing_score: 60.0,
            points_per_period: 25.0,
            report: AccumulatedReport { subjects, overall_cumulative: 37.5 },
            statistics: ClassStatistics { periods },
            generated_on: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        }
    }

    fn subject(name: &str, totals: [Option<f64>; 4], cumulative: Option<f64>) -> SubjectAccumulation {
        SubjectAccumulation {
            subject_id: Uuid::new_v4(),
            subject: name.to_string(),
            totals,
            cumulative,
            passed: cumulative.map(|c| c >= 60.0),
        }
    }

    #[test]
    fn scores_print_without_trailing_zeros() {
        assert_eq!(format_score(80.0), "80");
        assert_eq!(format_score(37.5), "37.5");
        assert_eq!(format_score(80.25), "80.25");
    }

    #[test]
    fn grid_rows_follow_the_report() {
        let card = card(vec![
            subject("Matemáticas", [Some(80.0), Some(70.0), None, None], Some(37.5)),
            subject("Artes", [None; 4], None),
        ]);
        let layout = card.layout();
        let table = layout.tables().next().unwrap();

        assert_eq!(table.rows[0].cells, ["MATERIA", "B1", "B2", "B3", "B4", "ACUMULADO"]);
        assert_eq!(table.rows[1].cells, ["Matemáticas", "80", "70", "-", "-", "37.5"]);
        assert_eq!(table.rows[2].cells, ["Artes", "-", "-", "-", "-", "-"]);
        assert_eq!(table.rows[3].cells, ["PROMEDIOS", "60", "-", "-", "-", "37.5"]);
        assert_eq!(table.rows[4].cells, ["PERDIDAS", "1", "0", "0", "0", ""]);
    }

    #[test]
    fn identity_block_uses_defaults_and_formatted_grade() {
        let card = card(vec![]);
        let layout = card.layout();
        let lines = layout
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::LabeledLines { lines, .. } => Some(lines.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(lines[0].1, "Ana López");
        assert_eq!(lines[1].1, "EST-001");
        assert_eq!(lines[2].1, "Primero Basico \"A\"");
        assert_eq!(lines[3].1, "MATUTINA");
        assert_eq!(layout.footer.as_deref(), Some("Generado el: 5/3/2024 - Sistema Educativo Mi Casita"));
        assert!(matches!(&layout.blocks[0], Block::Text { text, .. } if text == "MI CASITA"));
        assert_eq!(card.filename(), "boleta_EST-001_2024.pdf");
    }

    #[test]
    fn renders_a_loadable_pdf() {
        let card = card(vec![subject("Física", [Some(90.0), None, None, None], Some(22.5))]);
        let bytes = card.render().unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
