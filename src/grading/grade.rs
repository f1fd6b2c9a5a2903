use crate::grading::types::LetterGrade;

/// Converts a final score (0–100) into a letter grade.
///
/// | Range  | Grade |
/// |--------|-------|
/// | >= 80  | A     |
/// | >= 70  | B     |
/// | >= 60  | C     |
/// | >= 50  | D     |
/// | < 50   | F     |
///
/// The raw score is compared without rounding.
pub fn letter_grade(score: f64) -> LetterGrade {
    match score {
        s if s >= 80.0 => LetterGrade::A,
        s if s >= 70.0 => LetterGrade::B,
        s if s >= 60.0 => LetterGrade::C,
        s if s >= 50.0 => LetterGrade::D,
        _ => LetterGrade::F,
    }
}
