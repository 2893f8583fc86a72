/// What a (translated) sheet column means for grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    FirstName,
    Surname,
    StudentId,
    Assignment,
    Quiz,
    /// Bookkeeping or excluded columns; dropped from the dataset entirely.
    Ignored,
}

/// Injectable, per-course classification of column names.
///
/// Exclusion is by case-insensitive substring; an excluded column is removed
/// from consideration, not merely zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnClassifier {
    pub assignment_prefix: String,
    pub quiz_prefix: String,
    pub ignore_assignment_words: Vec<String>,
    pub ignore_quiz_words: Vec<String>,
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self {
            assignment_prefix: "Assignment:".to_string(),
            quiz_prefix: "Quiz:".to_string(),
            ignore_assignment_words: Vec::new(),
            // Placeholder quizzes used to pre-create the course layout.
            ignore_quiz_words: vec!["Dummy".to_string()],
        }
    }
}

impl ColumnClassifier {
    pub fn classify(&self, name: &str) -> ColumnRole {
        match name {
            "First name" => return ColumnRole::FirstName,
            "Surname" => return ColumnRole::Surname,
            "ID number" => return ColumnRole::StudentId,
            _ => {}
        }
        if name.starts_with(&self.assignment_prefix) {
            if contains_any(name, &self.ignore_assignment_words) {
                return ColumnRole::Ignored;
            }
            return ColumnRole::Assignment;
        }
        if name.starts_with(&self.quiz_prefix) {
            if contains_any(name, &self.ignore_quiz_words) {
                return ColumnRole::Ignored;
            }
            return ColumnRole::Quiz;
        }
        ColumnRole::Ignored
    }
}

fn contains_any(name: &str, words: &[String]) -> bool {
    let lower = name.to_lowercase();
    words.iter().any(|word| lower.contains(&word.to_lowercase()))
}
