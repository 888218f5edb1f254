// src/grading/scoring.rs
//
// Pure scoring functions. They take values and return scores; persistence is
// the caller's problem.

use std::collections::HashSet;

/// Proportional credit for a code question: (passed / total) * points.
/// A question with zero test cases is ungraded and scores 0, not full credit.
pub fn code_question_score(passed_tests: usize, total_tests: usize, points: i64) -> f64 {
    if total_tests == 0 {
        return 0.0;
    }
    (passed_tests as f64 / total_tests as f64) * points as f64
}

/// All-or-nothing credit for a multiple-choice question: full points iff the
/// selected option-id set equals the correct set exactly. Supersets and
/// subsets score 0.
pub fn multiple_choice_score(
    selected: &HashSet<i64>,
    correct: &HashSet<i64>,
    points: i64,
) -> f64 {
    if !correct.is_empty() && selected == correct {
        points as f64
    } else {
        0.0
    }
}

/// Full points iff the single selected option is the one flagged correct.
/// No selection scores 0.
pub fn true_false_score(selected: Option<i64>, correct_option_id: i64, points: i64) -> f64 {
    match selected {
        Some(id) if id == correct_option_id => points as f64,
        _ => 0.0,
    }
}
