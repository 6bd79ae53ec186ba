//! Transient quiz session. Nothing here is persisted; the ledger only
//! sees the final `complete_quiz` call once a session has finished.

use serde::{Deserialize, Serialize};

use crate::catalog::QuizQuestion;
use crate::LedgerError;

/// What a call to [`QuizSession::advance`] did. `Ignored` covers both
/// "no answer selected yet" and "session already finished".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Ignored,
    Advanced,
    Finished,
}

/// A strict forward-only walk over an ordered question list. States are
/// `in-progress(i)` for each question index plus `finished`; the only
/// transition is `advance` and there is no backward navigation or skip.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current: usize,
    selected: Option<usize>,
    correct: usize,
    finished: bool,
    answers: Vec<usize>,
}

impl QuizSession {
    /// Starts a session over the given questions.
    ///
    /// # Errors
    /// Returns [`LedgerError::Validation`] for an empty question list.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, LedgerError> {
        if questions.is_empty() {
            return Err(LedgerError::Validation(
                "quiz session requires at least one question".to_string(),
            ));
        }

        Ok(Self {
            questions,
            current: 0,
            selected: None,
            correct: 0,
            finished: false,
            answers: Vec::new(),
        })
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Records the tentative choice for the current question without
    /// advancing.
    ///
    /// # Errors
    /// Returns [`LedgerError::Validation`] when the session has finished
    /// or the index is outside the question's options.
    pub fn select_answer(&mut self, index: usize) -> Result<(), LedgerError> {
        if self.finished {
            return Err(LedgerError::Validation(
                "quiz session is already finished".to_string(),
            ));
        }

        let options = self.questions[self.current].options.len();
        if index >= options {
            return Err(LedgerError::Validation(format!(
                "answer index {index} out of range for {options} options"
            )));
        }

        self.selected = Some(index);
        Ok(())
    }

    /// Commits the selected answer and moves forward. Without a selection
    /// (or once finished) this is a no-op.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.finished {
            return AdvanceOutcome::Ignored;
        }

        let Some(selected) = self.selected else {
            return AdvanceOutcome::Ignored;
        };

        self.answers.push(selected);
        if selected == self.questions[self.current].correct_index {
            self.correct += 1;
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            AdvanceOutcome::Advanced
        } else {
            self.finished = true;
            AdvanceOutcome::Finished
        }
    }

    /// Score as a rounded percentage. Rounding happens before the reward
    /// bucket lookup in [`Self::xp_earned`].
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn score_percent(&self) -> u64 {
        (self.correct as f64 / self.questions.len() as f64 * 100.0).round() as u64
    }

    /// The coarse reward curve: fixed breakpoints, not a continuous
    /// formula.
    #[must_use]
    pub fn xp_earned(&self) -> u64 {
        xp_for_score(self.score_percent())
    }

    /// Returns the session to its initial state.
    pub fn reset(&mut self) {
        self.current = 0;
        self.selected = None;
        self.correct = 0;
        self.finished = false;
        self.answers.clear();
    }
}

/// Breakpoint table mapping a rounded score percentage to an XP reward.
#[must_use]
pub fn xp_for_score(score_percent: u64) -> u64 {
    if score_percent >= 90 {
        100
    } else if score_percent >= 80 {
        80
    } else if score_percent >= 70 {
        60
    } else if score_percent >= 60 {
        40
    } else {
        20
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{quiz_questions, QuizQuestion};

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    fn fixture_questions(count: usize) -> Vec<QuizQuestion> {
        quiz_questions().iter().take(count).cloned().collect()
    }

    #[test]
    fn empty_question_list_is_rejected() {
        assert!(QuizSession::new(Vec::new()).is_err());
    }

    #[test]
    fn advance_without_selection_is_a_no_op() {
        let mut session = must_ok(QuizSession::new(fixture_questions(3)));
        assert_eq!(session.advance(), AdvanceOutcome::Ignored);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn selection_commits_only_on_advance() {
        let mut session = must_ok(QuizSession::new(fixture_questions(2)));
        let correct = session.current_question().correct_index;
        must_ok(session.select_answer(correct));
        assert_eq!(session.correct_count(), 0);

        assert_eq!(session.advance(), AdvanceOutcome::Advanced);
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.selected_answer(), None);
    }

    #[test]
    fn last_question_finishes_and_further_advances_are_ignored() {
        let mut session = must_ok(QuizSession::new(fixture_questions(1)));
        must_ok(session.select_answer(0));
        assert_eq!(session.advance(), AdvanceOutcome::Finished);
        assert!(session.is_finished());

        let correct = session.correct_count();
        assert_eq!(session.advance(), AdvanceOutcome::Ignored);
        assert_eq!(session.correct_count(), correct);
        assert!(session.select_answer(0).is_err());
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let mut session = must_ok(QuizSession::new(fixture_questions(1)));
        assert!(session.select_answer(4).is_err());
        must_ok(session.select_answer(3));
    }

    #[test]
    fn reward_breakpoints_are_fixed() {
        assert_eq!(xp_for_score(90), 100);
        assert_eq!(xp_for_score(85), 80);
        assert_eq!(xp_for_score(75), 60);
        assert_eq!(xp_for_score(65), 40);
        assert_eq!(xp_for_score(59), 20);
        assert_eq!(xp_for_score(100), 100);
        assert_eq!(xp_for_score(0), 20);
    }

    #[test]
    fn score_rounds_before_bucketing() {
        // 11 of 12 correct is 91.67%, rounded to 92.
        let mut session = must_ok(QuizSession::new(fixture_questions(12)));
        for index in 0..12 {
            let question = session.current_question().clone();
            let choice = if index == 0 {
                (question.correct_index + 1) % question.options.len()
            } else {
                question.correct_index
            };
            must_ok(session.select_answer(choice));
            session.advance();
        }

        assert!(session.is_finished());
        assert_eq!(session.correct_count(), 11);
        assert_eq!(session.score_percent(), 92);
        assert_eq!(session.xp_earned(), 100);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut session = must_ok(QuizSession::new(fixture_questions(2)));
        must_ok(session.select_answer(1));
        session.advance();
        session.reset();

        assert_eq!(session.current_index(), 0);
        assert_eq!(session.selected_answer(), None);
        assert_eq!(session.correct_count(), 0);
        assert!(!session.is_finished());
        assert!(session.answers().is_empty());
    }
}
