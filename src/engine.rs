// src/engine.rs
//
// Quiz progression controller: starting and resuming attempts, picking the
// current question, grading answers, enforcing the wall-clock deadline and
// finalizing scores. All state lives in the store; the deadline is checked
// lazily on access, there is no background timer.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::executor::{CodeExecutor, ExecError, ExecutionOutcome};
use crate::grading::judge::{TestVerdict, judge};
use crate::grading::scoring;
use crate::models::question::{Question, QuestionType};
use crate::models::submission::{ChoiceAnswerRequest, Submission};
use crate::models::view::{
    AnswerOutcome, PriorAnswer, QuestionResult, QuestionSummary, QuestionView, RemainingTime,
    ResultsView, StartQuiz, TakeQuiz,
};
use crate::store;
use crate::utils::time::format_remaining;

#[derive(Clone)]
pub struct QuizEngine {
    pool: SqlitePool,
    executor: Arc<dyn CodeExecutor>,
}

impl QuizEngine {
    pub fn new(pool: SqlitePool, executor: Arc<dyn CodeExecutor>) -> Self {
        Self { pool, executor }
    }

    /// Starts a quiz attempt. Idempotent: an in-progress submission is
    /// resumed, a completed one is reported, and only otherwise is a new row
    /// created.
    pub async fn start_quiz(&self, user_id: i64, quiz_id: i64) -> Result<StartQuiz, AppError> {
        let quiz = store::quizzes::fetch_quiz(&self.pool, quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        if !quiz.is_active {
            return Err(AppError::QuizInactive);
        }

        if let Some(existing) =
            store::submissions::find_incomplete(&self.pool, user_id, quiz_id).await?
        {
            return Ok(StartQuiz::Resumed {
                submission_id: existing.id,
            });
        }

        if let Some(completed) =
            store::submissions::find_completed(&self.pool, user_id, quiz_id).await?
        {
            return Ok(StartQuiz::AlreadyCompleted {
                submission_id: completed.id,
            });
        }

        let submission_id =
            store::submissions::insert_submission(&self.pool, user_id, quiz_id, Utc::now())
                .await?;
        tracing::info!(user_id, quiz_id, submission_id, "quiz attempt started");

        Ok(StartQuiz::Started { submission_id })
    }

    /// The current-question view for an attempt. Checks the deadline first
    /// and auto-submits when it has passed. The current question is the
    /// first unanswered one in order (or the first question once everything
    /// is answered, so the student can review); a caller-named question
    /// overrides this, and one outside the quiz is `NotFound`.
    pub async fn question_view(
        &self,
        user_id: i64,
        quiz_id: i64,
        submission_id: i64,
        explicit_question_id: Option<i64>,
    ) -> Result<TakeQuiz, AppError> {
        let submission = self.load_owned_submission(user_id, submission_id).await?;
        if submission.quiz_id != quiz_id {
            return Err(AppError::NotFound("Submission not found".to_string()));
        }
        let quiz = store::quizzes::fetch_quiz(&self.pool, quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        if submission.is_completed {
            return Ok(TakeQuiz::Completed {
                submission,
                auto_submitted: false,
            });
        }

        let remaining = remaining_seconds(&quiz, &submission);
        if remaining <= 0 {
            let finalized = self.finalize_internal(&submission).await?;
            tracing::info!(submission_id, "time limit elapsed, auto-submitted");
            return Ok(TakeQuiz::Completed {
                submission: finalized,
                auto_submitted: true,
            });
        }

        let questions = store::questions::list_questions(&self.pool, quiz_id).await?;
        if questions.is_empty() {
            return Err(AppError::NotFound(
                "This quiz has no questions yet".to_string(),
            ));
        }
        let answered = self.answered_question_ids(submission_id).await?;

        let mut current = questions
            .iter()
            .find(|q| !answered.contains(&q.id))
            .unwrap_or(&questions[0]);

        if let Some(requested) = explicit_question_id {
            current = questions
                .iter()
                .find(|q| q.id == requested)
                .ok_or_else(|| {
                    AppError::NotFound("Question not found in this quiz".to_string())
                })?;
        }
        let current = current.clone();

        let summaries = summarize(&questions, &answered);
        let question_submission =
            store::submissions::fetch_question_submission(&self.pool, submission_id, current.id)
                .await?;

        let options = match current.question_type {
            QuestionType::Code => vec![],
            _ => store::questions::list_options(&self.pool, current.id)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        };

        let (prior_answer, test_results) = match &question_submission {
            None => (None, vec![]),
            Some(qs) => match current.question_type {
                QuestionType::Code => {
                    let results =
                        store::submissions::list_visible_test_results(&self.pool, qs.id).await?;
                    (
                        Some(PriorAnswer::Code {
                            code: qs.code.clone(),
                            language: qs.language.clone(),
                        }),
                        results,
                    )
                }
                _ => {
                    let selected =
                        store::submissions::list_selected_option_ids(&self.pool, qs.id).await?;
                    (
                        Some(PriorAnswer::Choice {
                            selected_option_ids: selected,
                        }),
                        vec![],
                    )
                }
            },
        };

        Ok(TakeQuiz::InProgress(QuestionView {
            quiz_id,
            quiz_title: quiz.title,
            submission_id,
            time_remaining_seconds: remaining,
            formatted_time: format_remaining(remaining),
            questions: summaries,
            current,
            options,
            prior_answer,
            test_results,
        }))
    }

    /// Saves a code answer: runs every test case through the execution
    /// client, judges the outcomes, then writes the answer, its test results
    /// and the recomputed question score in one transaction. Client failures
    /// never abort grading; they become failing verdicts for their test case.
    pub async fn submit_code_answer(
        &self,
        user_id: i64,
        submission_id: i64,
        question_id: i64,
        code: &str,
        language: &str,
    ) -> Result<AnswerOutcome, AppError> {
        let (submission, question) = match self
            .begin_answer(user_id, submission_id, question_id)
            .await?
        {
            BeginAnswer::Open(s, q) => (s, q),
            BeginAnswer::TimedOut(submission) => {
                return Ok(AnswerOutcome::TimedOut { submission });
            }
        };

        if question.question_type != QuestionType::Code {
            return Err(AppError::BadRequest(
                "This question does not take a code answer".to_string(),
            ));
        }

        let test_cases = store::questions::list_test_cases(&self.pool, question_id).await?;
        let mut verdicts: Vec<(i64, TestVerdict)> = Vec::with_capacity(test_cases.len());
        for test_case in &test_cases {
            let stdin = test_case.input_data.as_deref().unwrap_or("");
            let result = self.executor.execute(language, code, stdin).await;
            if let Err(err) = &result {
                tracing::warn!(
                    question_id,
                    test_case_id = test_case.id,
                    error = %err,
                    "execution failed, recording failing verdict"
                );
            }
            verdicts.push((test_case.id, judge(result, &test_case.expected_output)));
        }

        let passed = verdicts.iter().filter(|(_, v)| v.passed).count();
        let score = scoring::code_question_score(passed, verdicts.len(), question.points);

        let mut tx = self.pool.begin().await?;
        let qs_id = store::submissions::upsert_question_submission(
            &mut *tx,
            submission_id,
            question_id,
            Some(code),
            Some(language),
            Utc::now(),
        )
        .await?;
        for (test_case_id, verdict) in &verdicts {
            store::submissions::upsert_test_result(&mut *tx, qs_id, *test_case_id, verdict)
                .await?;
        }
        store::submissions::update_question_score(&mut *tx, qs_id, score).await?;
        tx.commit().await?;

        self.answer_saved(&submission, question_id, score).await
    }

    /// Saves a choice answer (multiple-choice option sets or a true/false
    /// answer), replacing any previous selection, and recomputes the
    /// question score in the same transaction.
    pub async fn submit_choice_answer(
        &self,
        user_id: i64,
        submission_id: i64,
        question_id: i64,
        answer: &ChoiceAnswerRequest,
    ) -> Result<AnswerOutcome, AppError> {
        let (submission, question) = match self
            .begin_answer(user_id, submission_id, question_id)
            .await?
        {
            BeginAnswer::Open(s, q) => (s, q),
            BeginAnswer::TimedOut(submission) => {
                return Ok(AnswerOutcome::TimedOut { submission });
            }
        };

        let options = store::questions::list_options(&self.pool, question_id).await?;

        let (selected_ids, score) = match question.question_type {
            QuestionType::Code => {
                return Err(AppError::BadRequest(
                    "This question takes a code answer".to_string(),
                ));
            }
            QuestionType::MultipleChoice => {
                let selected = answer.selected_option_ids.clone().ok_or_else(|| {
                    AppError::BadRequest("selected_option_ids is required".to_string())
                })?;
                let known: HashSet<i64> = options.iter().map(|o| o.id).collect();
                if selected.iter().any(|id| !known.contains(id)) {
                    return Err(AppError::BadRequest(
                        "Selected option does not belong to this question".to_string(),
                    ));
                }
                let selected_set: HashSet<i64> = selected.iter().copied().collect();
                let correct: HashSet<i64> = options
                    .iter()
                    .filter(|o| o.is_correct)
                    .map(|o| o.id)
                    .collect();
                let score =
                    scoring::multiple_choice_score(&selected_set, &correct, question.points);
                (selected, score)
            }
            QuestionType::TrueFalse => {
                let choice = answer
                    .answer
                    .ok_or_else(|| AppError::BadRequest("answer is required".to_string()))?;
                let wanted_text = if choice { "True" } else { "False" };
                let selected_option = options
                    .iter()
                    .find(|o| o.text == wanted_text)
                    .ok_or_else(|| {
                        AppError::InternalServerError(format!(
                            "true/false question {question_id} has no '{wanted_text}' option"
                        ))
                    })?;
                let score = options
                    .iter()
                    .find(|o| o.is_correct)
                    .map(|correct| {
                        scoring::true_false_score(
                            Some(selected_option.id),
                            correct.id,
                            question.points,
                        )
                    })
                    .unwrap_or(0.0);
                (vec![selected_option.id], score)
            }
        };

        let mut tx = self.pool.begin().await?;
        let qs_id = store::submissions::upsert_question_submission(
            &mut *tx,
            submission_id,
            question_id,
            None,
            None,
            Utc::now(),
        )
        .await?;
        store::submissions::delete_selected_options(&mut *tx, qs_id).await?;
        for option_id in &selected_ids {
            store::submissions::insert_selected_option(&mut *tx, qs_id, *option_id).await?;
        }
        store::submissions::update_question_score(&mut *tx, qs_id, score).await?;
        tx.commit().await?;

        self.answer_saved(&submission, question_id, score).await
    }

    /// Explicit submit. Idempotent: finalizing a completed submission is a
    /// no-op that returns the stored result unchanged.
    pub async fn finalize_submission(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<Submission, AppError> {
        let submission = self.load_owned_submission(user_id, submission_id).await?;
        if submission.is_completed {
            return Ok(submission);
        }
        let finalized = self.finalize_internal(&submission).await?;
        tracing::info!(submission_id, score = finalized.score, "quiz submitted");
        Ok(finalized)
    }

    /// Seconds left on the clock; 0 once completed. Read-only: the forced
    /// transition on expiry happens on the next quiz access, not here.
    pub async fn remaining_time(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<RemainingTime, AppError> {
        let submission = self.load_owned_submission(user_id, submission_id).await?;
        if submission.is_completed {
            return Ok(RemainingTime {
                seconds: 0,
                formatted: format_remaining(0),
            });
        }
        let quiz = store::quizzes::fetch_quiz(&self.pool, submission.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
        let seconds = remaining_seconds(&quiz, &submission);
        Ok(RemainingTime {
            seconds,
            formatted: format_remaining(seconds),
        })
    }

    /// Per-question review of an attempt: saved answers, visible test
    /// results and the options of choice questions.
    pub async fn submission_results(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<ResultsView, AppError> {
        let submission = self.load_owned_submission(user_id, submission_id).await?;
        let quiz = store::quizzes::fetch_quiz(&self.pool, submission.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
        let questions = store::questions::list_questions(&self.pool, quiz.id).await?;

        let mut blocks = Vec::with_capacity(questions.len());
        for question in questions {
            let question_submission =
                store::submissions::fetch_question_submission(&self.pool, submission_id, question.id)
                    .await?;

            let options = match question.question_type {
                QuestionType::Code => vec![],
                _ => store::questions::list_options(&self.pool, question.id)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            };

            let block = match question_submission {
                None => QuestionResult {
                    question,
                    score: None,
                    answered: false,
                    prior_answer: None,
                    test_results: vec![],
                    options,
                },
                Some(qs) => {
                    let (prior_answer, test_results) = match question.question_type {
                        QuestionType::Code => (
                            PriorAnswer::Code {
                                code: qs.code.clone(),
                                language: qs.language.clone(),
                            },
                            store::submissions::list_visible_test_results(&self.pool, qs.id)
                                .await?,
                        ),
                        _ => (
                            PriorAnswer::Choice {
                                selected_option_ids: store::submissions::list_selected_option_ids(
                                    &self.pool, qs.id,
                                )
                                .await?,
                            },
                            vec![],
                        ),
                    };
                    QuestionResult {
                        question,
                        score: Some(qs.score),
                        answered: true,
                        prior_answer: Some(prior_answer),
                        test_results,
                        options,
                    }
                }
            };
            blocks.push(block);
        }

        Ok(ResultsView {
            submission,
            quiz_title: quiz.title,
            questions: blocks,
        })
    }

    /// Ad-hoc execution for the editor's "run" button; no grading involved.
    pub async fn run_code(
        &self,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecutionOutcome, ExecError> {
        self.executor.execute(language, code, stdin).await
    }

    pub fn executor(&self) -> &Arc<dyn CodeExecutor> {
        &self.executor
    }

    // ---- internals ----

    async fn load_owned_submission(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<Submission, AppError> {
        let submission = store::submissions::fetch_submission(&self.pool, submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
        if submission.user_id != user_id {
            return Err(AppError::Forbidden(
                "This submission belongs to another user".to_string(),
            ));
        }
        Ok(submission)
    }

    /// Shared preamble of both answer paths: ownership, completion and
    /// deadline checks, then the target question (which must belong to the
    /// submission's quiz).
    async fn begin_answer(
        &self,
        user_id: i64,
        submission_id: i64,
        question_id: i64,
    ) -> Result<BeginAnswer, AppError> {
        let submission = self.load_owned_submission(user_id, submission_id).await?;
        if submission.is_completed {
            return Err(AppError::AlreadyCompleted { submission_id });
        }
        let quiz = store::quizzes::fetch_quiz(&self.pool, submission.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        if remaining_seconds(&quiz, &submission) <= 0 {
            let finalized = self.finalize_internal(&submission).await?;
            tracing::info!(submission_id, "time limit elapsed, auto-submitted");
            return Ok(BeginAnswer::TimedOut(finalized));
        }

        let question = store::questions::fetch_question(&self.pool, question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        if question.quiz_id != submission.quiz_id {
            return Err(AppError::BadRequest(
                "Question does not belong to this quiz".to_string(),
            ));
        }

        Ok(BeginAnswer::Open(submission, question))
    }

    /// Post-save navigation: is everything answered, and if not, which is
    /// the next unanswered question? Scans the full ordered list, so gaps
    /// left before the current question are still found.
    async fn answer_saved(
        &self,
        submission: &Submission,
        question_id: i64,
        score: f64,
    ) -> Result<AnswerOutcome, AppError> {
        let questions = store::questions::list_questions(&self.pool, submission.quiz_id).await?;
        let answered = self.answered_question_ids(submission.id).await?;

        let next_question_id = questions
            .iter()
            .find(|q| !answered.contains(&q.id))
            .map(|q| q.id);

        Ok(AnswerOutcome::Saved {
            question_id,
            question_score: score,
            all_answered: next_question_id.is_none(),
            next_question_id,
        })
    }

    async fn answered_question_ids(&self, submission_id: i64) -> Result<HashSet<i64>, AppError> {
        Ok(
            store::submissions::list_question_submissions(&self.pool, submission_id)
                .await?
                .into_iter()
                .map(|qs| qs.question_id)
                .collect(),
        )
    }

    /// Computes the aggregate score and writes it together with
    /// total_points in a single guarded UPDATE. total_points is summed over
    /// the quiz's *current* questions, so point-value edits made after the
    /// attempt started move the denominator.
    async fn finalize_internal(&self, submission: &Submission) -> Result<Submission, AppError> {
        let mut tx = self.pool.begin().await?;
        let score = store::submissions::sum_question_scores(&mut *tx, submission.id).await?;
        let total_points =
            store::questions::quiz_total_points(&mut *tx, submission.quiz_id).await?;
        store::submissions::finalize(&mut *tx, submission.id, Utc::now(), score, total_points)
            .await?;
        tx.commit().await?;

        store::submissions::fetch_submission(&self.pool, submission.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }
}

enum BeginAnswer {
    Open(Submission, Question),
    TimedOut(Submission),
}

fn remaining_seconds(quiz: &crate::models::quiz::Quiz, submission: &Submission) -> i64 {
    let limit = quiz.time_limit * 60;
    let elapsed = (Utc::now() - submission.started_at).num_seconds();
    (limit - elapsed).max(0)
}

fn summarize(questions: &[Question], answered: &HashSet<i64>) -> Vec<QuestionSummary> {
    questions
        .iter()
        .map(|q| QuestionSummary {
            id: q.id,
            title: q.title.clone(),
            points: q.points,
            position: q.position,
            answered: answered.contains(&q.id),
        })
        .collect()
}
