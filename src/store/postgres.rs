// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};

use super::{ContentStore, EndedSession, GameStore, StoreResult};
use crate::{
    error::AppError,
    models::{
        answer_option::{AnswerOption, CreateAnswerOptionRequest, UpdateAnswerOptionRequest},
        leaderboard::{Standing, rank_standings},
        participant::Participant,
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        quiz::{Quiz, QuizRequest},
        session::{GameSession, SessionState},
        submission::{NewSubmission, Submission},
    },
};

/// Row shape of 'game_sessions'; the table stores the state as `is_active`.
#[derive(FromRow)]
struct SessionRow {
    id: i64,
    quiz_id: i64,
    join_code: String,
    is_active: bool,
    started_at: chrono::DateTime<chrono::Utc>,
    ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<SessionRow> for GameSession {
    fn from(row: SessionRow) -> Self {
        GameSession {
            id: row.id,
            quiz_id: row.quiz_id,
            join_code: row.join_code,
            state: if row.is_active {
                SessionState::Active
            } else {
                SessionState::Ended
            },
            started_at: row.started_at,
            ended_at: row.ended_at,
        }
    }
}

/// Maps constraint violations onto domain errors; everything else is `Unavailable`.
fn constraint_error(
    err: sqlx::Error,
    on_unique: impl FnOnce() -> AppError,
    on_foreign_key: impl FnOnce() -> AppError,
) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            return on_foreign_key();
        }
    }
    AppError::from(err)
}

/// Locks the session row for the rest of the transaction and checks it is
/// still active. `end_session` takes the same row lock, so the two serialise.
async fn lock_active_session(conn: &mut PgConnection, session_id: i64) -> StoreResult<()> {
    let is_active = sqlx::query_scalar::<_, bool>(
        "SELECT is_active FROM game_sessions WHERE id = $1 FOR SHARE",
    )
    .bind(session_id)
    .fetch_optional(conn)
    .await?;

    match is_active {
        None => Err(AppError::NotFound(format!(
            "Session {} not found",
            session_id
        ))),
        Some(false) => Err(AppError::InvalidState(format!(
            "Session {} has ended",
            session_id
        ))),
        Some(true) => Ok(()),
    }
}

async fn fetch_standings<'e, E: PgExecutor<'e>>(
    executor: E,
    session_id: i64,
) -> Result<Vec<Standing>, sqlx::Error> {
    sqlx::query_as::<_, Standing>(
        r#"
        SELECT
            p.id AS participant_id,
            p.display_name,
            p.joined_at,
            COALESCE(SUM(s.points_earned), 0)::BIGINT AS total_score,
            COUNT(s.id) FILTER (WHERE s.is_correct) AS correct_count
        FROM participants p
        LEFT JOIN submissions s ON s.participant_id = p.id
        WHERE p.session_id = $1
        GROUP BY p.id
        ORDER BY total_score DESC, p.joined_at, p.id
        "#,
    )
    .bind(session_id)
    .fetch_all(executor)
    .await
}

/// PostgreSQL-backed store over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_quizzes(&self) -> StoreResult<Vec<Quiz>> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            "SELECT id, title, category, description, created_at FROM quizzes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    async fn get_quiz(&self, id: i64) -> StoreResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(
            "SELECT id, title, category, description, created_at FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn create_quiz(&self, quiz: &QuizRequest) -> StoreResult<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (title, category, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, category, description, created_at
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.category)
        .bind(&quiz.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn update_quiz(&self, id: i64, quiz: &QuizRequest) -> StoreResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            UPDATE quizzes SET title = $2, category = $3, description = $4
            WHERE id = $1
            RETURNING id, title, category, description, created_at
            "#,
        )
        .bind(id)
        .bind(&quiz.title)
        .bind(&quiz.category)
        .bind(&quiz.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn delete_quiz(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_questions(&self, quiz_id: i64) -> StoreResult<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, time_limit, points, multi_select, created_at
            FROM questions
            WHERE quiz_id = $1
            ORDER BY id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn get_question(&self, id: i64) -> StoreResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, quiz_id, text, time_limit, points, multi_select, created_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn create_question(
        &self,
        quiz_id: i64,
        question: &CreateQuestionRequest,
    ) -> StoreResult<Question> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (quiz_id, text, time_limit, points, multi_select)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, quiz_id, text, time_limit, points, multi_select, created_at
            "#,
        )
        .bind(quiz_id)
        .bind(&question.text)
        .bind(question.time_limit)
        .bind(question.points)
        .bind(question.multi_select)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                || AppError::Conflict("Question already exists".to_string()),
                || AppError::NotFound(format!("Quiz {} not found", quiz_id)),
            )
        })
    }

    async fn update_question(
        &self,
        id: i64,
        changes: &UpdateQuestionRequest,
    ) -> StoreResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions SET
                text = COALESCE($2, text),
                time_limit = COALESCE($3, time_limit),
                points = COALESCE($4, points),
                multi_select = COALESCE($5, multi_select)
            WHERE id = $1
            RETURNING id, quiz_id, text, time_limit, points, multi_select, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.text)
        .bind(changes.time_limit)
        .bind(changes.points)
        .bind(changes.multi_select)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_error(
                    e,
                    || AppError::Conflict(format!("Question {} could not be deleted", id)),
                    || AppError::Conflict(format!("Question {} has recorded submissions", id)),
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_answer_options(&self, question_id: i64) -> StoreResult<Vec<AnswerOption>> {
        let options = sqlx::query_as::<_, AnswerOption>(
            "SELECT id, question_id, text, is_correct FROM answer_options WHERE question_id = $1 ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn get_answer_option(&self, id: i64) -> StoreResult<Option<AnswerOption>> {
        let option = sqlx::query_as::<_, AnswerOption>(
            "SELECT id, question_id, text, is_correct FROM answer_options WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn create_answer_option(
        &self,
        question_id: i64,
        option: &CreateAnswerOptionRequest,
    ) -> StoreResult<AnswerOption> {
        sqlx::query_as::<_, AnswerOption>(
            r#"
            INSERT INTO answer_options (question_id, text, is_correct)
            VALUES ($1, $2, $3)
            RETURNING id, question_id, text, is_correct
            "#,
        )
        .bind(question_id)
        .bind(&option.text)
        .bind(option.is_correct)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                || AppError::Conflict("Answer option already exists".to_string()),
                || AppError::NotFound(format!("Question {} not found", question_id)),
            )
        })
    }

    async fn update_answer_option(
        &self,
        id: i64,
        changes: &UpdateAnswerOptionRequest,
    ) -> StoreResult<Option<AnswerOption>> {
        let option = sqlx::query_as::<_, AnswerOption>(
            r#"
            UPDATE answer_options SET
                text = COALESCE($2, text),
                is_correct = COALESCE($3, is_correct)
            WHERE id = $1
            RETURNING id, question_id, text, is_correct
            "#,
        )
        .bind(id)
        .bind(&changes.text)
        .bind(changes.is_correct)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn delete_answer_option(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM answer_options WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                constraint_error(
                    e,
                    || AppError::Conflict(format!("Answer option {} could not be deleted", id)),
                    || {
                        AppError::Conflict(format!(
                            "Answer option {} has recorded submissions",
                            id
                        ))
                    },
                )
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn quiz_has_active_session(&self, quiz_id: i64) -> StoreResult<bool> {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM game_sessions WHERE quiz_id = $1 AND is_active)",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(active)
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn insert_session(&self, quiz_id: i64, join_code: &str) -> StoreResult<GameSession> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO game_sessions (quiz_id, join_code)
            VALUES ($1, $2)
            RETURNING id, quiz_id, join_code, is_active, started_at, ended_at
            "#,
        )
        .bind(quiz_id)
        .bind(join_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                || AppError::Conflict(format!("Join code {} is already in use", join_code)),
                || AppError::NotFound(format!("Quiz {} not found", quiz_id)),
            )
        })?;
        Ok(row.into())
    }

    async fn get_session(&self, id: i64) -> StoreResult<Option<GameSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, quiz_id, join_code, is_active, started_at, ended_at FROM game_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GameSession::from))
    }

    async fn find_active_session_by_code(
        &self,
        join_code: &str,
    ) -> StoreResult<Option<GameSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, quiz_id, join_code, is_active, started_at, ended_at
            FROM game_sessions
            WHERE join_code = $1 AND is_active
            "#,
        )
        .bind(join_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(GameSession::from))
    }

    async fn list_sessions(&self) -> StoreResult<Vec<GameSession>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, quiz_id, join_code, is_active, started_at, ended_at
            FROM game_sessions
            ORDER BY started_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(GameSession::from).collect())
    }

    async fn end_session(&self, id: i64) -> StoreResult<Option<EndedSession>> {
        let mut tx = self.pool.begin().await?;

        let ended = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE game_sessions SET is_active = FALSE, ended_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING id, quiz_id, join_code, is_active, started_at, ended_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = ended else {
            // Either absent or already ended by an earlier call.
            drop(tx);
            return Ok(self.get_session(id).await?.map(|session| EndedSession {
                session,
                transitioned: false,
                ranked: 0,
            }));
        };

        let ranks = rank_standings(fetch_standings(&mut *tx, id).await?);
        let (ids, positions): (Vec<i64>, Vec<i32>) = ranks
            .iter()
            .map(|entry| (entry.participant_id, entry.rank))
            .unzip();

        sqlx::query(
            r#"
            UPDATE participants p SET final_rank = r.rank
            FROM UNNEST($2::BIGINT[], $3::INTEGER[]) AS r(id, rank)
            WHERE p.id = r.id AND p.session_id = $1
            "#,
        )
        .bind(id)
        .bind(ids)
        .bind(positions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(EndedSession {
            session: row.into(),
            transitioned: true,
            ranked: ranks.len(),
        }))
    }

    async fn insert_participant(
        &self,
        session_id: i64,
        display_name: &str,
    ) -> StoreResult<Participant> {
        let mut tx = self.pool.begin().await?;
        lock_active_session(&mut tx, session_id).await?;

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO participants (session_id, display_name)
            VALUES ($1, $2)
            RETURNING id, session_id, display_name, joined_at, running_score, final_rank
            "#,
        )
        .bind(session_id)
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(participant)
    }

    async fn get_participant(&self, id: i64) -> StoreResult<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, session_id, display_name, joined_at, running_score, final_rank
            FROM participants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn list_participants(&self, session_id: i64) -> StoreResult<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, session_id, display_name, joined_at, running_score, final_rank
            FROM participants
            WHERE session_id = $1
            ORDER BY joined_at, id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(participants)
    }

    async fn rename_participant(
        &self,
        id: i64,
        display_name: &str,
    ) -> StoreResult<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participants SET display_name = $2
            WHERE id = $1
            RETURNING id, session_id, display_name, joined_at, running_score, final_rank
            "#,
        )
        .bind(id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }

    async fn delete_participant(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_submission(&self, submission: &NewSubmission) -> StoreResult<Submission> {
        let mut tx = self.pool.begin().await?;
        lock_active_session(&mut tx, submission.session_id).await?;

        // The unique (participant_id, question_id) constraint arbitrates concurrent duplicates.
        let inserted = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions
                (session_id, participant_id, question_id, answer_option_id,
                 time_taken, is_correct, points_earned)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT submissions_participant_question_key DO NOTHING
            RETURNING id, session_id, participant_id, question_id, answer_option_id,
                      time_taken, is_correct, points_earned, submitted_at
            "#,
        )
        .bind(submission.session_id)
        .bind(submission.participant_id)
        .bind(submission.question_id)
        .bind(submission.answer_option_id)
        .bind(submission.time_taken)
        .bind(submission.is_correct)
        .bind(submission.points_earned)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                || {
                    AppError::Conflict(format!(
                        "Participant {} already answered question {}",
                        submission.participant_id, submission.question_id
                    ))
                },
                || {
                    AppError::NotFound(format!(
                        "Participant {} not found",
                        submission.participant_id
                    ))
                },
            )
        })?;

        let Some(record) = inserted else {
            return Err(AppError::Conflict(format!(
                "Participant {} already answered question {}",
                submission.participant_id, submission.question_id
            )));
        };

        let updated = sqlx::query(
            "UPDATE participants SET running_score = running_score + $1 WHERE id = $2",
        )
        .bind(record.points_earned)
        .bind(record.participant_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Participant {} not found",
                record.participant_id
            )));
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn has_submission(&self, participant_id: i64, question_id: i64) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM submissions WHERE participant_id = $1 AND question_id = $2)",
        )
        .bind(participant_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_submissions(
        &self,
        session_id: i64,
        participant_id: i64,
    ) -> StoreResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, session_id, participant_id, question_id, answer_option_id,
                   time_taken, is_correct, points_earned, submitted_at
            FROM submissions
            WHERE session_id = $1 AND participant_id = $2
            ORDER BY question_id
            "#,
        )
        .bind(session_id)
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }

    async fn standings(&self, session_id: i64) -> StoreResult<Vec<Standing>> {
        Ok(fetch_standings(&self.pool, session_id).await?)
    }
}
