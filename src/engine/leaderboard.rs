// src/engine/leaderboard.rs

use super::GameEngine;
use crate::{
    error::AppError,
    models::{
        answer_option::PublicAnswerOption,
        leaderboard::{LeaderboardEntry, rank_standings},
        question::PublicQuestion,
        submission::Submission,
    },
};

impl GameEngine {
    /// Current standings, recomputed from recorded submissions on every call.
    pub async fn leaderboard(&self, session_id: i64) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.require_session(session_id).await?;
        let standings = self.store.standings(session_id).await?;
        Ok(rank_standings(standings))
    }

    /// A participant's answers in question presentation order.
    pub async fn participant_submissions(
        &self,
        session_id: i64,
        participant_id: i64,
    ) -> Result<Vec<Submission>, AppError> {
        self.require_session(session_id).await?;
        self.require_member(session_id, participant_id).await?;
        self.store.list_submissions(session_id, participant_id).await
    }

    /// The session's questions with their options, correctness hidden.
    pub async fn session_questions(&self, session_id: i64) -> Result<Vec<PublicQuestion>, AppError> {
        let session = self.require_session(session_id).await?;
        let questions = self.store.list_questions(session.quiz_id).await?;

        let mut public = Vec::with_capacity(questions.len());
        for question in questions {
            let options = self
                .store
                .list_answer_options(question.id)
                .await?
                .into_iter()
                .map(PublicAnswerOption::from)
                .collect();
            public.push(PublicQuestion {
                id: question.id,
                text: question.text,
                time_limit: question.time_limit,
                points: question.points,
                multi_select: question.multi_select,
                options,
            });
        }
        Ok(public)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::engine::test_support::{add_option, add_question, fixture};
    use crate::models::leaderboard::Standing;
    use crate::models::submission::SubmitAnswerRequest;
    use crate::store::GameStore;

    fn standing(id: i64, score: i64, joined_offset_secs: i64) -> Standing {
        Standing {
            participant_id: id,
            display_name: format!("p{}", id),
            joined_at: Utc::now() + Duration::seconds(joined_offset_secs),
            total_score: score,
            correct_count: 0,
        }
    }

    #[test]
    fn ties_break_by_earliest_join() {
        // Storage order deliberately scrambled.
        let ranked = rank_standings(vec![
            standing(3, 100, 3),
            standing(2, 300, 2),
            standing(1, 300, 1),
        ]);

        let order: Vec<(i64, i32)> = ranked.iter().map(|e| (e.participant_id, e.rank)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn identical_join_times_fall_back_to_id() {
        let joined_at = Utc::now();
        let mut a = standing(8, 50, 0);
        let mut b = standing(5, 50, 0);
        a.joined_at = joined_at;
        b.joined_at = joined_at;

        let ranked = rank_standings(vec![a, b]);
        assert_eq!(ranked[0].participant_id, 5);
    }

    #[tokio::test]
    async fn leaderboard_counts_correct_answers_mid_game() {
        let fx = fixture().await;
        let q2 = add_question(&fx.store, fx.quiz.id, 30).await;
        let q2_correct = add_option(&fx.store, q2.id, true).await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let ada = fx.engine.join(session.id, "Ada").await.unwrap();
        let bob = fx.engine.join(session.id, "Bob").await.unwrap();

        for (pid, qid, oid, t) in [
            (ada.id, fx.question.id, fx.correct.id, 0.0),
            (ada.id, q2.id, q2_correct.id, 30.0),
            (bob.id, fx.question.id, fx.wrong.id, 1.0),
        ] {
            fx.engine
                .submit_answer(
                    session.id,
                    &SubmitAnswerRequest {
                        participant_id: pid,
                        question_id: qid,
                        answer_option_id: oid,
                        time_taken: t,
                    },
                )
                .await
                .unwrap();
        }

        let board = fx.engine.leaderboard(session.id).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].participant_id, ada.id);
        assert_eq!(board[0].total_score, 1500);
        assert_eq!(board[0].correct_count, 2);
        assert_eq!(board[1].participant_id, bob.id);
        assert_eq!(board[1].total_score, 0);
        assert_eq!(board[1].correct_count, 0);
    }

    #[tokio::test]
    async fn ending_freezes_ranks() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let early = fx.engine.join(session.id, "early").await.unwrap();
        let late = fx.engine.join(session.id, "late").await.unwrap();
        fx.engine
            .submit_answer(
                session.id,
                &SubmitAnswerRequest {
                    participant_id: late.id,
                    question_id: fx.question.id,
                    answer_option_id: fx.correct.id,
                    time_taken: 2.0,
                },
            )
            .await
            .unwrap();

        fx.engine.end_session(session.id).await.unwrap();

        let participants = fx.store.list_participants(session.id).await.unwrap();
        let rank_of = |id: i64| participants.iter().find(|p| p.id == id).unwrap().final_rank;
        assert_eq!(rank_of(late.id), Some(1));
        assert_eq!(rank_of(early.id), Some(2));
    }

    #[tokio::test]
    async fn history_requires_membership() {
        let fx = fixture().await;
        let s1 = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let s2 = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let p = fx.engine.join(s2.id, "Ada").await.unwrap();

        let err = fx.engine.participant_submissions(s1.id, p.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(fx.engine.participant_submissions(s2.id, p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_in_question_order() {
        let fx = fixture().await;
        let q2 = add_question(&fx.store, fx.quiz.id, 30).await;
        let q2_option = add_option(&fx.store, q2.id, false).await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();
        let p = fx.engine.join(session.id, "Ada").await.unwrap();

        // Answer the later question first.
        for (qid, oid) in [(q2.id, q2_option.id), (fx.question.id, fx.correct.id)] {
            fx.engine
                .submit_answer(
                    session.id,
                    &SubmitAnswerRequest {
                        participant_id: p.id,
                        question_id: qid,
                        answer_option_id: oid,
                        time_taken: 1.0,
                    },
                )
                .await
                .unwrap();
        }

        let history = fx.engine.participant_submissions(session.id, p.id).await.unwrap();
        let questions: Vec<i64> = history.iter().map(|s| s.question_id).collect();
        assert_eq!(questions, vec![fx.question.id, q2.id]);
    }

    #[tokio::test]
    async fn session_questions_hide_correctness() {
        let fx = fixture().await;
        let session = fx.engine.create_session(fx.quiz.id, None).await.unwrap();

        let questions = fx.engine.session_questions(session.id).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 2);

        let json = serde_json::to_value(&questions).unwrap();
        assert!(json[0]["options"][0].get("is_correct").is_none());
    }

    #[tokio::test]
    async fn leaderboard_of_missing_session_is_not_found() {
        let fx = fixture().await;
        let err = fx.engine.leaderboard(31337).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
