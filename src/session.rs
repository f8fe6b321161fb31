use std::{collections::HashMap, time::Duration};

use teloxide::types::MessageId;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    catalog::{Difficulty, Specialization},
    database::question::{Question, Selection},
    state::Participant,
    timer::TestTimer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the test is already finished")]
    Finished,
    #[error("option {0} does not exist on this question")]
    NoSuchOption(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Pointer moved to the question with this index.
    Question(usize),
    /// The last question was passed.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Running,
    Finished { timed_out: bool },
}

/// Final numbers of an attempt, handed to the result screen and to the
/// statistics and certificate services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub user_id: u64,
    pub participant: Participant,
    pub specialization: Specialization,
    pub difficulty: Difficulty,
    pub correct: usize,
    pub total: usize,
    pub timed_out: bool,
}

impl TestOutcome {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.correct * 100 / self.total
        }
    }
}

/// One graded row of the answers report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub number: usize,
    pub is_correct: bool,
    pub expected: Selection,
}

/// An attempt of one user at one test.
#[derive(Debug)]
pub struct TestSession {
    id: Uuid,
    user_id: u64,
    specialization: Specialization,
    difficulty: Difficulty,
    participant: Participant,
    questions: Vec<Question>,
    answers: HashMap<usize, Selection>,
    current: usize,
    status: Status,
    timer: Option<TestTimer>,
    screen: Option<MessageId>,
}

impl TestSession {
    pub fn new(
        user_id: u64,
        specialization: Specialization,
        difficulty: Difficulty,
        participant: Participant,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            specialization,
            difficulty,
            participant,
            questions,
            answers: HashMap::new(),
            current: 0,
            status: Status::Running,
            timer: None,
            screen: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn specialization(&self) -> Specialization {
        self.specialization
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn selected(&self, index: usize) -> Selection {
        self.answers.get(&index).cloned().unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, Status::Finished { .. })
    }

    pub fn screen(&self) -> Option<MessageId> {
        self.screen
    }

    pub fn set_screen(&mut self, screen: MessageId) {
        self.screen = Some(screen);
    }

    /// Replaces the countdown, cancelling the previous one.
    pub fn attach_timer(&mut self, timer: TestTimer) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.cancel();
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.timer.as_ref().map(TestTimer::remaining)
    }

    /// Flips `option` (1-based) in the current question's selection.
    pub fn toggle(&mut self, option: usize) -> Result<&Selection, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        let options = self.current_question().map_or(0, |q| q.options().len());
        if option == 0 || option > options {
            return Err(SessionError::NoSuchOption(option));
        }

        let selection = self.answers.entry(self.current).or_default();
        if !selection.remove(&option) {
            selection.insert(option);
        }
        Ok(selection)
    }

    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            Ok(Progress::Question(self.current))
        } else {
            Ok(Progress::Exhausted)
        }
    }

    /// Ends the attempt and stops the countdown. Only the first call wins;
    /// every later call returns `false` and changes nothing.
    pub fn finish(&mut self, timed_out: bool) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = Status::Finished { timed_out };
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
        true
    }

    pub fn outcome(&self) -> TestOutcome {
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, question)| question.is_correct(&self.selected(*i)))
            .count();

        TestOutcome {
            user_id: self.user_id,
            participant: self.participant.clone(),
            specialization: self.specialization,
            difficulty: self.difficulty,
            correct,
            total: self.questions.len(),
            timed_out: matches!(self.status, Status::Finished { timed_out: true }),
        }
    }

    pub fn graded_answers(&self) -> Vec<GradedAnswer> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, question)| GradedAnswer {
                number: i + 1,
                is_correct: question.is_correct(&self.selected(i)),
                expected: question.correct().clone(),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;

    pub(crate) fn participant() -> Participant {
        Participant {
            full_name: "Иванов Иван Иванович".into(),
            position: "Судебный пристав".into(),
            department: "ОСП по ЦАО".into(),
        }
    }

    pub(crate) fn questions(count: usize) -> Vec<Question> {
        (1..=count)
            .map(|i| {
                Question::new(
                    format!("Вопрос {i}"),
                    vec!["первый".into(), "второй".into(), "третий".into()],
                    [1],
                )
            })
            .collect()
    }

    pub(crate) fn oko_basic() -> TestSession {
        let difficulty = Difficulty::Basic;
        TestSession::new(
            7,
            Specialization::Oko,
            difficulty,
            participant(),
            questions(difficulty.question_count()),
        )
    }

    #[test]
    fn test_toggle_twice_restores_selection() {
        let mut session = oko_basic();

        assert_eq!(session.toggle(1).unwrap(), &Selection::from([1]));
        assert_eq!(session.toggle(1).unwrap(), &Selection::new());
        assert_eq!(session.selected(0), Selection::new());
    }

    #[test]
    fn test_toggle_multiple_options() {
        let mut session = oko_basic();
        session.toggle(3).unwrap();
        session.toggle(1).unwrap();
        assert_eq!(session.selected(0), Selection::from([1, 3]));
        assert_eq!(session.selected(1), Selection::new());
    }

    #[test]
    fn test_toggle_rejects_unknown_option() {
        let mut session = oko_basic();
        assert_eq!(session.toggle(0), Err(SessionError::NoSuchOption(0)));
        assert_eq!(session.toggle(4), Err(SessionError::NoSuchOption(4)));
    }

    #[test]
    fn test_full_walkthrough() {
        let mut session = oko_basic();
        session.toggle(1).unwrap();
        session.toggle(1).unwrap();

        for i in 1..30 {
            assert_eq!(session.advance(), Ok(Progress::Question(i)));
        }
        assert_eq!(session.current_index(), 29);
        assert_eq!(session.advance(), Ok(Progress::Exhausted));

        assert!(session.finish(false));
        assert!(session.is_finished());

        let graded = session.graded_answers();
        assert_eq!(graded.len(), 30);
        assert!(graded.iter().all(|row| !row.is_correct));
        assert_eq!(graded[0].expected, Selection::from([1]));
        assert_eq!(graded[29].number, 30);

        let outcome = session.outcome();
        assert_eq!((outcome.correct, outcome.total), (0, 30));
        assert!(!outcome.timed_out);
    }

    #[test]
    fn test_outcome_counts_exact_matches() {
        let mut session = oko_basic();
        session.toggle(1).unwrap();
        session.advance().unwrap();
        session.toggle(1).unwrap();
        session.toggle(2).unwrap();
        session.advance().unwrap();
        session.toggle(1).unwrap();
        session.finish(true);

        let outcome = session.outcome();
        assert_eq!(outcome.correct, 2);
        assert_eq!(outcome.percent(), 6);
        assert!(outcome.timed_out);
    }

    #[test]
    fn test_finish_only_once() {
        let mut session = oko_basic();
        assert!(session.finish(true));
        assert!(!session.finish(false));
        assert!(session.outcome().timed_out);
        assert_eq!(session.toggle(1), Err(SessionError::Finished));
        assert_eq!(session.advance(), Err(SessionError::Finished));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_cancels_timer() {
        let mut session = oko_basic();
        let (tx, rx) = oneshot::channel::<()>();
        session.attach_timer(TestTimer::start(Duration::from_secs(60), async move {
            let _ = tx.send(());
        }));

        assert!(session.finish(false));
        assert!(rx.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_timer_replaces_previous() {
        let mut session = oko_basic();
        let (first_tx, first_rx) = oneshot::channel::<()>();
        let (second_tx, second_rx) = oneshot::channel::<()>();
        session.attach_timer(TestTimer::start(Duration::from_secs(60), async move {
            let _ = first_tx.send(());
        }));
        session.attach_timer(TestTimer::start(Duration::from_secs(60), async move {
            let _ = second_tx.send(());
        }));

        assert!(first_rx.await.is_err());
        assert!(second_rx.await.is_ok());
    }
}
