use crate::catalog::Specialization;

/// Who is taking the test, as entered before the difficulty menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participant {
    pub(crate) full_name: String,
    pub(crate) position: String,
    pub(crate) department: String,
}

/// Conversation step of a chat. The test itself lives in the session store
/// while the dialogue is `Answering` or `Finished`.
#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Idle,
    ReceiveFullName {
        specialization: Specialization,
    },
    ReceivePosition {
        specialization: Specialization,
        full_name: String,
    },
    ReceiveDepartment {
        specialization: Specialization,
        full_name: String,
        position: String,
    },
    ChooseDifficulty {
        specialization: Specialization,
        participant: Participant,
    },
    Answering,
    Finished,
}
