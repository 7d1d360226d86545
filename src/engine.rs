//! Handle-based entry point the UI uses to drive study sessions.
//!
//! The UI keeps a [`SessionHandle`] and sends intents (flip, judge, quit);
//! the engine owns the store and every running session.

use crate::database::{CardStore, SessionRecorder};
use crate::error::{StudyError, StudyResult};
use crate::models::{CardView, DeckPolicy, Judged, SessionEnd, SessionState, StudySession, Summary};
use rand::Rng;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

pub struct StudyEngine<S> {
    store: S,
    policy: DeckPolicy,
    sessions: HashMap<SessionHandle, StudySession>,
    next_id: u64,
}

impl<S: CardStore + SessionRecorder> StudyEngine<S> {
    pub fn new(store: S, policy: DeckPolicy) -> Self {
        Self {
            store,
            policy,
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Policy for sessions started from now on.
    pub fn set_policy(&mut self, policy: DeckPolicy) {
        self.policy = policy;
    }

    /// Loads the set and starts a session on its first (shuffled) card.
    ///
    /// No handle is created when the set is missing or empty.
    pub fn start_session(&mut self, set_name: &str) -> StudyResult<SessionHandle> {
        self.start_session_with_rng(set_name, &mut rand::thread_rng())
    }

    pub fn start_session_with_rng<R: Rng + ?Sized>(
        &mut self,
        set_name: &str,
        rng: &mut R,
    ) -> StudyResult<SessionHandle> {
        let mut session = StudySession::new(set_name, self.policy);
        session.load(&self.store, rng)?;

        let handle = SessionHandle(self.next_id);
        self.next_id += 1;
        self.sessions.insert(handle, session);
        Ok(handle)
    }

    pub fn flip(&mut self, handle: SessionHandle) -> StudyResult<CardView> {
        let session = self.session_mut(handle)?;
        session.flip()?;
        Ok(session.current_view())
    }

    pub fn judge(&mut self, handle: SessionHandle, known: bool) -> StudyResult<Judged> {
        let session = self
            .sessions
            .get_mut(&handle)
            .ok_or(StudyError::UnknownSession(handle.0))?;
        session.judge(known, &mut self.store)
    }

    /// Ends a running session early and forgets the handle.
    pub fn quit(&mut self, handle: SessionHandle) -> StudyResult<SessionEnd> {
        let session = self
            .sessions
            .get_mut(&handle)
            .ok_or(StudyError::UnknownSession(handle.0))?;
        let end = session.quit(&mut self.store)?;
        self.sessions.remove(&handle);
        Ok(end)
    }

    pub fn current_view(&self, handle: SessionHandle) -> StudyResult<CardView> {
        Ok(self.session(handle)?.current_view())
    }

    pub fn state(&self, handle: SessionHandle) -> StudyResult<SessionState> {
        Ok(self.session(handle)?.state())
    }

    /// Forgets a session, returning its summary if it had completed.
    pub fn close(&mut self, handle: SessionHandle) -> Option<Summary> {
        let session = self.sessions.remove(&handle)?;
        session.summary().cloned()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, handle: SessionHandle) -> StudyResult<&StudySession> {
        self.sessions
            .get(&handle)
            .ok_or(StudyError::UnknownSession(handle.0))
    }

    fn session_mut(&mut self, handle: SessionHandle) -> StudyResult<&mut StudySession> {
        self.sessions
            .get_mut(&handle)
            .ok_or(StudyError::UnknownSession(handle.0))
    }
}
