use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::models::order::LOCAL_ID_PREFIX;

const SESSION_TAG_LEN: usize = 8;

/// Issues `L-<session>-<n>` identifiers for locally created orders.
///
/// The session tag is drawn once per generator and the counter only grows, so ids never
/// depend on clock resolution.
#[derive(Debug)]
pub struct LocalIdGenerator {
    session: String,
    counter: AtomicU64,
}

impl LocalIdGenerator {
    pub fn new() -> Self {
        let mut session = Uuid::new_v4().simple().to_string();
        session.truncate(SESSION_TAG_LEN);
        Self::with_session(session)
    }

    pub fn with_session(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{LOCAL_ID_PREFIX}{}-{n}", self.session)
    }
}

impl Default for LocalIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
