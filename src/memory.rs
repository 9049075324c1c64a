//! In-process document backend. Lost on restart; used for demos and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::store::{DocumentBackend, Snapshot, StoreError, Version};

#[derive(Debug, Default)]
struct State {
    body: Option<String>,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<State>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                body: Some(body.into()),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn version_of(state: &State) -> Version {
    Version(state.generation.to_string())
}

#[async_trait]
impl DocumentBackend for MemoryDocument {
    async fn read(&self) -> Result<Snapshot, StoreError> {
        let state = self.lock();
        Ok(Snapshot {
            body: state.body.clone(),
            version: Some(version_of(&state)),
        })
    }

    async fn write(&self, body: String) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.body = Some(body);
        state.generation += 1;
        Ok(())
    }

    async fn write_if(&self, body: String, expected: Option<&Version>) -> Result<(), StoreError> {
        let mut state = self.lock();
        if expected != Some(&version_of(&state)) {
            return Err(StoreError::Conflict);
        }
        state.body = Some(body);
        state.generation += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
