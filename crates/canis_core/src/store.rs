use crate::state::PetState;
use crate::StateStore;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Keeps the last saved state in process memory. Used for `--ephemeral`
/// runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<PetState>>,
    saves: std::sync::atomic::AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PetState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
            saves: Default::default(),
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_state(&self) -> anyhow::Result<Option<PetState>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save_state(&self, state: &PetState) -> anyhow::Result<()> {
        *self.slot.lock().await = Some(state.clone());
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
