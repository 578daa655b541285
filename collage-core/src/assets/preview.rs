use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use crate::assets::decode::PreparedImage;

/// Issues preview handles and counts the ones still alive.
#[derive(Debug, Default)]
pub struct PreviewLedger {
    next_id: AtomicU64,
    live: AtomicUsize,
}

impl PreviewLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of issued handles not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Issue a handle owning one displayable resource for `image`.
    pub fn issue(self: &Arc<Self>, image: Arc<PreparedImage>) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(id, "issued preview handle");
        PreviewHandle {
            id,
            image,
            ledger: Arc::clone(self),
        }
    }
}

/// Scoped display resource: released exactly once, when dropped.
pub struct PreviewHandle {
    id: u64,
    image: Arc<PreparedImage>,
    ledger: Arc<PreviewLedger>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Dereferenceable URI for this resource, e.g. `preview://3`.
    pub fn url(&self) -> String {
        format!("preview://{}", self.id)
    }

    /// Decoded pixels, shared with anything that displays them.
    pub fn image(&self) -> &Arc<PreparedImage> {
        &self.image
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(id = self.id, "released preview handle");
    }
}
