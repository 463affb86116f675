use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use signal_hook::{consts::SIGINT, flag};

/// SIGINT handling for the command loop. Outside a review the signal ends
/// the process as usual; during a review it only raises the session's
/// cancel flag so a save in flight can finish.
pub struct InterruptHandler {
    cancel: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
}

impl InterruptHandler {
    pub fn install() -> io::Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let terminate = Arc::new(AtomicBool::new(true));
        flag::register_conditional_default(SIGINT, Arc::clone(&terminate))?;
        flag::register(SIGINT, Arc::clone(&cancel))?;
        Ok(Self { cancel, terminate })
    }

    pub fn begin_review(&self) -> Arc<AtomicBool> {
        self.cancel.store(false, Ordering::SeqCst);
        self.terminate.store(false, Ordering::SeqCst);
        Arc::clone(&self.cancel)
    }

    pub fn end_review(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub fn is_reviewing(&self) -> bool {
        !self.terminate.load(Ordering::SeqCst)
    }
}
