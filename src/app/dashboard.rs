//! Live terminal dashboard
//!
//! Runs its own draw/poll loop on the calling thread. Outcomes arrive
//! through a [`DashboardHandle`] that never blocks the aggregator.

use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::app::screens;
use crate::app::state::DashboardState;
use crate::app::tui::{Tui, DEFAULT_TICK_RATE};
use crate::bench::sink::{InteractiveDisplay, OutcomeSink};
use crate::config::BenchmarkRequest;
use crate::models::RunOutcome;
use crate::{PerfError, Result};

/// Posts outcomes into a running dashboard
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    tx: mpsc::UnboundedSender<RunOutcome>,
}

impl OutcomeSink for DashboardHandle {
    fn post(&self, outcome: RunOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::trace!("dashboard closed, outcome dropped");
        }
    }
}

/// Terminal dashboard for one run
pub struct Dashboard {
    state: DashboardState,
    tx: mpsc::UnboundedSender<RunOutcome>,
    rx: mpsc::UnboundedReceiver<RunOutcome>,
}

impl Dashboard {
    pub fn new(request: &BenchmarkRequest) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: DashboardState::new(request),
            tx,
            rx,
        }
    }
}

/// Pull everything already posted; false once every handle is gone
fn drain_posted(state: &mut DashboardState, rx: &mut mpsc::UnboundedReceiver<RunOutcome>) -> bool {
    loop {
        match rx.try_recv() {
            Ok(outcome) => state.apply(outcome),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

fn event_loop(
    tui: &mut Tui,
    state: &mut DashboardState,
    rx: &mut mpsc::UnboundedReceiver<RunOutcome>,
) -> std::io::Result<()> {
    loop {
        let open = drain_posted(state, rx);
        tui.draw(|f| screens::render(f, state))?;

        if state.is_final() || state.should_quit() {
            return Ok(());
        }
        if !open {
            tracing::debug!("outcome stream ended without a final outcome");
            return Ok(());
        }

        if let Some(key) = tui.next_key()? {
            state.handle_key_event(key);
        }
    }
}

impl InteractiveDisplay for Dashboard {
    type Handle = DashboardHandle;

    fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            tx: self.tx.clone(),
        }
    }

    fn run(self) -> Result<()> {
        let Dashboard {
            mut state,
            tx,
            mut rx,
        } = self;
        // Only outstanding handles keep the stream open from here on.
        drop(tx);

        let tui_error = |e: std::io::Error| PerfError::TuiError(e.to_string());
        let mut tui = Tui::new(DEFAULT_TICK_RATE).map_err(tui_error)?;
        tui.enter().map_err(tui_error)?;

        let looped = event_loop(&mut tui, &mut state, &mut rx);
        let restored = tui.restore();
        looped.map_err(tui_error)?;
        restored.map_err(tui_error)?;

        if state.should_quit() && !state.is_final() {
            tracing::info!("dashboard closed by user");
        }
        for line in state.summary_lines() {
            println!("{}", line);
        }
        Ok(())
    }
}
