use crate::hotspot::{HotspotId, InteractionRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionRequest {
    /// `interaction: None` resolves the way a plain click would: a held
    /// item's combine first, then the first enabled Use, then Examine.
    Run {
        hotspot: HotspotId,
        interaction: Option<InteractionRef>,
    },
    StopMovingToHotspot,
}

/// Requests raised outside the step (by game code or by a running handler).
/// They are applied at the start of the next step.
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: Vec<InteractionRequest>,
}

impl RequestQueue {
    pub fn enqueue(&mut self, request: InteractionRequest) {
        self.requests.push(request);
    }

    pub fn run_interaction(&mut self, hotspot: HotspotId, interaction: Option<InteractionRef>) {
        self.enqueue(InteractionRequest::Run {
            hotspot,
            interaction,
        });
    }

    pub fn stop_moving_to_hotspot(&mut self) {
        self.enqueue(InteractionRequest::StopMovingToHotspot);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn drain_current_step(&mut self) -> Vec<InteractionRequest> {
        std::mem::take(&mut self.requests)
    }
}
