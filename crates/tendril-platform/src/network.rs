use tendril_core::{Dispose, Emitter, EventSource, EventTarget, Source};

pub const ONLINE: &str = "online";
pub const OFFLINE: &str = "offline";

/// Connectivity as announced by `online`/`offline` events.
pub struct OnlineSource {
    target: EventTarget<()>,
    initially_online: bool,
}

impl OnlineSource {
    pub fn new(target: &EventTarget<()>, initially_online: bool) -> Self {
        Self {
            target: target.clone(),
            initially_online,
        }
    }
}

impl Source for OnlineSource {
    type Value = bool;
    type Key = usize;

    fn key(&self) -> usize {
        self.target.id()
    }

    fn initial(&self) -> bool {
        self.initially_online
    }

    fn attach(&self, emit: Emitter<bool>) -> Dispose {
        EventSource::new(
            &self.target,
            [ONLINE, OFFLINE],
            self.initially_online,
            |online, name, _: &()| {
                let next = name == ONLINE;
                (next != *online).then_some(next)
            },
        )
        .attach(emit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tendril_core::Subscription;

    #[test]
    fn follows_connectivity_events() {
        let net = EventTarget::new();
        let sub = Subscription::new(OnlineSource::new(&net, true));
        assert!(sub.get());
        net.dispatch(OFFLINE, &());
        assert!(!sub.get());
        let v = sub.value().version();
        net.dispatch(OFFLINE, &());
        assert_eq!(sub.value().version(), v);
        net.dispatch(ONLINE, &());
        assert!(sub.get());
        drop(sub);
        assert_eq!(net.listener_count(), 0);
    }
}
