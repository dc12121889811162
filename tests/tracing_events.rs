// Logging under the `tracing` feature (`cargo test --features tracing`).
//
// Verifies: the default release path emits exactly one event, with target
// `intrusive_ptr`, per destroyed object, and none while owners remain.
#![cfg(feature = "tracing")]

use intrusive_ptr::{Counted, IntrusivePtr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata, Subscriber};

struct CountEvents {
    destroyed: Arc<AtomicUsize>,
}

impl Subscriber for CountEvents {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.target() == "intrusive_ptr"
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        if event.metadata().target() == "intrusive_ptr" {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

#[test]
fn destroy_emits_one_trace_event_per_object() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let subscriber = CountEvents {
        destroyed: destroyed.clone(),
    };

    tracing::subscriber::with_default(subscriber, || {
        let p = IntrusivePtr::new(Counted::new(1u32));
        let q = p.clone();
        drop(p);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);
        drop(q);
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);

        let chain: Vec<_> = (0..3).map(|i| IntrusivePtr::new(Counted::new(i))).collect();
        drop(chain);
    });

    assert_eq!(destroyed.load(Ordering::SeqCst), 4);
}
