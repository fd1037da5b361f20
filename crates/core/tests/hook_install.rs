//! Concurrent installation of the two process-level panic hooks.
//!
//! Runs as its own process so both hooks start uninstalled. The capture hook
//! and the tool-error hook each chain whatever hook was there before them;
//! installing both at once must not drop either chain.

#![allow(clippy::unwrap_used, clippy::panic)]

use faultline_common::{LogSink, TOOL_PREFIX};
use faultline_core::dev::install_tool_error_hook;
use faultline_core::{Deduplicator, Deliver, ErrorRecord, ReportContext, Reporter};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryTransport {
    delivered: Mutex<Vec<ErrorRecord>>,
}

impl Deliver for MemoryTransport {
    fn deliver(&self, record: ErrorRecord) {
        self.delivered.lock().unwrap().push(record);
    }
}

#[test]
fn concurrent_installs_chain_both_hooks() {
    let dir = tempfile::tempdir().unwrap();
    let sink = LogSink::new(dir.path().join("backend-error.log"));
    let transport = Arc::new(MemoryTransport::default());
    let reporter = Arc::new(Reporter::new(
        Deduplicator::new(Duration::from_millis(5000)),
        Arc::clone(&transport) as Arc<dyn Deliver>,
        ReportContext::default(),
    ));

    let barrier = Arc::new(Barrier::new(2));
    let capture_install = {
        let reporter = Arc::clone(&reporter);
        let barrier = Arc::clone(&barrier);
        std::thread::spawn(move || {
            barrier.wait();
            faultline_core::install(reporter);
        })
    };
    let tool_install = {
        let sink = sink.clone();
        let barrier = Arc::clone(&barrier);
        std::thread::spawn(move || {
            barrier.wait();
            install_tool_error_hook(sink);
        })
    };
    capture_install.join().unwrap();
    tool_install.join().unwrap();

    let marker = "chained-hooks-marker";
    let result = std::thread::spawn(|| panic!("{}", "chained-hooks-marker")).join();
    assert!(result.is_err());

    // The panic must reach both: one record through the reporter and one
    // line in the tool error log.
    let reported = transport
        .delivered
        .lock()
        .unwrap()
        .iter()
        .filter(|record| record.message.contains(marker))
        .count();
    assert_eq!(reported, 1, "capture hook lost its chain");

    let logged: Vec<_> = sink
        .tail(50)
        .unwrap()
        .into_iter()
        .filter(|line| line.contains(marker))
        .collect();
    assert_eq!(logged.len(), 1, "tool hook lost its chain");
    assert!(logged[0].contains(TOOL_PREFIX));
}
