use std::time::Duration;

use tokenwatch_core::StreamHandle;
use tokio::sync::oneshot;

#[tokio::test]
async fn stop_sends_signal_and_awaits_completion() {
    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = stop_rx.await;
    });
    let stream = StreamHandle::new(handle, stop_tx);
    stream.stop().await;
}

#[tokio::test]
async fn abort_cancels_without_waiting_for_cooperative_shutdown() {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    let stream = StreamHandle::new_abort_only(handle);
    stream.abort();
}

#[tokio::test]
async fn drop_without_explicit_shutdown_sends_stop_then_aborts() {
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let _ = stop_rx.await;
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });
    {
        let _stream = StreamHandle::new(handle, stop_tx);
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}
