use std::time::Duration;

/// Poll `condition` until it holds, giving the manager's pump task time to
/// drain pending notifications.
pub async fn settle(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 1s");
}
