//! Ordered concurrent mapper

use panel_core::core::PanelError;
use panel_core::utils::{CancelSignal, MapOptions, OrderedMapper};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_randomized_latency_never_reorders() {
    let mapper = OrderedMapper::new(MapOptions::new(16));
    for n in (1..=1000).step_by(111) {
        let results = mapper
            .map_settled((0..n).collect::<Vec<usize>>(), |ctx, i| {
                let delay = Duration::from_micros(rand::rng().random_range(0..300));
                async move {
                    tokio::time::sleep(delay).await;
                    if i % 17 == 0 {
                        Err(PanelError::RecordNotFound {
                            id: i.to_string(),
                        })
                    } else {
                        Ok((ctx.position(), i))
                    }
                }
            })
            .await;

        assert_eq!(results.len(), n);
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok((position, value)) => {
                    assert_eq!(position, i);
                    assert_eq!(value, i);
                }
                Err(PanelError::RecordNotFound {
                    id,
                }) => assert_eq!(id, i.to_string()),
                Err(other) => panic!("unexpected error at {i}: {other}"),
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fail_fast_returns_no_partial_results() {
    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    let mapper = OrderedMapper::new(MapOptions::new(4).fail_fast(true));

    let result = mapper
        .run((0..500).collect::<Vec<u32>>(), move |_, i| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_micros(50)).await;
                if i == 20 {
                    return Err(anyhow::anyhow!("unit {i} failed"));
                }
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await;

    let err = result.expect_err("fail-fast batch must not return results");
    assert_eq!(err.to_string(), "unit 20 failed");
    assert!(completed.load(Ordering::SeqCst) < 499);
}

#[tokio::test]
async fn test_units_observe_external_cancellation() {
    let signal = CancelSignal::new();
    let mapper = OrderedMapper::new(MapOptions::new(1)).with_cancel_signal(signal.clone());

    let results = mapper
        .map_settled((0..10).collect::<Vec<u32>>(), move |ctx, i| {
            if i == 3 {
                signal.cancel();
            }
            async move {
                assert_eq!(ctx.is_cancelled(), i >= 3);
                Ok::<_, PanelError>(i)
            }
        })
        .await;

    assert_eq!(results.len(), 10);
    assert!(results[..4].iter().all(Result::is_ok));
    assert!(results[4..].iter().all(|r| matches!(r, Err(PanelError::Cancelled { .. }))));
}
