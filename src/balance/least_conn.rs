//! Least-connections selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::balance::{Backend, Strategy};

/// Selects the alive backend with the fewest in-flight connections.
///
/// Ties resolve to the lowest index, so selection is deterministic for any
/// snapshot of counts. The cursor is stored at the winner for consistency
/// with the rotation strategies; least-connections itself never reads it.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for LeastConnections {
    fn select(&self, backends: &[Arc<Backend>], cursor: &AtomicUsize) -> Option<usize> {
        let mut winner: Option<(usize, u64)> = None;

        for (idx, backend) in backends.iter().enumerate() {
            if !backend.is_alive() {
                continue;
            }
            let count = backend.connection_count();
            match winner {
                Some((_, best)) if count >= best => {}
                _ => winner = Some((idx, count)),
            }
        }

        let (idx, _) = winner?;
        cursor.store(idx, Ordering::Relaxed);
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::testing::MockTransport;
    use url::Url;

    fn backends(n: usize) -> Vec<Arc<Backend>> {
        (0..n)
            .map(|i| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 8081 + i)).unwrap();
                Arc::new(Backend::new(url, Box::new(MockTransport::ok())))
            })
            .collect()
    }

    #[test]
    fn picks_fewest_connections() {
        let pool = backends(3);
        pool[0].inc_connections();
        pool[0].inc_connections();
        pool[2].inc_connections();

        let cursor = AtomicUsize::new(0);
        let lc = LeastConnections::new();

        // Counts are [2, 0, 1]: index 1 wins.
        assert_eq!(lc.select(&pool, &cursor).unwrap(), 1);
        assert_eq!(cursor.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn tie_breaks_to_lowest_index() {
        let pool = backends(3);
        let cursor = AtomicUsize::new(0);
        assert_eq!(LeastConnections::new().select(&pool, &cursor).unwrap(), 0);
    }

    #[test]
    fn ignores_dead_backends_even_when_idle() {
        let pool = backends(2);
        pool[0].set_alive(false);
        pool[1].inc_connections();
        pool[1].inc_connections();

        let cursor = AtomicUsize::new(0);
        assert_eq!(LeastConnections::new().select(&pool, &cursor).unwrap(), 1);
    }

    #[test]
    fn all_dead_returns_none() {
        let pool = backends(2);
        pool[0].set_alive(false);
        pool[1].set_alive(false);
        let cursor = AtomicUsize::new(0);
        assert!(LeastConnections::new().select(&pool, &cursor).is_none());
    }
}
