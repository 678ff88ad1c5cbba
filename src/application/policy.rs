use crate::domain::ScalingConfig;

/// Replica count for the next tick.
///
/// Moves at most one step: up when `cpu_avg` is strictly above the
/// threshold, down when strictly below half of it, clamped to the
/// configured bounds. Anything else keeps `current`.
pub fn next_replica_count(current: u32, cpu_avg: f64, cfg: &ScalingConfig) -> u32 {
    if cpu_avg > cfg.cpu_threshold() {
        cfg.max_replicas().min(current.saturating_add(1))
    } else if cpu_avg < cfg.scale_down_threshold() && current > cfg.min_replicas() {
        cfg.min_replicas().max(current - 1)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn cfg(threshold: f64, min: u32, max: u32) -> ScalingConfig {
        ScalingConfig::new(Duration::from_secs(30), threshold, min, max).unwrap()
    }

    #[test]
    fn test_scale_up() {
        assert_eq!(next_replica_count(1, 0.9, &cfg(0.7, 1, 3)), 2);
    }

    #[test]
    fn test_scale_down() {
        assert_eq!(next_replica_count(3, 0.1, &cfg(0.7, 1, 3)), 2);
    }

    #[test]
    fn test_idle_service_scales_down() {
        assert_eq!(next_replica_count(2, 0.0, &cfg(0.7, 1, 5)), 1);
    }

    #[test]
    fn test_hold_inside_band() {
        let cfg = cfg(0.7, 1, 5);
        assert_eq!(next_replica_count(3, 0.5, &cfg), 3);
        assert_eq!(next_replica_count(3, 0.35, &cfg), 3);
    }

    #[test]
    fn test_exact_boundaries_do_not_scale() {
        let cfg = cfg(0.6, 1, 5);
        assert_eq!(next_replica_count(2, 0.6, &cfg), 2);
        assert_eq!(next_replica_count(2, 0.3, &cfg), 2);
    }

    #[test]
    fn test_ceiling_and_floor_clamp() {
        let cfg = cfg(0.7, 1, 3);

        let mut replicas = 3;
        for _ in 0..5 {
            replicas = next_replica_count(replicas, 1.0, &cfg);
            assert_eq!(replicas, 3);
        }

        let mut replicas = 1;
        for _ in 0..5 {
            replicas = next_replica_count(replicas, 0.0, &cfg);
            assert_eq!(replicas, 1);
        }
    }

    #[test]
    fn test_stays_in_bounds_and_moves_one_step() {
        let cfg = cfg(0.7, 2, 6);
        let loads = [0.0, 0.1, 0.349, 0.35, 0.5, 0.7, 0.71, 1.0, 3.5];

        for current in cfg.min_replicas()..=cfg.max_replicas() {
            for &cpu in &loads {
                let next = next_replica_count(current, cpu, &cfg);
                assert!(next >= cfg.min_replicas() && next <= cfg.max_replicas());
                assert!(next.abs_diff(current) <= 1, "{} -> {} at {}", current, next, cpu);
            }
        }
    }

    #[test]
    fn test_zero_minimum_allows_scale_to_zero() {
        assert_eq!(next_replica_count(1, 0.0, &cfg(0.7, 0, 3)), 0);
        assert_eq!(next_replica_count(0, 0.0, &cfg(0.7, 0, 3)), 0);
        assert_eq!(next_replica_count(0, 0.8, &cfg(0.7, 0, 3)), 1);
    }
}
