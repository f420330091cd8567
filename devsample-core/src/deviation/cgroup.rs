//! Cgroup-chain deviation: matches cgroup v2 hierarchy entries across
//! cycles by their stable `path_hash`, since `seq`/`parent_seq` are
//! assigned fresh by every walk and carry no cross-cycle identity.

use std::collections::HashMap;

use crate::storage::model::{CgroupChainEntry, CgroupChainMetrics};

use super::counter_deviation;

#[derive(Debug, Default, Clone)]
pub struct CgroupDeviation {
    pub entries: Vec<CgroupChainEntry>,
}

/// Deviates `curr` against `prev`, matched by `path_hash`. A cgroup with no
/// match in `prev` (newly created since last cycle) is reported with its
/// raw cumulative metrics, same convention as a newly observed task or
/// interface — there is no baseline to subtract against.
pub fn deviate_cgroups(prev: &[CgroupChainEntry], curr: &[CgroupChainEntry]) -> CgroupDeviation {
    let by_path: HashMap<u64, &CgroupChainEntry> =
        prev.iter().map(|e| (e.metadata.path_hash, e)).collect();

    let entries = curr
        .iter()
        .map(|c| {
            let Some(p) = by_path.get(&c.metadata.path_hash) else {
                return c.clone();
            };
            CgroupChainEntry {
                // Identity and current placement always come from this
                // cycle's walk; only the metrics are deviated.
                metadata: c.metadata.clone(),
                config: c.config.clone(),
                metrics: CgroupChainMetrics {
                    cpu_user_usec: counter_deviation(c.metrics.cpu_user_usec, p.metrics.cpu_user_usec),
                    cpu_system_usec: counter_deviation(c.metrics.cpu_system_usec, p.metrics.cpu_system_usec),
                    // Memory occupancy is an instantaneous gauge, never deviated.
                    mem_anon: c.metrics.mem_anon,
                    mem_file: c.metrics.mem_file,
                    mem_kernel: c.metrics.mem_kernel,
                    cpu_pressure_total: counter_deviation(c.metrics.cpu_pressure_total, p.metrics.cpu_pressure_total),
                    mem_pressure_total: counter_deviation(c.metrics.mem_pressure_total, p.metrics.mem_pressure_total),
                    io_pressure_total: counter_deviation(c.metrics.io_pressure_total, p.metrics.io_pressure_total),
                },
                pidlist_range: c.pidlist_range,
            }
        })
        .collect();

    CgroupDeviation { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::model::CgroupChainMetadata;

    fn entry(path_hash: u64, cpu_user: u64, mem_anon: u64) -> CgroupChainEntry {
        CgroupChainEntry {
            metadata: CgroupChainMetadata {
                path_hash,
                seq: 0,
                parent_seq: 0,
                depth: 0,
                name_hash: 0,
            },
            config: Default::default(),
            metrics: CgroupChainMetrics {
                cpu_user_usec: cpu_user,
                mem_anon,
                ..Default::default()
            },
            pidlist_range: (0, 0),
        }
    }

    #[test]
    fn matches_by_path_hash_not_seq() {
        let prev = vec![entry(42, 1000, 5000)];
        // Same path_hash, different seq this walk.
        let mut curr_entry = entry(42, 1200, 6000);
        curr_entry.metadata.seq = 7;
        let curr = vec![curr_entry];

        let dev = deviate_cgroups(&prev, &curr);
        assert_eq!(dev.entries[0].metrics.cpu_user_usec, 200);
        assert_eq!(dev.entries[0].metrics.mem_anon, 6000, "gauge copied as-is");
        assert_eq!(dev.entries[0].metadata.seq, 7);
    }

    #[test]
    fn new_cgroup_has_no_baseline_reports_raw() {
        let prev: Vec<CgroupChainEntry> = vec![];
        let curr = vec![entry(99, 500, 1000)];
        let dev = deviate_cgroups(&prev, &curr);
        assert_eq!(dev.entries[0].metrics.cpu_user_usec, 500);
    }
}
