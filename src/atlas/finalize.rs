//! Finalizer (C4): pure segment compaction. No GPU calls here — this is the one part
//! of the pool's state machine that is fully host-side logic and unit-testable
//! without a device.

/// A pending `(command, first_instance, count)` triple recorded during ingest.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub command_index: u32,
    pub first_instance: u32,
    pub count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FinalizedLayout {
    /// Remap buffer prefix: `remap[r]` is the absolute instance index for slot `r`.
    pub remap: Vec<u32>,
    /// One entry per instance appended: which command it belongs to.
    pub instance_draw_cmd_map: Vec<u32>,
    /// One entry per command: start of its remap region.
    pub command_base_offsets: Vec<u32>,
    /// One entry per command: size of its remap region.
    pub command_instance_counts: Vec<u32>,
}

/// Compacts `segments` into contiguous per-command remap regions.
///
/// Commands are visited in ascending index order; within a command, segments retain
/// the order they were recorded in. This makes the output deterministic for a given
/// input trace (see the "deterministic layout" property).
pub fn finalize_segments(
    segments: &[Segment],
    draw_command_count: u32,
    total_instances: u32,
) -> FinalizedLayout {
    let mut buckets: Vec<Vec<&Segment>> = vec![Vec::new(); draw_command_count as usize];
    for seg in segments {
        if (seg.command_index as usize) < buckets.len() {
            buckets[seg.command_index as usize].push(seg);
        }
    }

    let mut remap = Vec::with_capacity(total_instances as usize);
    let mut instance_draw_cmd_map = vec![0u32; total_instances as usize];
    let mut command_base_offsets = vec![0u32; draw_command_count as usize];
    let mut command_instance_counts = vec![0u32; draw_command_count as usize];

    let mut cursor = 0u32;
    for (command_index, bucket) in buckets.iter().enumerate() {
        command_base_offsets[command_index] = cursor;
        let mut written = 0u32;
        for seg in bucket {
            for i in 0..seg.count {
                let instance_index = seg.first_instance + i;
                remap.push(instance_index);
                if (instance_index as usize) < instance_draw_cmd_map.len() {
                    instance_draw_cmd_map[instance_index as usize] = command_index as u32;
                }
                written += 1;
            }
        }
        command_instance_counts[command_index] = written;
        cursor += written;
    }

    FinalizedLayout {
        remap,
        instance_draw_cmd_map,
        command_base_offsets,
        command_instance_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_scenario_produces_contiguous_disjoint_regions() {
        let segments = [
            Segment {
                command_index: 0,
                first_instance: 0,
                count: 3,
            },
            Segment {
                command_index: 1,
                first_instance: 3,
                count: 2,
            },
            Segment {
                command_index: 0,
                first_instance: 5,
                count: 4,
            },
        ];

        let layout = finalize_segments(&segments, 2, 9);

        assert_eq!(layout.command_base_offsets, vec![0, 7]);
        assert_eq!(layout.command_instance_counts, vec![7, 2]);
        assert_eq!(&layout.remap[0..7], &[0, 1, 2, 5, 6, 7, 8]);
        assert_eq!(&layout.remap[7..9], &[3, 4]);
    }

    #[test]
    fn map_is_consistent_with_remap_for_every_command() {
        let segments = [
            Segment {
                command_index: 0,
                first_instance: 0,
                count: 3,
            },
            Segment {
                command_index: 1,
                first_instance: 3,
                count: 2,
            },
        ];
        let layout = finalize_segments(&segments, 2, 5);

        for command_index in 0..2u32 {
            let base = layout.command_base_offsets[command_index as usize];
            let count = layout.command_instance_counts[command_index as usize];
            for i in 0..count {
                let instance = layout.remap[(base + i) as usize];
                assert_eq!(layout.instance_draw_cmd_map[instance as usize], command_index);
            }
        }
    }

    #[test]
    fn regions_are_disjoint_and_cover_a_prefix() {
        let segments = [
            Segment {
                command_index: 0,
                first_instance: 0,
                count: 3,
            },
            Segment {
                command_index: 1,
                first_instance: 3,
                count: 5,
            },
            Segment {
                command_index: 2,
                first_instance: 8,
                count: 1,
            },
        ];
        let layout = finalize_segments(&segments, 3, 9);

        let mut covered = 0u32;
        for i in 0..3u32 {
            assert_eq!(layout.command_base_offsets[i as usize], covered);
            covered += layout.command_instance_counts[i as usize];
        }
        assert_eq!(covered as usize, layout.remap.len());
    }

    #[test]
    fn identical_traces_produce_identical_layouts() {
        let segments = [
            Segment {
                command_index: 1,
                first_instance: 0,
                count: 2,
            },
            Segment {
                command_index: 0,
                first_instance: 2,
                count: 1,
            },
        ];
        let a = finalize_segments(&segments, 2, 3);
        let b = finalize_segments(&segments, 2, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_command_has_zero_length_region() {
        let segments = [Segment {
            command_index: 1,
            first_instance: 0,
            count: 2,
        }];
        let layout = finalize_segments(&segments, 3, 2);
        assert_eq!(layout.command_instance_counts, vec![0, 2, 0]);
        assert_eq!(layout.command_base_offsets, vec![0, 0, 2]);
    }
}
