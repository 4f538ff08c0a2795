//! Remote evidence merging and representative read selection.

use svprep_lib::discordant::RemoteRegion;
use svprep_lib::junction::{EvidenceKind, JunctionData, RemoteJunction};
use svprep_lib::read::{Orientation, Read};
use svprep_lib::remote::merge_remote;
use svprep_lib::sam::builder::RecordBuilder;

/// A 70M30S read with `high` high-quality bases in its right soft clip.
fn clipped_read(name: &str, high: usize) -> Read {
    let mut quals = vec![37u8; 70];
    quals.extend(std::iter::repeat_n(37u8, high));
    quals.extend(std::iter::repeat_n(10u8, 30 - high));
    Read::from_record(RecordBuilder::new().name(name).cigar("70M30S").quals(&quals).build())
}

#[test]
fn test_top_read_is_first_read_with_most_high_quality_clip_bases() {
    let mut junction = JunctionData::new("chr1", 1_069, Orientation::Forward);
    for (i, high) in [3, 7, 7, 2].into_iter().enumerate() {
        let name = format!("frag{i}");
        junction.add_evidence(&name, &clipped_read(&name, high), EvidenceKind::Junction);
    }
    junction.select_top_read(26);
    assert_eq!(junction.top_read().map(|r| r.id.as_str()), Some("frag1"));
}

/// The `n`th ordering of `0..len`, for `n` in `0..len!`.
fn nth_order(mut n: usize, len: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..len).collect();
    let mut order = Vec::with_capacity(len);
    for remaining in (1..=len).rev() {
        order.push(pool.remove(n % remaining));
        n /= remaining;
    }
    order
}

#[test]
fn test_top_read_choice_follows_arrival_order() {
    let counts = [3, 7, 7, 2];
    for n in 0..24 {
        let order = nth_order(n, counts.len());
        let mut junction = JunctionData::new("chr1", 1_069, Orientation::Forward);
        for &i in &order {
            let name = format!("frag{i}");
            junction.add_evidence(&name, &clipped_read(&name, counts[i]), EvidenceKind::Junction);
        }
        junction.select_top_read(26);

        let top = junction.top_read().unwrap();
        assert_eq!(top.soft_clip_high_quality_bases(false, 26), 7, "order {order:?}");
        let first_seven = order.iter().find(|&&i| counts[i] == 7).unwrap();
        assert_eq!(top.id, format!("frag{first_seven}"), "order {order:?}");
    }
}

#[test]
fn test_remote_regions_bridged_by_a_later_read_coalesce() {
    let region = |start: u32, end: u32| RemoteRegion {
        chromosome: "chr5".to_string(),
        start,
        end,
        orientation: Orientation::Reverse,
        read_count: 1,
    };
    let mut regions = Vec::new();
    merge_remote(&mut regions, region(100, 199));
    merge_remote(&mut regions, region(300, 399));
    assert_eq!(regions.len(), 2);

    merge_remote(&mut regions, region(150, 349));
    assert_eq!(regions, vec![RemoteRegion { read_count: 3, ..region(100, 399) }]);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn orientation(reverse: bool) -> Orientation {
        if reverse { Orientation::Reverse } else { Orientation::Forward }
    }

    fn remote_region() -> impl Strategy<Value = RemoteRegion> {
        (prop::bool::ANY, prop::bool::ANY, 0u32..500, 1u32..80).prop_map(|(chr7, reverse, start, len)| {
            RemoteRegion {
                chromosome: if chr7 { "chr7" } else { "chr5" }.to_string(),
                start,
                end: start + len - 1,
                orientation: orientation(reverse),
                read_count: 1,
            }
        })
    }

    fn remote_junction() -> impl Strategy<Value = RemoteJunction> {
        (prop::bool::ANY, prop::bool::ANY, 0u32..20)
            .prop_map(|(chr7, reverse, position)| {
                RemoteJunction::new(if chr7 { "chr7" } else { "chr5" }, position, orientation(reverse))
            })
    }

    fn merged<T: svprep_lib::remote::RemoteEvidence + Ord>(items: Vec<T>) -> Vec<T> {
        let mut entries = Vec::new();
        for item in items {
            merge_remote(&mut entries, item);
        }
        entries.sort();
        entries
    }

    // Property: merged remote regions depend only on the observations, not their order.
    proptest! {
        #[test]
        fn proptest_remote_region_merge_is_order_independent(
            (items, shuffled) in prop::collection::vec(remote_region(), 1..40)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            let total = items.len() as u32;
            let a = merged(items);
            let b = merged(shuffled);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.iter().map(|r| r.read_count).sum::<u32>(), total);
            for (i, x) in a.iter().enumerate() {
                for y in &a[i + 1..] {
                    let overlapping = x.chromosome == y.chromosome
                        && x.orientation == y.orientation
                        && x.start <= y.end
                        && y.start <= x.end;
                    prop_assert!(!overlapping, "{:?} overlaps {:?}", x, y);
                }
            }
        }
    }

    // Property: remote junctions count each breakend once, in any order.
    proptest! {
        #[test]
        fn proptest_remote_junction_merge_is_order_independent(
            (items, shuffled) in prop::collection::vec(remote_junction(), 1..60)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            let total = items.len() as u32;
            let a = merged(items);
            let b = merged(shuffled);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.iter().map(|j| j.fragment_count).sum::<u32>(), total);
            let key = |j: &RemoteJunction| (j.chromosome.clone(), j.position, j.orientation);
            prop_assert!(a.windows(2).all(|w| key(&w[0]) != key(&w[1])));
        }
    }
}
