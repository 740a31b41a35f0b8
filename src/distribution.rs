//! Share Distribution Module
//!
//! Keeps percent shares consistent as recipients are added or removed and
//! as individual shares are dragged around. All arithmetic is integer-only:
//! a share is a whole percent in `0..=100` and the full set always sums to
//! exactly 100 while at least one recipient exists.
//!
//! ## Rebalancing rules
//! 1. Equal split: `floor(100 / n)` each, first `100 - floor(100/n) * n`
//!    entries (insertion order) get one extra unit.
//! 2. Manual adjust: the touched entry is clamped to `0..=100`, the rest
//!    are rescaled proportionally to their previous weights (round half
//!    up). If the rest previously summed to zero, the remainder is split
//!    among them by the equal-split rule.
//! 3. Rounding residue is settled against an anchor entry chosen by a
//!    fixed rule (see [`anchor_index`]), draining into later entries in
//!    insertion order when the anchor alone cannot absorb a deficit.
//!
//! The result is a pure function of the inputs: identical shares plus an
//! identical adjustment always produce a bit-identical distribution.

use serde::Serialize;

use crate::core_types::Address;
use crate::payout::error::PayoutError;

/// The whole pie, in percent.
pub const FULL_SHARE: u32 = 100;

/// Default cap on the recipient roster. Splitting whole percents across
/// more recipients than this leaves most of them at zero anyway.
pub const MAX_RECIPIENTS: usize = 20;

/// One row of the distribution: which recipient, what cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub index: usize,
    pub share: u8,
}

/// How shares are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionMode {
    /// Every recipient gets the same cut (up to integer remainder).
    #[default]
    Equal,
    /// Shares follow the operator's slider positions.
    Manual,
}

// ============================================================================
// Pure split arithmetic
// ============================================================================

/// Equal split of 100 percent across `n` recipients.
///
/// `floor(100 / n)` for everyone, then the first `100 - even * n` entries
/// (in insertion order) receive one extra unit. Sums to exactly 100 for
/// every `n >= 1`; empty for `n == 0`.
pub fn equal_split(n: usize) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let even = FULL_SHARE / n as u32;
    let remainder = FULL_SHARE - even * n as u32;

    (0..n)
        .map(|i| (even + u32::from((i as u32) < remainder)) as u8)
        .collect()
}

/// Manual rebalance: pin `shares[index]` to `new_value` (clamped to
/// `0..=100`) and redistribute the rest.
///
/// The non-adjusted entries are rescaled proportionally to their previous
/// weights with round-half-up integer arithmetic; if they previously
/// summed to zero the remainder is equal-split among them instead. Any
/// rounding residue is then settled deterministically (see module docs)
/// so the output always sums to exactly 100 with every entry `>= 0`.
///
/// With a single entry the share is pinned at 100 and the call is a
/// no-op; an out-of-range `index` returns the input unchanged.
pub fn rebalance(shares: &[u8], index: usize, new_value: i32) -> Vec<u8> {
    let len = shares.len();
    if len == 0 || index >= len {
        return shares.to_vec();
    }
    if len == 1 {
        return vec![FULL_SHARE as u8];
    }

    let pinned = new_value.clamp(0, FULL_SHARE as i32) as u32;
    let remaining = FULL_SHARE - pinned;

    let mut next = vec![0u8; len];
    next[index] = pinned as u8;

    let others: Vec<usize> = (0..len).filter(|&i| i != index).collect();
    let prev_sum: u32 = others.iter().map(|&i| u32::from(shares[i])).sum();

    if prev_sum > 0 {
        for &i in &others {
            let num = u32::from(shares[i]) * remaining;
            // round half up: floor((2 * num + den) / (2 * den))
            next[i] = ((2 * num + prev_sum) / (2 * prev_sum)) as u8;
        }
    } else {
        let even = remaining / others.len() as u32;
        let extra = remaining - even * others.len() as u32;
        for (k, &i) in others.iter().enumerate() {
            next[i] = (even + u32::from((k as u32) < extra)) as u8;
        }
    }

    settle_residue(&mut next, index);
    next
}

/// Anchor entry for residue settlement: index 1 if it exists and was not
/// the entry just adjusted, otherwise index 0.
fn anchor_index(len: usize, adjusted: usize) -> usize {
    if len > 1 && adjusted != 1 { 1 } else { 0 }
}

/// Restore the sum-to-100 invariant after proportional rounding.
///
/// A surplus goes to the anchor entry. A deficit is drained from the
/// anchor first, then from the remaining non-adjusted entries in
/// insertion order, clamping each at zero. The adjusted entry itself is
/// never touched, so its pinned value survives.
fn settle_residue(shares: &mut [u8], adjusted: usize) {
    let total: i32 = shares.iter().map(|&v| i32::from(v)).sum();
    let mut residue = FULL_SHARE as i32 - total;
    if residue == 0 {
        return;
    }

    let anchor = anchor_index(shares.len(), adjusted);
    if residue > 0 {
        shares[anchor] = (i32::from(shares[anchor]) + residue) as u8;
        return;
    }

    let mut order = vec![anchor];
    order.extend((0..shares.len()).filter(|&i| i != anchor && i != adjusted));
    for i in order {
        if residue == 0 {
            break;
        }
        let take = (-residue).min(i32::from(shares[i]));
        shares[i] -= take as u8;
        residue += take;
    }
}

// ============================================================================
// Allocator (roster + shares)
// ============================================================================

/// Owns the recipient roster and its percent distribution for one session.
///
/// Recipients keep insertion order and must be unique; shares are
/// recomputed on every roster or mode change so the sum-to-100 invariant
/// holds whenever the roster is non-empty. Roster, shares and mode are
/// session-scoped: [`Allocator::reset`] discards everything after a run.
#[derive(Debug, Clone)]
pub struct Allocator {
    recipients: Vec<Address>,
    shares: Vec<u8>,
    mode: DistributionMode,
    max_recipients: usize,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// Create an empty allocator in equal mode with the default roster cap.
    pub fn new() -> Self {
        Self::with_limit(MAX_RECIPIENTS)
    }

    /// Create an empty allocator with a specific roster cap.
    pub fn with_limit(max_recipients: usize) -> Self {
        Self {
            recipients: Vec::new(),
            shares: Vec::new(),
            mode: DistributionMode::Equal,
            max_recipients,
        }
    }

    /// Validate and add a recipient address, recomputing shares.
    ///
    /// Rejects malformed addresses, duplicates (case-insensitive) and
    /// additions past the roster cap.
    pub fn add_recipient(&mut self, raw: &str) -> Result<&Address, PayoutError> {
        let addr: Address = raw.parse()?;

        if self.recipients.contains(&addr) {
            return Err(PayoutError::DuplicateRecipient(addr.short()));
        }
        if self.recipients.len() >= self.max_recipients {
            return Err(PayoutError::RosterFull(self.max_recipients));
        }

        self.recipients.push(addr);
        self.resync_shares();
        Ok(self.recipients.last().expect("just pushed"))
    }

    /// Remove a recipient if present, recomputing shares. Returns whether
    /// anything was removed.
    pub fn remove_recipient(&mut self, addr: &Address) -> bool {
        let before = self.recipients.len();
        self.recipients.retain(|r| r != addr);
        if self.recipients.len() == before {
            return false;
        }
        self.resync_shares();
        true
    }

    /// Switch the distribution mode.
    ///
    /// Switching to equal recomputes the even split. Switching to manual
    /// keeps the current shares as the starting slider positions.
    pub fn set_mode(&mut self, mode: DistributionMode) {
        self.mode = mode;
        if mode == DistributionMode::Equal {
            self.shares = equal_split(self.recipients.len());
        }
    }

    /// Manually pin one recipient's share, rebalancing the rest.
    ///
    /// Implies manual mode. Out-of-range values are clamped, an
    /// out-of-roster index is ignored, and with a single recipient the
    /// share stays pinned at 100.
    pub fn adjust(&mut self, index: usize, new_value: i32) -> &[u8] {
        self.mode = DistributionMode::Manual;
        self.shares = rebalance(&self.shares, index, new_value);
        &self.shares
    }

    /// Discard roster, shares and mode (end of session).
    pub fn reset(&mut self) {
        self.recipients.clear();
        self.shares.clear();
        self.mode = DistributionMode::Equal;
    }

    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    pub fn shares(&self) -> &[u8] {
        &self.shares
    }

    pub fn mode(&self) -> DistributionMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Current distribution as indexed entries.
    pub fn entries(&self) -> Vec<DistributionEntry> {
        self.shares
            .iter()
            .enumerate()
            .map(|(index, &share)| DistributionEntry { index, share })
            .collect()
    }

    /// Recompute shares after a roster change.
    ///
    /// Equal mode always recomputes the even split. Manual mode reseeds
    /// to `[100, 0, ...]` because the previous slider positions no longer
    /// line up with the roster.
    fn resync_shares(&mut self) {
        match self.mode {
            DistributionMode::Equal => self.shares = equal_split(self.recipients.len()),
            DistributionMode::Manual => {
                if self.shares.len() != self.recipients.len() {
                    let mut seeded = vec![0u8; self.recipients.len()];
                    if let Some(first) = seeded.first_mut() {
                        *first = FULL_SHARE as u8;
                    }
                    self.shares = seeded;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(shares: &[u8]) -> u32 {
        shares.iter().map(|&v| u32::from(v)).sum()
    }

    fn addr(n: u8) -> String {
        format!("0x{:040x}", n)
    }

    // ========================================================================
    // equal_split
    // ========================================================================

    #[test]
    fn test_equal_split_single_recipient_gets_everything() {
        assert_eq!(equal_split(1), vec![100]);
    }

    #[test]
    fn test_equal_split_exact_division() {
        assert_eq!(equal_split(2), vec![50, 50]);
        assert_eq!(equal_split(4), vec![25, 25, 25, 25]);
        assert_eq!(equal_split(100), vec![1; 100]);
    }

    #[test]
    fn test_equal_split_remainder_goes_to_first_entries() {
        assert_eq!(equal_split(3), vec![34, 33, 33]);
        assert_eq!(equal_split(6), vec![17, 17, 17, 17, 16, 16]);
        assert_eq!(equal_split(7), vec![15, 15, 14, 14, 14, 14, 14]);
    }

    #[test]
    fn test_equal_split_empty_roster() {
        assert!(equal_split(0).is_empty());
    }

    #[test]
    fn test_equal_split_sums_to_100_for_all_sizes() {
        for n in 1..=120 {
            let shares = equal_split(n);
            assert_eq!(shares.len(), n);
            assert_eq!(sum(&shares), 100, "n = {}", n);
        }
    }

    // ========================================================================
    // rebalance
    // ========================================================================

    #[test]
    fn test_rebalance_proportional_exact() {
        assert_eq!(rebalance(&[50, 50], 0, 30), vec![30, 70]);
        assert_eq!(rebalance(&[34, 33, 33], 0, 50), vec![50, 25, 25]);
    }

    #[test]
    fn test_rebalance_zeroing_an_entry_reflows_everything() {
        assert_eq!(rebalance(&[33, 33, 34], 2, 0), vec![50, 50, 0]);
    }

    #[test]
    fn test_rebalance_zero_others_fall_back_to_equal_split() {
        assert_eq!(rebalance(&[100, 0, 0], 0, 40), vec![40, 30, 30]);
        assert_eq!(rebalance(&[100, 0], 0, 70), vec![70, 30]);
        // remainder of the fallback split lands on the earlier entries
        assert_eq!(rebalance(&[100, 0, 0], 0, 33), vec![33, 34, 33]);
    }

    #[test]
    fn test_rebalance_clamps_out_of_range_values() {
        assert_eq!(rebalance(&[50, 50], 0, 150), vec![100, 0]);
        assert_eq!(rebalance(&[50, 50], 0, -20), vec![0, 100]);
    }

    #[test]
    fn test_rebalance_single_recipient_is_pinned_at_100() {
        assert_eq!(rebalance(&[100], 0, 30), vec![100]);
        assert_eq!(rebalance(&[100], 0, 0), vec![100]);
    }

    #[test]
    fn test_rebalance_out_of_range_index_is_ignored() {
        assert_eq!(rebalance(&[60, 40], 5, 10), vec![60, 40]);
        assert!(rebalance(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_rebalance_surplus_residue_lands_on_anchor() {
        // others round down (2 * 7 / 6 = 2.33 -> 2), leaving 99 total;
        // the missing unit goes to index 1.
        assert_eq!(rebalance(&[2, 2, 2, 94], 3, 93), vec![2, 3, 2, 93]);
    }

    #[test]
    fn test_rebalance_deficit_residue_comes_off_anchor() {
        // both others round up (1 * 5 / 2 = 2.5 -> 3), overshooting to 101;
        // the extra unit comes off index 1.
        assert_eq!(rebalance(&[1, 1, 95], 2, 95), vec![3, 2, 95]);
        // adjusting index 0: anchor is index 1
        assert_eq!(rebalance(&[97, 1, 1], 0, 95), vec![95, 2, 3]);
        // adjusting index 1: anchor falls back to index 0
        assert_eq!(rebalance(&[1, 97, 1], 1, 95), vec![2, 95, 3]);
    }

    #[test]
    fn test_rebalance_deficit_drains_past_exhausted_anchor() {
        // rescale gives [0, 0, 3, 3, 95] (sum 101); the anchor at index 1
        // holds nothing, so the deficit walks on to index 2.
        assert_eq!(rebalance(&[0, 0, 1, 1, 96], 4, 95), vec![0, 0, 2, 3, 95]);
    }

    #[test]
    fn test_rebalance_is_deterministic() {
        let prev = [13, 7, 41, 39];
        let a = rebalance(&prev, 2, 55);
        let b = rebalance(&prev, 2, 55);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rebalance_invariants_across_a_slider_sweep() {
        let mut shares = equal_split(5);
        for value in (0..=100).step_by(7) {
            shares = rebalance(&shares, 3, value);
            assert_eq!(sum(&shares), 100, "value = {}", value);
            assert_eq!(shares[3], value as u8);
        }
    }

    // ========================================================================
    // Allocator
    // ========================================================================

    #[test]
    fn test_allocator_add_recomputes_equal_shares() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        assert_eq!(alloc.shares(), &[100]);
        alloc.add_recipient(&addr(2)).unwrap();
        assert_eq!(alloc.shares(), &[50, 50]);
        alloc.add_recipient(&addr(3)).unwrap();
        assert_eq!(alloc.shares(), &[34, 33, 33]);
    }

    #[test]
    fn test_allocator_rejects_duplicates_case_insensitively() {
        let mut alloc = Allocator::new();
        alloc
            .add_recipient("0xABCDEF0123456789abcdef0123456789abcdef01")
            .unwrap();
        let err = alloc
            .add_recipient("0xabcdef0123456789ABCDEF0123456789ABCDEF01")
            .unwrap_err();
        assert_eq!(err.code(), "duplicate-recipient");
        assert_eq!(alloc.len(), 1);
    }

    #[test]
    fn test_allocator_rejects_malformed_addresses() {
        let mut alloc = Allocator::new();
        let err = alloc.add_recipient("not-an-address").unwrap_err();
        assert_eq!(err.code(), "invalid-address");
        assert!(alloc.is_empty());
        assert!(alloc.shares().is_empty());
    }

    #[test]
    fn test_allocator_enforces_roster_cap() {
        let mut alloc = Allocator::with_limit(2);
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();
        let err = alloc.add_recipient(&addr(3)).unwrap_err();
        assert_eq!(err.code(), "roster-full");
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn test_allocator_remove_recomputes_shares() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();
        alloc.add_recipient(&addr(3)).unwrap();

        let gone: Address = addr(2).parse().unwrap();
        assert!(alloc.remove_recipient(&gone));
        assert_eq!(alloc.shares(), &[50, 50]);
        assert!(!alloc.remove_recipient(&gone));
    }

    #[test]
    fn test_allocator_adjust_implies_manual_mode() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();

        alloc.adjust(0, 80);
        assert_eq!(alloc.mode(), DistributionMode::Manual);
        assert_eq!(alloc.shares(), &[80, 20]);
    }

    #[test]
    fn test_allocator_manual_roster_change_reseeds_first_takes_all() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();
        alloc.adjust(0, 80);

        alloc.add_recipient(&addr(3)).unwrap();
        assert_eq!(alloc.shares(), &[100, 0, 0]);
    }

    #[test]
    fn test_allocator_mode_roundtrip_keeps_then_recomputes() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();
        alloc.add_recipient(&addr(3)).unwrap();

        // entering manual keeps the equal split as the starting point
        alloc.set_mode(DistributionMode::Manual);
        assert_eq!(alloc.shares(), &[34, 33, 33]);

        alloc.adjust(1, 60);
        alloc.set_mode(DistributionMode::Equal);
        assert_eq!(alloc.shares(), &[34, 33, 33]);
    }

    #[test]
    fn test_allocator_reset_discards_session() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.adjust(0, 50);
        alloc.reset();

        assert!(alloc.is_empty());
        assert!(alloc.shares().is_empty());
        assert_eq!(alloc.mode(), DistributionMode::Equal);
    }

    #[test]
    fn test_allocator_entries_are_indexed() {
        let mut alloc = Allocator::new();
        alloc.add_recipient(&addr(1)).unwrap();
        alloc.add_recipient(&addr(2)).unwrap();
        alloc.add_recipient(&addr(3)).unwrap();

        let entries = alloc.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], DistributionEntry { index: 0, share: 34 });
        assert_eq!(entries[2], DistributionEntry { index: 2, share: 33 });
    }

    // ========================================================================
    // Property tests
    // ========================================================================

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn equal_split_always_sums_to_100(n in 1usize..=128) {
                let shares = equal_split(n);
                prop_assert_eq!(shares.len(), n);
                prop_assert_eq!(sum(&shares), 100);
            }

            #[test]
            fn rebalance_holds_both_invariants(
                prev in proptest::collection::vec(0u8..=100, 1..=12),
                index in 0usize..12,
                value in -50i32..200,
            ) {
                let index = index % prev.len();
                let next = rebalance(&prev, index, value);

                prop_assert_eq!(next.len(), prev.len());
                prop_assert_eq!(sum(&next), 100);
                if prev.len() > 1 {
                    prop_assert_eq!(i32::from(next[index]), value.clamp(0, 100));
                }
            }

            #[test]
            fn rebalance_is_bit_identical_on_identical_input(
                prev in proptest::collection::vec(0u8..=100, 1..=12),
                index in 0usize..12,
                value in 0i32..=100,
            ) {
                let index = index % prev.len();
                prop_assert_eq!(
                    rebalance(&prev, index, value),
                    rebalance(&prev, index, value)
                );
            }
        }
    }
}
