// This file is part of Substrate.

// Copyright (C) Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Enactment of slashes computed elsewhere.
//!
//! The magnitude of a slash is decided by the slashing module, which hands it over as an
//! [`UnappliedSlash`]. With a zero `SlashDeferDuration` it is applied right away. Otherwise it
//! waits in [`UnappliedSlashes`] under the era it is due in, and governance may still cancel it
//! through [`Pallet::cancel_deferred_slash`] until then.
//!
//! Applying a slash reduces the ledgers of the validator and its nominators, slashes the
//! currency, pays the reporter out of the slashed amount, and counts a slashing span for every
//! staker that actually lost funds. Those spans must be acknowledged when a stash is removed.

use crate::{
	log, ActiveEra, BalanceOf, Config, Error, Event, NegativeImbalanceOf, Pallet, StakingLedger,
	UnappliedSlash, UnappliedSlashes, SlashingSpans,
};
use alloc::vec::Vec;
use frame_support::{
	ensure,
	traits::{Currency, Defensive, Get, Imbalance, OnUnbalanced},
};
use sp_runtime::{
	traits::{Saturating, Zero},
	DispatchResult,
};
use sp_staking::EraIndex;

impl<T: Config> Pallet<T> {
	/// Handle a slash for an offence committed in `slash_era`.
	///
	/// Reports about eras older than `BondingDuration` are discarded, the offenders may have
	/// already withdrawn their funds.
	pub fn on_offence_slash(slash_era: EraIndex, slash: UnappliedSlash<T>) {
		let active_era = ActiveEra::<T>::get().map(|a| a.index).unwrap_or_default();

		if slash_era < active_era.saturating_sub(T::BondingDuration::get()) {
			log!(warn, "discarding slash for era {:?}, out of bonding period", slash_era);
			Self::deposit_event(Event::<T>::OldSlashingReportDiscarded { slash_era });
			return
		}

		let defer = T::SlashDeferDuration::get();
		if defer.is_zero() {
			apply_slash::<T>(slash, slash_era);
		} else {
			let apply_at = active_era.saturating_add(defer);
			Self::deposit_event(Event::<T>::SlashReported {
				validator: slash.validator.clone(),
				slash_era,
				apply_at,
			});
			UnappliedSlashes::<T>::mutate(apply_at, |for_later| for_later.push((slash_era, slash)));
		}
	}

	/// Number of slashing spans recorded for `stash`.
	pub fn slashing_spans(stash: &T::AccountId) -> u32 {
		SlashingSpans::<T>::get(stash)
	}
}

/// Apply all slashes that are due in `era`.
pub(crate) fn apply_unapplied_slashes<T: Config>(era: EraIndex) {
	let era_slashes = UnappliedSlashes::<T>::take(era);
	if era_slashes.is_empty() {
		return
	}
	log!(debug, "found {} slashes scheduled to be executed in era {:?}", era_slashes.len(), era);

	for (slash_era, slash) in era_slashes {
		apply_slash::<T>(slash, slash_era);
	}
}

/// Cancel the deferred slashes at `slash_indices` of `era`, recording their payout as cancelled.
pub(crate) fn cancel_deferred_slashes<T: Config>(
	era: EraIndex,
	slash_indices: Vec<u32>,
) -> DispatchResult {
	ensure!(!slash_indices.is_empty(), Error::<T>::EmptyTargets);
	ensure!(is_sorted_and_unique(&slash_indices), Error::<T>::NotSortedAndUnique);

	let mut unapplied = UnappliedSlashes::<T>::get(era);
	let last_item = slash_indices[slash_indices.len() - 1];
	ensure!((last_item as usize) < unapplied.len(), Error::<T>::InvalidSlashIndex);

	let mut canceled_payout: BalanceOf<T> = Zero::zero();
	for removal_index in slash_indices.into_iter().rev() {
		let (_, slash) = unapplied.remove(removal_index as usize);
		canceled_payout = canceled_payout.saturating_add(slash.payout);
		Pallet::<T>::deposit_event(Event::<T>::SlashCancelled {
			slash_era: era,
			validator: slash.validator,
		});
	}

	crate::CanceledSlashPayout::<T>::mutate(|p| *p = p.saturating_add(canceled_payout));
	UnappliedSlashes::<T>::insert(era, &unapplied);
	Ok(())
}

/// Apply a previously-unapplied slash.
fn apply_slash<T: Config>(slash: UnappliedSlash<T>, slash_era: EraIndex) {
	let mut slashed_imbalance = NegativeImbalanceOf::<T>::zero();

	do_slash::<T>(&slash.validator, slash.own, &mut slashed_imbalance, slash_era);
	for (nominator, amount) in &slash.others {
		do_slash::<T>(nominator, *amount, &mut slashed_imbalance, slash_era);
	}

	pay_reporter::<T>(slash.payout, slashed_imbalance, slash.reporter);
}

/// Slash the stake of `stash` by up to `value`.
fn do_slash<T: Config>(
	stash: &T::AccountId,
	value: BalanceOf<T>,
	slashed_imbalance: &mut NegativeImbalanceOf<T>,
	slash_era: EraIndex,
) {
	let Some(mut ledger) = StakingLedger::<T>::get(stash) else {
		// nothing to slash, the stash is gone.
		return
	};

	let value = ledger.slash(value, T::Currency::minimum_balance(), slash_era);
	if value.is_zero() {
		return
	}

	let _ = ledger.update().defensive();

	let (imbalance, missing) = T::Currency::slash(stash, value);
	slashed_imbalance.subsume(imbalance);
	if !missing.is_zero() {
		log!(warn, "{:?} could not cover a slash of {:?}, missing {:?}", stash, value, missing);
	}

	SlashingSpans::<T>::mutate(stash, |spans| *spans = spans.saturating_add(1));
	Pallet::<T>::deposit_event(Event::<T>::Slashed {
		staker: stash.clone(),
		amount: value.saturating_sub(missing),
	});
}

/// Pay `reward_payout` out of the slashed funds to the reporter, the rest goes to
/// `Config::Slash`.
fn pay_reporter<T: Config>(
	reward_payout: BalanceOf<T>,
	slashed_imbalance: NegativeImbalanceOf<T>,
	reporter: Option<T::AccountId>,
) {
	let Some(reporter) = reporter else {
		T::Slash::on_unbalanced(slashed_imbalance);
		return
	};

	// take rewards out of the slashed imbalance.
	let reward_payout = reward_payout.min(slashed_imbalance.peek());
	let (reward, rest) = slashed_imbalance.split(reward_payout);
	T::Currency::resolve_creating(&reporter, reward);
	T::Slash::on_unbalanced(rest);
}

fn is_sorted_and_unique(list: &[u32]) -> bool {
	list.windows(2).all(|w| w[0] < w[1])
}
