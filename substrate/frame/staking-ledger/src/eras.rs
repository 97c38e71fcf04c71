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

//! Era-indexed exposure and reward point accounting.
//!
//! When an era starts, [`Eras::snapshot`] freezes the backing of every declared validator into
//! the `Eras*` storage items. Nothing in here reads the live ledger afterwards: payouts and
//! queries of a past era only ever see the snapshot.
//!
//! The snapshot works without an election:
//!
//! * every nominator's active stake is split equally over those of its targets that are
//!   validators, with the remainder of the division going to the first of them.
//! * validators are ranked by total backing (then by account) and the first
//!   `ValidatorCount` of them, at most `MaxValidatorSet`, form the era's set.
//! * the nominators of a validator are sorted by account and cut into pages of
//!   `MaxExposurePageSize`. The own stake of the validator belongs to page 0.

use crate::{
	log, ActiveEra, BalanceOf, ClaimedRewards, Config, ErasRewardPoints, ErasStakersOverview,
	ErasStakersPaged, ErasStartSessionIndex, ErasTotalStake, ErasValidatorPrefs,
	ErasValidatorReward, IndividualExposure, Ledger, Nominators, PagedExposure, ValidatorCount,
	Validators,
};
use alloc::{collections::btree_map::BTreeMap, vec::Vec};
use frame_support::{defensive, traits::Get};
use sp_runtime::traits::{Saturating, Zero};
use sp_staking::{EraIndex, ExposurePage, Page, PagedExposureMetadata};

/// Wrapper struct for era related information. It is not a pure encapsulation as these storage
/// items can be accessed directly but nevertheless, its recommended to use `Eras` where we
/// can and add more functions to it as needed.
pub struct Eras<T: Config>(core::marker::PhantomData<T>);

impl<T: Config> Eras<T> {
	/// Snapshot the exposures of all declared validators into `era`.
	///
	/// Returns the number of validators exposed in the era.
	pub(crate) fn snapshot(era: EraIndex) -> u32 {
		let mut backing: BTreeMap<T::AccountId, Vec<IndividualExposure<T::AccountId, BalanceOf<T>>>> =
			Validators::<T>::iter_keys().map(|v| (v, Vec::new())).collect();

		for (nominator, nominations) in Nominators::<T>::iter() {
			if nominations.suppressed {
				continue
			}
			let Some(stake) = Ledger::<T>::get(&nominator).map(|l| l.active) else {
				defensive!("nominator without a ledger");
				continue
			};

			let mut targets: Vec<T::AccountId> = Vec::with_capacity(nominations.targets.len());
			for target in nominations.targets.into_iter() {
				if backing.contains_key(&target) && !targets.contains(&target) {
					targets.push(target);
				}
			}
			if targets.is_empty() || stake.is_zero() {
				continue
			}

			let count: BalanceOf<T> = (targets.len() as u32).into();
			let share = stake / count;
			let mut remainder = stake % count;
			for target in targets {
				let value = share.saturating_add(core::mem::take(&mut remainder));
				if value.is_zero() {
					continue
				}
				if let Some(backers) = backing.get_mut(&target) {
					backers.push(IndividualExposure { who: nominator.clone(), value });
				}
			}
		}

		let mut candidates = backing
			.into_iter()
			.filter_map(|(validator, others)| {
				let own = Ledger::<T>::get(&validator).map(|l| l.active)?;
				let total = others.iter().fold(own, |acc, e| acc.saturating_add(e.value));
				(!total.is_zero()).then_some((validator, own, total, others))
			})
			.collect::<Vec<_>>();

		candidates.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
		candidates.truncate(ValidatorCount::<T>::get().min(T::MaxValidatorSet::get()) as usize);

		let exposed = candidates.len() as u32;
		let mut total_stake: BalanceOf<T> = Zero::zero();
		for (validator, own, total, others) in candidates {
			ErasValidatorPrefs::<T>::insert(era, &validator, Validators::<T>::get(&validator));
			Self::store_exposure(era, &validator, own, total, others);
			total_stake = total_stake.saturating_add(total);
		}
		ErasTotalStake::<T>::insert(era, total_stake);

		log!(info, "era {:?} exposures collected for {:?} validators", era, exposed);
		exposed
	}

	/// Store the exposure of `validator` in `era`, paged by `MaxExposurePageSize`.
	pub(crate) fn store_exposure(
		era: EraIndex,
		validator: &T::AccountId,
		own: BalanceOf<T>,
		total: BalanceOf<T>,
		mut others: Vec<IndividualExposure<T::AccountId, BalanceOf<T>>>,
	) {
		others.sort_by(|a, b| a.who.cmp(&b.who));

		let page_size = T::MaxExposurePageSize::get().max(1) as usize;
		let nominator_count = others.len() as u32;
		let pages = others.chunks(page_size).map(|chunk| chunk.to_vec()).collect::<Vec<_>>();
		// a validator backed only by itself still has one page to claim.
		let page_count = (pages.len() as Page).max(1);

		ErasStakersOverview::<T>::insert(
			era,
			validator,
			PagedExposureMetadata { total, own, nominator_count, page_count },
		);

		for (page, others) in pages.into_iter().enumerate() {
			let page_total =
				others.iter().fold(BalanceOf::<T>::zero(), |acc, e| acc.saturating_add(e.value));
			ErasStakersPaged::<T>::insert(
				(era, validator, page as Page),
				ExposurePage { page_total, others },
			);
		}
	}

	/// Returns the paged exposure of `validator` in `era` for `page`, if the page exists.
	///
	/// The own stake of the validator is only reported for the first page.
	pub fn get_paged_exposure(
		era: EraIndex,
		validator: &T::AccountId,
		page: Page,
	) -> Option<PagedExposure<T::AccountId, BalanceOf<T>>> {
		let overview = ErasStakersOverview::<T>::get(era, validator)?;
		if page >= overview.page_count {
			return None
		}

		let exposure_page = ErasStakersPaged::<T>::get((era, validator, page))
			.unwrap_or_else(|| ExposurePage { page_total: Zero::zero(), others: Vec::new() });
		let own = if page == 0 { overview.own } else { Zero::zero() };

		Some(PagedExposure {
			exposure_metadata: PagedExposureMetadata { own, ..overview },
			exposure_page,
		})
	}

	/// Returns the number of exposure pages of `validator` in `era`, zero if not exposed.
	pub fn get_page_count(era: EraIndex, validator: &T::AccountId) -> Page {
		ErasStakersOverview::<T>::get(era, validator)
			.map(|overview| overview.page_count)
			.unwrap_or_default()
	}

	/// Stake of `who` exposed in `era`, either as validator or as nominator of any validator.
	pub fn exposed_stake(era: EraIndex, who: &T::AccountId) -> BalanceOf<T> {
		let own = ErasStakersOverview::<T>::get(era, who)
			.map(|overview| overview.own)
			.unwrap_or_else(Zero::zero);

		ErasStakersPaged::<T>::iter_prefix_values((era,)).fold(own, |acc, page| {
			page.others
				.iter()
				.filter(|e| &e.who == who)
				.fold(acc, |acc, e| acc.saturating_add(e.value))
		})
	}

	/// Returns whether `page` of `validator` in `era` has been paid out.
	pub fn is_rewards_claimed(era: EraIndex, validator: &T::AccountId, page: Page) -> bool {
		ClaimedRewards::<T>::get(era, validator).contains(&page)
	}

	/// Returns the lowest page of `validator` in `era` that has not been paid out yet.
	pub fn get_next_claimable_page(era: EraIndex, validator: &T::AccountId) -> Option<Page> {
		let claimed = ClaimedRewards::<T>::get(era, validator);
		(0..Self::get_page_count(era, validator)).find(|page| !claimed.contains(page))
	}

	/// Creates an entry to track validator reward has been claimed for a given era and page.
	/// Noop if already claimed.
	pub(crate) fn set_rewards_as_claimed(era: EraIndex, validator: &T::AccountId, page: Page) {
		ClaimedRewards::<T>::mutate(era, validator, |pages| {
			if pages.contains(&page) {
				defensive!("page already claimed");
				return
			}
			pages.push(page);
		});
	}

	/// Add reward points to validators of the active era.
	///
	/// Validators that are not part of the active era's exposure set are ignored.
	pub fn reward_active_era(
		validators_points: impl IntoIterator<Item = (T::AccountId, crate::RewardPoint)>,
	) {
		let Some(active_era) = ActiveEra::<T>::get() else { return };

		ErasRewardPoints::<T>::mutate(active_era.index, |era_rewards| {
			for (validator, points) in validators_points.into_iter() {
				if !ErasStakersOverview::<T>::contains_key(active_era.index, &validator) {
					log!(warn, "ignoring points for {:?}, not exposed in the active era", validator);
					continue
				}

				if let Some(individual) = era_rewards.individual.get_mut(&validator) {
					*individual = individual.saturating_add(points);
				} else if era_rewards.individual.try_insert(validator, points).is_err() {
					defensive!("more exposed validators than `MaxValidatorSet`");
					continue
				}
				era_rewards.total = era_rewards.total.saturating_add(points);
			}
		});
	}

	/// Remove everything that is kept for `era`.
	pub(crate) fn clear_era_information(era: EraIndex) {
		let mut cursor = ErasStakersOverview::<T>::clear_prefix(era, u32::MAX, None);
		debug_assert!(cursor.maybe_cursor.is_none());
		cursor = ErasStakersPaged::<T>::clear_prefix((era,), u32::MAX, None);
		debug_assert!(cursor.maybe_cursor.is_none());
		cursor = ErasValidatorPrefs::<T>::clear_prefix(era, u32::MAX, None);
		debug_assert!(cursor.maybe_cursor.is_none());
		cursor = ClaimedRewards::<T>::clear_prefix(era, u32::MAX, None);
		debug_assert!(cursor.maybe_cursor.is_none());

		ErasValidatorReward::<T>::remove(era);
		ErasRewardPoints::<T>::remove(era);
		ErasTotalStake::<T>::remove(era);
		ErasStartSessionIndex::<T>::remove(era);
	}
}
