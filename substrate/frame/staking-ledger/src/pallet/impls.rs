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

//! Implementations for the Staking Ledger pallet.

use crate::{
	eras::Eras, log, ActiveEra, BalanceOf, CanceledSlashPayout, ClaimedRewards, Config,
	CurrentEra, Error, ErasRewardPoints, ErasStakersOverview, ErasStakersPaged,
	ErasStartSessionIndex, ErasTotalStake, ErasValidatorPrefs, ErasValidatorReward, Event,
	ForceEra, Forcing, IndividualExposure, MinCommission, MinNominatorBond, MinValidatorBond,
	Nominations, Nominators, Pallet, PendingRole, PendingRoles, PositiveImbalanceOf,
	RewardDestination, RoleChange, StakingConstants, StakingLedger, StakingStatus,
	ValidatorCount, ValidatorPrefs, Validators, WeightInfo,
};
use alloc::vec::Vec;
use frame_support::{
	dispatch::WithPostDispatchInfo,
	ensure,
	pallet_prelude::*,
	traits::{Currency, Defensive, Get, Imbalance, OnUnbalanced},
};
use sp_runtime::{
	traits::{CheckedSub, Saturating, Zero},
	Perbill,
};
use sp_staking::{EraIndex, ExposurePage, Page, PagedExposureMetadata, SessionIndex};

#[cfg(any(test, feature = "try-runtime"))]
use frame_system::pallet_prelude::BlockNumberFor;

impl<T: Config> Pallet<T> {
	/// The role `stash` will have once its pending change applies, `None` if it will be idle.
	pub(crate) fn intended_role(stash: &T::AccountId) -> Option<RoleChange<T>> {
		match PendingRoles::<T>::get(stash) {
			Some(PendingRole { change: RoleChange::Chill, .. }) => None,
			Some(pending) => Some(pending.change),
			None =>
				if let Some(nominations) = Nominators::<T>::get(stash) {
					Some(RoleChange::Nominate(nominations))
				} else if Validators::<T>::contains_key(stash) {
					Some(RoleChange::Validate(Validators::<T>::get(stash)))
				} else {
					None
				},
		}
	}

	pub(crate) fn intended_prefs(stash: &T::AccountId) -> Option<ValidatorPrefs> {
		match Self::intended_role(stash) {
			Some(RoleChange::Validate(prefs)) => Some(prefs),
			_ => None,
		}
	}

	pub(crate) fn intended_nominations(stash: &T::AccountId) -> Option<Nominations<T>> {
		match Self::intended_role(stash) {
			Some(RoleChange::Nominate(nominations)) => Some(nominations),
			_ => None,
		}
	}

	/// The minimum active bond of the role `stash` intends to have, `None` if idle.
	pub(crate) fn intended_min_bond(stash: &T::AccountId) -> Option<BalanceOf<T>> {
		match Self::intended_role(stash) {
			Some(RoleChange::Validate(_)) => Some(MinValidatorBond::<T>::get()),
			Some(RoleChange::Nominate(_)) => Some(MinNominatorBond::<T>::get()),
			_ => None,
		}
	}

	/// Record `change` for `stash`, replacing any earlier pending change.
	///
	/// Returns the era it becomes effective in.
	pub(crate) fn queue_role(stash: &T::AccountId, change: RoleChange<T>) -> EraIndex {
		let effective_era = Self::active_era().saturating_add(1);
		PendingRoles::<T>::insert(stash, PendingRole { change, effective_era });
		effective_era
	}

	pub(crate) fn do_chill(stash: &T::AccountId) -> DispatchResult {
		ensure!(Self::intended_role(stash).is_some(), Error::<T>::NotStaking);

		let effective_era = Self::queue_role(stash, RoleChange::Chill);
		Self::deposit_event(Event::<T>::Chilled { stash: stash.clone(), effective_era });
		Ok(())
	}

	/// Removes `stash` from the effective validators. Returns whether it was one.
	pub(crate) fn do_remove_validator(stash: &T::AccountId) -> bool {
		if Validators::<T>::contains_key(stash) {
			Validators::<T>::remove(stash);
			true
		} else {
			false
		}
	}

	/// Removes `stash` from the effective nominators. Returns whether it was one.
	pub(crate) fn do_remove_nominator(stash: &T::AccountId) -> bool {
		if Nominators::<T>::contains_key(stash) {
			Nominators::<T>::remove(stash);
			true
		} else {
			false
		}
	}

	/// Remove all associated data of a stash account from the staking system.
	///
	/// This is called:
	/// - after a `withdraw_unbonded()` call that frees all of a stash's bonded balance.
	/// - through `reap_stash()` if the balance has fallen to zero (through slashing).
	pub(crate) fn kill_stash(stash: &T::AccountId, num_slashing_spans: u32) -> DispatchResult {
		StakingLedger::<T>::kill(stash, num_slashing_spans)?;

		Self::do_remove_validator(stash);
		Self::do_remove_nominator(stash);

		Self::deposit_event(Event::<T>::StakerRemoved { stash: stash.clone() });
		Ok(())
	}

	pub(crate) fn do_bond_extra(
		stash: &T::AccountId,
		max_additional: BalanceOf<T>,
	) -> DispatchResult {
		let mut ledger = StakingLedger::<T>::get(stash).ok_or(Error::<T>::NotBonded)?;

		let stash_balance = T::Currency::free_balance(stash);
		if let Some(extra) = stash_balance.checked_sub(&ledger.total) {
			let extra = extra.min(max_additional);
			ledger.total = ledger.total.saturating_add(extra);
			ledger.active = ledger.active.saturating_add(extra);
			// Last check: the new active amount of ledger must be more than ED.
			ensure!(
				ledger.active >= T::Currency::minimum_balance(),
				Error::<T>::InsufficientBond
			);

			ledger.update()?;
			Self::deposit_event(Event::<T>::Bonded { stash: stash.clone(), amount: extra });
		}

		Ok(())
	}

	pub(crate) fn do_unbond(stash: &T::AccountId, value: BalanceOf<T>) -> DispatchResult {
		let mut ledger = StakingLedger::<T>::get(stash).ok_or(Error::<T>::NotBonded)?;

		let current_era = Self::current_era();
		let era = current_era.saturating_add(T::BondingDuration::get());

		let needs_new_chunk = ledger.unlocking.last().map_or(true, |chunk| chunk.era != era);
		if needs_new_chunk && ledger.unlocking.len() >= T::MaxUnlockingChunks::get() as usize {
			// try to free up a slot with the chunks that already matured.
			let total_before = ledger.total;
			ledger = ledger.consolidate_unlocked(current_era);
			let withdrawn = total_before.saturating_sub(ledger.total);
			if !withdrawn.is_zero() {
				log!(debug, "withdrew {:?} of {:?} to make room for unbonding", withdrawn, stash);
				Self::deposit_event(Event::<T>::Withdrawn {
					stash: stash.clone(),
					amount: withdrawn,
				});
			}
		}

		let min_active_bond = Self::intended_min_bond(stash).unwrap_or_else(Zero::zero);
		let value =
			ledger.unbond(value, era, T::Currency::minimum_balance(), min_active_bond)?;

		ledger.update()?;
		if !value.is_zero() {
			Self::deposit_event(Event::<T>::Unbonded { stash: stash.clone(), amount: value });
		}

		Ok(())
	}

	/// Withdraw the matured chunks of `stash`, removing the stash if nothing is left at stake.
	///
	/// Returns whether the stash was killed.
	pub(crate) fn do_withdraw_unbonded(
		stash: &T::AccountId,
		num_slashing_spans: u32,
	) -> Result<bool, DispatchError> {
		let ledger = StakingLedger::<T>::get(stash).ok_or(Error::<T>::NotBonded)?;
		let old_total = ledger.total;

		let ledger = ledger.consolidate_unlocked(Self::current_era());
		let new_total = ledger.total;

		let stash_killed = ledger.unlocking.is_empty() &&
			ledger.active < T::Currency::minimum_balance() &&
			Self::intended_role(stash).is_none();

		if stash_killed {
			// This account must have called `unbond()` with some value that caused the active
			// portion to fall below existential deposit + will have no more unlocking chunks
			// left. We can now safely remove all staking-related information.
			Self::kill_stash(stash, num_slashing_spans)?;
		} else if new_total < old_total {
			// This was the consequence of a partial unbond. just update the ledger and move on.
			ledger.update()?;
		}

		let released = if stash_killed { old_total } else { old_total.saturating_sub(new_total) };
		if !released.is_zero() {
			Self::deposit_event(Event::<T>::Withdrawn { stash: stash.clone(), amount: released });
		}

		Ok(stash_killed)
	}

	pub(crate) fn do_set_reward_destination(
		stash: &T::AccountId,
		payee: RewardDestination<T::AccountId>,
	) -> DispatchResult {
		StakingLedger::<T>::set_payee(stash, payee.clone())?;
		Self::deposit_event(Event::<T>::PayeeSet { stash: stash.clone(), payee });
		Ok(())
	}

	pub(crate) fn set_force_era(mode: Forcing) {
		log!(info, "Setting force era mode {:?}.", mode);
		ForceEra::<T>::put(mode);
		Self::deposit_event(Event::<T>::ForceEra { mode });
	}

	pub(crate) fn do_payout_stakers_by_page(
		validator_stash: T::AccountId,
		era: EraIndex,
		page: Page,
	) -> DispatchResultWithPostInfo {
		// Validate input data
		let current_era = Self::current_era();
		let history_depth = T::HistoryDepth::get();
		ensure!(
			era <= current_era && era >= current_era.saturating_sub(history_depth),
			Error::<T>::EraOutOfHistory.with_weight(T::WeightInfo::payout_stakers_by_page(0))
		);

		// Note: if era has no reward to be claimed, era may be future. better not to update
		// `ClaimedRewards` in this case.
		let era_payout = ErasValidatorReward::<T>::get(era).ok_or_else(|| {
			Error::<T>::InvalidEraToReward.with_weight(T::WeightInfo::payout_stakers_by_page(0))
		})?;

		let exposure =
			Eras::<T>::get_paged_exposure(era, &validator_stash, page).ok_or_else(|| {
				Error::<T>::InvalidPage.with_weight(T::WeightInfo::payout_stakers_by_page(0))
			})?;

		ensure!(
			!Eras::<T>::is_rewards_claimed(era, &validator_stash, page),
			Error::<T>::AlreadyClaimed.with_weight(T::WeightInfo::payout_stakers_by_page(0))
		);

		// Input data seems good, no errors allowed after this point
		Eras::<T>::set_rewards_as_claimed(era, &validator_stash, page);

		let era_reward_points = ErasRewardPoints::<T>::get(era);
		let total_reward_points = era_reward_points.total;
		let validator_reward_points =
			era_reward_points.individual.get(&validator_stash).copied().unwrap_or_else(Zero::zero);

		// Nothing to do if they have no reward points.
		if validator_reward_points.is_zero() {
			return Ok(Some(T::WeightInfo::payout_stakers_by_page(0)).into())
		}

		// This is the fraction of the total reward that the validator and the
		// nominators will get.
		let validator_total_reward_part =
			Perbill::from_rational(validator_reward_points, total_reward_points);

		// This is how much validator + nominators are entitled to.
		let validator_total_payout = validator_total_reward_part * era_payout;

		let validator_commission = ErasValidatorPrefs::<T>::get(era, &validator_stash).commission;
		// total commission validator takes across all nominator pages
		let validator_total_commission_payout = validator_commission * validator_total_payout;

		let validator_leftover_payout =
			validator_total_payout.saturating_sub(validator_total_commission_payout);
		// Now let's calculate how this is split to the validator.
		let validator_exposure_part = Perbill::from_rational(exposure.own(), exposure.total());
		let validator_staking_payout = validator_exposure_part * validator_leftover_payout;
		let page_stake_part = Perbill::from_rational(exposure.page_total(), exposure.total());
		// validator commission is paid out in fraction across pages proportional to the page stake.
		let validator_commission_payout = page_stake_part * validator_total_commission_payout;

		Self::deposit_event(Event::<T>::PayoutStarted {
			era_index: era,
			validator_stash: validator_stash.clone(),
			page,
			next: Eras::<T>::get_next_claimable_page(era, &validator_stash),
		});

		let mut total_imbalance = PositiveImbalanceOf::<T>::zero();
		// We can now make total validator payout:
		if let Some((imbalance, dest)) = Self::make_payout(
			&validator_stash,
			validator_staking_payout.saturating_add(validator_commission_payout),
		) {
			Self::deposit_event(Event::<T>::Rewarded {
				stash: validator_stash.clone(),
				dest,
				amount: imbalance.peek(),
			});
			total_imbalance.subsume(imbalance);
		}

		// Track the number of payout ops to nominators. Note:
		// `WeightInfo::payout_stakers_by_page` always assumes at least a validator is paid
		// out, so we do not need to count their payout op.
		let mut nominator_payout_count: u32 = 0;

		// Lets now calculate how this is split to the nominators.
		// Reward only the clipped exposures. Note this is not necessarily sorted.
		for nominator in exposure.others().iter() {
			let nominator_exposure_part = Perbill::from_rational(nominator.value, exposure.total());

			let nominator_reward: BalanceOf<T> =
				nominator_exposure_part * validator_leftover_payout;
			// We can now make nominator payout:
			if let Some((imbalance, dest)) = Self::make_payout(&nominator.who, nominator_reward) {
				// Note: this logic does not count payouts for `RewardDestination::None`.
				nominator_payout_count += 1;
				let e = Event::<T>::Rewarded {
					stash: nominator.who.clone(),
					dest,
					amount: imbalance.peek(),
				};
				Self::deposit_event(e);
				total_imbalance.subsume(imbalance);
			}
		}

		T::Reward::on_unbalanced(total_imbalance);
		debug_assert!(nominator_payout_count <= T::MaxExposurePageSize::get());

		Ok(Some(T::WeightInfo::payout_stakers_by_page(nominator_payout_count)).into())
	}

	/// Actually make a payment to a staker. This uses the currency's reward function
	/// to pay the right payee for the given staker account.
	fn make_payout(
		stash: &T::AccountId,
		amount: BalanceOf<T>,
	) -> Option<(PositiveImbalanceOf<T>, RewardDestination<T::AccountId>)> {
		// noop if amount is zero
		if amount.is_zero() {
			return None
		}
		let dest = StakingLedger::<T>::reward_destination(stash)?;

		let maybe_imbalance = match dest {
			RewardDestination::Stash => T::Currency::deposit_into_existing(stash, amount).ok(),
			RewardDestination::Staked => StakingLedger::<T>::get(stash).and_then(|mut ledger| {
				let imbalance = T::Currency::deposit_into_existing(stash, amount).ok()?;
				ledger.active = ledger.active.saturating_add(amount);
				ledger.total = ledger.total.saturating_add(amount);

				// fallible only if the ledger is gone, which was just read.
				let _ = ledger.update().defensive();
				Some(imbalance)
			}),
			RewardDestination::Account(ref dest_account) =>
				Some(T::Currency::deposit_creating(dest_account, amount)),
			RewardDestination::None => None,
		};

		maybe_imbalance.map(|imbalance| (imbalance, dest))
	}

	/// The ledger of `stash`, if bonded.
	pub fn ledger(stash: &T::AccountId) -> Option<StakingLedger<T>> {
		StakingLedger::<T>::get(stash)
	}

	/// The status of `stash`, accounting for role changes that are still pending.
	pub fn status(stash: &T::AccountId) -> StakingStatus<T::AccountId> {
		if !StakingLedger::<T>::is_bonded(stash) {
			return StakingStatus::NotStaking
		}

		match Self::intended_role(stash) {
			Some(RoleChange::Validate(_)) => StakingStatus::Validator,
			Some(RoleChange::Nominate(nominations)) =>
				StakingStatus::Nominator(nominations.targets.into_inner()),
			_ => StakingStatus::Idle,
		}
	}

	/// The active stake of `stash`, zero if not bonded.
	pub fn bonded_stake(stash: &T::AccountId) -> BalanceOf<T> {
		StakingLedger::<T>::get(stash).map(|l| l.active).unwrap_or_else(Zero::zero)
	}

	/// The effective nominations of `stash`.
	pub fn nominations(stash: &T::AccountId) -> Option<Nominations<T>> {
		Nominators::<T>::get(stash)
	}

	/// The effective validator preferences of `stash`.
	pub fn validators(stash: &T::AccountId) -> Option<ValidatorPrefs> {
		Validators::<T>::contains_key(stash).then(|| Validators::<T>::get(stash))
	}

	pub fn pending_role(stash: &T::AccountId) -> Option<PendingRole<T>> {
		PendingRoles::<T>::get(stash)
	}

	pub fn payee(stash: &T::AccountId) -> Option<RewardDestination<T::AccountId>> {
		StakingLedger::<T>::reward_destination(stash)
	}

	/// Index of the era currently running.
	pub fn active_era() -> EraIndex {
		ActiveEra::<T>::get().map(|a| a.index).unwrap_or_default()
	}

	/// Index of the planned era, always the one after [`Self::active_era`].
	pub fn current_era() -> EraIndex {
		CurrentEra::<T>::get().unwrap_or_default()
	}

	pub fn eras_start_session_index(era: EraIndex) -> Option<SessionIndex> {
		ErasStartSessionIndex::<T>::get(era)
	}

	pub fn eras_total_stake(era: EraIndex) -> BalanceOf<T> {
		ErasTotalStake::<T>::get(era)
	}

	/// The validator payout pool of `era`. `None` until the era has ended.
	pub fn eras_validator_reward(era: EraIndex) -> Option<BalanceOf<T>> {
		ErasValidatorReward::<T>::get(era)
	}

	pub fn eras_reward_points(era: EraIndex) -> crate::EraRewardPoints<T> {
		ErasRewardPoints::<T>::get(era)
	}

	pub fn eras_stakers_overview(
		era: EraIndex,
		validator: &T::AccountId,
	) -> Option<PagedExposureMetadata<BalanceOf<T>>> {
		ErasStakersOverview::<T>::get(era, validator)
	}

	pub fn eras_stakers_page(
		era: EraIndex,
		validator: &T::AccountId,
		page: Page,
	) -> Option<ExposurePage<T::AccountId, BalanceOf<T>>> {
		ErasStakersPaged::<T>::get((era, validator, page))
	}

	/// The `index`th nominator exposure on `page` of `validator` in `era`.
	pub fn eras_stakers_page_entry(
		era: EraIndex,
		validator: &T::AccountId,
		page: Page,
		index: u32,
	) -> Option<IndividualExposure<T::AccountId, BalanceOf<T>>> {
		ErasStakersPaged::<T>::get((era, validator, page))
			.and_then(|page| page.others.get(index as usize).cloned())
	}

	pub fn eras_stakers_page_count(era: EraIndex, validator: &T::AccountId) -> Page {
		Eras::<T>::get_page_count(era, validator)
	}

	pub fn eras_validator_prefs(era: EraIndex, validator: &T::AccountId) -> ValidatorPrefs {
		ErasValidatorPrefs::<T>::get(era, validator)
	}

	pub fn claimed_pages(era: EraIndex, validator: &T::AccountId) -> Vec<Page> {
		ClaimedRewards::<T>::get(era, validator)
	}

	pub fn exposed_stake_in_era(era: EraIndex, who: &T::AccountId) -> BalanceOf<T> {
		Eras::<T>::exposed_stake(era, who)
	}

	/// The amount `stash` could withdraw right now.
	pub fn withdrawable(stash: &T::AccountId) -> BalanceOf<T> {
		StakingLedger::<T>::get(stash)
			.map(|l| l.unlocked(Self::current_era()))
			.unwrap_or_else(Zero::zero)
	}

	pub fn canceled_slash_payout() -> BalanceOf<T> {
		CanceledSlashPayout::<T>::get()
	}

	pub fn constants() -> StakingConstants {
		StakingConstants::of::<T>()
	}

	pub fn min_nominator_bond() -> BalanceOf<T> {
		MinNominatorBond::<T>::get()
	}

	pub fn min_validator_bond() -> BalanceOf<T> {
		MinValidatorBond::<T>::get()
	}

	pub fn min_commission() -> Perbill {
		MinCommission::<T>::get()
	}

	pub fn validator_count() -> u32 {
		ValidatorCount::<T>::get()
	}
}

#[cfg(any(test, feature = "try-runtime"))]
impl<T: Config> Pallet<T> {
	pub(crate) fn do_try_state(_: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
		Self::check_ledgers()?;
		Self::check_roles()?;
		Self::check_eras()
	}

	/// Invariants:
	/// * `active + unlocking == total` for every ledger.
	/// * every ledger has a payee and vice versa.
	fn check_ledgers() -> Result<(), sp_runtime::TryRuntimeError> {
		for (stash, ledger) in crate::Ledger::<T>::iter() {
			let unlocking = ledger
				.unlocking
				.iter()
				.fold(BalanceOf::<T>::zero(), |acc, c| acc.saturating_add(c.value));
			ensure!(
				ledger.active.saturating_add(unlocking) == ledger.total,
				"ledger total does not match active + unlocking"
			);
			ensure!(ledger.stash == stash, "ledger keyed by the wrong stash");
			ensure!(crate::Payee::<T>::contains_key(&stash), "bonded stash without payee");
		}

		ensure!(
			crate::Payee::<T>::iter_keys().all(|stash| StakingLedger::<T>::is_bonded(&stash)),
			"payee without ledger"
		);
		Ok(())
	}

	/// Invariants:
	/// * effective validators and nominators are disjoint.
	/// * every effective or pending role belongs to a bonded stash.
	/// * the counters of the counted maps are correct.
	fn check_roles() -> Result<(), sp_runtime::TryRuntimeError> {
		for stash in Validators::<T>::iter_keys() {
			ensure!(!Nominators::<T>::contains_key(&stash), "stash both validator and nominator");
			ensure!(StakingLedger::<T>::is_bonded(&stash), "validator without ledger");
		}
		for stash in Nominators::<T>::iter_keys() {
			ensure!(StakingLedger::<T>::is_bonded(&stash), "nominator without ledger");
		}
		for (stash, pending) in PendingRoles::<T>::iter() {
			ensure!(StakingLedger::<T>::is_bonded(&stash), "pending role without ledger");
			ensure!(pending.effective_era > Self::active_era(), "stale pending role");
		}

		ensure!(
			Validators::<T>::count() as usize == Validators::<T>::iter_keys().count(),
			"validator count mismatch"
		);
		ensure!(
			Nominators::<T>::count() as usize == Nominators::<T>::iter_keys().count(),
			"nominator count mismatch"
		);
		Ok(())
	}

	/// Invariants:
	/// * the planned era is the one after the active era.
	/// * reward points of the active era add up to their total.
	fn check_eras() -> Result<(), sp_runtime::TryRuntimeError> {
		let Some(active) = ActiveEra::<T>::get() else { return Ok(()) };
		ensure!(Self::current_era() == active.index + 1, "planned era is not after active era");

		let points = ErasRewardPoints::<T>::get(active.index);
		let sum = points.individual.values().fold(0u32, |acc, p| acc.saturating_add(*p));
		ensure!(sum == points.total, "reward points total mismatch");
		Ok(())
	}
}
