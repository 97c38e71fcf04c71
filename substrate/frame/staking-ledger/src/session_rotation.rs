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

//! Manages all era rotation logic based on session increments.
//!
//! The session module tells [`Rotator`] about every session that ends. The running session is
//! tracked in [`CurrentSession`], so a repeated or out-of-order signal is ignored rather than
//! rotating twice.

use crate::{
	eras::Eras, log, slashing, ActiveEra, ActiveEraInfo, Config, CurrentEra,
	CurrentSession, EraPayout, ErasStartSessionIndex, ErasTotalStake, ErasValidatorReward, Event,
	ForceEra, Forcing, Nominators, Pallet, PendingRoles, RoleChange, Validators,
};
use frame_support::traits::{Currency, Get, OnUnbalanced};
use sp_runtime::traits::Zero;
use sp_staking::{EraIndex, SessionIndex};

/// Something that manages the rotation of eras.
pub struct Rotator<T: Config>(core::marker::PhantomData<T>);

impl<T: Config> Rotator<T> {
	/// Infallible. Ends the session `end_index` and starts the next one, starting a new era too if
	/// enough sessions have passed, or the era is being forced.
	pub fn end_session(end_index: SessionIndex) {
		let running = CurrentSession::<T>::get();
		if end_index != running {
			log!(
				warn,
				"ignoring end of session {:?}, the running session is {:?}",
				end_index,
				running
			);
			return
		}

		let starting = end_index.saturating_add(1);
		CurrentSession::<T>::put(starting);

		let active = ActiveEra::<T>::get().unwrap_or_default();
		if Self::should_rotate(&active, starting) {
			Self::rotate_era(active, starting);
		}

		let active_era = Self::active_era();
		Pallet::<T>::deposit_event(Event::<T>::SessionRotated {
			starting_session: starting,
			active_era,
			planned_era: active_era.saturating_add(1),
		});
	}

	/// Index of the era currently running.
	pub fn active_era() -> EraIndex {
		ActiveEra::<T>::get().map(|a| a.index).unwrap_or_default()
	}

	/// Index of the era planned after the active one.
	pub fn planned_era() -> EraIndex {
		CurrentEra::<T>::get().unwrap_or_default()
	}

	fn should_rotate(active: &ActiveEraInfo, starting: SessionIndex) -> bool {
		match ForceEra::<T>::get() {
			Forcing::ForceNone => false,
			Forcing::ForceNew | Forcing::ForceAlways => true,
			Forcing::NotForcing =>
				starting.saturating_sub(active.start_session) >= T::SessionsPerEra::get(),
		}
	}

	/// End the active era and start the planned one at session `starting`.
	fn rotate_era(ending: ActiveEraInfo, starting: SessionIndex) {
		let new_era = ending.index.saturating_add(1);
		log!(
			info,
			"ending era {:?}, starting era {:?} at session {:?}",
			ending.index,
			new_era,
			starting
		);

		Self::end_era(&ending, starting);
		Self::apply_pending_roles(new_era);
		slashing::apply_unapplied_slashes::<T>(new_era);
		Eras::<T>::snapshot(new_era);

		ActiveEra::<T>::put(ActiveEraInfo { index: new_era, start_session: starting });
		ErasStartSessionIndex::<T>::insert(new_era, starting);
		CurrentEra::<T>::put(new_era.saturating_add(1));

		if ForceEra::<T>::get() == Forcing::ForceNew {
			ForceEra::<T>::put(Forcing::NotForcing);
		}

		Self::clean_up_old_era(new_era);
		Pallet::<T>::deposit_event(Event::<T>::EraStarted {
			era_index: new_era,
			start_session: starting,
		});
	}

	/// Record the payout pool of the era that is ending.
	fn end_era(ending: &ActiveEraInfo, starting: SessionIndex) {
		let era_length = starting.saturating_sub(ending.start_session);
		let staked = ErasTotalStake::<T>::get(ending.index);
		let issuance = T::Currency::total_issuance();

		let (validator_payout, remainder) =
			T::EraPayout::era_payout(staked, issuance, era_length);

		ErasValidatorReward::<T>::insert(ending.index, validator_payout);
		if !remainder.is_zero() {
			T::RewardRemainder::on_unbalanced(T::Currency::issue(remainder));
		}

		Pallet::<T>::deposit_event(Event::<T>::EraPaid {
			era_index: ending.index,
			validator_payout,
			remainder,
		});
	}

	/// Make every role change that is due by `era` effective.
	fn apply_pending_roles(era: EraIndex) {
		let mut applied = 0u32;
		let pending = PendingRoles::<T>::iter()
			.filter(|(_, pending)| pending.effective_era <= era)
			.collect::<alloc::vec::Vec<_>>();

		for (stash, pending) in pending {
			PendingRoles::<T>::remove(&stash);
			match pending.change {
				RoleChange::Validate(prefs) => {
					Pallet::<T>::do_remove_nominator(&stash);
					Validators::<T>::insert(&stash, prefs);
				},
				RoleChange::Nominate(nominations) => {
					Pallet::<T>::do_remove_validator(&stash);
					Nominators::<T>::insert(&stash, nominations);
				},
				RoleChange::Chill => {
					Pallet::<T>::do_remove_validator(&stash);
					Pallet::<T>::do_remove_nominator(&stash);
				},
			}
			applied += 1;
		}

		log!(debug, "applied {:?} pending role changes for era {:?}", applied, era);
	}

	/// Remove the era that just fell out of `HistoryDepth`.
	fn clean_up_old_era(new_era: EraIndex) {
		// eras down to `planned - HistoryDepth` must stay payable.
		let planned = new_era.saturating_add(1);
		if let Some(old_era) = planned.checked_sub(T::HistoryDepth::get() + 1) {
			log!(trace, "Removing era information for {:?}", old_era);
			Eras::<T>::clear_era_information(old_era);
		}
	}
}

impl<T: Config> Pallet<T> {
	/// Add reward points to validators of the active era.
	///
	/// Called by the block-authorship or any other module crediting validators.
	pub fn reward_by_ids(validators_points: impl IntoIterator<Item = (T::AccountId, u32)>) {
		Eras::<T>::reward_active_era(validators_points)
	}
}
