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

//! A Ledger implementation for stakers.
//!
//! A [`StakingLedger`] encapsulates all the state and logic related to the stake of bonded
//! stakers, namely, it handles the following storage items:
//! * [`Ledger`]: contains all the staking ledger data of a stash.
//! * [`Payee`]: contains the reward destination of a stash.
//!
//! The staking lock of the stash is kept in sync with `ledger.total` on every write. All the
//! reads and mutations to those storage items *MUST* be performed through the methods exposed by
//! this module.

use crate::{
	log, BalanceOf, Config, Error, Ledger, Payee, PendingRoles, RewardDestination, SlashingSpans,
	STAKING_ID,
};
use alloc::vec::Vec;
use codec::{Decode, DecodeWithMemTracking, Encode, HasCompact, MaxEncodedLen};
use frame_support::{
	defensive,
	traits::{Defensive, DefensiveSaturating, Get, LockableCurrency, WithdrawReasons},
	BoundedVec, CloneNoBound, EqNoBound, PartialEqNoBound, RuntimeDebugNoBound,
};
use scale_info::TypeInfo;
use sp_runtime::{
	traits::{Saturating, Zero},
	DispatchResult, Perquintill, Rounding, RuntimeDebug,
};
use sp_staking::EraIndex;

/// Just a Balance/BlockNumber tuple to encode when a chunk of funds will be unlocked.
#[derive(
	PartialEq,
	Eq,
	Clone,
	Encode,
	Decode,
	DecodeWithMemTracking,
	RuntimeDebug,
	TypeInfo,
	MaxEncodedLen,
)]
pub struct UnlockChunk<Balance: HasCompact + MaxEncodedLen> {
	/// Amount of funds to be unlocked.
	#[codec(compact)]
	pub value: Balance,
	/// Era number at which point it'll be unlocked.
	#[codec(compact)]
	pub era: EraIndex,
}

/// The ledger of a (bonded) stash.
#[derive(
	PartialEqNoBound,
	EqNoBound,
	CloneNoBound,
	Encode,
	Decode,
	RuntimeDebugNoBound,
	TypeInfo,
	MaxEncodedLen,
)]
#[scale_info(skip_type_params(T))]
pub struct StakingLedger<T: Config> {
	/// The stash account whose balance is actually locked and at stake.
	pub stash: T::AccountId,

	/// The total amount of the stash's balance that we are currently accounting for.
	/// It's just `active` plus all the `unlocking` balances.
	#[codec(compact)]
	pub total: BalanceOf<T>,

	/// The total amount of the stash's balance that will be at stake in any forthcoming
	/// rounds.
	#[codec(compact)]
	pub active: BalanceOf<T>,

	/// Any balance that is becoming free, which may eventually be transferred out of the stash
	/// (assuming it doesn't get slashed first). New (higher value) eras get pushed on the back.
	/// Matured chunks are withdrawn from any position, while rebonding consumes the back first.
	pub unlocking: BoundedVec<UnlockChunk<BalanceOf<T>>, T::MaxUnlockingChunks>,
}

impl<T: Config> StakingLedger<T> {
	/// Returns a new instance of a staking ledger.
	///
	/// The [`Ledger`] storage is not mutated. In order to store, `StakingLedger::bond` must be
	/// called on the returned staking ledger.
	pub fn new(stash: T::AccountId, stake: BalanceOf<T>) -> Self {
		Self { stash, active: stake, total: stake, unlocking: Default::default() }
	}

	/// Returns the ledger of `stash`, if bonded.
	pub fn get(stash: &T::AccountId) -> Option<Self> {
		Ledger::<T>::get(stash)
	}

	/// Returns whether `stash` has a ledger.
	pub fn is_bonded(stash: &T::AccountId) -> bool {
		Ledger::<T>::contains_key(stash)
	}

	/// Returns the reward destination of a given stash.
	pub fn reward_destination(stash: &T::AccountId) -> Option<RewardDestination<T::AccountId>> {
		Payee::<T>::get(stash)
	}

	/// Updates a bonded staking ledger and sets the staking lock to `self.total`.
	///
	/// New ledgers must go through [`Self::bond`] instead.
	pub(crate) fn update(self) -> Result<(), Error<T>> {
		if !Self::is_bonded(&self.stash) {
			return Err(Error::<T>::NotBonded)
		}

		let stash = self.stash.clone();
		T::Currency::set_lock(STAKING_ID, &stash, self.total, WithdrawReasons::all());
		Ledger::<T>::insert(&stash, self);

		Ok(())
	}

	/// Bonds a ledger.
	///
	/// It sets the reward preferences for the bonded stash.
	pub(crate) fn bond(self, payee: RewardDestination<T::AccountId>) -> Result<(), Error<T>> {
		if Self::is_bonded(&self.stash) {
			return Err(Error::<T>::AlreadyBonded)
		}

		frame_system::Pallet::<T>::inc_consumers(&self.stash).map_err(|_| Error::<T>::BadState)?;
		Payee::<T>::insert(&self.stash, payee);
		let stash = self.stash.clone();
		T::Currency::set_lock(STAKING_ID, &stash, self.total, WithdrawReasons::all());
		Ledger::<T>::insert(&stash, self);

		Ok(())
	}

	/// Sets the ledger payee.
	pub(crate) fn set_payee(
		stash: &T::AccountId,
		payee: RewardDestination<T::AccountId>,
	) -> Result<(), Error<T>> {
		if !Self::is_bonded(stash) {
			return Err(Error::<T>::NotBonded)
		}

		Payee::<T>::insert(stash, payee);
		Ok(())
	}

	/// Clears all data related to a staking ledger and its bond in both [`Ledger`] and
	/// [`Payee`] storage items and unlocks the stake.
	///
	/// `num_slashing_spans` must cover all the slashing spans recorded for `stash`.
	pub(crate) fn kill(stash: &T::AccountId, num_slashing_spans: u32) -> DispatchResult {
		let ledger = Self::get(stash).ok_or(Error::<T>::NotBonded)?;

		let spans = SlashingSpans::<T>::get(stash);
		frame_support::ensure!(
			num_slashing_spans >= spans,
			Error::<T>::IncorrectSlashingSpans
		);

		SlashingSpans::<T>::remove(stash);
		PendingRoles::<T>::remove(stash);
		Ledger::<T>::remove(&ledger.stash);
		Payee::<T>::remove(&ledger.stash);
		T::Currency::remove_lock(STAKING_ID, &ledger.stash);
		frame_system::Pallet::<T>::dec_consumers(&ledger.stash);

		Ok(())
	}

	/// Sum of all chunks that are withdrawable at `current_era`.
	pub fn unlocked(&self, current_era: EraIndex) -> BalanceOf<T> {
		self.unlocking
			.iter()
			.filter(|chunk| chunk.era <= current_era)
			.fold(Zero::zero(), |acc: BalanceOf<T>, chunk| acc.saturating_add(chunk.value))
	}

	/// Move `value` from active into a chunk unlocking at `era`.
	///
	/// If the remaining active balance would be dust, it is unbonded as well. The remaining active
	/// balance must stay at or above `min_active`, else `InsufficientBond`. A full chunk queue
	/// without a chunk for `era` yields `NoMoreChunks`. Returns the amount actually scheduled.
	pub(crate) fn unbond(
		&mut self,
		value: BalanceOf<T>,
		era: EraIndex,
		minimum_balance: BalanceOf<T>,
		min_active: BalanceOf<T>,
	) -> Result<BalanceOf<T>, Error<T>> {
		let mut value = value.min(self.active);
		if value.is_zero() {
			return Ok(value)
		}

		let mut active = self.active - value;
		// Avoid there being a dust balance left in the staking system.
		if active < minimum_balance {
			value += active;
			active = Zero::zero();
		}
		if active < min_active {
			return Err(Error::<T>::InsufficientBond)
		}

		if let Some(chunk) = self.unlocking.last_mut().filter(|chunk| chunk.era == era) {
			// To keep the chunk count down, we only keep one chunk per era. Since eras are
			// pushed in increasing order, if a chunk exists for `era` it is the last one.
			chunk.value = chunk.value.defensive_saturating_add(value)
		} else {
			self.unlocking
				.try_push(UnlockChunk { value, era })
				.map_err(|_| Error::<T>::NoMoreChunks)?;
		}
		self.active = active;

		Ok(value)
	}

	/// Remove entries from `unlocking` that are sufficiently old and reduce the
	/// total by the sum of their balances.
	pub(crate) fn consolidate_unlocked(self, current_era: EraIndex) -> Self {
		let mut total = self.total;
		let unlocking: Vec<_> = self
			.unlocking
			.into_iter()
			.filter(|chunk| {
				if chunk.era > current_era {
					true
				} else {
					total = total.saturating_sub(chunk.value);
					false
				}
			})
			.collect();

		Self {
			stash: self.stash,
			total,
			active: self.active,
			// filtering a bounded vec can only shrink it.
			unlocking: BoundedVec::truncate_from(unlocking),
		}
	}

	/// Re-bond funds that were scheduled for unlocking.
	///
	/// The most recently scheduled chunk is consumed first. Returns the updated ledger, and the
	/// amount actually rebonded.
	pub(crate) fn rebond(mut self, value: BalanceOf<T>) -> (Self, BalanceOf<T>) {
		let mut unlocking_balance = BalanceOf::<T>::zero();

		while let Some(last) = self.unlocking.last_mut() {
			if unlocking_balance.defensive_saturating_add(last.value) <= value {
				unlocking_balance += last.value;
				self.active += last.value;
				self.unlocking.pop();
			} else {
				let diff = value.defensive_saturating_sub(unlocking_balance);

				unlocking_balance += diff;
				self.active += diff;
				last.value -= diff;
			}

			if unlocking_balance >= value {
				break
			}
		}

		(self, unlocking_balance)
	}

	/// Slash the staker for a given amount of balance.
	///
	/// This implements a proportional slashing system, whereby we set our preference to slash as
	/// such:
	///
	/// - If any unlocking chunks exist that are scheduled to be unlocked at `slash_era +
	///   bonding_duration` and onwards, the slash is divided equally between the active ledger and
	///   the unlocking chunks.
	/// - If no such chunks exist, then only the active balance is slashed.
	///
	/// Note that the above is only a *preference*. If for any reason the active ledger, with or
	/// without some portion of the unlocking chunks that are more justified to be slashed are not
	/// enough, then the slashing will continue and will consume as much of the active and unlocking
	/// chunks as needed.
	///
	/// This will never slash more than the given amount. If any of the chunks become dusted, the
	/// last chunk is slashed slightly less to compensate. Returns the amount of funds actually
	/// slashed.
	pub fn slash(
		&mut self,
		slash_amount: BalanceOf<T>,
		minimum_balance: BalanceOf<T>,
		slash_era: EraIndex,
	) -> BalanceOf<T> {
		if slash_amount.is_zero() {
			return Zero::zero()
		}

		use sp_runtime::PerThing as _;
		let mut remaining_slash = slash_amount;
		let pre_slash_total = self.total;

		// for a `slash_era = x`, any chunk that is scheduled to be unlocked at era `x + 28`
		// (assuming 28 is the bonding duration) onwards should be slashed.
		let slashable_chunks_start = slash_era.saturating_add(T::BondingDuration::get());

		// `Some(ratio)` if this is proportional, with `ratio`, `None` otherwise. In both cases, we
		// slash first the active chunk, and then `slash_chunks_priority`.
		let (maybe_proportional, slash_chunks_priority) = {
			if let Some(first_slashable_index) =
				self.unlocking.iter().position(|c| c.era >= slashable_chunks_start)
			{
				let affected_indices = first_slashable_index..self.unlocking.len();
				let unbonding_affected_balance =
					affected_indices.clone().fold(BalanceOf::<T>::zero(), |sum, i| {
						if let Some(chunk) = self.unlocking.get(i).defensive() {
							sum.saturating_add(chunk.value)
						} else {
							sum
						}
					});
				let affected_balance = self.active.saturating_add(unbonding_affected_balance);
				let ratio = Perquintill::from_rational_with_rounding(
					slash_amount,
					affected_balance,
					Rounding::Up,
				)
				.unwrap_or_else(|_| Perquintill::one());
				(
					Some(ratio),
					affected_indices.chain((0..first_slashable_index).rev()).collect::<Vec<_>>(),
				)
			} else {
				// We just slash from the last chunk to the most recent one, if need be.
				(None, (0..self.unlocking.len()).rev().collect::<Vec<_>>())
			}
		};

		log!(
			debug,
			"slashing {:?} for era {:?} out of {:?}, priority: {:?}, proportional = {:?}",
			slash_amount,
			slash_era,
			self,
			slash_chunks_priority,
			maybe_proportional,
		);

		let mut slash_out_of = |target: &mut BalanceOf<T>, slash_remaining: &mut BalanceOf<T>| {
			let mut slash_from_target = if let Some(ratio) = maybe_proportional {
				ratio.mul_ceil(*target)
			} else {
				*slash_remaining
			}
			// this is the total that that the slash target has. We can't slash more than
			// this anyhow!
			.min(*target)
			// this is the total amount that we would have wanted to slash
			// non-proportionally, a proportional slash should never exceed this either!
			.min(*slash_remaining);

			// slash out from *target exactly `slash_from_target`.
			*target = *target - slash_from_target;
			if *target < minimum_balance {
				// Slash the rest of the target if it's dust. This might cause the last chunk to be
				// slightly under-slashed, by at most `MaxUnlockingChunks * ED`, which is not a big
				// deal.
				slash_from_target =
					core::mem::replace(target, Zero::zero()).saturating_add(slash_from_target)
			}

			self.total = self.total.saturating_sub(slash_from_target);
			*slash_remaining = slash_remaining.saturating_sub(slash_from_target);
		};

		// If this is *not* a proportional slash, the active will always wiped to 0.
		slash_out_of(&mut self.active, &mut remaining_slash);

		for i in slash_chunks_priority {
			if remaining_slash.is_zero() {
				break
			}

			if let Some(chunk) = self.unlocking.get_mut(i).defensive() {
				slash_out_of(&mut chunk.value, &mut remaining_slash);
			} else {
				break
			}
		}

		// clean unlocking chunks that are set to zero.
		self.unlocking.retain(|c| !c.value.is_zero());

		let final_slashed_amount = pre_slash_total.saturating_sub(self.total);
		if final_slashed_amount > slash_amount {
			defensive!("slashed more than requested");
		}
		log!(
			trace,
			"slashed {:?} of {:?}, unlocking chunks after slash: {:?}",
			final_slashed_amount,
			self.stash,
			self.unlocking,
		);

		final_slashed_amount
	}
}
