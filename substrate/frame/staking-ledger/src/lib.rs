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

//! # Staking Ledger Pallet
//!
//! The stake-accounting core of a nominated proof-of-stake system. This pallet keeps track of
//! who has bonded how much, who wants to validate or nominate, what every validator was exposed
//! to in each era, and distributes the era payout to those exposures.
//!
//! It deliberately does not elect validators, produce blocks or decide how much inflation is
//! minted. Those concerns reach the pallet through [`Config`] and [`session_rotation::Rotator`].
//!
//! ## Bonding
//!
//! A stash locks funds with [`Pallet::bond`] and can top up with [`Pallet::bond_extra`]. Funds
//! leave the active stake through [`Pallet::unbond`], which schedules an [`UnlockChunk`] that
//! matures `BondingDuration` eras later. Matured chunks are released with
//! [`Pallet::withdraw_unbonded`]. Once a stash has nothing left at stake and no role, withdrawing
//! removes it altogether.
//!
//! ## Roles
//!
//! [`Pallet::validate`], [`Pallet::nominate`], [`Pallet::chill`] and friends never touch the
//! active role of a stash directly. They record a [`PendingRole`], which becomes effective when
//! the next era starts. Until then, the pending value is what the stash *intends* to do, and it
//! is what bonding checks are done against.
//!
//! ## Eras
//!
//! A session module signals the end of every session to [`session_rotation::Rotator`]. Once
//! `SessionsPerEra` sessions have passed, a new era starts:
//!
//! 1. the finished era gets its payout pool from [`Config::EraPayout`].
//! 2. pending roles are applied.
//! 3. deferred slashes due in the new era are applied.
//! 4. exposures of the new era are snapshotted, see [`eras`].
//! 5. eras that fell out of `HistoryDepth` are removed.
//!
//! [`ActiveEra`] is the era currently running, [`CurrentEra`] is always the one planned after it.
//!
//! ## Payouts
//!
//! Anyone can call [`Pallet::payout_stakers_by_page`] for any validator, era and exposure page
//! within history. Each page can be claimed once.

#![cfg_attr(not(feature = "std"), no_std)]
#![recursion_limit = "256"]

#[cfg(test)]
pub(crate) mod mock;
#[cfg(test)]
mod tests;

pub mod eras;
pub mod ledger;
mod pallet;
pub mod session_rotation;
pub mod slashing;
pub mod weights;

extern crate alloc;

use alloc::vec::Vec;
use codec::{Decode, DecodeWithMemTracking, Encode, HasCompact, MaxEncodedLen};
use frame_support::{
	traits::{Currency, Get, LockIdentifier},
	BoundedBTreeMap, BoundedVec, CloneNoBound, DefaultNoBound, EqNoBound, PartialEqNoBound,
	RuntimeDebugNoBound,
};
use scale_info::TypeInfo;
use sp_runtime::{traits::StaticLookup, Perbill, RuntimeDebug};
use sp_staking::{EraIndex, ExposurePage, PagedExposureMetadata, SessionIndex};
pub use sp_staking::{IndividualExposure, StakerStatus};
pub use weights::WeightInfo;

pub use ledger::{StakingLedger, UnlockChunk};
pub use pallet::pallet::*;

pub(crate) const STAKING_ID: LockIdentifier = *b"stkledgr";
pub(crate) const LOG_TARGET: &str = "runtime::staking-ledger";

// syntactic sugar for logging.
#[macro_export]
macro_rules! log {
	($level:tt, $patter:expr $(, $values:expr)* $(,)?) => {
		log::$level!(
			target: crate::LOG_TARGET,
			concat!("[{:?}] 💸 ", $patter), <frame_system::Pallet<T>>::block_number() $(, $values)*
		)
	};
}

/// Counter for the number of "reward" points earned by a given validator.
pub type RewardPoint = u32;

/// The balance type of this pallet.
pub type BalanceOf<T> = <T as Config>::CurrencyBalance;

pub(crate) type PositiveImbalanceOf<T> = <<T as Config>::Currency as Currency<
	<T as frame_system::Config>::AccountId,
>>::PositiveImbalance;
pub type NegativeImbalanceOf<T> = <<T as Config>::Currency as Currency<
	<T as frame_system::Config>::AccountId,
>>::NegativeImbalance;

type AccountIdLookupOf<T> = <<T as frame_system::Config>::Lookup as StaticLookup>::Source;

/// Information regarding the active era (era in used in session).
#[derive(Encode, Decode, RuntimeDebug, TypeInfo, MaxEncodedLen, PartialEq, Eq, Clone, Default)]
pub struct ActiveEraInfo {
	/// Index of era.
	pub index: EraIndex,
	/// The first session of this era.
	pub start_session: SessionIndex,
}

/// Reward points of an era. Used to split era total payout between validators.
///
/// Only validators that are part of the era's exposure set can earn points, hence the bound.
#[derive(
	PartialEqNoBound,
	EqNoBound,
	CloneNoBound,
	Encode,
	Decode,
	RuntimeDebugNoBound,
	TypeInfo,
	MaxEncodedLen,
	DefaultNoBound,
)]
#[codec(mel_bound())]
#[scale_info(skip_type_params(T))]
pub struct EraRewardPoints<T: Config> {
	/// Total number of points. Equals the sum of reward points for each validator.
	pub total: RewardPoint,
	/// The reward points earned by a given validator.
	pub individual: BoundedBTreeMap<T::AccountId, RewardPoint, T::MaxValidatorSet>,
}

/// A destination account for payment.
#[derive(
	PartialEq,
	Eq,
	Copy,
	Clone,
	Encode,
	Decode,
	DecodeWithMemTracking,
	RuntimeDebug,
	TypeInfo,
	MaxEncodedLen,
)]
pub enum RewardDestination<AccountId> {
	/// Pay into the stash account, increasing the amount at stake accordingly.
	Staked,
	/// Pay into the stash account, not increasing the amount at stake.
	Stash,
	/// Pay into a specified account.
	Account(AccountId),
	/// Receive no reward. The payout is burned by never being minted.
	None,
}

/// Preference of what happens regarding validation.
#[derive(
	PartialEq,
	Eq,
	Clone,
	Encode,
	Decode,
	DecodeWithMemTracking,
	RuntimeDebug,
	TypeInfo,
	Default,
	MaxEncodedLen,
)]
pub struct ValidatorPrefs {
	/// Reward that validator takes up-front; only the rest is split between themselves and
	/// nominators.
	#[codec(compact)]
	pub commission: Perbill,
	/// Whether or not this validator is accepting more nominations. If `true`, then no nominator
	/// who is not already nominating this validator may nominate them. By default, validators
	/// are accepting nominations.
	pub blocked: bool,
}

/// A record of the nominations made by a specific account.
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
#[codec(mel_bound())]
#[scale_info(skip_type_params(T))]
pub struct Nominations<T: Config> {
	/// The targets of nomination.
	pub targets: BoundedVec<T::AccountId, T::MaxNominations>,
	/// The era the nominations were submitted.
	///
	/// Except for initial nominations which are considered submitted at era 0.
	pub submitted_in: EraIndex,
	/// Whether the nominations have been suppressed. Suppressed nominations back nobody.
	pub suppressed: bool,
}

/// A role change waiting for the next era.
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
#[codec(mel_bound())]
#[scale_info(skip_type_params(T))]
pub enum RoleChange<T: Config> {
	/// Become a validator with the given preferences.
	Validate(ValidatorPrefs),
	/// Become a nominator of the given targets.
	Nominate(Nominations<T>),
	/// Drop any role, keeping the bond.
	Chill,
}

/// A [`RoleChange`] together with the era it becomes effective in.
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
#[codec(mel_bound())]
#[scale_info(skip_type_params(T))]
pub struct PendingRole<T: Config> {
	pub change: RoleChange<T>,
	pub effective_era: EraIndex,
}

/// The staking status of an account, as it will be once pending role changes apply.
#[derive(PartialEq, Eq, Clone, Encode, Decode, RuntimeDebug, TypeInfo)]
pub enum StakingStatus<AccountId> {
	/// The account has never bonded, or has been fully withdrawn.
	NotStaking,
	/// Bonded, but neither validating nor nominating.
	Idle,
	/// Declared as validator.
	Validator,
	/// Nominating the given targets.
	Nominator(Vec<AccountId>),
}

/// Facade struct to encapsulate `PagedExposureMetadata` and a single page of `ExposurePage`.
///
/// This is useful where we need to take into account the validator's own stake and total exposure
/// in consideration, in addition to the individual nominators backing them.
#[derive(Encode, Decode, RuntimeDebug, TypeInfo, PartialEq, Eq)]
pub struct PagedExposure<AccountId, Balance: HasCompact + codec::MaxEncodedLen> {
	exposure_metadata: PagedExposureMetadata<Balance>,
	exposure_page: ExposurePage<AccountId, Balance>,
}

impl<AccountId, Balance> PagedExposure<AccountId, Balance>
where
	Balance: HasCompact + Copy + sp_runtime::traits::AtLeast32BitUnsigned + codec::MaxEncodedLen,
{
	/// Returns total exposure of this validator across pages
	pub fn total(&self) -> Balance {
		self.exposure_metadata.total
	}

	/// Returns total exposure of this validator for the current page. The validator's own stake
	/// is only part of the first page.
	pub fn page_total(&self) -> Balance {
		self.exposure_page.page_total + self.own()
	}

	/// Returns validator's own stake that is exposed in this page.
	pub fn own(&self) -> Balance {
		self.exposure_metadata.own
	}

	/// Returns the portions of nominators stashes that are exposed in this page.
	pub fn others(&self) -> &Vec<IndividualExposure<AccountId, Balance>> {
		&self.exposure_page.others
	}
}

/// A pending slash record. The value of the slash has been computed by the slashing module but
/// not applied yet, rather deferred for several eras.
#[derive(Encode, Decode, RuntimeDebugNoBound, TypeInfo, PartialEqNoBound, CloneNoBound)]
#[scale_info(skip_type_params(T))]
pub struct UnappliedSlash<T: Config> {
	/// The stash ID of the offending validator.
	pub validator: T::AccountId,
	/// The validator's own slash.
	pub own: BalanceOf<T>,
	/// All other slashed stakers and amounts.
	pub others: Vec<(T::AccountId, BalanceOf<T>)>,
	/// Reporter of the offence; bounty payout recipient.
	pub reporter: Option<T::AccountId>,
	/// The amount of payout.
	pub payout: BalanceOf<T>,
}

/// Handler for determining how much of a balance should be paid out on the current era.
pub trait EraPayout<Balance> {
	/// Determine the payout for this era.
	///
	/// Returns the amount to be paid to stakers in this era, as well as whatever else should be
	/// paid out ("the rest").
	fn era_payout(
		total_staked: Balance,
		total_issuance: Balance,
		era_length: SessionIndex,
	) -> (Balance, Balance);
}

impl<Balance: Default> EraPayout<Balance> for () {
	fn era_payout(
		_total_staked: Balance,
		_total_issuance: Balance,
		_era_length: SessionIndex,
	) -> (Balance, Balance) {
		(Default::default(), Default::default())
	}
}

/// Mode of era-forcing.
#[derive(
	Copy,
	Clone,
	PartialEq,
	Eq,
	Encode,
	Decode,
	DecodeWithMemTracking,
	RuntimeDebug,
	TypeInfo,
	MaxEncodedLen,
	serde::Serialize,
	serde::Deserialize,
)]
pub enum Forcing {
	/// Not forcing anything - just let whatever happen.
	NotForcing,
	/// Force a new era at the end of the next session, then reset to `NotForcing`.
	ForceNew,
	/// Avoid a new era indefinitely.
	ForceNone,
	/// Force a new era at the end of all sessions indefinitely.
	ForceAlways,
}

impl Default for Forcing {
	fn default() -> Self {
		Forcing::NotForcing
	}
}

/// The immutable configuration of the pallet, as a single value for external readers.
#[derive(PartialEq, Eq, Clone, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct StakingConstants {
	pub history_depth: u32,
	pub sessions_per_era: SessionIndex,
	pub bonding_duration: EraIndex,
	pub slash_defer_duration: EraIndex,
	pub max_exposure_page_size: u32,
	pub max_unlocking_chunks: u32,
	pub max_nominations: u32,
	pub max_validator_set: u32,
}

impl StakingConstants {
	pub(crate) fn of<T: Config>() -> Self {
		Self {
			history_depth: T::HistoryDepth::get(),
			sessions_per_era: T::SessionsPerEra::get(),
			bonding_duration: T::BondingDuration::get(),
			slash_defer_duration: T::SlashDeferDuration::get(),
			max_exposure_page_size: T::MaxExposurePageSize::get(),
			max_unlocking_chunks: T::MaxUnlockingChunks::get(),
			max_nominations: T::MaxNominations::get(),
			max_validator_set: T::MaxValidatorSet::get(),
		}
	}
}
