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

//! `pallet-staking-ledger`'s main `pallet` module.

use crate::{
	eras::Eras, slashing, AccountIdLookupOf, ActiveEraInfo, BalanceOf, EraPayout, EraRewardPoints,
	Forcing, NegativeImbalanceOf, Nominations, PendingRole, RewardDestination, RoleChange,
	StakingLedger, UnappliedSlash, ValidatorPrefs, WeightInfo,
};
use alloc::vec::Vec;
use codec::Codec;
use frame_support::{
	pallet_prelude::*,
	traits::{Currency, EnsureOrigin, Get, LockableCurrency, OnUnbalanced},
	BoundedVec,
};
use frame_system::{ensure_signed, pallet_prelude::*};
use sp_runtime::{traits::StaticLookup, Perbill};
use sp_staking::{EraIndex, ExposurePage, Page, PagedExposureMetadata, SessionIndex};

mod impls;

#[frame_support::pallet]
pub mod pallet {
	use super::*;

	/// The in-code storage version.
	const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

	#[pallet::pallet]
	#[pallet::storage_version(STORAGE_VERSION)]
	pub struct Pallet<T>(_);

	/// Possible operations on the configuration values of this pallet.
	#[derive(TypeInfo, Debug, Clone, Encode, Decode, DecodeWithMemTracking, PartialEq)]
	pub enum ConfigOp<T: Default + Codec> {
		/// Don't change.
		Noop,
		/// Set the given value.
		Set(T),
		/// Remove from storage.
		Remove,
	}

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The staking balance.
		type Currency: LockableCurrency<
			Self::AccountId,
			Moment = BlockNumberFor<Self>,
			Balance = Self::CurrencyBalance,
		>;

		/// Just the `Currency::Balance` type; we have this item to allow us to constrain it to
		/// `From<u64>`.
		type CurrencyBalance: sp_runtime::traits::AtLeast32BitUnsigned
			+ codec::FullCodec
			+ DecodeWithMemTracking
			+ codec::HasCompact<Type: DecodeWithMemTracking>
			+ Copy
			+ MaybeSerializeDeserialize
			+ core::fmt::Debug
			+ Default
			+ From<u64>
			+ TypeInfo
			+ Send
			+ Sync
			+ MaxEncodedLen;

		/// The payout for validators and the system for the current era.
		type EraPayout: EraPayout<BalanceOf<Self>>;

		/// Tokens have been minted and are unused for validator-reward.
		type RewardRemainder: OnUnbalanced<NegativeImbalanceOf<Self>>;

		/// Handler for the unbalanced reduction when slashing a staker.
		type Slash: OnUnbalanced<NegativeImbalanceOf<Self>>;

		/// Handler for the unbalanced increment when rewarding a staker.
		type Reward: OnUnbalanced<crate::PositiveImbalanceOf<Self>>;

		/// The origin which can manage less critical staking parameters and cancel deferred
		/// slashes.
		type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// Number of sessions per era.
		#[pallet::constant]
		type SessionsPerEra: Get<SessionIndex>;

		/// Number of eras that staked funds must remain bonded for.
		#[pallet::constant]
		type BondingDuration: Get<EraIndex>;

		/// Number of eras that slashes are deferred by, after computation.
		///
		/// This should be less than the bonding duration. Set to 0 if slashes should be applied
		/// immediately, without opportunity for intervention.
		#[pallet::constant]
		type SlashDeferDuration: Get<EraIndex>;

		/// Number of eras to keep in history.
		///
		/// Following information is kept for eras in `[current_era - HistoryDepth,
		/// current_era]`: `ErasStakersOverview`, `ErasStakersPaged`, `ErasValidatorPrefs`,
		/// `ErasValidatorReward`, `ErasRewardPoints`, `ErasTotalStake`, `ErasStartSessionIndex`,
		/// `ClaimedRewards`.
		///
		/// Must be more than the number of eras delayed by session.
		#[pallet::constant]
		type HistoryDepth: Get<u32>;

		/// The maximum size of each `ExposurePage`.
		///
		/// An `ExposurePage` is weakly bounded to a maximum of `MaxExposurePageSize`
		/// nominators.
		///
		/// For older non-paged exposure, a reward payout was restricted to the top
		/// `MaxExposurePageSize` nominators. This is to limit the i/o cost for the
		/// nominator payout.
		#[pallet::constant]
		type MaxExposurePageSize: Get<u32>;

		/// The maximum number of `unlocking` chunks a [`StakingLedger`] can
		/// have. Effectively determines how many unique eras a staker may be
		/// unbonding in.
		#[pallet::constant]
		type MaxUnlockingChunks: Get<u32>;

		/// Maximum number of targets a single nominator can have.
		#[pallet::constant]
		type MaxNominations: Get<u32>;

		/// Maximum number of validators that can be exposed in a single era.
		#[pallet::constant]
		type MaxValidatorSet: Get<u32>;

		/// Weight information for extrinsics in this pallet.
		type WeightInfo: crate::WeightInfo;
	}

	/// The ideal number of active validators.
	#[pallet::storage]
	pub type ValidatorCount<T> = StorageValue<_, u32, ValueQuery>;

	/// The minimum active bond to become and maintain the role of a nominator.
	#[pallet::storage]
	pub type MinNominatorBond<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

	/// The minimum active bond to become and maintain the role of a validator.
	#[pallet::storage]
	pub type MinValidatorBond<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

	/// The minimum amount of commission that validators can set.
	///
	/// If set to `0`, no limit exists.
	#[pallet::storage]
	pub type MinCommission<T: Config> = StorageValue<_, Perbill, ValueQuery>;

	/// Map from all (unlocked) stash accounts to the info regarding the staking.
	///
	/// Note: All the reads and mutations to this storage *MUST* be done through the methods
	/// exposed by [`StakingLedger`] to ensure data and lock consistency.
	#[pallet::storage]
	pub type Ledger<T: Config> = StorageMap<_, Blake2_128Concat, T::AccountId, StakingLedger<T>>;

	/// Where the reward payment should be made. Keyed by stash.
	#[pallet::storage]
	pub type Payee<T: Config> =
		StorageMap<_, Twox64Concat, T::AccountId, RewardDestination<T::AccountId>, OptionQuery>;

	/// The map from (wannabe) validator stash key to the preferences of that validator.
	///
	/// Only holds validators whose role is effective. Declarations made during the active era
	/// wait in [`PendingRoles`].
	#[pallet::storage]
	pub type Validators<T: Config> =
		CountedStorageMap<_, Twox64Concat, T::AccountId, ValidatorPrefs, ValueQuery>;

	/// The map from nominator stash key to their nomination preferences, namely the validators
	/// that they wish to support.
	///
	/// Only holds nominators whose role is effective, see [`PendingRoles`].
	#[pallet::storage]
	pub type Nominators<T: Config> =
		CountedStorageMap<_, Twox64Concat, T::AccountId, Nominations<T>>;

	/// Role changes waiting for the start of their effective era.
	///
	/// At most one per stash: a newer declaration replaces an older one.
	#[pallet::storage]
	pub type PendingRoles<T: Config> =
		StorageMap<_, Twox64Concat, T::AccountId, PendingRole<T>, OptionQuery>;

	/// The session currently running, as last signalled by the session module.
	#[pallet::storage]
	pub type CurrentSession<T> = StorageValue<_, SessionIndex, ValueQuery>;

	/// The current planned era index.
	///
	/// This is always the era after [`ActiveEra`].
	#[pallet::storage]
	pub type CurrentEra<T> = StorageValue<_, EraIndex>;

	/// The active era information, it holds index and start.
	#[pallet::storage]
	pub type ActiveEra<T> = StorageValue<_, ActiveEraInfo>;

	/// The session index at which the era started for the last [`Config::HistoryDepth`] eras.
	#[pallet::storage]
	pub type ErasStartSessionIndex<T> = StorageMap<_, Twox64Concat, EraIndex, SessionIndex>;

	/// Summary of validator exposure at a given era.
	///
	/// This contains the total stake in support of the validator and their own stake. In
	/// addition, it can also be used to get the number of nominators backing this validator and
	/// the number of exposure pages they are divided into. The page count is useful to determine
	/// the number of pages of rewards that needs to be claimed.
	///
	/// This is keyed first by the era index to allow bulk deletion and then the stash account.
	/// Should only be accessed through `Eras`.
	///
	/// Is it removed after [`Config::HistoryDepth`] eras.
	/// If stakers hasn't been set or has been removed then empty overview is returned.
	#[pallet::storage]
	pub type ErasStakersOverview<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		EraIndex,
		Twox64Concat,
		T::AccountId,
		PagedExposureMetadata<BalanceOf<T>>,
		OptionQuery,
	>;

	/// Paginated exposure of a validator at given era.
	///
	/// This is keyed first by the era index to allow bulk deletion, then stash account and finally
	/// the page. Should only be accessed through `Eras`.
	///
	/// This is cleared after [`Config::HistoryDepth`] eras.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type ErasStakersPaged<T: Config> = StorageNMap<
		_,
		(
			NMapKey<Twox64Concat, EraIndex>,
			NMapKey<Twox64Concat, T::AccountId>,
			NMapKey<Twox64Concat, Page>,
		),
		ExposurePage<T::AccountId, BalanceOf<T>>,
		OptionQuery,
	>;

	/// History of claimed paged rewards by era and validator.
	///
	/// This is keyed by era and validator stash which maps to the set of page indexes which have
	/// been claimed.
	///
	/// It is removed after [`Config::HistoryDepth`] eras.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type ClaimedRewards<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		EraIndex,
		Twox64Concat,
		T::AccountId,
		Vec<Page>,
		ValueQuery,
	>;

	/// Similar to `ErasStakers`, this holds the preferences of validators.
	///
	/// This is keyed first by the era index to allow bulk deletion and then the stash account.
	///
	/// Is it removed after [`Config::HistoryDepth`] eras.
	#[pallet::storage]
	pub type ErasValidatorPrefs<T: Config> = StorageDoubleMap<
		_,
		Twox64Concat,
		EraIndex,
		Twox64Concat,
		T::AccountId,
		ValidatorPrefs,
		ValueQuery,
	>;

	/// The total validator era payout for the last [`Config::HistoryDepth`] eras.
	///
	/// Eras that haven't finished yet or has been removed doesn't have reward.
	#[pallet::storage]
	pub type ErasValidatorReward<T: Config> = StorageMap<_, Twox64Concat, EraIndex, BalanceOf<T>>;

	/// Rewards for the last [`Config::HistoryDepth`] eras.
	/// If reward hasn't been set or has been removed then 0 reward is returned.
	#[pallet::storage]
	pub type ErasRewardPoints<T: Config> =
		StorageMap<_, Twox64Concat, EraIndex, EraRewardPoints<T>, ValueQuery>;

	/// The total amount staked for the last [`Config::HistoryDepth`] eras.
	/// If total hasn't been set or has been removed then 0 stake is returned.
	#[pallet::storage]
	pub type ErasTotalStake<T: Config> =
		StorageMap<_, Twox64Concat, EraIndex, BalanceOf<T>, ValueQuery>;

	/// Mode of era forcing.
	#[pallet::storage]
	pub type ForceEra<T> = StorageValue<_, Forcing, ValueQuery>;

	/// The amount of currency given to reporters of a slash event which was
	/// canceled by extraordinary circumstances (e.g. governance).
	#[pallet::storage]
	pub type CanceledSlashPayout<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

	/// All unapplied slashes that are queued for later, keyed by the era they are due in. Each
	/// one is stored along with the era of its offence.
	#[pallet::storage]
	#[pallet::unbounded]
	pub type UnappliedSlashes<T: Config> =
		StorageMap<_, Twox64Concat, EraIndex, Vec<(EraIndex, UnappliedSlash<T>)>, ValueQuery>;

	/// Number of slashing spans recorded for a stash. They must be acknowledged when the stash
	/// is removed.
	#[pallet::storage]
	pub type SlashingSpans<T: Config> = StorageMap<_, Twox64Concat, T::AccountId, u32, ValueQuery>;

	#[pallet::genesis_config]
	#[derive(frame_support::DefaultNoBound)]
	pub struct GenesisConfig<T: Config> {
		pub validator_count: u32,
		pub force_era: Forcing,
		pub min_commission: Perbill,
		pub min_nominator_bond: BalanceOf<T>,
		pub min_validator_bond: BalanceOf<T>,
		/// Stakers bonded at genesis. Their roles are effective from era 0 on.
		pub stakers: Vec<(T::AccountId, BalanceOf<T>, crate::StakerStatus<T::AccountId>)>,
	}

	#[pallet::genesis_build]
	impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
		fn build(&self) {
			assert!(
				self.validator_count <= T::MaxValidatorSet::get(),
				"validator count exceeds `MaxValidatorSet`"
			);
			ValidatorCount::<T>::put(self.validator_count);
			ForceEra::<T>::put(self.force_era);
			MinCommission::<T>::put(self.min_commission);
			MinNominatorBond::<T>::put(self.min_nominator_bond);
			MinValidatorBond::<T>::put(self.min_validator_bond);

			for &(ref stash, balance, ref status) in &self.stakers {
				crate::log!(
					trace,
					"inserting genesis staker: {:?} => {:?} => {:?}",
					stash,
					balance,
					status
				);
				assert!(
					T::Currency::free_balance(stash) >= balance,
					"Stash does not have enough balance to bond."
				);
				frame_support::assert_ok!(<Pallet<T>>::bond(
					T::RuntimeOrigin::from(Some(stash.clone()).into()),
					balance,
					RewardDestination::Staked,
				));
				match status {
					crate::StakerStatus::Validator => {
						assert!(balance >= self.min_validator_bond, "genesis validator bond too low");
						Validators::<T>::insert(
							stash,
							ValidatorPrefs { commission: self.min_commission, blocked: false },
						);
					},
					crate::StakerStatus::Nominator(votes) => {
						assert!(balance >= self.min_nominator_bond, "genesis nominator bond too low");
						let targets: BoundedVec<_, T::MaxNominations> = votes
							.clone()
							.try_into()
							.expect("genesis nominations exceed `MaxNominations`");
						Nominators::<T>::insert(
							stash,
							Nominations { targets, submitted_in: 0, suppressed: false },
						);
					},
					_ => (),
				}
			}

			CurrentSession::<T>::put(0);
			ActiveEra::<T>::put(ActiveEraInfo { index: 0, start_session: 0 });
			ErasStartSessionIndex::<T>::insert(0, 0);
			CurrentEra::<T>::put(1);
			Eras::<T>::snapshot(0);
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(crate) fn deposit_event)]
	pub enum Event<T: Config> {
		/// An account has bonded this amount.
		///
		/// NOTE: This event is only emitted when funds are bonded via a dispatchable. Notably,
		/// it will not be emitted for staking rewards when they are added to stake.
		Bonded { stash: T::AccountId, amount: BalanceOf<T> },
		/// An account has unbonded this amount.
		Unbonded { stash: T::AccountId, amount: BalanceOf<T> },
		/// An account has called `withdraw_unbonded` and removed unbonding chunks worth `Balance`
		/// from the unlocking queue.
		Withdrawn { stash: T::AccountId, amount: BalanceOf<T> },
		/// An account has moved this amount from its unlocking chunks back into active stake.
		Rebonded { stash: T::AccountId, amount: BalanceOf<T> },
		/// A validator has set their preferences, effective from `effective_era`.
		ValidatorPrefsSet { stash: T::AccountId, prefs: ValidatorPrefs, effective_era: EraIndex },
		/// A nominator has set their targets, effective from `effective_era`.
		Nominated { stash: T::AccountId, targets: Vec<T::AccountId>, effective_era: EraIndex },
		/// An account has stopped participating as either a validator or nominator, effective
		/// from `effective_era`.
		Chilled { stash: T::AccountId, effective_era: EraIndex },
		/// A nominator has been kicked from a validator.
		Kicked { nominator: T::AccountId, stash: T::AccountId },
		/// The reward destination of a stash has been set.
		PayeeSet { stash: T::AccountId, payee: RewardDestination<T::AccountId> },
		/// A staker (validator or nominator) has been removed from the ledger.
		StakerRemoved { stash: T::AccountId },
		/// A new session has started.
		SessionRotated { starting_session: SessionIndex, active_era: EraIndex, planned_era: EraIndex },
		/// A new era has started at `start_session`.
		EraStarted { era_index: EraIndex, start_session: SessionIndex },
		/// The era payout has been set; the first balance is the validator-payout; the second is
		/// the remainder from the maximum amount of reward.
		EraPaid { era_index: EraIndex, validator_payout: BalanceOf<T>, remainder: BalanceOf<T> },
		/// A Page of stakers rewards are getting paid. `next` is `None` if all pages are claimed.
		PayoutStarted {
			era_index: EraIndex,
			validator_stash: T::AccountId,
			page: Page,
			next: Option<Page>,
		},
		/// The nominator has been rewarded by this amount to this destination.
		Rewarded {
			stash: T::AccountId,
			dest: RewardDestination<T::AccountId>,
			amount: BalanceOf<T>,
		},
		/// A slash for the given validator, for the given percentage of their stake, at the given
		/// era has been reported, to be applied in `apply_at`.
		SlashReported { validator: T::AccountId, slash_era: EraIndex, apply_at: EraIndex },
		/// A staker (validator or nominator) has been slashed by the given amount.
		Slashed { staker: T::AccountId, amount: BalanceOf<T> },
		/// An old slashing report from a prior era was discarded because it could
		/// not be processed.
		OldSlashingReportDiscarded { slash_era: EraIndex },
		/// An unapplied slash has been cancelled.
		SlashCancelled { slash_era: EraIndex, validator: T::AccountId },
		/// A new force era mode was set.
		ForceEra { mode: Forcing },
	}

	#[pallet::error]
	#[derive(PartialEq)]
	pub enum Error<T> {
		/// Not a stash, nothing is bonded.
		NotBonded,
		/// Stash is already bonded.
		AlreadyBonded,
		/// Cannot have a validator or nominator role, with value less than the minimum defined by
		/// governance (see `MinValidatorBond` and `MinNominatorBond`), or a bond below the
		/// existential deposit.
		InsufficientBond,
		/// Can not schedule more unlock chunks. Withdraw the ones that matured first.
		NoMoreChunks,
		/// Can not rebond without unlocking chunks.
		NoUnlockChunk,
		/// Targets cannot be empty.
		EmptyTargets,
		/// Too many nomination targets supplied.
		TooManyTargets,
		/// Attempting to target a stash that blocked nominations.
		BadTarget,
		/// Commission is too low. Must be at least `MinCommission`.
		CommissionTooLow,
		/// Incorrect number of slashing spans provided.
		IncorrectSlashingSpans,
		/// The era is outside of the retained history.
		EraOutOfHistory,
		/// No payout is recorded for the era yet.
		InvalidEraToReward,
		/// No nominators exist on this page.
		InvalidPage,
		/// Rewards for this era and page have already been claimed.
		AlreadyClaimed,
		/// The caller is not allowed to perform this operation on the target.
		NotAuthorized,
		/// The stash is neither validating nor nominating.
		NotStaking,
		/// The stash is not declared as a validator.
		NotValidator,
		/// Can not reap a stash that still holds more than the existential deposit.
		FundedTarget,
		/// The validator count is above `MaxValidatorSet`.
		TooManyValidators,
		/// Slash record index out of bounds.
		InvalidSlashIndex,
		/// Items are not sorted and unique.
		NotSortedAndUnique,
		/// Internal state has become somehow corrupted and the operation cannot continue.
		BadState,
	}

	#[pallet::hooks]
	impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
		fn integrity_test() {
			assert!(T::SessionsPerEra::get() > 0, "`SessionsPerEra` must be at least one");
			assert!(T::HistoryDepth::get() > 0, "`HistoryDepth` must be at least one");
			assert!(T::MaxExposurePageSize::get() > 0, "`MaxExposurePageSize` must be positive");
			assert!(T::MaxUnlockingChunks::get() > 0, "`MaxUnlockingChunks` must be positive");
			assert!(
				T::SlashDeferDuration::get() < T::BondingDuration::get() ||
					T::BondingDuration::get() == 0,
				"`SlashDeferDuration` must be less than `BondingDuration`"
			);
		}

		#[cfg(feature = "try-runtime")]
		fn try_state(n: BlockNumberFor<T>) -> Result<(), sp_runtime::TryRuntimeError> {
			Self::do_try_state(n)
		}
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Take the origin account as a stash and lock up `value` of its balance.
		///
		/// `value` is capped at the free balance of the stash and must be at least the
		/// existential deposit. Rewards are paid according to `payee`.
		///
		/// Emits `Bonded`.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::bond())]
		pub fn bond(
			origin: OriginFor<T>,
			#[pallet::compact] value: BalanceOf<T>,
			payee: RewardDestination<T::AccountId>,
		) -> DispatchResult {
			let stash = ensure_signed(origin)?;

			ensure!(!StakingLedger::<T>::is_bonded(&stash), Error::<T>::AlreadyBonded);

			// Reject a bond which is considered to be _dust_.
			let stash_balance = T::Currency::free_balance(&stash);
			let value = value.min(stash_balance);
			ensure!(value >= T::Currency::minimum_balance(), Error::<T>::InsufficientBond);

			Self::deposit_event(Event::<T>::Bonded { stash: stash.clone(), amount: value });
			let ledger = StakingLedger::<T>::new(stash, value);

			// You're auto-bonded forever, here. We might improve this by only bonding when
			// you actually validate/nominate and remove once you unbond __everything__.
			ledger.bond(payee)?;

			Ok(())
		}

		/// Add some extra amount that have appeared in the stash `free_balance` into the balance up
		/// for staking.
		///
		/// Unlike [`Self::bond`], there is no limit on the amount besides the free balance that
		/// is not bonded yet.
		///
		/// Emits `Bonded`.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::bond_extra())]
		pub fn bond_extra(
			origin: OriginFor<T>,
			#[pallet::compact] max_additional: BalanceOf<T>,
		) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			Self::do_bond_extra(&stash, max_additional)
		}

		/// Schedule a portion of the stash to be unlocked ready for transfer out after the bond
		/// period ends. If this leaves an amount actively bonded less than the existential
		/// deposit, then it is increased to the full amount.
		///
		/// Once the unlock period is done, you can call `withdraw_unbonded` to actually move
		/// the funds out of management ready for transfer.
		///
		/// No more than a limited number of unlocking chunks (see `MaxUnlockingChunks`)
		/// can co-exists at the same time. If there are no unlocking chunks slots available
		/// matured chunks are withdrawn first. If there are still none, the call fails with
		/// `NoMoreChunks`.
		///
		/// The remaining active stake must satisfy the minimum of the role the stash intends to
		/// hold, see [`Self::chill`] to drop the role first.
		///
		/// Emits `Unbonded`.
		#[pallet::call_index(2)]
		#[pallet::weight(T::WeightInfo::withdraw_unbonded_update().saturating_add(T::WeightInfo::unbond()))]
		pub fn unbond(
			origin: OriginFor<T>,
			#[pallet::compact] value: BalanceOf<T>,
		) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			Self::do_unbond(&stash, value)
		}

		/// Remove any unlocked chunks from the `unlocking` queue from our management.
		///
		/// This essentially frees up that balance to be used by the stash account to do whatever
		/// it wants.
		///
		/// If nothing is left at stake and the stash has no role, the stash is removed. In that
		/// case `num_slashing_spans` must be at least the number of slashing spans recorded for
		/// it.
		///
		/// Emits `Withdrawn`.
		#[pallet::call_index(3)]
		#[pallet::weight(T::WeightInfo::withdraw_unbonded_kill())]
		pub fn withdraw_unbonded(
			origin: OriginFor<T>,
			num_slashing_spans: u32,
		) -> DispatchResultWithPostInfo {
			let stash = ensure_signed(origin)?;

			let stash_killed = Self::do_withdraw_unbonded(&stash, num_slashing_spans)?;

			let actual_weight = if stash_killed {
				T::WeightInfo::withdraw_unbonded_kill()
			} else {
				T::WeightInfo::withdraw_unbonded_update()
			};

			Ok(Some(actual_weight).into())
		}

		/// Declare the desire to validate for the origin stash, from the next era on.
		///
		/// Emits `ValidatorPrefsSet`.
		#[pallet::call_index(4)]
		#[pallet::weight(T::WeightInfo::validate())]
		pub fn validate(origin: OriginFor<T>, prefs: ValidatorPrefs) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			let ledger = StakingLedger::<T>::get(&stash).ok_or(Error::<T>::NotBonded)?;

			ensure!(ledger.active >= MinValidatorBond::<T>::get(), Error::<T>::InsufficientBond);
			ensure!(prefs.commission >= MinCommission::<T>::get(), Error::<T>::CommissionTooLow);

			let effective_era = Self::queue_role(&stash, RoleChange::Validate(prefs.clone()));
			Self::deposit_event(Event::<T>::ValidatorPrefsSet { stash, prefs, effective_era });

			Ok(())
		}

		/// Declare the desire to nominate `targets` for the origin stash, from the next era on.
		///
		/// Duplicate targets are ignored. A validator that blocks nominations can only be
		/// targeted if it was already nominated.
		///
		/// Emits `Nominated`.
		#[pallet::call_index(5)]
		#[pallet::weight(T::WeightInfo::nominate(targets.len() as u32))]
		pub fn nominate(
			origin: OriginFor<T>,
			targets: Vec<AccountIdLookupOf<T>>,
		) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			let ledger = StakingLedger::<T>::get(&stash).ok_or(Error::<T>::NotBonded)?;

			ensure!(ledger.active >= MinNominatorBond::<T>::get(), Error::<T>::InsufficientBond);
			ensure!(!targets.is_empty(), Error::<T>::EmptyTargets);
			ensure!(
				targets.len() <= T::MaxNominations::get() as usize,
				Error::<T>::TooManyTargets
			);

			let old = Self::intended_nominations(&stash)
				.map_or_else(Vec::new, |nominations| nominations.targets.into_inner());

			let mut checked = Vec::with_capacity(targets.len());
			for target in targets {
				let target = T::Lookup::lookup(target)?;
				if checked.contains(&target) {
					continue
				}
				let blocked = Self::intended_prefs(&target).map_or(false, |prefs| prefs.blocked);
				ensure!(!blocked || old.contains(&target), Error::<T>::BadTarget);
				checked.push(target);
			}

			let targets: BoundedVec<_, T::MaxNominations> =
				checked.try_into().map_err(|_| Error::<T>::TooManyTargets)?;
			let nominations =
				Nominations { targets, submitted_in: Self::current_era(), suppressed: false };
			let submitted = nominations.targets.to_vec();

			let effective_era = Self::queue_role(&stash, RoleChange::Nominate(nominations));
			Self::deposit_event(Event::<T>::Nominated { stash, targets: submitted, effective_era });

			Ok(())
		}

		/// Declare no desire to either validate or nominate, from the next era on.
		///
		/// Emits `Chilled`.
		#[pallet::call_index(6)]
		#[pallet::weight(T::WeightInfo::chill())]
		pub fn chill(origin: OriginFor<T>) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			Self::do_chill(&stash)
		}

		/// Pay rewards of the origin stash into `payee`.
		///
		/// Emits `PayeeSet`.
		#[pallet::call_index(7)]
		#[pallet::weight(T::WeightInfo::set_payee())]
		pub fn set_payee(origin: OriginFor<T>, payee: T::AccountId) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			Self::do_set_reward_destination(&stash, RewardDestination::Account(payee))
		}

		/// (Re-)set the reward destination of the origin stash.
		///
		/// Overwrites any payee set through [`Self::set_payee`].
		///
		/// Emits `PayeeSet`.
		#[pallet::call_index(8)]
		#[pallet::weight(T::WeightInfo::set_payee())]
		pub fn set_reward_destination(
			origin: OriginFor<T>,
			dest: RewardDestination<T::AccountId>,
		) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			Self::do_set_reward_destination(&stash, dest)
		}

		/// Remove the given nominations from the calling validator, from the next era on.
		///
		/// The origin must be a validator and every account in `who` must nominate it. Only the
		/// calling validator is dropped from their targets.
		///
		/// Emits `Kicked`.
		#[pallet::call_index(9)]
		#[pallet::weight(T::WeightInfo::kick(who.len() as u32))]
		pub fn kick(origin: OriginFor<T>, who: Vec<AccountIdLookupOf<T>>) -> DispatchResult {
			let stash = ensure_signed(origin)?;
			ensure!(Self::intended_prefs(&stash).is_some(), Error::<T>::NotAuthorized);

			for nominator in who {
				let nominator = T::Lookup::lookup(nominator)?;
				let mut nominations =
					Self::intended_nominations(&nominator).ok_or(Error::<T>::NotAuthorized)?;
				ensure!(nominations.targets.contains(&stash), Error::<T>::NotAuthorized);

				nominations.targets.retain(|target| target != &stash);
				Self::queue_role(&nominator, RoleChange::Nominate(nominations));
				Self::deposit_event(Event::<T>::Kicked { nominator, stash: stash.clone() });
			}

			Ok(())
		}

		/// Declare a `stash` to no longer validate or nominate.
		///
		/// If the caller is the stash this is the same as [`Self::chill`]. Anyone else can only
		/// chill a stash whose active bond is below the minimum of the role it holds, which can
		/// happen after `MinNominatorBond` or `MinValidatorBond` were raised, or a slash.
		///
		/// Emits `Chilled`.
		#[pallet::call_index(10)]
		#[pallet::weight(T::WeightInfo::chill_other())]
		pub fn chill_other(origin: OriginFor<T>, stash: T::AccountId) -> DispatchResult {
			let caller = ensure_signed(origin)?;

			if caller != stash {
				let ledger = StakingLedger::<T>::get(&stash).ok_or(Error::<T>::NotBonded)?;
				let min_active_bond = Self::intended_min_bond(&stash).ok_or(Error::<T>::NotStaking)?;
				ensure!(ledger.active < min_active_bond, Error::<T>::NotAuthorized);
			}

			Self::do_chill(&stash)
		}

		/// Force a validator to have at least the minimum commission. This will not affect a
		/// validator who already has a commission greater than or equal to the minimum. Any account
		/// can call this.
		#[pallet::call_index(11)]
		#[pallet::weight(T::WeightInfo::force_apply_min_commission())]
		pub fn force_apply_min_commission(
			origin: OriginFor<T>,
			validator_stash: T::AccountId,
		) -> DispatchResult {
			ensure_signed(origin)?;
			let min_commission = MinCommission::<T>::get();
			let mut found = false;

			if Validators::<T>::contains_key(&validator_stash) {
				found = true;
				Validators::<T>::mutate(&validator_stash, |prefs| {
					prefs.commission = prefs.commission.max(min_commission)
				});
			}

			PendingRoles::<T>::mutate(&validator_stash, |maybe_pending| {
				if let Some(PendingRole { change: RoleChange::Validate(prefs), .. }) = maybe_pending
				{
					found = true;
					prefs.commission = prefs.commission.max(min_commission);
				}
			});

			ensure!(found, Error::<T>::NotValidator);
			Ok(())
		}

		/// Rebond a portion of the stash scheduled to be unlocked.
		///
		/// The most recently scheduled chunks are rebonded first.
		///
		/// Emits `Rebonded`.
		#[pallet::call_index(12)]
		#[pallet::weight(T::WeightInfo::rebond(T::MaxUnlockingChunks::get() as u32))]
		pub fn rebond(
			origin: OriginFor<T>,
			#[pallet::compact] value: BalanceOf<T>,
		) -> DispatchResultWithPostInfo {
			let stash = ensure_signed(origin)?;
			let ledger = StakingLedger::<T>::get(&stash).ok_or(Error::<T>::NotBonded)?;
			ensure!(!ledger.unlocking.is_empty(), Error::<T>::NoUnlockChunk);

			let initial_unlocking = ledger.unlocking.len() as u32;
			let (ledger, rebonded_value) = ledger.rebond(value);
			// Last check: the new active amount of ledger must be more than ED.
			ensure!(
				ledger.active >= T::Currency::minimum_balance(),
				Error::<T>::InsufficientBond
			);

			let remaining_unlocking = ledger.unlocking.len() as u32;
			Self::deposit_event(Event::<T>::Rebonded { stash, amount: rebonded_value });
			ledger.update()?;

			let removed_chunks = 1u32 // for the case where the last iterated chunk is not removed
				.saturating_add(initial_unlocking)
				.saturating_sub(remaining_unlocking);
			Ok(Some(T::WeightInfo::rebond(removed_chunks)).into())
		}

		/// Pay out the lowest page of stakers behind a validator for the given era that has not
		/// been claimed yet.
		///
		/// See [`Self::payout_stakers_by_page`].
		#[pallet::call_index(13)]
		#[pallet::weight(T::WeightInfo::payout_stakers_by_page(T::MaxExposurePageSize::get()))]
		pub fn payout_stakers(
			origin: OriginFor<T>,
			validator_stash: T::AccountId,
			era: EraIndex,
		) -> DispatchResultWithPostInfo {
			ensure_signed(origin)?;
			let page = Eras::<T>::get_next_claimable_page(era, &validator_stash).unwrap_or(0);
			Self::do_payout_stakers_by_page(validator_stash, era, page)
		}

		/// Pay out a page of the stakers behind a validator for the given era and page.
		///
		/// - `validator_stash` is the stash account of the validator.
		/// - `era` may be any era between `[current_era - history_depth; current_era]`.
		/// - `page` is the page index of nominators to pay out with value between 0 and
		///   `num_nominators / T::MaxExposurePageSize`.
		///
		/// The origin of this call must be _Signed_. Any account can call this function, even if
		/// it is not one of the stakers.
		///
		/// The validator commission is paid out pro rata over the pages, the validator own stake
		/// is rewarded with page 0.
		///
		/// Emits `PayoutStarted` and one `Rewarded` per staker paid.
		#[pallet::call_index(14)]
		#[pallet::weight(T::WeightInfo::payout_stakers_by_page(T::MaxExposurePageSize::get()))]
		pub fn payout_stakers_by_page(
			origin: OriginFor<T>,
			validator_stash: T::AccountId,
			era: EraIndex,
			page: Page,
		) -> DispatchResultWithPostInfo {
			ensure_signed(origin)?;
			Self::do_payout_stakers_by_page(validator_stash, era, page)
		}

		/// Remove all data structures concerning a staker/stash once it is at a state where it can
		/// be considered `dust` in the staking system. The requirements are:
		///
		/// 1. the `total_balance` of the stash is below existential deposit.
		/// 2. or, the `ledger.total` of the stash is below existential deposit.
		///
		/// The former can happen in cases like a slash; the latter when a fully unbonded account
		/// is still receiving staking rewards in `RewardDestination::Staked`.
		///
		/// It can be called by anyone, as long as `stash` meets the above requirements.
		///
		/// Refunds the transaction fees upon successful execution.
		#[pallet::call_index(15)]
		#[pallet::weight(T::WeightInfo::reap_stash())]
		pub fn reap_stash(
			origin: OriginFor<T>,
			stash: T::AccountId,
			num_slashing_spans: u32,
		) -> DispatchResultWithPostInfo {
			ensure_signed(origin)?;

			let ed = T::Currency::minimum_balance();
			let ledger = StakingLedger::<T>::get(&stash).ok_or(Error::<T>::NotBonded)?;
			let reapable = T::Currency::total_balance(&stash) < ed || ledger.total < ed;
			ensure!(reapable, Error::<T>::FundedTarget);

			Self::kill_stash(&stash, num_slashing_spans)?;

			Ok(Pays::No.into())
		}

		/// Sets the ideal number of validators.
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(16)]
		#[pallet::weight(T::WeightInfo::set_validator_count())]
		pub fn set_validator_count(
			origin: OriginFor<T>,
			#[pallet::compact] new: u32,
		) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;

			ensure!(new <= T::MaxValidatorSet::get(), Error::<T>::TooManyValidators);

			ValidatorCount::<T>::put(new);
			Ok(())
		}

		/// Update the various staking configurations.
		///
		/// * `min_nominator_bond`: The minimum active bond needed to be a nominator.
		/// * `min_validator_bond`: The minimum active bond needed to be a validator.
		/// * `min_commission`: The minimum amount of commission that each validators must maintain.
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(17)]
		#[pallet::weight(T::WeightInfo::set_staking_configs())]
		pub fn set_staking_configs(
			origin: OriginFor<T>,
			min_nominator_bond: ConfigOp<BalanceOf<T>>,
			min_validator_bond: ConfigOp<BalanceOf<T>>,
			min_commission: ConfigOp<Perbill>,
		) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;

			macro_rules! config_op_exp {
				($storage:ty, $op:ident) => {
					match $op {
						ConfigOp::Noop => (),
						ConfigOp::Set(v) => <$storage>::put(v),
						ConfigOp::Remove => <$storage>::kill(),
					}
				};
			}

			config_op_exp!(MinNominatorBond<T>, min_nominator_bond);
			config_op_exp!(MinValidatorBond<T>, min_validator_bond);
			config_op_exp!(MinCommission<T>, min_commission);
			Ok(())
		}

		/// Force there to be no new eras indefinitely.
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(18)]
		#[pallet::weight(T::WeightInfo::force_era())]
		pub fn force_no_eras(origin: OriginFor<T>) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;
			Self::set_force_era(Forcing::ForceNone);
			Ok(())
		}

		/// Force there to be a new era at the end of the next session. After this, it will be
		/// reset to normal (non-forced) behaviour.
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(19)]
		#[pallet::weight(T::WeightInfo::force_era())]
		pub fn force_new_era(origin: OriginFor<T>) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;
			Self::set_force_era(Forcing::ForceNew);
			Ok(())
		}

		/// Force there to be a new era at the end of sessions indefinitely.
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(20)]
		#[pallet::weight(T::WeightInfo::force_era())]
		pub fn force_new_era_always(origin: OriginFor<T>) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;
			Self::set_force_era(Forcing::ForceAlways);
			Ok(())
		}

		/// Cancel enactment of a deferred slash.
		///
		/// Parameters: era and indices of the slashes for that era to kill. They must be sorted
		/// in ascending order, *and* unique. The reporter payout of every cancelled slash is
		/// added to [`CanceledSlashPayout`].
		///
		/// The dispatch origin must be `AdminOrigin`.
		#[pallet::call_index(21)]
		#[pallet::weight(T::WeightInfo::cancel_deferred_slash(slash_indices.len() as u32))]
		pub fn cancel_deferred_slash(
			origin: OriginFor<T>,
			era: EraIndex,
			slash_indices: Vec<u32>,
		) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;
			slashing::cancel_deferred_slashes::<T>(era, slash_indices)
		}
	}
}
