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

//! Test utilities

use crate::{self as pallet_staking_ledger, session_rotation::Rotator, *};

use frame_support::{
	assert_ok, derive_impl, ord_parameter_types, parameter_types,
	traits::{ConstU32, Currency as _, EitherOfDiverse, Imbalance, OnUnbalanced},
	weights::constants::RocksDbWeight,
};
use frame_system::{EnsureRoot, EnsureSignedBy};
use sp_io;
use sp_runtime::BuildStorage;
use sp_staking::{EraIndex, SessionIndex};

frame_support::construct_runtime!(
	pub enum Test {
		System: frame_system,
		Balances: pallet_balances,
		Staking: pallet_staking_ledger,
	}
);

pub(crate) type T = Test;
pub(crate) type AccountId = <Test as frame_system::Config>::AccountId;
pub(crate) type Balance = <Test as pallet_balances::Config>::Balance;

parameter_types! {
	pub static ExistentialDeposit: Balance = 1;
	pub static SessionsPerEra: SessionIndex = 3;
	pub static SlashDeferDuration: EraIndex = 0;
	pub static BondingDuration: EraIndex = 3;
	pub static HistoryDepth: u32 = 80;
	pub static MaxExposurePageSize: u32 = 64;
	pub static MaxUnlockingChunks: u32 = 32;
	pub static MaxNominations: u32 = 16;
	pub static MaxValidatorSet: u32 = 100;
	pub static RewardOnUnbalanceWasCalled: bool = false;
}

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
	type DbWeight = RocksDbWeight;
	type Block = frame_system::mocking::MockBlock<Test>;
	type AccountData = pallet_balances::AccountData<Balance>;
}

#[derive_impl(pallet_balances::config_preludes::TestDefaultConfig)]
impl pallet_balances::Config for Test {
	type MaxLocks = ConstU32<1024>;
	type Balance = u128;
	type ExistentialDeposit = ExistentialDeposit;
	type AccountStore = System;
}

parameter_types! {
	pub static RewardRemainderUnbalanced: u128 = 0;
}

pub struct RewardRemainderMock;

impl OnUnbalanced<NegativeImbalanceOf<Test>> for RewardRemainderMock {
	fn on_nonzero_unbalanced(amount: NegativeImbalanceOf<Test>) {
		RewardRemainderUnbalanced::mutate(|v| {
			*v += amount.peek();
		});
		drop(amount);
	}
}

pub struct MockReward {}
impl OnUnbalanced<PositiveImbalanceOf<Test>> for MockReward {
	fn on_unbalanced(_: PositiveImbalanceOf<Test>) {
		RewardOnUnbalanceWasCalled::set(true);
	}
}

parameter_types! {
	pub static ValidatorPayout: Balance = 3000;
	pub static PayoutRemainder: Balance = 0;
	pub static LastEraLength: SessionIndex = 0;
}

/// Pays a fixed amount every era, regardless of stake and issuance.
pub struct FixedEraPayout;
impl EraPayout<Balance> for FixedEraPayout {
	fn era_payout(
		_total_staked: Balance,
		_total_issuance: Balance,
		era_length: SessionIndex,
	) -> (Balance, Balance) {
		LastEraLength::set(era_length);
		(ValidatorPayout::get(), PayoutRemainder::get())
	}
}

ord_parameter_types! {
	pub const One: u64 = 1;
}

impl crate::pallet::pallet::Config for Test {
	type Currency = Balances;
	type CurrencyBalance = Balance;
	type EraPayout = FixedEraPayout;
	type RewardRemainder = RewardRemainderMock;
	type Slash = ();
	type Reward = MockReward;
	type AdminOrigin = EitherOfDiverse<EnsureRoot<AccountId>, EnsureSignedBy<One, AccountId>>;
	type SessionsPerEra = SessionsPerEra;
	type BondingDuration = BondingDuration;
	type SlashDeferDuration = SlashDeferDuration;
	type HistoryDepth = HistoryDepth;
	type MaxExposurePageSize = MaxExposurePageSize;
	type MaxUnlockingChunks = MaxUnlockingChunks;
	type MaxNominations = MaxNominations;
	type MaxValidatorSet = MaxValidatorSet;
	type WeightInfo = ();
}

parameter_types! {
	// if true, skips the try-state for the test running.
	pub static SkipTryStateCheck: bool = false;
}

pub struct ExtBuilder {
	validator_count: u32,
	has_stakers: bool,
	min_nominator_bond: Balance,
	min_validator_bond: Balance,
	min_commission: Perbill,
	stakers: Vec<(AccountId, Balance, StakerStatus<AccountId>)>,
	flush_events: bool,
}

impl Default for ExtBuilder {
	fn default() -> Self {
		Self {
			validator_count: 2,
			has_stakers: true,
			min_nominator_bond: ExistentialDeposit::get(),
			min_validator_bond: ExistentialDeposit::get(),
			min_commission: Perbill::zero(),
			stakers: Default::default(),
			flush_events: true,
		}
	}
}

#[allow(unused)]
impl ExtBuilder {
	pub(crate) fn existential_deposit(self, existential_deposit: Balance) -> Self {
		ExistentialDeposit::set(existential_deposit);
		self
	}
	pub(crate) fn max_unlock_chunks(self, max: u32) -> Self {
		MaxUnlockingChunks::set(max);
		self
	}
	pub(crate) fn bonding_duration(self, bonding_duration: EraIndex) -> Self {
		BondingDuration::set(bonding_duration);
		self
	}
	pub(crate) fn slash_defer_duration(self, eras: EraIndex) -> Self {
		SlashDeferDuration::set(eras);
		self
	}
	pub(crate) fn session_per_era(self, length: SessionIndex) -> Self {
		SessionsPerEra::set(length);
		self
	}
	pub(crate) fn history_depth(self, depth: u32) -> Self {
		HistoryDepth::set(depth);
		self
	}
	pub(crate) fn exposures_page_size(self, max: u32) -> Self {
		MaxExposurePageSize::set(max);
		self
	}
	pub(crate) fn max_nominations(self, max: u32) -> Self {
		MaxNominations::set(max);
		self
	}
	pub(crate) fn no_flush_events(mut self) -> Self {
		self.flush_events = false;
		self
	}
	pub(crate) fn validator_count(mut self, count: u32) -> Self {
		self.validator_count = count;
		self
	}
	pub(crate) fn has_stakers(mut self, has: bool) -> Self {
		self.has_stakers = has;
		self
	}
	pub(crate) fn min_nominator_bond(mut self, amount: Balance) -> Self {
		self.min_nominator_bond = amount;
		self
	}
	pub(crate) fn min_validator_bond(mut self, amount: Balance) -> Self {
		self.min_validator_bond = amount;
		self
	}
	pub(crate) fn min_commission(mut self, commission: Perbill) -> Self {
		self.min_commission = commission;
		self
	}
	pub(crate) fn add_staker(
		mut self,
		stash: AccountId,
		stake: Balance,
		status: StakerStatus<AccountId>,
	) -> Self {
		self.stakers.push((stash, stake, status));
		self
	}
	pub(crate) fn try_state(self, enable: bool) -> Self {
		SkipTryStateCheck::set(!enable);
		self
	}

	fn build(self) -> sp_io::TestExternalities {
		sp_tracing::try_init_simple();
		let mut storage = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
		let ed = ExistentialDeposit::get();

		let mut stakers = if self.has_stakers {
			vec![
				// (stash, stake, status)
				(11, 1000, StakerStatus::<AccountId>::Validator),
				(21, 1000, StakerStatus::<AccountId>::Validator),
				(101, 500, StakerStatus::<AccountId>::Nominator(vec![11, 21])),
			]
		} else {
			vec![]
		};
		stakers.extend(self.stakers);

		let aux_balances = vec![
			// aux accounts
			(1, ed + 10_000),
			(2, ed + 10_000),
			(3, ed + 10_000),
			(4, ed + 10_000),
			// never staking, only here to pay into.
			(999, 1_000_000),
		];
		// given each stakers their stake + ed as balance.
		let stakers_balances = stakers.clone().into_iter().map(|(who, stake, _)| (who, stake + ed));
		let balances = aux_balances.into_iter().chain(stakers_balances).collect::<Vec<_>>();

		let _ = pallet_balances::GenesisConfig::<Test> { balances, ..Default::default() }
			.assimilate_storage(&mut storage);

		let _ = pallet_staking_ledger::GenesisConfig::<Test> {
			stakers,
			validator_count: self.validator_count,
			min_nominator_bond: self.min_nominator_bond,
			min_validator_bond: self.min_validator_bond,
			min_commission: self.min_commission,
			..Default::default()
		}
		.assimilate_storage(&mut storage);

		let mut ext = sp_io::TestExternalities::from(storage);
		ext.execute_with(|| {
			// events are not deposited in the genesis block.
			System::set_block_number(1);
			RewardRemainderUnbalanced::set(0);
			RewardOnUnbalanceWasCalled::set(false);
			if self.flush_events {
				let _ = staking_events_since_last_call();
			}
		});

		ext
	}

	pub fn build_and_execute(self, test: impl FnOnce() -> ()) {
		let mut ext = self.build();
		ext.execute_with(test);
		ext.execute_with(|| {
			if !SkipTryStateCheck::get() {
				Staking::do_try_state(System::block_number()).unwrap();
			}
		});
	}
}

pub(crate) fn active_era() -> EraIndex {
	pallet_staking_ledger::ActiveEra::<Test>::get().unwrap().index
}

pub(crate) fn current_era() -> EraIndex {
	pallet_staking_ledger::CurrentEra::<Test>::get().unwrap()
}

pub(crate) fn current_session() -> SessionIndex {
	pallet_staking_ledger::CurrentSession::<Test>::get()
}

/// End the running session, as the session module would.
pub(crate) fn advance_session() {
	System::set_block_number(System::block_number() + 1);
	Rotator::<Test>::end_session(current_session());
}

pub(crate) fn start_session(session: SessionIndex) {
	while current_session() < session {
		advance_session();
	}
}

pub(crate) fn start_active_era(era: EraIndex) {
	while active_era() < era {
		advance_session();
	}
}

pub(crate) fn bond(who: AccountId, val: Balance) {
	let _ = Balances::make_free_balance_be(&who, val + ExistentialDeposit::get());
	assert_ok!(Staking::bond(RuntimeOrigin::signed(who), val, RewardDestination::Stash));
}

pub(crate) fn bond_validator(who: AccountId, val: Balance) {
	bond(who, val);
	assert_ok!(Staking::validate(RuntimeOrigin::signed(who), ValidatorPrefs::default()));
}

pub(crate) fn bond_nominator(who: AccountId, val: Balance, target: Vec<AccountId>) {
	bond(who, val);
	assert_ok!(Staking::nominate(RuntimeOrigin::signed(who), target));
}

/// Give every validator exposed in the active era `points` reward points.
pub(crate) fn reward_all_exposed(points: RewardPoint) {
	let exposed = ErasStakersOverview::<Test>::iter_prefix(active_era())
		.map(|(v, _)| (v, points))
		.collect::<Vec<_>>();
	<Pallet<Test>>::reward_by_ids(exposed)
}

/// Make all validator and nominator request their payment
pub(crate) fn make_all_reward_payment(era: EraIndex) {
	let validators_with_reward = ErasRewardPoints::<Test>::get(era)
		.individual
		.keys()
		.cloned()
		.collect::<Vec<_>>();

	for validator in validators_with_reward {
		for page in 0..Staking::eras_stakers_page_count(era, &validator) {
			assert_ok!(Staking::payout_stakers_by_page(
				RuntimeOrigin::signed(1337),
				validator,
				era,
				page
			));
		}
	}
}

pub(crate) fn unapplied_slash(
	validator: AccountId,
	own: Balance,
	others: Vec<(AccountId, Balance)>,
) -> UnappliedSlash<Test> {
	UnappliedSlash { validator, own, others, reporter: None, payout: 0 }
}

#[macro_export]
macro_rules! assert_session_era {
	($session:expr, $era:expr) => {
		assert_eq!(
			current_session(),
			$session,
			"wrong session {} != {}",
			current_session(),
			$session,
		);
		assert_eq!(active_era(), $era, "wrong active era {} != {}", active_era(), $era,);
	};
}

pub(crate) fn staking_events() -> Vec<crate::Event<Test>> {
	System::events()
		.into_iter()
		.map(|r| r.event)
		.filter_map(|e| if let RuntimeEvent::Staking(inner) = e { Some(inner) } else { None })
		.collect()
}

parameter_types! {
	static StakingEventsIndex: usize = 0;
}

pub(crate) fn staking_events_since_last_call() -> Vec<crate::Event<Test>> {
	let all: Vec<_> = System::events()
		.into_iter()
		.filter_map(|r| if let RuntimeEvent::Staking(inner) = r.event { Some(inner) } else { None })
		.collect();
	let seen = StakingEventsIndex::get();
	StakingEventsIndex::set(all.len());
	all.into_iter().skip(seen).collect()
}
