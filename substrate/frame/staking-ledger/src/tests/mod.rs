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

//! Tests for the module.

use super::*;
use frame_support::{
	assert_noop, assert_ok, dispatch::WithPostDispatchInfo, pallet_prelude::*, traits::Currency,
};
use mock::*;
use sp_runtime::{assert_eq_error_rate, traits::BadOrigin, Perbill};

mod payee;
mod slashing;

/// The amount locked by this pallet on `who`.
pub(crate) fn staking_lock(who: &AccountId) -> Balance {
	pallet_balances::Locks::<Test>::get(who)
		.iter()
		.find(|lock| lock.id == STAKING_ID)
		.map(|lock| lock.amount)
		.unwrap_or_default()
}

pub(crate) fn free(who: &AccountId) -> Balance {
	Balances::free_balance(who)
}

#[test]
fn basic_setup_works() {
	// Verifies initial conditions of mock
	ExtBuilder::default().build_and_execute(|| {
		assert_session_era!(0, 0);
		assert_eq!(current_era(), 1);

		// Account 11, 21 are stashes with a validator role effective from genesis.
		assert_eq!(
			Staking::ledger(&11),
			Some(StakingLedger::<Test> {
				stash: 11,
				total: 1000,
				active: 1000,
				unlocking: Default::default(),
			})
		);
		assert_eq!(Staking::status(&11), StakingStatus::Validator);
		assert_eq!(Staking::status(&21), StakingStatus::Validator);
		assert_eq!(Staking::validators(&11), Some(ValidatorPrefs::default()));

		// Account 101 nominates both of them.
		assert_eq!(Staking::status(&101), StakingStatus::Nominator(vec![11, 21]));
		assert_eq!(Staking::nominations(&101).unwrap().targets.into_inner(), vec![11, 21]);

		// everybody is paid in stake at genesis, and the full stake is locked.
		for stash in [11, 21, 101] {
			assert_eq!(Staking::payee(&stash), Some(RewardDestination::Staked));
			assert_eq!(staking_lock(&stash), Staking::bonded_stake(&stash));
			assert_eq!(Staking::pending_role(&stash), None);
		}

		// Nobody else is staking.
		assert_eq!(Staking::status(&1), StakingStatus::NotStaking);
		assert_eq!(Staking::bonded_stake(&1), 0);

		// era 0 is snapshotted.
		assert_eq!(Staking::eras_total_stake(0), 2500);
		assert_eq!(Staking::eras_start_session_index(0), Some(0));
		assert_eq!(Staking::eras_validator_reward(0), None);

		assert_eq!(Staking::validator_count(), 2);
		assert_eq!(Staking::min_validator_bond(), 1);
		assert_eq!(Staking::min_nominator_bond(), 1);
		assert_eq!(Staking::min_commission(), Perbill::zero());
	});
}

#[test]
fn constants_are_exposed() {
	ExtBuilder::default()
		.history_depth(10)
		.bonding_duration(5)
		.slash_defer_duration(2)
		.build_and_execute(|| {
			assert_eq!(
				Staking::constants(),
				StakingConstants {
					history_depth: 10,
					sessions_per_era: 3,
					bonding_duration: 5,
					slash_defer_duration: 2,
					max_exposure_page_size: 64,
					max_unlocking_chunks: 32,
					max_nominations: 16,
					max_validator_set: 100,
				}
			);
		});
}

#[test]
fn set_staking_configs_works() {
	ExtBuilder::default().build_and_execute(|| {
		// only the admin origin can update the configs.
		assert_noop!(
			Staking::set_staking_configs(
				RuntimeOrigin::signed(2),
				ConfigOp::Set(10),
				ConfigOp::Noop,
				ConfigOp::Noop,
			),
			BadOrigin
		);

		assert_ok!(Staking::set_staking_configs(
			RuntimeOrigin::root(),
			ConfigOp::Set(10),
			ConfigOp::Set(20),
			ConfigOp::Set(Perbill::from_percent(5)),
		));
		assert_eq!(MinNominatorBond::<Test>::get(), 10);
		assert_eq!(MinValidatorBond::<Test>::get(), 20);
		assert_eq!(MinCommission::<Test>::get(), Perbill::from_percent(5));

		// noop does nothing
		assert_ok!(Staking::set_staking_configs(
			RuntimeOrigin::signed(1),
			ConfigOp::Noop,
			ConfigOp::Noop,
			ConfigOp::Noop,
		));
		assert_eq!(MinNominatorBond::<Test>::get(), 10);
		assert_eq!(MinValidatorBond::<Test>::get(), 20);

		// removing sets things back to the defaults
		assert_ok!(Staking::set_staking_configs(
			RuntimeOrigin::root(),
			ConfigOp::Remove,
			ConfigOp::Remove,
			ConfigOp::Remove,
		));
		assert_eq!(MinNominatorBond::<Test>::get(), 0);
		assert_eq!(MinValidatorBond::<Test>::get(), 0);
		assert_eq!(MinCommission::<Test>::get(), Perbill::zero());
	});
}

#[test]
fn set_validator_count_works() {
	ExtBuilder::default().build_and_execute(|| {
		assert_noop!(Staking::set_validator_count(RuntimeOrigin::signed(2), 5), BadOrigin);
		assert_noop!(
			Staking::set_validator_count(RuntimeOrigin::root(), 101),
			Error::<Test>::TooManyValidators
		);

		assert_ok!(Staking::set_validator_count(RuntimeOrigin::root(), 100));
		assert_eq!(Staking::validator_count(), 100);

		// account 1 is an admin as well.
		assert_ok!(Staking::set_validator_count(RuntimeOrigin::signed(1), 1));
		assert_eq!(ValidatorCount::<Test>::get(), 1);
	});
}

#[test]
fn try_state_detects_corrupted_ledger() {
	ExtBuilder::default().try_state(false).build_and_execute(|| {
		assert_ok!(Staking::do_try_state(System::block_number()));

		Ledger::<Test>::mutate(&11, |maybe_ledger| {
			if let Some(ledger) = maybe_ledger {
				ledger.total += 1;
			}
		});
		assert!(Staking::do_try_state(System::block_number()).is_err());
	});
}
