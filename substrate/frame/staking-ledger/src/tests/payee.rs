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

use super::*;

#[test]
fn set_payee_works() {
	ExtBuilder::default().build_and_execute(|| {
		assert_noop!(Staking::set_payee(RuntimeOrigin::signed(3), 4), Error::<T>::NotBonded);

		assert_ok!(Staking::set_payee(RuntimeOrigin::signed(11), 4));
		assert_eq!(Staking::payee(&11), Some(RewardDestination::Account(4)));
		assert_eq!(
			staking_events_since_last_call(),
			vec![Event::PayeeSet { stash: 11, payee: RewardDestination::Account(4) }]
		);

		// the stash itself is a valid custom payee too.
		assert_ok!(Staking::set_payee(RuntimeOrigin::signed(11), 11));
		assert_eq!(Staking::payee(&11), Some(RewardDestination::Account(11)));
	});
}

#[test]
fn set_reward_destination_overrides_payee() {
	ExtBuilder::default().build_and_execute(|| {
		assert_noop!(
			Staking::set_reward_destination(RuntimeOrigin::signed(3), RewardDestination::Stash),
			Error::<T>::NotBonded
		);

		assert_ok!(Staking::set_payee(RuntimeOrigin::signed(101), 4));
		assert_ok!(Staking::set_reward_destination(
			RuntimeOrigin::signed(101),
			RewardDestination::None
		));
		assert_eq!(Staking::payee(&101), Some(RewardDestination::None));

		assert_ok!(Staking::set_reward_destination(
			RuntimeOrigin::signed(101),
			RewardDestination::Stash
		));
		assert_eq!(Staking::payee(&101), Some(RewardDestination::Stash));
		assert_eq!(
			*staking_events_since_last_call().last().unwrap(),
			Event::PayeeSet { stash: 101, payee: RewardDestination::Stash }
		);
	});
}

#[test]
fn payee_is_removed_with_the_stash() {
	ExtBuilder::default().build_and_execute(|| {
		bond(3, 100);
		assert_ok!(Staking::set_payee(RuntimeOrigin::signed(3), 4));

		assert_ok!(Staking::unbond(RuntimeOrigin::signed(3), 100));
		start_active_era(3);
		assert_ok!(Staking::withdraw_unbonded(RuntimeOrigin::signed(3), 0));

		assert_eq!(Staking::payee(&3), None);
		assert_eq!(Staking::status(&3), StakingStatus::NotStaking);
	});
}

#[test]
fn rewards_follow_the_destination() {
	ExtBuilder::default().build_and_execute(|| {
		// 11 is paid into 4, 101 into its free balance.
		assert_ok!(Staking::set_payee(RuntimeOrigin::signed(11), 4));
		assert_ok!(Staking::set_reward_destination(
			RuntimeOrigin::signed(101),
			RewardDestination::Stash
		));
		// 21 is not paid at all.
		assert_ok!(Staking::set_reward_destination(
			RuntimeOrigin::signed(21),
			RewardDestination::None
		));

		reward_all_exposed(1);
		start_active_era(1);

		let issuance = Balances::total_issuance();
		let (free_4, free_101, free_21) = (free(&4), free(&101), free(&21));
		make_all_reward_payment(0);

		// 11 and 21 each have half of the 3000 pool: 1200 for the validator, 300 for 101.
		assert_eq!(free(&4), free_4 + 1200);
		assert_eq!(Staking::bonded_stake(&11), 1000);
		assert_eq!(free(&101), free_101 + 600);
		assert_eq!(Staking::bonded_stake(&101), 500);
		assert_eq!(free(&21), free_21);
		assert_eq!(Staking::bonded_stake(&21), 1000);

		// nothing is minted for 21.
		assert_eq!(Balances::total_issuance(), issuance + 1800);
		assert!(staking_events_since_last_call().contains(&Event::Rewarded {
			stash: 11,
			dest: RewardDestination::Account(4),
			amount: 1200,
		}));
	});
}

#[test]
fn staked_rewards_are_bonded() {
	ExtBuilder::default().build_and_execute(|| {
		reward_all_exposed(1);
		start_active_era(1);

		let free_11 = free(&11);
		make_all_reward_payment(0);

		assert_eq!(free(&11), free_11 + 1200);
		assert_eq!(Staking::bonded_stake(&11), 2200);
		assert_eq!(Staking::ledger(&11).unwrap().total, 2200);
		assert_eq!(staking_lock(&11), 2200);
		assert_eq!(Staking::bonded_stake(&101), 1100);
	});
}
