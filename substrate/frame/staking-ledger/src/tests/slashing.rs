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
fn slashes_are_applied_immediately_without_deferral() {
	ExtBuilder::default().build_and_execute(|| {
		let issuance = Balances::total_issuance();
		let free_11 = free(&11);

		// 3 is not bonded and is skipped.
		Staking::on_offence_slash(0, unapplied_slash(11, 100, vec![(101, 50), (3, 10)]));

		assert_eq!(
			staking_events_since_last_call(),
			vec![
				Event::Slashed { staker: 11, amount: 100 },
				Event::Slashed { staker: 101, amount: 50 },
			]
		);
		assert_eq!(Staking::bonded_stake(&11), 900);
		assert_eq!(Staking::ledger(&11).unwrap().total, 900);
		assert_eq!(staking_lock(&11), 900);
		assert_eq!(free(&11), free_11 - 100);
		assert_eq!(Staking::bonded_stake(&101), 450);
		assert_eq!(free(&3), 10_001);

		assert_eq!(Staking::slashing_spans(&11), 1);
		assert_eq!(Staking::slashing_spans(&101), 1);
		assert_eq!(Staking::slashing_spans(&3), 0);

		// slashed funds are burned.
		assert_eq!(Balances::total_issuance(), issuance - 150);
	});
}

#[test]
fn reporter_is_paid_out_of_the_slash() {
	ExtBuilder::default().build_and_execute(|| {
		let issuance = Balances::total_issuance();
		let free_4 = free(&4);

		let slash =
			UnappliedSlash { reporter: Some(4), payout: 30, ..unapplied_slash(11, 100, vec![]) };
		Staking::on_offence_slash(0, slash);

		assert_eq!(free(&4), free_4 + 30);
		assert_eq!(Balances::total_issuance(), issuance - 70);

		// the reward can never exceed what was slashed.
		let slash =
			UnappliedSlash { reporter: Some(4), payout: 1000, ..unapplied_slash(21, 10, vec![]) };
		Staking::on_offence_slash(0, slash);
		assert_eq!(free(&4), free_4 + 40);
	});
}

#[test]
fn deferred_slashes_are_applied_later() {
	ExtBuilder::default().slash_defer_duration(2).build_and_execute(|| {
		Staking::on_offence_slash(0, unapplied_slash(11, 100, vec![(101, 50)]));

		assert_eq!(
			staking_events_since_last_call(),
			vec![Event::SlashReported { validator: 11, slash_era: 0, apply_at: 2 }]
		);
		assert_eq!(UnappliedSlashes::<T>::get(2).len(), 1);
		assert_eq!(Staking::bonded_stake(&11), 1000);

		start_active_era(1);
		assert_eq!(Staking::bonded_stake(&11), 1000);

		start_active_era(2);
		assert_eq!(Staking::bonded_stake(&11), 900);
		assert_eq!(Staking::bonded_stake(&101), 450);
		assert!(UnappliedSlashes::<T>::get(2).is_empty());

		// applied before the exposures of era 2 were taken.
		assert_eq!(Staking::eras_stakers_overview(2, &11).unwrap().own, 900);
		assert!(staking_events()
			.iter()
			.any(|e| *e == Event::Slashed { staker: 101, amount: 50 }));
	});
}

#[test]
fn late_reported_slashes_use_the_offence_era() {
	ExtBuilder::default().slash_defer_duration(2).build_and_execute(|| {
		assert_ok!(Staking::unbond(RuntimeOrigin::signed(101), 200));
		start_active_era(2);
		let _ = staking_events_since_last_call();

		// committed in era 0, reported in era 2 and due in era 4.
		Staking::on_offence_slash(0, unapplied_slash(11, 0, vec![(101, 100)]));
		assert_eq!(
			staking_events_since_last_call(),
			vec![Event::SlashReported { validator: 11, slash_era: 0, apply_at: 4 }]
		);
		assert_eq!(
			UnappliedSlashes::<T>::get(4),
			vec![(0, unapplied_slash(11, 0, vec![(101, 100)]))]
		);

		start_active_era(4);
		// the chunk unlocking in era 4 is liable for an offence of era 0 and shares the slash.
		let ledger = Staking::ledger(&101).unwrap();
		assert_eq!(ledger.active, 240);
		assert_eq!(ledger.total, 400);
		assert_eq!(ledger.unlocking.into_inner(), vec![UnlockChunk { value: 160, era: 4 }]);
		assert_eq!(staking_lock(&101), 400);
	});
}

#[test]
fn cancel_deferred_slash_works() {
	ExtBuilder::default().slash_defer_duration(2).build_and_execute(|| {
		let slash = |validator, payout| UnappliedSlash {
			reporter: Some(4),
			payout,
			..unapplied_slash(validator, 100, vec![])
		};
		Staking::on_offence_slash(0, slash(11, 10));
		Staking::on_offence_slash(0, slash(21, 20));

		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::signed(2), 2, vec![0]),
			BadOrigin
		);
		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::root(), 2, vec![]),
			Error::<T>::EmptyTargets
		);
		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::root(), 2, vec![1, 0]),
			Error::<T>::NotSortedAndUnique
		);
		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::root(), 2, vec![0, 0]),
			Error::<T>::NotSortedAndUnique
		);
		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::root(), 2, vec![2]),
			Error::<T>::InvalidSlashIndex
		);
		// nothing is due in era 1.
		assert_noop!(
			Staking::cancel_deferred_slash(RuntimeOrigin::root(), 1, vec![0]),
			Error::<T>::InvalidSlashIndex
		);

		let _ = staking_events_since_last_call();
		assert_ok!(Staking::cancel_deferred_slash(RuntimeOrigin::root(), 2, vec![0]));
		assert_eq!(
			staking_events_since_last_call(),
			vec![Event::SlashCancelled { slash_era: 2, validator: 11 }]
		);
		assert_eq!(Staking::canceled_slash_payout(), 10);

		start_active_era(2);
		assert_eq!(Staking::bonded_stake(&11), 1000);
		assert_eq!(Staking::bonded_stake(&21), 900);
	});
}

#[test]
fn old_slashing_reports_are_discarded() {
	ExtBuilder::default().build_and_execute(|| {
		start_active_era(4);
		let _ = staking_events_since_last_call();

		Staking::on_offence_slash(0, unapplied_slash(11, 100, vec![]));
		assert_eq!(
			staking_events_since_last_call(),
			vec![Event::OldSlashingReportDiscarded { slash_era: 0 }]
		);
		assert_eq!(Staking::ledger(&11).unwrap().total, 1000);

		// still within the bonding period.
		Staking::on_offence_slash(1, unapplied_slash(11, 100, vec![]));
		assert_eq!(Staking::ledger(&11).unwrap().total, 900);
	});
}

#[test]
fn unlocking_chunks_are_slashed_proportionally() {
	ExtBuilder::default().build_and_execute(|| {
		assert_ok!(Staking::unbond(RuntimeOrigin::signed(101), 200));

		// the chunk unlocks after the bonding period of era 0, so it is liable.
		Staking::on_offence_slash(0, unapplied_slash(11, 0, vec![(101, 300)]));

		let ledger = Staking::ledger(&101).unwrap();
		assert_eq!(ledger.active, 120);
		assert_eq!(ledger.total, 200);
		assert_eq!(ledger.unlocking.into_inner(), vec![UnlockChunk { value: 80, era: 4 }]);
		assert_eq!(staking_lock(&101), 200);
	});
}

#[test]
fn active_stake_is_slashed_first_for_later_offences() {
	ExtBuilder::default().build_and_execute(|| {
		assert_ok!(Staking::unbond(RuntimeOrigin::signed(101), 200));
		start_active_era(2);

		// the chunk at era 4 is not liable for an offence in era 2.
		Staking::on_offence_slash(2, unapplied_slash(11, 0, vec![(101, 350)]));

		let ledger = Staking::ledger(&101).unwrap();
		assert_eq!(ledger.active, 0);
		assert_eq!(ledger.total, 150);
		assert_eq!(ledger.unlocking.into_inner(), vec![UnlockChunk { value: 150, era: 4 }]);
	});
}

#[test]
fn slashing_spans_must_be_acknowledged() {
	ExtBuilder::default().build_and_execute(|| {
		Staking::on_offence_slash(0, unapplied_slash(11, 100, vec![]));
		assert_eq!(Staking::slashing_spans(&11), 1);

		assert_ok!(Staking::chill(RuntimeOrigin::signed(11)));
		assert_ok!(Staking::unbond(RuntimeOrigin::signed(11), 900));
		start_active_era(3);

		assert_noop!(
			Staking::withdraw_unbonded(RuntimeOrigin::signed(11), 0),
			Error::<T>::IncorrectSlashingSpans
		);
		assert_ok!(Staking::withdraw_unbonded(RuntimeOrigin::signed(11), 1));

		assert_eq!(Staking::ledger(&11), None);
		assert_eq!(Staking::slashing_spans(&11), 0);
		assert_eq!(staking_lock(&11), 0);
	});
}
