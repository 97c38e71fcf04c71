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

//! Weights for `pallet_staking_ledger`.
//!
//! Hand-written estimates expressed in storage accesses plus a flat execution cost, until the
//! pallet gets benchmarks of its own.

#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

/// Weight functions needed for `pallet_staking_ledger`.
pub trait WeightInfo {
	fn bond() -> Weight;
	fn bond_extra() -> Weight;
	fn unbond() -> Weight;
	fn withdraw_unbonded_update() -> Weight;
	fn withdraw_unbonded_kill() -> Weight;
	fn validate() -> Weight;
	fn nominate(n: u32, ) -> Weight;
	fn chill() -> Weight;
	fn set_payee() -> Weight;
	fn kick(k: u32, ) -> Weight;
	fn chill_other() -> Weight;
	fn force_apply_min_commission() -> Weight;
	fn rebond(l: u32, ) -> Weight;
	fn payout_stakers_by_page(n: u32, ) -> Weight;
	fn reap_stash() -> Weight;
	fn set_validator_count() -> Weight;
	fn set_staking_configs() -> Weight;
	fn force_era() -> Weight;
	fn cancel_deferred_slash(s: u32, ) -> Weight;
}

/// Weights for `pallet_staking_ledger` using a runtime's database weights.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `StakingLedger::Payee` (r:0 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	/// Storage: `System::Account` (r:1 w:1)
	fn bond() -> Weight {
		Weight::from_parts(45_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(3_u64))
			.saturating_add(T::DbWeight::get().writes(4_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	fn bond_extra() -> Weight {
		Weight::from_parts(38_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(3_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `StakingLedger::PendingRoles` (r:1 w:0)
	/// Storage: `StakingLedger::Validators` (r:1 w:0)
	/// Storage: `StakingLedger::MinValidatorBond` (r:1 w:0)
	/// Storage: `Balances::Locks` (r:1 w:1)
	fn unbond() -> Weight {
		Weight::from_parts(52_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(7_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	fn withdraw_unbonded_update() -> Weight {
		Weight::from_parts(40_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(4_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `StakingLedger::Payee` (r:0 w:1)
	/// Storage: `StakingLedger::SlashingSpans` (r:1 w:1)
	/// Storage: `StakingLedger::PendingRoles` (r:1 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	/// Storage: `System::Account` (r:1 w:1)
	fn withdraw_unbonded_kill() -> Weight {
		Weight::from_parts(68_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(8_u64))
			.saturating_add(T::DbWeight::get().writes(8_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:0)
	/// Storage: `StakingLedger::MinValidatorBond` (r:1 w:0)
	/// Storage: `StakingLedger::MinCommission` (r:1 w:0)
	/// Storage: `StakingLedger::PendingRoles` (r:0 w:1)
	fn validate() -> Weight {
		Weight::from_parts(30_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(4_u64))
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:0)
	/// Storage: `StakingLedger::MinNominatorBond` (r:1 w:0)
	/// Storage: `StakingLedger::Validators` (r:16 w:0)
	/// The range of component `n` is `[1, 16]`.
	fn nominate(n: u32, ) -> Weight {
		Weight::from_parts(35_000_000, 4764)
			.saturating_add(Weight::from_parts(3_500_000, 0).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(4_u64))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::PendingRoles` (r:1 w:1)
	/// Storage: `StakingLedger::Validators` (r:1 w:0)
	/// Storage: `StakingLedger::Nominators` (r:1 w:0)
	fn chill() -> Weight {
		Weight::from_parts(25_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(4_u64))
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:0)
	/// Storage: `StakingLedger::Payee` (r:0 w:1)
	fn set_payee() -> Weight {
		Weight::from_parts(15_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(1_u64))
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::PendingRoles` (r:128 w:128)
	/// Storage: `StakingLedger::Nominators` (r:128 w:0)
	/// The range of component `k` is `[1, 128]`.
	fn kick(k: u32, ) -> Weight {
		Weight::from_parts(22_000_000, 4764)
			.saturating_add(Weight::from_parts(9_000_000, 0).saturating_mul(k.into()))
			.saturating_add(T::DbWeight::get().reads(3_u64))
			.saturating_add(T::DbWeight::get().reads((2_u64).saturating_mul(k.into())))
			.saturating_add(T::DbWeight::get().writes((1_u64).saturating_mul(k.into())))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:0)
	/// Storage: `StakingLedger::PendingRoles` (r:1 w:1)
	/// Storage: `StakingLedger::MinNominatorBond` (r:1 w:0)
	/// Storage: `StakingLedger::MinValidatorBond` (r:1 w:0)
	fn chill_other() -> Weight {
		Weight::from_parts(32_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(6_u64))
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::MinCommission` (r:1 w:0)
	/// Storage: `StakingLedger::Validators` (r:1 w:1)
	/// Storage: `StakingLedger::PendingRoles` (r:1 w:1)
	fn force_apply_min_commission() -> Weight {
		Weight::from_parts(20_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(3_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	/// The range of component `l` is `[1, 32]`.
	fn rebond(l: u32, ) -> Weight {
		Weight::from_parts(40_000_000, 4764)
			.saturating_add(Weight::from_parts(60_000, 0).saturating_mul(l.into()))
			.saturating_add(T::DbWeight::get().reads(3_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
	/// Storage: `StakingLedger::CurrentEra` (r:1 w:0)
	/// Storage: `StakingLedger::ErasValidatorReward` (r:1 w:0)
	/// Storage: `StakingLedger::ErasStakersOverview` (r:1 w:0)
	/// Storage: `StakingLedger::ClaimedRewards` (r:1 w:1)
	/// Storage: `StakingLedger::ErasStakersPaged` (r:1 w:0)
	/// Storage: `StakingLedger::ErasRewardPoints` (r:1 w:0)
	/// Storage: `StakingLedger::ErasValidatorPrefs` (r:1 w:0)
	/// Storage: `StakingLedger::Payee` (r:65 w:0)
	/// Storage: `StakingLedger::Ledger` (r:65 w:65)
	/// Storage: `System::Account` (r:65 w:65)
	/// The range of component `n` is `[0, 64]`.
	fn payout_stakers_by_page(n: u32, ) -> Weight {
		Weight::from_parts(90_000_000, 12_000)
			.saturating_add(Weight::from_parts(45_000_000, 0).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(10_u64))
			.saturating_add(T::DbWeight::get().reads((4_u64).saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(3_u64))
			.saturating_add(T::DbWeight::get().writes((3_u64).saturating_mul(n.into())))
	}
	/// Storage: `StakingLedger::Ledger` (r:1 w:1)
	/// Storage: `StakingLedger::SlashingSpans` (r:1 w:1)
	/// Storage: `Balances::Locks` (r:1 w:1)
	/// Storage: `System::Account` (r:1 w:1)
	fn reap_stash() -> Weight {
		Weight::from_parts(70_000_000, 4764)
			.saturating_add(T::DbWeight::get().reads(8_u64))
			.saturating_add(T::DbWeight::get().writes(9_u64))
	}
	/// Storage: `StakingLedger::ValidatorCount` (r:0 w:1)
	fn set_validator_count() -> Weight {
		Weight::from_parts(5_000_000, 0)
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::MinCommission` (r:0 w:1)
	/// Storage: `StakingLedger::MinValidatorBond` (r:0 w:1)
	/// Storage: `StakingLedger::MinNominatorBond` (r:0 w:1)
	fn set_staking_configs() -> Weight {
		Weight::from_parts(7_000_000, 0)
			.saturating_add(T::DbWeight::get().writes(3_u64))
	}
	/// Storage: `StakingLedger::ForceEra` (r:0 w:1)
	fn force_era() -> Weight {
		Weight::from_parts(5_000_000, 0)
			.saturating_add(T::DbWeight::get().writes(1_u64))
	}
	/// Storage: `StakingLedger::UnappliedSlashes` (r:1 w:1)
	/// Storage: `StakingLedger::CanceledSlashPayout` (r:1 w:1)
	/// The range of component `s` is `[1, 1000]`.
	fn cancel_deferred_slash(s: u32, ) -> Weight {
		Weight::from_parts(15_000_000, 70_000)
			.saturating_add(Weight::from_parts(2_500_000, 0).saturating_mul(s.into()))
			.saturating_add(T::DbWeight::get().reads(2_u64))
			.saturating_add(T::DbWeight::get().writes(2_u64))
	}
}

// For backwards compatibility and tests.
impl WeightInfo for () {
	fn bond() -> Weight {
		Weight::from_parts(45_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(3_u64))
			.saturating_add(RocksDbWeight::get().writes(4_u64))
	}
	fn bond_extra() -> Weight {
		Weight::from_parts(38_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(3_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
	fn unbond() -> Weight {
		Weight::from_parts(52_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(7_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
	fn withdraw_unbonded_update() -> Weight {
		Weight::from_parts(40_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(4_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
	fn withdraw_unbonded_kill() -> Weight {
		Weight::from_parts(68_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(8_u64))
			.saturating_add(RocksDbWeight::get().writes(8_u64))
	}
	fn validate() -> Weight {
		Weight::from_parts(30_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(4_u64))
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn nominate(n: u32, ) -> Weight {
		Weight::from_parts(35_000_000, 4764)
			.saturating_add(Weight::from_parts(3_500_000, 0).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(4_u64))
			.saturating_add(RocksDbWeight::get().reads((2_u64).saturating_mul(n.into())))
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn chill() -> Weight {
		Weight::from_parts(25_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(4_u64))
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn set_payee() -> Weight {
		Weight::from_parts(15_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(1_u64))
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn kick(k: u32, ) -> Weight {
		Weight::from_parts(22_000_000, 4764)
			.saturating_add(Weight::from_parts(9_000_000, 0).saturating_mul(k.into()))
			.saturating_add(RocksDbWeight::get().reads(3_u64))
			.saturating_add(RocksDbWeight::get().reads((2_u64).saturating_mul(k.into())))
			.saturating_add(RocksDbWeight::get().writes((1_u64).saturating_mul(k.into())))
	}
	fn chill_other() -> Weight {
		Weight::from_parts(32_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(6_u64))
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn force_apply_min_commission() -> Weight {
		Weight::from_parts(20_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(3_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
	fn rebond(l: u32, ) -> Weight {
		Weight::from_parts(40_000_000, 4764)
			.saturating_add(Weight::from_parts(60_000, 0).saturating_mul(l.into()))
			.saturating_add(RocksDbWeight::get().reads(3_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
	fn payout_stakers_by_page(n: u32, ) -> Weight {
		Weight::from_parts(90_000_000, 12_000)
			.saturating_add(Weight::from_parts(45_000_000, 0).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(10_u64))
			.saturating_add(RocksDbWeight::get().reads((4_u64).saturating_mul(n.into())))
			.saturating_add(RocksDbWeight::get().writes(3_u64))
			.saturating_add(RocksDbWeight::get().writes((3_u64).saturating_mul(n.into())))
	}
	fn reap_stash() -> Weight {
		Weight::from_parts(70_000_000, 4764)
			.saturating_add(RocksDbWeight::get().reads(8_u64))
			.saturating_add(RocksDbWeight::get().writes(9_u64))
	}
	fn set_validator_count() -> Weight {
		Weight::from_parts(5_000_000, 0)
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn set_staking_configs() -> Weight {
		Weight::from_parts(7_000_000, 0)
			.saturating_add(RocksDbWeight::get().writes(3_u64))
	}
	fn force_era() -> Weight {
		Weight::from_parts(5_000_000, 0)
			.saturating_add(RocksDbWeight::get().writes(1_u64))
	}
	fn cancel_deferred_slash(s: u32, ) -> Weight {
		Weight::from_parts(15_000_000, 70_000)
			.saturating_add(Weight::from_parts(2_500_000, 0).saturating_mul(s.into()))
			.saturating_add(RocksDbWeight::get().reads(2_u64))
			.saturating_add(RocksDbWeight::get().writes(2_u64))
	}
}
