// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod doctor;
pub mod exporter;
pub mod recurring;
pub mod reports;
pub mod settings;
pub mod transactions;
pub mod users;
