// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod account_credential;
pub mod activity_log;
pub mod execution_log;
pub mod scheduled_attack;
pub mod server_plan;
pub mod village_config;
