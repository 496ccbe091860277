// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod activity_log_repository;
pub mod attack_repository;
pub mod credential_repository;
pub mod execution_log_repository;
pub mod plan_repository;
pub mod village_config_repository;
