// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod activity_log_repo_impl;
pub mod attack_repo_impl;
pub mod credential_repo_impl;
pub mod execution_log_repo_impl;
pub mod plan_repo_impl;
pub mod village_config_repo_impl;
